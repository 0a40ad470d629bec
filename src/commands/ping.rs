//! `ping` - liveness check with uptime.

use chrono::{DateTime, Utc};
use serenity::async_trait;

use super::{Command, CommandContext, Reply};

pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Checks that the relay is alive."
    }

    fn category(&self) -> &str {
        "Utility"
    }

    async fn run(&self, ctx: &CommandContext<'_>, _args: &[String]) -> anyhow::Result<Reply> {
        Ok(Reply::Text(format!(
            "Pong! Relaying for {}.",
            format_uptime(ctx.started_at, Utc::now())
        )))
    }
}

fn format_uptime(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = (now - started_at).num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        (total % 86_400) / 3_600,
        (total % 3_600) / 60,
        total % 60,
    );

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_format_uptime() {
        let start = Utc::now();
        assert_eq!(format_uptime(start, start + Duration::seconds(75)), "1m 15s");
        assert_eq!(format_uptime(start, start + Duration::seconds(3_725)), "1h 2m");
        assert_eq!(format_uptime(start, start + Duration::seconds(90_061)), "1d 1h 1m");
    }

    #[test]
    fn test_clock_skew_clamped() {
        let start = Utc::now();
        assert_eq!(format_uptime(start, start - Duration::seconds(5)), "0m 0s");
    }
}
