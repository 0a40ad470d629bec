//! `help` - list commands, or describe one.

use std::collections::BTreeMap;

use serenity::async_trait;

use super::{Command, CommandContext, EmbedReply, Reply};

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Displays available commands."
    }

    fn category(&self) -> &str {
        "Help"
    }

    async fn run(&self, ctx: &CommandContext<'_>, args: &[String]) -> anyhow::Result<Reply> {
        match args.first() {
            Some(name) => Ok(describe_one(ctx, name)),
            None => Ok(list_all(ctx)),
        }
    }
}

fn list_all(ctx: &CommandContext<'_>) -> Reply {
    let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for command in ctx.registry.iter() {
        by_category
            .entry(command.category())
            .or_default()
            .push(format!("`{}`: **{}**", command.name(), command.description()));
    }

    Reply::Embed(EmbedReply {
        title: "Commands".to_string(),
        description: Some(format!(
            "Prefix: `{}`\nAvailable commands: `{}`\nAvailable categories: `{}`",
            ctx.prefix,
            ctx.registry.len(),
            by_category.len()
        )),
        fields: by_category
            .into_iter()
            .map(|(category, lines)| (category.to_string(), lines.join("\n"), false))
            .collect(),
        footer: Some(format!("{}help", ctx.prefix)),
        author: Some(ctx.author.to_string()),
        timestamp: true,
        ..Default::default()
    })
}

fn describe_one(ctx: &CommandContext<'_>, name: &str) -> Reply {
    let Some(command) = ctx.registry.get(&name.to_lowercase()) else {
        return Reply::Text(format!("Error: `{}` is not a command.", name));
    };

    Reply::Embed(EmbedReply {
        title: format!("`{}` command", command.name()),
        description: None,
        fields: vec![
            ("Name".to_string(), format!("`{}`", command.name()), true),
            (
                "Description".to_string(),
                format!("`{}`", command.description()),
                false,
            ),
            (
                "Required Permission".to_string(),
                format!("`{}`", command.permission()),
                true,
            ),
            ("Context".to_string(), format!("`{}`", command.context()), true),
            ("Category".to_string(), format!("`{}`", command.category()), true),
        ],
        footer: Some(format!("{}help {}", ctx.prefix, command.name())),
        author: Some(ctx.author.to_string()),
        timestamp: true,
        ..Default::default()
    })
}
