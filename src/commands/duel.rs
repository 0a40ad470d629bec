//! `duel` - turn-based duel between two members, played with message
//! buttons.
//!
//! The command posts a challenge with Accept/Cancel buttons. Button presses
//! come back through [`DuelBoard::press`], which holds every duel still in
//! play. Button ids have the form `duel:<action>:<duel id>`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serenity::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::common::error::DuelError;

use super::{ButtonTone, Command, CommandContext, EmbedReply, Reply, ReplyButton};

pub const STARTING_HP: u32 = 100;
pub const ATTACK_DAMAGE: u32 = 10;
const DUEL_COLOUR: u32 = 0x0064FF;

/// What a duel button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelAction {
    Accept,
    Cancel,
    Attack,
}

impl DuelAction {
    fn as_str(self) -> &'static str {
        match self {
            DuelAction::Accept => "accept",
            DuelAction::Cancel => "cancel",
            DuelAction::Attack => "attack",
        }
    }

    /// Split a button id into its action and duel id. Ids that do not
    /// belong to a duel give `None`.
    pub fn parse_button(custom_id: &str) -> Option<(Self, u64)> {
        let mut parts = custom_id.split(':');
        if parts.next()? != "duel" {
            return None;
        }
        let action = match parts.next()? {
            "accept" => DuelAction::Accept,
            "cancel" => DuelAction::Cancel,
            "attack" => DuelAction::Attack,
            _ => return None,
        };
        let duel_id = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((action, duel_id))
    }

    fn button(self, duel_id: u64) -> ReplyButton {
        let (label, tone) = match self {
            DuelAction::Accept => ("Accept", ButtonTone::Success),
            DuelAction::Cancel => ("Cancel", ButtonTone::Danger),
            DuelAction::Attack => ("Attack", ButtonTone::Primary),
        };
        ReplyButton {
            custom_id: format!("duel:{}:{}", self.as_str(), duel_id),
            label: label.to_string(),
            tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duelist {
    pub id: u64,
    pub name: String,
    pub hp: u32,
}

impl Duelist {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hp: STARTING_HP,
        }
    }

    fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    fn hp_field(&self) -> (String, String, bool) {
        (format!("{}'s HP", self.name), self.hp.to_string(), true)
    }
}

/// How a duel looks after a button press.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Continue(EmbedReply),
    Finished(EmbedReply),
}

/// One duel in play.
#[derive(Debug, Clone)]
struct DuelState {
    id: u64,
    challenger: Duelist,
    opponent: Duelist,
    /// User id of the member whose attack is next.
    turn: u64,
    accepted: bool,
}

impl DuelState {
    fn new(id: u64, challenger: Duelist, opponent: Duelist) -> Self {
        Self {
            id,
            turn: challenger.id,
            challenger,
            opponent,
            accepted: false,
        }
    }

    fn is_participant(&self, user_id: u64) -> bool {
        user_id == self.challenger.id || user_id == self.opponent.id
    }

    fn challenge_embed(&self) -> EmbedReply {
        EmbedReply {
            title: "Duel Challenge".to_string(),
            description: Some(format!(
                "{} has challenged {} to a duel ! Press 'Accept' to take up arms, \
                 or 'Cancel' if your cowardice surpasses you.",
                self.challenger.mention(),
                self.opponent.mention()
            )),
            author: Some(self.challenger.name.clone()),
            colour: Some(DUEL_COLOUR),
            timestamp: true,
            buttons: vec![
                DuelAction::Accept.button(self.id),
                DuelAction::Cancel.button(self.id),
            ],
            ..Default::default()
        }
    }

    fn board_embed(&self, title: &str, description: String, finished: bool) -> EmbedReply {
        EmbedReply {
            title: title.to_string(),
            description: Some(description),
            fields: vec![self.challenger.hp_field(), self.opponent.hp_field()],
            colour: Some(DUEL_COLOUR),
            timestamp: true,
            buttons: if finished {
                Vec::new()
            } else {
                vec![DuelAction::Attack.button(self.id)]
            },
            ..Default::default()
        }
    }

    /// Only the challenged member may accept.
    fn accept(&mut self, user_id: u64) -> Result<Step, DuelError> {
        if user_id != self.opponent.id {
            return Err(DuelError::NotParticipant);
        }
        if self.accepted {
            return Err(DuelError::AlreadyStarted);
        }
        self.accepted = true;

        let description = format!(
            "{} vs {}\n\nIt is {}'s turn to attack!",
            self.challenger.mention(),
            self.opponent.mention(),
            self.challenger.mention()
        );
        Ok(Step::Continue(self.board_embed("Duel Started!", description, false)))
    }

    /// Either duelist may walk away.
    fn cancel(&mut self, user_id: u64) -> Result<Step, DuelError> {
        if !self.is_participant(user_id) {
            return Err(DuelError::NotParticipant);
        }
        Ok(Step::Finished(EmbedReply {
            title: "Duel Cancelled".to_string(),
            description: Some("The duel has been cancelled.".to_string()),
            colour: Some(DUEL_COLOUR),
            timestamp: true,
            ..Default::default()
        }))
    }

    fn attack(&mut self, user_id: u64) -> Result<Step, DuelError> {
        if !self.is_participant(user_id) {
            return Err(DuelError::NotParticipant);
        }
        if !self.accepted {
            return Err(DuelError::NotStarted);
        }
        if user_id != self.turn {
            return Err(DuelError::NotYourTurn);
        }

        let (attacker, defender) = if self.turn == self.challenger.id {
            (&self.challenger, &mut self.opponent)
        } else {
            (&self.opponent, &mut self.challenger)
        };
        defender.hp = defender.hp.saturating_sub(ATTACK_DAMAGE);
        let (attacker, defender) = (attacker.clone(), defender.clone());

        if defender.hp == 0 {
            let description = format!("{} defeated {}!", attacker.mention(), defender.mention());
            return Ok(Step::Finished(self.board_embed("Duel Over", description, true)));
        }

        self.turn = defender.id;
        let description = format!(
            "{} attacked {} for {} damage! It is now {}'s turn.",
            attacker.mention(),
            defender.mention(),
            ATTACK_DAMAGE,
            defender.mention()
        );
        Ok(Step::Continue(self.board_embed("Duel in Progress", description, false)))
    }
}

/// What answering a button press looks like.
#[derive(Debug, Clone, PartialEq)]
pub enum DuelResponse {
    /// Replace the duel message's embed and buttons.
    Update(EmbedReply),
    /// Shown only to the member who pressed.
    Private(String),
}

/// Duels in play, keyed by duel id.
#[derive(Default)]
pub struct DuelBoard {
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, DuelState>>,
}

impl DuelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a duel and return the challenge embed.
    pub async fn challenge(
        &self,
        challenger: Duelist,
        opponent: Duelist,
    ) -> Result<EmbedReply, DuelError> {
        if challenger.id == opponent.id {
            return Err(DuelError::InvalidOpponent);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = DuelState::new(id, challenger, opponent);
        let embed = state.challenge_embed();
        self.active.lock().await.insert(id, state);
        Ok(embed)
    }

    /// Apply a button press by `user_id`. Buttons that are not duel
    /// buttons give `None`.
    pub async fn press(&self, custom_id: &str, user_id: u64) -> Option<DuelResponse> {
        let (action, duel_id) = DuelAction::parse_button(custom_id)?;
        let mut active = self.active.lock().await;

        let Some(state) = active.get_mut(&duel_id) else {
            return Some(DuelResponse::Private(DuelError::Expired.to_string()));
        };
        let step = match action {
            DuelAction::Accept => state.accept(user_id),
            DuelAction::Cancel => state.cancel(user_id),
            DuelAction::Attack => state.attack(user_id),
        };

        Some(match step {
            Ok(Step::Continue(embed)) => DuelResponse::Update(embed),
            Ok(Step::Finished(embed)) => {
                active.remove(&duel_id);
                debug!("Duel {} finished", duel_id);
                DuelResponse::Update(embed)
            }
            Err(e) => DuelResponse::Private(e.to_string()),
        })
    }

    #[cfg(test)]
    async fn in_play(&self) -> usize {
        self.active.lock().await.len()
    }
}

pub struct DuelCommand {
    board: Arc<DuelBoard>,
}

impl DuelCommand {
    pub fn new(board: Arc<DuelBoard>) -> Self {
        Self { board }
    }
}

#[async_trait]
impl Command for DuelCommand {
    fn name(&self) -> &str {
        "duel"
    }

    fn description(&self) -> &str {
        "Challenge another member to a duel."
    }

    fn category(&self) -> &str {
        "RPG"
    }

    fn context(&self) -> &str {
        "Guild"
    }

    async fn run(&self, ctx: &CommandContext<'_>, _args: &[String]) -> anyhow::Result<Reply> {
        let (Some(author_id), Some(opponent)) = (ctx.author_id, ctx.mentions.first()) else {
            return Ok(Reply::Text(format!("Usage: `{}duel @member`", ctx.prefix)));
        };
        if opponent.is_bot {
            return Ok(Reply::Text(DuelError::InvalidOpponent.to_string()));
        }

        let challenger = Duelist::new(author_id, ctx.author);
        let opponent = Duelist::new(opponent.id, &opponent.name);
        match self.board.challenge(challenger, opponent).await {
            Ok(embed) => Ok(Reply::Embed(embed)),
            Err(e) => Ok(Reply::Text(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::commands::builtin_registry;
    use crate::common::messages::UserRef;

    const ALICE: u64 = 11;
    const BOB: u64 = 22;
    const EVE: u64 = 33;

    async fn open_duel(board: &DuelBoard) -> EmbedReply {
        board
            .challenge(Duelist::new(ALICE, "alice"), Duelist::new(BOB, "bob"))
            .await
            .unwrap()
    }

    fn button_id(embed: &EmbedReply, label: &str) -> String {
        embed
            .buttons
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.custom_id.clone())
            .unwrap()
    }

    async fn press_update(board: &DuelBoard, custom_id: &str, user: u64) -> EmbedReply {
        match board.press(custom_id, user).await {
            Some(DuelResponse::Update(embed)) => embed,
            other => panic!("expected an update, got {:?}", other),
        }
    }

    #[test]
    fn test_button_ids() {
        assert_eq!(
            DuelAction::parse_button("duel:attack:7"),
            Some((DuelAction::Attack, 7))
        );
        assert_eq!(DuelAction::Accept.button(3).custom_id, "duel:accept:3");
        assert_eq!(DuelAction::parse_button("duel:attack"), None);
        assert_eq!(DuelAction::parse_button("duel:dance:1"), None);
        assert_eq!(DuelAction::parse_button("poll:accept:1"), None);
        assert_eq!(DuelAction::parse_button("duel:accept:1:2"), None);
    }

    #[tokio::test]
    async fn test_challenge_embed() {
        let board = DuelBoard::new();
        let embed = open_duel(&board).await;

        assert_eq!(embed.title, "Duel Challenge");
        assert_eq!(embed.author.as_deref(), Some("alice"));
        assert!(embed
            .description
            .unwrap()
            .starts_with("<@11> has challenged <@22> to a duel !"));
        let labels: Vec<&str> = embed.buttons.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Accept", "Cancel"]);
        assert_eq!(board.in_play().await, 1);
    }

    #[tokio::test]
    async fn test_only_opponent_accepts() {
        let board = DuelBoard::new();
        let accept = button_id(&open_duel(&board).await, "Accept");

        for outsider in [ALICE, EVE] {
            assert_eq!(
                board.press(&accept, outsider).await,
                Some(DuelResponse::Private(
                    "This duel challenge is not for you!".to_string()
                ))
            );
        }

        let started = press_update(&board, &accept, BOB).await;
        assert_eq!(started.title, "Duel Started!");
        assert_eq!(
            started.description.as_deref(),
            Some("<@11> vs <@22>\n\nIt is <@11>'s turn to attack!")
        );
        assert_eq!(started.fields[0], ("alice's HP".to_string(), "100".to_string(), true));
        assert_eq!(started.buttons[0].label, "Attack");
    }

    #[tokio::test]
    async fn test_turns_alternate() {
        let board = DuelBoard::new();
        let accept = button_id(&open_duel(&board).await, "Accept");
        let attack = button_id(&press_update(&board, &accept, BOB).await, "Attack");

        assert_eq!(
            board.press(&attack, BOB).await,
            Some(DuelResponse::Private("It's not your turn!".to_string()))
        );

        let after = press_update(&board, &attack, ALICE).await;
        assert_eq!(after.title, "Duel in Progress");
        assert_eq!(
            after.description.as_deref(),
            Some("<@11> attacked <@22> for 10 damage! It is now <@22>'s turn.")
        );
        assert_eq!(after.fields[1].1, "90");

        assert_eq!(
            board.press(&attack, ALICE).await,
            Some(DuelResponse::Private("It's not your turn!".to_string()))
        );
        let after = press_update(&board, &attack, BOB).await;
        assert_eq!(after.fields[0].1, "90");
    }

    #[tokio::test]
    async fn test_attack_before_accept_refused() {
        let board = DuelBoard::new();
        let embed = open_duel(&board).await;
        let attack = embed.buttons[0].custom_id.replace("accept", "attack");

        assert_eq!(
            board.press(&attack, ALICE).await,
            Some(DuelResponse::Private("The duel has not started yet!".to_string()))
        );
    }

    #[tokio::test]
    async fn test_duel_to_the_end() {
        let board = DuelBoard::new();
        let accept = button_id(&open_duel(&board).await, "Accept");
        let attack = button_id(&press_update(&board, &accept, BOB).await, "Attack");

        // Alice strikes first, so she lands the tenth blow before Bob does.
        let mut last = None;
        for round in 0..19 {
            let attacker = if round % 2 == 0 { ALICE } else { BOB };
            last = Some(press_update(&board, &attack, attacker).await);
        }

        let last = last.unwrap();
        assert_eq!(last.description.as_deref(), Some("<@11> defeated <@22>!"));
        assert_eq!(last.fields[1].1, "0");
        assert!(last.buttons.is_empty());
        assert_eq!(board.in_play().await, 0);
        assert_eq!(
            board.press(&attack, BOB).await,
            Some(DuelResponse::Private("This duel is no longer active.".to_string()))
        );
    }

    #[tokio::test]
    async fn test_either_duelist_cancels() {
        let board = DuelBoard::new();
        let cancel = button_id(&open_duel(&board).await, "Cancel");

        assert_eq!(
            board.press(&cancel, EVE).await,
            Some(DuelResponse::Private(
                "This duel challenge is not for you!".to_string()
            ))
        );
        let cancelled = press_update(&board, &cancel, ALICE).await;
        assert_eq!(cancelled.title, "Duel Cancelled");
        assert!(cancelled.buttons.is_empty());
        assert_eq!(board.in_play().await, 0);
    }

    #[tokio::test]
    async fn test_foreign_buttons_ignored() {
        let board = DuelBoard::new();
        assert_eq!(board.press("poll:yes:1", ALICE).await, None);
    }

    async fn run_duel(
        board: Arc<DuelBoard>,
        author_id: Option<u64>,
        mentions: &[UserRef],
    ) -> Reply {
        let registry = builtin_registry(Arc::clone(&board)).unwrap();
        let ctx = CommandContext {
            registry: &registry,
            prefix: "!",
            author: "alice",
            author_id,
            mentions,
            started_at: Utc::now(),
        };
        DuelCommand::new(board).run(&ctx, &[]).await.unwrap()
    }

    fn member(id: u64, name: &str, is_bot: bool) -> UserRef {
        UserRef {
            id,
            name: name.to_string(),
            is_bot,
        }
    }

    #[tokio::test]
    async fn test_command_challenges_first_mention() {
        let board = Arc::new(DuelBoard::new());
        let bob = [member(BOB, "bob", false)];
        let reply = run_duel(Arc::clone(&board), Some(ALICE), &bob).await;

        let Reply::Embed(embed) = reply else {
            panic!("expected an embed");
        };
        assert_eq!(embed.author.as_deref(), Some("alice"));
        assert_eq!(board.in_play().await, 1);
    }

    #[tokio::test]
    async fn test_command_rejects_self_and_bots() {
        let board = Arc::new(DuelBoard::new());
        let refusal = Reply::Text("You can't duel yourself or a bot!".to_string());

        let yourself = [member(ALICE, "alice", false)];
        assert_eq!(run_duel(Arc::clone(&board), Some(ALICE), &yourself).await, refusal);
        let helper = [member(99, "helper", true)];
        assert_eq!(run_duel(Arc::clone(&board), Some(ALICE), &helper).await, refusal);
        assert_eq!(board.in_play().await, 0);
    }

    #[tokio::test]
    async fn test_command_needs_an_opponent() {
        let reply = run_duel(Arc::new(DuelBoard::new()), Some(ALICE), &[]).await;
        assert_eq!(reply, Reply::Text("Usage: `!duel @member`".to_string()));
    }
}
