//! Turns inbound updates into Bot API effects.
//!
//! Every effect is attempted once. Failures are logged and swallowed so the
//! dispatcher can move on to the next update.

use tracing::{debug, info, warn};

use rally_core::{AdminCommand, CreateCommand, Engine, Notice, RallyConfig, Render};
use rally_proto::Action;

use crate::bot::BotApi;
use crate::commands::{TextCommand, classify};
use crate::error::TelegramError;
use crate::inbound::Inbound;
use crate::live_text::LiveText;

pub const REACTION_OK: &str = "👍";
pub const REACTION_FAIL: &str = "👎";

/// Messages whose last rendered text is remembered.
pub const LIVE_TEXT_CAPACITY: usize = 1024;

/// Processes one inbound update at a time against the rally engine.
pub struct RallyHandler<B> {
    bot: B,
    engine: Engine,
    creation_prefixes: Vec<String>,
    admin_prefix: String,
    live_text: LiveText,
}

impl<B: BotApi> RallyHandler<B> {
    pub fn new(bot: B, engine: Engine, config: &RallyConfig) -> Self {
        Self {
            bot,
            engine,
            creation_prefixes: config.creation_prefixes.clone(),
            admin_prefix: config.admin_prefix.clone(),
            live_text: LiveText::new(LIVE_TEXT_CAPACITY),
        }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Process `inbound` to completion.
    pub async fn handle(&self, inbound: Inbound) {
        match inbound {
            Inbound::Text {
                chat_id,
                thread_id,
                message_id,
                sender,
                text,
            } => match classify(&text, &self.creation_prefixes, &self.admin_prefix) {
                Some(TextCommand::Admin) => {
                    self.handle_admin(chat_id, message_id, &sender, &text).await;
                }
                Some(TextCommand::Create) => {
                    self.handle_create(chat_id, thread_id, message_id, &sender, &text)
                        .await;
                }
                None => {}
            },
            Inbound::Press {
                callback_id,
                chat_id,
                message_id,
                actor,
                data,
                message_text,
            } => {
                self.handle_press(&callback_id, chat_id, message_id, &actor, &data, &message_text)
                    .await;
            }
        }
    }

    async fn handle_admin(&self, chat_id: i64, message_id: i32, sender: &str, text: &str) {
        if !self.engine.authority().is_admin(sender) {
            debug!(sender, "admin command from non-admin ignored");
            return;
        }

        match AdminCommand::parse(text, &self.admin_prefix) {
            Some(command) => {
                command.apply(self.engine.moderation());
                info!(sender, ?command, "admin command applied");
                self.react(chat_id, message_id, REACTION_OK).await;
            }
            None => {
                debug!(sender, text, "malformed admin command");
                self.react(chat_id, message_id, REACTION_FAIL).await;
            }
        }
    }

    async fn handle_create(
        &self,
        chat_id: i64,
        thread_id: Option<i32>,
        message_id: i32,
        sender: &str,
        text: &str,
    ) {
        if sender.is_empty() || self.engine.moderation().is_banned(sender) {
            debug!(sender, "creation refused");
            self.react(chat_id, message_id, REACTION_FAIL).await;
            return;
        }

        let command = match CreateCommand::parse(text) {
            Ok(command) => command,
            Err(e) => {
                debug!(sender, error = %e, "bad creation command");
                if let Err(send_err) = self
                    .bot
                    .send_message(chat_id, thread_id, &e.to_string(), None)
                    .await
                {
                    warn!(error = %send_err, chat_id, "failed to send usage reply");
                }
                self.react(chat_id, message_id, REACTION_FAIL).await;
                return;
            }
        };

        let rally = command.into_rally(sender);
        let (body, keyboard) = self.engine.render(&rally);
        match self
            .bot
            .send_message(chat_id, thread_id, &body, Some(&keyboard))
            .await
        {
            Ok(rally_message_id) => {
                self.live_text.store((chat_id, rally_message_id), body.clone());
                info!(
                    chat_id,
                    message_id = rally_message_id,
                    initiator = sender,
                    name = %rally.name,
                    limit = rally.limit,
                    "rally created"
                );
                self.react(chat_id, message_id, REACTION_OK).await;
            }
            Err(e) => {
                warn!(error = %e, chat_id, "failed to post rally");
                self.react(chat_id, message_id, REACTION_FAIL).await;
            }
        }
    }

    async fn handle_press(
        &self,
        callback_id: &str,
        chat_id: i64,
        message_id: i32,
        actor: &str,
        data: &str,
        message_text: &str,
    ) {
        let action = match data.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                debug!(error = %e, "unknown callback payload");
                self.answer(callback_id, Notice::Silent).await;
                return;
            }
        };

        let key = (chat_id, message_id);
        let current = self.live_text.current(key, message_text);
        let outcome = match self.engine.apply(actor, action, &current) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, chat_id, message_id, "message does not decode as a rally");
                self.answer(callback_id, Notice::Silent).await;
                return;
            }
        };

        match outcome.render {
            Render::Unchanged => {}
            Render::Edit { text, keyboard } => {
                let result = self
                    .bot
                    .edit_message(chat_id, message_id, &text, &keyboard)
                    .await;
                match result {
                    Ok(()) | Err(TelegramError::NotModified) => self.live_text.store(key, text),
                    Err(e) => {
                        // The live message kept its old text; fall back to
                        // what the next callback reports.
                        self.live_text.evict(key);
                        warn!(error = %e, chat_id, message_id, "failed to edit rally");
                    }
                }
            }
            Render::Delete => {
                self.live_text.evict(key);
                if let Err(e) = self.bot.delete_message(chat_id, message_id).await {
                    warn!(error = %e, chat_id, message_id, "failed to delete rally");
                }
            }
        }

        self.answer(callback_id, outcome.notice).await;
    }

    async fn answer(&self, callback_id: &str, notice: Notice) {
        let text = notice.text();
        if let Err(e) = self.bot.answer_callback(callback_id, text.as_deref()).await {
            warn!(error = %e, "failed to answer callback");
        }
    }

    async fn react(&self, chat_id: i64, message_id: i32, emoji: &str) {
        if let Err(e) = self.bot.set_reaction(chat_id, message_id, emoji).await {
            warn!(error = %e, chat_id, message_id, "failed to set reaction");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::tests::{Call, MockBot};
    use rally_core::{InMemoryModeration, codec};
    use rally_proto::{Entry, Rally};
    use std::sync::Arc;

    const ADMIN: &str = "@BulatHD";
    const CHAT: i64 = -100;

    fn handler_with(bot: MockBot) -> RallyHandler<MockBot> {
        let config = RallyConfig::default();
        let engine = Engine::from_config(&config, Arc::new(InMemoryModeration::new()));
        RallyHandler::new(bot, engine, &config)
    }

    fn handler() -> RallyHandler<MockBot> {
        handler_with(MockBot::new())
    }

    fn text(sender: &str, text: &str) -> Inbound {
        Inbound::Text {
            chat_id: CHAT,
            thread_id: Some(7),
            message_id: 10,
            sender: sender.to_string(),
            text: text.to_string(),
        }
    }

    fn press(actor: &str, data: &str, message_text: &str) -> Inbound {
        Inbound::Press {
            callback_id: "cb-1".to_string(),
            chat_id: CHAT,
            message_id: 42,
            actor: actor.to_string(),
            data: data.to_string(),
            message_text: message_text.to_string(),
        }
    }

    fn rally_text() -> String {
        codec::encode(&Rally::new("Футбол", "суббота 18:00", 2, "@host"))
    }

    fn react(emoji: &str) -> Call {
        Call::React {
            message_id: 10,
            emoji: emoji.to_string(),
        }
    }

    #[tokio::test]
    async fn creation_posts_rally_into_topic_and_reacts() {
        let handler = handler();
        handler
            .handle(text("@host", "/сбор Футбол на Динамо 10 суббота 18:00"))
            .await;

        let calls = handler.bot().calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Send {
                chat_id,
                thread_id,
                text,
                buttons,
            } => {
                assert_eq!(*chat_id, CHAT);
                assert_eq!(*thread_id, Some(7));
                let rally = codec::decode(text).unwrap();
                assert_eq!(rally.name, "Футбол на Динамо");
                assert_eq!(rally.initiator, "@host");
                assert_eq!(*buttons, 4);
            }
            other => panic!("expected send, got {other:?}"),
        }
        assert_eq!(calls[1], react(REACTION_OK));
    }

    #[tokio::test]
    async fn bad_limit_replies_with_error_text() {
        let handler = handler();
        handler.handle(text("@host", "/party Game 99 friday")).await;

        let calls = handler.bot().calls();
        assert!(matches!(
            &calls[0],
            Call::Send { text, buttons: 0, .. } if text == "Лимит должен быть от 2 до 30"
        ));
        assert_eq!(calls[1], react(REACTION_FAIL));
    }

    #[tokio::test]
    async fn banned_creator_gets_only_a_thumbs_down() {
        let handler = handler();
        handler.engine().moderation().ban("@spam");
        handler.handle(text("@spam", "/сбор Футбол 10 суббота")).await;
        assert_eq!(handler.bot().calls(), vec![react(REACTION_FAIL)]);
    }

    #[tokio::test]
    async fn failed_post_reacts_thumbs_down() {
        let handler = handler_with(MockBot::failing_sends());
        handler.handle(text("@host", "/сбор Футбол 10 суббота")).await;
        assert_eq!(handler.bot().calls(), vec![react(REACTION_FAIL)]);
    }

    #[tokio::test]
    async fn admin_commands_react_by_result() {
        let handler = handler();
        handler.handle(text(ADMIN, "/sudo ban @spam")).await;
        handler.handle(text(ADMIN, "/sudo frobnicate")).await;

        assert!(handler.engine().moderation().is_banned("@spam"));
        assert_eq!(
            handler.bot().calls(),
            vec![react(REACTION_OK), react(REACTION_FAIL)]
        );
    }

    #[tokio::test]
    async fn non_admin_sudo_is_silent() {
        let handler = handler();
        handler.handle(text("@guest", "/sudo ban @host")).await;
        assert!(handler.bot().calls().is_empty());
        assert!(!handler.engine().moderation().is_banned("@host"));
    }

    #[tokio::test]
    async fn press_edits_then_acknowledges() {
        let handler = handler();
        handler.handle(press("@a", "sign_up", &rally_text())).await;

        let calls = handler.bot().calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            Call::Edit { message_id, text } => {
                assert_eq!(*message_id, 42);
                let rally = codec::decode(text).unwrap();
                assert_eq!(rally.signed_up.len(), 1);
            }
            other => panic!("expected edit, got {other:?}"),
        }
        assert_eq!(
            calls[1],
            Call::Answer {
                callback_id: "cb-1".to_string(),
                text: None,
            }
        );
    }

    #[tokio::test]
    async fn queued_presses_with_same_snapshot_both_land() {
        let handler = handler();
        let snapshot = rally_text();
        handler.handle(press("@a", "sign_up", &snapshot)).await;
        handler.handle(press("@b", "sign_up", &snapshot)).await;

        let last_edit = handler
            .bot()
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .last()
            .unwrap();
        let rally = codec::decode(&last_edit).unwrap();
        assert_eq!(
            rally.signed_up,
            vec![Entry::member("@a", 0), Entry::member("@b", 0)]
        );
    }

    #[tokio::test]
    async fn press_after_delete_uses_callback_text() {
        let handler = handler();
        handler.handle(text(ADMIN, "/sudo delete")).await;
        handler.handle(press("@a", "sign_up", &rally_text())).await;
        handler.handle(press(ADMIN, "cancel", &rally_text())).await;
        handler.handle(press("@b", "sign_up", &rally_text())).await;

        let last_edit = handler
            .bot()
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .last()
            .unwrap();
        let rally = codec::decode(&last_edit).unwrap();
        assert_eq!(rally.signed_up, vec![Entry::member("@b", 0)]);
    }

    #[tokio::test]
    async fn cancel_acknowledges_with_text() {
        let handler = handler();
        handler.handle(press("@host", "cancel", &rally_text())).await;

        let calls = handler.bot().calls();
        assert!(matches!(&calls[0], Call::Edit { text, .. } if codec::is_cancelled(text)));
        assert_eq!(
            calls[1],
            Call::Answer {
                callback_id: "cb-1".to_string(),
                text: Some("Сбор отменён".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn armed_delete_removes_message() {
        let handler = handler();
        handler.handle(text(ADMIN, "/sudo delete")).await;
        handler.handle(press(ADMIN, "cancel", &rally_text())).await;

        let calls = handler.bot().calls();
        assert_eq!(calls[1], Call::Delete { message_id: 42 });
        assert_eq!(
            calls[2],
            Call::Answer {
                callback_id: "cb-1".to_string(),
                text: Some("Сообщение удалено".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn unknown_payload_and_foreign_message_are_acknowledged_silently() {
        let handler = handler();
        handler.handle(press("@a", "launch", &rally_text())).await;
        handler.handle(press("@a", "sign_up", "просто текст")).await;

        let silent = Call::Answer {
            callback_id: "cb-1".to_string(),
            text: None,
        };
        assert_eq!(handler.bot().calls(), vec![silent.clone(), silent]);
    }

    #[tokio::test]
    async fn not_modified_edit_is_not_an_error() {
        let handler = handler_with(MockBot::not_modified_edits());
        handler.handle(press("@a", "sign_up", &rally_text())).await;
        assert_eq!(
            handler.bot().calls(),
            vec![Call::Answer {
                callback_id: "cb-1".to_string(),
                text: None,
            }]
        );
    }
}
