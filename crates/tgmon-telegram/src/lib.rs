//! Relay adapter (teloxide).
//!
//! Implements the `tgmon-core` RelayPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tracing::debug;

use tgmon_core::{domain::RecipientId, errors::Error, messaging::port::RelayPort, Result};

#[derive(Clone)]
pub struct TelegramRelay {
    bot: Bot,
}

impl TelegramRelay {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    /// `@username` of the relay bot, confirming the token works.
    pub async fn describe(&self) -> Result<String> {
        let me = self.bot.get_me().await.map_err(Self::map_err)?;
        Ok(format!("@{}", me.username()))
    }

    fn tg_chat(to: RecipientId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(to.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Relay(format!("telegram error: {e}"))
    }
}

/// Reports are escaped for legacy Markdown (`*`, `_`, backtick), so that is
/// the parse mode they must be sent with.
#[allow(deprecated)]
pub const REPORT_PARSE_MODE: ParseMode = ParseMode::Markdown;

#[async_trait]
impl RelayPort for TelegramRelay {
    async fn send_report(&self, to: RecipientId, text: &str) -> Result<()> {
        debug!(recipient = to.0, len = text.len(), "sending report");
        self.bot
            .send_message(Self::tg_chat(to), text.to_string())
            .parse_mode(REPORT_PARSE_MODE)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
