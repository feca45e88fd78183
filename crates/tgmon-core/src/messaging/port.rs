use std::sync::Arc;

use async_trait::async_trait;

use crate::{config::Config, domain::RecipientId, messaging::types::InboundMessage, Result};

/// Outbound side: pushes a rendered report to one recipient.
///
/// The Telegram bot is the production implementation; the text is always
/// rendered with legacy Markdown, so callers must pre-escape it.
#[async_trait]
pub trait RelayPort: Send + Sync {
    async fn send_report(&self, to: RecipientId, text: &str) -> Result<()>;
}

/// Inbound side: yields every message the listening account can see.
///
/// `Ok(None)` means the stream ended cleanly. The dispatch loop awaits each
/// call to completion, so an item taken here is always delivered.
#[async_trait]
pub trait UpdateSource: Send {
    async fn next_message(&mut self) -> Result<Option<InboundMessage>>;
}

/// Builds both clients from a validated config.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Called once per launch; the returned relay serves every delivery.
    async fn relay(&self, cfg: &Config) -> Result<Arc<dyn RelayPort>>;

    /// Authenticate the listening session and subscribe to its updates.
    async fn subscribe(&self, cfg: &Config) -> Result<Box<dyn UpdateSource>>;
}
