use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{config::Config, dispatch::Monitor, messaging::port::Connector, Result};

/// Validate startup state, then listen until the update stream ends.
///
/// A config error is logged and returned before the connector is touched, so
/// a misconfigured process never authenticates or subscribes.
pub async fn launch(loaded: Result<Config>, connector: &dyn Connector) -> Result<()> {
    info!("Starting Telegram Message Monitor...");

    let cfg = match loaded {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("{e}");
            return Err(e);
        }
    };

    if cfg.target_users.is_empty() {
        warn!("No target users configured! Set TARGET_USERS to a comma-separated list of user ids");
    } else {
        info!("Target users: {}", cfg.target_users.len());
    }
    if !cfg.filters.excluded_chats.is_empty() {
        info!("Excluded chats: {}", cfg.filters.excluded_chats.len());
    }

    let relay = connector.relay(&cfg).await?;
    let source = connector.subscribe(&cfg).await.inspect_err(|e| {
        error!("failed to start listening session: {e}");
    })?;

    info!("Listening for messages in all chats");
    Monitor::new(cfg, relay).run(source).await
}
