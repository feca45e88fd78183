use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use tgmon_core::{
    config::Config,
    messaging::port::{Connector, RelayPort, UpdateSource},
    Result,
};
use tgmon_telegram::TelegramRelay;

/// Production wiring: grammers for listening, teloxide for relaying.
struct TelegramConnector;

#[async_trait]
impl Connector for TelegramConnector {
    async fn relay(&self, cfg: &Config) -> Result<Arc<dyn RelayPort>> {
        let relay = TelegramRelay::new(cfg.bot_token.clone());
        match relay.describe().await {
            Ok(name) => info!("Relay bot: {name}"),
            Err(e) => warn!("could not verify relay bot token: {e}"),
        }
        Ok(Arc::new(relay))
    }

    async fn subscribe(&self, cfg: &Config) -> Result<Box<dyn UpdateSource>> {
        let source = tgmon_userbot::login::connect(cfg).await?;
        Ok(Box::new(source))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = Config::load();
    let level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level)
        .unwrap_or(tracing::level_filters::LevelFilter::INFO);
    tgmon_core::logging::init("tgmon", level)?;

    tgmon_core::app::launch(loaded, &TelegramConnector).await?;

    Ok(())
}
