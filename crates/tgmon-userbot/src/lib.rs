//! Listening-session adapter (grammers MTProto user client).
//!
//! Logs in as a regular account and turns every new message it can see into
//! a `tgmon-core` InboundMessage.

use async_trait::async_trait;

use grammers_client::{Client, Update};

use tracing::debug;

use tgmon_core::{
    errors::Error,
    messaging::{port::UpdateSource, types::InboundMessage},
    Result,
};

mod convert;
pub mod login;

/// Live update feed of an authorized user session.
pub struct UserbotSource {
    client: Client,
}

impl UserbotSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpdateSource for UserbotSource {
    async fn next_message(&mut self) -> Result<Option<InboundMessage>> {
        loop {
            let update = self
                .client
                .next_update()
                .await
                .map_err(|e| Error::Session(format!("update stream error: {e}")))?;

            match update {
                Update::NewMessage(message) => {
                    return Ok(Some(convert::inbound_message(&message)));
                }
                _ => debug!("ignoring non-message update"),
            }
        }
    }
}
