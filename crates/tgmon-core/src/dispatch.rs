//! Event loop gluing the listening session to filter → format → relay.

use std::sync::Arc;

use futures::future::join_all;
use tokio::{task::JoinSet, time::timeout};
use tracing::{debug, error, info, trace};

use crate::{
    config::Config,
    domain::RecipientId,
    filter::{is_own_message, should_process},
    formatting::{format_message_info, relay_text},
    messaging::{
        port::{RelayPort, UpdateSource},
        types::InboundMessage,
    },
    Result,
};

/// What happened to one inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Filtered,
    OwnMessage,
    Relayed(DeliverySummary),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Monitor {
    cfg: Arc<Config>,
    relay: Arc<dyn RelayPort>,
}

impl Monitor {
    pub fn new(cfg: Arc<Config>, relay: Arc<dyn RelayPort>) -> Self {
        Self { cfg, relay }
    }

    /// Handle one message end to end. Never fails: delivery errors are
    /// logged per recipient and counted.
    pub async fn process(&self, msg: &InboundMessage) -> Disposition {
        if !should_process(msg, &self.cfg.filters) {
            trace!(message_id = msg.id.0, "message filtered out");
            return Disposition::Filtered;
        }

        if is_own_message(msg) {
            trace!(message_id = msg.id.0, "skipping own message");
            return Disposition::OwnMessage;
        }

        if let Some(chat) = &msg.chat {
            info!("Processing message from chat: {}", chat.id.0);
        }

        let text = relay_text(&format_message_info(msg));
        Disposition::Relayed(self.deliver(&text).await)
    }

    async fn deliver(&self, text: &str) -> DeliverySummary {
        let sends = self
            .cfg
            .target_users
            .iter()
            .map(|&to| self.deliver_one(to, text));

        let mut summary = DeliverySummary::default();
        for ok in join_all(sends).await {
            if ok {
                summary.delivered += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    async fn deliver_one(&self, to: RecipientId, text: &str) -> bool {
        match timeout(self.cfg.relay_timeout, self.relay.send_report(to, text)).await {
            Ok(Ok(())) => {
                info!("Message info sent to user: {to}");
                true
            }
            Ok(Err(e)) => {
                error!("Failed to send message to user {to}: {e}");
                false
            }
            Err(_) => {
                error!(
                    "Failed to send message to user {to}: timed out after {:?}",
                    self.cfg.relay_timeout
                );
                false
            }
        }
    }

    /// Consume the source until it ends. Each message runs on its own task so
    /// slow deliveries never hold up the next event. The pending
    /// `next_message` call is never dropped; finished tasks are reaped
    /// between receives.
    pub async fn run(&self, mut source: Box<dyn UpdateSource>) -> Result<()> {
        let mut tasks = JoinSet::new();

        loop {
            let next = source.next_message().await;

            while let Some(joined) = tasks.try_join_next() {
                reap(joined);
            }

            let msg = match next {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(e) => {
                    error!("update stream failed: {e}");
                    drain(&mut tasks).await;
                    return Err(e);
                }
            };
            let monitor = self.clone();
            tasks.spawn(async move { monitor.process(&msg).await });
        }

        debug!("update stream ended; waiting for in-flight deliveries");
        drain(&mut tasks).await;
        Ok(())
    }
}

async fn drain(tasks: &mut JoinSet<Disposition>) {
    while let Some(joined) = tasks.join_next().await {
        reap(joined);
    }
}

fn reap(joined: std::result::Result<Disposition, tokio::task::JoinError>) {
    match joined {
        Ok(disposition) => trace!(?disposition, "message handled"),
        Err(e) => error!("Error handling message: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        config::MessageFilters,
        domain::MessageId,
        errors::Error,
        messaging::types::{ChatInfo, ChatKind, SenderInfo},
    };

    #[derive(Default)]
    struct RecordingRelay {
        sent: Mutex<Vec<(RecipientId, String)>>,
        failing: Vec<RecipientId>,
        hanging: Vec<RecipientId>,
    }

    #[async_trait]
    impl RelayPort for RecordingRelay {
        async fn send_report(&self, to: RecipientId, text: &str) -> Result<()> {
            if self.hanging.contains(&to) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&to) {
                return Err(Error::Relay(format!("chat {to} not found")));
            }
            self.sent.lock().unwrap().push((to, text.to_string()));
            Ok(())
        }
    }

    impl RecordingRelay {
        fn recipients(&self) -> Vec<RecipientId> {
            let mut ids: Vec<_> = self.sent.lock().unwrap().iter().map(|(to, _)| *to).collect();
            ids.sort_by_key(|r| r.0);
            ids
        }
    }

    struct ScriptedSource {
        queue: VecDeque<Result<InboundMessage>>,
    }

    #[async_trait]
    impl UpdateSource for ScriptedSource {
        async fn next_message(&mut self) -> Result<Option<InboundMessage>> {
            self.queue.pop_front().transpose()
        }
    }

    /// Takes an item, then yields to the runtime before handing it over.
    struct SlowSource {
        queue: VecDeque<InboundMessage>,
    }

    #[async_trait]
    impl UpdateSource for SlowSource {
        async fn next_message(&mut self) -> Result<Option<InboundMessage>> {
            let item = self.queue.pop_front();
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(item)
        }
    }

    fn config(recipients: &[i64], filters: MessageFilters) -> Arc<Config> {
        Arc::new(Config {
            api_id: 1,
            api_hash: "hash".to_string(),
            user_session: "test".to_string(),
            phone_number: None,
            bot_token: "token".to_string(),
            target_users: recipients.iter().copied().map(RecipientId).collect(),
            relay_timeout: Duration::from_millis(200),
            filters,
            log_level: tracing::level_filters::LevelFilter::INFO,
        })
    }

    fn hi_from(chat_id: i64) -> InboundMessage {
        InboundMessage {
            id: MessageId(5),
            chat: Some(ChatInfo::new(chat_id, Some(ChatKind::Group))),
            sender: Some(SenderInfo::new(99)),
            text: Some("hi".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn accepted_message_reaches_every_recipient_once() {
        let relay = Arc::new(RecordingRelay::default());
        let monitor = Monitor::new(config(&[1, 2, 3], MessageFilters::default()), relay.clone());

        let outcome = monitor.process(&hi_from(-10)).await;

        assert_eq!(
            outcome,
            Disposition::Relayed(DeliverySummary {
                delivered: 3,
                failed: 0
            })
        );
        assert_eq!(
            relay.recipients(),
            vec![RecipientId(1), RecipientId(2), RecipientId(3)]
        );
        let sent = relay.sent.lock().unwrap();
        assert!(sent[0].1.starts_with("📨 *New Message Detected*\n\n🕒 *Time:* "));
        assert!(sent[0].1.contains("📝 *Text:* hi\n"));
        assert!(sent.iter().all(|(_, text)| text == &sent[0].1));
    }

    #[tokio::test]
    async fn excluded_chat_triggers_no_delivery() {
        let relay = Arc::new(RecordingRelay::default());
        let mut filters = MessageFilters::default();
        filters.excluded_chats.insert(-10);
        let monitor = Monitor::new(config(&[1, 2], filters), relay.clone());

        assert_eq!(monitor.process(&hi_from(-10)).await, Disposition::Filtered);
        assert!(relay.recipients().is_empty());
    }

    #[tokio::test]
    async fn own_messages_are_dropped_after_filtering() {
        let relay = Arc::new(RecordingRelay::default());
        let monitor = Monitor::new(config(&[1], MessageFilters::default()), relay.clone());

        let mut msg = hi_from(-10);
        if let Some(sender) = msg.sender.as_mut() {
            sender.is_self = true;
        }
        assert_eq!(monitor.process(&msg).await, Disposition::OwnMessage);

        // A filtered own message reports as filtered: the predicate runs first.
        msg.chat = None;
        assert_eq!(monitor.process(&msg).await, Disposition::Filtered);
        assert!(relay.recipients().is_empty());
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_stop_the_rest() {
        let relay = Arc::new(RecordingRelay {
            failing: vec![RecipientId(2)],
            ..Default::default()
        });
        let monitor = Monitor::new(config(&[1, 2, 3], MessageFilters::default()), relay.clone());

        let outcome = monitor.process(&hi_from(-10)).await;

        assert_eq!(
            outcome,
            Disposition::Relayed(DeliverySummary {
                delivered: 2,
                failed: 1
            })
        );
        assert_eq!(relay.recipients(), vec![RecipientId(1), RecipientId(3)]);
    }

    #[tokio::test]
    async fn hung_recipient_times_out() {
        let relay = Arc::new(RecordingRelay {
            hanging: vec![RecipientId(1)],
            ..Default::default()
        });
        let monitor = Monitor::new(config(&[1, 2], MessageFilters::default()), relay.clone());

        let outcome = monitor.process(&hi_from(-10)).await;

        assert_eq!(
            outcome,
            Disposition::Relayed(DeliverySummary {
                delivered: 1,
                failed: 1
            })
        );
        assert_eq!(relay.recipients(), vec![RecipientId(2)]);
    }

    #[tokio::test]
    async fn no_recipients_means_nothing_sent() {
        let relay = Arc::new(RecordingRelay::default());
        let monitor = Monitor::new(config(&[], MessageFilters::default()), relay.clone());

        assert_eq!(
            monitor.process(&hi_from(-10)).await,
            Disposition::Relayed(DeliverySummary::default())
        );
    }

    #[tokio::test]
    async fn run_processes_each_event_once_and_finishes_in_flight_work() {
        let relay = Arc::new(RecordingRelay::default());
        let mut filters = MessageFilters::default();
        filters.excluded_chats.insert(-20);
        let monitor = Monitor::new(config(&[7], filters), relay.clone());

        let source = ScriptedSource {
            queue: VecDeque::from(vec![
                Ok(hi_from(-10)),
                Ok(hi_from(-20)),
                Ok(InboundMessage::default()),
                Ok(hi_from(-30)),
            ]),
        };

        monitor.run(Box::new(source)).await.unwrap();

        assert_eq!(relay.recipients(), vec![RecipientId(7), RecipientId(7)]);
    }

    #[tokio::test]
    async fn run_never_loses_an_item_taken_by_a_slow_source() {
        let relay = Arc::new(RecordingRelay::default());
        let monitor = Monitor::new(config(&[7], MessageFilters::default()), relay.clone());

        let source = SlowSource {
            queue: (0..5).map(|i| hi_from(-10 - i)).collect(),
        };

        monitor.run(Box::new(source)).await.unwrap();

        assert_eq!(relay.recipients().len(), 5);
    }

    struct PanickingRelay;

    #[async_trait]
    impl RelayPort for PanickingRelay {
        async fn send_report(&self, _to: RecipientId, _text: &str) -> Result<()> {
            panic!("relay blew up");
        }
    }

    #[tokio::test]
    async fn panicked_handler_is_reaped_and_run_continues() {
        let monitor = Monitor::new(
            config(&[7], MessageFilters::default()),
            Arc::new(PanickingRelay),
        );

        let source = SlowSource {
            queue: VecDeque::from(vec![hi_from(-10), hi_from(-11), hi_from(-12)]),
        };

        monitor.run(Box::new(source)).await.unwrap();
    }

    #[tokio::test]
    async fn run_surfaces_transport_failure() {
        let relay = Arc::new(RecordingRelay::default());
        let monitor = Monitor::new(config(&[7], MessageFilters::default()), relay.clone());

        let source = ScriptedSource {
            queue: VecDeque::from(vec![
                Ok(hi_from(-10)),
                Err(Error::Session("connection reset".to_string())),
                Ok(hi_from(-30)),
            ]),
        };

        let err = monitor.run(Box::new(source)).await.unwrap_err();
        assert!(matches!(err, Error::Session(_)));
        // The message accepted before the failure is still delivered.
        assert_eq!(relay.recipients(), vec![RecipientId(7)]);
    }
}
