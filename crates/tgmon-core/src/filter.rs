use crate::{
    config::MessageFilters,
    messaging::types::{ChatKind, InboundMessage},
};

/// Decide whether a message warrants a report.
///
/// Rules short-circuit in order: chat present, chat not excluded, chat kind
/// included, text long enough, media allowed. Kinds no flag covers (bots,
/// unknown) are let through.
pub fn should_process(msg: &InboundMessage, filters: &MessageFilters) -> bool {
    let Some(chat) = &msg.chat else {
        return false;
    };

    if filters.excluded_chats.contains(&chat.id.0) {
        return false;
    }

    if let Some(kind) = chat.kind {
        let included = match kind {
            ChatKind::Private => filters.include_private_chats,
            ChatKind::Group | ChatKind::Supergroup => filters.include_groups,
            ChatKind::Channel => filters.include_channels,
            ChatKind::Bot => true,
        };
        if !included {
            return false;
        }
    }

    if let Some(text) = msg.text() {
        if text.chars().count() < filters.min_message_length {
            return false;
        }
    }

    if msg.media.is_some() && !filters.include_media {
        return false;
    }

    true
}

/// Messages written by the listening account itself are never reported.
///
/// Kept apart from [`should_process`]; the dispatch loop applies it second.
pub fn is_own_message(msg: &InboundMessage) -> bool {
    msg.sender.as_ref().is_some_and(|s| s.is_self)
}
