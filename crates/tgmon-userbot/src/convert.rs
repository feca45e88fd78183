use grammers_client::{
    grammers_tl_types as tl,
    session::PackedType,
    types::{Chat, Media, Message},
};

use tgmon_core::{
    domain::MessageId,
    messaging::types::{ChatInfo, ChatKind, InboundMessage, MediaKind, SenderInfo},
};

pub(crate) fn inbound_message(message: &Message) -> InboundMessage {
    let media = message.media().map(|m| media_kind(&m));
    let (text, caption) = route_body(non_empty(message.text()), media);

    InboundMessage {
        id: MessageId(message.id()),
        chat: Some(chat_info(&message.chat())),
        sender: message.sender().and_then(|s| sender_info(&s)),
        text,
        caption,
        media,
        is_reply: message.reply_to_message_id().is_some(),
        is_forwarded: message.forward_header().is_some(),
    }
}

fn chat_info(chat: &Chat) -> ChatInfo {
    let mut info = ChatInfo::new(chat.id(), Some(chat_kind(chat.pack().ty)));
    match chat {
        Chat::User(_) => info.first_name = non_empty(chat.name()),
        Chat::Group(_) | Chat::Channel(_) => info.title = non_empty(chat.name()),
    }
    info.username = chat.username().and_then(non_empty);
    info
}

// Channel-signed posts and anonymous admins have no user sender.
fn sender_info(sender: &Chat) -> Option<SenderInfo> {
    let Chat::User(user) = sender else {
        return None;
    };
    Some(SenderInfo {
        id: tgmon_core::domain::UserId(user.id()),
        first_name: non_empty(sender.name()),
        last_name: user.last_name().and_then(non_empty),
        username: user.username().and_then(non_empty),
        is_self: user.is_self(),
    })
}

/// Split the message body into `(text, caption)`.
///
/// MTProto carries a media caption in the message text. A link preview is
/// not a captioned attachment, so its body stays text.
pub(crate) fn route_body(
    body: Option<String>,
    media: Option<MediaKind>,
) -> (Option<String>, Option<String>) {
    match media {
        Some(kind) if kind != MediaKind::WebPage => (None, body),
        _ => (body, None),
    }
}

pub(crate) fn chat_kind(ty: PackedType) -> ChatKind {
    match ty {
        PackedType::User => ChatKind::Private,
        PackedType::Bot => ChatKind::Bot,
        PackedType::Chat => ChatKind::Group,
        PackedType::Megagroup | PackedType::Gigagroup => ChatKind::Supergroup,
        PackedType::Broadcast => ChatKind::Channel,
    }
}

fn media_kind(media: &Media) -> MediaKind {
    match media {
        Media::Photo(_) => MediaKind::Photo,
        Media::Document(doc) => {
            let attrs: Vec<DocAttr> = match &doc.raw.document {
                Some(tl::enums::Document::Document(d)) => {
                    d.attributes.iter().map(doc_attr).collect()
                }
                _ => Vec::new(),
            };
            document_kind(doc.mime_type(), &attrs)
        }
        Media::Sticker(_) => MediaKind::Sticker,
        Media::Contact(_) => MediaKind::Contact,
        Media::Poll(_) => MediaKind::Poll,
        Media::Geo(_) => MediaKind::Location,
        Media::Dice(_) => MediaKind::Dice,
        Media::Venue(_) => MediaKind::Venue,
        Media::WebPage(_) => MediaKind::WebPage,
        _ => MediaKind::Other,
    }
}

/// The document attributes that decide how a file is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DocAttr {
    Animated,
    Video { round: bool },
    Audio { voice: bool },
    Other,
}

fn doc_attr(attr: &tl::enums::DocumentAttribute) -> DocAttr {
    match attr {
        tl::enums::DocumentAttribute::Animated => DocAttr::Animated,
        tl::enums::DocumentAttribute::Video(v) => DocAttr::Video {
            round: v.round_message,
        },
        tl::enums::DocumentAttribute::Audio(a) => DocAttr::Audio { voice: a.voice },
        _ => DocAttr::Other,
    }
}

/// Classify a document: attributes first (animation, then video, then
/// audio), the MIME type only when no attribute says anything.
pub(crate) fn document_kind(mime: Option<&str>, attrs: &[DocAttr]) -> MediaKind {
    if attrs.contains(&DocAttr::Animated) {
        return MediaKind::Animation;
    }
    for attr in attrs {
        match *attr {
            DocAttr::Video { round: true } => return MediaKind::VideoNote,
            DocAttr::Video { round: false } => return MediaKind::Video,
            _ => {}
        }
    }
    for attr in attrs {
        match *attr {
            DocAttr::Audio { voice: true } => return MediaKind::Voice,
            DocAttr::Audio { voice: false } => return MediaKind::Audio,
            _ => {}
        }
    }

    match mime.map(str::to_ascii_lowercase) {
        Some(m) if m.starts_with("video/") => MediaKind::Video,
        Some(m) if m.starts_with("audio/") => MediaKind::Audio,
        _ => MediaKind::Document,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
