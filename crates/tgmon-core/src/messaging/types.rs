use crate::domain::{ChatId, MessageId, UserId};

/// Read-only view of a message received by the listening session.
///
/// Session-specific fields should be mapped away in the adapter; only what the
/// filter and formatter need lives here.
#[derive(Clone, Debug, Default)]
pub struct InboundMessage {
    pub id: MessageId,
    pub chat: Option<ChatInfo>,
    pub sender: Option<SenderInfo>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media: Option<MediaKind>,
    pub is_reply: bool,
    pub is_forwarded: bool,
}

impl InboundMessage {
    /// Message text, with an empty string treated as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Media caption, with an empty string treated as absent.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Clone, Debug)]
pub struct ChatInfo {
    pub id: ChatId,
    pub kind: Option<ChatKind>,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

impl ChatInfo {
    pub fn new(id: i64, kind: Option<ChatKind>) -> Self {
        Self {
            id: ChatId(id),
            kind,
            title: None,
            first_name: None,
            username: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Private,
    Bot,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Bot => "bot",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }
}

#[derive(Clone, Debug)]
pub struct SenderInfo {
    pub id: UserId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_self: bool,
}

impl SenderInfo {
    pub fn new(id: i64) -> Self {
        Self {
            id: UserId(id),
            first_name: None,
            last_name: None,
            username: None,
            is_self: false,
        }
    }

    /// First and last name joined and trimmed; empty when both are missing.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Voice,
    VideoNote,
    Animation,
    Document,
    Sticker,
    Contact,
    Location,
    Venue,
    Poll,
    Dice,
    WebPage,
    Other,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Voice => "voice",
            MediaKind::VideoNote => "video_note",
            MediaKind::Animation => "animation",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
            MediaKind::Contact => "contact",
            MediaKind::Location => "location",
            MediaKind::Venue => "venue",
            MediaKind::Poll => "poll",
            MediaKind::Dice => "dice",
            MediaKind::WebPage => "web_page",
            MediaKind::Other => "unknown",
        }
    }
}
