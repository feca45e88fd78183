//! Report formatting (inbound message → legacy-Markdown summary).

use chrono::{Local, NaiveDateTime};

use crate::messaging::types::InboundMessage;

pub const TEXT_PREVIEW_LEN: usize = 200;
pub const CAPTION_PREVIEW_LEN: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REPORT_HEADING: &str = "📨 *New Message Detected*";

/// Escape the characters legacy Telegram Markdown treats as style markers.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Keep the first `max_chars` characters, appending `...` if anything was cut.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = s.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}

/// Summarize a message, stamped with the local wall clock.
pub fn format_message_info(msg: &InboundMessage) -> String {
    format_message_info_at(msg, Local::now().naive_local())
}

pub fn format_message_info_at(msg: &InboundMessage, now: NaiveDateTime) -> String {
    let mut lines = Vec::new();

    lines.push(format!("🕒 *Time:* {}", now.format(TIMESTAMP_FORMAT)));

    if let Some(chat) = &msg.chat {
        let title = chat
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(chat.first_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Unknown");
        let kind = chat.kind.map(|k| k.as_str()).unwrap_or("unknown");

        lines.push(format!("💬 *Chat:* {}", escape_markdown(title)));
        lines.push(format!("🏷️ *Type:* {}", title_case(kind)));
        lines.push(format!("🔗 *Username:* {}", handle(chat.username.as_deref())));
        lines.push(format!("🆔 *Chat ID:* `{}`", chat.id.0));
    }

    if let Some(sender) = &msg.sender {
        lines.push(format!(
            "👤 *Sender:* {}",
            escape_markdown(&sender.display_name())
        ));
        lines.push(format!(
            "🔗 *Sender Username:* {}",
            handle(sender.username.as_deref())
        ));
        lines.push(format!("🆔 *Sender ID:* `{}`", sender.id.0));
    }

    if let Some(text) = msg.text() {
        lines.push(format!(
            "📝 *Text:* {}",
            escape_markdown(&truncate_text(text, TEXT_PREVIEW_LEN))
        ));
    }

    if let Some(media) = msg.media {
        lines.push(format!("📎 *Media:* {}", media.label().to_uppercase()));

        if let Some(caption) = msg.caption() {
            lines.push(format!(
                "📄 *Caption:* {}",
                escape_markdown(&truncate_text(caption, CAPTION_PREVIEW_LEN))
            ));
        }
    }

    if msg.is_reply {
        lines.push("↩️ *Reply:* This is a reply to another message".to_string());
    }

    if msg.is_forwarded {
        lines.push("🔄 *Forwarded:* This is a forwarded message".to_string());
    }

    lines.push(format!("🔗 *Message ID:* `{}`", msg.id.0));

    lines.join("\n")
}

/// Full text handed to the relay: heading, blank line, report.
pub fn relay_text(report: &str) -> String {
    format!("{REPORT_HEADING}\n\n{report}")
}

fn handle(username: Option<&str>) -> String {
    match username.filter(|u| !u.is_empty()) {
        Some(u) => format!("@{}", escape_markdown(u)),
        None => "No username".to_string(),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
