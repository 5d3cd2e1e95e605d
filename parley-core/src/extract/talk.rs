use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, info};

use crate::error::{ParleyError, ParseError};
use crate::types::ChatMessage;

/// Sender recorded for a bare `~~~~` without a user link.
pub const UNKNOWN_SENDER: &str = "Unknown";

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^==\s*([^=].*?)\s*==[ \t]*$").expect("valid heading regex")
});

// A user link followed on the same line by either a UTC timestamp or an
// unexpanded `~~~~`, or a bare `~~~~`.
static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \[\[User:(?P<user>[^|\]\n]+)(?:\|[^\]\n]*)?\]\]
        (?:
            [^\n]*?(?P<ts>\d{1,2}:\d{2},\ \d{1,2}\ [A-Za-z]+\ \d{4}\ \(UTC\))
          | \s*~~~~
        )
        | ~~~~
        ",
    )
    .expect("valid signature regex")
});

/// One `== heading ==` block of a talk page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkSection {
    /// `None` for text above the first heading.
    pub title: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Talk-page wikitext split into signed messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalkPage {
    pub sections: Vec<TalkSection>,
}

impl TalkPage {
    /// Split `content` into sections and each section into the text before
    /// every signature. Signatures without a readable timestamp are stamped
    /// with `imported_at`. Text after a section's last signature is unsigned
    /// and dropped.
    pub fn parse(content: &str, imported_at: NaiveDateTime) -> Self {
        let mut sections = Vec::new();
        let mut title = None;
        let mut body_start = 0;

        for caps in HEADING_RE.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_section(&mut sections, title.take(), &content[body_start..whole.start()], imported_at);
            title = Some(name.as_str().to_string());
            body_start = whole.end();
        }
        push_section(&mut sections, title, &content[body_start..], imported_at);

        let page = Self { sections };
        debug!(
            sections = page.sections.len(),
            messages = page.message_count(),
            "Parsed talk page"
        );
        page
    }

    /// Read a saved wikitext file, stamping unsigned-time messages with now.
    pub fn from_path(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let page = Self::parse(&content, Utc::now().naive_utc());
        if page.message_count() == 0 {
            return Err(ParleyError::Parse(ParseError::Empty(
                path.display().to_string(),
            )));
        }
        info!(path = %path.display(), messages = page.message_count(), "Loaded talk page");
        Ok(page)
    }

    pub fn message_count(&self) -> usize {
        self.sections.iter().map(|s| s.messages.len()).sum()
    }

    /// All messages in page order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.sections
            .iter()
            .flat_map(|s| s.messages.iter().cloned())
            .collect()
    }
}

fn push_section(
    sections: &mut Vec<TalkSection>,
    title: Option<String>,
    body: &str,
    imported_at: NaiveDateTime,
) {
    if body.trim().is_empty() && title.is_none() {
        return;
    }
    sections.push(TalkSection {
        title,
        messages: split_signed(body, imported_at),
    });
}

fn split_signed(body: &str, imported_at: NaiveDateTime) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    let mut last_end = 0;

    for caps in SIGNATURE_RE.captures_iter(body) {
        let Some(sig) = caps.get(0) else { continue };
        let text = body[last_end..sig.start()].trim();
        last_end = sig.end();
        if text.is_empty() {
            continue;
        }

        let sender = caps
            .name("user")
            .map_or(UNKNOWN_SENDER, |m| m.as_str().trim())
            .to_string();
        let timestamp = caps
            .name("ts")
            .and_then(|m| parse_signature_time(m.as_str()))
            .unwrap_or(imported_at);

        messages.push(ChatMessage {
            timestamp,
            sender,
            content: text.to_string(),
        });
    }

    messages
}

/// `HH:MM, D Month YYYY (UTC)` → naive UTC timestamp.
pub fn parse_signature_time(stamp: &str) -> Option<NaiveDateTime> {
    let stamp = stamp.trim().trim_end_matches("(UTC)").trim();
    NaiveDateTime::parse_from_str(stamp, "%H:%M, %d %B %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn imported() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    const PAGE: &str = "\
{{Talk header}}

== Infobox image ==
The current image is blurry. [[User:Alice|Alice]] ([[User talk:Alice|talk]]) 14:02, 3 March 2024 (UTC)
:Agreed, I can look for a better one. [[User:Bob]] 15:10, 3 March 2024 (UTC)
::Thanks! ~~~~
=== Sub-thread ===
Unrelated reply [[User:Carol|C]] ~~~~
left unsigned at the end

== Sources ==
Is the 2019 source reliable? [[User:Bob|Bob]] 09:00, 12 April 2024 (UTC)
";

    #[test]
    fn splits_sections_and_signatures() {
        let page = TalkPage::parse(PAGE, imported());
        let titles: Vec<_> = page.sections.iter().map(|s| s.title.as_deref()).collect();
        assert_eq!(titles, vec![None, Some("Infobox image"), Some("Sources")]);

        let infobox = &page.sections[1].messages;
        let senders: Vec<_> = infobox.iter().map(|m| m.sender.as_str()).collect();
        assert_eq!(senders, vec!["Alice", "Bob", UNKNOWN_SENDER, "Carol"]);
        assert_eq!(infobox[0].content, "The current image is blurry.");
        assert_eq!(page.message_count(), 5);
    }

    #[test]
    fn signature_timestamps_are_parsed() {
        let page = TalkPage::parse(PAGE, imported());
        let alice = &page.sections[1].messages[0];
        assert_eq!(
            alice.timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 3)
                .unwrap()
                .and_hms_opt(14, 2, 0)
                .unwrap()
        );
        // `~~~~` carries no time.
        assert_eq!(page.sections[1].messages[2].timestamp, imported());
    }

    #[test]
    fn unsigned_text_is_dropped() {
        let page = TalkPage::parse("Just a note with no signature.\n", imported());
        assert_eq!(page.message_count(), 0);
    }

    #[test]
    fn single_digit_day() {
        assert_eq!(
            parse_signature_time("09:05, 7 June 2023 (UTC)"),
            NaiveDate::from_ymd_opt(2023, 6, 7)
                .unwrap()
                .and_hms_opt(9, 5, 0)
        );
        assert!(parse_signature_time("yesterday").is_none());
    }
}
