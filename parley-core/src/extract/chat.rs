use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::{ParleyError, ParseError};
use crate::types::ChatMessage;

const TIMESTAMP_FORMATS: [&str; 2] = ["%d.%m.%Y, %H:%M:%S", "%d/%m/%Y, %H:%M:%S"];

/// Bidi marks some exporters wrap phone numbers in.
const INVISIBLE_MARKS: [char; 3] = ['\u{202a}', '\u{202c}', '\u{200e}'];

/// A parsed chat export (`[dd.mm.yyyy, HH:MM:SS] Sender: message` lines).
///
/// Every dated line becomes an entry, in file order. Dated lines without a
/// `": "` separator (joins, leaves, subject changes) are kept with an empty
/// sender: they still count towards a message limit but never reach the
/// graph. Undated lines are continuation text and are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatExport {
    pub messages: Vec<ChatMessage>,
    pub skipped_lines: usize,
}

impl ChatExport {
    pub fn parse(content: &str) -> Self {
        let mut export = Self::default();

        for line in content.lines() {
            match parse_line(line) {
                Some(message) => export.messages.push(message),
                None => export.skipped_lines += 1,
            }
        }

        debug!(
            messages = export.messages.len(),
            skipped = export.skipped_lines,
            "Parsed chat export"
        );
        export
    }

    /// Read and parse a chat export, failing when nothing in it is dated.
    pub fn from_path(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let export = Self::parse(&content);
        if export.messages.is_empty() {
            return Err(ParleyError::Parse(ParseError::Empty(
                path.display().to_string(),
            )));
        }
        info!(
            path = %path.display(),
            messages = export.messages.len(),
            participants = export.participants().len(),
            "Loaded chat export"
        );
        Ok(export)
    }

    /// Distinct non-empty senders in order of first appearance.
    pub fn participants(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for m in &self.messages {
            if !m.sender.is_empty() && !seen.contains(&m.sender.as_str()) {
                seen.push(m.sender.as_str());
            }
        }
        seen
    }
}

fn parse_line(line: &str) -> Option<ChatMessage> {
    let line = line.trim_start_matches(INVISIBLE_MARKS);
    let rest = line.strip_prefix('[')?;
    let (stamp, body) = rest.split_once("] ")?;
    let timestamp = parse_timestamp(stamp)?;

    if !body.contains(": ") {
        return Some(ChatMessage {
            timestamp,
            sender: String::new(),
            content: body.trim().to_string(),
        });
    }

    let (sender, content) = body.split_once(':').unwrap_or((body, ""));
    Some(ChatMessage {
        timestamp,
        sender: clean_sender(sender),
        content: content.trim().to_string(),
    })
}

fn parse_timestamp(stamp: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp.trim(), fmt).ok())
}

/// Strip the `~` display-name marker, bidi marks and whitespace.
pub fn clean_sender(raw: &str) -> String {
    raw.chars()
        .filter(|c| !INVISIBLE_MARKS.contains(c))
        .collect::<String>()
        .trim_matches(|c: char| c == '~' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
[01.03.2024, 09:15:00] Alice: Good morning everyone
[01.03.2024, 09:16:30] ~ Bob: morning!
a continuation line without a timestamp
[01.03.2024, 09:17:00] \u{202a}+972 50-123-4567\u{202c}: hi: all
[01.03.2024, 09:18:00] Carol joined using this group's invite link
[99.99.2024, 09:19:00] Broken: date
";

    #[test]
    fn parses_dated_lines_in_order() {
        let export = ChatExport::parse(SAMPLE);
        assert_eq!(export.messages.len(), 4);
        assert_eq!(export.skipped_lines, 2);

        let first = &export.messages[0];
        assert_eq!(first.sender, "Alice");
        assert_eq!(first.content, "Good morning everyone");
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn cleans_sender_markers() {
        let export = ChatExport::parse(SAMPLE);
        assert_eq!(export.messages[1].sender, "Bob");
        assert_eq!(export.messages[2].sender, "+972 50-123-4567");
        // Only the first colon separates the sender.
        assert_eq!(export.messages[2].content, "hi: all");
    }

    #[test]
    fn system_lines_have_no_sender() {
        let export = ChatExport::parse(SAMPLE);
        assert_eq!(export.messages[3].sender, "");
        assert_eq!(export.participants(), vec!["Alice", "Bob", "+972 50-123-4567"]);
    }

    #[test]
    fn slash_dates_are_accepted() {
        let export = ChatExport::parse("[02/03/2024, 10:00:00] Dana: hello\n");
        assert_eq!(export.messages.len(), 1);
        assert_eq!(export.messages[0].timestamp.format("%Y-%m-%d").to_string(), "2024-03-02");
    }

    #[test]
    fn from_path_rejects_undated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, "nothing to see\n").unwrap();
        let err = ChatExport::from_path(&path).unwrap_err();
        assert!(matches!(err, ParleyError::Parse(ParseError::Empty(_))));
    }
}
