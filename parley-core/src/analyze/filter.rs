use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::types::{AnalysisParams, ChatMessage, LimitType, pad_time, split_list};

/// Where the messages came from. The two sources differ in how `username`
/// matches and in whether the limit is applied before or after the
/// per-message filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterProfile {
    /// Exact (case-insensitive) username; limit before content filters.
    #[default]
    ChatExport,
    /// Substring username; limit after content filters.
    TalkThread,
}

/// Parse a `YYYY-MM-DD` date and optional `HH:MM[:SS]` time. A missing time
/// means midnight.
pub fn parse_datetime(date: &str, time: Option<&str>) -> Result<NaiveDateTime, ParseError> {
    let time = time
        .filter(|t| !t.trim().is_empty())
        .map_or_else(|| "00:00:00".to_string(), |t| pad_time(t.trim()));
    let value = format!("{} {time}", date.trim());
    NaiveDateTime::parse_from_str(&value, "%Y-%m-%d %H:%M:%S").map_err(|e| ParseError::DateTime {
        value,
        message: e.to_string(),
    })
}

fn bound(date: Option<&String>, time: Option<&String>, which: &str) -> Option<NaiveDateTime> {
    let date = date.filter(|d| !d.trim().is_empty())?;
    match parse_datetime(date, time.map(String::as_str)) {
        Ok(dt) => Some(dt),
        Err(e) => {
            warn!(bound = which, error = %e, "Ignoring unparsable date bound");
            None
        }
    }
}

// ── Message filter ─────────────────────────────────────────────────

/// Message-level filters compiled from [`AnalysisParams`].
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub limit: Option<usize>,
    pub limit_type: LimitType,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Lowercased.
    pub username: Option<String>,
    /// Lowercased.
    pub keywords: Vec<String>,
    pub profile: FilterProfile,
}

impl MessageFilter {
    pub fn from_params(params: &AnalysisParams, profile: FilterProfile) -> Self {
        Self {
            start: bound(params.start_date.as_ref(), params.start_time.as_ref(), "start"),
            end: bound(params.end_date.as_ref(), params.end_time.as_ref(), "end"),
            limit: params.limit.filter(|&l| l > 0),
            limit_type: params.limit_type,
            min_length: params.min_length.filter(|&l| l > 0),
            max_length: params.max_length.filter(|&l| l > 0),
            username: params
                .username
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_lowercase),
            keywords: split_list(params.keywords.as_deref())
                .into_iter()
                .map(|k| k.to_lowercase())
                .collect(),
            profile,
        }
    }

    fn in_window(&self, m: &ChatMessage) -> bool {
        self.start.is_none_or(|s| m.timestamp >= s) && self.end.is_none_or(|e| m.timestamp <= e)
    }

    fn accepts(&self, m: &ChatMessage) -> bool {
        let length = m.content.chars().count();
        if self.min_length.is_some_and(|min| length < min)
            || self.max_length.is_some_and(|max| length > max)
        {
            return false;
        }

        if let Some(username) = &self.username {
            let sender = m.sender.to_lowercase();
            let matched = match self.profile {
                FilterProfile::ChatExport => sender == *username,
                FilterProfile::TalkThread => sender.contains(username.as_str()),
            };
            if !matched {
                return false;
            }
        }

        if !self.keywords.is_empty() {
            let content = m.content.to_lowercase();
            if !self.keywords.iter().any(|k| content.contains(k.as_str())) {
                return false;
            }
        }

        true
    }

    fn take_limit(&self, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        match (self.limit, self.limit_type) {
            (Some(n), LimitType::First) => messages.into_iter().take(n).collect(),
            (Some(n), LimitType::Last) => {
                let skip = messages.len().saturating_sub(n);
                messages.into_iter().skip(skip).collect()
            }
            _ => messages,
        }
    }

    /// Filter messages, keeping their order.
    pub fn apply(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let windowed: Vec<ChatMessage> =
            messages.iter().filter(|m| self.in_window(m)).cloned().collect();

        let kept = match self.profile {
            FilterProfile::ChatExport => self
                .take_limit(windowed)
                .into_iter()
                .filter(|m| self.accepts(m))
                .collect(),
            FilterProfile::TalkThread => {
                self.take_limit(windowed.into_iter().filter(|m| self.accepts(m)).collect())
            }
        };

        debug!(
            input = messages.len(),
            kept = kept.len(),
            profile = ?self.profile,
            "Filtered messages"
        );
        kept
    }
}

// ── Anonymizer ─────────────────────────────────────────────────────

/// Replaces sender names with `Phone_k` / `User_k`, k counting distinct
/// senders in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Anonymizer {
    aliases: HashMap<String, String>,
}

impl Anonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(&mut self, sender: &str) -> String {
        if let Some(alias) = self.aliases.get(sender) {
            return alias.clone();
        }
        let k = self.aliases.len() + 1;
        let alias = if looks_like_phone(sender) {
            format!("Phone_{k}")
        } else {
            format!("User_{k}")
        };
        self.aliases.insert(sender.to_string(), alias.clone());
        alias
    }
}

/// `+` followed only by digits, spaces, dashes and parentheses, with at
/// least five digits.
pub fn looks_like_phone(sender: &str) -> bool {
    let Some(rest) = sender.trim().strip_prefix('+') else {
        return false;
    };
    rest.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
        && rest.chars().filter(char::is_ascii_digit).count() >= 5
}

// ── Participant filter ─────────────────────────────────────────────

/// Participant-level filters applied to per-sender message counts.
#[derive(Debug, Clone, Default)]
pub struct ParticipantFilter {
    pub min_messages: Option<u64>,
    pub max_messages: Option<u64>,
    pub active_users: Option<usize>,
    /// Lowercased.
    pub selected_users: Vec<String>,
}

impl ParticipantFilter {
    pub fn from_params(params: &AnalysisParams) -> Self {
        Self {
            min_messages: params.min_messages.filter(|&m| m > 0),
            max_messages: params.max_messages.filter(|&m| m > 0),
            active_users: params.active_users.filter(|&n| n > 0),
            selected_users: split_list(params.selected_users.as_deref())
                .into_iter()
                .map(|u| u.to_lowercase())
                .collect(),
        }
    }

    /// Participants that survive, from `(name, count)` pairs in
    /// first-appearance order. `original_of` maps a displayed (possibly
    /// anonymized) name back to the real one so `selected_users` can name
    /// either.
    pub fn retain<'a>(
        &self,
        counts: &'a [(String, u64)],
        original_of: &HashMap<String, String>,
    ) -> HashSet<&'a str> {
        let mut kept: Vec<&(String, u64)> = counts
            .iter()
            .filter(|(_, c)| self.min_messages.is_none_or(|min| *c >= min))
            .filter(|(_, c)| self.max_messages.is_none_or(|max| *c <= max))
            .collect();

        if let Some(n) = self.active_users {
            // Stable sort keeps first-appearance order among equal counts.
            kept.sort_by(|a, b| b.1.cmp(&a.1));
            kept.truncate(n);
        }

        if !self.selected_users.is_empty() {
            kept.retain(|(name, _)| {
                let shown = name.to_lowercase();
                let original = original_of.get(name).map(|o| o.to_lowercase());
                self.selected_users
                    .iter()
                    .any(|s| *s == shown || original.as_ref() == Some(s))
            });
        }

        kept.into_iter().map(|(name, _)| name.as_str()).collect()
    }
}
