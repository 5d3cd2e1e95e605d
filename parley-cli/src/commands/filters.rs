use clap::Args;

use parley_core::types::{AnalysisParams, LimitType};

/// Message and participant filters shared by the analysis commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep messages on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Time of day for --start-date (HH:MM or HH:MM:SS)
    #[arg(long)]
    pub start_time: Option<String>,

    /// Keep messages on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Time of day for --end-date (HH:MM or HH:MM:SS)
    #[arg(long)]
    pub end_time: Option<String>,

    /// Keep at most this many messages
    #[arg(long)]
    pub limit: Option<usize>,

    /// Which messages --limit keeps: first, last, all
    #[arg(long, default_value = "first", value_parser = ["first", "last", "all"])]
    pub limit_type: String,

    /// Minimum message length in characters
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Maximum message length in characters
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Comma-separated keywords; a message must contain one
    #[arg(long)]
    pub keywords: Option<String>,

    /// Only messages from this sender
    #[arg(long)]
    pub username: Option<String>,

    /// Drop participants with fewer messages
    #[arg(long)]
    pub min_messages: Option<u64>,

    /// Drop participants with more messages
    #[arg(long)]
    pub max_messages: Option<u64>,

    /// Keep only the N most active participants
    #[arg(long)]
    pub active_users: Option<usize>,

    /// Comma-separated participants to keep
    #[arg(long)]
    pub selected_users: Option<String>,

    /// Replace participant names with User_k / Phone_k
    #[arg(long)]
    pub anonymize: bool,
}

impl FilterArgs {
    pub fn to_params(&self) -> anyhow::Result<AnalysisParams> {
        let limit_type: LimitType = self
            .limit_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
        let params = AnalysisParams {
            start_date: self.start_date.clone(),
            start_time: self.start_time.clone(),
            end_date: self.end_date.clone(),
            end_time: self.end_time.clone(),
            limit: self.limit,
            limit_type,
            min_length: self.min_length,
            max_length: self.max_length,
            keywords: self.keywords.clone(),
            min_messages: self.min_messages,
            max_messages: self.max_messages,
            active_users: self.active_users,
            selected_users: self.selected_users.clone(),
            username: self.username.clone(),
            anonymize: self.anonymize,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_params() {
        let args = FilterArgs {
            limit: Some(20),
            limit_type: "last".into(),
            keywords: Some("rust,graph".into()),
            anonymize: true,
            ..FilterArgs::default()
        };
        let params = args.to_params().unwrap();
        assert_eq!(params.limit, Some(20));
        assert_eq!(params.limit_type, LimitType::Last);
        assert!(params.anonymize);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let args = FilterArgs {
            limit_type: "first".into(),
            min_messages: Some(10),
            max_messages: Some(2),
            ..FilterArgs::default()
        };
        assert!(args.to_params().is_err());
    }
}
