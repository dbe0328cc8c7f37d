use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("threshold '{name}' must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: String, value: f64 },
    #[error("unknown strategy: \"{0}\" (expected review, remove_oldest, remove_newest or merge)")]
    UnknownStrategy(String),
    /// Zero records supplied. Callers may treat this as an empty success.
    #[error("no records supplied")]
    EmptyInput,
    #[error("missing column '{column}'")]
    MissingColumn { column: String },
    #[error("CSV error: {0}")]
    Csv(String),
}

impl DedupError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_) | Self::ThresholdOutOfRange { .. } | Self::UnknownStrategy(_)
        )
    }
}

impl From<csv::Error> for DedupError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

/// Failure resolving a single duplicate group. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("group {group_id}: member position {position} is outside the collection")]
    MemberOutOfRange { group_id: usize, position: usize },
    #[error("group {group_id}: fewer than two members")]
    TooSmall { group_id: usize },
}
