use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("agent username is not configured")]
    MissingUsername,

    #[error("no agents configured")]
    NoAgents,

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("config file error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Failures reported by the outbound action sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The platform says the action was already done (already favorited,
    /// already retweeted, already following).
    #[error("{action} already performed")]
    AlreadyPerformed { action: &'static str },

    #[error("rate limited by platform")]
    RateLimited,

    #[error("rejected by platform: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl ActionError {
    pub fn is_already_performed(&self) -> bool {
        matches!(self, ActionError::AlreadyPerformed { .. })
    }
}

/// Errors from an inbound event source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("event source io error: {0}")]
    Io(String),

    #[error("event source closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            field: "message_length_limit",
            reason: "must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for 'message_length_limit': must be greater than zero"
        );
        assert_eq!(
            ConfigError::MissingUsername.to_string(),
            "agent username is not configured"
        );
    }

    #[test]
    fn test_action_error_display_and_kind() {
        let err = ActionError::AlreadyPerformed { action: "favorite" };
        assert_eq!(err.to_string(), "favorite already performed");
        assert!(err.is_already_performed());
        assert!(!ActionError::RateLimited.is_already_performed());
    }
}
