//! Configuration types for Perch.
//!
//! `PerchConfig` represents the top-level `perch.toml`. Each `[[agents]]`
//! table is one `AgentConfig`; the process runs one engine per agent.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerchConfig {
    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,

    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

impl PerchConfig {
    /// Validate every agent. Fails on the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::NoAgents);
        }
        for agent in &self.agents {
            agent.validate()?;
        }
        Ok(())
    }
}

/// Settings for one agent identity.
///
/// Everything except `username` has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The agent's own screen name. Required.
    #[serde(default)]
    pub username: Option<String>,

    /// Users the agent never engages with (blocked on sight).
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Optional file with one blacklisted username per line, reloaded on
    /// every maintenance run.
    #[serde(default)]
    pub blacklist_file: Option<PathBuf>,

    /// Idle time after which a user's session is discarded.
    #[serde(default = "default_session_expiry_secs")]
    pub session_expiry_secs: u64,

    /// Messages a suspected bot may send before the agent stops replying.
    #[serde(default = "default_bot_exchange_cap")]
    pub bot_exchange_cap: usize,

    /// Gap under which three consecutive messages count as rapid-fire.
    #[serde(default = "default_rapid_reply_window_secs")]
    pub rapid_reply_window_secs: u64,

    /// Platform message length limit in characters.
    #[serde(default = "default_message_length_limit")]
    pub message_length_limit: usize,

    /// Maximum number of message ids kept for deduplication.
    #[serde(default = "default_seen_capacity")]
    pub seen_capacity: u64,

    /// How long a processed message id is remembered.
    #[serde(default = "default_seen_ttl_secs")]
    pub seen_ttl_secs: u64,

    /// Cron expression or human form ("every 5 minutes").
    #[serde(default = "default_maintenance_schedule")]
    pub maintenance_schedule: String,

    /// Follow users back when they follow the agent.
    #[serde(default)]
    pub follow_back: bool,

    /// Canned reply bodies used by the built-in composer. `{text}` expands to
    /// the mention-stripped text of the message being answered.
    #[serde(default)]
    pub reply_templates: Vec<String>,
}

fn default_session_expiry_secs() -> u64 {
    600
}

fn default_bot_exchange_cap() -> usize {
    2
}

fn default_rapid_reply_window_secs() -> u64 {
    30
}

fn default_message_length_limit() -> usize {
    140
}

fn default_seen_capacity() -> u64 {
    10_000
}

fn default_seen_ttl_secs() -> u64 {
    86_400
}

fn default_maintenance_schedule() -> String {
    "every 5 minutes".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            username: None,
            blacklist: Vec::new(),
            blacklist_file: None,
            session_expiry_secs: default_session_expiry_secs(),
            bot_exchange_cap: default_bot_exchange_cap(),
            rapid_reply_window_secs: default_rapid_reply_window_secs(),
            message_length_limit: default_message_length_limit(),
            seen_capacity: default_seen_capacity(),
            seen_ttl_secs: default_seen_ttl_secs(),
            maintenance_schedule: default_maintenance_schedule(),
            follow_back: false,
            reply_templates: Vec::new(),
        }
    }
}

impl AgentConfig {
    /// Config for `username` with every other field defaulted.
    pub fn for_user(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    /// The agent's own username, without a leading `@`.
    pub fn own_username(&self) -> Result<&str, ConfigError> {
        self.username
            .as_deref()
            .map(|name| name.trim().trim_start_matches('@'))
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingUsername)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.own_username()?;
        if self.message_length_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "message_length_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.seen_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "seen_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.session_expiry_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "session_expiry_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_expiry_secs)
    }

    pub fn rapid_reply_window(&self) -> Duration {
        Duration::from_secs(self.rapid_reply_window_secs)
    }

    pub fn seen_ttl(&self) -> Duration {
        Duration::from_secs(self.seen_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults() {
        let config: AgentConfig = toml::from_str(r#"username = "bot""#).unwrap();
        assert_eq!(config.own_username().unwrap(), "bot");
        assert_eq!(config.session_expiry_secs, 600);
        assert_eq!(config.bot_exchange_cap, 2);
        assert_eq!(config.rapid_reply_window_secs, 30);
        assert_eq!(config.message_length_limit, 140);
        assert_eq!(config.seen_capacity, 10_000);
        assert_eq!(config.maintenance_schedule, "every 5 minutes");
        assert!(config.blacklist.is_empty());
        assert!(!config.follow_back);
    }

    #[test]
    fn test_missing_username_is_rejected() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingUsername)
        ));

        let blank = AgentConfig::for_user("  @ ");
        assert!(matches!(blank.validate(), Err(ConfigError::MissingUsername)));
    }

    #[test]
    fn test_own_username_strips_at_sign() {
        let config = AgentConfig::for_user("@perch_bot");
        assert_eq!(config.own_username().unwrap(), "perch_bot");
    }

    #[test]
    fn test_zero_limit_is_invalid() {
        let config = AgentConfig {
            message_length_limit: 0,
            ..AgentConfig::for_user("bot")
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "message_length_limit",
                ..
            })
        ));
    }

    #[test]
    fn test_perch_config_with_agents() {
        let toml_str = r#"
otel = true

[[agents]]
username = "first_bot"
blacklist = ["spammer", "Troll"]
session_expiry_secs = 300

[[agents]]
username = "second_bot"
follow_back = true
reply_templates = ["thanks!", "you said: {text}"]
"#;
        let config: PerchConfig = toml::from_str(toml_str).unwrap();
        assert!(config.otel);
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].blacklist, vec!["spammer", "Troll"]);
        assert_eq!(config.agents[0].session_expiry_secs, 300);
        assert!(config.agents[1].follow_back);
        assert_eq!(config.agents[1].reply_templates.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_perch_config_requires_agents() {
        let config = PerchConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoAgents)));
    }
}
