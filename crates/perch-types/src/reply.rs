//! Reply context derived from an inbound message.

use serde::{Deserialize, Serialize};

/// Who a reply addresses and how much text fits after addressing.
///
/// Pure derivation of one message; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyContext {
    /// Mentioned screen names, in entity order.
    pub mentioned_usernames: Vec<String>,
    /// Raw text with the mention spans cut out.
    pub mentionless_text: String,
    /// Author first, then cc'd users. Never contains the agent itself.
    pub reply_recipients: Vec<String>,
    /// `"@a @b "` -- every recipient, space separated, one trailing space.
    pub reply_prefix: String,
    /// Characters left for the reply body. Negative when the prefix alone
    /// exceeds the platform limit.
    pub char_budget: i64,
    /// True when the message is a direct mention of the agent (not a reshare).
    pub mentions_self: bool,
}

impl ReplyContext {
    /// Full outbound text for a reply body.
    pub fn compose(&self, body: &str) -> String {
        format!("{}{}", self.reply_prefix, body)
    }

    /// Whether `body` fits the remaining budget.
    pub fn fits(&self, body: &str) -> bool {
        (body.chars().count() as i64) <= self.char_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReplyContext {
        ReplyContext {
            mentioned_usernames: vec!["bot".to_string()],
            mentionless_text: "hello".to_string(),
            reply_recipients: vec!["carol".to_string()],
            reply_prefix: "@carol ".to_string(),
            char_budget: 5,
            mentions_self: true,
        }
    }

    #[test]
    fn test_compose_prepends_prefix() {
        assert_eq!(context().compose("hi"), "@carol hi");
    }

    #[test]
    fn test_fits_counts_chars() {
        let ctx = context();
        assert!(ctx.fits("héllo"));
        assert!(!ctx.fits("hellos"));
    }
}
