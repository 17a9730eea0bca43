//! Mention resolution: who a reply addresses and how much text remains.
//!
//! Given an inbound message and the agent's own identity, computes the reply
//! recipients (author first, self and low-include-credit users dropped), the
//! `@a @b ` prefix, the remaining character budget, and the text with mention
//! spans cut out.

use perch_types::message::{MentionEntity, Message, same_user};
use perch_types::reply::ReplyContext;
use thiserror::Error;
use tracing::warn;

/// Text prefix that marks a manual reshare ("RT @someone: ...").
pub const RESHARE_MARKER: &str = "RT ";

/// Why a message's mention offsets could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    #[error("mention @{name} has start {start} after end {end}")]
    Inverted {
        name: String,
        start: usize,
        end: usize,
    },

    #[error("mention @{name} ends at {end}, text has {len} chars")]
    OutOfBounds { name: String, end: usize, len: usize },

    #[error("mention @{name} overlaps the following mention")]
    Overlapping { name: String },
}

/// Derives a `ReplyContext` for messages seen by one agent.
#[derive(Debug, Clone)]
pub struct MentionResolver {
    self_username: String,
    message_length_limit: usize,
}

impl MentionResolver {
    pub fn new(self_username: impl Into<String>, message_length_limit: usize) -> Self {
        Self {
            self_username: self_username.into(),
            message_length_limit,
        }
    }

    pub fn self_username(&self) -> &str {
        &self.self_username
    }

    fn is_self(&self, username: &str) -> bool {
        same_user(username, &self.self_username)
    }

    /// Resolve `message` into a reply context.
    ///
    /// `can_include` reports whether a mentioned user may be cc'd; it is
    /// never consulted for the author, who is always addressed first.
    pub fn resolve(&self, message: &Message, can_include: impl Fn(&str) -> bool) -> ReplyContext {
        let text = message.text_or_empty();

        let mentioned_usernames: Vec<String> = message
            .mentions
            .iter()
            .map(|m| m.screen_name.clone())
            .collect();

        let candidates = std::iter::once(message.author.as_str()).chain(
            mentioned_usernames
                .iter()
                .map(String::as_str)
                .filter(|name| !self.is_self(name))
                .filter(|name| can_include(name)),
        );

        let mut reply_recipients: Vec<String> = Vec::new();
        for name in candidates {
            if !reply_recipients
                .iter()
                .any(|seen| same_user(seen, name))
            {
                reply_recipients.push(name.to_string());
            }
        }

        let reply_prefix = format!(
            "{} ",
            reply_recipients
                .iter()
                .map(|name| format!("@{name}"))
                .collect::<Vec<_>>()
                .join(" ")
        );
        let char_budget =
            self.message_length_limit as i64 - reply_prefix.chars().count() as i64;

        let mentionless_text = match strip_mentions(text, &message.mentions) {
            Ok(stripped) => stripped,
            Err(e) => {
                warn!(
                    message_id = message.id,
                    error = %e,
                    "malformed mention offsets, using raw text"
                );
                text.to_string()
            }
        };

        let mentions_self = mentioned_usernames.iter().any(|name| self.is_self(name))
            && !message.is_reshare
            && !text.starts_with(RESHARE_MARKER);

        ReplyContext {
            mentioned_usernames,
            mentionless_text,
            reply_recipients,
            reply_prefix,
            char_budget,
            mentions_self,
        }
    }
}

/// Byte offset of the `idx`-th char, or the text length when `idx` is one
/// past the last char.
fn byte_offset(text: &str, idx: usize) -> Option<usize> {
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(idx)
}

/// Cut every mention span out of `text`.
///
/// Spans are cut from the last to the first so earlier offsets stay valid.
/// At each cut the remainder after the span is trimmed.
pub fn strip_mentions(text: &str, mentions: &[MentionEntity]) -> Result<String, OffsetError> {
    let len = text.chars().count();

    let mut ordered: Vec<&MentionEntity> = mentions.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut next_start = len;
    for m in &ordered {
        if m.start > m.end {
            return Err(OffsetError::Inverted {
                name: m.screen_name.clone(),
                start: m.start,
                end: m.end,
            });
        }
        if m.end > len {
            return Err(OffsetError::OutOfBounds {
                name: m.screen_name.clone(),
                end: m.end,
                len,
            });
        }
        if m.end > next_start {
            return Err(OffsetError::Overlapping {
                name: m.screen_name.clone(),
            });
        }
        next_start = m.start;
    }

    let mut result = text.to_string();
    for m in ordered {
        let (Some(start), Some(end)) = (byte_offset(&result, m.start), byte_offset(&result, m.end))
        else {
            return Err(OffsetError::OutOfBounds {
                name: m.screen_name.clone(),
                end: m.end,
                len,
            });
        };
        let tail = result[end..].trim().to_string();
        result.truncate(start);
        result.push_str(&tail);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn message(author: &str, text: &str, mentions: Vec<MentionEntity>) -> Message {
        Message {
            id: 100,
            author: author.to_string(),
            text: Some(text.to_string()),
            mentions,
            is_reshare: false,
            created_at: Utc::now(),
        }
    }

    /// Build mention entities by locating each `@name` in `text`.
    fn entities(text: &str, names: &[&str]) -> Vec<MentionEntity> {
        names
            .iter()
            .map(|name| {
                let token = format!("@{name}");
                let byte = text.find(&token).expect("mention in text");
                let start = text[..byte].chars().count();
                MentionEntity::new(*name, start, start + token.chars().count())
            })
            .collect()
    }

    #[test]
    fn resolves_recipients_prefix_and_text() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "@alice hello @bob";
        let msg = message("carol", text, entities(text, &["alice", "bob"]));

        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.reply_recipients, vec!["carol", "alice", "bob"]);
        assert_eq!(ctx.reply_prefix, "@carol @alice @bob ");
        assert_eq!(ctx.mentionless_text, "hello");
        assert_eq!(ctx.char_budget, 140 - "@carol @alice @bob ".len() as i64);
        assert!(!ctx.mentions_self);
    }

    #[test]
    fn self_is_never_a_recipient() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "@Bot @alice what do you think";
        let msg = message("carol", text, entities(text, &["Bot", "alice"]));

        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.reply_recipients, vec!["carol", "alice"]);
        assert_eq!(ctx.mentioned_usernames, vec!["Bot", "alice"]);
        assert!(ctx.mentions_self);
        assert_eq!(ctx.mentionless_text, "what do you think");
    }

    #[test]
    fn low_include_credit_users_are_dropped_but_author_stays() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "@bot @alice @bob hi";
        let msg = message("carol", text, entities(text, &["bot", "alice", "bob"]));

        let ctx = resolver.resolve(&msg, |name| name != "alice" && name != "carol");
        assert_eq!(ctx.reply_recipients, vec!["carol", "bob"]);
        assert_eq!(ctx.reply_prefix, "@carol @bob ");
    }

    #[test]
    fn duplicates_are_removed_keeping_first() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "@Carol @bot @alice @ALICE";
        let mentions = vec![
            MentionEntity::new("Carol", 0, 6),
            MentionEntity::new("bot", 7, 11),
            MentionEntity::new("alice", 12, 18),
            MentionEntity::new("ALICE", 19, 25),
        ];
        let msg = message("carol", text, mentions);

        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.reply_recipients, vec!["carol", "alice"]);
        assert_eq!(ctx.mentionless_text, "");
    }

    #[test]
    fn reshares_do_not_mention_self() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "RT @bot: something clever";
        let msg = message("carol", text, entities(text, &["bot"]));
        assert!(!resolver.resolve(&msg, |_| true).mentions_self);

        let text = "@bot look at this";
        let mut flagged = message("carol", text, entities(text, &["bot"]));
        flagged.is_reshare = true;
        assert!(!resolver.resolve(&flagged, |_| true).mentions_self);
    }

    #[test]
    fn budget_can_go_negative() {
        let resolver = MentionResolver::new("bot", 10);
        let text = "@someone_long hi";
        let msg = message("another_long_name", text, entities(text, &["someone_long"]));
        let ctx = resolver.resolve(&msg, |_| true);
        assert!(ctx.char_budget < 0);
    }

    #[test]
    fn offsets_are_chars_not_bytes() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "héllo @bot ça va";
        let msg = message("carol", text, entities(text, &["bot"]));
        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.mentionless_text, "héllo ça va");
    }

    #[test]
    fn malformed_offsets_fall_back_to_raw_text() {
        let resolver = MentionResolver::new("bot", 140);
        let text = "@bot hi";
        let msg = message("carol", text, vec![MentionEntity::new("bot", 0, 99)]);
        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.mentionless_text, text);
        assert!(ctx.mentions_self);
        assert_eq!(ctx.reply_prefix, "@carol ");
    }

    #[test]
    fn strip_mentions_reports_each_error_kind() {
        let text = "@a @b";
        assert!(matches!(
            strip_mentions(text, &[MentionEntity::new("a", 3, 1)]),
            Err(OffsetError::Inverted { .. })
        ));
        assert!(matches!(
            strip_mentions(text, &[MentionEntity::new("a", 0, 6)]),
            Err(OffsetError::OutOfBounds { len: 5, .. })
        ));
        assert!(matches!(
            strip_mentions(
                text,
                &[MentionEntity::new("a", 0, 4), MentionEntity::new("b", 3, 5)]
            ),
            Err(OffsetError::Overlapping { .. })
        ));
    }

    #[test]
    fn strip_mentions_without_entities_is_identity() {
        assert_eq!(strip_mentions("  plain text ", &[]).unwrap(), "  plain text ");
    }

    #[test]
    fn missing_text_resolves_to_empty() {
        let resolver = MentionResolver::new("bot", 140);
        let mut msg = message("carol", "", vec![]);
        msg.text = None;
        let ctx = resolver.resolve(&msg, |_| true);
        assert_eq!(ctx.mentionless_text, "");
        assert_eq!(ctx.reply_prefix, "@carol ");
    }

    proptest! {
        #[test]
        fn budget_is_limit_minus_prefix(
            names in proptest::collection::vec("[a-z]{1,12}", 0..6),
            limit in 1usize..400,
        ) {
            let resolver = MentionResolver::new("bot", limit);
            let text = names.iter().map(|n| format!("@{n}")).collect::<Vec<_>>().join(" ");
            let msg = message("author", &text, entities(&text, &names.iter().map(String::as_str).collect::<Vec<_>>()));
            let ctx = resolver.resolve(&msg, |_| true);
            prop_assert_eq!(
                ctx.char_budget,
                limit as i64 - ctx.reply_prefix.chars().count() as i64
            );
            prop_assert!(ctx.reply_prefix.ends_with(' '));
            prop_assert!(ctx.reply_recipients[0] == "author");
        }
    }
}
