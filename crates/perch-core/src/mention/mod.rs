//! Mention resolution for replies.

pub mod resolver;

pub use resolver::{MentionResolver, OffsetError, RESHARE_MARKER, strip_mentions};
