//! Canned-reply composer driven by `reply_templates` from config.
//!
//! Templates are used round-robin. `{text}` expands to the mention-stripped
//! text of the message (or the DM body). Timeline messages are never
//! answered, and an agent without templates stays silent.

use std::sync::atomic::{AtomicUsize, Ordering};

use perch_core::agent::ReplyComposer;
use perch_types::notification::Notification;

/// Placeholder replaced with the incoming text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

#[derive(Debug, Default)]
pub struct TemplateComposer {
    templates: Vec<String>,
    next: AtomicUsize,
}

impl TemplateComposer {
    pub fn new(templates: Vec<String>) -> Self {
        Self {
            templates,
            next: AtomicUsize::new(0),
        }
    }

    fn next_template(&self) -> Option<&str> {
        if self.templates.is_empty() {
            return None;
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.templates.len();
        Some(self.templates[idx].as_str())
    }
}

impl ReplyComposer for TemplateComposer {
    async fn compose(&self, notification: &Notification) -> Option<String> {
        let incoming = match notification {
            Notification::Mention { context, .. } => context.mentionless_text.as_str(),
            Notification::DirectMessage { message } => message.text.as_str(),
            _ => return None,
        };
        let template = self.next_template()?;
        Some(template.replace(TEXT_PLACEHOLDER, incoming))
    }
}
