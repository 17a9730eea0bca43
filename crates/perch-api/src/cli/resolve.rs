//! `perch resolve`: print the reply context an agent would derive for a
//! message, with every mentioned user assumed includable.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use perch_core::mention::MentionResolver;
use perch_types::message::Message;
use perch_types::reply::ReplyContext;
use tokio::io::AsyncReadExt;

pub async fn resolve(username: &str, limit: usize, message: Option<&Path>, json: bool) -> Result<()> {
    let raw = match message {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    let context = resolve_text(username, limit, &raw)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }

    println!();
    println!("  Recipients:   {}", context.reply_recipients.join(", "));
    println!("  Prefix:       {:?}", context.reply_prefix);
    println!("  Budget:       {}", budget_style(context.char_budget));
    println!("  Text:         {}", context.mentionless_text);
    println!("  Mentions me:  {}", context.mentions_self);
    println!();
    Ok(())
}

fn budget_style(budget: i64) -> String {
    if budget > 0 {
        format!("{}", style(budget).green())
    } else {
        format!("{}", style(budget).red())
    }
}

/// Parse a message and resolve it for `username`.
fn resolve_text(username: &str, limit: usize, raw: &str) -> Result<ReplyContext> {
    let message: Message = serde_json::from_str(raw).context("parsing message JSON")?;
    let resolver = MentionResolver::new(username.trim_start_matches('@'), limit);
    Ok(resolver.resolve(&message, |_| true))
}
