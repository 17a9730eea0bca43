//! JSON-lines inbound event source.
//!
//! Each non-blank line is one `InboundEvent`. Lines that fail to parse are
//! logged and skipped; the reader never stops on bad input. Reading ends at
//! EOF or when the consumer drops its receiver.

use std::path::Path;

use perch_types::error::SourceError;
use perch_types::event::InboundEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Parse one line. `Ok(None)` for blank lines.
pub fn parse_event_line(line: &str) -> Result<Option<InboundEvent>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

/// Forward every event in `reader` to `tx`. Returns the number forwarded.
pub async fn forward_events<R>(reader: R, tx: mpsc::Sender<InboundEvent>) -> Result<u64, SourceError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut forwarded = 0u64;
    let mut line_no = 0u64;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| SourceError::Io(e.to_string()))?
    {
        line_no += 1;
        let event = match parse_event_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(line = line_no, "skipping malformed event: {err}");
                continue;
            }
        };
        tx.send(event).await.map_err(|_| SourceError::Closed)?;
        forwarded += 1;
    }

    tracing::debug!(forwarded, "event source reached end of input");
    Ok(forwarded)
}

/// Forward events from `path`, or from stdin when `path` is `None` or `-`.
pub async fn forward_events_from(
    path: Option<&Path>,
    tx: mpsc::Sender<InboundEvent>,
) -> Result<u64, SourceError> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;
            forward_events(file, tx).await
        }
        _ => forward_events(tokio::io::stdin(), tx).await,
    }
}
