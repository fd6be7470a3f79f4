//! Sensor input sources.
//!
//! The transport that actually produces readings lives outside this crate.
//! Sources only translate an external stream into [`SensorEvent`]s and push
//! them into the agent's channel; they never touch the cache directly.

use super::readings::SensorEvent;
use crate::error::{Result, TelemetryError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::SplitStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

/// Capacity of the event channel between sources and the agent.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Parse one JSON line into an event.
pub fn parse_event_line(line: &str) -> Result<SensorEvent> {
    serde_json::from_str(line).map_err(|e| TelemetryError::parse_error(e.to_string()))
}

/// Forward newline-delimited JSON events from `reader` into `events`.
///
/// Blank lines are skipped and malformed lines, including ones that are not
/// valid UTF-8, are logged and dropped. Returns the number of events forwarded
/// once the reader is exhausted or the receiving side has gone away. Only a
/// failing read ends the source early.
pub async fn forward_json_lines<R>(reader: R, events: mpsc::Sender<SensorEvent>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = SplitStream::new(reader.split(b'\n'));
    let mut forwarded = 0;

    while let Some(raw) = lines.next().await {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_event_line(trimmed) {
            Ok(event) => {
                debug!("Received {} reading", event.channel());
                if events.send(event).await.is_err() {
                    debug!("Event receiver closed, stopping input source");
                    break;
                }
                forwarded += 1;
            }
            Err(err) => warn!("Skipping malformed sensor line: {}", err),
        }
    }

    Ok(forwarded)
}

/// Spawn a task that reads sensor events from standard input.
pub fn spawn_stdin_source(events: mpsc::Sender<SensorEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        match forward_json_lines(stdin, events).await {
            Ok(count) => debug!("Standard input closed after {} events", count),
            Err(err) => warn!("Standard input source failed: {}", err),
        }
    })
}
