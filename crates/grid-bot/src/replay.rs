//! JSON-lines host adapter.
//!
//! Reads `HostEvent`s one per line (blank lines and `#` comments are
//! skipped) and writes emitted commands as JSON lines. No fills are
//! simulated: order outcomes must be present in the input.

use std::io::Write;
use std::path::Path;

use grid_core::OrderCommand;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::app::{HostEvent, OrderGateway};
use crate::error::{AppError, AppResult};

/// Parse one input line. `Ok(None)` for blank or comment lines.
pub fn parse_line(line: &str, line_no: usize) -> AppResult<Option<HostEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| AppError::Replay {
            line: line_no,
            reason: e.to_string(),
        })
}

/// Feed every event from `reader` into the actor queue.
///
/// Returns the number of events sent. Stops early after a `Shutdown` line.
pub async fn feed_reader<R>(reader: R, tx: &mpsc::Sender<HostEvent>) -> AppResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0;
    let mut sent = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(event) = parse_line(&line, line_no)? else {
            continue;
        };
        let is_shutdown = matches!(event, HostEvent::Shutdown);
        tx.send(event).await.map_err(|_| AppError::ChannelClosed)?;
        sent += 1;
        if is_shutdown {
            debug!(line_no, "Shutdown line reached");
            break;
        }
    }
    Ok(sent)
}

/// Feed every event from a JSONL file.
pub async fn feed_file(path: impl AsRef<Path>, tx: &mpsc::Sender<HostEvent>) -> AppResult<usize> {
    let path = path.as_ref();
    info!(path = %path.display(), "Replaying events");
    let file = File::open(path).await?;
    feed_reader(BufReader::new(file), tx).await
}

/// Gateway that writes each command as one JSON line.
pub struct JsonlGateway<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlGateway<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonlGateway<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> OrderGateway for JsonlGateway<W> {
    fn submit(&mut self, command: &OrderCommand) -> AppResult<()> {
        serde_json::to_writer(&mut self.writer, command)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
