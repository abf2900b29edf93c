//! A [`Transport`] that replays a recorded chunk capture from disk.
//!
//! A capture holds one raw chunk per line, either bare JSON or an SSE
//! `data: {...}` line as copied from a vendor stream. Blank lines and SSE
//! comments are skipped; `data: [DONE]` stops the replay.

use std::path::PathBuf;

use futures_util::stream;
use serde_json::Value;

use parley_providers::{ChunkStream, RequestParams, Transport, TransportError};
use parley_types::Message;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone)]
pub struct ReplayTransport {
    path: PathBuf,
}

impl ReplayTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Transport for ReplayTransport {
    async fn open(
        &self,
        messages: Vec<Message>,
        params: RequestParams,
    ) -> Result<ChunkStream, TransportError> {
        tracing::info!(
            path = %self.path.display(),
            messages = messages.len(),
            model = params.get("model").and_then(serde_json::Value::as_str).unwrap_or("-"),
            "Replaying capture"
        );

        let capture = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| TransportError::Connect(format!("{}: {err}", self.path.display())))?;

        Ok(Box::pin(stream::iter(parse_capture(&capture))))
    }
}

/// Splits a capture into stream items. Parsing stops after the first malformed
/// line, which becomes a [`TransportError::Stream`] at that position.
pub fn parse_capture(capture: &str) -> Vec<Result<Value, TransportError>> {
    let mut items = Vec::new();

    for (number, line) in capture.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let payload = match line.strip_prefix("data:") {
            Some(rest) => rest.trim_start(),
            None => line,
        };
        if payload == DONE_MARKER {
            break;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value) => items.push(Ok(value)),
            Err(err) => {
                items.push(Err(TransportError::Stream(format!(
                    "capture line {}: {err}",
                    number + 1
                ))));
                break;
            }
        }
    }

    items
}
