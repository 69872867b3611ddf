use serde::Deserialize;

use crate::errors::MalformedFrame;
use crate::frame::Frame;

/// Field prefix carried by every event line.
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends a stream normally.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Classification of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Blank frame or only SSE comment lines; nothing to do.
    Ignored,
    /// Incremental text. May be empty.
    Delta(String),
    /// The termination sentinel was received.
    Complete,
}

#[derive(Deserialize)]
struct ChunkEnvelope {
    #[serde(default)]
    choices: Option<Vec<ChunkChoice>>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Classifies a frame as a delta, the end of the stream, or nothing.
///
/// Only `choices[0].delta.content` is read; a missing or null field along
/// that path is an empty delta. A payload that does not decode as the
/// envelope is returned as [`MalformedFrame`]. SSE comment lines are
/// skipped before the rest of the frame is read.
pub fn parse_frame(frame: &Frame) -> Result<FrameEvent, MalformedFrame> {
    let content = strip_comment_lines(frame.as_str());
    let trimmed = content.trim();
    let payload = trimmed.strip_prefix(DATA_PREFIX).unwrap_or(trimmed).trim();
    if payload.is_empty() {
        return Ok(FrameEvent::Ignored);
    }
    if payload == DONE_SENTINEL {
        return Ok(FrameEvent::Complete);
    }

    let envelope: ChunkEnvelope =
        serde_json::from_str(payload).map_err(|e| MalformedFrame {
            frame_index: frame.index(),
            payload: payload.to_string(),
            reason: e.to_string(),
        })?;
    let text = envelope
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .unwrap_or_default();
    Ok(FrameEvent::Delta(text))
}

fn strip_comment_lines(text: &str) -> String {
    text.split('\n')
        .filter(|line| !line.trim_start().starts_with(':'))
        .collect::<Vec<_>>()
        .join("\n")
}
