//! Line-oriented decoding of `data: <json>` stream frames

use serde::Deserialize;

/// Buffers raw byte chunks and yields complete lines.
///
/// Chunk boundaries carry no meaning: bytes are buffered as-is and only
/// complete lines are decoded as text, so a frame (or a multi-byte
/// character inside it) split across reads is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Drain the unterminated tail after the transport signals end-of-stream.
    ///
    /// Handles a final frame that lacks its trailing newline, e.g. when the
    /// remote closed the connection right after the last event.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }
}

/// Extract the JSON payload of a `data: ` frame.
///
/// Everything else (blank keep-alives, comments, other SSE fields) is not a
/// frame and yields `None`.
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data: ")
}

// Wire types for one streamed frame. Only `choices[0].delta.content` matters;
// every other field the endpoint sends is ignored.

#[derive(Debug, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    pub content: Option<String>,
}

/// Parse one `data: ` payload into its content fragment, if any.
///
/// Returns `Ok(None)` for control frames without content (including the
/// `[DONE]` sentinel some endpoints emit). A malformed payload is an error
/// for the caller to log and skip; it must never abort the stream.
pub fn content_fragment(payload: &str) -> Result<Option<String>, serde_json::Error> {
    if payload.trim() == "[DONE]" {
        return Ok(None);
    }
    let frame: StreamFrame = serde_json::from_str(payload)?;
    Ok(frame
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content))
}
