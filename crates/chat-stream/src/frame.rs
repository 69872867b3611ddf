use std::collections::VecDeque;

use futures::StreamExt as _;
use futures::stream;
use tracing::debug;

use crate::errors::ChatError;
use crate::transport::ByteStream;

/// One delimiter-bounded unit of the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: u64,
    text: String,
}

impl Frame {
    /// Zero-based arrival position within the session.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Frame content without the delimiter.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Reassembles frames from arbitrarily split network chunks.
///
/// Bytes are buffered until a `\n\n` (or `\r\n\r\n`) delimiter arrives; each
/// complete frame is then decoded as UTF-8 on its own. The delimiter is
/// ASCII, so a code point split across chunks is always rejoined before
/// decoding.
#[derive(Debug, Default)]
pub struct FrameReader {
    buf: Vec<u8>,
    next_index: u64,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every frame it completed, in order.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Frame> {
        // A delimiter may straddle the previous chunk boundary.
        let mut from = self.buf.len().saturating_sub(3);
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf, from) {
            let text = String::from_utf8_lossy(&self.buf[..idx]).into_owned();
            self.buf.drain(..idx + delim_len);
            frames.push(Frame {
                index: self.next_index,
                text,
            });
            self.next_index += 1;
            from = 0;
        }
        frames
    }

    /// Number of buffered bytes not yet terminated by a delimiter.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Drops the unterminated remainder at end of stream and returns how many
    /// bytes were discarded.
    pub fn discard_residual(&mut self) -> usize {
        let discarded = self.buf.len();
        self.buf.clear();
        discarded
    }
}

fn find_frame_delimiter(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// Turns a response byte stream into a lazy stream of frames.
///
/// The next chunk is only read once every frame from the previous one has
/// been taken, so a consumer that stops polling stops the network reads too.
/// A read error is yielded once and ends the stream.
pub fn frame_stream(
    chunks: ByteStream,
) -> impl futures::Stream<Item = Result<Frame, ChatError>> + Send {
    struct State {
        chunks: ByteStream,
        reader: FrameReader,
        pending: VecDeque<Frame>,
        done: bool,
    }

    stream::try_unfold(
        State {
            chunks,
            reader: FrameReader::new(),
            pending: VecDeque::new(),
            done: false,
        },
        |mut state| async move {
            loop {
                if let Some(frame) = state.pending.pop_front() {
                    return Ok(Some((frame, state)));
                }
                if state.done {
                    return Ok(None);
                }

                match state.chunks.next().await {
                    Some(Ok(chunk)) => {
                        state.pending.extend(state.reader.push_chunk(&chunk));
                    }
                    Some(Err(e)) => return Err(e),
                    None => {
                        let discarded = state.reader.discard_residual();
                        if discarded > 0 {
                            debug!(bytes = discarded, "dropping unterminated trailing frame");
                        }
                        state.done = true;
                    }
                }
            }
        },
    )
}
