//! Event-stream decoding for the Ask-AI answer endpoint.
//!
//! The service answers with a chunked body of UTF-8 text frames separated
//! by a blank line:
//!
//! ```text
//! event: message
//! data: {"token": "Hel"}
//!
//! event: end
//! data:
//! ```
//!
//! Chunk boundaries carry no meaning: a multi-byte character, a `data:`
//! line, or the blank-line delimiter itself may be split across two
//! network chunks. This module reassembles the byte stream into complete
//! [`Frame`]s regardless of how the transport fragmented it.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;

/// Incremental UTF-8 decoder.
///
/// Holds back a trailing incomplete multi-byte sequence and prefixes it
/// onto the next chunk. Invalid bytes anywhere, or an unfinished sequence
/// at end of stream, are decode errors rather than silently dropped data.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Decode the next chunk, returning the text that is complete so far.
    pub(crate) fn decode(&mut self, chunk: &[u8]) -> Result<String, ClientError> {
        self.pending.extend_from_slice(chunk);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            Err(e) if e.error_len().is_some() => {
                // Not a chunk boundary artifact: the bytes themselves are bad.
                self.pending.clear();
                Err(ClientError::Decode(e))
            }
            Err(e) => {
                let valid = e.valid_up_to();
                // The prefix below `valid` is known-good UTF-8, so the lossy
                // conversion never substitutes anything.
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                Ok(text)
            }
        }
    }

    /// Called at end of stream. Leftover bytes mean the stream was cut
    /// inside a multi-byte character.
    pub(crate) fn finish(&mut self) -> Result<(), ClientError> {
        match std::str::from_utf8(&self.pending) {
            Ok(_) => Ok(()),
            Err(e) => {
                self.pending.clear();
                Err(ClientError::Decode(e))
            }
        }
    }
}

/// Accumulates decoded text and splits it into complete frames.
///
/// Frames come out in exactly the order their delimiters occur in the
/// logical concatenation of all pushed text.
#[derive(Debug, Default)]
pub(crate) struct FrameSplitter {
    buffer: String,
}

impl FrameSplitter {
    pub(crate) fn push_text(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Pop the next complete frame, if the buffer holds one.
    pub(crate) fn next_frame(&mut self) -> Option<String> {
        let pos = self.buffer.find("\n\n")?;
        let raw = self.buffer[..pos].to_string();
        self.buffer.drain(..pos + 2);
        Some(raw)
    }

    /// Called at end of stream. A non-whitespace remainder means the
    /// final frame never got its delimiter.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

/// Event names this service emits.
///
/// The vocabulary is closed so dispatch can match exhaustively; anything
/// unrecognized lands in `Other` and is skipped by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventName {
    /// An incremental answer token (also the default for unlabeled frames)
    Message,
    /// Terminal completion marker
    End,
    /// Terminal failure reported by the service
    Error,
    /// Anything else
    Other(String),
}

impl EventName {
    fn parse(name: &str) -> Self {
        match name {
            "message" => EventName::Message,
            "end" => EventName::End,
            "error" => EventName::Error,
            other => EventName::Other(other.to_string()),
        }
    }
}

/// One delimiter-bounded block of the stream: an event name and its data
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: EventName,
    pub data: String,
}

/// Parse one raw frame into its event name and data payload.
///
/// A line starting with `event:` names the event (default `message` when
/// absent); each `data:` line contributes to the payload, multiple lines
/// joined with `\n`; `:` comment lines and unknown fields are ignored.
/// Returns `None` for frames carrying no fields at all (e.g. keepalive
/// comments).
///
/// # Example
/// ```
/// use askai::sse::{parse_frame, EventName};
///
/// let frame = parse_frame("event: message\ndata: {\"token\":\"Hi\"}").unwrap();
/// assert_eq!(frame.event, EventName::Message);
/// assert_eq!(frame.data, "{\"token\":\"Hi\"}");
///
/// assert!(parse_frame(": keepalive").is_none());
/// ```
pub fn parse_frame(raw: &str) -> Option<Frame> {
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;

    for line in raw.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(EventName::parse(rest.trim()));
            saw_field = true;
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim());
            saw_field = true;
        }
        // Unknown field lines are tolerated and skipped.
    }

    if !saw_field {
        return None;
    }

    Some(Frame {
        event: event.unwrap_or(EventName::Message),
        data: data_lines.join("\n"),
    })
}

/// Decode a byte-chunk stream into a stream of complete frames.
///
/// Chunks are processed strictly in arrival order; the emitted frame
/// sequence is independent of how the transport happened to fragment the
/// bytes. After the transport ends, leftover undecodable bytes surface as
/// a decode error and a non-empty undelimited remainder as a protocol
/// error; either terminates the stream.
pub fn frame_stream<S, E>(bytes: S) -> impl Stream<Item = Result<Frame, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<ClientError> + Send,
{
    let state = (
        Box::pin(bytes),
        Utf8Decoder::default(),
        FrameSplitter::default(),
        false, // transport exhausted
        false, // stream terminated (post-error or post-cleanup)
    );

    stream::unfold(
        state,
        |(mut bytes, mut decoder, mut splitter, mut ended, done)| async move {
            if done {
                return None;
            }

            loop {
                // Drain complete frames already buffered before pulling
                // more bytes off the wire.
                while let Some(raw) = splitter.next_frame() {
                    if let Some(frame) = parse_frame(&raw) {
                        return Some((Ok(frame), (bytes, decoder, splitter, ended, false)));
                    }
                }

                if ended {
                    if let Err(e) = decoder.finish() {
                        return Some((Err(e), (bytes, decoder, splitter, ended, true)));
                    }
                    if let Some(rest) = splitter.finish() {
                        tracing::debug!(remainder = %rest, "stream ended mid-frame");
                        let err = ClientError::Protocol(
                            "stream ended with an unterminated frame".to_string(),
                        );
                        return Some((Err(err), (bytes, decoder, splitter, ended, true)));
                    }
                    return None;
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => match decoder.decode(&chunk) {
                        Ok(text) => splitter.push_text(&text),
                        Err(e) => {
                            return Some((Err(e), (bytes, decoder, splitter, ended, true)));
                        }
                    },
                    Some(Err(e)) => {
                        return Some((Err(e.into()), (bytes, decoder, splitter, ended, true)));
                    }
                    None => {
                        ended = true;
                    }
                }
            }
        },
    )
}

/// Extension trait for `reqwest::Response` to decode an answer-frame body.
pub trait FrameStreamExt {
    /// Convert the response body into a stream of decoded frames.
    fn answer_frames(self) -> impl Stream<Item = Result<Frame, ClientError>> + Send;
}

impl FrameStreamExt for reqwest::Response {
    fn answer_frames(self) -> impl Stream<Item = Result<Frame, ClientError>> + Send {
        frame_stream(self.bytes_stream())
    }
}
