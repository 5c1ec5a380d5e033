//! Session layer: turns decoded frames into typed [`AnswerEvent`]s.
//!
//! One call to [`answer_events`] governs one streaming session. The
//! session yields zero or more tokens and then exactly one terminal
//! outcome: `AnswerEvent::End` on success, or an error item on failure.
//! Nothing is yielded after the terminal item, whatever the transport
//! still delivers.

use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;
use crate::model::{AnswerEvent, ErrorPayload, TokenPayload};
use crate::sse::{EventName, Frame};

/// Fallback when an error frame carries no parseable message.
const GENERIC_STREAM_ERROR: &str = "AI stream reported an error";

/// Drive a frame stream through the session state machine.
///
/// - `message` frames (and unlabeled ones) carry `{"token": ...}` and
///   yield [`AnswerEvent::Token`]; a frame with a malformed payload is
///   skipped and the session continues.
/// - an `end` frame yields [`AnswerEvent::End`] and stops the session;
///   trailing frames are never pulled.
/// - an `error` frame fails the session with the service's message, or a
///   generic one when the payload is absent or unparseable.
/// - a transport that closes without a terminal frame counts as a clean
///   completion only when at least one token was dispatched and no
///   partial frame was pending; otherwise the session fails.
pub fn answer_events<S>(frames: S) -> impl Stream<Item = Result<AnswerEvent, ClientError>> + Send
where
    S: Stream<Item = Result<Frame, ClientError>> + Send,
{
    let state = (
        Box::pin(frames),
        false, // dispatched at least one token
        false, // reached a terminal outcome
    );

    stream::unfold(state, |(mut frames, mut saw_token, finished)| async move {
        if finished {
            return None;
        }

        loop {
            match frames.next().await {
                Some(Ok(frame)) => match frame.event {
                    EventName::Message => {
                        match serde_json::from_str::<TokenPayload>(&frame.data) {
                            Ok(payload) => {
                                saw_token = true;
                                let event = AnswerEvent::Token(payload.token);
                                return Some((Ok(event), (frames, saw_token, false)));
                            }
                            Err(e) => {
                                // One bad token frame does not end the session.
                                tracing::warn!(error = %e, "skipping token frame with malformed payload");
                            }
                        }
                    }
                    EventName::End => {
                        return Some((Ok(AnswerEvent::End), (frames, saw_token, true)));
                    }
                    EventName::Error => {
                        let message = serde_json::from_str::<ErrorPayload>(&frame.data)
                            .map(|p| p.message)
                            .unwrap_or_else(|_| GENERIC_STREAM_ERROR.to_string());
                        let err = ClientError::Answer(message);
                        return Some((Err(err), (frames, saw_token, true)));
                    }
                    EventName::Other(name) => {
                        tracing::debug!(event = %name, "ignoring unrecognized event");
                    }
                },
                Some(Err(e)) => {
                    return Some((Err(e), (frames, saw_token, true)));
                }
                None => {
                    // Transport closed without an explicit terminal frame.
                    let outcome = if saw_token {
                        Ok(AnswerEvent::End)
                    } else {
                        Err(ClientError::Protocol(
                            "stream ended unexpectedly".to_string(),
                        ))
                    };
                    return Some((outcome, (frames, saw_token, true)));
                }
            }
        }
    })
}
