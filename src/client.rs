//! Ask-AI client entry points and error types.

use futures::stream::{AbortHandle, AbortRegistration, Abortable};
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use thiserror::Error;

use crate::http::{add_extra_headers, build_http_client};
use crate::model::{AnswerEvent, AskRequest};
use crate::options::TransportOptions;
use crate::sse::FrameStreamExt;
use crate::stream::answer_events;

const ASK_PATH: &str = "/api/ai/ask";

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service error: {0}")]
    Api(String),

    #[error("AI answer failed: {0}")]
    Answer(String),

    #[error("invalid UTF-8 in answer stream: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("stream cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Callback surface for a streaming answer session.
///
/// For each session the client calls `on_token` zero or more times, then
/// exactly one of `on_end` or `on_error` — unless the session is
/// cancelled, in which case no further callbacks fire at all.
pub trait AnswerHandler {
    /// One incremental fragment of the answer arrived.
    fn on_token(&mut self, token: &str);

    /// The answer completed.
    fn on_end(&mut self);

    /// The session failed.
    fn on_error(&mut self, error: &ClientError);
}

/// Client for the Ask-AI streaming answer endpoint.
pub struct AskAiClient {
    transport_options: TransportOptions,
}

impl AskAiClient {
    /// Create a new client with the given transport options.
    pub fn new(transport_options: TransportOptions) -> Self {
        Self { transport_options }
    }

    /// Get reference to the transport options.
    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// Send a question and return the decoded answer stream.
    ///
    /// The returned stream yields [`AnswerEvent::Token`] items as the
    /// answer is generated and terminates after [`AnswerEvent::End`] or a
    /// single error item. Dropping the stream releases the connection.
    pub async fn ask_stream(
        &self,
        request: &AskRequest,
    ) -> Result<impl Stream<Item = Result<AnswerEvent, ClientError>> + Send, ClientError> {
        let transport = &self.transport_options;

        let bearer_token = transport
            .http
            .bearer_token
            .as_ref()
            .ok_or_else(|| ClientError::Config("bearer token is required".to_string()))?;

        let base_url = transport
            .http
            .base_url
            .as_deref()
            .ok_or_else(|| ClientError::Config("base URL is required".to_string()))?;

        let url = format!("{}{}", base_url.trim_end_matches('/'), ASK_PATH);

        let http_client = build_http_client(transport)?;

        let mut req = http_client
            .post(&url)
            .header(
                AUTHORIZATION,
                format!("Bearer {}", bearer_token.expose_secret()),
            )
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream");

        req = add_extra_headers(req, &transport.http.extra_headers);

        tracing::debug!(url = %url, "starting answer stream");

        let response = req.json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        Ok(answer_events(response.answer_frames()))
    }

    /// Send a question and drive the handler callbacks until the session
    /// reaches a terminal state.
    ///
    /// Transport and stream failures are reported through
    /// [`AnswerHandler::on_error`] and also returned, so callers that only
    /// await the future still observe the outcome. An abort through
    /// `abort` stops all further callbacks and returns
    /// [`ClientError::Cancelled`].
    pub async fn ask<H: AnswerHandler>(
        &self,
        request: &AskRequest,
        handler: &mut H,
        abort: Option<AbortRegistration>,
    ) -> Result<(), ClientError> {
        let events = match self.ask_stream(request).await {
            Ok(events) => events,
            Err(e) => {
                handler.on_error(&e);
                return Err(e);
            }
        };

        drive_events(events, handler, abort).await
    }

    /// Map a non-2xx response to an error, preferring the service's own
    /// message when the body is the usual `{"message": ...}` shape.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<ApiErrorResponse>(body) {
            ClientError::Api(format!("ask failed ({}): {}", status, error_resp.message))
        } else {
            ClientError::Api(format!("HTTP {}: {}", status, body))
        }
    }
}

/// Drive an event stream through handler callbacks.
pub(crate) async fn drive_events<S, H>(
    events: S,
    handler: &mut H,
    abort: Option<AbortRegistration>,
) -> Result<(), ClientError>
where
    S: Stream<Item = Result<AnswerEvent, ClientError>>,
    H: AnswerHandler,
{
    let registration = match abort {
        Some(registration) => registration,
        None => AbortHandle::new_pair().1,
    };

    let events = Abortable::new(events, registration);
    futures::pin_mut!(events);

    while let Some(item) = events.next().await {
        match item {
            Ok(AnswerEvent::Token(token)) => handler.on_token(&token),
            Ok(AnswerEvent::End) => {
                handler.on_end();
                return Ok(());
            }
            Err(e) => {
                handler.on_error(&e);
                return Err(e);
            }
        }
    }

    // The session layer always yields a terminal item before running dry,
    // so reaching this point means the caller aborted the stream.
    debug_assert!(events.is_aborted());
    Err(ClientError::Cancelled)
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HttpTransport;
    use nonempty::nonempty;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct Recorder {
        tokens: Vec<String>,
        ends: usize,
        errors: Vec<String>,
    }

    impl AnswerHandler for Recorder {
        fn on_token(&mut self, token: &str) {
            self.tokens.push(token.to_string());
        }

        fn on_end(&mut self) {
            self.ends += 1;
        }

        fn on_error(&mut self, error: &ClientError) {
            self.errors.push(error.to_string());
        }
    }

    fn test_client(base_url: String) -> AskAiClient {
        AskAiClient::new(TransportOptions::new(
            HttpTransport::new("test-token").with_base_url(base_url),
        ))
    }

    fn test_request() -> AskRequest {
        AskRequest::new("What is this about?", nonempty!["mat-1".to_string()])
    }

    #[tokio::test]
    async fn test_ask_stream_end_to_end() {
        let server = MockServer::start().await;

        let body = "event: message\ndata: {\"token\":\"Hel\"}\n\n\
                    event: message\ndata: {\"token\":\"lo\"}\n\n\
                    event: end\ndata:\n\n";

        Mock::given(method("POST"))
            .and(path(ASK_PATH))
            .and(header("authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "question": "What is this about?",
                "materialIds": ["mat-1"],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let events = client.ask_stream(&test_request()).await.unwrap();
        let events: Vec<_> = events.collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &AnswerEvent::Token("Hel".to_string())
        );
        assert_eq!(
            events[1].as_ref().unwrap(),
            &AnswerEvent::Token("lo".to_string())
        );
        assert_eq!(events[2].as_ref().unwrap(), &AnswerEvent::End);
    }

    #[tokio::test]
    async fn test_ask_drives_callbacks() {
        let server = MockServer::start().await;

        let body = "data: {\"token\":\"Hi\"}\n\nevent: end\ndata:\n\n";

        Mock::given(method("POST"))
            .and(path(ASK_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let mut recorder = Recorder::default();
        let result = client.ask(&test_request(), &mut recorder, None).await;

        assert!(result.is_ok());
        assert_eq!(recorder.tokens, vec!["Hi".to_string()]);
        assert_eq!(recorder.ends, 1);
        assert!(recorder.errors.is_empty());
    }

    #[tokio::test]
    async fn test_error_frame_reaches_handler_and_caller() {
        let server = MockServer::start().await;

        let body = "event: error\ndata: {\"message\":\"rate limited\"}\n\n";

        Mock::given(method("POST"))
            .and(path(ASK_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let mut recorder = Recorder::default();
        let result = client.ask(&test_request(), &mut recorder, None).await;

        match result {
            Err(ClientError::Answer(message)) => assert_eq!(message, "rate limited"),
            other => panic!("expected answer error, got {:?}", other),
        }
        assert!(recorder.tokens.is_empty());
        assert_eq!(recorder.ends, 0);
        assert_eq!(recorder.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_non_2xx_maps_to_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ASK_PATH))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"message": "too many questions"})),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let mut recorder = Recorder::default();
        let result = client.ask(&test_request(), &mut recorder, None).await;

        match result {
            Err(ClientError::Api(message)) => assert!(message.contains("too many questions")),
            other => panic!("expected API error, got {:?}", other),
        }
        assert_eq!(recorder.errors.len(), 1);
        assert_eq!(recorder.ends, 0);
    }

    #[tokio::test]
    async fn test_missing_bearer_token_is_config_error() {
        let client = AskAiClient::new(TransportOptions::new(
            HttpTransport::default().with_base_url("http://localhost".to_string()),
        ));

        let result = client.ask_stream(&test_request()).await;
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_base_url_is_config_error() {
        let client = AskAiClient::new(TransportOptions::new(HttpTransport::new("tok")));

        let result = client.ask_stream(&test_request()).await;
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[tokio::test]
    async fn test_abort_suppresses_all_callbacks() {
        use futures::channel::mpsc;

        let (tx, rx) = mpsc::unbounded::<Result<AnswerEvent, ClientError>>();
        let (abort_handle, registration) = AbortHandle::new_pair();
        let mut recorder = Recorder::default();

        tx.unbounded_send(Ok(AnswerEvent::Token("one".to_string())))
            .unwrap();
        abort_handle.abort();
        tx.unbounded_send(Ok(AnswerEvent::End)).unwrap();

        let result = drive_events(rx, &mut recorder, Some(registration)).await;

        assert!(matches!(result, Err(ClientError::Cancelled)));
        assert!(recorder.tokens.is_empty());
        assert_eq!(recorder.ends, 0);
        assert!(recorder.errors.is_empty());
    }
}
