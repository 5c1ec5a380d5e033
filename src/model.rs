//! Data models for Ask-AI requests and the events they stream back.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

/// Request body for a streaming Ask-AI query.
///
/// Serializes to the JSON shape the service expects:
/// `{ "question": ..., "materialIds": [...], "conversationId": ... }`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The question posed to the AI
    pub question: String,

    /// Materials the question is scoped to; a query always names at least one
    pub material_ids: NonEmpty<String>,

    /// Conversation to continue, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl AskRequest {
    /// Create a request for a fresh conversation.
    pub fn new(question: impl Into<String>, material_ids: NonEmpty<String>) -> Self {
        Self {
            question: question.into(),
            material_ids,
            conversation_id: None,
        }
    }

    /// Continue an existing conversation.
    pub fn with_conversation_id(mut self, conversation_id: String) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

/// One event decoded from the answer stream.
///
/// A session yields zero or more `Token` events followed by exactly one
/// terminal outcome: an `End` event on success, or an error on the stream
/// itself on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// One incremental fragment of the generated answer
    Token(String),
    /// The service finished the answer
    End,
}

/// Payload of a token frame: `{"token": "<text>"}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenPayload {
    pub token: String,
}

/// Payload of an error frame: `{"message": "<text>"}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonempty::nonempty;

    #[test]
    fn test_ask_request_serialization() {
        let request = AskRequest::new(
            "What does chapter 3 cover?",
            nonempty!["mat-1".to_string(), "mat-2".to_string()],
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["question"], "What does chapter 3 cover?");
        assert_eq!(json["materialIds"][0], "mat-1");
        assert_eq!(json["materialIds"][1], "mat-2");
        assert!(json.get("conversationId").is_none());
    }

    #[test]
    fn test_ask_request_with_conversation() {
        let request = AskRequest::new("Continue", nonempty!["mat-1".to_string()])
            .with_conversation_id("conv-42".to_string());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["conversationId"], "conv-42");
    }

    #[test]
    fn test_token_payload_deserialization() {
        let payload: TokenPayload = serde_json::from_str(r#"{"token":"Hello"}"#).unwrap();
        assert_eq!(payload.token, "Hello");

        let payload: ErrorPayload = serde_json::from_str(r#"{"message":"rate limited"}"#).unwrap();
        assert_eq!(payload.message, "rate limited");
    }
}
