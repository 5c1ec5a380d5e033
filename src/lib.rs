//! # askai - Streaming Ask-AI Client Library
//!
//! A small, pragmatic Rust client for an Ask-AI answer service that
//! streams its responses as delimiter-framed events over chunked HTTP.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental decoding: frames are reconstructed correctly no matter
//!   how the transport fragments the bytes (including splits inside a
//!   multi-byte character or the frame delimiter)
//! - Typed events: incremental tokens, a completion marker, errors
//! - Cooperative mid-stream cancellation
//! - Stream-based core with an optional callback surface on top
//!
//! ## Example
//! ```no_run
//! use askai::client::AskAiClient;
//! use askai::model::{AnswerEvent, AskRequest};
//! use askai::options::{HttpTransport, SecretString, TransportOptions};
//! use futures::StreamExt;
//! use nonempty::nonempty;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport_options = TransportOptions::new(
//!         HttpTransport::new(SecretString::new("your-token".to_string()))
//!             .with_base_url("https://api.example.com".to_string()),
//!     );
//!
//!     let client = AskAiClient::new(transport_options);
//!
//!     let request = AskRequest::new(
//!         "What does chapter 3 cover?",
//!         nonempty!["material-1".to_string()],
//!     );
//!
//!     let stream = client.ask_stream(&request).await?;
//!     futures::pin_mut!(stream);
//!
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             AnswerEvent::Token(token) => print!("{}", token),
//!             AnswerEvent::End => println!(),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{AnswerHandler, AskAiClient, ClientError};
pub use model::{AnswerEvent, AskRequest};
pub use stream::answer_events;
