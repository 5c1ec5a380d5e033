//! Streaming Ask-AI example using the callback surface.
//!
//! Run with:
//! ```bash
//! export ASKAI_BASE_URL="https://api.example.com"
//! export ASKAI_TOKEN="your-token"
//! cargo run --example stream_answer
//! ```
//!
//! Press Ctrl-C while the answer is streaming to cancel the session.

use std::io::Write;

use askai::client::{AnswerHandler, AskAiClient, ClientError};
use askai::model::AskRequest;
use askai::options::{HttpTransport, SecretString, TransportOptions};
use futures::stream::AbortHandle;
use nonempty::nonempty;

struct StdoutHandler;

impl AnswerHandler for StdoutHandler {
    fn on_token(&mut self, token: &str) {
        print!("{}", token);
        // Flush so the answer appears as it streams
        let _ = std::io::stdout().flush();
    }

    fn on_end(&mut self) {
        println!("\n\n=== Answer complete ===");
    }

    fn on_error(&mut self, error: &ClientError) {
        eprintln!("\nError in stream: {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let base_url =
        std::env::var("ASKAI_BASE_URL").expect("ASKAI_BASE_URL environment variable must be set");
    let token =
        std::env::var("ASKAI_TOKEN").expect("ASKAI_TOKEN environment variable must be set");

    let transport_options = TransportOptions::new(
        HttpTransport::new(SecretString::new(token)).with_base_url(base_url),
    )
    .with_timeout(std::time::Duration::from_secs(120));

    let client = AskAiClient::new(transport_options);

    let request = AskRequest::new(
        "Summarize the key points of the selected materials.",
        nonempty!["material-1".to_string()],
    );

    let (abort_handle, abort_registration) = AbortHandle::new_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort_handle.abort();
        }
    });

    println!("Streaming answer...\n");

    let mut handler = StdoutHandler;
    match client.ask(&request, &mut handler, Some(abort_registration)).await {
        Ok(()) => {}
        Err(ClientError::Cancelled) => println!("\n\n=== Cancelled ==="),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
