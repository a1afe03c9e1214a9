//! Symptom Chat - terminal client for a symptom-driven diagnostic backend
//!
//! Drives a chat conversation that ends in ranked candidate conditions and
//! keeps a per-user consultation history.

mod auth;
mod config;
mod diagnosis;
mod history;
mod markup;
mod render;
mod repl;
mod session;
mod state_machine;
mod transport;

use auth::StaticAuthProvider;
use config::ClientConfig;
use crossterm::style::Stylize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transport::{CatalogTransport, HttpTransport, LoggingTransport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symptom_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(
        server = %config.server_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Starting symptom chat client"
    );

    let transport = Arc::new(LoggingTransport::new(HttpTransport::new(&config)?));

    match transport.health().await {
        Ok(status) if status.is_healthy() => {
            tracing::debug!(timestamp = ?status.timestamp, "Backend is healthy");
        }
        Ok(status) => println!(
            "{}",
            format!("Backend reports status \"{}\".", status.status).yellow()
        ),
        Err(e) => println!(
            "{}",
            format!(
                "Backend at {} is unreachable ({e}). Replies will fail until it is running.",
                config.server_url
            )
            .yellow()
        ),
    }

    let auth = StaticAuthProvider::new(config.username.clone());
    repl::run(transport, &auth).await
}
