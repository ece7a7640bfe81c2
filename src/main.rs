//! medassist - terminal client for a medical question-answering backend
//!
//! Keeps one conversation per process: user turns are posted to the
//! backend's `/medical` endpoint and its replies appended as assistant turns.

mod backend;
mod config;
mod console;
mod conversation;
mod runtime;
mod state_machine;

use backend::{HttpQaService, LoggingService};
use config::BackendConfig;
use runtime::{ConversationSession, ProductionSession};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medassist=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = BackendConfig::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        request_timeout_secs = ?config.request_timeout.map(|t| t.as_secs()),
        "Backend configured"
    );

    let backend = LoggingService::new(HttpQaService::new(&config)?);
    let session: Arc<ProductionSession> = Arc::new(ConversationSession::new(backend));

    console::run(session).await?;

    Ok(())
}
