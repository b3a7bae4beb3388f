//! Guided report client
//!
//! Walks the user through a question-and-answer interview run by a remote
//! report service, then downloads the generated report.

mod config;
mod console;
mod runtime;
mod service;
mod state_machine;

use config::ClientConfig;
use console::Console;
use runtime::{FileArtifactSink, SessionHandle};
use service::{HttpReportService, LoggingService};
use state_machine::SessionContext;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout belongs to the console
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guided_report=info".into()),
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
        base_url = %config.base_url,
        transition_delay_ms = %config.transition_delay.as_millis(),
        request_timeout_secs = config.request_timeout.as_secs(),
        download_dir = %config.download_dir.display(),
        "Configuration loaded"
    );

    let service = LoggingService::new(HttpReportService::new(
        &config.base_url,
        config.request_timeout,
    )?);
    let sink = FileArtifactSink::new(config.download_dir.clone());
    let handle = SessionHandle::spawn(
        SessionContext::new(config.transition_delay),
        service,
        sink,
    );

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    let result = tokio::select! {
        result = console.run(&handle) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(())
        }
    };

    // Teardown cancels the report timer and any request still in flight
    handle.shutdown().await;
    result?;
    Ok(())
}
