//! HTTP API server command.

use crate::assistant::Assistant;
use crate::cli::Output;
use crate::config::Settings;
use crate::openai::check_api_key;
use crate::server::{router, ENDPOINTS};
use std::sync::Arc;
use tracing::info;

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    no_ui: bool,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = check_api_key(&settings.llm) {
        Output::warning(&e.to_string());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let ui = settings.server.ui && !no_ui;

    let assistant = Arc::new(Assistant::from_settings(settings)?);
    let app = router(assistant, ui);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    Output::header("ytassist API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    if ui {
        Output::kv("Web page", &format!("http://{}/", addr));
    }
    println!();
    println!("Endpoints:");
    for (name, route) in ENDPOINTS {
        Output::kv(name, route);
    }
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Output::info("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
