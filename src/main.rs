use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use tower_http::services::ServeDir;

use outfit_tryon::{
    config::AppConfig, http, logging, mcp_server::TryOnServer, service::TryOnService,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let service = Arc::new(
        TryOnService::from_config(&config)
            .await
            .context("failed to open storage")?,
    );

    let mcp_path = match config.secret_key.as_deref() {
        Some(value) => format!("/{}/mcp", value),
        None => "/mcp".to_string(),
    };
    let service_for_mcp = service.clone();
    let mcp_service = StreamableHttpService::new(
        move || Ok(TryOnServer::new(service_for_mcp.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = http::router(service.clone(), &config.allowed_origins)
        .nest_service(&mcp_path, mcp_service)
        .nest_service("/static", ServeDir::new(service.storage().base_dir()));

    let bind_address = config.bind_address();
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(
        address = %bind_address,
        mcp_path = %mcp_path,
        storage = %config.storage_dir.display(),
        model = %config.model,
        fallback_on_quota = config.fallback.on_retryable,
        fallback_on_error = config.fallback.on_fatal,
        allowed_origins = ?config.allowed_origins,
        "try-on server started"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
