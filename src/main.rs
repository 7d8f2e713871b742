use std::sync::Arc;

use sales_caller::api::{ApiState, api_routes};
use sales_caller::calls::BlandClient;
use sales_caller::config::AppConfig;
use sales_caller::error::Result;
use sales_caller::llm::create_provider;
use sales_caller::store::{CustomerStore, LibSqlBackend};
use sales_caller::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export GOOGLE_API_KEY=... BLAND_AI_API_KEY=...");
            std::process::exit(1);
        }
    };

    eprintln!("📞 Sales Caller v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.llm.model, config.llm.backend);
    eprintln!("   Voice API: {}", config.bland.base_url);
    eprintln!("   HTTP: http://0.0.0.0:{}", config.server.port);

    // ── LLM ─────────────────────────────────────────────────────────────
    let llm = create_provider(&config.llm)?;

    // ── Database ────────────────────────────────────────────────────────
    let db_path = &config.server.db_path;
    let store: Arc<dyn CustomerStore> = Arc::new(
        LibSqlBackend::new_local(db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", db_path.display(), e);
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", db_path.display());

    // ── Voice calls ─────────────────────────────────────────────────────
    let calls = Arc::new(BlandClient::new(
        config.bland.api_key.clone(),
        config.bland.base_url.clone(),
    ));

    let workflow = Arc::new(Workflow::new(
        store,
        llm,
        calls,
        config.bland.call_options.clone(),
        config.poll,
    ));

    let app = api_routes(ApiState { workflow });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
    tracing::info!(port = config.server.port, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
