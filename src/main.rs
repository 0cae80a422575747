use dotenvy::dotenv;
use poultry_ledger::errors::Result;
use poultry_ledger::http::{AppState, router};
use poultry_ledger::{config, godown::GodownStore, store};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Open the relational store: open, migrate, ready
    let pool = store::init_store(&app_config.database_path)
        .await
        .inspect(|_| info!("Relational store initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize relational store: {}", e))?;

    // 5. Load the godown document store
    let godown = GodownStore::load(&app_config.godown_store_path)
        .inspect_err(|e| error!("Failed to load godown store: {}", e))?;

    // 6. Serve the API
    let state = AppState {
        pool,
        godown: Arc::new(godown),
    };
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr).await?;
    info!("Listening on http://{}", app_config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
