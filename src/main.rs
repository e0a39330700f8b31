use anyhow::Context;
use dotenv::dotenv;
use tracing::info;

use grooming_tracker::{
    app::create_router,
    app_state::AppState,
    config::{self, StorageBackend},
    db,
    telemetry::init_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let telemetry = init_telemetry(None).await?;
    let config = config::init()?;

    let state = match config.storage {
        StorageBackend::Postgres => {
            let database = config
                .database
                .as_ref()
                .context("DATABASE_URL must be set when STORAGE_BACKEND is postgres")?;
            let pool = db::init_pool(database)
                .await
                .context("Failed to initialize database")?;
            AppState::postgres(pool)
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            AppState::in_memory()
        }
    };

    let app = create_router(state);
    let addr = config.server_addr();
    info!("{} Listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
