mod error;
pub mod memory;
pub mod models;
pub mod repositories;
mod store;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;

pub use error::{DatabaseError, DbResult};
pub use models::*;
pub use store::{like_pattern, GroomingFilter, GroomingStore, SearchField, TrainerStore};

/// Initialize the database connection pool and apply pending migrations.
pub async fn init_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(10))
        .min_connections(config.min_connections.unwrap_or(1))
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}
