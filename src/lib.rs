pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod model;
pub mod route;
pub mod schema;
pub mod token;

use std::sync::Arc;

use crate::{config::Config, db::Database, token::TokenService};

// Struct representing the application state
pub struct AppState {
    pub db: Database,
    pub tokens: TokenService,
    pub config: Config,
}

impl AppState {
    /// Connects to the database, creates the schema and prepares token keys.
    pub async fn from_config(config: Config) -> Result<Arc<Self>, sqlx::Error> {
        let db = Database::connect(&config.database_url, config.database_max_connections).await?;
        db.migrate().await?;

        Ok(Arc::new(Self {
            db,
            tokens: TokenService::from_config(&config),
            config,
        }))
    }
}
