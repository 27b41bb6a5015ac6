use crate::config::AppConfig;
use crate::users::{memory::MemoryUserRepository, repo::PgUserRepository, repo::UserRepository};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Build the storage handle once; every handler gets it through `State`.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let users = match &config.database {
            Some(db_config) => {
                let db = PgPoolOptions::new()
                    .max_connections(db_config.max_connections)
                    .connect(&db_config.url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("postgres user repository ready");

                Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserRepository::new()) as Arc<dyn UserRepository>
            }
        };

        Ok(Self::from_parts(config, users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserRepository>) -> Self {
        Self { config, users }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::test()),
            Arc::new(MemoryUserRepository::new()),
        )
    }
}
