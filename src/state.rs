use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::tasks::repo::{PgTaskRepo, TaskRepo};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub tasks: Arc<dyn TaskRepo>,
}

impl AppState {
    /// Connects to the database; the returned pool is used for migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(config);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let users = Arc::new(PgUserRepo::new(db.clone())) as Arc<dyn UserRepo>;
        let tasks = Arc::new(PgTaskRepo::new(db.clone())) as Arc<dyn TaskRepo>;

        Ok((Self::from_parts(config, users, tasks), db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        tasks: Arc<dyn TaskRepo>,
    ) -> Self {
        Self {
            config,
            users,
            tasks,
        }
    }

    /// State backed by one in-memory store, for router tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::testing::{test_config, MemoryStore};

        let store = Arc::new(MemoryStore::default());
        Self::from_parts(
            Arc::new(test_config()),
            store.clone() as Arc<dyn UserRepo>,
            store as Arc<dyn TaskRepo>,
        )
    }
}
