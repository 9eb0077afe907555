use std::sync::Arc;

use sea_orm::SqlxPostgresConnector;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// The ORM shares the sqlx pool, so both views see the same connections.
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
        }
    }
}
