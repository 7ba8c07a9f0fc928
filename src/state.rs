use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::auth::{
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::{PgUserStore, UserStore},
};
use crate::cards::repo::{CardStore, PgCardStore};
use crate::config::AppConfig;
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present only when backed by Postgres; used for migrations.
    pub db: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub cards: Arc<dyn CardStore>,
    pub jwt: JwtKeys,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using the in-memory store, data is lost on restart");
            return Self::in_memory(config);
        };

        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(config.store_timeout())
            .connect(&url)
            .await
            .context("connect to database")?;
        info!("connected to postgres");

        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let cards = Arc::new(PgCardStore::new(db.clone())) as Arc<dyn CardStore>;
        Self::from_parts(config, Some(db), users, cards)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        db: Option<PgPool>,
        users: Arc<dyn UserStore>,
        cards: Arc<dyn CardStore>,
    ) -> anyhow::Result<Self> {
        let jwt = JwtKeys::from_config(&config.jwt);
        let hasher = PasswordHasher::from_config(&config.password)?;
        Ok(Self {
            config,
            db,
            users,
            cards,
            jwt,
            hasher,
        })
    }

    pub fn in_memory(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::default());
        Self::from_parts(
            config,
            None,
            store.clone() as Arc<dyn UserStore>,
            store as Arc<dyn CardStore>,
        )
    }

    pub fn store_timeout(&self) -> Duration {
        self.config.store_timeout()
    }
}

#[cfg(test)]
impl AppState {
    pub fn fake() -> Self {
        Self::in_memory(Arc::new(AppConfig::for_tests())).expect("test state")
    }
}
