use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::auth::repo::MySqlCredentialStore;
use crate::auth::services::SessionService;
use crate::clients::repo::{ClientProfileStore, MySqlClientProfileStore};
use crate::config::{AppConfig, DatabaseConfig, MIN_SECRET_LEN};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionService,
    pub clients: Arc<dyn ClientProfileStore>,
    pub cookie_key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

pub async fn connect(db: &DatabaseConfig, acquire_timeout: std::time::Duration) -> anyhow::Result<MySqlPool> {
    let options = MySqlConnectOptions::new()
        .host(&db.host)
        .port(db.port)
        .username(&db.user)
        .password(&db.password)
        .database(&db.database);
    MySqlPoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
        .with_context(|| format!("connect to mysql at {}:{}", db.host, db.port))
}

impl AppState {
    /// Connects the pool and wires the MySQL-backed stores.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, MySqlPool)> {
        let db = connect(&config.database, config.request_timeout()).await?;
        let sessions = SessionService::new(
            Arc::new(MySqlCredentialStore::new(db.clone())),
            config.session_ttl(),
        );
        let clients = Arc::new(MySqlClientProfileStore::new(db.clone())) as Arc<dyn ClientProfileStore>;
        let state = Self::from_parts(Arc::new(config), sessions, clients)?;
        Ok((state, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        sessions: SessionService,
        clients: Arc<dyn ClientProfileStore>,
    ) -> anyhow::Result<Self> {
        let secret = config.auth.secret.as_bytes();
        anyhow::ensure!(
            secret.len() >= MIN_SECRET_LEN,
            "AUTH_SECRET must be at least {MIN_SECRET_LEN} bytes"
        );
        let cookie_key = Key::derive_from(secret);
        Ok(Self {
            config,
            sessions,
            clients,
            cookie_key,
        })
    }

    /// State over in-memory stores, for router tests.
    #[cfg(test)]
    pub fn fake(
        clients: Arc<dyn ClientProfileStore>,
    ) -> (Self, Arc<crate::auth::repo::memory::MemoryCredentialStore>) {
        use crate::auth::repo::memory::MemoryCredentialStore;

        let config = crate::config::test_config();
        let store = Arc::new(MemoryCredentialStore::default());
        let sessions = SessionService::new(store.clone(), config.session_ttl());
        let state = Self::from_parts(Arc::new(config), sessions, clients)
            .expect("test secret is long enough");
        (state, store)
    }
}
