use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::ApiError;

pub struct AppState {
    pub config: Config,
    pub credentials: Credentials,
    db: Mutex<Connection>,
}

impl AppState {
    pub fn new(config: Config, conn: Connection) -> anyhow::Result<Arc<Self>> {
        let credentials = Credentials::new(&config)
            .map_err(|e| anyhow::anyhow!("invalid password hashing parameters: {e}"))?;
        Ok(Arc::new(Self {
            config,
            credentials,
            db: Mutex::new(conn),
        }))
    }

    /// Runs `f` against the store on the blocking pool.
    pub async fn with_db<T, F>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let mut conn = state
                .db
                .lock()
                .map_err(|_| ApiError::internal("store lock poisoned"))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| ApiError::internal(format!("store task failed: {e}")))?
    }

    pub async fn hash_password(self: &Arc<Self>, password: String) -> Result<String, ApiError> {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.credentials.hash_password(&password))
            .await
            .map_err(|e| ApiError::internal(format!("hash task failed: {e}")))?
    }

    pub async fn verify_password(
        self: &Arc<Self>,
        password: String,
        stored_hash: String,
    ) -> Result<bool, ApiError> {
        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.credentials.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| ApiError::internal(format!("verify task failed: {e}")))
    }
}
