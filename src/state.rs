use std::sync::Arc;

use crate::auth::jwt::TokenManager;
use crate::config::AppConfig;
use crate::users::{pg::PgUserRepository, repo::UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenManager,
    pub repo: Arc<dyn UserRepository>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = crate::users::pg::connect(&config.database_url).await?;
        let repo = Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>;
        Ok(Self::from_parts(config, repo))
    }

    pub fn from_parts(config: Arc<AppConfig>, repo: Arc<dyn UserRepository>) -> Self {
        let tokens = TokenManager::new(&config.jwt);
        Self {
            config,
            tokens,
            repo,
        }
    }

    /// Salt appended to every password before hashing.
    pub fn password_salt(&self) -> &str {
        &self.config.password_salt
    }
}
