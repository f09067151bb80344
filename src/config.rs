use serde::Deserialize;

/// Upper bound on token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Appended to every user-supplied password before hashing or verification.
    pub password_salt: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "sso".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "sso-clients".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|m| m.clamp(1, MAX_TTL_MINUTES))
                .unwrap_or(60),
        };
        let password_salt = std::env::var("PASSWORD_SALT")?;
        Ok(Self {
            database_url,
            jwt,
            password_salt,
        })
    }
}
