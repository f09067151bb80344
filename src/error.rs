use axum::http::StatusCode;
use tracing::{error, info};

/// Failures produced by the authentication and identity cores.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("user not found")]
    UserNotFound,
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("invalid token")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("caller identity missing from request context")]
    MissingIdentity,
    #[error("user is already in the family")]
    UserAlreadyInFamily,
    #[error("user is not in the family")]
    UserNotInFamily,
    #[error("repository failure: {0}")]
    Repository(#[source] anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

pub const INTERNAL_MESSAGE: &str = "internal error";
pub const UNAUTHENTICATED_MESSAGE: &str = "unauthenticated";

impl AppError {
    /// True for failures caused by the caller's input, whose message may reach the caller.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            AppError::InvalidInput(_)
                | AppError::UserNotFound
                | AppError::InvalidCredential
                | AppError::UserAlreadyInFamily
                | AppError::UserNotInFamily
        )
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AppError::TokenInvalid | AppError::TokenExpired | AppError::MissingIdentity
        )
    }
}

/// Maps a domain failure to the transport response for operation `op`.
///
/// Only caller faults keep their message. Everything else collapses to a fixed
/// message and the cause is logged here.
pub fn reject(op: &'static str, err: AppError) -> (StatusCode, String) {
    if err.is_caller_fault() {
        info!(op, error = %err, "request rejected");
        return (StatusCode::BAD_REQUEST, err.to_string());
    }
    if err.is_unauthenticated() {
        info!(op, error = %err, "unauthenticated request");
        return (StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE.into());
    }
    error!(op, error = ?err, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_faults_keep_their_message() {
        let (status, msg) = reject("test", AppError::UserNotInFamily);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "user is not in the family");

        let (status, msg) = reject("test", AppError::InvalidInput("password is required".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "password is required");
    }

    #[test]
    fn token_failures_are_unauthenticated() {
        for err in [AppError::TokenInvalid, AppError::TokenExpired, AppError::MissingIdentity] {
            let (status, msg) = reject("test", err);
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(msg, UNAUTHENTICATED_MESSAGE);
        }
    }

    #[test]
    fn repository_failures_do_not_leak() {
        let err = AppError::Repository(anyhow::anyhow!("connection refused on 10.0.0.3:5432"));
        let (status, msg) = reject("test", err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, INTERNAL_MESSAGE);
    }
}
