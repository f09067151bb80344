use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::password::{salted, verify_password},
    error::{AppError, AppResult},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Rejects malformed sign-in input before any storage access.
pub fn validate_login(email: &str, password: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("email format is invalid".into()));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("password is required".into()));
    }
    Ok(())
}

/// Verifies the credentials and mints a token for the matching user.
pub async fn sign_in(st: &AppState, email: &str, password: &str) -> AppResult<String> {
    let email = email.trim();
    validate_login(email, password)?;

    let user = st.repo.find_by_email(email).await?;

    if !verify_password(&salted(password, st.password_salt()), &user.password_hash)? {
        warn!(user_id = user.user_id, "sign-in with invalid password");
        return Err(AppError::InvalidCredential);
    }

    let token = st.tokens.issue(user.user_id)?;
    info!(user_id = user.user_id, "user signed in");
    Ok(token)
}
