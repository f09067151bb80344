//! Profile reads and the mutation rules for user records.
//!
//! Every read-modify-write here works against a snapshot: a concurrent mutation
//! of the same user between the read and the write can be lost, and two
//! concurrent `add_family` calls for the same family can both pass the
//! membership check. No locking is layered on top of the repository.

use tracing::{info, warn};

use crate::{
    auth::{
        jwt::RequestContext,
        password::{hash_password, salted, verify_password},
        services::is_valid_email,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::{ProfileFields, User},
};

/// Profile of the caller carried in `ctx`.
pub async fn get_user_info(st: &AppState, ctx: &RequestContext) -> AppResult<User> {
    let user_id = st.tokens.identity_from_context(ctx)?;
    get_user_info_by_id(st, user_id).await
}

pub async fn get_user_info_by_id(st: &AppState, user_id: i64) -> AppResult<User> {
    Ok(st.repo.find_by_id(user_id).await?.into())
}

/// Merges `update` over the caller's current profile; blank fields keep their value.
pub async fn update_user_info(
    st: &AppState,
    ctx: &RequestContext,
    update: ProfileFields,
) -> AppResult<()> {
    let user_id = st.tokens.identity_from_context(ctx)?;
    let update = update.trimmed();
    if !update.email.is_empty() && !is_valid_email(&update.email) {
        warn!(user_id, "update with invalid email");
        return Err(AppError::InvalidInput("email format is invalid".into()));
    }
    let current = st.repo.find_by_id(user_id).await?;
    let merged = update.merged_over(&current);
    st.repo.merge_update(user_id, &merged).await?;
    info!(user_id, "user info updated");
    Ok(())
}

/// Replaces the caller's password hash once `old_password` verifies.
///
/// The new hash is computed up front but only persisted after verification.
pub async fn change_password(
    st: &AppState,
    ctx: &RequestContext,
    old_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let user_id = st.tokens.identity_from_context(ctx)?;
    let old_salted = salted(old_password, st.password_salt());
    let new_hash = hash_password(&salted(new_password, st.password_salt()))?;

    let user = st.repo.find_by_id(user_id).await?;
    if !verify_password(&old_salted, &user.password_hash)? {
        warn!(user_id, "change password with invalid old password");
        return Err(AppError::InvalidCredential);
    }

    st.repo.set_password_hash(user_id, &new_hash).await?;
    info!(user_id, "password changed");
    Ok(())
}

/// Permanently removes the user. Family references held elsewhere are left as is.
pub async fn delete_user(st: &AppState, user_id: i64) -> AppResult<()> {
    st.repo.find_by_id(user_id).await?;
    st.repo.delete(user_id).await?;
    info!(user_id, "user deleted");
    Ok(())
}

pub async fn add_family(st: &AppState, user_id: i64, family_id: i64) -> AppResult<()> {
    let user = st.repo.find_by_id(user_id).await?;
    if user.family_ids.contains(&family_id) {
        warn!(user_id, family_id, "user already in family");
        return Err(AppError::UserAlreadyInFamily);
    }
    st.repo.add_family_id(user_id, family_id).await
}

pub async fn delete_family(st: &AppState, user_id: i64, family_id: i64) -> AppResult<()> {
    let user = st.repo.find_by_id(user_id).await?;
    if !user.family_ids.contains(&family_id) {
        warn!(user_id, family_id, "user not in family");
        return Err(AppError::UserNotInFamily);
    }
    st.repo.remove_family_id(user_id, family_id).await
}
