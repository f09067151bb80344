use async_trait::async_trait;

use crate::{error::AppResult, users::repo_types::{ProfileFields, UserRecord}};

/// Storage capability for user records.
///
/// Every operation fails with `AppError::UserNotFound` when `user_id` does not
/// resolve and with `AppError::Repository` for any other storage fault. The
/// repository enforces no membership policy: `add_family_id` appends even when
/// the id is already present, so check-then-act callers can race.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> AppResult<UserRecord>;
    async fn find_by_email(&self, email: &str) -> AppResult<UserRecord>;
    /// Overwrites the profile fields with already-merged values.
    async fn merge_update(&self, user_id: i64, fields: &ProfileFields) -> AppResult<()>;
    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> AppResult<()>;
    async fn delete(&self, user_id: i64) -> AppResult<()>;
    async fn add_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()>;
    async fn remove_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()>;
}
