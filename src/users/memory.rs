use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    users::{
        repo::UserRepository,
        repo_types::{ProfileFields, UserRecord},
    },
};

/// In-process user storage keyed by user id.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<i64, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.user_id, u)).collect()),
        }
    }

    async fn modify<F>(&self, user_id: i64, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut UserRecord) + Send,
    {
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
        f(user);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: i64) -> AppResult<UserRecord> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AppError::UserNotFound)
    }

    async fn merge_update(&self, user_id: i64, fields: &ProfileFields) -> AppResult<()> {
        self.modify(user_id, |u| {
            u.email = fields.email.clone();
            u.phone_number = fields.phone_number.clone();
            u.name = fields.name.clone();
            u.surname = fields.surname.clone();
        })
        .await
    }

    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> AppResult<()> {
        self.modify(user_id, |u| u.password_hash = password_hash.to_string())
            .await
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        self.users
            .write()
            .await
            .remove(&user_id)
            .map(|_| ())
            .ok_or(AppError::UserNotFound)
    }

    async fn add_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
        self.modify(user_id, |u| u.family_ids.push(family_id)).await
    }

    async fn remove_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
        self.modify(user_id, |u| u.family_ids.retain(|f| *f != family_id))
            .await
    }
}
