use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgQueryResult, PgPool};

use crate::{
    error::{AppError, AppResult},
    users::{
        repo::UserRepository,
        repo_types::{ProfileFields, UserRecord},
    },
};

const USER_COLUMNS: &str =
    "user_id, email, phone_number, name, surname, password_hash, family_ids, registered_at";

/// Postgres-backed user storage.
#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn storage(what: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::Repository(anyhow::Error::new(e).context(what))
}

fn require_row(res: PgQueryResult) -> AppResult<()> {
    if res.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }
    Ok(())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: i64) -> AppResult<UserRecord> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(storage("select user by id"))?
            .ok_or(AppError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<UserRecord> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(storage("select user by email"))?
            .ok_or(AppError::UserNotFound)
    }

    async fn merge_update(&self, user_id: i64, fields: &ProfileFields) -> AppResult<()> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET email = $2, phone_number = $3, name = $4, surname = $5
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.name)
        .bind(&fields.surname)
        .execute(&self.db)
        .await
        .map_err(storage("update user info"))?;
        require_row(res)
    }

    async fn set_password_hash(&self, user_id: i64, password_hash: &str) -> AppResult<()> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.db)
            .await
            .map_err(storage("update password hash"))?;
        require_row(res)
    }

    async fn delete(&self, user_id: i64) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(storage("delete user"))?;
        require_row(res)
    }

    async fn add_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
        let res = sqlx::query(
            "UPDATE users SET family_ids = array_append(family_ids, $2) WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(family_id)
        .execute(&self.db)
        .await
        .map_err(storage("append family id"))?;
        require_row(res)
    }

    async fn remove_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
        let res = sqlx::query(
            "UPDATE users SET family_ids = array_remove(family_ids, $2) WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(family_id)
        .execute(&self.db)
        .await
        .map_err(storage("remove family id"))?;
        require_row(res)
    }
}

/// Connects the pool and applies pending migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }
    Ok(db)
}
