use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::serde_ext::empty_if_null;

/// Stored user record, including the password hash. Never leaves the cores.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub email: String,
    pub phone_number: String,
    pub name: String,
    pub surname: String,
    pub password_hash: String,
    pub family_ids: Vec<i64>,
    pub registered_at: OffsetDateTime,
}

/// User as returned to callers: the stored record without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub phone_number: String,
    pub name: String,
    pub surname: String,
    pub family_ids: Vec<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            user_id: r.user_id,
            email: r.email,
            phone_number: r.phone_number,
            name: r.name,
            surname: r.surname,
            family_ids: r.family_ids,
            registered_at: r.registered_at,
        }
    }
}

/// Mutable profile fields. An empty, absent or `null` field means "keep the current value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileFields {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub email: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub name: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub surname: String,
}

impl ProfileFields {
    /// Strips surrounding whitespace, so a blank field counts as empty.
    pub fn trimmed(self) -> ProfileFields {
        ProfileFields {
            email: self.email.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            name: self.name.trim().to_string(),
            surname: self.surname.trim().to_string(),
        }
    }

    /// Resolves every empty field to the current stored value.
    pub fn merged_over(self, current: &UserRecord) -> ProfileFields {
        fn pick(update: String, current: &str) -> String {
            if update.is_empty() {
                current.to_string()
            } else {
                update
            }
        }
        ProfileFields {
            email: pick(self.email, &current.email),
            phone_number: pick(self.phone_number, &current.phone_number),
            name: pick(self.name, &current.name),
            surname: pick(self.surname, &current.surname),
        }
    }
}
