use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{serde_ext::empty_if_null, users::repo_types::User};

/// Public profile returned by the user-info endpoints.
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    pub email: String,
    pub phone_number: String,
    pub name: String,
    pub surname: String,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime, // always UTC
}

impl From<User> for UserInfoResponse {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            phone_number: u.phone_number,
            name: u.name,
            surname: u.surname,
            registered_at: u.registered_at.to_offset(time::UtcOffset::UTC),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub old_password: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct SucceedResponse {
    pub succeed: bool,
}

impl SucceedResponse {
    pub fn ok() -> Self {
        Self { succeed: true }
    }
}
