use serde::{Deserialize, Serialize};

use crate::serde_ext::empty_if_null;

/// Request body for sign-in. Absent or `null` fields read as empty.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default, deserialize_with = "empty_if_null")]
    pub email: String,
    #[serde(default, deserialize_with = "empty_if_null")]
    pub password: String,
}

/// Response returned after a successful sign-in.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
}
