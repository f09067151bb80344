use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{SignInRequest, SignInResponse},
        services,
    },
    error::reject,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/sign-in", post(sign_in))
}

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, (StatusCode, String)> {
    const OP: &str = "auth.sign_in";
    info!("trying to sign in user");

    let token = services::sign_in(&state, &payload.email, &payload.password)
        .await
        .map_err(|e| reject(OP, e))?;

    info!("token successfully generated");
    Ok(Json(SignInResponse { token }))
}
