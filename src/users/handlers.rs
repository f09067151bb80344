use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::reject,
    state::AppState,
    users::{
        dto::{ChangePasswordRequest, SucceedResponse, UserInfoResponse},
        repo_types::ProfileFields,
        services,
    },
};

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_user_info).put(update_user_info))
        .route("/users/me/password", put(change_password))
        .route("/users/:user_id", get(get_user_info_by_id).delete(delete_user))
        .route(
            "/users/:user_id/families/:family_id",
            post(add_family).delete(delete_family),
        )
}

#[instrument(skip(state, ctx), fields(user_id = ctx.caller_id()))]
pub async fn get_user_info(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
) -> ApiResult<UserInfoResponse> {
    const OP: &str = "users.get_user_info";
    let user = services::get_user_info(&state, &ctx)
        .await
        .map_err(|e| reject(OP, e))?;
    info!(user_id = user.user_id, "user info successfully retrieved");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user_info_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<UserInfoResponse> {
    const OP: &str = "users.get_user_info_by_id";
    let user = services::get_user_info_by_id(&state, user_id)
        .await
        .map_err(|e| reject(OP, e))?;
    info!(user_id, "user info successfully retrieved");
    Ok(Json(user.into()))
}

#[instrument(skip(state, ctx, payload), fields(user_id = ctx.caller_id()))]
pub async fn update_user_info(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<ProfileFields>,
) -> ApiResult<SucceedResponse> {
    const OP: &str = "users.update_user_info";
    services::update_user_info(&state, &ctx, payload)
        .await
        .map_err(|e| reject(OP, e))?;
    Ok(Json(SucceedResponse::ok()))
}

#[instrument(skip(state, ctx, payload), fields(user_id = ctx.caller_id()))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(ctx): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<SucceedResponse> {
    const OP: &str = "users.change_password";
    services::change_password(&state, &ctx, &payload.old_password, &payload.new_password)
        .await
        .map_err(|e| reject(OP, e))?;
    Ok(Json(SucceedResponse::ok()))
}

#[instrument(skip(state, _caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(user_id): Path<i64>,
) -> ApiResult<SucceedResponse> {
    const OP: &str = "users.delete_user";
    services::delete_user(&state, user_id)
        .await
        .map_err(|e| reject(OP, e))?;
    Ok(Json(SucceedResponse::ok()))
}

#[instrument(skip(state, _caller))]
pub async fn add_family(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path((user_id, family_id)): Path<(i64, i64)>,
) -> ApiResult<SucceedResponse> {
    const OP: &str = "users.add_family";
    info!(user_id, family_id, "trying to add family to user's family list");
    services::add_family(&state, user_id, family_id)
        .await
        .map_err(|e| reject(OP, e))?;
    info!(user_id, family_id, "family added to user's family list");
    Ok(Json(SucceedResponse::ok()))
}

#[instrument(skip(state, _caller))]
pub async fn delete_family(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path((user_id, family_id)): Path<(i64, i64)>,
) -> ApiResult<SucceedResponse> {
    const OP: &str = "users.delete_family";
    info!(user_id, family_id, "trying to delete family from user's family list");
    services::delete_family(&state, user_id, family_id)
        .await
        .map_err(|e| reject(OP, e))?;
    info!(user_id, family_id, "family deleted from user's family list");
    Ok(Json(SucceedResponse::ok()))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::jwt::RequestContext;
    use crate::error::{AppError, AppResult, INTERNAL_MESSAGE};
    use crate::state::testing;
    use crate::users::{memory::InMemoryUserRepository, repo::UserRepository, repo_types::UserRecord};

    fn caller(user_id: i64) -> AuthUser {
        AuthUser(RequestContext::authenticated(user_id))
    }

    /// Fails every password write, delegating the rest.
    struct BrokenPasswordStore(InMemoryUserRepository);

    #[async_trait]
    impl UserRepository for BrokenPasswordStore {
        async fn find_by_id(&self, user_id: i64) -> AppResult<UserRecord> {
            self.0.find_by_id(user_id).await
        }
        async fn find_by_email(&self, email: &str) -> AppResult<UserRecord> {
            self.0.find_by_email(email).await
        }
        async fn merge_update(&self, user_id: i64, fields: &ProfileFields) -> AppResult<()> {
            self.0.merge_update(user_id, fields).await
        }
        async fn set_password_hash(&self, _: i64, _: &str) -> AppResult<()> {
            Err(AppError::Repository(anyhow::anyhow!("update password hash: disk full")))
        }
        async fn delete(&self, user_id: i64) -> AppResult<()> {
            self.0.delete(user_id).await
        }
        async fn add_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
            self.0.add_family_id(user_id, family_id).await
        }
        async fn remove_family_id(&self, user_id: i64, family_id: i64) -> AppResult<()> {
            self.0.remove_family_id(user_id, family_id).await
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn raw<T: serde::de::DeserializeOwned>(body: &str) -> Json<T> {
        Json::from_bytes(body.as_bytes()).expect("body should deserialize")
    }

    #[tokio::test]
    async fn get_user_info_by_id_maps_not_found() {
        let st = testing::fake_with([testing::user(7, "a@b.com", "pw1")]);
        let Json(res) = get_user_info_by_id(State(st.clone()), Path(7)).await.unwrap();
        assert_eq!(res.email, "a@b.com");

        let (status, msg) = get_user_info_by_id(State(st), Path(8)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "user not found");
    }

    #[tokio::test]
    async fn delete_family_reports_success_flag() {
        let st = testing::fake_with([testing::user(7, "a@b.com", "pw1")]);
        let Json(added) = add_family(State(st.clone()), caller(1), Path((7, 3))).await.unwrap();
        assert!(added.succeed);

        let Json(res) = delete_family(State(st.clone()), caller(1), Path((7, 3)))
            .await
            .unwrap();
        assert!(res.succeed);

        let (status, msg) = delete_family(State(st.clone()), caller(1), Path((7, 3)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "user is not in the family");

        let (status, msg) = delete_family(State(st), caller(1), Path((9, 3)))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "user not found");
    }

    #[tokio::test]
    async fn update_and_change_password_act_on_caller() {
        let st = testing::fake_with([testing::user(7, "a@b.com", "pw1")]);
        let update = ProfileFields {
            name: "Zoe".into(),
            ..Default::default()
        };
        let Json(updated) = update_user_info(State(st.clone()), caller(7), Json(update))
            .await
            .unwrap();
        assert!(updated.succeed);
        let Json(me) = get_user_info(State(st.clone()), caller(7)).await.unwrap();
        assert_eq!(me.name, "Zoe");
        assert_eq!(me.email, "a@b.com");

        let bad = ChangePasswordRequest {
            old_password: "nope".into(),
            new_password: "pw2".into(),
        };
        let (status, _) = change_password(State(st), caller(7), Json(bad)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_user_on_empty_store() {
        let (status, msg) = get_user_info(State(testing::fake()), caller(7)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "user not found");
    }

    #[tokio::test]
    async fn null_and_absent_profile_fields_are_merged() {
        let st = testing::fake_with([testing::user(7, "a@b.com", "pw1")]);
        let body = raw::<ProfileFields>(r#"{"name":null,"surname":"Park"}"#);
        let Json(res) = update_user_info(State(st.clone()), caller(7), body).await.unwrap();
        assert!(res.succeed);

        let Json(me) = get_user_info(State(st), caller(7)).await.unwrap();
        assert_eq!(me.name, "Ann");
        assert_eq!(me.surname, "Park");
        assert_eq!(me.email, "a@b.com");
    }

    #[tokio::test]
    async fn change_password_without_old_password_is_invalid_credential() {
        let st = testing::fake_with([testing::user(7, "a@b.com", "pw1")]);
        let body = raw::<ChangePasswordRequest>(r#"{"new_password":"pw2"}"#);
        let (status, msg) = change_password(State(st), caller(7), body).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(msg, "invalid credentials");
    }

    #[tokio::test]
    async fn internal_failure_is_logged_with_caller_id() {
        let repo = BrokenPasswordStore(InMemoryUserRepository::with_users([testing::user(
            7, "a@b.com", "pw1",
        )]));
        let st = AppState::from_parts(Arc::new(testing::fake_config()), Arc::new(repo));

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let body = ChangePasswordRequest {
            old_password: "pw1".into(),
            new_password: "pw2".into(),
        };
        let (status, msg) = change_password(State(st), caller(7), Json(body)).await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(msg, INTERNAL_MESSAGE);

        let out = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = out
            .lines()
            .find(|l| l.contains("request failed"))
            .expect("failure should be logged");
        assert!(line.contains("user_id=7"), "{line}");
        assert!(line.contains("users.change_password"), "{line}");
        assert!(!msg.contains("disk full"));
    }

    #[test]
    fn user_info_response_serialization() {
        let res = UserInfoResponse {
            email: "test@example.com".into(),
            phone_number: String::new(),
            name: "Ann".into(),
            surname: "Lee".into(),
            registered_at: time::macros::datetime!(2024-03-01 12:00 UTC),
        };
        let json = serde_json::to_string(&res).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("2024-03-01T12:00:00Z"));
        assert!(!json.contains("password"));
    }
}
