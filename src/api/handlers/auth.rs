use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::extract::{AuthSession, MaybeUser};
use crate::api::AppState;
use crate::error::AppResult;
use crate::models::UserResponse;
use crate::services::auth;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: Uuid,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let (user, token) = auth::register(
        state.store.as_ref(),
        request.name,
        request.password,
        request.password_confirm,
        request.gender,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: UserResponse::from(&user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    let (user, token) = auth::login(state.store.as_ref(), &request.name, &request.password).await?;
    Ok(Json(SessionResponse {
        user: UserResponse::from(&user),
        token,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> AppResult<StatusCode> {
    auth::logout(state.store.as_ref(), session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(MaybeUser(user): MaybeUser) -> Json<Value> {
    Json(json!({ "user": user.as_ref().map(UserResponse::from) }))
}
