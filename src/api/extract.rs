use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

use super::AppState;

/// An authenticated session: the bearer token plus the user it resolves to
pub struct AuthSession {
    pub token: Uuid,
    pub user: User,
}

/// The authenticated user; requests without a live session are rejected
/// with 401 before any handler logic runs
pub struct CurrentUser(pub User);

/// The authenticated user when present; anonymous requests pass through
pub struct MaybeUser(pub Option<User>);

/// The authenticated user, additionally required to be an administrator
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim()
        .parse()
        .ok()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;
        let user = state
            .store
            .session_user(token)
            .await?
            .ok_or(AppError::Unauthenticated)?;
        Ok(Self { token, user })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = AuthSession::from_request_parts(parts, state).await?;
        Ok(Self(session.user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(state.store.session_user(token).await?)),
            None => Ok(Self(None)),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden(
                "Administrator rights required".to_string(),
            ));
        }
        Ok(Self(user))
    }
}
