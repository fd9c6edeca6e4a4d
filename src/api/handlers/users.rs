use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::api::extract::CurrentUser;
use crate::api::AppState;
use crate::error::{AppError, AppResult};

// The wardrobe/favorites/hidden-looks mutators are idempotent set edits:
// PUT adds, DELETE removes, both answer 204 whether or not anything
// changed. The referenced entity must exist (404 otherwise).

async fn require_piece(state: &AppState, piece_id: Uuid) -> AppResult<()> {
    state
        .store
        .piece_by_id(piece_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Piece not found".to_string()))
}

async fn require_look(state: &AppState, look_id: Uuid) -> AppResult<()> {
    state
        .store
        .look_by_id(look_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Look not found".to_string()))
}

pub async fn add_to_wardrobe(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(piece_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_piece(&state, piece_id).await?;
    user.add_to_wardrobe(piece_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_from_wardrobe(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(piece_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_piece(&state, piece_id).await?;
    user.remove_from_wardrobe(piece_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_favorites(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_look(&state, look_id).await?;
    user.add_to_favorites(look_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_from_favorites(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_look(&state, look_id).await?;
    user.remove_from_favorites(look_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hide_look(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_look(&state, look_id).await?;
    user.hide_look(look_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unhide_look(
    State(state): State<AppState>,
    CurrentUser(mut user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_look(&state, look_id).await?;
    user.unhide_look(look_id);
    state.store.update_user_sets(&user).await?;
    Ok(StatusCode::NO_CONTENT)
}
