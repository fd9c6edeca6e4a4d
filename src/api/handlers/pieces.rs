use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::{AdminUser, MaybeUser};
use crate::api::AppState;
use crate::error::AppResult;
use crate::models::PieceResponse;
use crate::services::pieces::{self, PiecePage, PieceSearch, DEFAULT_LIMIT};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPiecesParams {
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub gender: Option<String>,
    pub search: Option<String>,
    pub category: Option<Uuid>,
    pub in_wardrobe: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(params): Query<ListPiecesParams>,
) -> AppResult<Json<PiecePage>> {
    let search = PieceSearch {
        gender: params.gender,
        search: params.search.filter(|search| !search.is_empty()),
        category: params.category,
        in_wardrobe: params.in_wardrobe.as_deref() == Some("true"),
        limit: params
            .limit
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT),
        skip: params
            .skip
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0),
    };

    let page = pieces::find_pieces(state.store.as_ref(), user.as_ref(), search).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct CreatePieceRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub category: Option<Uuid>,
    pub img: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreatePieceRequest>,
) -> AppResult<(StatusCode, Json<PieceResponse>)> {
    let piece = pieces::create_piece(
        state.store.as_ref(),
        state.images.as_ref(),
        request.name,
        request.gender,
        request.category,
        request.img,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(PieceResponse::new(&piece, None))))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePieceRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub category: Option<Uuid>,
}

pub async fn update(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(piece_id): Path<Uuid>,
    Json(request): Json<UpdatePieceRequest>,
) -> AppResult<StatusCode> {
    pieces::update_piece(
        state.store.as_ref(),
        piece_id,
        request.name,
        request.gender,
        request.category,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(piece_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    pieces::delete_piece(state.store.as_ref(), piece_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
