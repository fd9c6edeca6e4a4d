use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::CurrentUser;
use crate::api::AppState;
use crate::error::AppResult;
use crate::models::{LookResponse, Season};
use crate::services::looks::{self, LooksPage};
use crate::services::ranking::{LookQuery, DEFAULT_LIMIT, DEFAULT_SKIP};

/// Raw query parameters of the ranked listing; counts arrive as strings
/// because parsing is permissive (garbage falls back to the defaults)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLooksParams {
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub season: Option<String>,
    pub favorites: Option<String>,
    pub show_disliked: Option<String>,
}

fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|raw| raw.parse().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

fn parse_skip(raw: Option<&str>) -> usize {
    raw.and_then(|raw| raw.parse().ok()).unwrap_or(DEFAULT_SKIP)
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListLooksParams>,
) -> AppResult<Json<LooksPage>> {
    // A season value outside the enum matches nothing
    let season = match params.season.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => match Season::parse(raw) {
            Some(season) => Some(season),
            None => {
                return Ok(Json(LooksPage {
                    looks: Vec::new(),
                    total_results: 0,
                }))
            }
        },
        None => None,
    };

    let query = LookQuery {
        limit: parse_limit(params.limit.as_deref()),
        skip: parse_skip(params.skip.as_deref()),
        favorites: params.favorites.as_deref() == Some("true"),
        show_disliked: params.show_disliked.as_deref() == Some("true"),
        season,
    };

    let page = looks::find_looks_for(state.store.as_ref(), &user, &query).await?;
    Ok(Json(page))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<Json<LookResponse>> {
    let look = looks::get_look(state.store.as_ref(), &user, look_id).await?;
    Ok(Json(look))
}

#[derive(Debug, Deserialize)]
pub struct CreateLookRequest {
    pub pieces: Option<String>,
    pub gender: Option<String>,
    pub season: Option<String>,
    pub img: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateLookRequest>,
) -> AppResult<(StatusCode, Json<LookResponse>)> {
    let look = looks::create_look(
        state.store.as_ref(),
        state.images.as_ref(),
        &user,
        request.pieces,
        request.gender,
        request.season,
        request.img,
    )
    .await?;

    let response = looks::get_look(state.store.as_ref(), &user, look.id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(look_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    looks::delete_look(state.store.as_ref(), &user, look_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
