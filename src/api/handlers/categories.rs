use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::extract::AdminUser;
use crate::api::AppState;
use crate::error::AppResult;
use crate::models::Gender;
use crate::services::categories;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let all = state.store.all_categories().await?;
    let tree = categories::category_tree(&all);
    Ok(Json(json!({ "categories": tree })))
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub parent: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub parent: Option<Uuid>,
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(request): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    let category = categories::create_category(
        state.store.as_ref(),
        request.name,
        request.gender,
        request.parent,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            id: category.id,
            name: category.name,
            gender: category.gender,
            parent: category.parent,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub name: Option<String>,
}

pub async fn rename(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(category_id): Path<Uuid>,
    Json(request): Json<RenameCategoryRequest>,
) -> AppResult<StatusCode> {
    categories::rename_category(state.store.as_ref(), category_id, request.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    categories::delete_category(state.store.as_ref(), category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
