use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::services::images;

const ONE_YEAR_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Serves a stored image; keys are immutable so clients may cache hard
pub async fn get_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Response> {
    let bytes = state
        .images
        .fetch(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, images::content_type_for_key(&key).to_string()),
            (
                header::CACHE_CONTROL,
                format!("max-age={ONE_YEAR_SECONDS}"),
            ),
        ],
        bytes,
    )
        .into_response())
}
