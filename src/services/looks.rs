use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{AuthorResponse, Gender, Look, LookResponse, PieceResponse, Season, User};
use crate::services::images::{self, ImageStore};
use crate::services::ranking::{LookQuery, LookRanker};
use crate::store::Store;

/// One page of the ranked look listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LooksPage {
    pub looks: Vec<LookResponse>,
    pub total_results: usize,
}

/// Creates a look: validate everything, then upload the image, then
/// persist. A validation failure never reaches the image store, and a
/// failed upload leaves no record behind.
pub async fn create_look(
    store: &dyn Store,
    image_store: &dyn ImageStore,
    author: &User,
    pieces: Option<String>,
    gender: Option<String>,
    season: Option<String>,
    img: Option<String>,
) -> AppResult<Look> {
    let mut errors = FieldErrors::new();

    let pieces = parse_pieces(pieces, &mut errors);

    let gender = match gender.as_deref().map(Gender::parse) {
        Some(Some(gender)) => Some(gender),
        _ => {
            errors.insert("gender", "Please, select gender");
            None
        }
    };

    let season = match season.as_deref().map(Season::parse) {
        Some(Some(season)) => Some(season),
        _ => {
            errors.insert("season", "Please, select season");
            None
        }
    };

    let image = images::decode_payload(img, &mut errors);
    errors.into_result()?;

    let (bytes, content_type) = image.unwrap();
    let key = format!("looks/{}.{}", Uuid::new_v4(), images::extension_for(content_type));
    image_store.upload(&key, content_type, bytes).await?;

    let look = Look::new(pieces.unwrap(), gender.unwrap(), season, key, author.id);
    store.insert_look(&look).await?;
    tracing::info!(look = %look.id, author = %author.name, "Look created");
    Ok(look)
}

fn parse_pieces(raw: Option<String>, errors: &mut FieldErrors) -> Option<Vec<Uuid>> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            errors.insert("pieces", "Please, select pieces");
            return None;
        }
    };

    let mut pieces = Vec::new();
    for part in raw.split(',') {
        match part.trim().parse::<Uuid>() {
            Ok(id) => {
                if !pieces.contains(&id) {
                    pieces.push(id);
                }
            }
            Err(_) => {
                errors.insert("pieces", "Please, select pieces");
                return None;
            }
        }
    }

    if pieces.len() < 2 {
        errors.insert("pieces", "The look must consist of at least two pieces");
        return None;
    }
    Some(pieces)
}

/// The ranked look query: filter, score, sort, paginate over the user's
/// gender partition, then enrich the page for the viewing user.
pub async fn find_looks_for(
    store: &dyn Store,
    user: &User,
    query: &LookQuery,
) -> AppResult<LooksPage> {
    let candidates = store.looks_by_gender(user.gender).await?;
    let page = LookRanker::new(&candidates, user).rank(query);

    tracing::info!(
        user = %user.name,
        matched = page.total_results,
        returned = page.looks.len(),
        "Ranked look query completed"
    );

    let ranked: Vec<(&Look, Option<usize>)> = page
        .looks
        .iter()
        .map(|ranked| (ranked.look, Some(ranked.variance)))
        .collect();
    let looks = enrich(store, &ranked, user).await?;

    Ok(LooksPage {
        looks,
        total_results: page.total_results,
    })
}

/// Fetches one look enriched for the viewing user
pub async fn get_look(store: &dyn Store, user: &User, id: Uuid) -> AppResult<LookResponse> {
    let look = store
        .look_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Look not found".to_string()))?;

    let enriched = enrich(store, &[(&look, None)], user).await?;
    Ok(enriched.into_iter().next().expect("one look enriched"))
}

/// Deletes a look if the acting user authored it or is an admin, then
/// scrubs its id from every user's favorites and hidden-looks sets. The
/// cascade completes before this returns.
pub async fn delete_look(store: &dyn Store, user: &User, id: Uuid) -> AppResult<()> {
    let look = store
        .look_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Look not found".to_string()))?;

    if look.author != user.id && !user.is_admin {
        return Err(AppError::Forbidden("You cannot delete this look".to_string()));
    }

    store.delete_look(id).await?;
    store.scrub_look_refs(id).await?;
    tracing::info!(look = %id, user = %user.name, "Look deleted");
    Ok(())
}

/// Resolves piece and author records for a page of looks; pieces are
/// fetched in one batch, authors deduplicated across the page
async fn enrich(
    store: &dyn Store,
    looks: &[(&Look, Option<usize>)],
    user: &User,
) -> AppResult<Vec<LookResponse>> {
    let mut piece_ids: Vec<Uuid> = Vec::new();
    for (look, _) in looks {
        for id in &look.pieces {
            if !piece_ids.contains(id) {
                piece_ids.push(*id);
            }
        }
    }
    let pieces: HashMap<Uuid, _> = store
        .pieces_by_ids(&piece_ids)
        .await?
        .into_iter()
        .map(|piece| (piece.id, piece))
        .collect();

    let mut authors: HashMap<Uuid, Option<AuthorResponse>> = HashMap::new();
    let mut enriched = Vec::with_capacity(looks.len());
    for (look, variance) in looks {
        if !authors.contains_key(&look.author) {
            let author = store
                .user_by_id(look.author)
                .await?
                .map(|author| AuthorResponse::from(&author));
            authors.insert(look.author, author);
        }

        let resolved = look
            .pieces
            .iter()
            .filter_map(|id| pieces.get(id))
            .map(|piece| PieceResponse::new(piece, Some(user)))
            .collect();

        let mut response = LookResponse::new(
            look,
            resolved,
            authors.get(&look.author).cloned().flatten(),
            user,
        );
        if let Some(variance) = variance {
            response = response.with_variance(*variance);
        }
        enriched.push(response);
    }
    Ok(enriched)
}
