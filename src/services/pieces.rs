use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{Gender, Piece, PieceResponse, User};
use crate::services::categories::subtree_ids;
use crate::services::images::{self, ImageStore};
use crate::store::{PieceFilter, Store};

pub const DEFAULT_LIMIT: usize = 20;

/// Parameters of the piece listing, as they arrive from the query string
#[derive(Debug, Default)]
pub struct PieceSearch {
    pub gender: Option<String>,
    pub search: Option<String>,
    pub category: Option<Uuid>,
    pub in_wardrobe: bool,
    pub limit: usize,
    pub skip: usize,
}

/// One page of the piece listing
#[derive(Debug, serde::Serialize)]
pub struct PiecePage {
    pub pieces: Vec<PieceResponse>,
    pub limit: usize,
    pub skip: usize,
    pub total: usize,
}

/// Creates a piece: validate everything, then upload, then persist.
/// A failed upload leaves no record behind.
pub async fn create_piece(
    store: &dyn Store,
    image_store: &dyn ImageStore,
    name: Option<String>,
    gender: Option<String>,
    category: Option<Uuid>,
    img: Option<String>,
) -> AppResult<Piece> {
    let mut errors = FieldErrors::new();

    let name = name.unwrap_or_default();
    if name.trim().is_empty() {
        errors.insert("name", "Name cannot be empty");
    }

    let gender = match gender.as_deref().map(Gender::parse) {
        Some(Some(gender)) => Some(gender),
        _ => {
            errors.insert("gender", "Please, select gender");
            None
        }
    };

    let category = match category {
        Some(category_id) => {
            if store.category_by_id(category_id).await?.is_none() {
                errors.insert("category", "Category does not exist");
            }
            Some(category_id)
        }
        None => {
            errors.insert("category", "Please, choose a category");
            None
        }
    };

    let image = images::decode_payload(img, &mut errors);

    if let Some(gender) = gender {
        if errors.get("name").is_none() && store.piece_name_taken(&name, gender, None).await? {
            errors.insert("name", "The piece with that name already exists");
        }
    }
    errors.into_result()?;

    let (bytes, content_type) = image.unwrap();
    let key = format!("pieces/{}.{}", Uuid::new_v4(), images::extension_for(content_type));
    image_store.upload(&key, content_type, bytes).await?;

    let piece = Piece::new(name, gender.unwrap(), category.unwrap(), key);
    store.insert_piece(&piece).await?;
    Ok(piece)
}

/// Partial update of name/gender/category; untouched fields keep their value
pub async fn update_piece(
    store: &dyn Store,
    id: Uuid,
    name: Option<String>,
    gender: Option<String>,
    category: Option<Uuid>,
) -> AppResult<()> {
    let mut piece = store
        .piece_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Piece not found".to_string()))?;

    let mut errors = FieldErrors::new();

    if let Some(name) = name {
        if name.trim().is_empty() {
            errors.insert("name", "Name cannot be empty");
        } else {
            piece.name = name;
        }
    }

    if let Some(raw) = gender {
        match Gender::parse(&raw) {
            Some(gender) => piece.gender = gender,
            None => errors.insert("gender", "Please, select gender"),
        }
    }

    if let Some(category_id) = category {
        if store.category_by_id(category_id).await?.is_none() {
            errors.insert("category", "Category does not exist");
        } else {
            piece.category = category_id;
        }
    }

    if errors.is_empty()
        && store
            .piece_name_taken(&piece.name, piece.gender, Some(piece.id))
            .await?
    {
        errors.insert("name", "The piece with that name already exists");
    }
    errors.into_result()?;

    store.update_piece(&piece).await
}

/// Deletes a piece and every look that contains it, scrubbing those look
/// ids from all user sets. The cascade completes before this returns.
pub async fn delete_piece(store: &dyn Store, id: Uuid) -> AppResult<()> {
    if store.piece_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Piece not found".to_string()));
    }

    store.delete_piece(id).await?;

    let dependent = store.looks_with_piece(id).await?;
    let cascaded = dependent.len();
    for look in dependent {
        store.delete_look(look.id).await?;
        store.scrub_look_refs(look.id).await?;
    }
    tracing::info!(piece = %id, cascaded_looks = cascaded, "Piece deleted");
    Ok(())
}

/// Filtered, paginated piece listing. The category filter includes every
/// descendant category; the wardrobe filter and `inWardrobe` flags apply
/// only when a user context is present.
pub async fn find_pieces(
    store: &dyn Store,
    user: Option<&User>,
    search: PieceSearch,
) -> AppResult<PiecePage> {
    let categories = match search.category {
        Some(category_id) => match store.category_by_id(category_id).await? {
            Some(category) => Some(subtree_ids(store, &category).await?),
            // An unknown category matches nothing
            None => Some(Vec::new()),
        },
        None => None,
    };

    let ids = match (search.in_wardrobe, user) {
        (true, Some(user)) => Some(user.wardrobe.clone()),
        _ => None,
    };

    let filter = PieceFilter {
        gender: search.gender.as_deref().and_then(Gender::parse),
        search: search.search.clone(),
        categories,
        ids,
    };

    let matching = store.find_pieces(&filter).await?;
    let total = matching.len();
    let pieces = matching
        .iter()
        .skip(search.skip)
        .take(search.limit)
        .map(|piece| PieceResponse::new(piece, user))
        .collect();

    Ok(PiecePage {
        pieces,
        limit: search.limit,
        skip: search.skip,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Look};
    use crate::services::images::{MemoryImageStore, MockImageStore, JPEG_MAGIC};
    use crate::store::MemoryStore;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    fn jpeg_base64() -> String {
        BASE64.encode(JPEG_MAGIC)
    }

    async fn seed_category(store: &MemoryStore) -> Category {
        let category = Category::new("Tops".to_string(), Gender::Male, None);
        store.insert_category(&category).await.unwrap();
        category
    }

    #[tokio::test]
    async fn test_create_piece_happy_path() {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let category = seed_category(&store).await;

        let piece = create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();

        assert_eq!(store.piece_by_id(piece.id).await.unwrap().unwrap().name, "White shirt");
        assert!(images.fetch(&piece.img).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_piece_collects_field_errors_without_uploading() {
        let store = MemoryStore::new();
        let mut images = MockImageStore::new();
        images.expect_upload().never();

        let result = create_piece(
            &store,
            &images,
            Some("".to_string()),
            Some("invalid".to_string()),
            None,
            Some(jpeg_base64()),
        )
        .await;

        match result {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("name"), Some("Name cannot be empty"));
                assert_eq!(errors.get("gender"), Some("Please, select gender"));
                assert_eq!(errors.get("category"), Some("Please, choose a category"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_create_piece_rejects_duplicate_name_within_gender() {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let category = seed_category(&store).await;

        for (name, gender) in [("White shirt", "male"), ("White shirt", "female")] {
            create_piece(
                &store,
                &images,
                Some(name.to_string()),
                Some(gender.to_string()),
                Some(category.id),
                Some(jpeg_base64()),
            )
            .await
            .unwrap();
        }

        let duplicate = create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await;

        match duplicate {
            Err(AppError::Validation(errors)) => {
                assert_eq!(errors.get("name"), Some("The piece with that name already exists"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_no_record() {
        let store = MemoryStore::new();
        let mut images = MockImageStore::new();
        images
            .expect_upload()
            .once()
            .returning(|_, _, _| Err(AppError::Internal("image store unavailable".to_string())));
        let category = seed_category(&store).await;

        let result = create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await;

        assert!(result.is_err());
        let listing = store.find_pieces(&PieceFilter::default()).await.unwrap();
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn test_delete_piece_cascades_to_looks() {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let category = seed_category(&store).await;

        let shirt = create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();
        let jeans = create_piece(
            &store,
            &images,
            Some("Blue jeans".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();

        let mut user = User::new("user".to_string(), "hash".to_string(), Gender::Male);
        store.insert_user(&user).await.unwrap();
        let look = Look::new(
            vec![shirt.id, jeans.id],
            Gender::Male,
            None,
            "looks/a.jpg".to_string(),
            user.id,
        );
        store.insert_look(&look).await.unwrap();
        user.add_to_favorites(look.id);
        store.update_user_sets(&user).await.unwrap();

        delete_piece(&store, shirt.id).await.unwrap();

        assert!(store.piece_by_id(shirt.id).await.unwrap().is_none());
        assert!(store.look_by_id(look.id).await.unwrap().is_none());
        let user = store.user_by_id(user.id).await.unwrap().unwrap();
        assert!(user.favorites.is_empty());
    }

    #[tokio::test]
    async fn test_find_pieces_includes_descendant_categories() {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let tops = seed_category(&store).await;
        let shirts = Category::new("Shirts".to_string(), Gender::Male, Some(&tops));
        store.insert_category(&shirts).await.unwrap();

        create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(shirts.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();

        let page = find_pieces(
            &store,
            None,
            PieceSearch {
                category: Some(tops.id),
                limit: DEFAULT_LIMIT,
                ..PieceSearch::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.pieces[0].name, "White shirt");
        assert_eq!(page.pieces[0].in_wardrobe, None);
    }

    #[tokio::test]
    async fn test_find_pieces_wardrobe_restriction_and_flags() {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let category = seed_category(&store).await;

        let shirt = create_piece(
            &store,
            &images,
            Some("White shirt".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();
        create_piece(
            &store,
            &images,
            Some("Blue jeans".to_string()),
            Some("male".to_string()),
            Some(category.id),
            Some(jpeg_base64()),
        )
        .await
        .unwrap();

        let mut user = User::new("user".to_string(), "hash".to_string(), Gender::Male);
        user.add_to_wardrobe(shirt.id);
        store.insert_user(&user).await.unwrap();

        let page = find_pieces(
            &store,
            Some(&user),
            PieceSearch {
                in_wardrobe: true,
                limit: DEFAULT_LIMIT,
                ..PieceSearch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.pieces[0].id, shirt.id);
        assert_eq!(page.pieces[0].in_wardrobe, Some(true));

        let all = find_pieces(
            &store,
            Some(&user),
            PieceSearch {
                limit: DEFAULT_LIMIT,
                ..PieceSearch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(all.total, 2);
        assert!(all
            .pieces
            .iter()
            .any(|piece| piece.in_wardrobe == Some(false)));
    }
}
