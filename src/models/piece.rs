use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Gender, User};

/// A catalog clothing item, categorized and gendered
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub category: Uuid,
    /// Opaque key into the image store
    pub img: String,
    pub created_at: DateTime<Utc>,
}

impl Piece {
    pub fn new(name: String, gender: Gender, category: Uuid, img: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            gender,
            category,
            img,
            created_at: Utc::now(),
        }
    }
}

/// Wire projection of a piece, with the ownership flag when a user
/// context was supplied
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceResponse {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub category: Uuid,
    pub img: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_wardrobe: Option<bool>,
}

impl PieceResponse {
    pub fn new(piece: &Piece, user: Option<&User>) -> Self {
        Self {
            id: piece.id,
            name: piece.name.clone(),
            gender: piece.gender,
            category: piece.category,
            img: piece.img.clone(),
            in_wardrobe: user.map(|user| user.owns_piece(&piece.id)),
        }
    }
}
