use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Gender;

/// An account with the per-user relevance sets driving the look ranking.
///
/// `wardrobe`, `favorites` and `hidden_looks` are sets with insertion order
/// retained for display; all mutators are idempotent. Persisting a mutation
/// is the caller's job (`Store::update_user_sets`).
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
    pub gender: Gender,
    pub is_admin: bool,
    /// Piece ids the user owns
    pub wardrobe: Vec<Uuid>,
    /// Look ids the user has liked
    pub favorites: Vec<Uuid>,
    /// Look ids the user has dismissed
    pub hidden_looks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, password_hash: String, gender: Gender) -> Self {
        Self {
            id: Uuid::now_v7(),
            name,
            password_hash,
            gender,
            is_admin: false,
            wardrobe: Vec::new(),
            favorites: Vec::new(),
            hidden_looks: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn add_to_wardrobe(&mut self, piece_id: Uuid) {
        insert_once(&mut self.wardrobe, piece_id);
    }

    pub fn remove_from_wardrobe(&mut self, piece_id: Uuid) {
        self.wardrobe.retain(|id| *id != piece_id);
    }

    pub fn add_to_favorites(&mut self, look_id: Uuid) {
        insert_once(&mut self.favorites, look_id);
    }

    pub fn remove_from_favorites(&mut self, look_id: Uuid) {
        self.favorites.retain(|id| *id != look_id);
    }

    pub fn hide_look(&mut self, look_id: Uuid) {
        insert_once(&mut self.hidden_looks, look_id);
    }

    pub fn unhide_look(&mut self, look_id: Uuid) {
        self.hidden_looks.retain(|id| *id != look_id);
    }

    pub fn owns_piece(&self, piece_id: &Uuid) -> bool {
        self.wardrobe.contains(piece_id)
    }
}

fn insert_once(set: &mut Vec<Uuid>, id: Uuid) {
    if !set.contains(&id) {
        set.push(id);
    }
}

/// Wire projection of a user; the password hash never leaves the process
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub is_admin: bool,
    pub wardrobe: Vec<Uuid>,
    pub favorites: Vec<Uuid>,
    pub hidden_looks: Vec<Uuid>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            gender: user.gender,
            is_admin: user.is_admin,
            wardrobe: user.wardrobe.clone(),
            favorites: user.favorites.clone(),
            hidden_looks: user.hidden_looks.clone(),
        }
    }
}
