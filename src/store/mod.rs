use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Category, Gender, Look, Piece, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Filter for the piece listing. `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct PieceFilter {
    pub gender: Option<Gender>,
    /// Case-insensitive name substring
    pub search: Option<String>,
    /// Piece must belong to one of these categories
    pub categories: Option<Vec<Uuid>>,
    /// Piece id must be one of these (wardrobe restriction)
    pub ids: Option<Vec<Uuid>>,
}

/// The single-database access surface.
///
/// Listing methods return rows in ascending id order; ids are
/// time-ordered, so that is creation order. Mutations on a user's sets go
/// through `update_user_sets` with read-modify-write semantics and no
/// locking: concurrent writers race at the field level, which is
/// acceptable because the operations are idempotent.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn insert_user(&self, user: &User) -> AppResult<()>;
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn user_by_name(&self, name: &str) -> AppResult<Option<User>>;
    async fn user_name_taken(&self, name: &str) -> AppResult<bool>;
    /// Persists the wardrobe/favorites/hidden-looks sets of an existing user
    async fn update_user_sets(&self, user: &User) -> AppResult<()>;

    // Sessions
    async fn insert_session(&self, token: Uuid, user_id: Uuid) -> AppResult<()>;
    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>>;
    async fn delete_session(&self, token: Uuid) -> AppResult<()>;

    // Categories
    /// Inserts the category and appends it to its parent's children list,
    /// as one storage operation
    async fn insert_category(&self, category: &Category) -> AppResult<()>;
    async fn category_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn all_categories(&self) -> AppResult<Vec<Category>>;
    async fn category_name_taken(&self, name: &str, gender: Gender) -> AppResult<bool>;
    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<()>;
    /// Deletes the given subtree ids and unlinks the root from its parent's
    /// children list, as one storage operation
    async fn delete_category_subtree(&self, root: &Category, subtree: &[Uuid]) -> AppResult<()>;

    // Pieces
    async fn insert_piece(&self, piece: &Piece) -> AppResult<()>;
    async fn piece_by_id(&self, id: Uuid) -> AppResult<Option<Piece>>;
    async fn pieces_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Piece>>;
    async fn find_pieces(&self, filter: &PieceFilter) -> AppResult<Vec<Piece>>;
    async fn piece_name_taken(&self, name: &str, gender: Gender, exclude: Option<Uuid>) -> AppResult<bool>;
    async fn update_piece(&self, piece: &Piece) -> AppResult<()>;
    async fn delete_piece(&self, id: Uuid) -> AppResult<()>;

    // Looks
    async fn insert_look(&self, look: &Look) -> AppResult<()>;
    async fn look_by_id(&self, id: Uuid) -> AppResult<Option<Look>>;
    async fn looks_by_gender(&self, gender: Gender) -> AppResult<Vec<Look>>;
    async fn looks_with_piece(&self, piece_id: Uuid) -> AppResult<Vec<Look>>;
    async fn delete_look(&self, id: Uuid) -> AppResult<()>;
    /// Removes the look id from every user's favorites and hidden-looks sets
    async fn scrub_look_refs(&self, look_id: Uuid) -> AppResult<()>;
}
