use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Category, Gender, Look, Piece, User};

use super::{PieceFilter, Store};

/// In-process store used by the test suite and store-less local runs.
///
/// One `RwLock` over the whole dataset; every trait method is a single
/// lock acquisition, so each operation is atomic with respect to the
/// others (mirroring the per-statement atomicity of the SQL store).
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Uuid>,
    categories: HashMap<Uuid, Category>,
    pieces: HashMap<Uuid, Piece>,
    looks: HashMap<Uuid, Look>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_id<T>(mut items: Vec<T>, id: impl Fn(&T) -> Uuid) -> Vec<T> {
    items.sort_by_key(id);
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|user| user.name == name).cloned())
    }

    async fn user_name_taken(&self, name: &str) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().any(|user| user.name == name))
    }

    async fn update_user_sets(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(stored) = inner.users.get_mut(&user.id) {
            stored.wardrobe = user.wardrobe.clone();
            stored.favorites = user.favorites.clone();
            stored.hidden_looks = user.hidden_looks.clone();
        }
        Ok(())
    }

    async fn insert_session(&self, token: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(token, user_id);
        Ok(())
    }

    async fn session_user(&self, token: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(&token)
            .and_then(|user_id| inner.users.get(user_id))
            .cloned())
    }

    async fn delete_session(&self, token: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(&token);
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(parent_id) = category.parent {
            if let Some(parent) = inner.categories.get_mut(&parent_id) {
                if !parent.children.contains(&category.id) {
                    parent.children.push(category.id);
                }
            }
        }
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn category_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let inner = self.inner.read().await;
        Ok(inner.categories.get(&id).cloned())
    }

    async fn all_categories(&self) -> AppResult<Vec<Category>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(
            inner.categories.values().cloned().collect(),
            |category| category.id,
        ))
    }

    async fn category_name_taken(&self, name: &str, gender: Gender) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .categories
            .values()
            .any(|category| category.name == name && category.gender == gender))
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(category) = inner.categories.get_mut(&id) {
            category.name = name.to_string();
        }
        Ok(())
    }

    async fn delete_category_subtree(&self, root: &Category, subtree: &[Uuid]) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        for id in subtree {
            inner.categories.remove(id);
        }
        if let Some(parent_id) = root.parent {
            if let Some(parent) = inner.categories.get_mut(&parent_id) {
                parent.children.retain(|child| *child != root.id);
            }
        }
        Ok(())
    }

    async fn insert_piece(&self, piece: &Piece) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.pieces.insert(piece.id, piece.clone());
        Ok(())
    }

    async fn piece_by_id(&self, id: Uuid) -> AppResult<Option<Piece>> {
        let inner = self.inner.read().await;
        Ok(inner.pieces.get(&id).cloned())
    }

    async fn pieces_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Piece>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.pieces.get(id))
            .cloned()
            .collect())
    }

    async fn find_pieces(&self, filter: &PieceFilter) -> AppResult<Vec<Piece>> {
        let inner = self.inner.read().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let matching = inner
            .pieces
            .values()
            .filter(|piece| filter.gender.map_or(true, |gender| piece.gender == gender))
            .filter(|piece| {
                search
                    .as_ref()
                    .map_or(true, |needle| piece.name.to_lowercase().contains(needle))
            })
            .filter(|piece| {
                filter
                    .categories
                    .as_ref()
                    .map_or(true, |categories| categories.contains(&piece.category))
            })
            .filter(|piece| {
                filter
                    .ids
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&piece.id))
            })
            .cloned()
            .collect();
        Ok(sorted_by_id(matching, |piece| piece.id))
    }

    async fn piece_name_taken(&self, name: &str, gender: Gender, exclude: Option<Uuid>) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.pieces.values().any(|piece| {
            piece.name == name && piece.gender == gender && Some(piece.id) != exclude
        }))
    }

    async fn update_piece(&self, piece: &Piece) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.pieces.insert(piece.id, piece.clone());
        Ok(())
    }

    async fn delete_piece(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.pieces.remove(&id);
        Ok(())
    }

    async fn insert_look(&self, look: &Look) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.looks.insert(look.id, look.clone());
        Ok(())
    }

    async fn look_by_id(&self, id: Uuid) -> AppResult<Option<Look>> {
        let inner = self.inner.read().await;
        Ok(inner.looks.get(&id).cloned())
    }

    async fn looks_by_gender(&self, gender: Gender) -> AppResult<Vec<Look>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(
            inner
                .looks
                .values()
                .filter(|look| look.gender == gender)
                .cloned()
                .collect(),
            |look| look.id,
        ))
    }

    async fn looks_with_piece(&self, piece_id: Uuid) -> AppResult<Vec<Look>> {
        let inner = self.inner.read().await;
        Ok(sorted_by_id(
            inner
                .looks
                .values()
                .filter(|look| look.contains_piece(&piece_id))
                .cloned()
                .collect(),
            |look| look.id,
        ))
    }

    async fn delete_look(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.looks.remove(&id);
        Ok(())
    }

    async fn scrub_look_refs(&self, look_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        for user in inner.users.values_mut() {
            user.favorites.retain(|id| *id != look_id);
            user.hidden_looks.retain(|id| *id != look_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(name.to_string(), "hash".to_string(), Gender::Male)
    }

    #[tokio::test]
    async fn test_update_user_sets_persists_only_sets() {
        let store = MemoryStore::new();
        let mut u = user("user");
        store.insert_user(&u).await.unwrap();

        let piece = Uuid::now_v7();
        u.add_to_wardrobe(piece);
        u.name = "renamed".to_string();
        store.update_user_sets(&u).await.unwrap();

        let stored = store.user_by_id(u.id).await.unwrap().unwrap();
        assert_eq!(stored.wardrobe, vec![piece]);
        assert_eq!(stored.name, "user");
    }

    #[tokio::test]
    async fn test_session_resolves_user() {
        let store = MemoryStore::new();
        let u = user("user");
        store.insert_user(&u).await.unwrap();

        let token = Uuid::new_v4();
        store.insert_session(token, u.id).await.unwrap();
        assert_eq!(store.session_user(token).await.unwrap().unwrap().id, u.id);

        store.delete_session(token).await.unwrap();
        assert!(store.session_user(token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_category_links_parent() {
        let store = MemoryStore::new();
        let root = Category::new("Tops".to_string(), Gender::Male, None);
        store.insert_category(&root).await.unwrap();
        let child = Category::new("Shirts".to_string(), Gender::Male, Some(&root));
        store.insert_category(&child).await.unwrap();

        let stored_root = store.category_by_id(root.id).await.unwrap().unwrap();
        assert_eq!(stored_root.children, vec![child.id]);
    }

    #[tokio::test]
    async fn test_delete_category_subtree_unlinks_parent() {
        let store = MemoryStore::new();
        let root = Category::new("Tops".to_string(), Gender::Male, None);
        store.insert_category(&root).await.unwrap();
        let child = Category::new("Shirts".to_string(), Gender::Male, Some(&root));
        store.insert_category(&child).await.unwrap();
        let grandchild = Category::new("Dress shirts".to_string(), Gender::Male, Some(&child));
        store.insert_category(&grandchild).await.unwrap();

        let child = store.category_by_id(child.id).await.unwrap().unwrap();
        store
            .delete_category_subtree(&child, &[child.id, grandchild.id])
            .await
            .unwrap();

        assert!(store.category_by_id(child.id).await.unwrap().is_none());
        assert!(store.category_by_id(grandchild.id).await.unwrap().is_none());
        let stored_root = store.category_by_id(root.id).await.unwrap().unwrap();
        assert!(stored_root.children.is_empty());
    }

    #[tokio::test]
    async fn test_find_pieces_filters_compose() {
        let store = MemoryStore::new();
        let category = Category::new("Tops".to_string(), Gender::Male, None);
        store.insert_category(&category).await.unwrap();
        let other_category = Category::new("Hats".to_string(), Gender::Male, None);
        store.insert_category(&other_category).await.unwrap();

        let shirt = Piece::new("White shirt".to_string(), Gender::Male, category.id, "a.jpg".to_string());
        let dress = Piece::new("White dress".to_string(), Gender::Female, category.id, "b.jpg".to_string());
        let fedora = Piece::new("Black fedora".to_string(), Gender::Male, other_category.id, "c.jpg".to_string());
        for piece in [&shirt, &dress, &fedora] {
            store.insert_piece(piece).await.unwrap();
        }

        let by_gender = store
            .find_pieces(&PieceFilter {
                gender: Some(Gender::Male),
                ..PieceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_gender.len(), 2);

        let by_search = store
            .find_pieces(&PieceFilter {
                search: Some("WHITE".to_string()),
                ..PieceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_search.len(), 2);

        let combined = store
            .find_pieces(&PieceFilter {
                gender: Some(Gender::Male),
                search: Some("white".to_string()),
                categories: Some(vec![category.id]),
                ..PieceFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].id, shirt.id);
    }

    #[tokio::test]
    async fn test_scrub_look_refs_clears_all_users() {
        let store = MemoryStore::new();
        let look_id = Uuid::now_v7();
        let other_look = Uuid::now_v7();

        let mut first = user("first");
        first.add_to_favorites(look_id);
        first.add_to_favorites(other_look);
        let mut second = user("second");
        second.hide_look(look_id);
        store.insert_user(&first).await.unwrap();
        store.insert_user(&second).await.unwrap();

        store.scrub_look_refs(look_id).await.unwrap();

        let first = store.user_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(first.favorites, vec![other_look]);
        let second = store.user_by_id(second.id).await.unwrap().unwrap();
        assert!(second.hidden_looks.is_empty());
    }

    #[tokio::test]
    async fn test_piece_name_taken_scoped_to_gender() {
        let store = MemoryStore::new();
        let category = Uuid::now_v7();
        let piece = Piece::new("White shirt".to_string(), Gender::Male, category, "a.jpg".to_string());
        store.insert_piece(&piece).await.unwrap();

        assert!(store
            .piece_name_taken("White shirt", Gender::Male, None)
            .await
            .unwrap());
        assert!(!store
            .piece_name_taken("White shirt", Gender::Female, None)
            .await
            .unwrap());
        assert!(!store
            .piece_name_taken("White shirt", Gender::Male, Some(piece.id))
            .await
            .unwrap());
    }
}
