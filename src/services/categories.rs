use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{Category, CategoryNode, Gender};
use crate::store::Store;

/// Creates a category under an optional parent.
///
/// The ancestors chain is computed from the parent here; linking the new id
/// into the parent's children list happens inside the store as part of the
/// same edit.
pub async fn create_category(
    store: &dyn Store,
    name: Option<String>,
    gender: Option<String>,
    parent: Option<Uuid>,
) -> AppResult<Category> {
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

    let parent = match parent {
        Some(parent_id) => match store.category_by_id(parent_id).await? {
            Some(parent) => Some(parent),
            None => {
                errors.insert("parent", "Parent category does not exist");
                None
            }
        },
        None => None,
    };

    if let Some(gender) = gender {
        if errors.get("name").is_none() && store.category_name_taken(&name, gender).await? {
            errors.insert("name", "The category with that name already exists");
        }
    }
    errors.into_result()?;

    let category = Category::new(name, gender.unwrap(), parent.as_ref());
    store.insert_category(&category).await?;
    Ok(category)
}

pub async fn rename_category(store: &dyn Store, id: Uuid, name: Option<String>) -> AppResult<()> {
    let category = store
        .category_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let mut errors = FieldErrors::new();
    let name = name.unwrap_or_default();
    if name.trim().is_empty() {
        errors.insert("name", "Name cannot be empty");
    } else if name != category.name && store.category_name_taken(&name, category.gender).await? {
        errors.insert("name", "The category with that name already exists");
    }
    errors.into_result()?;

    store.rename_category(id, &name).await
}

/// Deletes a category and its whole subtree, unlinking from the parent.
/// Pieces keep their category id and simply stop matching category filters.
pub async fn delete_category(store: &dyn Store, id: Uuid) -> AppResult<()> {
    let root = store
        .category_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let subtree = subtree_ids(store, &root).await?;
    store.delete_category_subtree(&root, &subtree).await?;
    tracing::info!(category = %root.name, removed = subtree.len(), "Category subtree deleted");
    Ok(())
}

/// The category plus every descendant, resolved via the ancestors chains
pub async fn subtree_ids(store: &dyn Store, root: &Category) -> AppResult<Vec<Uuid>> {
    let mut ids = vec![root.id];
    for category in store.all_categories().await? {
        if root.is_ancestor_of(&category) {
            ids.push(category.id);
        }
    }
    Ok(ids)
}

/// Projects the flat category list into the forest served to clients
pub fn category_tree(categories: &[Category]) -> Vec<CategoryNode> {
    let by_id: HashMap<Uuid, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    fn build(category: &Category, by_id: &HashMap<Uuid, &Category>) -> CategoryNode {
        CategoryNode {
            id: category.id,
            name: category.name.clone(),
            gender: category.gender,
            children: category
                .children
                .iter()
                .filter_map(|id| by_id.get(id))
                .map(|child| build(child, by_id))
                .collect(),
        }
    }

    categories
        .iter()
        .filter(|category| category.parent.is_none())
        .map(|root| build(root, &by_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn create(store: &MemoryStore, name: &str, parent: Option<Uuid>) -> Category {
        create_category(
            store,
            Some(name.to_string()),
            Some("male".to_string()),
            parent,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let store = MemoryStore::new();
        let result = create_category(&store, Some("  ".to_string()), None, None).await;
        match result {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("name").is_some());
                assert!(errors.get("gender").is_some());
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_within_gender() {
        let store = MemoryStore::new();
        create(&store, "Tops", None).await;

        let duplicate = create_category(
            &store,
            Some("Tops".to_string()),
            Some("male".to_string()),
            None,
        )
        .await;
        assert!(matches!(duplicate, Err(AppError::Validation(_))));

        // Same name under the other gender partition is fine
        create_category(
            &store,
            Some("Tops".to_string()),
            Some("female".to_string()),
            None,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_missing_parent() {
        let store = MemoryStore::new();
        let result = create_category(
            &store,
            Some("Shirts".to_string()),
            Some("male".to_string()),
            Some(Uuid::now_v7()),
        )
        .await;
        match result {
            Err(AppError::Validation(errors)) => {
                assert!(errors.get("parent").is_some());
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_tree_projection() {
        let store = MemoryStore::new();
        let tops = create(&store, "Tops", None).await;
        let shirts = create(&store, "Shirts", Some(tops.id)).await;
        let _dress = create(&store, "Dress shirts", Some(shirts.id)).await;
        let _hats = create(&store, "Hats", None).await;

        let categories = store.all_categories().await.unwrap();
        let tree = category_tree(&categories);

        assert_eq!(tree.len(), 2);
        let tops_node = tree.iter().find(|node| node.name == "Tops").unwrap();
        assert_eq!(tops_node.children.len(), 1);
        assert_eq!(tops_node.children[0].name, "Shirts");
        assert_eq!(tops_node.children[0].children[0].name, "Dress shirts");
    }

    #[tokio::test]
    async fn test_delete_removes_whole_subtree() {
        let store = MemoryStore::new();
        let tops = create(&store, "Tops", None).await;
        let shirts = create(&store, "Shirts", Some(tops.id)).await;
        let dress = create(&store, "Dress shirts", Some(shirts.id)).await;

        delete_category(&store, shirts.id).await.unwrap();

        assert!(store.category_by_id(shirts.id).await.unwrap().is_none());
        assert!(store.category_by_id(dress.id).await.unwrap().is_none());
        let tops = store.category_by_id(tops.id).await.unwrap().unwrap();
        assert!(tops.children.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            delete_category(&store, Uuid::now_v7()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
