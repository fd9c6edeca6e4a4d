use serde::Serialize;
use uuid::Uuid;

use super::Gender;

/// A node in the clothing classification tree.
///
/// `children` and `ancestors` are kept bidirectionally consistent by the
/// store: creating a child appends it to the parent's `children`, and the
/// child's `ancestors` chain (root to immediate parent) is fixed at
/// creation time from the parent's own chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
    pub ancestors: Vec<Uuid>,
}

impl Category {
    pub fn new(name: String, gender: Gender, parent: Option<&Category>) -> Self {
        let ancestors = match parent {
            Some(parent) => {
                let mut chain = parent.ancestors.clone();
                chain.push(parent.id);
                chain
            }
            None => Vec::new(),
        };

        Self {
            id: Uuid::now_v7(),
            name,
            gender,
            parent: parent.map(|p| p.id),
            children: Vec::new(),
            ancestors,
        }
    }

    /// True when `other` sits below this node (this id appears in its chain)
    pub fn is_ancestor_of(&self, other: &Category) -> bool {
        other.ancestors.contains(&self.id)
    }
}

/// Recursive tree projection served by the category listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub children: Vec<CategoryNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_no_ancestors() {
        let root = Category::new("Tops".to_string(), Gender::Male, None);
        assert!(root.ancestors.is_empty());
        assert_eq!(root.parent, None);
    }

    #[test]
    fn test_ancestors_chain_from_parent() {
        let root = Category::new("Tops".to_string(), Gender::Male, None);
        let mid = Category::new("Shirts".to_string(), Gender::Male, Some(&root));
        let leaf = Category::new("Dress shirts".to_string(), Gender::Male, Some(&mid));

        assert_eq!(mid.ancestors, vec![root.id]);
        assert_eq!(leaf.ancestors, vec![root.id, mid.id]);
        assert!(root.is_ancestor_of(&leaf));
        assert!(mid.is_ancestor_of(&leaf));
        assert!(!leaf.is_ancestor_of(&mid));
    }
}
