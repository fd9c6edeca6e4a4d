use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use super::{Gender, PieceResponse, User};

/// Seasonal tag on a look; optional because early records predate it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Season {
    Summer,
    Winter,
    DemiSeason,
}

impl Season {
    /// Parses the wire form; `None` for anything else
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "summer" => Some(Season::Summer),
            "winter" => Some(Season::Winter),
            "demi-season" => Some(Season::DemiSeason),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Winter => "winter",
            Season::DemiSeason => "demi-season",
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored outfit: at least two pieces plus gender/season/image/author.
///
/// Ids are time-ordered (UUID v7), so ascending id order is creation order;
/// the ranking tie-break and pagination lean on that.
#[derive(Debug, Clone, PartialEq)]
pub struct Look {
    pub id: Uuid,
    pub pieces: Vec<Uuid>,
    pub gender: Gender,
    pub season: Option<Season>,
    /// Opaque key into the image store
    pub img: String,
    pub author: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Look {
    pub fn new(pieces: Vec<Uuid>, gender: Gender, season: Option<Season>, img: String, author: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            pieces,
            gender,
            season,
            img,
            author,
            created_at: Utc::now(),
        }
    }

    pub fn contains_piece(&self, piece_id: &Uuid) -> bool {
        self.pieces.contains(piece_id)
    }
}

/// Author summary attached to an enriched look
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<&User> for AuthorResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// A look enriched for one viewing user: resolved pieces with ownership
/// flags, the author summary and the per-user relationship flags
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookResponse {
    pub id: Uuid,
    pub pieces: Vec<PieceResponse>,
    pub gender: Gender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    pub img: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub can_delete: bool,
    /// Relevance score, present on ranked-query results only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<usize>,
}

impl LookResponse {
    pub fn new(look: &Look, pieces: Vec<PieceResponse>, author: Option<AuthorResponse>, user: &User) -> Self {
        Self {
            id: look.id,
            pieces,
            gender: look.gender,
            season: look.season,
            img: look.img.clone(),
            author,
            is_liked: user.favorites.contains(&look.id),
            is_disliked: user.hidden_looks.contains(&look.id),
            can_delete: look.author == user.id || user.is_admin,
            variance: None,
        }
    }

    pub fn with_variance(mut self, variance: usize) -> Self {
        self.variance = Some(variance);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_parse() {
        assert_eq!(Season::parse("summer"), Some(Season::Summer));
        assert_eq!(Season::parse("winter"), Some(Season::Winter));
        assert_eq!(Season::parse("demi-season"), Some(Season::DemiSeason));
        assert_eq!(Season::parse("spring"), None);
    }

    #[test]
    fn test_season_serde_kebab_case() {
        let json = serde_json::to_string(&Season::DemiSeason).unwrap();
        assert_eq!(json, r#""demi-season""#);
    }

    #[test]
    fn test_look_ids_are_creation_ordered() {
        let author = Uuid::now_v7();
        let pieces = vec![Uuid::now_v7(), Uuid::now_v7()];
        let first = Look::new(pieces.clone(), Gender::Male, Some(Season::Summer), "a.jpg".to_string(), author);
        let second = Look::new(pieces, Gender::Male, Some(Season::Summer), "b.jpg".to_string(), author);
        assert!(first.id < second.id);
    }

    #[test]
    fn test_response_flags_for_user() {
        let mut author = User::new("author".to_string(), "hash".to_string(), Gender::Male);
        let look = Look::new(
            vec![Uuid::now_v7(), Uuid::now_v7()],
            Gender::Male,
            None,
            "img.jpg".to_string(),
            author.id,
        );
        author.add_to_favorites(look.id);
        author.hide_look(look.id);

        let response = LookResponse::new(&look, Vec::new(), Some(AuthorResponse::from(&author)), &author);
        assert!(response.is_liked);
        assert!(response.is_disliked);
        assert!(response.can_delete);

        let stranger = User::new("stranger".to_string(), "hash".to_string(), Gender::Male);
        let response = LookResponse::new(&look, Vec::new(), None, &stranger);
        assert!(!response.is_liked);
        assert!(!response.can_delete);
    }
}
