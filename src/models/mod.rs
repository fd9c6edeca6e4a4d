use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod category;
mod look;
mod piece;
mod user;

pub use category::{Category, CategoryNode};
pub use look::{AuthorResponse, Look, LookResponse, Season};
pub use piece::{Piece, PieceResponse};
pub use user::{User, UserResponse};

/// Gender partition shared by users, pieces, categories and looks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parses the wire form; `None` for anything else
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("male"), Some(Gender::Male));
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse("Apache attack helicopter"), None);
        assert_eq!(Gender::parse(""), None);
    }

    #[test]
    fn test_gender_serde_roundtrip() {
        let json = serde_json::to_string(&Gender::Female).unwrap();
        assert_eq!(json, r#""female""#);
        let parsed: Gender = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Gender::Female);
    }
}
