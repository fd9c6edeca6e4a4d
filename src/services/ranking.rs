use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{Look, Season, User};

/// Default page size when the caller sends nothing parseable
pub const DEFAULT_LIMIT: usize = 15;
pub const DEFAULT_SKIP: usize = 0;

/// Options for the ranked look query
#[derive(Debug, Clone, PartialEq)]
pub struct LookQuery {
    pub limit: usize,
    pub skip: usize,
    /// Restrict to the user's favorites (takes precedence over `show_disliked`)
    pub favorites: bool,
    /// Include hidden looks; still excludes favorites
    pub show_disliked: bool,
    pub season: Option<Season>,
}

impl Default for LookQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: DEFAULT_SKIP,
            favorites: false,
            show_disliked: false,
            season: None,
        }
    }
}

/// A matching look with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedLook<'a> {
    pub look: &'a Look,
    /// Count of the look's pieces missing from the user's wardrobe;
    /// lower means fewer items to acquire, so a better match
    pub variance: usize,
}

/// One page of the ranked result set
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPage<'a> {
    pub looks: Vec<RankedLook<'a>>,
    /// Size of the whole matching set, independent of the page window
    pub total_results: usize,
}

/// Ranks a user's candidate looks by wardrobe relevance.
///
/// The pipeline is filter, score, sort, paginate, in that order, over the
/// supplied slice. A look is a candidate when its gender matches the
/// user's, it shares at least one piece with the wardrobe, it carries the
/// queried season (when one is given), and it passes the visibility
/// clause: favorites view selects exactly the favorited ids (hidden or
/// not); the disliked view selects everything not favorited; the default
/// view selects what is neither favorited nor hidden.
pub struct LookRanker<'a> {
    looks: &'a [Look],
    user: &'a User,
}

impl<'a> LookRanker<'a> {
    pub fn new(looks: &'a [Look], user: &'a User) -> Self {
        Self { looks, user }
    }

    pub fn rank(&self, query: &LookQuery) -> RankedPage<'a> {
        let wardrobe: HashSet<Uuid> = self.user.wardrobe.iter().copied().collect();
        let favorites: HashSet<Uuid> = self.user.favorites.iter().copied().collect();
        let hidden: HashSet<Uuid> = self.user.hidden_looks.iter().copied().collect();

        let mut matching: Vec<RankedLook<'a>> = self
            .looks
            .iter()
            .filter(|look| Self::matches(look, self.user, &wardrobe, &favorites, &hidden, query))
            .map(|look| RankedLook {
                look,
                variance: variance(look, &wardrobe),
            })
            .collect();

        // Ascending variance, ties by ascending id; id order is creation order
        matching.sort_by_key(|ranked| (ranked.variance, ranked.look.id));

        let total_results = matching.len();
        let looks = matching
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .collect();

        RankedPage {
            looks,
            total_results,
        }
    }

    fn matches(
        look: &Look,
        user: &User,
        wardrobe: &HashSet<Uuid>,
        favorites: &HashSet<Uuid>,
        hidden: &HashSet<Uuid>,
        query: &LookQuery,
    ) -> bool {
        if look.gender != user.gender {
            return false;
        }

        // A look entirely foreign to the wardrobe is never shown
        if !look.pieces.iter().any(|piece| wardrobe.contains(piece)) {
            return false;
        }

        if let Some(season) = query.season {
            if look.season != Some(season) {
                return false;
            }
        }

        if query.favorites {
            favorites.contains(&look.id)
        } else if query.show_disliked {
            !favorites.contains(&look.id)
        } else {
            !favorites.contains(&look.id) && !hidden.contains(&look.id)
        }
    }
}

/// Count of the look's pieces the user does not already own
pub fn variance(look: &Look, wardrobe: &HashSet<Uuid>) -> usize {
    look.pieces
        .iter()
        .filter(|piece| !wardrobe.contains(piece))
        .count()
}
