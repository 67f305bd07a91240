//! Election engine tuning.

use serde::{Deserialize, Serialize};

/// Unique voters an inactive election needs before it can be promoted.
pub const DEFAULT_MIN_PROMOTION_VOTERS: usize = 10;

/// Which representatives may add weight to an election that is already active.
///
/// Inactive elections are only ever seeded by principal representatives; this
/// policy covers the later votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveVotePolicy {
    /// Any representative present in the weight table.
    #[default]
    AnyWeighted,
    /// Principal representatives only; other votes are ignored everywhere.
    PrincipalOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(default = "default_min_promotion_voters")]
    pub min_promotion_voters: usize,
    #[serde(default)]
    pub active_vote_policy: ActiveVotePolicy,
}

fn default_min_promotion_voters() -> usize {
    DEFAULT_MIN_PROMOTION_VOTERS
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            min_promotion_voters: DEFAULT_MIN_PROMOTION_VOTERS,
            active_vote_policy: ActiveVotePolicy::default(),
        }
    }
}
