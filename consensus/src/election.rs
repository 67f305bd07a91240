//! Per-hash election state.
//!
//! A block hash has at most one entry: either an inactive tally that only
//! principal representatives can seed, or an active election that counts
//! toward quorum. Keeping both in one enum makes "never both" structural.

use lattice_types::{Account, Amount, BlockHash, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionState {
    Inactive,
    Active,
    Confirmed,
}

impl ElectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Votes gathered for a hash that has no active election yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InactiveElection {
    /// Unique voters in arrival order.
    pub voters: Vec<Account>,
    pub weight: Amount,
}

impl InactiveElection {
    /// Record a voter. Returns `false` if it had already voted.
    pub(crate) fn add_voter(&mut self, representative: Account, weight: Amount) -> bool {
        if self.voters.contains(&representative) {
            return false;
        }
        self.voters.push(representative);
        self.weight += weight;
        true
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Election {
    pub voters: Vec<Account>,
    pub weight: Amount,
    /// Set exactly once, when the weight first reaches quorum.
    pub confirmed_at: Option<Timestamp>,
    /// Vote requests sent for this election.
    pub request_count: u32,
    pub started_at: Timestamp,
}

impl Election {
    /// Promote an inactive tally, carrying voters and weight over unchanged.
    pub(crate) fn from_inactive(inactive: InactiveElection, now: Timestamp) -> Self {
        Self {
            voters: inactive.voters,
            weight: inactive.weight,
            confirmed_at: None,
            request_count: 0,
            started_at: now,
        }
    }

    pub(crate) fn add_voter(&mut self, representative: Account, weight: Amount) -> bool {
        if self.voters.contains(&representative) {
            return false;
        }
        self.voters.push(representative);
        self.weight += weight;
        true
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed_at.is_some()
    }

    pub fn state(&self) -> ElectionState {
        if self.is_confirmed() {
            ElectionState::Confirmed
        } else {
            ElectionState::Active
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElectionEntry {
    Inactive(InactiveElection),
    Active(Election),
}

impl ElectionEntry {
    pub fn state(&self) -> ElectionState {
        match self {
            Self::Inactive(_) => ElectionState::Inactive,
            Self::Active(election) => election.state(),
        }
    }

    pub fn voters(&self) -> &[Account] {
        match self {
            Self::Inactive(inactive) => &inactive.voters,
            Self::Active(election) => &election.voters,
        }
    }

    pub fn weight(&self) -> Amount {
        match self {
            Self::Inactive(inactive) => inactive.weight,
            Self::Active(election) => election.weight,
        }
    }

    pub fn as_active(&self) -> Option<&Election> {
        match self {
            Self::Active(election) => Some(election),
            Self::Inactive(_) => None,
        }
    }
}

/// Snapshot of an active election, surfaced when it starts or confirms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionSummary {
    pub hash: BlockHash,
    pub voters: Vec<Account>,
    pub weight: Amount,
    pub started_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
}

impl ElectionSummary {
    pub(crate) fn of(hash: BlockHash, election: &Election) -> Self {
        Self {
            hash,
            voters: election.voters.clone(),
            weight: election.weight,
            started_at: election.started_at,
            confirmed_at: election.confirmed_at,
        }
    }

    pub fn state(&self) -> ElectionState {
        if self.confirmed_at.is_some() {
            ElectionState::Confirmed
        } else {
            ElectionState::Active
        }
    }
}
