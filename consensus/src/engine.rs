//! The election engine: routes each (hash, representative) vote to the
//! hash's election, promotes inactive tallies and confirms on quorum.
//!
//! The engine is a plain single-owner state machine. It performs no I/O and
//! holds no locks; callers serialize access to it.

use std::collections::HashMap;

use lattice_crypto::encode_account;
use lattice_types::{Account, Amount, BlockHash, Timestamp};
use tracing::{debug, info};

use crate::config::{ActiveVotePolicy, ElectionConfig};
use crate::election::{
    Election, ElectionEntry, ElectionState, ElectionSummary, InactiveElection,
};
use crate::error::ConsensusError;
use crate::weights::WeightTable;

/// Why a vote changed nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The representative already voted for this hash.
    DuplicateVoter,
    /// Below the principal threshold and not admitted by the active-vote policy.
    NotPrincipal,
}

/// Result of one [`ElectionEngine::process_vote`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    Ignored(IgnoreReason),
    /// Weight was added; the election is now in the given state.
    Tallied(ElectionState),
    /// An inactive tally was promoted by this vote. The summary carries a
    /// confirmation time if quorum was already met at promotion.
    Started(ElectionSummary),
    /// This vote brought an active election to quorum.
    Confirmed(ElectionSummary),
}

impl VoteOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }

    /// The confirmation produced by this vote, if any.
    pub fn confirmation(&self) -> Option<&ElectionSummary> {
        match self {
            Self::Confirmed(summary) => Some(summary),
            Self::Started(summary) if summary.confirmed_at.is_some() => Some(summary),
            _ => None,
        }
    }
}

pub struct ElectionEngine {
    weights: WeightTable,
    config: ElectionConfig,
    elections: HashMap<BlockHash, ElectionEntry>,
}

impl ElectionEngine {
    pub fn new(weights: WeightTable, config: ElectionConfig) -> Self {
        Self {
            weights,
            config,
            elections: HashMap::new(),
        }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    /// Apply one representative's vote for one hash.
    ///
    /// The representative must be in the weight table; anything else is an
    /// [`ConsensusError::UnknownRepresentative`] and leaves state untouched.
    pub fn process_vote(
        &mut self,
        hash: BlockHash,
        representative: &Account,
        now: Timestamp,
    ) -> Result<VoteOutcome, ConsensusError> {
        let weight = self
            .weights
            .weight(representative)
            .ok_or(ConsensusError::UnknownRepresentative(*representative))?;
        let principal = self.weights.is_principal(representative);

        if let Some(ElectionEntry::Active(election)) = self.elections.get_mut(&hash) {
            if !principal && self.config.active_vote_policy == ActiveVotePolicy::PrincipalOnly {
                return Ok(VoteOutcome::Ignored(IgnoreReason::NotPrincipal));
            }
            if !election.add_voter(*representative, weight) {
                return Ok(VoteOutcome::Ignored(IgnoreReason::DuplicateVoter));
            }
            debug!(
                hash = %hash,
                rep = %encode_account(representative),
                voters = election.voters.len(),
                weight = %election.weight,
                "active election tally"
            );
            return Ok(match self.attempt_confirmation(hash, now) {
                Some(summary) => VoteOutcome::Confirmed(summary),
                None => VoteOutcome::Tallied(self.state_of(&hash)),
            });
        }

        if !principal {
            return Ok(VoteOutcome::Ignored(IgnoreReason::NotPrincipal));
        }

        let entry = self
            .elections
            .entry(hash)
            .or_insert_with(|| ElectionEntry::Inactive(InactiveElection::default()));
        let ElectionEntry::Inactive(inactive) = entry else {
            return Ok(VoteOutcome::Ignored(IgnoreReason::DuplicateVoter));
        };
        if !inactive.add_voter(*representative, weight) {
            return Ok(VoteOutcome::Ignored(IgnoreReason::DuplicateVoter));
        }
        debug!(
            hash = %hash,
            rep = %encode_account(representative),
            voters = inactive.voters.len(),
            weight = %inactive.weight,
            "inactive election tally"
        );

        Ok(match self.attempt_promotion(hash, now) {
            Some(summary) => VoteOutcome::Started(summary),
            None => VoteOutcome::Tallied(ElectionState::Inactive),
        })
    }

    /// Promote the hash's inactive tally once it has enough unique voters and
    /// at least the vote-hint weight, then try to confirm it immediately.
    ///
    /// Returns the new election's summary when a promotion happened.
    pub fn attempt_promotion(&mut self, hash: BlockHash, now: Timestamp) -> Option<ElectionSummary> {
        let ready = match self.elections.get(&hash) {
            Some(ElectionEntry::Inactive(inactive)) => {
                inactive.voters.len() >= self.config.min_promotion_voters
                    && inactive.weight >= self.weights.vote_hint()
            }
            _ => false,
        };
        if !ready {
            return None;
        }

        let Some(ElectionEntry::Inactive(inactive)) = self.elections.remove(&hash) else {
            return None;
        };
        let election = Election::from_inactive(inactive, now);
        log_election("election started", &hash, &election);
        self.elections.insert(hash, ElectionEntry::Active(election));

        self.attempt_confirmation(hash, now);
        self.summary(&hash)
    }

    /// Confirm the hash's active election if its weight has reached quorum.
    ///
    /// Returns the summary only on the call that confirms it; an election is
    /// confirmed at most once.
    pub fn attempt_confirmation(&mut self, hash: BlockHash, now: Timestamp) -> Option<ElectionSummary> {
        let quorum = self.weights.quorum();
        let Some(ElectionEntry::Active(election)) = self.elections.get_mut(&hash) else {
            return None;
        };
        if election.is_confirmed() || election.weight < quorum {
            return None;
        }
        election.confirmed_at = Some(now);
        log_election("election confirmed", &hash, election);
        Some(ElectionSummary::of(hash, election))
    }

    pub fn get(&self, hash: &BlockHash) -> Option<&ElectionEntry> {
        self.elections.get(hash)
    }

    pub fn summary(&self, hash: &BlockHash) -> Option<ElectionSummary> {
        self.elections
            .get(hash)
            .and_then(ElectionEntry::as_active)
            .map(|election| ElectionSummary::of(*hash, election))
    }

    /// Record that a vote request was sent for an active election.
    pub fn record_request(&mut self, hash: &BlockHash) {
        if let Some(ElectionEntry::Active(election)) = self.elections.get_mut(hash) {
            election.request_count = election.request_count.saturating_add(1);
        }
    }

    /// Active elections that have not reached quorum yet.
    pub fn unconfirmed(&self) -> impl Iterator<Item = (&BlockHash, &Election)> {
        self.elections.iter().filter_map(|(hash, entry)| match entry {
            ElectionEntry::Active(election) if !election.is_confirmed() => Some((hash, election)),
            _ => None,
        })
    }

    pub fn inactive_count(&self) -> usize {
        self.count(|state| state == ElectionState::Inactive)
    }

    /// Active elections, confirmed or not.
    pub fn active_count(&self) -> usize {
        self.count(|state| state != ElectionState::Inactive)
    }

    pub fn confirmed_count(&self) -> usize {
        self.count(|state| state == ElectionState::Confirmed)
    }

    fn count(&self, pred: impl Fn(ElectionState) -> bool) -> usize {
        self.elections.values().filter(|e| pred(e.state())).count()
    }

    fn state_of(&self, hash: &BlockHash) -> ElectionState {
        self.elections
            .get(hash)
            .map(ElectionEntry::state)
            .unwrap_or(ElectionState::Inactive)
    }

    /// Sum of the table weights of an entry's voters. Always equals the
    /// entry's recorded weight.
    pub fn recomputed_weight(&self, hash: &BlockHash) -> Option<Amount> {
        self.elections.get(hash).map(|entry| {
            entry
                .voters()
                .iter()
                .filter_map(|voter| self.weights.weight(voter))
                .sum()
        })
    }
}

fn log_election(label: &str, hash: &BlockHash, election: &Election) {
    let voters: Vec<String> = election.voters.iter().map(encode_account).collect();
    info!(
        hash = %hash,
        voters = ?voters,
        weight = %election.weight,
        started = %election.started_at,
        confirmed = ?election.confirmed_at.map(|t| t.as_millis()),
        state = election.state().as_str(),
        "{label}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_nullables::NullClock;
    use lattice_types::PublicKey;

    fn rep(byte: u8) -> Account {
        PublicKey([byte; 32])
    }

    fn make_hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    /// A = 40, B = 30, C = 30 out of 100; quorum 67, hint 10.
    fn abc_engine(min_voters: usize, policy: ActiveVotePolicy) -> ElectionEngine {
        let table = WeightTable::new(
            Amount::new(100),
            [
                (rep(0xA), Amount::new(40)),
                (rep(0xB), Amount::new(30)),
                (rep(0xC), Amount::new(30)),
            ],
        )
        .unwrap();
        ElectionEngine::new(
            table,
            ElectionConfig {
                min_promotion_voters: min_voters,
                active_vote_policy: policy,
            },
        )
    }

    #[test]
    fn confirms_after_second_vote_not_first() {
        let clock = NullClock::new(1_000);
        let mut engine = abc_engine(2, ActiveVotePolicy::AnyWeighted);
        let h = make_hash(1);

        let first = engine.process_vote(h, &rep(0xA), clock.now()).unwrap();
        assert_eq!(first, VoteOutcome::Tallied(ElectionState::Inactive));
        assert!(first.confirmation().is_none());

        clock.advance(5);
        let second = engine.process_vote(h, &rep(0xB), clock.now()).unwrap();
        let confirmation = second.confirmation().expect("confirmed on B's vote");
        assert_eq!(confirmation.weight, Amount::new(70));
        assert_eq!(confirmation.voters, vec![rep(0xA), rep(0xB)]);
        assert_eq!(confirmation.started_at, Timestamp::new(1_005));
        assert_eq!(confirmation.confirmed_at, Some(Timestamp::new(1_005)));
        assert!(matches!(second, VoteOutcome::Started(_)));
    }

    #[test]
    fn unknown_representative_is_an_error() {
        let mut engine = abc_engine(2, ActiveVotePolicy::AnyWeighted);
        let err = engine
            .process_vote(make_hash(1), &rep(0xD), Timestamp::new(0))
            .unwrap_err();
        assert_eq!(err, ConsensusError::UnknownRepresentative(rep(0xD)));
        assert!(engine.get(&make_hash(1)).is_none());
    }

    #[test]
    fn duplicate_vote_changes_nothing() {
        let mut engine = abc_engine(3, ActiveVotePolicy::AnyWeighted);
        let h = make_hash(2);
        engine.process_vote(h, &rep(0xA), Timestamp::new(1)).unwrap();
        let again = engine.process_vote(h, &rep(0xA), Timestamp::new(2)).unwrap();
        assert_eq!(again, VoteOutcome::Ignored(IgnoreReason::DuplicateVoter));
        assert_eq!(engine.get(&h).unwrap().weight(), Amount::new(40));
        assert_eq!(engine.get(&h).unwrap().voters().len(), 1);
    }

    #[test]
    fn confirmation_timestamp_is_set_once() {
        let mut engine = abc_engine(2, ActiveVotePolicy::AnyWeighted);
        let h = make_hash(3);
        engine.process_vote(h, &rep(0xA), Timestamp::new(10)).unwrap();
        engine.process_vote(h, &rep(0xB), Timestamp::new(20)).unwrap();
        let late = engine.process_vote(h, &rep(0xC), Timestamp::new(30)).unwrap();
        assert_eq!(late, VoteOutcome::Tallied(ElectionState::Confirmed));

        let election = engine.get(&h).unwrap().as_active().unwrap();
        assert_eq!(election.confirmed_at, Some(Timestamp::new(20)));
        assert_eq!(election.weight, Amount::new(100));
        assert_eq!(engine.attempt_confirmation(h, Timestamp::new(40)), None);
    }

    #[test]
    fn promotion_waits_for_min_voters() {
        let mut engine = abc_engine(3, ActiveVotePolicy::AnyWeighted);
        let h = make_hash(4);
        engine.process_vote(h, &rep(0xA), Timestamp::new(1)).unwrap();
        engine.process_vote(h, &rep(0xB), Timestamp::new(2)).unwrap();
        assert_eq!(engine.get(&h).unwrap().state(), ElectionState::Inactive);
        assert_eq!(engine.inactive_count(), 1);

        let third = engine.process_vote(h, &rep(0xC), Timestamp::new(3)).unwrap();
        assert!(matches!(third, VoteOutcome::Started(_)));
        assert_eq!(engine.inactive_count(), 0);
        assert_eq!(engine.active_count(), 1);
        assert_eq!(engine.confirmed_count(), 1);
    }

    #[test]
    fn promotion_without_quorum_stays_active() {
        let mut engine = abc_engine(1, ActiveVotePolicy::AnyWeighted);
        let h = make_hash(5);
        let outcome = engine.process_vote(h, &rep(0xB), Timestamp::new(7)).unwrap();
        match outcome {
            VoteOutcome::Started(summary) => {
                assert_eq!(summary.confirmed_at, None);
                assert_eq!(summary.weight, Amount::new(30));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(engine.unconfirmed().count(), 1);
    }

    /// A table where D sits below the principal threshold (0.1% of 100_000).
    fn engine_with_minor_rep(policy: ActiveVotePolicy) -> ElectionEngine {
        let table = WeightTable::new(
            Amount::new(100_000),
            [
                (rep(0xA), Amount::new(40_000)),
                (rep(0xB), Amount::new(30_000)),
                (rep(0xD), Amount::new(50)),
            ],
        )
        .unwrap();
        ElectionEngine::new(
            table,
            ElectionConfig {
                min_promotion_voters: 1,
                active_vote_policy: policy,
            },
        )
    }

    #[test]
    fn non_principal_cannot_seed_an_election() {
        let mut engine = engine_with_minor_rep(ActiveVotePolicy::AnyWeighted);
        let outcome = engine
            .process_vote(make_hash(6), &rep(0xD), Timestamp::new(1))
            .unwrap();
        assert_eq!(outcome, VoteOutcome::Ignored(IgnoreReason::NotPrincipal));
        assert!(engine.get(&make_hash(6)).is_none());
    }

    #[test]
    fn any_weighted_policy_counts_minor_rep_in_active_election() {
        let mut engine = engine_with_minor_rep(ActiveVotePolicy::AnyWeighted);
        let h = make_hash(7);
        engine.process_vote(h, &rep(0xA), Timestamp::new(1)).unwrap();
        let outcome = engine.process_vote(h, &rep(0xD), Timestamp::new(2)).unwrap();
        assert_eq!(outcome, VoteOutcome::Tallied(ElectionState::Active));
        assert_eq!(engine.get(&h).unwrap().weight(), Amount::new(40_050));
    }

    #[test]
    fn principal_only_policy_drops_minor_rep_everywhere() {
        let mut engine = engine_with_minor_rep(ActiveVotePolicy::PrincipalOnly);
        let h = make_hash(8);
        engine.process_vote(h, &rep(0xA), Timestamp::new(1)).unwrap();
        let outcome = engine.process_vote(h, &rep(0xD), Timestamp::new(2)).unwrap();
        assert_eq!(outcome, VoteOutcome::Ignored(IgnoreReason::NotPrincipal));
        assert_eq!(engine.get(&h).unwrap().weight(), Amount::new(40_000));
    }

    #[test]
    fn tenth_principal_voter_promotes() {
        let reps: Vec<Account> = (1..=12).map(rep).collect();
        let table = WeightTable::new(
            Amount::new(1_000),
            reps.iter().map(|r| (*r, Amount::new(20))),
        )
        .unwrap();
        let mut engine = ElectionEngine::new(table, ElectionConfig::default());
        let h = make_hash(9);

        for (i, r) in reps.iter().take(9).enumerate() {
            let outcome = engine.process_vote(h, r, Timestamp::new(i as u64)).unwrap();
            assert_eq!(outcome, VoteOutcome::Tallied(ElectionState::Inactive));
        }
        let before = engine.get(&h).unwrap().clone();
        assert_eq!(before.voters().len(), 9);
        assert!(before.weight() >= engine.weights().vote_hint());
        assert_eq!(engine.attempt_promotion(h, Timestamp::new(50)), None);

        let tenth = engine.process_vote(h, &reps[9], Timestamp::new(100)).unwrap();
        let VoteOutcome::Started(summary) = tenth else {
            panic!("tenth voter should promote");
        };
        let mut expected_voters = before.voters().to_vec();
        expected_voters.push(reps[9]);
        assert_eq!(summary.voters, expected_voters);
        assert_eq!(summary.weight, Amount::new(200));
        assert_eq!(summary.started_at, Timestamp::new(100));
        assert_eq!(summary.confirmed_at, None);
        assert_eq!(engine.inactive_count(), 0);
        assert_eq!(engine.active_count(), 1);
    }

    #[test]
    fn reference_principals_alone_stay_inactive() {
        let table = WeightTable::reference();
        let (principals, minor): (Vec<Account>, Vec<Account>) =
            table.iter().map(|(a, _)| *a).partition(|a| table.is_principal(a));
        let mut engine = ElectionEngine::new(table, ElectionConfig::default());
        let h = make_hash(10);

        for (i, r) in principals.iter().enumerate() {
            let outcome = engine.process_vote(h, r, Timestamp::new(i as u64)).unwrap();
            assert_eq!(outcome, VoteOutcome::Tallied(ElectionState::Inactive));
        }
        for r in &minor {
            let outcome = engine.process_vote(h, r, Timestamp::new(20)).unwrap();
            assert_eq!(outcome, VoteOutcome::Ignored(IgnoreReason::NotPrincipal));
        }
        assert_eq!(engine.get(&h).unwrap().voters().len(), principals.len());
        assert_eq!(
            Some(engine.get(&h).unwrap().weight()),
            engine.recomputed_weight(&h)
        );
    }
}
