use proptest::prelude::*;

use lattice_consensus::{
    ActiveVotePolicy, ElectionConfig, ElectionEngine, ElectionEntry, WeightTable,
};
use lattice_types::{Account, Amount, BlockHash, PublicKey, Timestamp};

const REPS: u8 = 12;

/// Twelve representatives, the last three below the principal threshold.
fn table() -> WeightTable {
    let weights = (0..REPS).map(|i| {
        let weight = if i < 9 { 50_000 + i as u128 * 1_000 } else { 40 };
        (PublicKey([i + 1; 32]), Amount::new(weight))
    });
    WeightTable::new(Amount::new(600_000), weights).unwrap()
}

fn rep(i: u8) -> Account {
    PublicKey([i + 1; 32])
}

fn arb_policy() -> impl Strategy<Value = ActiveVotePolicy> {
    prop_oneof![
        Just(ActiveVotePolicy::AnyWeighted),
        Just(ActiveVotePolicy::PrincipalOnly)
    ]
}

proptest! {
    /// After every vote, each entry's weight equals the summed table weight
    /// of its unique voters.
    #[test]
    fn weight_is_conserved(
        votes in prop::collection::vec((0u8..4, 0..REPS), 1..200),
        min_voters in 1usize..12,
        policy in arb_policy(),
    ) {
        let mut engine = ElectionEngine::new(
            table(),
            ElectionConfig { min_promotion_voters: min_voters, active_vote_policy: policy },
        );
        for (i, (h, r)) in votes.iter().enumerate() {
            let hash = BlockHash::new([*h; 32]);
            engine.process_vote(hash, &rep(*r), Timestamp::new(i as u64)).unwrap();

            for h in 0u8..4 {
                let hash = BlockHash::new([h; 32]);
                if let Some(entry) = engine.get(&hash) {
                    prop_assert_eq!(Some(entry.weight()), engine.recomputed_weight(&hash));
                    let mut voters = entry.voters().to_vec();
                    voters.sort();
                    voters.dedup();
                    prop_assert_eq!(voters.len(), entry.voters().len());
                }
            }
        }
    }

    /// Once confirmed, the confirmation time never moves, and a confirmation
    /// is reported at most once per hash.
    #[test]
    fn confirmation_is_monotonic(
        votes in prop::collection::vec(0..REPS, 1..100),
        min_voters in 1usize..6,
    ) {
        let mut engine = ElectionEngine::new(
            table(),
            ElectionConfig { min_promotion_voters: min_voters, active_vote_policy: ActiveVotePolicy::AnyWeighted },
        );
        let hash = BlockHash::new([7; 32]);
        let mut confirmed_at = None;
        let mut confirmations = 0;
        for (i, r) in votes.iter().enumerate() {
            let outcome = engine.process_vote(hash, &rep(*r), Timestamp::new(i as u64 + 1)).unwrap();
            if outcome.confirmation().is_some() {
                confirmations += 1;
            }
            let current = match engine.get(&hash) {
                Some(ElectionEntry::Active(election)) => election.confirmed_at,
                _ => None,
            };
            if confirmed_at.is_some() {
                prop_assert_eq!(current, confirmed_at);
            }
            confirmed_at = current;
        }
        prop_assert!(confirmations <= 1);
    }

    /// Re-delivering the same votes in any order leaves the same tallies.
    #[test]
    fn redelivery_is_harmless(votes in prop::collection::vec(0..REPS, 1..30)) {
        let config = ElectionConfig { min_promotion_voters: 100, active_vote_policy: ActiveVotePolicy::AnyWeighted };
        let hash = BlockHash::new([1; 32]);

        let mut once = ElectionEngine::new(table(), config);
        for r in &votes {
            once.process_vote(hash, &rep(*r), Timestamp::new(1)).unwrap();
        }
        let mut twice = ElectionEngine::new(table(), config);
        for r in votes.iter().chain(votes.iter().rev()) {
            twice.process_vote(hash, &rep(*r), Timestamp::new(1)).unwrap();
        }
        prop_assert_eq!(
            once.get(&hash).map(|e| e.weight()),
            twice.get(&hash).map(|e| e.weight())
        );
    }
}
