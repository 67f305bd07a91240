//! Representative voting weights and the thresholds derived from them.
//!
//! All thresholds are fractions of the trended online weight, computed once
//! when the table is built:
//!
//! - quorum: 67% (confirmation)
//! - vote hint: 10% (promotion of an inactive election)
//! - principal: 0.1% (allowed to seed a new inactive election)
//!
//! Weights are raw units in a u128. A table is rejected if the weights of its
//! representatives sum past `u128::MAX`, so no tally of distinct voters can
//! overflow.

use std::collections::HashMap;

use lattice_types::{Account, Amount, PublicKey};

use crate::error::ConsensusError;

const QUORUM_PERCENT: u128 = 67;
const VOTE_HINT_DIVISOR: u128 = 10;
const PRINCIPAL_DIVISOR: u128 = 1000;

/// Trended online weight of the reference table.
pub const REFERENCE_TRENDED: u128 = 93_001_409_827_999_999_999_966_668_317_374_245_255;

/// Built-in weights used when no table is configured.
const REFERENCE_WEIGHTS: [(&str, u128); 11] = [
    ("B70891DB12BA08E1BB41258BF68BE061E6A202B9123F23946E4A78B54FDBB0B1", 10_327_380_790_000_000_000_000_004_088_401_736_465),
    ("4A1AD31E21E709E69E8EDC00D4462471E0D639BF6895193C8139F7852F50A031", 10_327_380_790_000_000_000_000_004_102_753_727_373),
    ("B51B53342D0294C6C9EC20F0856082922B5EF04FDDC4585B62BC19AFBCB35DEE", 14_213_198_050_000_000_000_000_003_992_592_021_377),
    ("269E432CCD554B7B948EE53029C88E063D153A0FDC565E6848528BB7FC1A7884", 1_000_001_000_000_000_000_000_000_000_000_000),
    ("62A9AE9CF8E91B480CB9D4107CBEE3C63918772D3FB8B687D2B20C0D9C59090F", 11_324_829_100_000_000_000_000_003_969_586_881_448),
    ("36AD606FDB432B72BD3E9F01C5B59E58537D3C39A1F4D874B8BA7A8184D39087", 501_100_000_000_000_000_000_000_000_000_000),
    ("620A942C3CCD8CFEABD538F19C6D99F90CD97929CA39CB35ACE42D8620194E37", 9_326_226_788_000_000_000_006_158_749_262_030_474),
    ("259A47DE59854777159F1781C7FD44DF0775671E502AB0CFDBCBC23718223117", 15_326_429_709_999_999_999_960_481_262_220_025_769),
    ("7118441BF691B8F79F51EF7D664E0A08FAD930268E6846BCF59CAAAFAF24BDB0", 9_327_380_790_000_000_000_000_004_023_915_260_534),
    ("D2BD39F17AA2640D4EC489EC95B76D4E2A5DC8B9ACAAC9B29DC9B9F4DAF7DC7E", 10_327_380_790_000_000_000_000_004_066_108_950_938),
    ("472A504C229DDC8AE5CF8BAFEC473046C1B0813A36E1FAE8E526EC2775E67430", 62_310_944_584_759_999_999_977_667_772_640_744_320),
];

/// Immutable weight table with precomputed thresholds.
#[derive(Clone, Debug)]
pub struct WeightTable {
    weights: HashMap<Account, Amount>,
    trended: Amount,
    quorum: Amount,
    vote_hint: Amount,
    principal: Amount,
}

impl WeightTable {
    /// Build a table from a trended weight and per-representative weights.
    ///
    /// Fails on a zero trended weight, an empty or duplicated representative
    /// list, or weights whose total does not fit in a u128.
    pub fn new(
        trended: Amount,
        weights: impl IntoIterator<Item = (Account, Amount)>,
    ) -> Result<Self, ConsensusError> {
        if trended.is_zero() {
            return Err(ConsensusError::InvalidWeights("trended weight is zero".into()));
        }
        let mut table = HashMap::new();
        let mut total = Amount::ZERO;
        for (account, weight) in weights {
            total = total.checked_add(weight).ok_or_else(|| {
                ConsensusError::InvalidWeights("total weight overflows u128".into())
            })?;
            if table.insert(account, weight).is_some() {
                return Err(ConsensusError::InvalidWeights(format!(
                    "duplicate representative {account}"
                )));
            }
        }
        if table.is_empty() {
            return Err(ConsensusError::InvalidWeights("no representatives".into()));
        }
        Ok(Self::from_parts(trended, table))
    }

    /// The eleven-representative table the node ships with.
    pub fn reference() -> Self {
        let weights = REFERENCE_WEIGHTS
            .iter()
            .filter_map(|(hex, raw)| {
                hex.parse::<PublicKey>()
                    .ok()
                    .map(|account| (account, Amount::new(*raw)))
            })
            .collect();
        Self::from_parts(Amount::new(REFERENCE_TRENDED), weights)
    }

    fn from_parts(trended: Amount, weights: HashMap<Account, Amount>) -> Self {
        Self {
            weights,
            trended,
            quorum: trended.scale(QUORUM_PERCENT, 100),
            vote_hint: Amount::new(trended.raw() / VOTE_HINT_DIVISOR),
            principal: Amount::new(trended.raw() / PRINCIPAL_DIVISOR),
        }
    }

    pub fn weight(&self, representative: &Account) -> Option<Amount> {
        self.weights.get(representative).copied()
    }

    pub fn contains(&self, representative: &Account) -> bool {
        self.weights.contains_key(representative)
    }

    /// Whether the representative may seed a new inactive election.
    pub fn is_principal(&self, representative: &Account) -> bool {
        self.weight(representative)
            .is_some_and(|weight| weight >= self.principal)
    }

    pub fn trended(&self) -> Amount {
        self.trended
    }

    pub fn quorum(&self) -> Amount {
        self.quorum
    }

    pub fn vote_hint(&self) -> Amount {
        self.vote_hint
    }

    pub fn principal_threshold(&self) -> Amount {
        self.principal
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Account, &Amount)> {
        self.weights.iter()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::reference()
    }
}
