//! Bootstrap request bodies: bulk_pull, bulk_pull_account, frontier_req.

use lattice_types::{Account, Amount, BlockHash, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, MessageError};
use crate::header::Extensions;

pub const BULK_PULL_SIZE: usize = 64;
pub const BULK_PULL_COUNT_SIZE: usize = 8;
pub const BULK_PULL_ACCOUNT_SIZE: usize = 32 + 16 + 1;
pub const FRONTIER_REQ_SIZE: usize = 32 + 4 + 4;

/// Request the chain from `start` back to `end` (zero = to the open block).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPull {
    /// Block hash or account whose frontier to start from.
    pub start: BlockHash,
    pub end: BlockHash,
    /// Maximum number of blocks; travels only when the count-present bit is set.
    pub count: Option<u64>,
}

impl BulkPull {
    pub fn extensions(&self) -> Extensions {
        match self.count {
            Some(_) => Extensions(Extensions::BULK_PULL_COUNT_PRESENT),
            None => Extensions(0),
        }
    }

    pub fn body_size(extensions: Extensions) -> usize {
        if extensions.has(Extensions::BULK_PULL_COUNT_PRESENT) {
            BULK_PULL_SIZE + BULK_PULL_COUNT_SIZE
        } else {
            BULK_PULL_SIZE
        }
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, Self::body_size(extensions))?;
        let start = BlockHash::from_slice(body).unwrap_or_default();
        let end = BlockHash::from_slice(&body[32..]).unwrap_or_default();
        let count = if extensions.has(Extensions::BULK_PULL_COUNT_PRESENT) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&body[64..72]);
            Some(u64::from_le_bytes(raw))
        } else {
            None
        };
        Ok(Self { start, end, count })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.start.as_bytes());
        out.extend_from_slice(self.end.as_bytes());
        if let Some(count) = self.count {
            out.extend_from_slice(&count.to_le_bytes());
        }
    }
}

/// Request pending entries of one account above a minimum amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPullAccount {
    pub account: Account,
    pub minimum_amount: Amount,
    pub flags: u8,
}

impl BulkPullAccount {
    pub fn decode(body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, BULK_PULL_ACCOUNT_SIZE)?;
        let mut amount = [0u8; 16];
        amount.copy_from_slice(&body[32..48]);
        Ok(Self {
            account: PublicKey::from_slice(body).unwrap_or_default(),
            minimum_amount: Amount::from_be_bytes(amount),
            flags: body[48],
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.account.as_bytes());
        out.extend_from_slice(&self.minimum_amount.to_be_bytes());
        out.push(self.flags);
    }
}

/// Request `(account, frontier)` pairs starting at `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierReq {
    pub start: Account,
    /// Only accounts modified within this many seconds (`u32::MAX` = any).
    pub age: u32,
    pub count: u32,
    pub confirmed_only: bool,
}

impl FrontierReq {
    pub fn extensions(&self) -> Extensions {
        if self.confirmed_only {
            Extensions(Extensions::FRONTIER_CONFIRMED_ONLY)
        } else {
            Extensions(0)
        }
    }

    pub fn decode(extensions: Extensions, body: &[u8]) -> Result<Self, MessageError> {
        ensure_len(body, FRONTIER_REQ_SIZE)?;
        let mut age = [0u8; 4];
        age.copy_from_slice(&body[32..36]);
        let mut count = [0u8; 4];
        count.copy_from_slice(&body[36..40]);
        Ok(Self {
            start: PublicKey::from_slice(body).unwrap_or_default(),
            age: u32::from_le_bytes(age),
            count: u32::from_le_bytes(count),
            confirmed_only: extensions.has(Extensions::FRONTIER_CONFIRMED_ONLY),
        })
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.start.as_bytes());
        out.extend_from_slice(&self.age.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_pull_count_suffix() {
        let req = BulkPull {
            start: BlockHash::new([1; 32]),
            end: BlockHash::ZERO,
            count: Some(0x0102),
        };
        let ext = req.extensions();
        assert_eq!(BulkPull::body_size(ext), 72);
        let mut body = Vec::new();
        req.encode_into(&mut body);
        assert_eq!(&body[64..], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(BulkPull::decode(ext, &body), Ok(req));
    }

    #[test]
    fn bulk_pull_without_count() {
        let req = BulkPull {
            start: BlockHash::new([1; 32]),
            end: BlockHash::new([2; 32]),
            count: None,
        };
        let mut body = Vec::new();
        req.encode_into(&mut body);
        assert_eq!(body.len(), 64);
        assert_eq!(BulkPull::decode(Extensions(0), &body), Ok(req));
        assert!(BulkPull::decode(Extensions(1), &body).is_err());
    }

    #[test]
    fn frontier_req_layout() {
        let req = FrontierReq {
            start: PublicKey::ZERO,
            age: u32::MAX,
            count: 1000,
            confirmed_only: true,
        };
        let ext = req.extensions();
        assert_eq!(ext.0, 0x0002);
        let mut body = Vec::new();
        req.encode_into(&mut body);
        assert_eq!(body.len(), FRONTIER_REQ_SIZE);
        assert_eq!(&body[36..40], &1000u32.to_le_bytes());
        assert_eq!(FrontierReq::decode(ext, &body), Ok(req));
    }

    #[test]
    fn bulk_pull_account_layout() {
        let req = BulkPullAccount {
            account: PublicKey([3; 32]),
            minimum_amount: Amount::new(1),
            flags: 2,
        };
        let mut body = Vec::new();
        req.encode_into(&mut body);
        assert_eq!(body.len(), 49);
        assert_eq!(BulkPullAccount::decode(&body), Ok(req));
    }
}
