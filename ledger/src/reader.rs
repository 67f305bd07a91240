//! Bounds-checked cursor over a byte slice.

use lattice_types::{Account, Amount, BlockHash, PublicKey, Signature};

use crate::error::CodecError;

pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or(CodecError::Truncated {
            needed: end,
            available: self.bytes.len(),
        })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn hash(&mut self) -> Result<BlockHash, CodecError> {
        self.take::<32>().map(BlockHash::new)
    }

    pub(crate) fn account(&mut self) -> Result<Account, CodecError> {
        self.take::<32>().map(PublicKey)
    }

    pub(crate) fn signature(&mut self) -> Result<Signature, CodecError> {
        self.take::<64>().map(Signature)
    }

    /// A 128-bit big-endian amount, read as its two 64-bit halves.
    pub(crate) fn amount(&mut self) -> Result<Amount, CodecError> {
        let high = self.u64_be()?;
        let low = self.u64_be()?;
        Ok(Amount::from_halves(high, low))
    }

    pub(crate) fn u64_be(&mut self) -> Result<u64, CodecError> {
        self.take::<8>().map(u64::from_be_bytes)
    }

    pub(crate) fn u64_le(&mut self) -> Result<u64, CodecError> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, CodecError> {
        self.take::<1>().map(|b| b[0])
    }
}
