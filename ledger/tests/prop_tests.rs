use proptest::prelude::*;

use lattice_ledger::{Block, BlockType, StoredBlock};

proptest! {
    /// Arbitrary bytes never panic the stored-record decoder.
    #[test]
    fn stored_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
        let _ = StoredBlock::decode(&bytes);
    }

    /// A stored record shorter than its type requires is always rejected.
    #[test]
    fn short_stored_records_rejected(tag in 2u8..=6, fill in any::<u8>(), cut in 1usize..200) {
        let t = BlockType::from_u8(tag).unwrap();
        let full = 1 + t.body_size() + t.sideband_size();
        let len = full.saturating_sub(cut).max(1);
        let mut bytes = vec![fill; len];
        bytes[0] = tag;
        prop_assert!(StoredBlock::decode(&bytes).is_err());
    }

    /// Any body of the right size decodes, and re-encodes to the same bytes.
    #[test]
    fn any_full_body_reencodes(tag in 2u8..=6, seed in any::<u8>()) {
        let t = BlockType::from_u8(tag).unwrap();
        let body: Vec<u8> = (0..t.body_size()).map(|i| seed.wrapping_add(i as u8)).collect();
        let block = Block::decode(t, &body).unwrap();
        prop_assert_eq!(block.to_bytes(), body);
    }
}
