#![no_main]

use libfuzzer_sys::fuzz_target;

use lattice_ledger::{Block, StoredBlock};

// Decode arbitrary bytes as a tagged block and as a stored record. Anything
// that decodes must re-encode to the bytes it was read from.
fuzz_target!(|data: &[u8]| {
    if let Ok(block) = Block::decode_tagged(data) {
        let encoded = block.to_tagged_bytes();
        assert_eq!(&data[..encoded.len()], &encoded[..]);
        let _ = block.hash();
    }

    let _ = StoredBlock::decode(data);
});
