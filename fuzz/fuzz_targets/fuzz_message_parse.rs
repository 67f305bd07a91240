#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;

use lattice_nullables::NullVerifier;
use lattice_protocol::MessageDecoder;
use lattice_types::NetworkId;

// Feed arbitrary bytes to a connection decoder, split at a point taken from
// the input. Decoding must never panic, and once it fails it stays failed.
fuzz_target!(|data: &[u8]| {
    let Some((&cut, rest)) = data.split_first() else {
        return;
    };
    let split = (cut as usize).min(rest.len());
    let mut decoder = MessageDecoder::for_network(
        NetworkId::Live.constants(),
        Arc::new(NullVerifier::accept_all()),
    );

    let first = decoder.feed(&rest[..split]);
    let second = decoder.feed(&rest[split..]);
    if first.is_err() {
        assert!(second.is_err(), "decoder recovered after a framing error");
    }
});
