#![no_main]

use libfuzzer_sys::fuzz_target;

use lattice_protocol::{BlockStreamDecoder, FrontierStreamDecoder};

// Bootstrap responses come from untrusted peers. Feed arbitrary bytes one
// chunk of 7 at a time; neither stream decoder may panic.
fuzz_target!(|data: &[u8]| {
    let mut blocks = BlockStreamDecoder::new_block_stream();
    let mut frontiers = FrontierStreamDecoder::new_frontier_stream();
    for chunk in data.chunks(7) {
        let _ = blocks.feed(chunk);
        let _ = frontiers.feed(chunk);
    }
});
