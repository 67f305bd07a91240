use proptest::prelude::*;

use lattice_ledger::{Block, OpenBlock, StateBlock, StoredBlock};
use lattice_messages::{BulkPull, FrontierReq};
use lattice_node::bootstrap::{serve_bulk_pull, serve_frontier_req};
use lattice_protocol::{
    BlockStreamDecoder, BlockStreamEvent, FrontierStreamDecoder, FrontierStreamEvent,
};
use lattice_store::{LedgerStore, MemoryStore};
use lattice_types::{Amount, BlockHash, PublicKey, Signature};

fn chain(store: &MemoryStore, account: u8, len: usize) -> Vec<BlockHash> {
    let open = Block::Open(OpenBlock {
        source: BlockHash::new([account ^ 0x55; 32]),
        representative: PublicKey([2; 32]),
        account: PublicKey([account; 32]),
        signature: Signature([3; 64]),
        work: 1,
    });
    let mut previous = open.hash();
    store.put(&previous, &StoredBlock::unlinked(open, 0)).unwrap();
    let mut hashes = vec![previous];
    for height in 2..=len as u64 {
        let block = Block::State(StateBlock {
            account: PublicKey([account; 32]),
            previous,
            representative: PublicKey([2; 32]),
            balance: Amount::new(height as u128),
            link: [0; 32],
            signature: Signature([4; 64]),
            work: height,
        });
        let hash = block.hash();
        let mut stored = StoredBlock::unlinked(block, 0);
        stored.sideband.height = height;
        store.put(&hash, &stored).unwrap();
        hashes.push(hash);
        previous = hash;
    }
    hashes
}

fn split(bytes: &[u8], step: usize) -> impl Iterator<Item = &[u8]> {
    bytes.chunks(step.max(1))
}

proptest! {
    /// A served chain decodes to the same blocks however the stream is cut,
    /// newest first, with exactly one terminator at the end.
    #[test]
    fn served_chain_decodes_under_any_chunking(len in 1usize..12, step in 1usize..300) {
        let store = MemoryStore::new();
        let hashes = chain(&store, 4, len);
        let request = BulkPull { start: hashes[len - 1], end: BlockHash::ZERO, count: None };
        let bytes = serve_bulk_pull(&store, &request).unwrap();

        let mut decoder = BlockStreamDecoder::new_block_stream();
        let mut events = Vec::new();
        for chunk in split(&bytes, step) {
            events.extend(decoder.feed(chunk).unwrap());
        }
        prop_assert_eq!(events.last(), Some(&BlockStreamEvent::End));
        let pulled: Vec<BlockHash> = events
            .iter()
            .filter_map(|e| match e {
                BlockStreamEvent::Block(b) => Some(b.hash()),
                BlockStreamEvent::End => None,
            })
            .collect();
        let expected: Vec<BlockHash> = hashes.into_iter().rev().collect();
        prop_assert_eq!(pulled, expected);
    }

    /// Never more blocks than the requested count.
    #[test]
    fn count_bounds_the_walk(len in 1usize..10, count in 1u64..12) {
        let store = MemoryStore::new();
        let hashes = chain(&store, 6, len);
        let request = BulkPull { start: hashes[len - 1], end: BlockHash::ZERO, count: Some(count) };
        let events = BlockStreamDecoder::new_block_stream()
            .feed(&serve_bulk_pull(&store, &request).unwrap())
            .unwrap();
        prop_assert_eq!(events.len() - 1, len.min(count as usize));
    }

    /// Every account's frontier is listed once, in account order.
    #[test]
    fn frontiers_round_trip(accounts in proptest::collection::btree_set(1u8..=255, 1..8), step in 1usize..200) {
        let store = MemoryStore::new();
        let mut expected = Vec::new();
        for &account in &accounts {
            let hashes = chain(&store, account, 1 + account as usize % 3);
            expected.push((PublicKey([account; 32]), *hashes.last().unwrap()));
        }
        let request = FrontierReq { start: PublicKey::ZERO, age: u32::MAX, count: 0, confirmed_only: false };
        let bytes = serve_frontier_req(&store, &request).unwrap();

        let mut decoder = FrontierStreamDecoder::new_frontier_stream();
        let mut got = Vec::new();
        let mut ended = false;
        for chunk in split(&bytes, step) {
            for event in decoder.feed(chunk).unwrap() {
                match event {
                    FrontierStreamEvent::Frontier { account, frontier } => got.push((account, frontier)),
                    FrontierStreamEvent::End => ended = true,
                }
            }
        }
        prop_assert!(ended);
        prop_assert_eq!(got, expected);
    }
}
