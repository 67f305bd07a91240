use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lattice_crypto::Ed25519Verifier;
use lattice_messages::{Keepalive, Message};
use lattice_protocol::{encode_message, FrontierStreamDecoder, MessageDecoder};
use lattice_types::NetworkId;

fn keepalive_stream(count: usize) -> Vec<u8> {
    let constants = NetworkId::Beta.constants();
    let frame = encode_message(&constants, &Message::Keepalive(Keepalive::default()));
    frame.iter().copied().cycle().take(frame.len() * count).collect()
}

fn bench_message_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_decoder");
    let stream = keepalive_stream(1000);

    for chunk_size in [1usize, 64, 1500, 65536] {
        group.bench_with_input(
            BenchmarkId::new("keepalive_x1000", chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut decoder = MessageDecoder::for_network(
                        NetworkId::Beta.constants(),
                        Arc::new(Ed25519Verifier),
                    );
                    let mut count = 0usize;
                    for chunk in stream.chunks(chunk_size) {
                        decoder.feed_with(black_box(chunk), |_| count += 1).ok();
                    }
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

fn bench_frontier_stream(c: &mut Criterion) {
    let mut stream: Vec<u8> = (0..10_000u32)
        .flat_map(|i| {
            let mut record = [0xabu8; 64];
            record[..4].copy_from_slice(&i.to_be_bytes());
            record
        })
        .collect();
    stream.extend_from_slice(&[0u8; 64]);

    c.bench_function("frontier_stream_10k", |b| {
        b.iter(|| {
            let mut decoder = FrontierStreamDecoder::new_frontier_stream();
            let mut count = 0usize;
            for chunk in stream.chunks(1500) {
                decoder.feed_with(black_box(chunk), |_| count += 1).ok();
            }
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_message_decoder, bench_frontier_stream);
criterion_main!(benches);
