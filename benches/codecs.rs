#![allow(missing_docs)]
use bitmate::bitrat::{encode_full_chunk, max_encoded_len, FULL_CHUNK_SIZE};
use bitmate::harness::{bitrat_compressed_size, nibbler_compressed_size};
use bitmate::nibbler::{NibblerEncoder, MAX_CHUNK_SIZE, MAX_OUTPUT_BUFFER};
use bitmate::utils::{random_noise_bitset, random_run_bitset};
use bitmate::Continuation;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn single_chunk(c: &mut Criterion) {
    let seed = 23;
    for (desc, data) in [
        ("runs", random_run_bitset(MAX_CHUNK_SIZE, 200, seed)),
        ("noise", random_noise_bitset(MAX_CHUNK_SIZE, seed)),
    ] {
        let mut output = vec![0_u8; max_encoded_len(FULL_CHUNK_SIZE)];
        c.bench_function(&format!("BitRat: full chunk - {}", desc), |b| {
            b.iter(|| {
                encode_full_chunk(
                    Continuation::ExpectZero,
                    black_box(&data[..FULL_CHUNK_SIZE]),
                    &mut output,
                    0,
                )
            })
        });

        let mut enc = NibblerEncoder::new();
        let mut output = vec![0_u8; MAX_OUTPUT_BUFFER];
        c.bench_function(&format!("Nibbler: 8k chunk - {}", desc), |b| {
            b.iter(|| enc.encode(black_box(&data), 0, data.len(), &mut output, 0))
        });
    }
}

fn whole_bitset(c: &mut Criterion) {
    let n = 1_000_000;
    // runs of 250 bytes on average
    let data = random_run_bitset(n, 2000, 42);

    c.bench_function(&format!("BitRat: bitset - {} bytes", n), |b| {
        b.iter(|| bitrat_compressed_size(black_box(&data)))
    });
    c.bench_function(&format!("Nibbler: bitset - {} bytes", n), |b| {
        b.iter(|| nibbler_compressed_size(black_box(&data)))
    });
}

criterion_group!(benches, single_chunk, whole_bitset);
criterion_main!(benches);
