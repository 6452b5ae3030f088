use bitmate::bitrat::{
    encode_full_chunk, encode_partial_chunk, fix_last, max_encoded_len, FULL_CHUNK_SIZE,
};
use bitmate::harness::{bitrat_compressed_size, nibbler_compressed_size};
use bitmate::nibbler::{NibblerEncoder, MAX_CHUNK_SIZE, MAX_OVERHEAD_BYTES};
use bitmate::utils::{random_noise_bitset, random_run_bitset};
use bitmate::Continuation;
use pretty_assertions::assert_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Geometric};

// bytes drawn as runs of 0x00 / 0xFF / noise with geometric lengths
fn create_geometric(n: usize, p: f64, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Geometric::new(p).unwrap();
    let mut data = Vec::with_capacity(n);
    while data.len() < n {
        let len = (dist.sample(&mut rng) as usize + 1).min(n - data.len());
        match rng.gen_range(0..3) {
            0 => data.extend(std::iter::repeat(0x00).take(len)),
            1 => data.extend(std::iter::repeat(0xFF).take(len)),
            _ => data.extend((0..len).map(|_| rng.gen::<u8>())),
        }
    }
    data
}

fn encode_rat(prev: Continuation, input: &[u8]) -> (u8, Vec<u8>, Continuation) {
    let mut output = vec![0_u8; max_encoded_len(input.len())];
    let enc = if input.len() == FULL_CHUNK_SIZE {
        encode_full_chunk(prev, input, &mut output, 0).unwrap()
    } else {
        encode_partial_chunk(prev, input, &mut output, 0).unwrap()
    };
    assert_eq!(enc.consumed, input.len());
    output.truncate(enc.written);
    (enc.mask, output, enc.next)
}

#[test]
fn test_bitrat_deterministic() {
    let data = create_geometric(FULL_CHUNK_SIZE, 0.05, 1);
    let a = encode_rat(Continuation::ExpectZero, &data);
    let b = encode_rat(Continuation::ExpectZero, &data);
    assert_eq!(a, b);
}

#[test]
fn test_bitrat_worst_case_bound() {
    let bound = FULL_CHUNK_SIZE + FULL_CHUNK_SIZE / 32 + FULL_CHUNK_SIZE / 64 + FULL_CHUNK_SIZE / 512;
    assert_eq!(bound, 4296);
    for seed in 0..20 {
        for data in [
            random_noise_bitset(FULL_CHUNK_SIZE, seed),
            create_geometric(FULL_CHUNK_SIZE, 0.2, seed),
            create_geometric(FULL_CHUNK_SIZE, 0.02, seed),
        ] {
            for prev in [Continuation::ExpectZero, Continuation::ExpectOne] {
                let (_, output, _) = encode_rat(prev, &data);
                assert!(output.len() <= bound);
            }
        }
    }
}

#[test]
fn test_bitrat_partial_bound() {
    let mut rng = StdRng::seed_from_u64(7);
    for len in (0..FULL_CHUNK_SIZE).step_by(37).chain([1, 7, 8, 9, 63, 64, 65, 511, 512, 4095]) {
        let data: Vec<u8> = if rng.gen_bool(0.5) {
            random_noise_bitset(len, len as u64)
        } else {
            create_geometric(len, 0.1, len as u64)
        };
        let (mask, output, _) = encode_rat(Continuation::ExpectZero, &data);
        assert!(output.len() <= max_encoded_len(len));
        assert_eq!(mask == 0, output.is_empty());
    }
}

#[test]
fn test_bitrat_uniform_chunks() {
    let zeros = vec![0_u8; FULL_CHUNK_SIZE];
    let ones = vec![0xFF_u8; FULL_CHUNK_SIZE];

    assert_eq!(encode_rat(Continuation::ExpectZero, &zeros), (0, vec![], Continuation::ExpectZero));
    assert_eq!(encode_rat(Continuation::ExpectOne, &ones), (0, vec![], Continuation::ExpectOne));
    assert_eq!(
        encode_rat(Continuation::ExpectOne, &zeros),
        (0x80, vec![0x80, 0x80, 0x80, 0x00], Continuation::ExpectZero)
    );

    // one transition in the middle
    let mut half = zeros.clone();
    half[FULL_CHUNK_SIZE / 2..].fill(0xFF);
    assert_eq!(
        encode_rat(Continuation::ExpectZero, &half),
        (0x08, vec![0x80, 0x80, 0x80, 0xFF], Continuation::ExpectOne)
    );
}

#[test]
fn test_bitrat_continuation_follows_last_byte() {
    for seed in 0..50 {
        let len = 1 + (seed as usize * 83) % FULL_CHUNK_SIZE;
        let data = create_geometric(len, 0.05, seed);
        for prev in [Continuation::ExpectZero, Continuation::ExpectOne] {
            let (_, _, next) = encode_rat(prev, &data);
            assert_eq!(next, Continuation::from_lsb(data[len - 1]));
        }
    }
}

#[test]
fn test_bitrat_partial_matches_full_at_tier_boundaries() {
    for len in [8, 64, 512] {
        for seed in 0..20 {
            let mut data = create_geometric(len, 0.1, seed);
            // the full chunk continues with 0s: make sure they're implicit
            data[len - 1] = 0x00;
            let mut full = data.clone();
            full.resize(FULL_CHUNK_SIZE, 0);

            let (partial_mask, partial_output, _) = encode_rat(Continuation::ExpectZero, &data);
            let (full_mask, full_output, _) = encode_rat(Continuation::ExpectZero, &full);
            assert_eq!(partial_mask, full_mask);
            assert_eq!(partial_output, full_output);
        }
    }
}

#[test]
fn test_fix_last_all_bytes() {
    for byte in 0..=255_u8 {
        for last_bits in 1..=8 {
            let mut buf = vec![0x5A, byte, 0xA5];
            fix_last(&mut buf, 1, last_bits).unwrap();
            let fixed = buf[1];
            assert_eq!(buf[0], 0x5A);
            assert_eq!(buf[2], 0xA5);

            // meaningful bits untouched
            let keep = !(0xFF_u8.checked_shr(last_bits as u32).unwrap_or(0));
            assert_eq!(fixed & keep, byte & keep);
            // the rest copies the last meaningful bit
            let last = (byte >> (8 - last_bits)) & 1 == 1;
            let rest = !keep;
            assert_eq!(fixed & rest, if last { rest } else { 0 });

            fix_last(&mut buf, 1, last_bits).unwrap();
            assert_eq!(buf[1], fixed);
        }
    }
}

#[test]
fn test_nibbler_bound() {
    let mut enc = NibblerEncoder::new();
    for seed in 0..30 {
        let len = [1, 2, 3, 8, 100, 4096, MAX_CHUNK_SIZE][seed as usize % 7];
        for data in [
            random_noise_bitset(len, seed),
            create_geometric(len, 0.3, seed),
            create_geometric(len, 0.01, seed),
        ] {
            let encoded = enc.encode_to_vec(&data).unwrap();
            assert!(encoded.len() <= len + MAX_OVERHEAD_BYTES);
            // header carries the body length
            let body_len = (((encoded[0] & 0x3F) as usize) << 8) | encoded[1] as usize;
            assert_eq!(body_len + 2, encoded.len());
            let marker = match data[0] {
                0x00 => 0x00,
                0xFF => 0x40,
                _ => 0x80,
            };
            assert_eq!(encoded[0] & 0xC0, marker);
        }
    }
}

#[test]
fn test_nibbler_deterministic() {
    let data = create_geometric(MAX_CHUNK_SIZE, 0.05, 99);
    let a = NibblerEncoder::new().encode_to_vec(&data).unwrap();
    let mut enc = NibblerEncoder::new();
    let _ = enc.encode_to_vec(&random_noise_bitset(500, 1)).unwrap();
    assert_eq!(a, enc.encode_to_vec(&data).unwrap());
}

#[test]
fn test_nibbler_run_threshold() {
    let mut enc = NibblerEncoder::new();
    // after 0x55 the match byte is 0xFF: two of them are literals, three a run
    let two = enc.encode_to_vec(&[0x55, 0xFF, 0xFF, 0x10, 0x20, 0x30]).unwrap();
    let three = enc.encode_to_vec(&[0x55, 0xFF, 0xFF, 0xFF, 0x10, 0x20, 0x30]).unwrap();
    assert_eq!(two, vec![0x80, 0x07, 0x50, 0x55, 0xFF, 0xFF, 0x10, 0x20, 0x30]);
    // literal count and run length share a byte, the run bytes are gone
    assert_eq!(three, vec![0x80, 0x06, 0x00, 0x55, 0x20, 0x10, 0x20, 0x30]);
}

#[test]
fn test_whole_bitsets() {
    let sparse = random_run_bitset(100_000, 5000, 3);
    let noise = random_noise_bitset(100_000, 3);

    let rat_sparse = bitrat_compressed_size(&sparse).unwrap();
    let nib_sparse = nibbler_compressed_size(&sparse).unwrap();
    assert!(rat_sparse < sparse.len() / 10);
    assert!(nib_sparse < sparse.len() / 10);

    // 25 chunks of 4296 plus frames
    assert!(bitrat_compressed_size(&noise).unwrap() <= 25 * (4296 + 3));
    // 13 chunks, at most 4 bytes each on top
    assert!(nibbler_compressed_size(&noise).unwrap() <= noise.len() + 13 * MAX_OVERHEAD_BYTES);
}
