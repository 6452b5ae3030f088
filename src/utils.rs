//! Helpers for tests, benchmarks and reports: random bitsets, bit strings
//! and human readable sizes.
use bitvec::{
    order::{Lsb0, Msb0},
    vec::BitVec,
    view::BitView,
};
use itertools::Itertools;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// The bits of a bitset, MSB first
pub type Bits = BitVec<u8, Msb0>;

/// Generates a random bitset of `n_bytes` bytes made of alternating runs of
/// clear and set bits, starting with clear ones.
///
/// Run lengths (in bits) are uniform in `1..=2*mean_run`, so the bitset looks
/// like a column's presence bitmap. Same seed, same bitset.
pub fn random_run_bitset(n_bytes: usize, mean_run: usize, seed: u64) -> Vec<u8> {
    let n_bits = n_bytes * 8;
    let max_run = (2 * mean_run).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bits = Bits::with_capacity(n_bits);
    let mut value = false;
    while bits.len() < n_bits {
        let run = rng.gen_range(1..=max_run).min(n_bits - bits.len());
        bits.resize(bits.len() + run, value);
        value = !value;
    }
    bits.into_vec()
}

/// Generates `n_bytes` uniformly random bytes; the worst case for both codecs
pub fn random_noise_bitset(n_bytes: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_bytes).map(|_| rng.gen()).collect()
}

/// Bitset with the first `n_bits` bits set, padded with clear bits to a full byte.
///
/// Bits are numbered from the least significant one of each byte, like the
/// bitsets the presence fixtures are dumped from: the padded last byte of
/// 12 bits is `0x0F`, which ends in a set bit.
pub fn all_set_bitset(n_bits: usize) -> Vec<u8> {
    let mut bits = BitVec::<u8, Lsb0>::repeat(true, n_bits);
    bits.set_uninitialized(false);
    bits.into_vec()
}

/// just for debugging purpose: the bits of `bytes`, a space between bytes
pub fn bytes_to_bitstring(bytes: &[u8]) -> String {
    bytes
        .view_bits::<Msb0>()
        .chunks(8)
        .map(|byte| byte.iter().map(|x| if *x { "1" } else { "0" }).join(""))
        .join(" ")
}

/// Size for reports: bytes below 2k, kB with 2 decimals below 100k, else 1 decimal
pub fn format_length(length: usize) -> String {
    if length < 2048 {
        return format!("{}b", length);
    }
    let kb = length as f64 / 1024.0;
    if length < 100 * 1024 {
        format!("{:.2}kB", kb)
    } else {
        format!("{:.1}kB", kb)
    }
}

/// Share of set bits for reports; sparse columns also show the raw count
pub fn describe_density(set: usize, rows: usize) -> String {
    if rows == 0 {
        return "n/a".to_owned();
    }
    let pct = 100.0 * set as f64 / rows as f64;
    if pct < 1.0 {
        format!("{:.1}%({}b)", pct, set)
    } else {
        format!("{:.2}%", pct)
    }
}
