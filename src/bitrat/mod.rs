//! BitRat: run elimination via a hierarchy of presence masks.
//!
//! A full chunk of 4096 bytes is encoded as a 4-level tree:
//!
//! | unit | size | mask per unit |
//! |---|---|---|
//! | group | 8 bytes | 8 bits, one per byte |
//! | block | 32 bytes (4 groups) | 4 bits, one per group |
//! | pair | 64 bytes (2 blocks) | 8 bits: `hi_block << 4 \| lo_block` |
//! | section | 512 bytes (8 pairs) | 8 bits, one per pair |
//! | chunk | 4096 bytes (8 sections) | 8 bits, one per section |
//!
//! Within a group, a byte equal to the current match byte (`0x00` or `0xFF`) is
//! implicit; any other byte is copied and the match byte becomes the
//! extension of that literal's least significant bit. Every unit that produced
//! output is prefixed by its (non-zero) mask; units without output leave no
//! trace besides a clear bit in their parent's mask. The chunk mask itself is
//! returned, not written: placing it is up to the caller.
//!
//! All masks are MSB first, i.e. `0x80` is the first unit.
//!
//! ## Escapes
//! A block whose structured output would exceed 32 bytes is instead written as
//! a `0x00` flag followed by its 32 raw bytes, and reports mask `0xF`.
//! A group mask is never zero when present, so the flag is unambiguous.
//! This only applies to blocks: every other mask value is in use.
//!
//! ## Partial chunks
//! [`encode_partial_chunk`] handles 0..4095 bytes: full sections as above,
//! then the remainder in 64-byte pairs, then 8-byte groups, then a final
//! shorter group. Below 64 bytes there are no escapes. A chunk that ends exactly
//! on a tier boundary encodes exactly like the same bytes inside a full chunk.
//!
//! # Example
//! ```rust
//! use bitmate::bitrat::{encode_partial_chunk, max_encoded_len};
//! use bitmate::Continuation;
//!
//! let input = [0x00, 0x00, 0x0F, 0xFF];
//! let mut output = vec![0; max_encoded_len(input.len())];
//! let enc = encode_partial_chunk(Continuation::ExpectZero, &input, &mut output, 0).unwrap();
//! assert_eq!(enc.mask, 0x80);
//! assert_eq!(&output[..enc.written], &[0x80, 0x80, 0x20, 0x0F]);
//! ```
mod partial;

pub use partial::encode_partial_chunk;

use crate::error::{invalid_arg, Result};
use crate::Continuation;
use bitvec::{order::Msb0, view::BitView};
use log::trace;

/// Size of a full chunk, 4k
pub const FULL_CHUNK_SIZE: usize = 0x1000;
/// Size of a section, the second level of the tree
pub const SECTION_SIZE: usize = 512;
/// A pair of blocks sharing one mask byte
pub(crate) const PAIR_SIZE: usize = 64;
/// Unit of the escape rule
pub(crate) const BLOCK_SIZE: usize = 32;
/// Smallest unit with its own mask byte
pub(crate) const GROUP_SIZE: usize = 8;

/// Marks an escaped block, takes the place of its first group mask
const ESCAPE_FLAG: u8 = 0x00;

/// Output capacity needed to encode `len` input bytes, whatever their content.
///
/// Escapes cap a full chunk at `len + len/32 + len/64 + len/512`; below 64 bytes
/// there's one mask byte per group plus two prefixes. `len/8 + 8` covers both,
/// and leaves room for a block's structured output before it gets escaped.
pub const fn max_encoded_len(len: usize) -> usize {
    len + (len >> 3) + 8
}

/// Result of encoding one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatEncoded {
    /// One bit per section (MSB first) that produced output; not written to the output.
    /// Zero means the whole chunk was implicit.
    pub mask: u8,
    /// Bytes written to the output, starting at the given offset
    pub written: usize,
    /// Input bytes consumed
    pub consumed: usize,
    /// What the next chunk should be encoded with
    pub next: Continuation,
}

/// Cursors threaded through the levels of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RatState {
    /// next unread input byte
    pub(crate) input: usize,
    /// next unwritten output byte
    pub(crate) output: usize,
    /// byte value continuing the current run
    pub(crate) matched: u8,
}

impl RatState {
    pub(crate) fn new(prev: Continuation, output: usize) -> Self {
        Self {
            input: 0,
            output,
            matched: prev.match_byte(),
        }
    }

    #[inline]
    fn at_output(self, output: usize) -> Self {
        Self { output, ..self }
    }

    pub(crate) fn finish(self, mask: u8, start: usize) -> RatEncoded {
        RatEncoded {
            mask,
            written: self.output - start,
            consumed: self.input,
            next: Continuation::from_lsb(self.matched),
        }
    }
}

/// Reserves one byte for the mask of the unit encoded by `encode`.
/// If the unit produced no output the slot is given back, otherwise the mask goes in.
#[inline]
pub(crate) fn prefixed<F>(output: &mut [u8], state: RatState, encode: F) -> (u8, RatState)
where
    F: FnOnce(&mut [u8], RatState) -> (u8, RatState),
{
    let slot = state.output;
    let (mask, next) = encode(output, state.at_output(slot + 1));
    if mask == 0 {
        // nothing written, so the match byte hasn't moved either
        (0, next.at_output(slot))
    } else {
        output[slot] = mask;
        (mask, next)
    }
}

/// Lowest level: `len` (at most 8) bytes, one mask bit per byte.
/// Only the literals are written; the mask prefix is up to the caller.
#[inline]
pub(crate) fn encode_group(
    input: &[u8],
    output: &mut [u8],
    mut state: RatState,
    len: usize,
) -> (u8, RatState) {
    let mut mask = 0_u8;
    for (i, &b) in input[state.input..state.input + len].iter().enumerate() {
        if b != state.matched {
            output[state.output] = b;
            state.output += 1;
            state.matched = Continuation::from_lsb(b).match_byte();
            mask |= 0x80 >> i;
        }
    }
    state.input += len;
    (mask, state)
}

/// 32 bytes as four prefixed groups, returning a 4-bit mask.
/// Falls back to the escape encoding if that doesn't beat 32 bytes.
pub(crate) fn encode_block(input: &[u8], output: &mut [u8], state: RatState) -> (u8, RatState) {
    let start = state;
    let mut state = state;
    let mut mask = 0_u8;
    for _ in 0..BLOCK_SIZE / GROUP_SIZE {
        let (group_mask, next) = prefixed(output, state, |out, st| {
            encode_group(input, out, st, GROUP_SIZE)
        });
        mask = (mask << 1) | u8::from(group_mask != 0);
        state = next;
    }

    if mask != 0 && state.output - start.output > BLOCK_SIZE {
        trace!(
            "escaping block at input {} ({} bytes structured)",
            start.input,
            state.output - start.output
        );
        let raw = &input[start.input..start.input + BLOCK_SIZE];
        output[start.output] = ESCAPE_FLAG;
        output[start.output + 1..start.output + 1 + BLOCK_SIZE].copy_from_slice(raw);
        // the match byte from the structured pass is still right: it follows the last byte
        state.output = start.output + 1 + BLOCK_SIZE;
        mask = 0x0F;
    }
    (mask, state)
}

/// 64 bytes: two blocks whose masks share one byte
pub(crate) fn encode_pair(input: &[u8], output: &mut [u8], state: RatState) -> (u8, RatState) {
    let (hi, state) = encode_block(input, output, state);
    let (lo, state) = encode_block(input, output, state);
    ((hi << 4) | lo, state)
}

/// 512 bytes as eight prefixed pairs
pub(crate) fn encode_section(input: &[u8], output: &mut [u8], state: RatState) -> (u8, RatState) {
    let mut state = state;
    let mut mask = 0_u8;
    for _ in 0..SECTION_SIZE / PAIR_SIZE {
        let (pair_mask, next) = prefixed(output, state, |out, st| encode_pair(input, out, st));
        mask = (mask << 1) | u8::from(pair_mask != 0);
        state = next;
    }
    (mask, state)
}

/// Encodes a full 4k chunk into `output[out_offset..]`.
///
/// `prev` seeds the match byte, usually the `next` of the previous chunk
/// (or [`Continuation::ExpectZero`] at the start of a bitset).
/// `output` needs room for [`max_encoded_len`]`(4096)` bytes after `out_offset`.
///
/// The returned mask has one bit per 512-byte section that produced output;
/// it is typically stored as the first byte of the chunk, or alone if it's zero.
pub fn encode_full_chunk(
    prev: Continuation,
    input: &[u8],
    output: &mut [u8],
    out_offset: usize,
) -> Result<RatEncoded> {
    if input.len() != FULL_CHUNK_SIZE {
        return Err(invalid_arg!(
            "invalid chunk size {} for full output: should be {}",
            input.len(),
            FULL_CHUNK_SIZE
        ));
    }
    check_output(output, out_offset, FULL_CHUNK_SIZE)?;

    let mut state = RatState::new(prev, out_offset);
    let mut mask = 0_u8;
    for _ in 0..FULL_CHUNK_SIZE / SECTION_SIZE {
        let (section_mask, next) = prefixed(output, state, |out, st| encode_section(input, out, st));
        mask = (mask << 1) | u8::from(section_mask != 0);
        state = next;
    }
    Ok(state.finish(mask, out_offset))
}

/// Rejects output buffers that can't take a worst case encoding of `len` bytes
pub(crate) fn check_output(output: &[u8], out_offset: usize, len: usize) -> Result<()> {
    let needed = max_encoded_len(len);
    match out_offset.checked_add(needed) {
        Some(end) if end <= output.len() => Ok(()),
        _ => Err(invalid_arg!(
            "invalid output offset ({}) for buffer of size {}: encoding {} bytes needs up to {}",
            out_offset,
            output.len(),
            len,
            needed
        )),
    }
}

/// Changes the unused low bits of `buf[offset]` to match the last meaningful one,
/// so trailing garbage can't break the final run.
///
/// Only the top `last_bits` bits (1..=8) of the byte are meaningful.
/// Idempotent, and leaves every other byte alone.
pub fn fix_last(buf: &mut [u8], offset: usize, last_bits: usize) -> Result<()> {
    if !(1..=8).contains(&last_bits) {
        return Err(invalid_arg!("invalid bit count {}: should be within 1..=8", last_bits));
    }
    let len = buf.len();
    let byte = buf
        .get_mut(offset)
        .ok_or_else(|| invalid_arg!("invalid offset {} for buffer of size {}", offset, len))?;
    let bits = byte.view_bits_mut::<Msb0>();
    let last = bits[last_bits - 1];
    bits[last_bits..].fill(last);
    Ok(())
}
