//! Encoding of the last, shorter chunk of a bitset.
//!
//! Same tree as a full chunk, cut short: each tier handles as many of its own
//! units as fit and passes the remainder one tier down, with one mask bit per
//! unit (including the shorter remainder unit) in MSB first order.
use super::{
    check_output, encode_full_chunk, encode_group, encode_pair, encode_section, prefixed,
    RatEncoded, RatState, FULL_CHUNK_SIZE, GROUP_SIZE, PAIR_SIZE, SECTION_SIZE,
};
use crate::error::{invalid_arg, Result};
use crate::Continuation;

/// Encodes a chunk shorter than 4k into `output[out_offset..]`.
///
/// A chunk of exactly [`FULL_CHUNK_SIZE`] bytes is handed to [`encode_full_chunk`];
/// anything longer is rejected. An empty chunk writes nothing and returns
/// mask 0 with `prev` passed through.
///
/// `output` needs room for [`super::max_encoded_len`]`(input.len())` bytes after `out_offset`.
pub fn encode_partial_chunk(
    prev: Continuation,
    input: &[u8],
    output: &mut [u8],
    out_offset: usize,
) -> Result<RatEncoded> {
    let len = input.len();
    if len >= FULL_CHUNK_SIZE {
        if len == FULL_CHUNK_SIZE {
            return encode_full_chunk(prev, input, output, out_offset);
        }
        return Err(invalid_arg!(
            "invalid chunk size {} for partial output: should be less than {}",
            len,
            FULL_CHUNK_SIZE
        ));
    }
    check_output(output, out_offset, len)?;

    let mut state = RatState::new(prev, out_offset);
    let mut mask = 0_u8;
    let mut marker = 0x80_u8;

    let mut left = len;
    while left >= SECTION_SIZE {
        let (section_mask, next) = prefixed(output, state, |out, st| encode_section(input, out, st));
        if section_mask != 0 {
            mask |= marker;
        }
        state = next;
        marker >>= 1;
        left -= SECTION_SIZE;
    }
    // no more full sections, but may have a remainder
    if left > 0 {
        let (section_mask, next) = prefixed(output, state, |out, st| {
            encode_partial_section(input, out, st, left)
        });
        if section_mask != 0 {
            mask |= marker;
        }
        state = next;
    }
    Ok(state.finish(mask, out_offset))
}

/// Fewer than 512 bytes: pairs of blocks (with the block escape), then the tail
fn encode_partial_section(
    input: &[u8],
    output: &mut [u8],
    state: RatState,
    len: usize,
) -> (u8, RatState) {
    debug_assert!(len < SECTION_SIZE);
    let mut state = state;
    let mut mask = 0_u8;
    let mut marker = 0x80_u8;

    let mut left = len;
    while left >= PAIR_SIZE {
        let (pair_mask, next) = prefixed(output, state, |out, st| encode_pair(input, out, st));
        if pair_mask != 0 {
            mask |= marker;
        }
        state = next;
        marker >>= 1;
        left -= PAIR_SIZE;
    }
    if left > 0 {
        let (tail_mask, next) = prefixed(output, state, |out, st| encode_tail(input, out, st, left));
        if tail_mask != 0 {
            mask |= marker;
        }
        state = next;
    }
    (mask, state)
}

/// Fewer than 64 bytes: plain groups of 8, then whatever is left as one short group.
/// No escapes down here, they're not worth it.
fn encode_tail(input: &[u8], output: &mut [u8], state: RatState, len: usize) -> (u8, RatState) {
    debug_assert!(len < PAIR_SIZE);
    let mut state = state;
    let mut mask = 0_u8;
    let mut marker = 0x80_u8;

    let mut left = len;
    while left > 0 {
        let group_len = left.min(GROUP_SIZE);
        let (group_mask, next) = prefixed(output, state, |out, st| {
            encode_group(input, out, st, group_len)
        });
        if group_mask != 0 {
            mask |= marker;
        }
        state = next;
        marker >>= 1;
        left -= group_len;
    }
    (mask, state)
}
