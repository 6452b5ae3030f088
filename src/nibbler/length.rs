//! Length fields and their packing into half bytes.
//!
//! A length field is a sequence of 1, 2 or 4 nibbles, most significant first:
//!
//! | value | nibbles | bit pattern |
//! |---|---|---|
//! | 0..=7 | 1 | `0vvv` |
//! | 8..=71 | 2 | `10vv vvvv`, value - 8 |
//! | 72..=8191 | 4 | `11vv vvvv vvvv vvvv`, value - 8 |
//!
//! so a reader can tell the width from the first nibble alone.
//!
//! Nibbles are placed as follows: if an earlier field left its byte's low nibble
//! unused (the *nibble slot*), the first nibble fills it. The remaining nibbles
//! go into new bytes, two per byte; an odd last nibble takes the high half of a
//! new byte whose low half becomes the new slot.
use crate::error::{CodecError, Result};
use itertools::Itertools;

/// Largest value a length field can carry: a full 8k chunk, minus one
pub(crate) const MAX_LENGTH_VALUE: usize = 0x1FFF;

/// A length value in one of its three widths, already marker-prefixed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LengthField {
    /// 3-bit value in a single nibble
    Nibble(u8),
    /// `0x80` marker plus 6 bits
    Byte(u8),
    /// `0xC000` marker plus 13 bits
    Word(u16),
}

impl LengthField {
    pub(crate) fn for_value(value: usize) -> Result<Self> {
        match value {
            0..=7 => Ok(LengthField::Nibble(value as u8)),
            8..=71 => Ok(LengthField::Byte(0x80 | (value - 8) as u8)),
            72..=MAX_LENGTH_VALUE => Ok(LengthField::Word(0xC000 | (value - 8) as u16)),
            _ => Err(CodecError::Internal(format!(
                "trying to write length {}, max is {}",
                value, MAX_LENGTH_VALUE
            ))),
        }
    }

    /// The nibbles of the field, most significant first
    pub(crate) fn nibbles(self) -> impl Iterator<Item = u8> {
        let (code, count) = match self {
            LengthField::Nibble(v) => (v as u16, 1),
            LengthField::Byte(v) => (v as u16, 2),
            LengthField::Word(v) => (v, 4),
        };
        (0..count).rev().map(move |i| ((code >> (4 * i)) & 0xF) as u8)
    }
}

/// Writes `field` into `body`, new bytes going in at `at` (shifting whatever follows).
/// `slot` is the pending nibble slot, if any; it must lie before `at`.
///
/// Returns the new nibble slot.
pub(crate) fn place_field(
    body: &mut Vec<u8>,
    slot: Option<usize>,
    at: usize,
    field: LengthField,
) -> Option<usize> {
    let mut nibbles = field.nibbles();
    if let Some(slot) = slot {
        debug_assert!(slot < at);
        if let Some(first) = nibbles.next() {
            body[slot] |= first;
        }
    }

    let mut bytes = [0_u8; 2];
    let mut count = 0;
    let mut new_slot = None;
    for mut pair in &nibbles.chunks(2) {
        let hi = pair.next().unwrap_or(0);
        match pair.next() {
            Some(lo) => bytes[count] = (hi << 4) | lo,
            None => {
                bytes[count] = hi << 4;
                new_slot = Some(at + count);
            }
        }
        count += 1;
    }
    insert_bytes(body, at, &bytes[..count]);
    new_slot
}

/// Inserts `bytes` at `at`, moving everything after it back
pub(crate) fn insert_bytes(body: &mut Vec<u8>, at: usize, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    let old_len = body.len();
    body.resize(old_len + bytes.len(), 0);
    body.copy_within(at..old_len, at + bytes.len());
    body[at..at + bytes.len()].copy_from_slice(bytes);
}
