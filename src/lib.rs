//! Two special-purpose byte codecs for sparse or run-heavy bitsets,
//! e.g. the column-presence bitmaps of a columnar store.
//!
//! ## Introduction
//! A presence bitmap mostly consists of long stretches of `0x00` or `0xFF` bytes.
//! Both codecs take a fixed-size chunk of such a bitmap and elide those runs,
//! copying every other byte verbatim:
//! - [`bitrat`]: a 4-level tree of presence masks (8-byte groups, 32-byte blocks,
//!   512-byte sections, 4k chunks). A byte is implicit whenever it equals the
//!   current *match byte*, which is extrapolated from the least significant bit
//!   of the last literal. Worst case: +1 byte per 32 input bytes.
//! - [`nibbler`]: a flat stream of run and literal segments, with length fields
//!   packed into half bytes where possible. Worst case: +4 bytes per chunk.
//!
//! Neither codec keeps state between calls. BitRat's continuation bit has to be
//! handed from one chunk to the next by the caller (see [`Continuation`]);
//! [`harness`] does that for whole bitsets.
//!
//! # Examples
//! ```rust
//! use bitmate::bitrat::{encode_full_chunk, max_encoded_len, FULL_CHUNK_SIZE};
//! use bitmate::Continuation;
//!
//! let chunk = vec![0xFF_u8; FULL_CHUNK_SIZE];
//! let mut output = vec![0_u8; max_encoded_len(FULL_CHUNK_SIZE)];
//! let enc = encode_full_chunk(Continuation::ExpectZero, &chunk, &mut output, 0).unwrap();
//! // section mask, pair mask, group mask and a single literal
//! assert_eq!(enc.mask, 0x80);
//! assert_eq!(&output[..enc.written], &[0x80, 0x80, 0x80, 0xFF]);
//! assert_eq!(enc.next, Continuation::ExpectOne);
//! ```
//!
//! ```rust
//! use bitmate::nibbler::NibblerEncoder;
//!
//! let mut enc = NibblerEncoder::new();
//! let encoded = enc.encode_to_vec(&[0_u8; 8192]).unwrap();
//! // 2 byte header (zero-run start, body length 2), then a 16-bit run length
//! assert_eq!(encoded, vec![0x00, 0x02, 0xDF, 0xF7]);
//! ```
//!
//! Sizing a whole bitset:
//! ```rust
//! use bitmate::harness::{bitrat_compressed_size, nibbler_compressed_size};
//! let bitset = vec![0_u8; 10_000];
//! // 3 chunks, each framed by a 2 byte length and the chunk mask
//! assert_eq!(bitrat_compressed_size(&bitset).unwrap(), 9);
//! // 2 chunks, each a header plus one long run
//! assert_eq!(nibbler_compressed_size(&bitset).unwrap(), 8);
//! ```
pub mod error;
pub mod bitrat;
pub mod nibbler;
pub mod harness;
pub mod chunker;
pub mod utils;
#[cfg(feature = "cli")]
pub mod cli;

pub use error::{CodecError, Result};
pub use harness::ChunkCodec;

/// Which byte value is assumed to continue the current run.
///
/// Runs are modelled at bit granularity: after a literal byte, the run is
/// assumed to continue with copies of that literal's least significant bit.
/// This is the only encoder state that crosses a chunk boundary, and it does
/// so explicitly: it's handed in by the caller and handed back in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Run of clear bits, i.e. `0x00` bytes
    #[default]
    ExpectZero,
    /// Run of set bits, i.e. `0xFF` bytes
    ExpectOne,
}

impl Continuation {
    /// Continuation implied by the last bit of the previous chunk
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Continuation::ExpectOne
        } else {
            Continuation::ExpectZero
        }
    }

    /// Continuation extrapolated from the least significant bit of `byte`
    #[inline]
    pub fn from_lsb(byte: u8) -> Self {
        Self::from_bit(byte & 1 != 0)
    }

    /// The byte that continues the run: `0x00` or `0xFF`
    #[inline]
    pub fn match_byte(self) -> u8 {
        match self {
            Continuation::ExpectZero => 0x00,
            Continuation::ExpectOne => 0xFF,
        }
    }

    /// true if the run consists of set bits
    pub fn is_set(self) -> bool {
        self == Continuation::ExpectOne
    }
}

impl From<bool> for Continuation {
    fn from(bit: bool) -> Self {
        Self::from_bit(bit)
    }
}
