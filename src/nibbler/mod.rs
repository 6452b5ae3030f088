//! Nibbler: run/literal segments with nibble-packed lengths.
//!
//! An encoded chunk is a 2 byte header followed by a body:
//!
//! ```text
//!  header: SSLL LLLL  LLLL LLLL    S: how the content starts, L: body length (14 bits, BE)
//!  body:   [run] (literals run)* [literals]
//! ```
//!
//! Start markers: `00` zero-run, `01` one-run (`0x40`), `10` literals (`0x80`).
//!
//! - **run**: a length field only. The run byte is implicit: for the leading run
//!   it's given by the start marker, otherwise it's the extension of the least
//!   significant bit of the preceding literal (`0x00` or `0xFF`). A leading run
//!   stores its length minus one (a single byte is enough to start with a run),
//!   every later run its length minus three (the detection threshold).
//! - **literals**: a length field (count minus one), followed by the bytes verbatim.
//!
//! Length fields are described in [`length`]; they share half bytes whenever they can.
//!
//! A run is only started after 3 bytes equal to the current match byte; shorter
//! repeats are cheaper left as literals. Once fewer than 3 bytes are left there's
//! no more looking for runs, they're appended to the current literals.
//!
//! Chunks are independent of each other, no state is carried over.
//!
//! # Example
//! ```rust
//! use bitmate::nibbler::NibblerEncoder;
//! let mut enc = NibblerEncoder::new();
//! // 0x55 continues with 1s: three 0xFF make a run
//! let encoded = enc.encode_to_vec(&[0x55, 0xFF, 0xFF, 0xFF, 0x10, 0x20, 0x30, 0x40]).unwrap();
//! assert_eq!(encoded, vec![0x80, 0x07, 0x00, 0x55, 0x30, 0x10, 0x20, 0x30, 0x40]);
//! ```
mod length;

use crate::error::{invalid_arg, CodecError, Result};
use crate::Continuation;
use length::{place_field, LengthField};
use log::trace;

/// Largest chunk a single call accepts, 8k
pub const MAX_CHUNK_SIZE: usize = 0x2000;

/// Even if nothing compresses, we only get 2 bytes for the header
/// and at most 2 bytes of length fields on top of the input
pub const MAX_OVERHEAD_BYTES: usize = 4;

/// Output buffer size that fits any encoded chunk
pub const MAX_OUTPUT_BUFFER: usize = MAX_CHUNK_SIZE + MAX_OVERHEAD_BYTES;

const HEADER_LEN: usize = 2;

/// Number of bytes equal to the match byte needed to start a run
const RUN_THRESHOLD: usize = 3;

/// Largest body length the header can carry
const MAX_BODY_LEN: usize = 0x3FFF;

/// What the body of a chunk starts with, stored in the top 2 bits of the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStart {
    /// run of `0x00` bytes
    ZeroRun,
    /// run of `0xFF` bytes
    OneRun,
    /// literal bytes
    Literal,
}

impl ContentStart {
    /// Marker bits, already in position for the first header byte
    pub fn marker(self) -> u8 {
        match self {
            ContentStart::ZeroRun => 0x00,
            ContentStart::OneRun => 0x40,
            ContentStart::Literal => 0x80,
        }
    }
}

/// Encoder for single chunks of at most [`MAX_CHUNK_SIZE`] bytes.
///
/// Keeps a scratch buffer around between calls, so one instance per thread;
/// nothing else survives a call.
#[derive(Debug, Default)]
pub struct NibblerEncoder {
    /// body of the chunk being encoded
    body: Vec<u8>,
    /// offset in `body` of a byte whose low nibble is still free
    nibble_slot: Option<usize>,
}

impl NibblerEncoder {
    ///
    pub fn new() -> Self {
        Self {
            body: Vec::with_capacity(MAX_OUTPUT_BUFFER),
            nibble_slot: None,
        }
    }

    /// Encodes `input[in_offset..in_offset + in_len]` into `output[out_offset..]`,
    /// returning the number of bytes written (header included).
    ///
    /// Fails with [`CodecError::InvalidArgument`] if `in_len` exceeds [`MAX_CHUNK_SIZE`],
    /// the input range lies outside `input`, or `output` can't take `in_len + 4` bytes
    /// after `out_offset`. Nothing is written to `output` unless encoding succeeds.
    ///
    /// An empty input encodes to a bare header.
    pub fn encode(
        &mut self,
        input: &[u8],
        in_offset: usize,
        in_len: usize,
        output: &mut [u8],
        out_offset: usize,
    ) -> Result<usize> {
        validate(input, in_offset, in_len, output, out_offset)?;

        let chunk = &input[in_offset..in_offset + in_len];
        let start = self.encode_body(chunk)?;

        let body_len = self.body.len();
        if body_len > MAX_BODY_LEN || HEADER_LEN + body_len > in_len + MAX_OVERHEAD_BYTES {
            return Err(CodecError::Internal(format!(
                "encoded body of {} bytes for {} input bytes",
                body_len, in_len
            )));
        }
        output[out_offset] = start.marker() | (body_len >> 8) as u8;
        output[out_offset + 1] = body_len as u8;
        output[out_offset + HEADER_LEN..out_offset + HEADER_LEN + body_len]
            .copy_from_slice(&self.body);
        Ok(HEADER_LEN + body_len)
    }

    /// Encodes a whole chunk into a fresh vector
    pub fn encode_to_vec(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut output = vec![0; chunk.len() + MAX_OVERHEAD_BYTES];
        let written = self.encode(chunk, 0, chunk.len(), &mut output, 0)?;
        output.truncate(written);
        Ok(output)
    }

    /// Fills `self.body`, returning what the content starts with
    fn encode_body(&mut self, chunk: &[u8]) -> Result<ContentStart> {
        self.body.clear();
        self.nibble_slot = None;

        let Some(&first) = chunk.first() else {
            return Ok(ContentStart::ZeroRun);
        };
        let start = match first {
            0x00 => ContentStart::ZeroRun,
            0xFF => ContentStart::OneRun,
            _ => ContentStart::Literal,
        };
        if start == ContentStart::Literal {
            self.encode_segments(chunk, 0)?;
            return Ok(start);
        }

        // a leading run can be a single byte; stores one less than its length
        let repeats = run_length(chunk, 1, first);
        self.write_run_length(repeats)?;
        let pos = 1 + repeats;
        if pos < chunk.len() {
            self.encode_segments(chunk, pos)?;
        }
        Ok(start)
    }

    /// Alternating literals and runs, starting with literals at `chunk[pos]`
    fn encode_segments(&mut self, chunk: &[u8], mut pos: usize) -> Result<()> {
        let end = chunk.len();
        loop {
            // literal length field goes in front of the literals once we know it
            let field_at = self.body.len();
            let literal_start = pos;
            let mut matched = Continuation::from_lsb(chunk[pos]).match_byte();
            self.body.push(chunk[pos]);
            pos += 1;

            loop {
                if pos + RUN_THRESHOLD > end {
                    // too close to the end to look for runs: all literals
                    self.body.extend_from_slice(&chunk[pos..]);
                    self.write_literal_length(field_at, end - literal_start)?;
                    return Ok(());
                }
                let window = &chunk[pos..pos + RUN_THRESHOLD];
                match window.iter().position(|&b| b != matched) {
                    None => break,
                    Some(i) => {
                        // bytes equal to the match byte before it are plain literals too
                        self.body.extend_from_slice(&window[..=i]);
                        matched = Continuation::from_lsb(window[i]).match_byte();
                        pos += i + 1;
                    }
                }
            }

            self.write_literal_length(field_at, pos - literal_start)?;
            pos += RUN_THRESHOLD;
            let repeats = run_length(chunk, pos, matched);
            trace!(
                "literals {}..{}, run of {} x {:#04x}",
                literal_start,
                pos - RUN_THRESHOLD,
                repeats + RUN_THRESHOLD,
                matched
            );
            self.write_run_length(repeats)?;
            pos += repeats;
            if pos == end {
                return Ok(());
            }
        }
    }

    /// Appends a run length field
    fn write_run_length(&mut self, value: usize) -> Result<()> {
        let field = LengthField::for_value(value)?;
        let at = self.body.len();
        self.nibble_slot = place_field(&mut self.body, self.nibble_slot, at, field);
        Ok(())
    }

    /// Puts the length field of `count` literals in front of them, at `field_at`
    fn write_literal_length(&mut self, field_at: usize, count: usize) -> Result<()> {
        // at least one literal, so count - 1
        let field = LengthField::for_value(count - 1)?;
        self.nibble_slot = place_field(&mut self.body, self.nibble_slot, field_at, field);
        Ok(())
    }
}

/// Number of bytes equal to `value` starting at `chunk[from]`
fn run_length(chunk: &[u8], from: usize, value: u8) -> usize {
    chunk[from..].iter().take_while(|&&b| b == value).count()
}

fn validate(
    input: &[u8],
    in_offset: usize,
    in_len: usize,
    output: &[u8],
    out_offset: usize,
) -> Result<()> {
    if in_len > MAX_CHUNK_SIZE {
        return Err(invalid_arg!(
            "invalid input length ({}), exceeds max chunk size of {}",
            in_len,
            MAX_CHUNK_SIZE
        ));
    }
    match in_offset.checked_add(in_len) {
        Some(end) if end <= input.len() => {}
        _ => {
            return Err(invalid_arg!(
                "invalid input offset ({}) and/or length ({}), for input buffer of size {}",
                in_offset,
                in_len,
                input.len()
            ))
        }
    }
    let max_size = in_len + MAX_OVERHEAD_BYTES;
    match out_offset.checked_add(max_size) {
        Some(end) if end <= output.len() => Ok(()),
        _ => Err(invalid_arg!(
            "invalid output offset ({}) for output buffer of size {}: max size of encoded content is {}",
            out_offset,
            output.len(),
            max_size
        )),
    }
}
