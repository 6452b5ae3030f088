//! Running the chunk encoders over whole bitsets.
//!
//! A bitset is cut into chunks of the codec's preferred size (the last one
//! possibly shorter), each chunk is encoded on its own and the encoded chunks
//! are concatenated.
//!
//! BitRat leaves the placement of its chunk mask to the caller, so here every
//! BitRat chunk is framed as
//! ```text
//! [written: u16, BE] [chunk mask] [body: `written` bytes]
//! ```
//! Nibbler chunks carry their own header and are written as is.
//!
//! # Example
//! ```rust
//! use bitmate::harness::{compressed_size, BitRatCodec, HarnessOptions};
//!
//! let bitset = vec![0xFF_u8; 8192];
//! // the second chunk continues the run of 1s from the first one
//! let mut codec = BitRatCodec::new(HarnessOptions::default());
//! assert_eq!(compressed_size(&mut codec, &bitset).unwrap(), 7 + 3);
//! ```
use crate::bitrat::{self, FULL_CHUNK_SIZE};
use crate::chunker::ReadChunks;
use crate::error::{CodecError, Result};
use crate::nibbler::{NibblerEncoder, MAX_CHUNK_SIZE, MAX_OUTPUT_BUFFER};
use crate::Continuation;
use log::debug;
use std::io::{Read, Write};

/// Bytes in front of every BitRat chunk body: 2 for its length, 1 for its mask
pub const BITRAT_FRAME_HEADER: usize = 3;

/// Knobs of the whole-bitset encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessOptions {
    /// Hand BitRat's continuation from one chunk to the next.
    /// If false, every chunk starts out expecting 0s.
    pub thread_continuation: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            thread_continuation: true,
        }
    }
}

/// A chunk encoder that can be driven over a whole bitset
pub trait ChunkCodec {
    /// Short name, for reports
    fn name(&self) -> &'static str;
    /// Size of the chunks the bitset gets cut into
    fn chunk_size(&self) -> usize;
    /// Output room needed for one encoded chunk of up to [`ChunkCodec::chunk_size`] bytes
    fn frame_capacity(&self) -> usize;
    /// Forget whatever was carried over from earlier chunks; called at the start of a bitset
    fn reset(&mut self);
    /// Encodes `chunk` into the start of `output`, returning the number of bytes written.
    /// `output` is at least [`ChunkCodec::frame_capacity`] long.
    fn encode_chunk(&mut self, chunk: &[u8], output: &mut [u8]) -> Result<usize>;
}

/// BitRat over 4k chunks, with length and mask framing
#[derive(Debug, Clone, Default)]
pub struct BitRatCodec {
    options: HarnessOptions,
    carry: Continuation,
}

impl BitRatCodec {
    pub fn new(options: HarnessOptions) -> Self {
        Self {
            options,
            carry: Continuation::default(),
        }
    }
}

impl ChunkCodec for BitRatCodec {
    fn name(&self) -> &'static str {
        "BitRat"
    }

    fn chunk_size(&self) -> usize {
        FULL_CHUNK_SIZE
    }

    fn frame_capacity(&self) -> usize {
        BITRAT_FRAME_HEADER + bitrat::max_encoded_len(FULL_CHUNK_SIZE)
    }

    fn reset(&mut self) {
        self.carry = Continuation::default();
    }

    fn encode_chunk(&mut self, chunk: &[u8], output: &mut [u8]) -> Result<usize> {
        let prev = if self.options.thread_continuation {
            self.carry
        } else {
            Continuation::ExpectZero
        };
        let enc = if chunk.len() == FULL_CHUNK_SIZE {
            bitrat::encode_full_chunk(prev, chunk, output, BITRAT_FRAME_HEADER)?
        } else {
            bitrat::encode_partial_chunk(prev, chunk, output, BITRAT_FRAME_HEADER)?
        };
        let written = u16::try_from(enc.written).map_err(|_| {
            CodecError::Internal(format!("chunk body of {} bytes can't be framed", enc.written))
        })?;
        output[..2].copy_from_slice(&written.to_be_bytes());
        output[2] = enc.mask;
        self.carry = enc.next;
        Ok(BITRAT_FRAME_HEADER + enc.written)
    }
}

/// Nibbler over 8k chunks; chunks are self-describing, so no framing
#[derive(Debug, Default)]
pub struct NibblerCodec {
    encoder: NibblerEncoder,
}

impl NibblerCodec {
    pub fn new() -> Self {
        Self {
            encoder: NibblerEncoder::new(),
        }
    }
}

impl ChunkCodec for NibblerCodec {
    fn name(&self) -> &'static str {
        "Nibbler"
    }

    fn chunk_size(&self) -> usize {
        MAX_CHUNK_SIZE
    }

    fn frame_capacity(&self) -> usize {
        MAX_OUTPUT_BUFFER
    }

    fn reset(&mut self) {}

    fn encode_chunk(&mut self, chunk: &[u8], output: &mut [u8]) -> Result<usize> {
        self.encoder.encode(chunk, 0, chunk.len(), output, 0)
    }
}

/// Sizes and counts of one encoded bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    pub chunks: usize,
    pub bytes_read: usize,
    pub bytes_written: usize,
}

impl StreamSummary {
    /// Encoded size relative to the input; 0 for an empty input
    pub fn ratio(&self) -> f64 {
        if self.bytes_read == 0 {
            0.0
        } else {
            self.bytes_written as f64 / self.bytes_read as f64
        }
    }
}

/// Encodes `bitset` chunk by chunk, handing each encoded chunk to `sink`
fn for_each_chunk<C, F>(codec: &mut C, bitset: &[u8], mut sink: F) -> Result<StreamSummary>
where
    C: ChunkCodec + ?Sized,
    F: FnMut(&[u8]) -> Result<()>,
{
    codec.reset();
    let mut output = vec![0_u8; codec.frame_capacity()];
    let mut summary = StreamSummary::default();
    for chunk in bitset.chunks(codec.chunk_size()) {
        let written = codec.encode_chunk(chunk, &mut output)?;
        debug!(
            "{}: chunk {} of {} bytes -> {} bytes",
            codec.name(),
            summary.chunks,
            chunk.len(),
            written
        );
        sink(&output[..written])?;
        summary.chunks += 1;
        summary.bytes_read += chunk.len();
        summary.bytes_written += written;
    }
    Ok(summary)
}

/// Total encoded size of `bitset`, framing included
pub fn compressed_size<C: ChunkCodec + ?Sized>(codec: &mut C, bitset: &[u8]) -> Result<usize> {
    for_each_chunk(codec, bitset, |_| Ok(())).map(|s| s.bytes_written)
}

/// The encoded chunks of `bitset`, concatenated
pub fn encode_stream<C: ChunkCodec + ?Sized>(codec: &mut C, bitset: &[u8]) -> Result<Vec<u8>> {
    let mut encoded = Vec::with_capacity(bitset.len() / 8);
    for_each_chunk(codec, bitset, |frame| {
        encoded.extend_from_slice(frame);
        Ok(())
    })?;
    Ok(encoded)
}

/// Like [`encode_stream`], reading the bitset from `reader` one chunk at a time
/// and writing the encoded chunks to `writer`
pub fn encode_reader<C, R, W>(codec: &mut C, reader: R, writer: &mut W) -> Result<StreamSummary>
where
    C: ChunkCodec + ?Sized,
    R: Read,
    W: Write,
{
    codec.reset();
    let mut output = vec![0_u8; codec.frame_capacity()];
    let mut written_total = 0;
    let mut chunks = reader.chunk_reader(codec.chunk_size());
    while let Some(chunk) = chunks.next_chunk()? {
        let written = codec.encode_chunk(chunk, &mut output)?;
        writer.write_all(&output[..written])?;
        written_total += written;
    }
    let summary = StreamSummary {
        chunks: chunks.chunks_read(),
        bytes_read: chunks.bytes_read(),
        bytes_written: written_total,
    };
    debug!(
        "{}: {} chunks, {} -> {} bytes",
        codec.name(),
        summary.chunks,
        summary.bytes_read,
        summary.bytes_written
    );
    Ok(summary)
}

/// BitRat size of `bitset` with the default options
pub fn bitrat_compressed_size(bitset: &[u8]) -> Result<usize> {
    compressed_size(&mut BitRatCodec::new(HarnessOptions::default()), bitset)
}

/// Nibbler size of `bitset`
pub fn nibbler_compressed_size(bitset: &[u8]) -> Result<usize> {
    compressed_size(&mut NibblerCodec::new(), bitset)
}
