//! Feeding a bytestream to the encoders in fixed-size chunks.
use std::io::{self, Read};

/// Cuts a bytestream (R:Read) into chunks of `size` bytes, reusing one buffer.
///
/// Short reads are retried until the chunk is full, so only the last chunk
/// can be shorter than `size`: the encoders treat any shorter chunk as the
/// end of a bitset.
pub struct ChunkReader<R> {
    read: R,
    buf: Vec<u8>,
    chunks: usize,
    bytes: usize,
}

impl<R: Read> ChunkReader<R> {
    /// Create a new chunk reader, splitting the stream `read` into chunks of `size`
    pub fn new(read: R, size: usize) -> Self {
        Self {
            read,
            buf: vec![0; size],
            chunks: 0,
            bytes: 0,
        }
    }

    /// The next chunk, `None` once the stream is exhausted
    pub fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.read.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        self.chunks += 1;
        self.bytes += filled;
        Ok(Some(&self.buf[..filled]))
    }

    /// Chunks handed out so far
    pub fn chunks_read(&self) -> usize {
        self.chunks
    }

    /// Bytes handed out so far
    pub fn bytes_read(&self) -> usize {
        self.bytes
    }
}

/// Extending the `Read` trait with chunking,
/// enabling it for anything that implements `Read`
pub trait ReadChunks: Read {
    /// Chunks of `size` bytes, the last one possibly shorter
    fn chunk_reader(self, size: usize) -> ChunkReader<Self>
    where
        Self: Sized,
    {
        ChunkReader::new(self, size)
    }
}

impl<T: ?Sized> ReadChunks for T where T: Read {}
