// Streaming reader over the compressed patch payload.
//
// StreamingPatchReader turns "feed bytes / request bytes" engine calls into
// exact reads: every request returns precisely the number of bytes asked
// for, pulling compressed chunks from the source only when the engine
// needs them. Memory use is bounded by the chunk size plus whatever the
// engine buffers internally.

use std::io::{self, Read};

use super::engine::{Compression, Decompressor, Progress};
use crate::error::{PatchError, Result};

/// Default size of compressed reads from the patch source.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Decompression cursor over a patch payload.
pub struct StreamingPatchReader<R: Read> {
    source: R,
    engine: Box<dyn Decompressor>,
    /// Compressed bytes read from `source` but not yet fed to the engine.
    input: Vec<u8>,
    input_pos: usize,
    input_len: usize,
    /// Set once `source` has returned zero bytes.
    source_done: bool,
    /// A decompressed byte pulled out by `eof()` and owed to the caller.
    peeked: Option<u8>,
    bytes_read: u64,
}

impl<R: Read> StreamingPatchReader<R> {
    /// Create a reader with the given engine.
    pub fn new(source: R, engine: Box<dyn Decompressor>) -> Self {
        Self::with_chunk_size(source, engine, DEFAULT_CHUNK_SIZE)
    }

    /// Create a reader with a fresh engine for `compression`.
    pub fn with_compression(source: R, compression: &Compression) -> Result<Self> {
        Ok(Self::new(source, compression.decompressor()?))
    }

    /// Create a reader that pulls `chunk_size` compressed bytes at a time.
    pub fn with_chunk_size(source: R, engine: Box<dyn Decompressor>, chunk_size: usize) -> Self {
        Self {
            source,
            engine,
            input: vec![0; chunk_size.max(1)],
            input_pos: 0,
            input_len: 0,
            source_done: false,
            peeked: None,
            bytes_read: 0,
        }
    }

    /// Name of the decompression engine.
    pub fn compression(&self) -> &'static str {
        self.engine.name()
    }

    /// Compressed bytes pulled from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Decompress exactly `n` bytes.
    pub fn decompress(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; n];
        self.decompress_into(&mut out)?;
        Ok(out)
    }

    /// Fill `out` completely with decompressed bytes.
    ///
    /// Fails with `EarlyEnd` if the engine reaches the end of its stream
    /// first, or `OutOfPatchData` if the source runs dry while the engine
    /// still wants input.
    pub fn decompress_into(&mut self, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        if let (Some(byte), Some(first)) = (self.peeked, out.first_mut()) {
            *first = byte;
            self.peeked = None;
            filled = 1;
        }

        while filled < out.len() {
            if self.engine.is_finished() {
                return Err(PatchError::EarlyEnd);
            }
            if self.input_pos == self.input_len && self.engine.needs_input() {
                if !self.refill()? {
                    self.engine.finish_input()?;
                    if self.engine.needs_input() {
                        return Err(PatchError::OutOfPatchData);
                    }
                }
                continue;
            }
            let progress = self.feed(&mut out[filled..])?;
            filled += progress.produced;
        }
        Ok(())
    }

    /// Whether the payload is fully consumed.
    ///
    /// True once the engine has reported the end of its stream, no
    /// compressed input is left over, and the source yields no more bytes.
    /// A decompressed byte found while checking is kept for the next
    /// `decompress` call.
    pub fn eof(&mut self) -> Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        loop {
            if self.engine.is_finished() {
                return Ok(self.input_pos == self.input_len && !self.refill()?);
            }
            if self.input_pos == self.input_len && self.engine.needs_input() {
                if !self.refill()? {
                    self.engine.finish_input()?;
                    if self.engine.needs_input() {
                        return Ok(false);
                    }
                }
                continue;
            }
            // Input past a finished stream is never fed, so any error here
            // comes from the stream itself.
            let mut lookahead = [0u8; 1];
            if self.feed(&mut lookahead)?.produced > 0 {
                self.peeked = Some(lookahead[0]);
                return Ok(false);
            }
        }
    }

    /// Hand buffered input (possibly none) to the engine.
    fn feed(&mut self, out: &mut [u8]) -> Result<Progress> {
        let input = &self.input[self.input_pos..self.input_len];
        let progress = self.engine.decompress(input, out)?;
        self.input_pos += progress.consumed;
        if progress.consumed == 0
            && progress.produced == 0
            && !input.is_empty()
            && !self.engine.needs_input()
            && !self.engine.is_finished()
        {
            return Err(PatchError::Corrupt(format!(
                "{} engine made no progress",
                self.engine.name()
            )));
        }
        Ok(progress)
    }

    /// Read the next compressed chunk. Returns false once the source is
    /// exhausted.
    fn refill(&mut self) -> Result<bool> {
        if self.source_done {
            return Ok(false);
        }
        let n = loop {
            match self.source.read(&mut self.input) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            self.source_done = true;
            return Ok(false);
        }
        self.input_pos = 0;
        self.input_len = n;
        self.bytes_read += n as u64;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
