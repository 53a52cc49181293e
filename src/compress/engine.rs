// Incremental decompression engines for the patch payload.
//
// The payload after the 16-byte header is one compressed stream. The
// decoder treats the compressor as a capability: feed compressed bytes,
// ask for up to N decompressed bytes, query whether more input is needed
// and whether the stream has ended. Built-in engines:
//   - LZMA "alone" streams (via xz2/liblzma, feature-gated `lzma`)
//   - Zlib streams (via flate2, feature-gated `zlib`)
//   - NoCompression (passthrough)
//   - Custom engines via the trait and `Compression::Custom`

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{PatchError, Result};

/// Bytes moved by a single `Decompressor::decompress` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Compressed bytes taken from the input slice.
    pub consumed: usize,
    /// Decompressed bytes written to the output slice.
    pub produced: usize,
}

// ---------------------------------------------------------------------------
// Decompressor trait
// ---------------------------------------------------------------------------

/// An incremental decompressor driven by `StreamingPatchReader`.
///
/// One instance decodes exactly one patch payload; engines are never
/// shared between sessions.
///
/// # Implementing a custom engine
///
/// ```no_run
/// use depatch::compress::engine::{Decompressor, Progress};
/// use depatch::PatchError;
///
/// struct Reverse { done: bool }
///
/// impl Decompressor for Reverse {
///     fn name(&self) -> &'static str { "reverse" }
///     fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress, PatchError> {
///         let n = input.len().min(output.len());
///         output[..n].copy_from_slice(&input[..n]);
///         Ok(Progress { consumed: n, produced: n })
///     }
///     fn needs_input(&self) -> bool { !self.done }
///     fn is_finished(&self) -> bool { self.done }
///     fn finish_input(&mut self) -> Result<(), PatchError> { self.done = true; Ok(()) }
/// }
/// ```
pub trait Decompressor {
    /// Short engine name, reported by `patch_info`.
    fn name(&self) -> &'static str;

    /// Feed `input` (possibly empty, to flush buffered output) and write up
    /// to `output.len()` decompressed bytes.
    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress>;

    /// Whether the engine cannot produce more output until it gets more
    /// compressed input.
    fn needs_input(&self) -> bool;

    /// Whether the engine has reported that no more output will ever be
    /// produced.
    fn is_finished(&self) -> bool;

    /// Signal that the compressed source is exhausted.
    ///
    /// Engines that can only detect the end of their stream once all input
    /// has been seen finalize here. Default: no-op.
    fn finish_input(&mut self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LZMA engine
// ---------------------------------------------------------------------------

/// LZMA "alone" (`.lzma`) stream decoder.
///
/// Backed by liblzma through xz2. Output is produced as soon as the range
/// decoder has the input for it, and decoding stops at the end-of-stream
/// marker, leaving any trailing input unconsumed.
#[cfg(feature = "lzma")]
pub struct LzmaDecompressor {
    inner: xz2::stream::Stream,
    needs_input: bool,
    finished: bool,
}

#[cfg(feature = "lzma")]
impl LzmaDecompressor {
    pub fn new() -> Result<Self> {
        let inner = xz2::stream::Stream::new_lzma_decoder(u64::MAX).map_err(lzma_error)?;
        Ok(Self {
            inner,
            needs_input: true,
            finished: false,
        })
    }
}

#[cfg(feature = "lzma")]
fn lzma_error(e: xz2::stream::Error) -> PatchError {
    PatchError::Corrupt(format!("LZMA: {e}"))
}

#[cfg(feature = "lzma")]
impl Decompressor for LzmaDecompressor {
    fn name(&self) -> &'static str {
        "lzma"
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        use xz2::stream::{Action, Status};

        if self.finished {
            return Ok(Progress::default());
        }

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();
        let status = self
            .inner
            .process(input, output, Action::Run)
            .map_err(lzma_error)?;
        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;

        match status {
            Status::StreamEnd => {
                self.finished = true;
                self.needs_input = false;
            }
            // MemNeeded is liblzma's "no progress possible" (LZMA_BUF_ERROR).
            Status::Ok | Status::GetCheck | Status::MemNeeded => {
                self.needs_input = consumed == input.len() && produced < output.len();
            }
        }

        Ok(Progress { consumed, produced })
    }

    fn needs_input(&self) -> bool {
        self.needs_input
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

// ---------------------------------------------------------------------------
// Zlib engine
// ---------------------------------------------------------------------------

/// Zlib stream decoder (deflate with zlib header and Adler-32 trailer).
#[cfg(feature = "zlib")]
pub struct ZlibDecompressor {
    inner: flate2::Decompress,
    needs_input: bool,
    finished: bool,
}

#[cfg(feature = "zlib")]
impl ZlibDecompressor {
    pub fn new() -> Self {
        Self {
            inner: flate2::Decompress::new(true),
            needs_input: true,
            finished: false,
        }
    }
}

#[cfg(feature = "zlib")]
impl Default for ZlibDecompressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "zlib")]
impl Decompressor for ZlibDecompressor {
    fn name(&self) -> &'static str {
        "zlib"
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        use flate2::{FlushDecompress, Status};

        if self.finished {
            return Ok(Progress::default());
        }

        let before_in = self.inner.total_in();
        let before_out = self.inner.total_out();
        let status = self
            .inner
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| PatchError::Corrupt(format!("zlib: {e}")))?;
        let consumed = (self.inner.total_in() - before_in) as usize;
        let produced = (self.inner.total_out() - before_out) as usize;

        match status {
            Status::StreamEnd => {
                self.finished = true;
                self.needs_input = false;
            }
            Status::Ok | Status::BufError => {
                // A full output buffer may leave data inside the inflater;
                // the next call with empty input flushes it.
                self.needs_input = consumed == input.len() && produced < output.len();
            }
        }

        Ok(Progress { consumed, produced })
    }

    fn needs_input(&self) -> bool {
        self.needs_input
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

// ---------------------------------------------------------------------------
// No-compression engine
// ---------------------------------------------------------------------------

/// Passthrough engine: the payload is the raw operation stream.
///
/// The end of the stream is the end of the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression {
    finished: bool,
}

impl Decompressor for NoCompression {
    fn name(&self) -> &'static str {
        "none"
    }

    fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok(Progress {
            consumed: n,
            produced: n,
        })
    }

    fn needs_input(&self) -> bool {
        !self.finished
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn finish_input(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine selection
// ---------------------------------------------------------------------------

/// Factory for caller-provided engines.
pub type DecompressorFactory = Arc<dyn Fn() -> Box<dyn Decompressor> + Send + Sync>;

/// The compression format of the patch payload.
#[derive(Clone)]
pub enum Compression {
    /// LZMA "alone" stream, the format `detools` writes by default.
    #[cfg(feature = "lzma")]
    Lzma,
    /// Zlib stream.
    #[cfg(feature = "zlib")]
    Zlib,
    /// Uncompressed payload.
    None,
    /// A custom engine; the factory is called once per decode session.
    Custom(DecompressorFactory),
}

impl Default for Compression {
    fn default() -> Self {
        #[cfg(feature = "lzma")]
        {
            Self::Lzma
        }
        #[cfg(not(feature = "lzma"))]
        {
            Self::None
        }
    }
}

impl fmt::Debug for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "lzma")]
            Self::Lzma => write!(f, "Lzma"),
            #[cfg(feature = "zlib")]
            Self::Zlib => write!(f, "Zlib"),
            Self::None => write!(f, "None"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Compression {
    /// Build a fresh engine for one decode session.
    pub fn decompressor(&self) -> Result<Box<dyn Decompressor>> {
        Ok(match self {
            #[cfg(feature = "lzma")]
            Self::Lzma => Box::new(LzmaDecompressor::new()?),
            #[cfg(feature = "zlib")]
            Self::Zlib => Box::new(ZlibDecompressor::new()),
            Self::None => Box::new(NoCompression::default()),
            Self::Custom(factory) => factory(),
        })
    }

    /// Wrap a custom engine constructor.
    pub fn custom<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Decompressor> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(factory))
    }
}

impl FromStr for Compression {
    type Err = PatchError;

    /// Parse a compression name as `detools` spells it.
    fn from_str(name: &str) -> Result<Self> {
        match name {
            #[cfg(feature = "lzma")]
            "lzma" => Ok(Self::Lzma),

            #[cfg(not(feature = "lzma"))]
            "lzma" => Err(PatchError::Unsupported(
                "LZMA payloads require the 'lzma' feature".into(),
            )),

            #[cfg(feature = "zlib")]
            "zlib" => Ok(Self::Zlib),

            #[cfg(not(feature = "zlib"))]
            "zlib" => Err(PatchError::Unsupported(
                "zlib payloads require the 'zlib' feature".into(),
            )),

            "none" => Ok(Self::None),
            other => Err(PatchError::Unsupported(format!(
                "compression '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
