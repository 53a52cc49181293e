// Patch application: rebuild the "to" data from the "from" data and a patch.
//
// After the header, the payload is a sequence of operations:
//   diff       size N, then N bytes added (mod 256) to the next N from bytes
//   extra      size N, then N bytes copied verbatim
//   adjustment signed offset applied to the from cursor (SEEK_CUR)
// repeated until the output reaches the declared size. The three streams
// advance in lockstep; each call owns its streams and engine.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, trace};

use crate::compress::engine::Compression;
use crate::compress::reader::{DEFAULT_CHUNK_SIZE, StreamingPatchReader};
use crate::error::{PatchError, Result};
use crate::format::header::PatchHeader;
use crate::format::varint::decode_size;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration shared by `apply_patch_with` and `patch_info_with`.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    /// Compression format of the payload.
    pub compression: Compression,
    /// Chunk size for compressed reads and for diff/extra copying.
    pub chunk_size: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PatchOptions {
    /// Options with the given payload compression and default chunking.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Shared operation checks
// ---------------------------------------------------------------------------

/// Validate a diff or extra size against the remaining output budget.
pub(crate) fn checked_len(
    size: i64,
    kind: &'static str,
    to_pos: u64,
    to_size: u64,
) -> Result<u64> {
    let len = u64::try_from(size).map_err(|_| PatchError::NegativeOperationSize { kind, size })?;
    match to_pos.checked_add(len) {
        Some(end) if end <= to_size => Ok(len),
        _ if kind == "diff" => Err(PatchError::OversizedDiff),
        _ => Err(PatchError::OversizedExtra),
    }
}

/// Final checks once the declared size has been produced.
pub(crate) fn finish_session<R: Read>(
    reader: &mut StreamingPatchReader<R>,
    to_pos: u64,
    to_size: u64,
) -> Result<()> {
    if to_pos != to_size {
        return Err(PatchError::SizeMismatch {
            expected: to_size,
            actual: to_pos,
        });
    }
    if !reader.eof()? {
        return Err(PatchError::UnconsumedPatch);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

/// Apply `patch` to `from`, writing the reconstructed data to `to`.
///
/// Uses the default payload compression. Returns the number of bytes
/// written. On error, whatever was already written stays in `to`.
pub fn apply_patch<F, P, W>(from: &mut F, patch: &mut P, to: &mut W) -> Result<u64>
where
    F: Read + Seek,
    P: Read,
    W: Write,
{
    apply_patch_with(from, patch, to, &PatchOptions::default())
}

/// Apply a patch with explicit options.
pub fn apply_patch_with<F, P, W>(
    from: &mut F,
    patch: &mut P,
    to: &mut W,
    opts: &PatchOptions,
) -> Result<u64>
where
    F: Read + Seek,
    P: Read,
    W: Write,
{
    let header = PatchHeader::decode(patch)?;
    let to_size = header.to_size;
    let chunk_size = opts.chunk_size.max(1);
    let mut reader = StreamingPatchReader::with_chunk_size(
        patch,
        opts.compression.decompressor()?,
        chunk_size,
    );
    debug!(
        "applying patch: to_size={to_size}, compression={}",
        reader.compression()
    );

    let mut patch_buf = vec![0u8; chunk_size];
    let mut from_buf = vec![0u8; chunk_size];
    let mut to_pos: u64 = 0;
    let mut operations: u64 = 0;

    while to_pos < to_size {
        // Diff data.
        let (size, _) = decode_size(&mut reader)?;
        let diff_len = checked_len(size, "diff", to_pos, to_size)?;
        let mut remaining = diff_len;
        while remaining > 0 {
            let n = remaining.min(chunk_size as u64) as usize;
            reader.decompress_into(&mut patch_buf[..n])?;
            read_from(from, &mut from_buf[..n], remaining)?;
            for (p, f) in patch_buf[..n].iter_mut().zip(&from_buf[..n]) {
                *p = p.wrapping_add(*f);
            }
            to.write_all(&patch_buf[..n])?;
            remaining -= n as u64;
        }
        to_pos += diff_len;

        // Extra data.
        let (size, _) = decode_size(&mut reader)?;
        let extra_len = checked_len(size, "extra", to_pos, to_size)?;
        let mut remaining = extra_len;
        while remaining > 0 {
            let n = remaining.min(chunk_size as u64) as usize;
            reader.decompress_into(&mut patch_buf[..n])?;
            to.write_all(&patch_buf[..n])?;
            remaining -= n as u64;
        }
        to_pos += extra_len;

        // Adjustment.
        let (offset, _) = decode_size(&mut reader)?;
        seek_from(from, offset)?;

        trace!("operation {operations}: diff={diff_len} extra={extra_len} adjust={offset}");
        operations += 1;
    }

    finish_session(&mut reader, to_pos, to_size)?;
    to.flush()?;
    debug!(
        "patch applied: {to_pos} bytes in {operations} operations, {} compressed bytes",
        reader.bytes_read()
    );
    Ok(to_pos)
}

/// Apply an in-memory patch to in-memory from data.
pub fn apply_patch_bytes(from: &[u8], patch: &[u8]) -> Result<Vec<u8>> {
    apply_patch_bytes_with(from, patch, &PatchOptions::default())
}

/// Apply an in-memory patch with explicit options.
pub fn apply_patch_bytes_with(from: &[u8], patch: &[u8], opts: &PatchOptions) -> Result<Vec<u8>> {
    let mut from = io::Cursor::new(from);
    let mut patch = patch;
    let mut to = Vec::new();
    apply_patch_with(&mut from, &mut patch, &mut to, opts)?;
    Ok(to)
}

/// Apply `data` split into from and patch halves, then check that
/// `patch_info_with` agrees with the outcome.
#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_apply(data: &[u8], opts: &PatchOptions) {
    let split = data.len() / 2;
    let (from, patch) = data.split_at(split);
    let applied = apply_patch_bytes_with(from, patch, opts);
    let inspected = crate::info::patch_info_with(&mut &patch[..], opts);
    if let Ok(out) = applied {
        let info = inspected.unwrap_or_else(|e| panic!("apply succeeded, info failed: {e}"));
        assert_eq!(info.to_size, out.len() as u64);
        assert_eq!(info.total_diff_size() + info.total_extra_size(), info.to_size);
    }
}

/// Fill `buf` from the from stream; `needed` is the diff remainder for the
/// error report.
fn read_from<F: Read>(from: &mut F, buf: &mut [u8], needed: u64) -> Result<()> {
    from.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => PatchError::FromExhausted { needed },
        _ => PatchError::Io(e),
    })
}

fn seek_from<F: Seek>(from: &mut F, offset: i64) -> Result<()> {
    if offset == 0 {
        return Ok(());
    }
    from.seek(SeekFrom::Current(offset)).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidInput => PatchError::InvalidSeek { offset },
        _ => PatchError::Io(e),
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
