// Patch introspection.
//
// patch_info walks a patch exactly like apply_patch, with the same checks,
// but discards diff/extra bytes and records the operation layout instead.

use std::fmt;
use std::io::Read;

use log::debug;

use crate::apply::{PatchOptions, checked_len, finish_session};
use crate::compress::reader::StreamingPatchReader;
use crate::error::Result;
use crate::format::header::{HEADER_LEN, PatchHeader};
use crate::format::varint::decode_size;

/// Structural statistics of a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchInfo {
    /// Bytes read from the patch stream, header included.
    pub patch_size: u64,
    /// Name of the payload compression engine.
    pub compression: &'static str,
    /// Declared output size.
    pub to_size: u64,
    pub diff_sizes: Vec<u64>,
    pub extra_sizes: Vec<u64>,
    pub adjustment_sizes: Vec<i64>,
    /// Bytes spent on size fields across the whole payload.
    pub number_of_size_bytes: u64,
}

impl PatchInfo {
    pub fn number_of_operations(&self) -> usize {
        self.diff_sizes.len()
    }

    pub fn total_diff_size(&self) -> u64 {
        self.diff_sizes.iter().sum()
    }

    pub fn total_extra_size(&self) -> u64 {
        self.extra_sizes.iter().sum()
    }

    pub fn mean_diff_size(&self) -> Option<u64> {
        mean(&self.diff_sizes)
    }

    pub fn median_diff_size(&self) -> Option<u64> {
        median(&self.diff_sizes)
    }

    pub fn mean_extra_size(&self) -> Option<u64> {
        mean(&self.extra_sizes)
    }

    pub fn median_extra_size(&self) -> Option<u64> {
        median(&self.extra_sizes)
    }

    /// Number of operations that move the from cursor.
    pub fn number_of_adjustments(&self) -> usize {
        self.adjustment_sizes.iter().filter(|&&a| a != 0).count()
    }

    /// Patch size as a percentage of the output size.
    pub fn patch_to_ratio(&self) -> Option<f64> {
        (self.to_size > 0).then(|| 100.0 * self.patch_size as f64 / self.to_size as f64)
    }

    /// Render the statistics as a JSON value.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "patch_size": self.patch_size,
            "compression": self.compression,
            "to_size": self.to_size,
            "number_of_operations": self.number_of_operations(),
            "diff_sizes": self.diff_sizes,
            "extra_sizes": self.extra_sizes,
            "adjustment_sizes": self.adjustment_sizes,
            "number_of_size_bytes": self.number_of_size_bytes,
            "total_diff_size": self.total_diff_size(),
            "total_extra_size": self.total_extra_size(),
        })
    }
}

fn mean(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<u64>() / values.len() as u64)
}

fn median(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}

fn or_dash(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for PatchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Type:                 sequential")?;
        writeln!(f, "Patch size:           {} bytes", self.patch_size)?;
        writeln!(f, "To size:              {} bytes", self.to_size)?;
        match self.patch_to_ratio() {
            Some(ratio) => writeln!(f, "Patch/to ratio:       {ratio:.1} %")?,
            None => writeln!(f, "Patch/to ratio:       -")?,
        }
        writeln!(f, "Compression:          {}", self.compression)?;
        writeln!(f)?;
        writeln!(f, "Number of diffs:      {}", self.number_of_operations())?;
        writeln!(f, "Total diff size:      {} bytes", self.total_diff_size())?;
        writeln!(f, "Average diff size:    {}", or_dash(self.mean_diff_size()))?;
        writeln!(f, "Median diff size:     {}", or_dash(self.median_diff_size()))?;
        writeln!(f)?;
        writeln!(f, "Number of extras:     {}", self.extra_sizes.len())?;
        writeln!(f, "Total extra size:     {} bytes", self.total_extra_size())?;
        writeln!(f, "Average extra size:   {}", or_dash(self.mean_extra_size()))?;
        writeln!(f, "Median extra size:    {}", or_dash(self.median_extra_size()))?;
        writeln!(f)?;
        writeln!(f, "Number of adjustments: {}", self.number_of_adjustments())?;
        write!(f, "Number of size bytes: {}", self.number_of_size_bytes)
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Inspect a patch with the default payload compression.
pub fn patch_info<P: Read>(patch: &mut P) -> Result<PatchInfo> {
    patch_info_with(patch, &PatchOptions::default())
}

/// Inspect a patch with explicit options.
///
/// Fails exactly where `apply_patch_with` would fail on the same patch,
/// apart from errors caused by the from data itself.
pub fn patch_info_with<P: Read>(patch: &mut P, opts: &PatchOptions) -> Result<PatchInfo> {
    let header = PatchHeader::decode(patch)?;
    let to_size = header.to_size;
    let chunk_size = opts.chunk_size.max(1);
    let mut reader = StreamingPatchReader::with_chunk_size(
        patch,
        opts.compression.decompressor()?,
        chunk_size,
    );

    let mut info = PatchInfo {
        compression: reader.compression(),
        to_size,
        ..Default::default()
    };
    let mut scratch = vec![0u8; chunk_size];
    let mut to_pos: u64 = 0;

    while to_pos < to_size {
        let (size, n) = decode_size(&mut reader)?;
        info.number_of_size_bytes += n as u64;
        let diff_len = checked_len(size, "diff", to_pos, to_size)?;
        skip(&mut reader, &mut scratch, diff_len)?;
        to_pos += diff_len;
        info.diff_sizes.push(diff_len);

        let (size, n) = decode_size(&mut reader)?;
        info.number_of_size_bytes += n as u64;
        let extra_len = checked_len(size, "extra", to_pos, to_size)?;
        skip(&mut reader, &mut scratch, extra_len)?;
        to_pos += extra_len;
        info.extra_sizes.push(extra_len);

        let (offset, n) = decode_size(&mut reader)?;
        info.number_of_size_bytes += n as u64;
        info.adjustment_sizes.push(offset);
    }

    finish_session(&mut reader, to_pos, to_size)?;
    info.patch_size = HEADER_LEN as u64 + reader.bytes_read();
    debug!(
        "patch inspected: {} operations, {} patch bytes",
        info.number_of_operations(),
        info.patch_size
    );
    Ok(info)
}

/// Decompress and drop `len` bytes.
fn skip<R: Read>(reader: &mut StreamingPatchReader<R>, scratch: &mut [u8], len: u64) -> Result<()> {
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(scratch.len() as u64) as usize;
        reader.decompress_into(&mut scratch[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
