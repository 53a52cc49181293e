// Patch container writer shared by the integration tests and benchmarks.
//
// Builds patches from explicit operations; `naive_patch` derives
// operations from a from/to pair by diffing fixed-size blocks against
// scattered from offsets, so adjustments move both ways.

#![allow(dead_code)]

use depatch::Compression;
use depatch::format::header::PatchHeader;
use depatch::format::varint::write_size;

/// One operation as it appears in the payload.
#[derive(Debug, Clone, Default)]
pub struct Op {
    pub diff: Vec<u8>,
    pub extra: Vec<u8>,
    pub adjustment: i64,
}

impl Op {
    pub fn new(diff: &[u8], extra: &[u8], adjustment: i64) -> Self {
        Self {
            diff: diff.to_vec(),
            extra: extra.to_vec(),
            adjustment,
        }
    }
}

/// Serialize operations into an uncompressed payload.
pub fn payload(ops: &[Op]) -> Vec<u8> {
    let mut out = Vec::new();
    for op in ops {
        write_size(&mut out, op.diff.len() as i64).unwrap();
        out.extend_from_slice(&op.diff);
        write_size(&mut out, op.extra.len() as i64).unwrap();
        out.extend_from_slice(&op.extra);
        write_size(&mut out, op.adjustment).unwrap();
    }
    out
}

/// Compress a payload in the given format.
pub fn compress(payload: &[u8], compression: &Compression) -> Vec<u8> {
    match compression {
        Compression::None => payload.to_vec(),
        // liblzma's "alone" encoder: unknown size plus end marker, as
        // detools writes it.
        #[cfg(feature = "lzma")]
        Compression::Lzma => {
            use std::io::Write;
            let opts = xz2::stream::LzmaOptions::new_preset(6).unwrap();
            let stream = xz2::stream::Stream::new_lzma_encoder(&opts).unwrap();
            let mut enc = xz2::write::XzEncoder::new_stream(Vec::new(), stream);
            enc.write_all(payload).unwrap();
            enc.finish().unwrap()
        }
        #[cfg(feature = "zlib")]
        Compression::Zlib => {
            use std::io::Write;
            let mut enc =
                flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(payload).unwrap();
            enc.finish().unwrap()
        }
        Compression::Custom(_) => panic!("no encoder for custom engines"),
    }
}

/// Header followed by an already-serialized payload.
pub fn container(to_size: u64, payload: &[u8], compression: &Compression) -> Vec<u8> {
    let mut out = Vec::new();
    PatchHeader::new(to_size).encode(&mut out).unwrap();
    out.extend_from_slice(&compress(payload, compression));
    out
}

/// Header plus the compressed operation stream.
pub fn write_patch(ops: &[Op], compression: &Compression) -> Vec<u8> {
    let to_size = ops
        .iter()
        .map(|op| (op.diff.len() + op.extra.len()) as u64)
        .sum();
    container(to_size, &payload(ops), compression)
}

/// Derive operations turning `from` into `to`.
///
/// Each `block`-sized piece of `to` is diffed against `from` at a
/// scattered offset; whatever the from data cannot cover becomes extra.
pub fn naive_ops(from: &[u8], to: &[u8], block: usize) -> Vec<Op> {
    let pieces: Vec<&[u8]> = to.chunks(block.max(1)).collect();
    let start = |i: usize| {
        if i == 0 || from.is_empty() {
            0
        } else {
            (i * 7919) % from.len()
        }
    };

    let mut ops = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        let pos = start(i);
        let diff_len = piece.len().min(from.len() - pos);
        let diff: Vec<u8> = piece[..diff_len]
            .iter()
            .zip(&from[pos..pos + diff_len])
            .map(|(t, f)| t.wrapping_sub(*f))
            .collect();
        let extra = piece[diff_len..].to_vec();
        let next = start(i + 1) as i64;
        ops.push(Op {
            diff,
            extra,
            adjustment: next - (pos + diff_len) as i64,
        });
    }
    ops
}

/// A complete patch turning `from` into `to`.
pub fn naive_patch(from: &[u8], to: &[u8], block: usize, compression: &Compression) -> Vec<u8> {
    let ops = naive_ops(from, to, block);
    container(to.len() as u64, &payload(&ops), compression)
}

/// Deterministic pseudo-random bytes (LCG).
pub fn generate_data(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    let mut data = Vec::with_capacity(size);
    for _ in 0..size {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        data.push((state >> 33) as u8);
    }
    data
}

/// Copy of `source` with every `stride`-th byte bumped.
pub fn mutate(source: &[u8], stride: usize) -> Vec<u8> {
    let mut out = source.to_vec();
    for i in (0..out.len()).step_by(stride.max(1)) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

/// Every payload compression compiled into this build.
pub fn all_compressions() -> Vec<Compression> {
    let mut all = vec![Compression::None];
    #[cfg(feature = "lzma")]
    all.push(Compression::Lzma);
    #[cfg(feature = "zlib")]
    all.push(Compression::Zlib);
    all
}
