// Helpers for building uncompressed patches in unit tests.

use crate::format::header::PatchHeader;
use crate::format::varint::write_size;

/// One operation: diff bytes, extra bytes, adjustment.
pub(crate) type Op<'a> = (&'a [u8], &'a [u8], i64);

pub(crate) fn op<'a>(diff: &'a [u8], extra: &'a [u8], adjust: i64) -> Op<'a> {
    (diff, extra, adjust)
}

/// Header plus an uncompressed operation stream.
pub(crate) fn raw_patch(to_size: u64, ops: &[Op<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    PatchHeader::new(to_size).encode(&mut out).unwrap();
    for (diff, extra, adjust) in ops {
        write_size(&mut out, diff.len() as i64).unwrap();
        out.extend_from_slice(diff);
        write_size(&mut out, extra.len() as i64).unwrap();
        out.extend_from_slice(extra);
        write_size(&mut out, *adjust).unwrap();
    }
    out
}
