// Variable-length signed size encoding used by every operation field.
//
// Sign-and-magnitude, least-significant group first:
//   byte 0:   bit 7 = continue, bit 6 = sign, bits 5..0 = low 6 magnitude bits
//   byte n>0: bit 7 = continue, bits 6..0 = next 7 magnitude bits,
//             shifted by 6 + 7*(n-1)

use std::io::{self, Read, Write};

use crate::compress::reader::StreamingPatchReader;
use crate::error::{PatchError, Result};

/// Maximum encoded length of a 64-bit magnitude (6 + 7*9 >= 64).
pub const MAX_SIZE_LEN: usize = 10;

const CONTINUE: u8 = 0x80;
const SIGN: u8 = 0x40;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `value` into the front of `buf`. Returns the encoded length.
pub fn encode_size(value: i64, buf: &mut [u8; MAX_SIZE_LEN]) -> usize {
    let mut magnitude = value.unsigned_abs();
    let sign = if value < 0 { SIGN } else { 0 };

    buf[0] = sign | (magnitude & 0x3F) as u8;
    magnitude >>= 6;
    let mut len = 1;

    while magnitude > 0 {
        buf[len - 1] |= CONTINUE;
        buf[len] = (magnitude & 0x7F) as u8;
        magnitude >>= 7;
        len += 1;
    }
    len
}

/// Encode `value` and write it to a `Write` sink.
pub fn write_size<W: Write>(w: &mut W, value: i64) -> io::Result<()> {
    let mut buf = [0u8; MAX_SIZE_LEN];
    let len = encode_size(value, &mut buf);
    w.write_all(&buf[..len])
}

/// Encoded length of `value`.
pub fn sizeof_size(value: i64) -> usize {
    let bits = 64 - value.unsigned_abs().leading_zeros() as usize;
    if bits <= 6 { 1 } else { 1 + (bits - 6).div_ceil(7) }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Shared decoder. `next_byte` yields the following byte of the field.
///
/// Exhaustion before the first byte is passed through unchanged; after
/// it, the field is truncated. Fields longer than `MAX_SIZE_LEN` bytes
/// overflow, even when the extra groups are zero.
fn decode_with<F>(mut next_byte: F) -> Result<(i64, usize)>
where
    F: FnMut() -> Result<u8>,
{
    let first = next_byte()?;
    let negative = first & SIGN != 0;
    let mut magnitude = u64::from(first & 0x3F);
    let mut shift: u32 = 6;
    let mut consumed = 1;
    let mut byte = first;

    while byte & CONTINUE != 0 {
        if consumed == MAX_SIZE_LEN {
            return Err(PatchError::SizeOverflow);
        }
        byte = next_byte().map_err(|e| {
            if e.is_exhaustion() {
                PatchError::TruncatedSize
            } else {
                e
            }
        })?;
        consumed += 1;

        let group = u64::from(byte & 0x7F);
        if group != 0 {
            if shift >= 64 || group >> (64 - shift) != 0 {
                return Err(PatchError::SizeOverflow);
            }
            magnitude |= group << shift;
        }
        shift += 7;
    }

    let value = if negative {
        if magnitude > 1 << 63 {
            return Err(PatchError::SizeOverflow);
        }
        (magnitude as i64).wrapping_neg()
    } else {
        i64::try_from(magnitude).map_err(|_| PatchError::SizeOverflow)?
    };
    Ok((value, consumed))
}

/// Decode one size field from the decompressed payload.
///
/// Returns the value and the number of bytes the field occupied.
pub fn decode_size<R: Read>(reader: &mut StreamingPatchReader<R>) -> Result<(i64, usize)> {
    let mut byte = [0u8; 1];
    decode_with(|| {
        reader.decompress_into(&mut byte)?;
        Ok(byte[0])
    })
}

/// Decode one size field from a byte slice.
pub fn read_size(data: &[u8]) -> Result<(i64, usize)> {
    let mut bytes = data.iter().copied();
    decode_with(|| bytes.next().ok_or(PatchError::OutOfPatchData))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
