// Patch container header.
//
//   offset 0..8   magic b"detools0"
//   offset 8..16  to_size, signed 64-bit big-endian
//
// The header is stored uncompressed in front of the compressed payload.

use std::io::{self, Read, Write};

use crate::error::{PatchError, Result};

pub const MAGIC: [u8; 8] = *b"detools0";

pub const HEADER_LEN: usize = 16;

/// Parsed patch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHeader {
    /// Byte count of the fully reconstructed output.
    pub to_size: u64,
}

impl PatchHeader {
    pub fn new(to_size: u64) -> Self {
        Self { to_size }
    }

    /// Write the header.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let to_size = i64::try_from(self.to_size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "to size exceeds i64"))?;
        w.write_all(&MAGIC)?;
        w.write_all(&to_size.to_be_bytes())
    }

    /// Read and validate exactly `HEADER_LEN` raw bytes.
    pub fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        let len = read_full(r, &mut buf)?;
        if len < HEADER_LEN {
            return Err(PatchError::TruncatedHeader { len });
        }

        if buf[..8] != MAGIC {
            return Err(PatchError::BadMagic {
                found: String::from_utf8_lossy(&buf[..8]).into_owned(),
            });
        }

        let mut size = [0u8; 8];
        size.copy_from_slice(&buf[8..]);
        let to_size = i64::from_be_bytes(size);
        if to_size < 0 {
            return Err(PatchError::NegativeSize(to_size));
        }

        Ok(Self {
            to_size: to_size as u64,
        })
    }
}

/// Read the header and return the declared output size.
pub fn read_header<R: Read>(r: &mut R) -> Result<u64> {
    PatchHeader::decode(r).map(|h| h.to_size)
}

/// Like `read_exact`, but reports how many bytes were available.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
