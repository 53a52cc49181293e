// detools sequential patch container format.
//
// # Modules
//
// - `header` — 16-byte uncompressed header (magic + big-endian to_size)
// - `varint` — Signed variable-length size fields (sign-and-magnitude,
//              least-significant group first)

pub mod header;
pub mod varint;

pub use header::{HEADER_LEN, MAGIC, PatchHeader, read_header};
pub use varint::{decode_size, encode_size, read_size, write_size};
