// Streaming decompression of the patch payload.
//
// - `engine` — Decompressor trait and built-in engines (LZMA, Zlib, none)
// - `reader` — StreamingPatchReader: exact-size reads over an engine

pub mod engine;
pub mod reader;

pub use engine::{Compression, Decompressor, NoCompression, Progress};
pub use reader::{DEFAULT_CHUNK_SIZE, StreamingPatchReader};
