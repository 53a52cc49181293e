//! Depatch: streaming decoder for detools sequential binary patches.
//!
//! A patch is a 16-byte header (`detools0` + big-endian output size)
//! followed by a compressed stream of `(diff, extra, adjustment)`
//! operations. The crate provides:
//! - The container format (`format`)
//! - Incremental payload decompression (`compress`)
//! - Patch application (`apply`) and inspection (`info`)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::io::Cursor;
//!
//! # fn load() -> (Vec<u8>, Vec<u8>) { (Vec::new(), Vec::new()) }
//! let (from, patch) = load();
//! let mut to = Vec::new();
//! depatch::apply_patch(&mut Cursor::new(&from), &mut &patch[..], &mut to).unwrap();
//!
//! let info = depatch::patch_info(&mut &patch[..]).unwrap();
//! println!("{info}");
//! ```

pub mod apply;
pub mod compress;
pub mod error;
pub mod format;
pub mod info;

#[cfg(test)]
mod testutil;

pub use apply::{PatchOptions, apply_patch, apply_patch_bytes, apply_patch_with};
pub use compress::{Compression, StreamingPatchReader};
pub use error::PatchError;
pub use info::{PatchInfo, patch_info, patch_info_with};
