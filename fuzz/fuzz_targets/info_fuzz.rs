#![no_main]
use depatch::{Compression, PatchOptions, patch_info_with};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the engine and the reader chunk size.
    let compression = if data[0] & 1 == 0 {
        Compression::None
    } else {
        Compression::default()
    };
    let opts = PatchOptions {
        compression,
        chunk_size: 1 + (data[0] >> 1) as usize,
    };
    let _ = patch_info_with(&mut &data[1..], &opts);
});
