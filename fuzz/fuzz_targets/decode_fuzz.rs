#![no_main]
use depatch::{Compression, PatchOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary patches must only ever produce errors, never panic.
    for compression in [Compression::None, Compression::default()] {
        let opts = PatchOptions::new(compression);
        let _ = depatch::apply::apply_patch_bytes_with(&[], data, &opts);
        depatch::apply::fuzz_apply(data, &opts);
    }

    let _ = depatch::format::read_size(data);
});
