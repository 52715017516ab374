#![no_main]
use binload::{parse, FormatHint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(bin) = parse(data, FormatHint::Auto) {
        for section in &bin.sections {
            let end = section.file_offset + section.bytes.len() as u64;
            assert!(section.bytes.is_empty() || end <= data.len() as u64);
        }
    }
});
