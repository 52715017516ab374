//! Malformed and truncated inputs must fail cleanly, never panic.

use binload::{parse, Binary, FormatHint, LoaderError};

use crate::common::{full_elf64, minimal_elf32, minimal_elf64, minimal_pe64, pe32_dll};

/// Every byte a loaded section holds must come from inside the buffer.
fn assert_within(bin: &Binary, len: usize) {
    for section in &bin.sections {
        assert!(
            section.bytes.is_empty()
                || section.file_offset + section.bytes.len() as u64 <= len as u64,
            "section {} reads past {:#x}",
            section.name,
            len
        );
    }
}

fn check_truncations(data: &[u8], allow_ok: bool) {
    for cut in 0..data.len() {
        match parse(&data[..cut], FormatHint::Auto) {
            Ok(bin) => {
                assert!(allow_ok, "prefix of {} bytes loaded", cut);
                assert_within(&bin, cut);
            }
            Err(LoaderError::OutOfBounds { .. })
            | Err(LoaderError::CorruptSection { .. })
            | Err(LoaderError::UnsupportedFormat) => {}
            Err(other) => panic!("prefix of {} bytes: unexpected error {:?}", cut, other),
        }
    }
}

#[test]
fn empty_buffer_is_unsupported() {
    assert_eq!(parse(&[], FormatHint::Auto), Err(LoaderError::UnsupportedFormat));
}

#[test]
fn unknown_magic_is_unsupported() {
    assert_eq!(
        parse(b"#!/bin/sh\necho hi\n", FormatHint::Auto),
        Err(LoaderError::UnsupportedFormat)
    );
    // MZ without a PE header is a DOS program
    let mut dos = vec![0u8; 0x80];
    dos[0..2].copy_from_slice(b"MZ");
    assert_eq!(parse(&dos, FormatHint::Auto), Err(LoaderError::UnsupportedFormat));
}

#[test]
fn truncated_elf_images_fail_cleanly() {
    // The section header table sits at the end, so no strict prefix loads
    check_truncations(&minimal_elf64(), false);
    check_truncations(&minimal_elf32(), false);
    check_truncations(&full_elf64(), false);
}

#[test]
fn truncated_pe_images_fail_cleanly() {
    check_truncations(&minimal_pe64(), true);
    // Prefixes that only lose the COFF tables still load, with warnings
    check_truncations(&pe32_dll(), true);
}

#[test]
fn truncated_elf_header_is_out_of_bounds() {
    let data = minimal_elf64();
    assert!(matches!(
        parse(&data[..20], FormatHint::Auto),
        Err(LoaderError::OutOfBounds { .. })
    ));
}

#[test]
fn bad_elf_class_is_unsupported() {
    let mut data = minimal_elf64();
    data[4] = 7;
    assert_eq!(parse(&data, FormatHint::Auto), Err(LoaderError::UnsupportedFormat));
}

#[test]
fn corrupted_header_bytes_never_panic() {
    for image in [minimal_elf64(), minimal_elf32(), minimal_pe64(), pe32_dll()] {
        let header_len = image.len().min(0x200);
        for pos in 0..header_len {
            for value in [0x00u8, 0x7f, 0xff] {
                let mut data = image.clone();
                data[pos] = value;
                if let Ok(bin) = parse(&data, FormatHint::Auto) {
                    assert_within(&bin, data.len());
                }
            }
        }
    }
}

#[test]
fn random_buffers_never_panic() {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as u8
    };

    for round in 0..256 {
        let len = 64 + round * 7;
        let mut data: Vec<u8> = (0..len).map(|_| next()).collect();
        match round % 3 {
            0 => data[..4].copy_from_slice(b"\x7fELF"),
            1 => {
                data[..2].copy_from_slice(b"MZ");
                data[0x3c..0x40].copy_from_slice(&0x40u32.to_le_bytes());
                data[0x40..0x44].copy_from_slice(b"PE\0\0");
            }
            _ => {}
        }
        if let Ok(bin) = parse(&data, FormatHint::Auto) {
            assert_within(&bin, data.len());
        }
    }
}
