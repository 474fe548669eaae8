// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tests for ROM decoding and the patch engine, against a synthetic image
//! that carries every verified structure.

mod common;

use common::*;

use mac68k::host::HeadlessVideo;
use mac68k::memory::MemoryPlane;
use mac68k::rom_patches::{self, PatchConfig, RomError};

fn patch_config() -> PatchConfig {
    PatchConfig {
        model_id: 5,
        fpu: false,
        frame_base: mac68k::memory::FRAME_BASE,
    }
}

fn plane_with(rom: Vec<u8>) -> MemoryPlane {
    let mut mem = MemoryPlane::new(0x10_0000, HeadlessVideo::default().frame_size).unwrap();
    mem.load_rom(rom);
    mem
}

fn word(mem: &MemoryPlane, ofs: u32) -> u16 {
    let rom = mem.rom();
    (rom[ofs as usize] as u16) << 8 | rom[ofs as usize + 1] as u16
}

#[test]
fn raw_images_pass_through() {
    let rom = build_test_rom();
    let decoded = rom_patches::decode_rom(&rom).unwrap();
    assert_eq!(decoded, rom);
}

#[test]
fn truncated_images_are_rejected() {
    assert_eq!(rom_patches::decode_rom(&[0u8; 0x1000]), Err(RomError::BadSize(0x1000)));
}

#[test]
fn wrong_version_is_rejected() {
    let mut rom = build_test_rom();
    rom[8] = 0x02;
    rom[9] = 0x76;
    let mut mem = plane_with(rom);
    assert_eq!(rom_patches::patch_rom(&mut mem, &patch_config()), Err(RomError::UnsupportedVersion(0x0276)));
}

#[test]
fn patching_installs_the_escape_points() {
    let mut mem = plane_with(build_test_rom());
    let info = rom_patches::patch_rom(&mut mem, &patch_config()).unwrap();

    assert_eq!(info.version, 0x067c);
    assert_eq!(info.universal_info, UNIVERSAL_INFO as u32);
    assert_eq!(info.sony_offset, SONY_RSRC as u32);
    assert_eq!(info.serd_offset, SERD_RSRC as u32);

    // Boot-time splices.
    assert_eq!(word(&mem, 0x8c), 0x7103); // reset escape
    assert_eq!(word(&mem, 0x8e), 0x4ef9); // jmp past the hardware init
    assert_eq!(word(&mem, 0x10e), 0x7107); // BootGlobs patch
    assert_eq!(word(&mem, 0x1142), 0x710a); // InstallDrivers

    // The replacement .Sony driver leads each entry with its escape.
    let sony = SONY_RSRC as u32;
    assert_eq!(word(&mem, sony + 0x18), 0x710c);
    assert_eq!(word(&mem, sony + 0x1c), 0x710d);
    assert_eq!(word(&mem, sony + 0x20), 0x710e);
    assert_eq!(word(&mem, sony + 0x2c), 0x710f);
    // .Disk and .AppleCD behind it.
    assert_eq!(word(&mem, sony + 0x100 + 0x18), 0x7110);
    assert_eq!(word(&mem, sony + 0x200 + 0x1c), 0x7114);

    // Serial drivers inside the SERD resource, port numbers first.
    let serd = SERD_RSRC as u32;
    assert_eq!(word(&mem, serd + 12), 0x710b);
    assert_eq!(word(&mem, serd + 0x100 + 0x18), 0x7000); // moveq #0,d0
    assert_eq!(word(&mem, serd + 0x100 + 0x1a), 0x711b);
    // .BOut has a longer name, so its entries sit two bytes further in.
    assert_eq!(word(&mem, serd + 0x400 + 0x1a), 0x7003); // moveq #3,d0

    // Time Manager traps.
    assert_eq!(word(&mem, trap_target(0xa058)), 0x7124);
    assert_eq!(word(&mem, trap_target(0xa059)), 0x40e7); // move sr,-(sp)
    assert_eq!(word(&mem, trap_target(0xa059) + 6), 0x7125);
    assert_eq!(word(&mem, info.microseconds_offset), 0x7127);
    assert_eq!(word(&mem, info.debugutil_offset), 0x7136);

    // SCSIDispatch: escape, move.l a1,a7, jmp (a0).
    let scsi = trap_target(0xa815);
    assert_eq!(word(&mem, scsi), 0x7128);
    assert_eq!(word(&mem, scsi + 2), 0x2e49);
    assert_eq!(word(&mem, scsi + 4), 0x4ed0);

    // PowerOff shuts down.
    assert_eq!(word(&mem, trap_target(0xa05b)), 0x7102);

    // Scrap patches escape first, then jump into the ROM routine.
    assert_eq!(word(&mem, sony + 0xc00), 0x712a);
    assert_eq!(word(&mem, sony + 0xc02), 0x4ef9);
    assert_eq!(word(&mem, sony + 0xd00), 0x712b);
    assert_eq!(info.put_scrap_patch, 0x4080_0000 + sony + 0xc00);

    // The VIA level-1 stub walks the flags through the IRQ escape.
    assert_eq!(word(&mem, 0x9bc4), 0x7002); // moveq #2,d0
    assert_eq!(word(&mem, 0xa296), 0x4e71);
    assert_eq!(word(&mem, 0xa29a), 0x7129);
    assert_eq!(word(&mem, 0xa29c), 0x4a80);
    assert_eq!(word(&mem, 0xa29e), 0x67f4);
}

#[test]
fn chrp_wrapped_lzss_images_decode() {
    // A wrapper whose payload is eight verbatim bytes (mask 0xff).
    let mut image = b"<CHRP-BOOT> 000100 constant lzss-offset 000009 constant lzss-size ".to_vec();
    image.resize(0x100, 0);
    image.extend_from_slice(&[0xff]);
    image.extend_from_slice(b"Boot TNT");

    let rom = rom_patches::decode_rom(&image).unwrap();
    assert_eq!(rom.len(), 0x40_0000);
    assert_eq!(&rom[..8], b"Boot TNT");
    assert!(rom[8..].iter().all(|&b| b == 0));
}

#[test]
fn patching_twice_fails_the_fingerprint_gate() {
    let mut mem = plane_with(build_test_rom());
    rom_patches::patch_rom(&mut mem, &patch_config()).unwrap();

    // The first pass rewrote the fingerprinted routines, so the second one
    // cannot verify them and must refuse to touch the image.
    match rom_patches::patch_rom(&mut mem, &patch_config()) {
        Err(RomError::FingerprintMissing(_)) => {},
        other => panic!("expected a fingerprint miss, got {other:?}"),
    }
}

#[test]
fn slot_rom_sits_at_the_top_with_a_valid_crc() {
    let mut mem = plane_with(build_test_rom());
    rom_patches::patch_rom(&mut mem, &patch_config()).unwrap();

    let rom = mem.rom();
    let n = rom.len();
    // Byte lanes and test pattern of the declaration ROM trailer.
    assert_eq!(&rom[n - 2..], &[0x00, 0x0f]);
    assert_eq!(&rom[n - 6..n - 2], &0x5a93_2bc7u32.to_be_bytes());
}

#[test]
fn model_id_is_written_into_universal_info() {
    let mut mem = plane_with(build_test_rom());
    let config = PatchConfig { model_id: 0x17, ..patch_config() };
    rom_patches::patch_rom(&mut mem, &config).unwrap();
    assert_eq!(mem.rom()[UNIVERSAL_INFO + 18], 0x17);
}
