// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A synthetic 1 MiB ROM image carrying every structure the patcher
//! verifies: version word, UniversalInfo fingerprint, resource map, trap
//! offset table and the fingerprinted init routines.

/// Offsets the tests assert against.
pub const UNIVERSAL_INFO: usize = 0x3500;
pub const SONY_RSRC: usize = 0x34000;
pub const SERD_RSRC: usize = 0x36000;
pub const PACK4_RSRC: usize = 0x38000;
pub const TRAP_TARGETS: usize = 0x40000;
pub const TRAP_TABLE: usize = 0x60000;
pub const RSRC_MAP: usize = 0x61000;

fn put16(rom: &mut [u8], ofs: usize, value: u16) {
    rom[ofs..ofs + 2].copy_from_slice(&value.to_be_bytes());
}

fn put32(rom: &mut [u8], ofs: usize, value: u32) {
    rom[ofs..ofs + 4].copy_from_slice(&value.to_be_bytes());
}

/// The ROM offset the trap table hands out for a given A-trap.
pub fn trap_target(trap: u16) -> u32 {
    let index = if trap >= 0xa800 {
        (trap - 0xa800) as usize
    } else {
        0x400 + (trap - 0xa000) as usize
    };
    (TRAP_TARGETS + index * 0x40) as u32
}

pub fn build_test_rom() -> Vec<u8> {
    let mut rom = vec![0u8; 0x10_0000];

    // 32-bit clean version word.
    put16(&mut rom, 8, 0x067c);

    // UniversalInfo: the fingerprint sits 0x10 past the info base.
    rom[UNIVERSAL_INFO + 0x10..UNIVERSAL_INFO + 0x18]
        .copy_from_slice(&[0xdc, 0x00, 0x05, 0x05, 0x3f, 0xff, 0x01, 0x00]);
    put32(&mut rom, UNIVERSAL_INFO, 0x200); // decoderInfoPtr
    put32(&mut rom, UNIVERSAL_INFO + 12, 0x100); // nuBusInfoPtr

    // Empty hardware-base override table.
    put16(&mut rom, 0x94a, 0xffff);

    // InitMMU fingerprints for a 1 MiB image.
    rom[0x85000..0x85007].copy_from_slice(&[0x0c, 0x47, 0x00, 0x04, 0x62, 0x00, 0xfd]);
    rom[0x86000..0x8600e].copy_from_slice(&[
        0x0c, 0x2e, 0x00, 0x01, 0xff, 0xe6, 0x66, 0x0c, 0x4c, 0xed, 0x03, 0x87, 0xff, 0xe8,
    ]);

    // InitSCC fingerprint.
    rom[0xa20..0xa28].copy_from_slice(&[0x08, 0x38, 0x00, 0x01, 0x0d, 0xd1, 0x67, 0x04]);

    // Interrupt-enable LEA fingerprints.
    for ofs in [0x226, 0x230, 0x2ee] {
        rom[ofs] = 0x41;
        rom[ofs + 1] = 0xf9;
    }

    // VIA2 fingerprint.
    rom[0xa100..0xa108].copy_from_slice(&[0x20, 0x78, 0x0c, 0xec, 0x11, 0x7c, 0x00, 0x90]);

    // Trap offset table: every entry absolute, targets spaced 0x40 apart.
    put32(&mut rom, 0x22, TRAP_TABLE as u32);
    let mut bp = TRAP_TABLE;
    for index in 0..0x800usize {
        rom[bp] = 0xff;
        put32(&mut rom, bp + 1, (TRAP_TARGETS + index * 0x40) as u32);
        bp += 5;
    }

    // Resource map: DRVR 4, SERD 0, PACK 4.
    put32(&mut rom, 0x1a, RSRC_MAP as u32);
    put32(&mut rom, RSRC_MAP, RSRC_MAP as u32 + 0x100);
    let entries: [(u32, &[u8; 4], u16, u32); 3] = [
        (RSRC_MAP as u32 + 0x100, b"DRVR", 4, SONY_RSRC as u32),
        (RSRC_MAP as u32 + 0x140, b"SERD", 0, SERD_RSRC as u32),
        (RSRC_MAP as u32 + 0x180, b"PACK", 4, PACK4_RSRC as u32),
    ];
    for (i, (at, rtype, id, data)) in entries.iter().enumerate() {
        let next = entries.get(i + 1).map(|e| e.0).unwrap_or(0);
        put32(&mut rom, *at as usize + 8, next);
        put32(&mut rom, *at as usize + 12, *data);
        rom[*at as usize + 16..*at as usize + 20].copy_from_slice(*rtype);
        put16(&mut rom, *at as usize + 20, *id);
    }

    // Boot path: the entry point jumps to the reset splice, and the
    // post-reset continuation shuts the machine down cleanly.
    put16(&mut rom, 0x2a, 0x4ef9); // jmp (ROM+0x8c).l
    put32(&mut rom, 0x2c, 0x4080_0000 + 0x8c);
    put16(&mut rom, 0xba, 0x7102); // shutdown escape

    rom
}
