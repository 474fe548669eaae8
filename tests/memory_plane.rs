// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Memory plane layout and the big-endian access contract.

use mac68k::memory::{FRAME_BASE, MemoryAccess, MemoryPlane, ROM_BASE, SCRATCH_BASE, SCRATCH_MIDDLE};

fn plane() -> MemoryPlane {
    let mut mem = MemoryPlane::new(0x20_0000, 0x1000).unwrap();
    mem.load_rom(vec![0; 0x10_0000]);
    mem
}

#[test]
fn accesses_are_big_endian() {
    let mut mem = plane();
    mem.set_long(0x1000, 0x1234_5678).unwrap();
    assert_eq!(mem.get_byte(0x1000), Some(0x12));
    assert_eq!(mem.get_byte(0x1003), Some(0x78));
    assert_eq!(mem.get_word(0x1002), Some(0x5678));
}

#[test]
fn ram_size_rounds_down_to_whole_megabytes() {
    let mem = MemoryPlane::new(0x20_0000 + 0x1234, 0).unwrap();
    assert_eq!(mem.ram_size(), 0x20_0000);
}

#[test]
fn tiny_ram_requests_are_refused() {
    assert!(MemoryPlane::new(0x8_0000, 0).is_err());
}

#[test]
fn unmapped_addresses_fault() {
    let mut mem = plane();
    assert_eq!(mem.get_byte(0x20_0000), None); // past RAM
    assert_eq!(mem.get_word(0x3000_0000), None);
    assert_eq!(mem.set_byte(0x3000_0000, 1), None);
    // The gap between RAM and ROM is unmapped.
    assert_eq!(mem.get_long(0x1000_0000), None);
}

#[test]
fn scratch_and_frame_buffer_are_mapped() {
    let mut mem = plane();
    mem.set_word(SCRATCH_MIDDLE, 0xbeef).unwrap();
    assert_eq!(mem.get_word(SCRATCH_MIDDLE), Some(0xbeef));
    assert_eq!(mem.get_byte(SCRATCH_BASE), Some(0));

    mem.set_byte(FRAME_BASE + 0xfff, 0x55).unwrap();
    assert_eq!(mem.get_byte(FRAME_BASE + 0xfff), Some(0x55));
    assert_eq!(mem.get_byte(FRAME_BASE + 0x1000), None);
}

#[test]
fn rom_is_writable_until_sealed() {
    let mut mem = plane();
    mem.set_word(ROM_BASE + 0x100, 0x4e71).unwrap();
    assert_eq!(mem.get_word(ROM_BASE + 0x100), Some(0x4e71));

    mem.seal_rom();
    // Stores are dropped, not faulted; reads still work.
    assert_eq!(mem.set_word(ROM_BASE + 0x100, 0xffff), Some(()));
    assert_eq!(mem.get_word(ROM_BASE + 0x100), Some(0x4e71));
}

#[test]
fn low_mem_clears_but_stays_writable() {
    let mut mem = plane();
    mem.set_long(0x16a, 0x1234_5678).unwrap();
    mem.clear_low_mem();
    assert_eq!(mem.get_long(0x16a), Some(0));
    mem.set_long(0x16a, 1).unwrap();
    assert_eq!(mem.get_long(0x16a), Some(1));
}

#[test]
fn word_reads_do_not_straddle_region_ends() {
    let mut mem = plane();
    // The very last RAM byte is readable, a word there is not.
    assert_eq!(mem.get_byte(0x1f_ffff), Some(0));
    assert_eq!(mem.get_word(0x1f_ffff), None);
}
