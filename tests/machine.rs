// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-machine tests: boot the synthetic ROM through the patched reset
//! path to a clean shutdown.

mod common;

use mac68k::machine::{Bridges, Machine, MachineConfig};
use mac68k::memory::MemoryAccess;

fn machine() -> Machine {
    let config = MachineConfig {
        ram_size: 2 * 1024 * 1024,
        ..MachineConfig::default()
    };
    Machine::new(config, Bridges::default()).unwrap()
}

#[test]
fn boots_the_patched_rom_to_shutdown() {
    let mut m = machine();
    m.load_rom(&common::build_test_rom()).unwrap();
    m.power_on();

    // Entry jumps to the reset splice; the reset escape builds BootGlobs
    // and the continuation hits the shutdown escape.
    let code = m.run().unwrap();
    assert_eq!(code, 0);

    // The reset escape set up the boot register file.
    assert_eq!(m.cpu.regs.a[6], m.mem.ram_size() - 0x1c);
    assert_eq!(m.cpu.regs.a[7], 0x10000);

    // BootGlobs live at the top of RAM.
    let top = m.mem.ram_size();
    assert_eq!(m.mem.get_long(top - 0x1c + 4), Some(top));
    assert_eq!(m.mem.get_long(top - 0x1c + 8), Some(0xffff_ffff));
}

#[test]
fn ram_size_is_rounded_down_to_megabytes() {
    let config = MachineConfig {
        ram_size: 3 * 1024 * 1024 + 12345,
        ..MachineConfig::default()
    };
    let m = Machine::new(config, Bridges::default()).unwrap();
    assert_eq!(m.mem.ram_size(), 3 * 1024 * 1024);
}

#[test]
fn rom_is_sealed_after_patching() {
    let mut m = machine();
    m.load_rom(&common::build_test_rom()).unwrap();

    let base = mac68k::memory::ROM_BASE;
    let before = m.mem.get_word(base + 0x8c);
    assert_eq!(before, Some(0x7103));

    // Guest stores to the sealed ROM are dropped, not faulted.
    assert_eq!(m.mem.set_word(base + 0x8c, 0xdead), Some(()));
    assert_eq!(m.mem.get_word(base + 0x8c), before);
}
