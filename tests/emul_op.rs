// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Escape-opcode dispatcher tests, driven through the machine loop with
//! escape words planted in RAM.

use mac68k::machine::{Bridges, Machine, MachineConfig};
use mac68k::memory::MemoryAccess;
use mac68k::timer::{INT_1HZ, INT_60HZ};

use std::sync::{Arc, Mutex};

const CODE: u32 = 0x1000;

fn machine() -> Machine {
    machine_with(Bridges::default())
}

fn machine_with(bridges: Bridges) -> Machine {
    let config = MachineConfig {
        ram_size: 2 * 1024 * 1024,
        ..MachineConfig::default()
    };
    let mut m = Machine::new(config, bridges).unwrap();
    m.power_on();
    m.cpu.regs.a[7] = 0x8000;
    m
}

/// Plants an escape word at the code address, followed by a shutdown
/// escape, and runs the machine through both.
fn run_escape(m: &mut Machine, ordinal: u8) {
    m.quit_flag().store(false, std::sync::atomic::Ordering::SeqCst);
    m.mem.set_word(CODE, 0x7100 | ordinal as u16).unwrap();
    m.mem.set_word(CODE + 2, 0x7102).unwrap();
    m.cpu.regs.pc = CODE;
    assert_eq!(m.run().unwrap(), 0);
}

#[test]
fn escape_advances_pc_past_the_opcode() {
    let mut m = machine();
    run_escape(&mut m, 0x08); // FIX_BOOTSTACK has no stack traffic
    assert_eq!(m.cpu.regs.pc, CODE + 4); // past the escape and the planted shutdown
}

#[test]
fn fix_boot_stack_points_a1_at_three_quarters_of_ram() {
    let mut m = machine();
    run_escape(&mut m, 0x08);
    assert_eq!(m.cpu.regs.a[1], m.mem.ram_size() / 4 * 3);
}

#[test]
fn xpram_round_trip_through_the_escapes() {
    let mut m = machine();

    // CLKNOMEM write of 0x5a to XPRAM register 0xe4:
    // reg = (d1 << 5 & 0xe0) | (d1 >> 10 & 0x1f) with the 0x38 select bits.
    m.cpu.regs.d[1] = 0x103f;
    m.cpu.regs.d[2] = 0x5a;
    run_escape(&mut m, 0x04);
    assert_eq!(m.cpu.regs.d[0], 0);

    // CLKNOMEM read of the same register.
    m.cpu.regs.d[1] = 0x103f | 0x80;
    m.cpu.regs.d[2] = 0;
    run_escape(&mut m, 0x04);
    assert_eq!(m.cpu.regs.d[2], 0x5a);
    assert_eq!(m.cpu.regs.d[1], m.cpu.regs.d[2]);

    // READ_XPRAM sees it too.
    m.cpu.regs.d[1] = 0xe4;
    run_escape(&mut m, 0x05);
    assert_eq!(m.cpu.regs.d[1], 0x5a);

    // And it survives a cold restart through the backing file.
    let path = std::env::temp_dir().join(format!("xpram-escape-{}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let config = MachineConfig {
        ram_size: 2 * 1024 * 1024,
        xpram_path: Some(path.clone()),
        ..MachineConfig::default()
    };
    let m1 = Machine::new(config.clone(), Bridges::default()).unwrap();
    m1.xpram.write(0xe4, 0x5a);
    m1.xpram.save();
    let m2 = Machine::new(config, Bridges::default()).unwrap();
    assert_eq!(m2.xpram.read(0xe4), 0x5a);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn rtc_reads_come_from_the_host_clock() {
    let mut m = machine();
    let now = mac68k::macos_util::mac_time_now();

    // CLKNOMEM read of clock register 0 (low byte of the seconds count).
    m.cpu.regs.d[1] = 0x80;
    run_escape(&mut m, 0x04);
    let low = m.cpu.regs.d[2] as u8;
    // Within a couple of seconds of our own sample.
    let diff = low.wrapping_sub(now as u8);
    assert!(diff <= 2 || diff >= 0xfe, "RTC byte {low:#x} vs {now:#x}");
}

#[test]
fn microseconds_is_monotonic() {
    let mut m = machine();
    run_escape(&mut m, 0x27);
    let first = (m.cpu.regs.a[0] as u64) << 32 | m.cpu.regs.d[0] as u64;
    std::thread::sleep(std::time::Duration::from_millis(2));
    run_escape(&mut m, 0x27);
    let second = (m.cpu.regs.a[0] as u64) << 32 | m.cpu.regs.d[0] as u64;
    assert!(second > first);
}

#[test]
fn irq_escape_counts_ticks_and_drains_flags() {
    let mut m = machine();

    for _ in 0..60 {
        m.flags.set(INT_60HZ);
        run_escape(&mut m, 0x29); // IRQ
    }
    assert_eq!(m.mem.get_long(0x16a), Some(60));

    // The Mac has not started: the 1 Hz work is taken but does nothing.
    m.flags.set(INT_1HZ);
    run_escape(&mut m, 0x29);
    assert_eq!(m.flags.pending(), 0);

    // Without pending events the handler reports no 68k work.
    assert_eq!(m.cpu.regs.d[0], 0);
}

/// The stack bytes each SCSIDispatch selector consumes, per selector.
const SCSI_CONSUMES: [(u16, u32); 10] = [
    (0, 0),  // Reset
    (1, 0),  // Get
    (2, 2),  // Select
    (3, 6),  // Cmd
    (4, 12), // Complete
    (5, 4),  // Read
    (6, 4),  // Write
    (10, 0), // Stat
    (13, 2), // MsgOut
    (14, 0), // MgrBusy
];

#[test]
fn scsi_dispatch_adjusts_the_stack_per_selector() {
    for (selector, consumed) in SCSI_CONSUMES {
        let mut m = machine();
        let sp = 0x8000;
        m.cpu.regs.a[7] = sp;
        m.mem.set_long(sp, 0x0000_2222).unwrap(); // return address
        m.mem.set_word(sp + 4, selector).unwrap();

        run_escape(&mut m, 0x28);

        assert_eq!(m.cpu.regs.a[0], 0x2222, "selector {selector}: return address");
        assert_eq!(m.cpu.regs.a[7], sp + 6, "selector {selector}: popped frame");
        assert_eq!(m.cpu.regs.a[1], sp + 6 + consumed, "selector {selector}: consumed operands");
    }
}

/// Clipboard bridge that exposes its state to the test.
#[derive(Clone, Default)]
struct SharedClipboard {
    content: Arc<Mutex<Vec<u8>>>,
}

impl mac68k::host::ClipboardBridge for SharedClipboard {
    fn put_text(&mut self, data: &[u8]) {
        *self.content.lock().unwrap() = data.to_vec();
    }

    fn get_text(&mut self) -> Option<Vec<u8>> {
        None
    }
}

#[test]
fn put_scrap_publishes_translated_text() {
    let clipboard = SharedClipboard::default();
    let mut bridges = Bridges::default();
    bridges.clipboard = Box::new(clipboard.clone());
    let mut m = machine_with(bridges);

    // Guest scrap "AB\rC" at 0x3000; PutScrap(ptr, 'TEXT', 4) stack frame.
    let text = 0x3000;
    for (i, b) in b"AB\rC".iter().enumerate() {
        m.mem.set_byte(text + i as u32, *b).unwrap();
    }
    let sp = 0x8000;
    m.cpu.regs.a[7] = sp;
    m.mem.set_long(sp + 4, text).unwrap();
    m.mem.set_long(sp + 8, 0x5445_5854).unwrap(); // 'TEXT'
    m.mem.set_long(sp + 12, 4).unwrap();

    run_escape(&mut m, 0x2a); // PUT_SCRAP

    assert_eq!(clipboard.content.lock().unwrap().as_slice(), b"AB\nC");
}

#[test]
fn unknown_escape_stops_the_machine() {
    let mut m = machine();
    m.mem.set_word(CODE, 0x71f0).unwrap();
    m.cpu.regs.pc = CODE;
    // The dispatcher aborts instead of running a bogus ordinal.
    assert_eq!(m.run().unwrap(), 0);
}
