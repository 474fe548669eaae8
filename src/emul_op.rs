// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Escape opcodes: the call-outs from patched ROM code back into the host.
//!
//! Opcode words in the 0x7100 page (illegal MOVEQ forms) are not illegal
//! instructions here; the low byte selects a host routine. Handlers get the
//! machine and a register snapshot; the snapshot is written back when they
//! return, and the PC has already been advanced past the escape word.

use crate::machine::Machine;
use crate::clip;
use crate::macos_util::{self, low_mem};
use crate::memory::ROM_BASE;
use crate::timer;

use log::{error, trace};

/// Escape opcode ordinals (the low byte of the 0x71xx opcode word).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EmulOp {
    /// End of a 68k call initiated by `Execute68k`.
    ExecReturn = 0x00,
    Break = 0x01,
    Shutdown = 0x02,
    Reset = 0x03,
    ClkNoMem = 0x04,
    ReadXpram = 0x05,
    ReadXpram2 = 0x06,
    PatchBootGlobs = 0x07,
    FixBootStack = 0x08,
    FixMemSize = 0x09,
    InstallDrivers = 0x0a,
    InstallSerd = 0x0b,
    SonyOpen = 0x0c,
    SonyPrime = 0x0d,
    SonyControl = 0x0e,
    SonyStatus = 0x0f,
    DiskOpen = 0x10,
    DiskPrime = 0x11,
    DiskControl = 0x12,
    DiskStatus = 0x13,
    CdromOpen = 0x14,
    CdromPrime = 0x15,
    CdromControl = 0x16,
    CdromStatus = 0x17,
    VideoOpen = 0x18,
    VideoControl = 0x19,
    VideoStatus = 0x1a,
    SerialOpen = 0x1b,
    SerialPrime = 0x1c,
    SerialControl = 0x1d,
    SerialStatus = 0x1e,
    SerialClose = 0x1f,
    EtherOpen = 0x20,
    EtherControl = 0x21,
    EtherReadPacket = 0x22,
    AdbOp = 0x23,
    InsTime = 0x24,
    RmvTime = 0x25,
    PrimeTime = 0x26,
    Microseconds = 0x27,
    ScsiDispatch = 0x28,
    Irq = 0x29,
    PutScrap = 0x2a,
    GetScrap = 0x2b,
    CheckLoad = 0x2c,
    Audio = 0x2d,
    ExtFsComm = 0x2e,
    ExtFsHfs = 0x2f,
    BlockMove = 0x30,
    SoundInOpen = 0x31,
    SoundInPrime = 0x32,
    SoundInControl = 0x33,
    SoundInStatus = 0x34,
    SoundInClose = 0x35,
    DebugUtil = 0x36,
    IdleTime = 0x37,
    Suspend = 0x38,
}

/// Register context handed to an escape handler and written back after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmulOpRegs {
    pub d: [u32; 8],
    pub a: [u32; 8],
    pub sr: u16,
}

impl std::fmt::Display for EmulOpRegs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "d0 {:08x} d1 {:08x} d2 {:08x} d3 {:08x}", self.d[0], self.d[1], self.d[2], self.d[3])?;
        writeln!(f, "d4 {:08x} d5 {:08x} d6 {:08x} d7 {:08x}", self.d[4], self.d[5], self.d[6], self.d[7])?;
        writeln!(f, "a0 {:08x} a1 {:08x} a2 {:08x} a3 {:08x}", self.a[0], self.a[1], self.a[2], self.a[3])?;
        writeln!(f, "a4 {:08x} a5 {:08x} a6 {:08x} a7 {:08x}", self.a[4], self.a[5], self.a[6], self.a[7])?;
        write!(f, "sr {:04x}", self.sr)
    }
}

/// What the machine loop does after an escape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmulOpOutcome {
    Continue,
    /// Unwind the innermost `Execute68k` call.
    ExecReturn,
    /// Tear the machine down (clean shutdown or diagnostic abort).
    Quit,
}

pub(crate) type EmulOpHandler = fn(&mut Machine, &mut EmulOpRegs) -> EmulOpOutcome;

/// Builds the 256-entry dispatch table. Unregistered ordinals land in
/// [unknown_escape].
pub(crate) fn handler_table() -> Box<[EmulOpHandler; 256]> {
    let mut table: Box<[EmulOpHandler; 256]> = Box::new([unknown_escape; 256]);
    table[EmulOp::ExecReturn as usize] = op_exec_return;
    table[EmulOp::Break as usize] = op_break;
    table[EmulOp::Shutdown as usize] = op_shutdown;
    table[EmulOp::Reset as usize] = op_reset;
    table[EmulOp::ClkNoMem as usize] = op_clk_no_mem;
    table[EmulOp::ReadXpram as usize] = op_read_xpram;
    table[EmulOp::ReadXpram2 as usize] = op_read_xpram2;
    table[EmulOp::PatchBootGlobs as usize] = op_patch_boot_globs;
    table[EmulOp::FixBootStack as usize] = op_fix_boot_stack;
    table[EmulOp::FixMemSize as usize] = op_fix_mem_size;
    table[EmulOp::InstallDrivers as usize] = op_install_drivers;
    table[EmulOp::InstallSerd as usize] = op_install_serd;
    table[EmulOp::SonyOpen as usize] = op_sony_open;
    table[EmulOp::SonyPrime as usize] = op_sony_prime;
    table[EmulOp::SonyControl as usize] = op_sony_control;
    table[EmulOp::SonyStatus as usize] = op_sony_status;
    table[EmulOp::DiskOpen as usize] = op_disk_open;
    table[EmulOp::DiskPrime as usize] = op_disk_prime;
    table[EmulOp::DiskControl as usize] = op_disk_control;
    table[EmulOp::DiskStatus as usize] = op_disk_status;
    table[EmulOp::CdromOpen as usize] = op_cdrom_open;
    table[EmulOp::CdromPrime as usize] = op_cdrom_prime;
    table[EmulOp::CdromControl as usize] = op_cdrom_control;
    table[EmulOp::CdromStatus as usize] = op_cdrom_status;
    table[EmulOp::VideoOpen as usize] = op_video_open;
    table[EmulOp::VideoControl as usize] = op_video_control;
    table[EmulOp::VideoStatus as usize] = op_video_status;
    table[EmulOp::SerialOpen as usize] = op_serial_open;
    table[EmulOp::SerialPrime as usize] = op_serial_prime;
    table[EmulOp::SerialControl as usize] = op_serial_control;
    table[EmulOp::SerialStatus as usize] = op_serial_status;
    table[EmulOp::SerialClose as usize] = op_serial_close;
    table[EmulOp::EtherOpen as usize] = op_ether_open;
    table[EmulOp::EtherControl as usize] = op_ether_control;
    table[EmulOp::EtherReadPacket as usize] = op_ether_read_packet;
    table[EmulOp::AdbOp as usize] = op_adb_op;
    table[EmulOp::InsTime as usize] = op_ins_time;
    table[EmulOp::RmvTime as usize] = op_rmv_time;
    table[EmulOp::PrimeTime as usize] = op_prime_time;
    table[EmulOp::Microseconds as usize] = op_microseconds;
    table[EmulOp::ScsiDispatch as usize] = op_scsi_dispatch;
    table[EmulOp::Irq as usize] = op_irq;
    table[EmulOp::PutScrap as usize] = op_put_scrap;
    table[EmulOp::GetScrap as usize] = op_get_scrap;
    table[EmulOp::CheckLoad as usize] = op_check_load;
    table[EmulOp::Audio as usize] = op_audio;
    table[EmulOp::ExtFsComm as usize] = op_extfs_comm;
    table[EmulOp::ExtFsHfs as usize] = op_extfs_hfs;
    table[EmulOp::BlockMove as usize] = op_block_move;
    table[EmulOp::SoundInOpen as usize] = op_sound_in_open;
    table[EmulOp::SoundInPrime as usize] = op_sound_in_prime;
    table[EmulOp::SoundInControl as usize] = op_sound_in_control;
    table[EmulOp::SoundInStatus as usize] = op_sound_in_status;
    table[EmulOp::SoundInClose as usize] = op_sound_in_close;
    table[EmulOp::DebugUtil as usize] = op_debug_util;
    table[EmulOp::IdleTime as usize] = op_idle_time;
    table[EmulOp::Suspend as usize] = op_suspend;
    table
}

fn unknown_escape(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    error!("escape opcode called with bogus ordinal {:#06x}\n{}", machine.current_escape(), regs);
    EmulOpOutcome::Quit
}

fn op_exec_return(_: &mut Machine, _: &mut EmulOpRegs) -> EmulOpOutcome {
    EmulOpOutcome::ExecReturn
}

fn op_break(_: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    eprintln!("*** Breakpoint\n{regs}");
    EmulOpOutcome::Quit
}

fn op_shutdown(_: &mut Machine, _: &mut EmulOpRegs) -> EmulOpOutcome {
    EmulOpOutcome::Quit
}

/// MacOS reset: rebuild BootGlobs at the top of RAM and load the registers
/// the boot routine expects.
fn op_reset(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    trace!("*** RESET ***");
    machine.tick_inhibit = true;
    machine.reset_subsystems();

    let ram_size = machine.mem.ram_size();

    // BootGlobs at the top of memory.
    for addr in (ram_size - 4096..ram_size).step_by(4) {
        macos_util::write_mac_u32(&mut machine.mem, addr, 0);
    }
    let boot_globs = ram_size - 0x1c;
    macos_util::write_mac_u32(&mut machine.mem, boot_globs, 0); // First RAM bank
    macos_util::write_mac_u32(&mut machine.mem, boot_globs + 0x04, ram_size);
    macos_util::write_mac_u32(&mut machine.mem, boot_globs + 0x08, 0xffff_ffff); // End of bank table
    macos_util::write_mac_u32(&mut machine.mem, boot_globs + 0x0c, 0);

    // Registers for the boot routine.
    let info = ROM_BASE + machine.rom_info.universal_info;
    regs.d[0] = macos_util::read_mac_u32(&mut machine.mem, info + 0x18); // AddrMapFlags
    regs.d[1] = macos_util::read_mac_u32(&mut machine.mem, info + 0x1c); // UnivROMFlags
    regs.d[2] = macos_util::read_mac_u32(&mut machine.mem, info + 0x10); // HWCfgFlags/IDs
    if machine.config.fpu {
        regs.d[2] |= 0x1000_0000;
    } else {
        regs.d[2] &= 0xefff_ffff;
    }
    regs.a[0] = info + macos_util::read_mac_u32(&mut machine.mem, info); // AddrMap
    regs.a[1] = info; // UniversalInfo
    regs.a[6] = boot_globs;
    regs.a[7] = 0x10000; // Boot stack

    machine.tick_inhibit = false;
    EmulOpOutcome::Continue
}

/// Clock/PRAM operations, standing in for VIA/Cuda clock access.
fn op_clk_no_mem(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let is_read = regs.d[1] & 0x80 != 0;
    if regs.d[1] & 0x78 == 0x38 {
        // XPRAM.
        let reg = ((regs.d[1] << 5 & 0xe0) | (regs.d[1] >> 10 & 0x1f)) as u16;
        if is_read {
            let mut value = machine.xpram.read(reg);
            // LocalTalk is gone; force EtherTalk answers when nothing
            // configured it otherwise.
            let localtalk = machine.xpram.read(0xe0) == 0 && machine.xpram.read(0xe1) == 0;
            match reg {
                0x8a => value |= 0x05, // 32-bit mode is always enabled
                0xe0 if localtalk => value = 0x00,
                0xe1 if localtalk => value = 0xf1,
                0xe2 if localtalk => value = 0x00,
                0xe3 if localtalk => value = 0x0a,
                _ => {},
            }
            regs.d[2] = value as u32;
            trace!("read XPRAM {reg:02x}->{value:02x}");
        } else {
            let mut value = regs.d[2] as u8;
            if reg == 0x8a {
                value |= 0x05;
            }
            trace!("write XPRAM {reg:02x}<-{value:02x}");
            machine.xpram.write(reg, value);
        }
    } else {
        // PRAM, RTC and other clock registers.
        let reg = (regs.d[1] >> 2 & 0x1f) as u16;
        if reg >= 0x10 || (0x08..0x0c).contains(&reg) {
            if is_read {
                regs.d[2] = machine.xpram.read(reg) as u32;
            } else {
                machine.xpram.write(reg, regs.d[2] as u8);
            }
        } else if reg < 0x08 && is_read {
            let t = macos_util::mac_time_now();
            regs.d[2] = (t >> (reg as u32 & 3) * 8) as u8 as u32;
        } else {
            trace!("RTC op {} d1 {:08x} d2 {:08x}", reg, regs.d[1], regs.d[2]);
        }
    }
    regs.d[0] = 0;
    regs.d[1] = regs.d[2];
    EmulOpOutcome::Continue
}

fn op_read_xpram(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[1] = machine.xpram.read(regs.d[1] as u16 & 0xff) as u32;
    EmulOpOutcome::Continue
}

fn op_read_xpram2(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = machine.xpram.read(regs.d[0] as u16 & 0xff) as u32;
    EmulOpOutcome::Continue
}

fn op_patch_boot_globs(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    trace!("patch BootGlobs");
    let top = machine.mem.ram_size();
    let mem = &mut machine.mem;
    macos_util::write_mac_u32(mem, regs.a[4] - 20, top); // MemTop
    macos_util::write_mac_u8(mem, regs.a[4] - 26, 0); // No MMU
    let b = macos_util::read_mac_u8(mem, regs.a[4] - 25);
    macos_util::write_mac_u8(mem, regs.a[4] - 25, b | 1); // No MMU
    regs.a[6] = top;
    EmulOpOutcome::Continue
}

/// Boot stack to 3/4 of RAM.
fn op_fix_boot_stack(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.a[1] = machine.mem.ram_size() / 4 * 3;
    trace!("fix boot stack {:08x}", regs.a[1]);
    EmulOpOutcome::Continue
}

/// Correct the logical and physical memory size in LowMem.
fn op_fix_mem_size(machine: &mut Machine, _: &mut EmulOpRegs) -> EmulOpOutcome {
    let mem = &mut machine.mem;
    let diff = macos_util::read_mac_u32(mem, low_mem::MEM_SIZE_PHYSICAL)
        .wrapping_sub(macos_util::read_mac_u32(mem, low_mem::MEM_SIZE_LOGICAL));
    let size = mem.ram_size();
    macos_util::write_mac_u32(mem, low_mem::MEM_SIZE_PHYSICAL, size);
    macos_util::write_mac_u32(mem, low_mem::MEM_SIZE_LOGICAL, size.wrapping_sub(diff));
    EmulOpOutcome::Continue
}

// Driver refnums and flag words, as the ROM resources carry them. The
// .Sony driver keeps its resource refnum (-5); only the appended drivers
// are installed by hand.
pub(crate) const SONY_DRIVER_FLAGS: u16 = 0x6f00;
pub(crate) const DISK_REF_NUM: i16 = -63;
pub(crate) const DISK_DRIVER_FLAGS: u16 = 0x6f04;
pub(crate) const CDROM_REF_NUM: i16 = -62;
pub(crate) const CDROM_DRIVER_FLAGS: u16 = 0x6d00;

/// Installs the generated .Disk and .AppleCD drivers during startup and
/// activates the scrap patches.
fn op_install_drivers(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    trace!("InstallDrivers");
    let pb = regs.a[0];
    let rom = ROM_BASE;
    let info = machine.rom_info;

    let mut r = EmulOpRegs::default();

    // Microseconds() and DebugUtil() replacement routines.
    r.a[0] = rom + info.microseconds_offset;
    r.d[0] = 0xa093;
    machine.execute_68k_trap(0xa247, &mut r); // SetOSTrapAddress()
    r.a[0] = rom + info.debugutil_offset;
    r.d[0] = 0xa08d;
    machine.execute_68k_trap(0xa247, &mut r); // SetOSTrapAddress()

    // Disk driver.
    r.a[0] = rom + info.sony_offset + 0x100;
    r.d[0] = DISK_REF_NUM as u32;
    machine.execute_68k_trap(0xa43d, &mut r); // DrvrInstallRsrvMem()
    let utable = macos_util::read_mac_u32(&mut machine.mem, low_mem::UTABLE_BASE);
    r.a[0] = macos_util::read_mac_u32(&mut machine.mem, utable.wrapping_add((!DISK_REF_NUM) as u16 as u32 * 4));
    machine.execute_68k_trap(0xa029, &mut r); // HLock()
    let dce = macos_util::read_mac_u32(&mut machine.mem, r.a[0]);
    macos_util::write_mac_u32(&mut machine.mem, dce + macos_util::DCTL_DRIVER, rom + info.sony_offset + 0x100);
    macos_util::write_mac_u16(&mut machine.mem, dce + macos_util::DCTL_FLAGS, DISK_DRIVER_FLAGS);

    // Open the disk driver.
    macos_util::write_mac_u32(&mut machine.mem, pb + macos_util::IO_NAME_PTR, rom + info.sony_offset + 0x112);
    r.a[0] = pb;
    machine.execute_68k_trap(0xa000, &mut r); // Open()

    if !machine.config.nocdrom {
        // CD-ROM driver.
        r.a[0] = rom + info.sony_offset + 0x200;
        r.d[0] = CDROM_REF_NUM as u32;
        machine.execute_68k_trap(0xa43d, &mut r); // DrvrInstallRsrvMem()
        let utable = macos_util::read_mac_u32(&mut machine.mem, low_mem::UTABLE_BASE);
        r.a[0] = macos_util::read_mac_u32(&mut machine.mem, utable.wrapping_add((!CDROM_REF_NUM) as u16 as u32 * 4));
        machine.execute_68k_trap(0xa029, &mut r); // HLock()
        let dce = macos_util::read_mac_u32(&mut machine.mem, r.a[0]);
        macos_util::write_mac_u32(&mut machine.mem, dce + macos_util::DCTL_DRIVER, rom + info.sony_offset + 0x200);
        macos_util::write_mac_u16(&mut machine.mem, dce + macos_util::DCTL_FLAGS, CDROM_DRIVER_FLAGS);

        macos_util::write_mac_u32(&mut machine.mem, pb + macos_util::IO_NAME_PTR, rom + info.sony_offset + 0x212);
        r.a[0] = pb;
        machine.execute_68k_trap(0xa000, &mut r); // Open()
    }

    // Activate the PutScrap() and GetScrap() patches.
    if info.put_scrap_patch != 0 {
        r.d[0] = 0xa9fe;
        r.a[0] = info.put_scrap_patch;
        machine.execute_68k_trap(0xa647, &mut r); // SetToolTrap()
    }
    if info.get_scrap_patch != 0 {
        r.d[0] = 0xa9fd;
        r.a[0] = info.get_scrap_patch;
        machine.execute_68k_trap(0xa647, &mut r); // SetToolTrap()
    }

    // Fake ASC registers, so the Sound Manager finds a version byte.
    r.d[0] = 0x1000;
    machine.execute_68k_trap(0xa71e, &mut r); // NewPtrSysClear()
    let asc_regs = r.a[0];
    macos_util::write_mac_u8(&mut machine.mem, asc_regs + 0x800, 0x0f); // ASC version
    macos_util::write_mac_u32(&mut machine.mem, low_mem::ASC_BASE, asc_regs);

    EmulOpOutcome::Continue
}

/// Installs the four serial drivers from the patched SERD resource.
fn op_install_serd(machine: &mut Machine, _: &mut EmulOpRegs) -> EmulOpOutcome {
    trace!("InstallSERD");
    let rom = ROM_BASE;
    let serd = machine.rom_info.serd_offset;

    for (i, flags) in [0x4d00u16, 0x4e00, 0x4d00, 0x4e00].iter().enumerate() {
        let mut r = EmulOpRegs::default();
        r.d[0] = (-6 - i as i32) as u32;
        r.a[0] = rom + serd + 0x100 * (i as u32 + 1);
        machine.execute_68k_trap(0xa53d, &mut r); // DrvrInstallRsrvMem()
        machine.execute_68k_trap(0xa029, &mut r); // HLock()
        let drvr = macos_util::read_mac_u32(&mut machine.mem, r.a[0]);
        macos_util::write_mac_u32(&mut machine.mem, drvr + macos_util::DCTL_DRIVER, rom + serd + 0x100 * (i as u32 + 1));
        macos_util::write_mac_u16(&mut machine.mem, drvr + macos_util::DCTL_FLAGS, *flags);
        macos_util::write_mac_u16(&mut machine.mem, drvr + macos_util::DCTL_Q_HDR, 9); // Version number
    }
    EmulOpOutcome::Continue
}

fn driver_result(regs: &mut EmulOpRegs, err: i16) -> EmulOpOutcome {
    regs.d[0] = err as u32;
    EmulOpOutcome::Continue
}

fn op_sony_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sony.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sony_prime(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sony.prime(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sony_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sony.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sony_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sony.status(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_disk_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.disk.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_disk_prime(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.disk.prime(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_disk_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.disk.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_disk_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.disk.status(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_cdrom_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.cdrom.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_cdrom_prime(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.cdrom.prime(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_cdrom_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.cdrom.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_cdrom_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.cdrom.status(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_video_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.video.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_video_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.video.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_video_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.video.status(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_serial_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.serial.open(&mut machine.mem, regs.a[0], regs.a[1], regs.d[0]);
    driver_result(regs, err)
}

fn op_serial_prime(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.serial.prime(&mut machine.mem, regs.a[0], regs.a[1], regs.d[0]);
    driver_result(regs, err)
}

fn op_serial_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.serial.control(&mut machine.mem, regs.a[0], regs.a[1], regs.d[0]);
    driver_result(regs, err)
}

fn op_serial_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.serial.status(&mut machine.mem, regs.a[0], regs.a[1], regs.d[0]);
    driver_result(regs, err)
}

fn op_serial_close(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.serial.close(&mut machine.mem, regs.a[0], regs.a[1], regs.d[0]);
    driver_result(regs, err)
}

fn op_ether_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.ether.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_ether_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.ether.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_ether_read_packet(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    machine.bridges.ether.read_packet(&mut machine.mem, regs.a[0], regs.a[3], regs.d[3], regs.d[1]);
    EmulOpOutcome::Continue
}

fn op_sound_in_open(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sound_in.open(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sound_in_prime(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sound_in.prime(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sound_in_control(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sound_in.control(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sound_in_status(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sound_in.status(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

fn op_sound_in_close(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.sound_in.close(&mut machine.mem, regs.a[0], regs.a[1]);
    driver_result(regs, err)
}

/// ADBOp() replacement. The completion routine is invoked by the patched
/// 68k code after this returns, and may call ADBOp() again.
fn op_adb_op(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let buffer = macos_util::read_mac_u32(&mut machine.mem, regs.a[0]);
    let mut data = [0u8; 9];
    for (i, b) in data.iter_mut().enumerate() {
        *b = macos_util::read_mac_u8(&mut machine.mem, buffer + i as u32);
    }
    machine.bridges.adb.op(regs.d[0], &mut data);
    for (i, b) in data.iter().enumerate() {
        macos_util::write_mac_u8(&mut machine.mem, buffer + i as u32, *b);
    }
    EmulOpOutcome::Continue
}

fn op_ins_time(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = machine.time_manager.ins_time(regs.a[0]) as u32;
    EmulOpOutcome::Continue
}

fn op_rmv_time(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = machine.time_manager.rmv_time(regs.a[0]) as u32;
    EmulOpOutcome::Continue
}

fn op_prime_time(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = machine.time_manager.prime_time(regs.a[0], regs.d[0] as i32) as u32;
    EmulOpOutcome::Continue
}

fn op_microseconds(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let (hi, lo) = machine.microseconds.sample();
    regs.a[0] = hi;
    regs.d[0] = lo;
    EmulOpOutcome::Continue
}

/// SCSIDispatch() replacement: pop the return address and selector, run the
/// operation, leave A0 = return address and A1 = new stack pointer so the
/// patched trap routine can emulate RTD.
fn op_scsi_dispatch(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let ret = macos_util::read_mac_u32(&mut machine.mem, regs.a[7]);
    let sel = macos_util::read_mac_u16(&mut machine.mem, regs.a[7] + 4);
    regs.a[7] += 6;
    let sp = regs.a[7];

    let mem = &mut machine.mem;
    let scsi = &mut machine.bridges.scsi;
    let stack: u32 = match sel {
        0 => { // SCSIReset
            let res = scsi.reset();
            macos_util::write_mac_u16(mem, sp, res);
            0
        },
        1 => { // SCSIGet
            let res = scsi.get();
            macos_util::write_mac_u16(mem, sp, res);
            0
        },
        2 | 11 => { // SCSISelect/SCSISelAtn
            let id = macos_util::read_mac_u16(mem, sp) as u8;
            let res = scsi.select(id);
            macos_util::write_mac_u16(mem, sp + 2, res);
            2
        },
        3 => { // SCSICmd
            let len = macos_util::read_mac_u16(mem, sp);
            let ptr = macos_util::read_mac_u32(mem, sp + 2);
            let res = scsi.cmd(mem, len, ptr);
            macos_util::write_mac_u16(mem, sp + 6, res);
            6
        },
        4 => { // SCSIComplete
            let timeout = macos_util::read_mac_u32(mem, sp);
            let message = macos_util::read_mac_u32(mem, sp + 4);
            let stat = macos_util::read_mac_u32(mem, sp + 8);
            let res = scsi.complete(mem, timeout, message, stat);
            macos_util::write_mac_u16(mem, sp + 12, res);
            12
        },
        5 | 8 => { // SCSIRead/SCSIRBlind
            let tib = macos_util::read_mac_u32(mem, sp);
            let res = scsi.read(mem, tib);
            macos_util::write_mac_u16(mem, sp + 4, res);
            4
        },
        6 | 9 => { // SCSIWrite/SCSIWBlind
            let tib = macos_util::read_mac_u32(mem, sp);
            let res = scsi.write(mem, tib);
            macos_util::write_mac_u16(mem, sp + 4, res);
            4
        },
        10 => { // SCSIStat
            let res = scsi.stat();
            macos_util::write_mac_u16(mem, sp, res);
            0
        },
        12 => { // SCSIMsgIn
            macos_util::write_mac_u16(mem, sp + 4, 0);
            4
        },
        13 => { // SCSIMsgOut
            macos_util::write_mac_u16(mem, sp + 2, 0);
            2
        },
        14 => { // SCSIMgrBusy
            let res = scsi.mgr_busy();
            macos_util::write_mac_u16(mem, sp, res);
            0
        },
        _ => {
            error!("SCSIDispatch({sel}): illegal selector");
            return EmulOpOutcome::Quit;
        },
    };

    regs.a[0] = ret;
    regs.a[1] = sp + stack;
    EmulOpOutcome::Continue
}

/// Level-1 interrupt walk: service every pending source once.
fn op_irq(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = 0;

    if machine.flags.take(timer::INT_60HZ) {
        // Increment Ticks.
        let ticks = macos_util::read_mac_u32(&mut machine.mem, low_mem::TICKS);
        macos_util::write_mac_u32(&mut machine.mem, low_mem::TICKS, ticks.wrapping_add(1));

        if !machine.tick_inhibit && macos_util::has_mac_started(&mut machine.mem) {
            machine.run_timer_tasks();
            machine.bridges.video.vbl(&mut machine.mem);

            // DoVBLTask(0).
            let mut r = EmulOpRegs::default();
            machine.execute_68k_trap(0xa072, &mut r);

            // The 68k side runs VBLTasks and friends.
            regs.d[0] = 1;
        }
    }

    if machine.flags.take(timer::INT_1HZ) && macos_util::has_mac_started(&mut machine.mem) {
        macos_util::write_mac_u32(&mut machine.mem, low_mem::TIME, macos_util::mac_time_now());
        machine.bridges.sony.interrupt(&mut machine.mem);
        machine.bridges.disk.interrupt(&mut machine.mem);
        machine.bridges.cdrom.interrupt(&mut machine.mem);
    }

    if machine.flags.take(timer::INT_SERIAL) {
        machine.bridges.serial.interrupt(&mut machine.mem);
    }

    if machine.flags.take(timer::INT_ETHER) {
        machine.bridges.ether.interrupt(&mut machine.mem);
    }

    if machine.flags.take(timer::INT_TIMER) {
        machine.run_timer_tasks();
    }

    if machine.flags.take(timer::INT_AUDIO) {
        machine.bridges.audio.interrupt(&mut machine.mem);
    }

    if machine.flags.take(timer::INT_ADB) && macos_util::has_mac_started(&mut machine.mem) {
        machine.bridges.adb.interrupt(&mut machine.mem);
    }

    if machine.flags.take(timer::INT_NMI) && macos_util::has_mac_started(&mut machine.mem) {
        machine.trigger_nmi();
    }

    EmulOpOutcome::Continue
}

/// PutScrap() patch: publish guest scrap writes to the host clipboard.
fn op_put_scrap(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let scrap = macos_util::read_mac_u32(&mut machine.mem, regs.a[7] + 4);
    let scrap_type = macos_util::read_mac_u32(&mut machine.mem, regs.a[7] + 8);
    let length = macos_util::read_mac_u32(&mut machine.mem, regs.a[7] + 12) as i32;

    if scrap_type != clip::TYPE_TEXT || length <= 0 {
        return EmulOpOutcome::Continue;
    }

    let mut data = Vec::with_capacity(length as usize);
    for i in 0..length as u32 {
        data.push(macos_util::read_mac_u8(&mut machine.mem, scrap + i));
    }
    if let Some(host_text) = machine.clip.guest_put(&data) {
        machine.bridges.clipboard.put_text(&host_text);
    }
    EmulOpOutcome::Continue
}

/// GetScrap() patch: runs before the ROM routine, so a changed host
/// clipboard is injected into the guest scrap first.
fn op_get_scrap(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let scrap_type = macos_util::read_mac_u32(&mut machine.mem, regs.a[7] + 8);
    if scrap_type != clip::TYPE_TEXT {
        return EmulOpOutcome::Continue;
    }

    let Some(host_text) = machine.bridges.clipboard.get_text() else {
        return EmulOpOutcome::Continue;
    };
    let data = machine.clip.host_changed(&host_text);

    // Space for the new scrap on the MacOS side.
    let mut r = EmulOpRegs::default();
    r.d[0] = data.len() as u32;
    machine.execute_68k_trap(0xa71e, &mut r); // NewPtrSysClear()
    let scrap_area = r.a[0];
    if scrap_area == 0 {
        return EmulOpOutcome::Continue;
    }
    for (i, b) in data.iter().enumerate() {
        macos_util::write_mac_u8(&mut machine.mem, scrap_area + i as u32, *b);
    }

    // ZeroScrap() and PutScrap() are stack-based, so they run through a
    // generated thunk in Mac memory.
    let proc = [
        0x598fu16,                                        // subq.l #4,sp
        0xa9fc,                                           // ZeroScrap()
        0x2f3c, (data.len() >> 16) as u16, data.len() as u16, // move.l #length,-(sp)
        0x2f3c, (clip::TYPE_TEXT >> 16) as u16, clip::TYPE_TEXT as u16, // move.l #type,-(sp)
        0x2f3c, (scrap_area >> 16) as u16, scrap_area as u16, // move.l #outbuf,-(sp)
        0xa9fe,                                           // PutScrap()
        0x588f,                                           // addq.l #4,sp
        crate::assembler::rts(),
    ];
    r.d[0] = proc.len() as u32 * 2;
    machine.execute_68k_trap(0xa71e, &mut r); // NewPtrSysClear()
    let proc_area = r.a[0];
    if proc_area != 0 {
        for (i, w) in proc.iter().enumerate() {
            macos_util::write_mac_u16(&mut machine.mem, proc_area + i as u32 * 2, *w);
        }
        machine.execute_68k(proc_area, &mut r);
        r.a[0] = proc_area;
        machine.execute_68k_trap(0xa01f, &mut r); // DisposePtr()
    }
    r.a[0] = scrap_area;
    machine.execute_68k_trap(0xa01f, &mut r); // DisposePtr()

    EmulOpOutcome::Continue
}

/// vCheckLoad() patch: let the host see every loaded resource.
fn op_check_load(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let res_type = regs.d[1];
    let id = macos_util::read_mac_u16(&mut machine.mem, regs.a[2]) as i16;
    if regs.a[0] == 0 {
        return EmulOpOutcome::Continue;
    }
    let adr = macos_util::read_mac_u32(&mut machine.mem, regs.a[0]);
    if adr == 0 {
        return EmulOpOutcome::Continue;
    }
    let size = macos_util::read_mac_u32(&mut machine.mem, adr.wrapping_sub(8)) & 0xff_ffff;
    let (bridges, mem) = machine.bridges_mem();
    bridges.resources.check_load(mem, res_type, id, adr, size);
    EmulOpOutcome::Continue
}

fn op_audio(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let err = machine.bridges.audio.dispatch(&mut machine.mem, regs.a[3], regs.a[4]);
    driver_result(regs, err)
}

fn op_extfs_comm(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let sp = regs.a[7];
    let selector = macos_util::read_mac_u16(&mut machine.mem, sp + 12);
    let param = macos_util::read_mac_u32(&mut machine.mem, sp + 8);
    let vcb = macos_util::read_mac_u32(&mut machine.mem, sp + 4);
    let (bridges, mem) = machine.bridges_mem();
    let err = bridges.extfs.comm(mem, selector, param, vcb);
    macos_util::write_mac_u16(&mut machine.mem, sp + 14, err as u16);
    EmulOpOutcome::Continue
}

fn op_extfs_hfs(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    let sp = regs.a[7];
    let vcb = macos_util::read_mac_u32(&mut machine.mem, sp + 16);
    let selector = macos_util::read_mac_u16(&mut machine.mem, sp + 14);
    let pb = macos_util::read_mac_u32(&mut machine.mem, sp + 10);
    let glob = macos_util::read_mac_u32(&mut machine.mem, sp + 6);
    let fsid = macos_util::read_mac_u16(&mut machine.mem, sp + 4);
    let (bridges, mem) = machine.bridges_mem();
    let err = bridges.extfs.hfs(mem, vcb, selector, pb, glob, fsid);
    macos_util::write_mac_u16(&mut machine.mem, sp + 20, err as u16);
    EmulOpOutcome::Continue
}

/// BlockMove() cache flush: no code caches to flush.
fn op_block_move(_: &mut Machine, _: &mut EmulOpRegs) -> EmulOpOutcome {
    EmulOpOutcome::Continue
}

fn op_debug_util(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    regs.d[0] = match regs.d[0] {
        macos_util::DU_DEBUGGER_GET_MAX => 3,
        macos_util::DU_DEBUGGER_ENTER => 0,
        macos_util::DU_DEBUGGER_EXIT => 0,
        macos_util::DU_DEBUGGER_POLL => {
            machine.bridges.adb.interrupt(&mut machine.mem);
            0
        },
        _ => crate::host::PARAM_ERR as u32,
    };
    EmulOpOutcome::Continue
}

/// SynchIdleTime() patch: sleep when no events are pending.
fn op_idle_time(machine: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    if macos_util::read_mac_u32(&mut machine.mem, low_mem::EVENT_QUEUE) == 0 {
        machine.idle_wait();
    }
    regs.a[0] = macos_util::read_mac_u32(&mut machine.mem, low_mem::UNIT_TABLE);
    EmulOpOutcome::Continue
}

fn op_suspend(_: &mut Machine, regs: &mut EmulOpRegs) -> EmulOpOutcome {
    eprintln!("*** Suspend\n{regs}");
    EmulOpOutcome::Continue
}
