// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The emulated machine: CPU, memory plane, patched ROM, interrupt
//! producers and host collaborators under one owner.
//!
//! Producer threads only ever see clones of the atomic interrupt flags and
//! the quit flag; everything else stays on the emulation thread.

use crate::M68040;
use crate::emul_op::{self, EmulOpHandler, EmulOpOutcome, EmulOpRegs};
use crate::exception::{DoubleBusError, Exception, Vector};
use crate::host::*;
use crate::macos_util;
use crate::memory::{MemoryAccess, MemoryPlane, RamAllocError, ROM_BASE, SCRATCH_BASE};
use crate::rom_patches::{self, RomError};
use crate::timer::{self, InterruptFlags, Microseconds, TimeManager};
use crate::xpram::Xpram;

use log::{debug, error, info};

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Guest address of the EMUL_RETURN word `Execute68k` unwinds on.
const EXEC_RETURN_ADDR: u32 = SCRATCH_BASE;
/// Guest address of the two-word stub `Execute68kTrap` runs.
const TRAP_STUB_ADDR: u32 = SCRATCH_BASE + 8;

/// Static machine configuration.
#[derive(Clone, Debug)]
pub struct MachineConfig {
    /// Requested RAM size in bytes.
    pub ram_size: u32,
    /// Gestalt model ID written into UniversalInfo.
    pub model_id: u8,
    /// Whether to report an FPU to the guest.
    pub fpu: bool,
    /// Skip the CD-ROM driver.
    pub nocdrom: bool,
    /// XPRAM backing file.
    pub xpram_path: Option<PathBuf>,
    /// Boot volume and boot driver words for XPRAM.
    pub boot_drive: i16,
    pub boot_driver: i16,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            ram_size: 8 * 1024 * 1024,
            model_id: 5,
            fpu: false,
            nocdrom: false,
            xpram_path: None,
            boot_drive: 0,
            boot_driver: 0,
        }
    }
}

impl MachineConfig {
    /// Reads the configuration from a preference store, with the defaults
    /// above for missing keys.
    pub fn from_prefs(prefs: &dyn PrefsBridge) -> Self {
        let defaults = Self::default();
        Self {
            ram_size: prefs.find_int32("ramsize").map(|v| v as u32).unwrap_or(defaults.ram_size),
            model_id: prefs.find_int32("modelid").map(|v| v as u8).unwrap_or(defaults.model_id),
            fpu: prefs.find_bool("fpu").unwrap_or(defaults.fpu),
            nocdrom: prefs.find_bool("nocdrom").unwrap_or(defaults.nocdrom),
            xpram_path: prefs.find_string("xpram").map(PathBuf::from),
            boot_drive: prefs.find_int32("bootdrive").unwrap_or(0) as i16,
            boot_driver: prefs.find_int32("bootdriver").unwrap_or(0) as i16,
        }
    }
}

/// The host collaborators, one slot per external service.
pub struct Bridges {
    pub sony: Box<dyn DriverBridge>,
    pub disk: Box<dyn DriverBridge>,
    pub cdrom: Box<dyn DriverBridge>,
    pub sound_in: Box<dyn DriverBridge>,
    pub serial: Box<dyn SerialBridge>,
    pub ether: Box<dyn EtherBridge>,
    pub scsi: Box<dyn ScsiBridge>,
    pub clipboard: Box<dyn ClipboardBridge>,
    pub alerts: Box<dyn AlertBridge>,
    pub adb: Box<dyn AdbBridge>,
    pub audio: Box<dyn AudioBridge>,
    pub video: Box<dyn VideoBridge>,
    pub extfs: Box<dyn ExtFsBridge>,
    pub fpu: Box<dyn FpuBridge>,
    pub resources: Box<dyn ResourceBridge>,
}

impl Default for Bridges {
    fn default() -> Self {
        Self {
            sony: Box::new(NullDriver),
            disk: Box::new(NullDriver),
            cdrom: Box::new(NullDriver),
            sound_in: Box::new(NullDriver),
            serial: Box::new(NullSerial),
            ether: Box::new(NullEther),
            scsi: Box::new(NullScsi),
            clipboard: Box::new(LocalClipboard::default()),
            alerts: Box::new(LogAlerts),
            adb: Box::new(NullAdb),
            audio: Box::new(NullAudio),
            video: Box::new(HeadlessVideo::default()),
            extfs: Box::new(NullExtFs),
            fpu: Box::new(NullFpu),
            resources: Box::new(NullResources),
        }
    }
}

/// Where the patcher left its marks, needed later by the escape handlers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RomInfo {
    pub version: u16,
    /// ROM offset of UniversalInfo.
    pub universal_info: u32,
    /// ROM offset of the .Sony driver slot.
    pub sony_offset: u32,
    /// ROM offset of the SERD resource.
    pub serd_offset: u32,
    /// ROM offset of the generated Microseconds() routine.
    pub microseconds_offset: u32,
    /// ROM offset of the generated DebugUtil() routine.
    pub debugutil_offset: u32,
    /// Mac address of the PutScrap() patch.
    pub put_scrap_patch: u32,
    /// Mac address of the GetScrap() patch.
    pub get_scrap_patch: u32,
}

/// Fatal machine faults. Exit codes follow the convention: 1 for init
/// failures, 2 for an unhandled double bus error.
#[derive(Debug)]
pub enum MachineError {
    Ram(RamAllocError),
    Rom(RomError),
    DoubleBus(DoubleBusError),
}

impl MachineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Ram(_) | Self::Rom(_) => 1,
            Self::DoubleBus(_) => 2,
        }
    }
}

impl std::fmt::Display for MachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ram(e) => e.fmt(f),
            Self::Rom(e) => e.fmt(f),
            Self::DoubleBus(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for MachineError {}

impl From<RomError> for MachineError {
    fn from(e: RomError) -> Self {
        Self::Rom(e)
    }
}

/// An emulated Macintosh.
pub struct Machine {
    pub cpu: M68040,
    pub mem: MemoryPlane,
    pub flags: InterruptFlags,
    pub xpram: Xpram,
    pub(crate) config: MachineConfig,
    pub(crate) bridges: Bridges,
    pub(crate) rom_info: RomInfo,
    pub(crate) time_manager: TimeManager,
    pub(crate) microseconds: Microseconds,
    pub(crate) clip: crate::clip::ClipState,
    pub(crate) tick_inhibit: bool,
    quit: Arc<AtomicBool>,
    emul_ops: Box<[EmulOpHandler; 256]>,
    current_escape: u16,
    fatal: Option<DoubleBusError>,
    producers: Vec<thread::JoinHandle<()>>,
}

impl Machine {
    /// Allocates the machine. Nothing runs until a ROM is loaded and
    /// [Self::power_on] is called.
    pub fn new(config: MachineConfig, bridges: Bridges) -> Result<Self, MachineError> {
        let frame_size = bridges.video.frame_size();
        let mem = MemoryPlane::new(config.ram_size, frame_size).map_err(MachineError::Ram)?;
        info!("RAM size {:#x} bytes", mem.ram_size());

        let xpram = Xpram::open(config.xpram_path.clone());
        xpram.set_boot_volume(config.boot_drive, config.boot_driver);
        xpram.set_video_mode(0x81); // Default: second depth (the 640x480x8 mode).

        let flags = InterruptFlags::new();
        let time_manager = TimeManager::new(flags.clone());

        Ok(Self {
            cpu: M68040::new(),
            mem,
            flags,
            xpram,
            config,
            bridges,
            rom_info: RomInfo::default(),
            time_manager,
            microseconds: Microseconds::default(),
            clip: crate::clip::ClipState::default(),
            tick_inhibit: false,
            quit: Arc::new(AtomicBool::new(false)),
            emul_ops: emul_op::handler_table(),
            current_escape: 0,
            fatal: None,
            producers: Vec::new(),
        })
    }

    /// Decodes, verifies and patches a ROM image, then seals it.
    pub fn load_rom(&mut self, image: &[u8]) -> Result<(), MachineError> {
        let rom = match rom_patches::decode_rom(image) {
            Ok(rom) => rom,
            Err(e) => {
                self.bridges.alerts.error_alert(&e.to_string());
                return Err(e.into());
            },
        };
        self.mem.load_rom(rom);

        let patch_config = rom_patches::PatchConfig {
            model_id: self.config.model_id,
            fpu: self.config.fpu,
            frame_base: crate::memory::FRAME_BASE,
        };
        self.rom_info = match rom_patches::patch_rom(&mut self.mem, &patch_config) {
            Ok(info) => info,
            Err(e) => {
                self.bridges.alerts.error_alert(&e.to_string());
                return Err(e.into());
            },
        };
        self.mem.seal_rom();
        Ok(())
    }

    /// Puts the machine into its power-on state: LowMem cleared, scratch
    /// thunks written, CPU at the ROM entry point.
    pub fn power_on(&mut self) {
        self.mem.clear_low_mem();

        macos_util::write_mac_u16(&mut self.mem, EXEC_RETURN_ADDR, crate::assembler::emul_op(emul_op::EmulOp::ExecReturn as u8));

        self.cpu.reset();
        self.cpu.regs.a[7] = 0x2000;
        self.cpu.regs.pc = ROM_BASE + 0x2a;
        debug!("starting 680x0 at {:#x}", self.cpu.regs.pc);
    }

    /// Starts the interrupt producer threads.
    pub fn spawn_producers(&mut self) {
        self.producers.push(timer::spawn_tick_thread(self.flags.clone(), self.quit.clone()));
        self.producers.push(self.xpram.spawn_watchdog(self.quit.clone()));
    }

    /// A handle other threads can raise to stop the machine.
    pub fn quit_flag(&self) -> Arc<AtomicBool> {
        self.quit.clone()
    }

    /// Runs until shutdown. Returns the process exit code on a clean exit.
    pub fn run(&mut self) -> Result<i32, MachineError> {
        let result = loop {
            match self.step() {
                Ok(EmulOpOutcome::Quit) => break Ok(0),
                Ok(_) => {},
                Err(e) => break Err(e),
            }
            if let Some(e) = self.fatal.take() {
                break Err(MachineError::DoubleBus(e));
            }
        };

        self.quit.store(true, Ordering::SeqCst);
        for handle in self.producers.drain(..) {
            let _ = handle.join();
        }
        self.xpram.save();
        result
    }

    /// One machine step: at most one instruction, escape or interrupt.
    pub(crate) fn step(&mut self) -> Result<EmulOpOutcome, MachineError> {
        if self.quit.load(Ordering::Relaxed) {
            return Ok(EmulOpOutcome::Quit);
        }

        // A deliverable exception takes over before the word at PC means
        // anything; masked interrupts keep waiting in the set.
        if self.cpu.has_deliverable_exception() {
            self.cpu.interpreter(&mut self.mem).map_err(MachineError::DoubleBus)?;
            self.deliver_interrupts();
            return Ok(EmulOpOutcome::Continue);
        }

        if self.cpu.stopped {
            let level = self.flags.level();
            if level == 0 || !self.cpu.interrupt_deliverable(level) {
                // Stopped with nothing deliverable: nap and retry.
                thread::sleep(Duration::from_millis(1));
            } else {
                self.deliver_interrupts();
            }
            return Ok(EmulOpOutcome::Continue);
        }

        let pc = self.cpu.regs.pc;
        match self.mem.get_word(pc) {
            Some(op) if op & 0xff00 == 0x7100 => {
                self.cpu.instruction_pc = pc;
                self.cpu.regs.pc = pc.wrapping_add(2);
                let outcome = self.dispatch_escape(op);
                if outcome != EmulOpOutcome::Continue {
                    return Ok(outcome);
                }
            },
            Some(op) if op & 0xf000 == 0xf000 => {
                // Offer coprocessor opcodes to the FPU first.
                let Machine { bridges, mem, cpu, .. } = self;
                if !bridges.fpu.execute(mem, cpu, op) {
                    self.cpu.interpreter(&mut self.mem).map_err(MachineError::DoubleBus)?;
                }
            },
            _ => {
                self.cpu.interpreter(&mut self.mem).map_err(MachineError::DoubleBus)?;
            },
        }

        self.deliver_interrupts();
        Ok(EmulOpOutcome::Continue)
    }

    /// Runs one escape opcode with a register snapshot.
    fn dispatch_escape(&mut self, opcode: u16) -> EmulOpOutcome {
        self.current_escape = opcode;

        let mut regs = EmulOpRegs {
            d: self.cpu.regs.d,
            a: self.cpu.regs.a,
            sr: self.cpu.sr(),
        };

        let handler = self.emul_ops[(opcode & 0xff) as usize];
        let outcome = handler(self, &mut regs);

        self.cpu.regs.d = regs.d;
        self.cpu.regs.a = regs.a;
        self.cpu.set_sr(regs.sr);

        outcome
    }

    /// Samples the interrupt flags and raises the autovector exception when
    /// the pending level beats the mask.
    fn deliver_interrupts(&mut self) {
        let level = self.flags.level();
        if level != 0 && self.cpu.interrupt_deliverable(level) {
            self.cpu.exception(Exception::from(Vector::SpuriousInterrupt as u8 + level));
        }
    }

    /// Executes a 68k subroutine from inside an escape handler. The inner
    /// run ends when the pushed EMUL_RETURN address is reached.
    pub(crate) fn execute_68k(&mut self, addr: u32, regs: &mut EmulOpRegs) {
        let saved_regs = self.cpu.regs;
        let saved_stopped = self.cpu.stopped;

        self.cpu.regs.d = regs.d;
        self.cpu.regs.a[..7].copy_from_slice(&regs.a[..7]);
        self.cpu.stopped = false;

        let sp = self.cpu.regs.a[7].wrapping_sub(4);
        macos_util::write_mac_u32(&mut self.mem, sp, EXEC_RETURN_ADDR);
        self.cpu.regs.a[7] = sp;
        self.cpu.regs.pc = addr;

        loop {
            match self.step() {
                Ok(EmulOpOutcome::ExecReturn) => break,
                Ok(EmulOpOutcome::Quit) => {
                    self.quit.store(true, Ordering::SeqCst);
                    break;
                },
                Ok(EmulOpOutcome::Continue) => {},
                Err(MachineError::DoubleBus(e)) => {
                    error!("double bus error inside Execute68k");
                    self.fatal = Some(e);
                    break;
                },
                Err(_) => break,
            }
        }

        regs.d = self.cpu.regs.d;
        regs.a[..7].copy_from_slice(&self.cpu.regs.a[..7]);

        self.cpu.regs = saved_regs;
        self.cpu.stopped = saved_stopped;
    }

    /// Executes a MacOS trap from inside an escape handler, through a
    /// two-word stub in scratch memory.
    pub(crate) fn execute_68k_trap(&mut self, trap: u16, regs: &mut EmulOpRegs) {
        macos_util::write_mac_u16(&mut self.mem, TRAP_STUB_ADDR, trap);
        macos_util::write_mac_u16(&mut self.mem, TRAP_STUB_ADDR + 2, crate::assembler::emul_op(emul_op::EmulOp::ExecReturn as u8));
        self.execute_68k(TRAP_STUB_ADDR, regs);
    }

    /// Runs the due Time Manager tasks on the 68k side.
    pub(crate) fn run_timer_tasks(&mut self) {
        for (task, addr_field) in self.time_manager.expired() {
            let entry = macos_util::read_mac_u32(&mut self.mem, addr_field);
            if entry != 0 {
                let mut r = EmulOpRegs { a: [0; 8], d: [0; 8], sr: 0x2000 };
                r.a[0] = entry;
                r.a[1] = task;
                self.execute_68k(entry, &mut r);
            }
        }
    }

    pub(crate) fn trigger_nmi(&mut self) {
        self.cpu.exception(Exception::from(Vector::Level7Interrupt));
    }

    /// Naps until an interrupt shows up, bounded to keep the guest lively.
    pub(crate) fn idle_wait(&mut self) {
        for _ in 0..10 {
            if self.flags.pending() != 0 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Re-initializes the replaceable subsystems on a MacOS reset.
    pub(crate) fn reset_subsystems(&mut self) {
        self.time_manager = TimeManager::new(self.flags.clone());
        self.microseconds = Microseconds::default();
    }

    pub(crate) fn current_escape(&self) -> u16 {
        self.current_escape
    }

    /// Splits the borrow for handlers that pass memory into a bridge.
    pub(crate) fn bridges_mem(&mut self) -> (&mut Bridges, &mut MemoryPlane) {
        (&mut self.bridges, &mut self.mem)
    }
}
