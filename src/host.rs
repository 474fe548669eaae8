// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host collaborator interfaces.
//!
//! Everything the core needs from the surrounding program goes through these
//! traits: block drivers, SCSI, clipboard, preferences, alerts, ADB, audio,
//! video and the FPU. The null implementations answer like absent hardware,
//! which is enough to boot and to run the test suite.
//!
//! Collaborator failures are reported to the guest as OSErr values in the
//! parameter block, never as Rust errors.

use crate::memory::MemoryPlane;

use log::warn;

/// A Mac OS driver routine result.
pub type OsErr = i16;

pub const NO_ERR: OsErr = 0;
pub const CONTROL_ERR: OsErr = -17;
pub const STATUS_ERR: OsErr = -18;
pub const IO_ERR: OsErr = -36;
pub const PARAM_ERR: OsErr = -50;
pub const NS_DRV_ERR: OsErr = -56;
pub const OFFLINE_ERR: OsErr = -65;

/// A block driver exposing the Device Manager quartet.
///
/// `pb` is the guest address of the parameter block, `dce` the guest address
/// of the device control entry.
pub trait DriverBridge {
    fn open(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn prime(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn control(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn status(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;

    /// Only the sound input driver is ever closed.
    fn close(&mut self, _mem: &mut MemoryPlane, _pb: u32, _dce: u32) -> OsErr {
        NO_ERR
    }

    /// One-second housekeeping (disk change polling).
    fn interrupt(&mut self, _mem: &mut MemoryPlane) {}
}

/// A serial driver half; `port` selects .AIn/.AOut/.BIn/.BOut.
pub trait SerialBridge {
    fn open(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32, port: u32) -> OsErr;
    fn prime(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32, port: u32) -> OsErr;
    fn control(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32, port: u32) -> OsErr;
    fn status(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32, port: u32) -> OsErr;
    fn close(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32, port: u32) -> OsErr;

    fn interrupt(&mut self, _mem: &mut MemoryPlane) {}
}

/// The SCSI Manager backend behind the SCSIDispatch selectors.
pub trait ScsiBridge {
    fn reset(&mut self) -> u16;
    fn get(&mut self) -> u16;
    fn select(&mut self, id: u8) -> u16;
    fn cmd(&mut self, mem: &mut MemoryPlane, len: u16, ptr: u32) -> u16;
    fn complete(&mut self, mem: &mut MemoryPlane, timeout: u32, message: u32, stat: u32) -> u16;
    fn read(&mut self, mem: &mut MemoryPlane, tib: u32) -> u16;
    fn write(&mut self, mem: &mut MemoryPlane, tib: u32) -> u16;
    fn stat(&mut self) -> u16;
    fn mgr_busy(&mut self) -> u16;
}

/// Host clipboard access, already in host encoding (ISO-Latin-1, LF line
/// ends). The charset translation lives in [crate::clip].
pub trait ClipboardBridge {
    /// Publishes guest text to the host clipboard.
    fn put_text(&mut self, data: &[u8]);
    /// Reads the host clipboard if its content changed since the last
    /// [Self::put_text] from our side.
    fn get_text(&mut self) -> Option<Vec<u8>>;
}

/// Preference store: typed lookups by key, absent keys fall back to the
/// caller's defaults.
pub trait PrefsBridge {
    fn find_int32(&self, key: &str) -> Option<i32>;
    fn find_string(&self, key: &str) -> Option<String>;
    fn find_bool(&self, key: &str) -> Option<bool>;
}

/// Host GUI alerts, with a console fallback.
pub trait AlertBridge {
    fn error_alert(&mut self, message: &str);
    fn warning_alert(&mut self, message: &str);
}

/// ADB input source.
pub trait AdbBridge {
    /// ADBOp() host half: `data` is the in/out buffer from the guest.
    fn op(&mut self, code: u32, data: &mut [u8]);
    /// Mouse/keyboard poll, called from the interrupt walk.
    fn interrupt(&mut self, mem: &mut MemoryPlane);
}

/// Audio component dispatcher.
pub trait AudioBridge {
    fn dispatch(&mut self, mem: &mut MemoryPlane, params: u32, dce: u32) -> OsErr;
    fn interrupt(&mut self, _mem: &mut MemoryPlane) {}
}

/// Video output: the frame buffer lives in the memory plane, the host only
/// needs the VBL signal and mode bookkeeping.
pub trait VideoBridge {
    fn open(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn control(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn status(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn vbl(&mut self, mem: &mut MemoryPlane);
    /// Frame buffer size in bytes.
    fn frame_size(&self) -> u32;
}

/// Ethernet driver backend.
pub trait EtherBridge {
    fn open(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    fn control(&mut self, mem: &mut MemoryPlane, pb: u32, dce: u32) -> OsErr;
    /// Copies a received packet into the guest read structure.
    fn read_packet(&mut self, mem: &mut MemoryPlane, dest: u32, rha: u32, length: u32, remaining: u32);
    fn interrupt(&mut self, _mem: &mut MemoryPlane) {}
}

/// External (host directory) file system hooks.
pub trait ExtFsBridge {
    fn comm(&mut self, mem: &mut MemoryPlane, selector: u16, param: u32, vcb: u32) -> OsErr;
    fn hfs(&mut self, mem: &mut MemoryPlane, vcb: u32, selector: u16, pb: u32, glob: u32, fsid: u16) -> OsErr;
}

/// The floating-point coprocessor. F-line opcodes are offered here first; a
/// declined opcode raises vector 11 so the guest's SANE package handles it.
///
/// Any 68881/68882 condition-predicate behavior is this collaborator's
/// business and should be validated against the 68881 programmer's
/// reference, not against prior emulators.
pub trait FpuBridge {
    /// Returns true if the opcode was consumed (PC already advanced by the
    /// implementation through the regular fetch path).
    fn execute(&mut self, mem: &mut MemoryPlane, cpu: &mut crate::M68040, opcode: u16) -> bool;
}

/// Resource-loader hook: patch a resource after it is loaded.
pub trait ResourceBridge {
    fn check_load(&mut self, mem: &mut MemoryPlane, res_type: u32, res_id: i16, addr: u32, size: u32);
}

// Null implementations.

/// Driver that reports absent hardware.
#[derive(Default)]
pub struct NullDriver;

impl DriverBridge for NullDriver {
    fn open(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        NO_ERR
    }

    fn prime(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        OFFLINE_ERR
    }

    fn control(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        CONTROL_ERR
    }

    fn status(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        STATUS_ERR
    }
}

#[derive(Default)]
pub struct NullSerial;

impl SerialBridge for NullSerial {
    fn open(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> OsErr {
        OFFLINE_ERR
    }

    fn prime(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> OsErr {
        OFFLINE_ERR
    }

    fn control(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> OsErr {
        CONTROL_ERR
    }

    fn status(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> OsErr {
        STATUS_ERR
    }

    fn close(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> OsErr {
        NO_ERR
    }
}

/// SCSI bus with no devices attached.
#[derive(Default)]
pub struct NullScsi;

impl ScsiBridge for NullScsi {
    fn reset(&mut self) -> u16 {
        0
    }

    fn get(&mut self) -> u16 {
        0
    }

    fn select(&mut self, _: u8) -> u16 {
        2 // commErr: nothing answers selection.
    }

    fn cmd(&mut self, _: &mut MemoryPlane, _: u16, _: u32) -> u16 {
        2
    }

    fn complete(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32) -> u16 {
        2
    }

    fn read(&mut self, _: &mut MemoryPlane, _: u32) -> u16 {
        2
    }

    fn write(&mut self, _: &mut MemoryPlane, _: u32) -> u16 {
        2
    }

    fn stat(&mut self) -> u16 {
        0
    }

    fn mgr_busy(&mut self) -> u16 {
        0
    }
}

/// In-process clipboard, usable as a loopback in tests.
#[derive(Default)]
pub struct LocalClipboard {
    content: Vec<u8>,
    dirty: bool,
}

impl LocalClipboard {
    /// Simulates another application taking clipboard ownership.
    pub fn host_write(&mut self, data: &[u8]) {
        self.content = data.to_vec();
        self.dirty = true;
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl ClipboardBridge for LocalClipboard {
    fn put_text(&mut self, data: &[u8]) {
        self.content = data.to_vec();
        self.dirty = false;
    }

    fn get_text(&mut self) -> Option<Vec<u8>> {
        if self.dirty {
            self.dirty = false;
            Some(self.content.clone())
        } else {
            None
        }
    }
}

/// Key/value preferences held in memory.
#[derive(Default)]
pub struct MemPrefs {
    entries: Vec<(String, String)>,
}

impl MemPrefs {
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.push((key.to_string(), value.to_string()));
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

impl PrefsBridge for MemPrefs {
    fn find_int32(&self, key: &str) -> Option<i32> {
        self.get(key)?.parse().ok()
    }

    fn find_string(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    fn find_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            "true" | "1" | "yes" => Some(true),
            _ => Some(false),
        }
    }
}

/// Alerts on the log when no GUI is attached.
#[derive(Default)]
pub struct LogAlerts;

impl AlertBridge for LogAlerts {
    fn error_alert(&mut self, message: &str) {
        eprintln!("ERROR: {message}");
    }

    fn warning_alert(&mut self, message: &str) {
        warn!("{message}");
    }
}

#[derive(Default)]
pub struct NullAdb;

impl AdbBridge for NullAdb {
    fn op(&mut self, _: u32, _: &mut [u8]) {}

    fn interrupt(&mut self, _: &mut MemoryPlane) {}
}

#[derive(Default)]
pub struct NullAudio;

impl AudioBridge for NullAudio {
    fn dispatch(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        PARAM_ERR
    }
}

/// A fixed-size frame buffer nobody looks at.
pub struct HeadlessVideo {
    pub frame_size: u32,
}

impl Default for HeadlessVideo {
    fn default() -> Self {
        // 640x480 at 8 bits.
        Self { frame_size: 640 * 480 }
    }
}

impl VideoBridge for HeadlessVideo {
    fn open(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        NO_ERR
    }

    fn control(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        CONTROL_ERR
    }

    fn status(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        STATUS_ERR
    }

    fn vbl(&mut self, _: &mut MemoryPlane) {}

    fn frame_size(&self) -> u32 {
        self.frame_size
    }
}

#[derive(Default)]
pub struct NullEther;

impl EtherBridge for NullEther {
    fn open(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        OFFLINE_ERR
    }

    fn control(&mut self, _: &mut MemoryPlane, _: u32, _: u32) -> OsErr {
        CONTROL_ERR
    }

    fn read_packet(&mut self, _: &mut MemoryPlane, _: u32, _: u32, _: u32, _: u32) {}
}

#[derive(Default)]
pub struct NullExtFs;

impl ExtFsBridge for NullExtFs {
    fn comm(&mut self, _: &mut MemoryPlane, _: u16, _: u32, _: u32) -> OsErr {
        PARAM_ERR
    }

    fn hfs(&mut self, _: &mut MemoryPlane, _: u32, _: u16, _: u32, _: u32, _: u16) -> OsErr {
        PARAM_ERR
    }
}

/// No coprocessor fitted: every F-line opcode falls through to vector 11.
#[derive(Default)]
pub struct NullFpu;

impl FpuBridge for NullFpu {
    fn execute(&mut self, _: &mut MemoryPlane, _: &mut crate::M68040, _: u16) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NullResources;

impl ResourceBridge for NullResources {
    fn check_load(&mut self, _: &mut MemoryPlane, _: u32, _: i16, _: u32, _: u32) {}
}
