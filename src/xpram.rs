// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extended Parameter RAM, backed by an 8 KiB host file.
//!
//! The classic 256-byte PRAM block lives at the start of the image; the
//! `NuMc` signature at offset 0x0c marks a valid file. A watchdog thread
//! polls once a second and flushes to disk at most once a minute when the
//! contents changed.

use log::{debug, warn};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Size of the XPRAM image.
pub const XPRAM_SIZE: usize = 0x2000;

/// Offset of the `NuMc` signature.
const SIGNATURE_OFFSET: usize = 0x0c;
const SIGNATURE: [u8; 4] = *b"NuMc";

/// Watchdog poll cadence.
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Minimum spacing between two flushes.
const FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// The nonvolatile store, sharable with the watchdog thread.
#[derive(Clone)]
pub struct Xpram {
    data: Arc<Mutex<Box<[u8; XPRAM_SIZE]>>>,
    path: Option<PathBuf>,
}

impl Xpram {
    /// Loads the backing file (when given), installing default contents if
    /// the signature is missing.
    pub fn open(path: Option<PathBuf>) -> Self {
        let mut data = Box::new([0u8; XPRAM_SIZE]);

        if let Some(p) = &path {
            match std::fs::read(p) {
                Ok(file) => {
                    let n = file.len().min(XPRAM_SIZE);
                    data[..n].copy_from_slice(&file[..n]);
                },
                Err(e) => debug!("XPRAM file {}: {e}", p.display()),
            }
        }

        if data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4] != SIGNATURE {
            debug!("loading XPRAM default values");
            write_defaults(&mut data);
        }

        Self {
            data: Arc::new(Mutex::new(data)),
            path,
        }
    }

    /// Sets the boot volume and boot driver words from the preferences.
    pub fn set_boot_volume(&self, bootdrive: i16, bootdriver: i16) {
        let mut data = self.data.lock().unwrap();
        data[0x78] = (bootdrive >> 8) as u8;
        data[0x79] = bootdrive as u8;
        data[0x7a] = (bootdriver >> 8) as u8;
        data[0x7b] = bootdriver as u8;
    }

    /// Sets the default video mode bytes.
    pub fn set_video_mode(&self, apple_mode: u8) {
        let mut data = self.data.lock().unwrap();
        data[0x56] = b'B';
        data[0x57] = b'2';
        data[0x58] = apple_mode;
        data[0x59] = 0;
    }

    pub fn read(&self, reg: u16) -> u8 {
        self.data.lock().unwrap()[reg as usize % XPRAM_SIZE]
    }

    pub fn write(&self, reg: u16, value: u8) {
        self.data.lock().unwrap()[reg as usize % XPRAM_SIZE] = value;
    }

    /// Serializes the image to the backing file.
    pub fn save(&self) {
        let Some(path) = &self.path else { return };
        let data = self.data.lock().unwrap();
        if let Err(e) = std::fs::write(path, data.as_slice()) {
            warn!("XPRAM flush to {} failed: {e}", path.display());
        }
    }

    /// Spawns the watchdog thread. It exits when `quit` is raised.
    pub fn spawn_watchdog(&self, quit: Arc<AtomicBool>) -> thread::JoinHandle<()> {
        let xpram = self.clone();
        thread::Builder::new().name("xpram".into()).spawn(move || {
            let mut snapshot = **xpram.data.lock().unwrap();
            let mut last_flush = Instant::now();
            while !quit.load(Ordering::Relaxed) {
                thread::sleep(POLL_INTERVAL);
                let changed = {
                    let data = xpram.data.lock().unwrap();
                    data.as_slice() != snapshot.as_slice()
                };
                if changed && last_flush.elapsed() >= FLUSH_INTERVAL {
                    snapshot = **xpram.data.lock().unwrap();
                    xpram.save();
                    last_flush = Instant::now();
                }
            }
            xpram.save();
        }).expect("spawning the XPRAM watchdog")
    }
}

/// Factory contents: LocalTalk off, boot from the internal drive, 32-bit
/// mode on, DynWait so boot does not stall probing SCSI.
fn write_defaults(data: &mut [u8; XPRAM_SIZE]) {
    data[..0x100].fill(0);
    data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4].copy_from_slice(&SIGNATURE);
    data[0x01] = 0x80; // InternalWaitFlags = DynWait
    data[0x10] = 0xa8; // Standard PRAM values
    data[0x11] = 0x00;
    data[0x12] = 0x00;
    data[0x13] = 0x22;
    data[0x14] = 0xcc;
    data[0x15] = 0x0a;
    data[0x16] = 0xcc;
    data[0x17] = 0x0a;
    data[0x1c] = 0x00;
    data[0x1d] = 0x02;
    data[0x1e] = 0x63;
    data[0x1f] = 0x00;
    data[0x08] = 0x13;
    data[0x09] = 0x88;
    data[0x0a] = 0x00;
    data[0x0b] = 0xcc;
    data[0x76] = 0x00; // OSDefault = MacOS
    data[0x77] = 0x01;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_written_when_signature_missing() {
        let xpram = Xpram::open(None);
        assert_eq!(xpram.read(0x0c), b'N');
        assert_eq!(xpram.read(0x0f), b'c');
        assert_eq!(xpram.read(0x77), 0x01);
    }

    #[test]
    fn round_trip_through_backing_file() {
        let path = std::env::temp_dir().join(format!("xpram-test-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let xpram = Xpram::open(Some(path.clone()));
        xpram.write(0xe4, 0x5a);
        xpram.save();

        let again = Xpram::open(Some(path.clone()));
        assert_eq!(again.read(0xe4), 0x5a);
        assert_eq!(again.read(0x0c), b'N');

        let _ = std::fs::remove_file(&path);
    }
}
