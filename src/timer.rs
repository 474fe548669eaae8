// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interrupt production and the Time Manager replacement.
//!
//! `InterruptFlags` is the only state shared between the emulation thread
//! and the producers; every mutation is a single atomic bit operation.
//! Producers set their bit, the IRQ escape clears it before servicing, so
//! each event is delivered at most once.

use crate::host::{NO_ERR, OsErr, PARAM_ERR};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// 60.15 Hz tick (VIA timer 1 rate).
pub const TICK_PERIOD: Duration = Duration::from_micros(16_625);

pub const INT_60HZ: u32 = 1;
pub const INT_1HZ: u32 = 2;
pub const INT_SERIAL: u32 = 4;
pub const INT_ETHER: u32 = 8;
pub const INT_AUDIO: u32 = 16;
pub const INT_TIMER: u32 = 32;
pub const INT_ADB: u32 = 64;
pub const INT_NMI: u32 = 128;

/// The shared interrupt bit set.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlags(Arc<AtomicU32>);

impl InterruptFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises bits; callable from any thread.
    pub fn set(&self, bits: u32) {
        self.0.fetch_or(bits, Ordering::SeqCst);
    }

    /// The currently pending bits.
    pub fn pending(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears a bit, reporting whether it was pending. The caller services
    /// the source only on true, after the clear.
    pub fn take(&self, bit: u32) -> bool {
        self.0.fetch_and(!bit, Ordering::SeqCst) & bit != 0
    }

    /// The interrupt level the pending bits assert: SERIAL drives the SCC at
    /// level 5, NMI is level 7, everything else arrives over the VIA at
    /// level 1.
    pub fn level(&self) -> u8 {
        let pending = self.pending();
        if pending & INT_NMI != 0 {
            7
        } else if pending & INT_SERIAL != 0 {
            5
        } else if pending != 0 {
            1
        } else {
            0
        }
    }
}

/// Spawns the 60.15 Hz tick producer. Every 60th tick also posts the
/// one-second interrupt.
pub fn spawn_tick_thread(flags: InterruptFlags, quit: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::Builder::new().name("60Hz".into()).spawn(move || {
        let mut next = Instant::now() + TICK_PERIOD;
        let mut ticks = 0u32;
        while !quit.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next {
                thread::sleep(next - now);
            }
            next += TICK_PERIOD;

            ticks += 1;
            if ticks == 60 {
                ticks = 0;
                flags.set(INT_60HZ | INT_1HZ);
            } else {
                flags.set(INT_60HZ);
            }
        }
    }).expect("spawning the tick thread")
}

/// Guest TMTask field offsets.
const TM_ADDR: u32 = 6;

/// One armed Time Manager task.
struct TmTask {
    /// Guest address of the TMTask record.
    addr: u32,
    /// Host deadline; None while inserted but not primed.
    deadline: Option<Instant>,
}

/// Replacement Time Manager.
///
/// The ROM's InsTime/RmvTime/PrimeTime traps are patched to escape here;
/// expired tasks are executed from the interrupt walk with `Execute68k`.
#[derive(Default)]
pub struct TimeManager {
    tasks: Vec<TmTask>,
    flags: InterruptFlags,
}

impl TimeManager {
    pub fn new(flags: InterruptFlags) -> Self {
        Self { tasks: Vec::new(), flags }
    }

    /// InsTime(): registers a task.
    pub fn ins_time(&mut self, task_addr: u32) -> OsErr {
        if self.tasks.iter().any(|t| t.addr == task_addr) {
            return NO_ERR; // Already inserted; the record is reused.
        }
        self.tasks.push(TmTask { addr: task_addr, deadline: None });
        NO_ERR
    }

    /// RmvTime(): unregisters a task.
    pub fn rmv_time(&mut self, task_addr: u32) -> OsErr {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.addr != task_addr);
        if self.tasks.len() == before {
            PARAM_ERR
        } else {
            NO_ERR
        }
    }

    /// PrimeTime(): arms a task. Positive counts are milliseconds, negative
    /// counts are microseconds.
    pub fn prime_time(&mut self, task_addr: u32, count: i32) -> OsErr {
        let delay = if count >= 0 {
            Duration::from_millis(count as u64)
        } else {
            Duration::from_micros((-(count as i64)) as u64)
        };

        let deadline = Instant::now() + delay;
        match self.tasks.iter_mut().find(|t| t.addr == task_addr) {
            Some(task) => task.deadline = Some(deadline),
            // PrimeTime on a task that was never inserted arms it anyway.
            None => self.tasks.push(TmTask { addr: task_addr, deadline: Some(deadline) }),
        }

        self.flags.set(INT_TIMER);
        NO_ERR
    }

    /// Drains the expired tasks, returning the guest addresses of their
    /// service routines paired with the TMTask records.
    pub fn expired(&mut self) -> Vec<(u32, u32)> {
        let now = Instant::now();
        let mut due = Vec::new();
        for task in &mut self.tasks {
            if task.deadline.map(|d| d <= now).unwrap_or(false) {
                task.deadline = None;
                due.push((task.addr, task.addr + TM_ADDR));
            }
        }
        if self.tasks.iter().any(|t| t.deadline.is_some()) {
            self.flags.set(INT_TIMER);
        }
        due
    }
}

/// Microseconds() source: a monotonic 64-bit microsecond counter.
pub struct Microseconds {
    origin: Instant,
}

impl Default for Microseconds {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Microseconds {
    /// Returns (high, low) halves the trap hands back in A0/D0.
    pub fn sample(&self) -> (u32, u32) {
        let us = self.origin.elapsed().as_micros() as u64;
        ((us >> 32) as u32, us as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_take_clears_exactly_one_bit() {
        let flags = InterruptFlags::new();
        flags.set(INT_60HZ | INT_1HZ);
        assert!(flags.take(INT_60HZ));
        assert!(!flags.take(INT_60HZ));
        assert_eq!(flags.pending(), INT_1HZ);
    }

    #[test]
    fn interrupt_levels() {
        let flags = InterruptFlags::new();
        assert_eq!(flags.level(), 0);
        flags.set(INT_1HZ);
        assert_eq!(flags.level(), 1);
        flags.set(INT_SERIAL);
        assert_eq!(flags.level(), 5);
        flags.set(INT_NMI);
        assert_eq!(flags.level(), 7);
    }

    #[test]
    fn prime_time_and_expiry() {
        let mut tm = TimeManager::new(InterruptFlags::new());
        assert_eq!(tm.ins_time(0x1000), NO_ERR);
        assert_eq!(tm.prime_time(0x1000, -100), NO_ERR); // 100 us
        std::thread::sleep(Duration::from_millis(2));
        let due = tm.expired();
        assert_eq!(due, [(0x1000, 0x1006)]);
        // A drained task does not fire twice.
        assert!(tm.expired().is_empty());
        assert_eq!(tm.rmv_time(0x1000), NO_ERR);
        assert_eq!(tm.rmv_time(0x1000), PARAM_ERR);
    }
}
