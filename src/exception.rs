// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exception processing.

use crate::{M68040, MemoryAccess};

use std::cmp::Ordering;

/// Constant equal to the AccessError vector.
pub const ACCESS_ERROR: u8 = Vector::AccessError as u8;
/// Constant equal to the AddressError vector.
pub const ADDRESS_ERROR: u8 = Vector::AddressError as u8;

/// Exception vectors of the 68040.
///
/// You can directly cast the enum to u8 to get the vector number.
/// ```
/// use mac68k::exception::Vector;
/// assert_eq!(Vector::AccessError as u8, 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Vector {
    ResetSspPc = 0,
    /// Bus error. Sent when the accessed address is not in the memory map.
    AccessError = 2,
    AddressError,
    IllegalInstruction,
    ZeroDivide,
    ChkInstruction,
    TrapVInstruction,
    PrivilegeViolation,
    Trace,
    LineAEmulator,
    LineFEmulator,
    FormatError = 14,
    UninitializedInterrupt,
    /// Taken when a bus error occurs during interrupt processing.
    SpuriousInterrupt = 24,
    Level1Interrupt,
    Level2Interrupt,
    Level3Interrupt,
    Level4Interrupt,
    Level5Interrupt,
    Level6Interrupt,
    Level7Interrupt,
    Trap0Instruction,
    Trap1Instruction,
    Trap2Instruction,
    Trap3Instruction,
    Trap4Instruction,
    Trap5Instruction,
    Trap6Instruction,
    Trap7Instruction,
    Trap8Instruction,
    Trap9Instruction,
    Trap10Instruction,
    Trap11Instruction,
    Trap12Instruction,
    Trap13Instruction,
    Trap14Instruction,
    Trap15Instruction,
}

const fn vector_priority(vector: u8) -> u8 {
    match vector {
        3 => 0,       // Address error.
        2 => 1,       // Access error.
        9 => 2,       // Trace.
        24..=31 => 3, // Interrupt.
        4 => 4,       // Illegal.
        8 => 5,       // Privilege.
        // Reset has the highest priority of all but is given a high number
        // so it is popped first; its processing clears everything pending.
        _ => u8::MAX,
    }
}

const fn is_interrupt(vector: u8) -> bool {
    vector >= Vector::SpuriousInterrupt as u8 && vector <= Vector::Level7Interrupt as u8
}

/// M68040 exception, with a vector number and a priority.
///
/// This struct implements `From<u8>` and `From<Vector>`, to create an
/// exception from the raw vector number or from the named vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Exception {
    pub vector: u8,
    /// Lower means higher priority.
    priority: u8,
}

impl Exception {
    #[inline]
    pub const fn is_interrupt(&self) -> bool {
        is_interrupt(self.vector)
    }
}

impl From<u8> for Exception {
    fn from(vector: u8) -> Self {
        Self { vector, priority: vector_priority(vector) }
    }
}

impl From<Vector> for Exception {
    fn from(vector: Vector) -> Self {
        Self::from(vector as u8)
    }
}

impl PartialOrd for Exception {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Exception {
    /// For BTreeSet, compare by actual priority and not by the value itself,
    /// so a higher number means less priority. Ties iterate low vector
    /// first, which stacks a low interrupt level under a higher one.
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority).then(self.vector.cmp(&other.vector))
    }
}

/// A bus or address error occurred while the access-error stack frame was
/// being built. There is no way to recover; the machine must stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoubleBusError;

impl std::fmt::Display for DoubleBusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "double bus error while building an access error stack frame")
    }
}

impl std::error::Error for DoubleBusError {}

impl M68040 {
    /// Requests the CPU to process the given exception.
    pub fn exception(&mut self, ex: Exception) {
        if ex.vector == Vector::ResetSspPc as u8 ||
           ex.vector == Vector::Trace as u8 ||
           ex.is_interrupt() {
            self.stopped = false;
        }

        self.exceptions.insert(ex);
    }

    /// True if an exception is waiting to be processed.
    pub fn has_pending_exception(&self) -> bool {
        !self.exceptions.is_empty()
    }

    /// True if a pending exception would actually be taken right now.
    /// Interrupts below the mask wait and do not count.
    pub fn has_deliverable_exception(&self) -> bool {
        let mask = self.regs.sr.interrupt_mask;
        self.exceptions.iter().any(|ex| {
            if ex.is_interrupt() {
                let level = ex.vector & 7;
                level == 7 || level > mask
            } else {
                true
            }
        })
    }

    /// Attempts to process all the pending exceptions.
    pub(crate) fn process_pending_exceptions<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> Result<(), DoubleBusError> {
        // Masked interrupts stay pending; everything else is drained now.
        let mask = self.regs.sr.interrupt_mask;
        let ready: Vec<Exception> = self.exceptions.iter().copied().filter(|ex| {
            if ex.is_interrupt() {
                let level = ex.vector & 7;
                level == 7 || level > mask
            } else {
                true
            }
        }).collect();

        // Iterate from the lowest priority to the highest, so that once all
        // frames are stacked the highest-priority one is dispatched first.
        for ex in ready.iter() {
            self.exceptions.remove(ex);

            if ex.vector == Vector::ResetSspPc as u8 {
                // The reset vector clears all the pending exceptions.
                self.exceptions.clear();
                return Ok(());
            }

            if let Err(e) = self.process_exception(memory, ex.vector) {
                if e == ACCESS_ERROR || e == ADDRESS_ERROR {
                    if ex.vector == ACCESS_ERROR {
                        return Err(DoubleBusError);
                    }
                    if ex.is_interrupt() {
                        self.exception(Exception::from(Vector::SpuriousInterrupt));
                    } else {
                        self.exception(Exception::from(e));
                    }
                } else {
                    self.exception(Exception::from(e));
                }
            }
        }

        Ok(())
    }

    /// Effectively processes an exception: builds the stack frame and loads
    /// the new PC through VBR.
    fn process_exception<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, vector: u8) -> Result<(), u8> {
        let sr: u16 = self.regs.sr.into();
        let current_pc = self.regs.pc;

        if !self.regs.sr.s {
            self.regs.usp = self.regs.a[7];
            self.regs.a[7] = if self.regs.sr.m { self.regs.msp } else { self.regs.isp };
            self.regs.sr.s = true;
            self.sync_emulated_sr();
        }

        match vector {
            2 => {
                // 68040 access error, format $7.
                self.push_long(memory, 0)?; // PD3
                self.push_long(memory, 0)?; // PD2
                self.push_long(memory, 0)?; // PD1
                self.push_long(memory, 0)?; // PD0/WB1D
                self.push_long(memory, 0)?; // WB1A
                self.push_long(memory, 0)?; // WB2D
                self.push_long(memory, 0)?; // WB2A
                self.push_long(memory, 0)?; // WB3D
                self.push_long(memory, self.bus_fault_addr)?; // WB3A
                self.push_long(memory, self.bus_fault_addr)?;
                self.push_word(memory, 0)?; // WB1S
                self.push_word(memory, 0)?; // WB2S
                self.push_word(memory, 0)?; // WB3S
                self.push_word(memory, self.bus_fault_ssw)?;
                self.push_long(memory, self.bus_fault_addr)?; // EA
                self.push_frame(memory, 7, vector, sr, self.fault_pc)?;
            },
            3 => {
                self.push_long(memory, self.exception3_addr & 0xffff_fffe)?;
                self.push_frame(memory, 2, vector, sr, self.exception3_pc)?;
            },
            5 | 6 | 7 | 9 => {
                // Zero divide, CHK, TRAPcc/TRAPV and trace record the
                // address of the instruction that caused them.
                self.push_long(memory, self.instruction_pc)?;
                self.push_frame(memory, 2, vector, sr, current_pc)?;
            },
            4 | 8 | 10 | 11 => {
                // Illegal, privilege-violating and unimplemented
                // instructions stack their own address so the handler can
                // decode them.
                self.push_frame(memory, 0, vector, sr, self.instruction_pc)?;
            },
            24..=31 if self.regs.sr.m => {
                // Interrupt taken in master state: normal frame on the MSP,
                // then a throwaway frame on the ISP.
                self.push_frame(memory, 0, vector, sr, current_pc)?;
                self.regs.msp = self.regs.a[7];
                self.regs.a[7] = self.regs.isp;
                self.push_frame(memory, 1, vector, sr, current_pc)?;
            },
            _ => {
                self.push_frame(memory, 0, vector, sr, current_pc)?;
            },
        }

        self.regs.pc = memory.get_long(self.regs.vbr.wrapping_add(vector as u32 * 4)).ok_or(ACCESS_ERROR)?;

        self.regs.sr.t1 = false;
        self.regs.sr.t0 = false;
        if is_interrupt(vector) {
            self.regs.sr.interrupt_mask = vector & 7;
            self.regs.sr.m = false;
        }
        self.sync_emulated_sr();

        Ok(())
    }

    /// Pushes the common tail of every frame: format/vector word, PC, SR.
    fn push_frame<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, format: u16, vector: u8, sr: u16, pc: u32) -> Result<(), u8> {
        self.push_word(memory, format << 12 | (vector as u16) << 2)?;
        self.push_long(memory, pc)?;
        self.push_word(memory, sr)
    }
}
