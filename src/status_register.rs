// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! M68040 status register.

use crate::utils::bits;

/// M68040 status register.
///
/// Both trace bits are stored but only T1 (trace every instruction) is acted
/// on by the interpreter; T0 tracing on change of flow is not implemented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusRegister {
    /// Trace every instruction.
    pub t1: bool,
    /// Trace on change of flow.
    pub t0: bool,
    /// Supervisor.
    pub s: bool,
    /// Master/Interrupt state.
    pub m: bool,
    /// Interrupt Priority Mask.
    pub interrupt_mask: u8,
    /// Extend.
    pub x: bool,
    /// Negate.
    pub n: bool,
    /// Zero.
    pub z: bool,
    /// Overflow.
    pub v: bool,
    /// Carry.
    pub c: bool,
}

impl StatusRegister {
    const fn t(&self) -> bool {
        true
    }

    const fn f(&self) -> bool {
        false
    }

    const fn hi(&self) -> bool {
        !self.c && !self.z
    }

    const fn ls(&self) -> bool {
        self.c || self.z
    }

    const fn cc(&self) -> bool {
        !self.c
    }

    const fn cs(&self) -> bool {
        self.c
    }

    const fn ne(&self) -> bool {
        !self.z
    }

    const fn eq(&self) -> bool {
        self.z
    }

    const fn vc(&self) -> bool {
        !self.v
    }

    const fn vs(&self) -> bool {
        self.v
    }

    const fn pl(&self) -> bool {
        !self.n
    }

    const fn mi(&self) -> bool {
        self.n
    }

    const fn ge(&self) -> bool {
        self.n && self.v || !self.n && !self.v
    }

    const fn lt(&self) -> bool {
        self.n && !self.v || !self.n && self.v
    }

    const fn gt(&self) -> bool {
        self.n && self.v && !self.z || !self.n && !self.v && !self.z
    }

    const fn le(&self) -> bool {
        self.z || self.n && !self.v || !self.n && self.v
    }

    const CONDITIONS: [fn(&Self) -> bool; 16] = [
        Self::t, Self::f, Self::hi, Self::ls, Self::cc, Self::cs, Self::ne, Self::eq,
        Self::vc, Self::vs, Self::pl, Self::mi, Self::ge, Self::lt, Self::gt, Self::le,
    ];

    /// Tests the given condition code against the current flags.
    ///
    /// The same truth table serves Bcc, DBcc, Scc and TRAPcc.
    pub fn condition(&self, cc: u8) -> bool {
        Self::CONDITIONS[cc as usize](self)
    }

    /// Sets the CCR bits from the low byte of the given raw SR value.
    pub fn set_ccr(&mut self, sr: u16) {
        self.x = bits(sr, 4, 4) != 0;
        self.n = bits(sr, 3, 3) != 0;
        self.z = bits(sr, 2, 2) != 0;
        self.v = bits(sr, 1, 1) != 0;
        self.c = bits(sr, 0, 0) != 0;
    }

    /// Returns the CCR as the low byte of a raw SR value.
    pub const fn ccr(&self) -> u16 {
        (self.x as u16) << 4 |
        (self.n as u16) << 3 |
        (self.z as u16) << 2 |
        (self.v as u16) << 1 |
        self.c as u16
    }

    /// True if either trace bit is set.
    pub const fn trace(&self) -> bool {
        self.t1 || self.t0
    }
}

impl From<u16> for StatusRegister {
    fn from(sr: u16) -> Self {
        Self {
            t1: bits(sr, 15, 15) != 0,
            t0: bits(sr, 14, 14) != 0,
            s: bits(sr, 13, 13) != 0,
            m: bits(sr, 12, 12) != 0,
            interrupt_mask: bits(sr, 8, 10) as u8,
            x: bits(sr, 4, 4) != 0,
            n: bits(sr, 3, 3) != 0,
            z: bits(sr, 2, 2) != 0,
            v: bits(sr, 1, 1) != 0,
            c: bits(sr, 0, 0) != 0,
        }
    }
}

impl From<StatusRegister> for u16 {
    fn from(sr: StatusRegister) -> u16 {
        (sr.t1 as u16) << 15 |
        (sr.t0 as u16) << 14 |
        (sr.s as u16) << 13 |
        (sr.m as u16) << 12 |
        (sr.interrupt_mask as u16) << 8 |
        sr.ccr()
    }
}

impl std::ops::BitAndAssign<u16> for StatusRegister {
    fn bitand_assign(&mut self, rhs: u16) {
        let raw: u16 = (*self).into();
        *self = Self::from(raw & rhs);
    }
}

impl std::ops::BitOrAssign<u16> for StatusRegister {
    fn bitor_assign(&mut self, rhs: u16) {
        let raw: u16 = (*self).into();
        *self = Self::from(raw | rhs);
    }
}

impl std::ops::BitXorAssign<u16> for StatusRegister {
    fn bitxor_assign(&mut self, rhs: u16) {
        let raw: u16 = (*self).into();
        *self = Self::from(raw ^ rhs);
    }
}
