// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mac68k::status_register::StatusRegister;

/// The bits a 68040 SR can hold: T1/T0/S/M/IPM and the CCR.
const SR_MASK: u16 = 0xf71f;

#[test]
fn status_register() {
    for raw in 0..=u16::MAX {
        assert_eq!(Into::<u16>::into(StatusRegister::from(raw)), raw & SR_MASK);

        let lsr = StatusRegister::from(raw);
        let mut rsr = lsr;
        rsr &= raw;
        assert_eq!(lsr, rsr);
        rsr &= 0;
        assert_eq!(0, Into::<u16>::into(rsr));
        rsr &= 0xFFFF;
        assert_eq!(0, Into::<u16>::into(rsr));

        let lsr = StatusRegister::from(raw);
        let mut rsr = lsr;
        rsr ^= raw;
        assert_eq!(0, Into::<u16>::into(rsr));
        rsr ^= 0;
        assert_eq!(0, Into::<u16>::into(rsr));
        rsr ^= 0xFFFF;
        assert_eq!(SR_MASK, Into::<u16>::into(rsr));

        let lsr = StatusRegister::from(raw);
        let mut rsr = lsr;
        rsr |= raw;
        assert_eq!(lsr, rsr);
        rsr |= 0;
        assert_eq!(lsr, rsr);
        rsr |= 0xFFFF;
        assert_eq!(SR_MASK, Into::<u16>::into(rsr));
    }
}

/// The full truth table of the sixteen condition codes, shared by Bcc,
/// DBcc, Scc and TRAPcc.
#[test]
fn conditions() {
    for raw in 0..=0x1fu16 {
        let sr = StatusRegister::from(raw);
        assert_eq!(sr.condition(0), true, "T for {raw:#x}");
        assert_eq!(sr.condition(1), false, "F for {raw:#x}");
        assert_eq!(sr.condition(2), raw & 0b0101 == 0, "HI for {raw:#x}");
        assert_eq!(sr.condition(3), raw & 0b0101 != 0, "LS for {raw:#x}");
        assert_eq!(sr.condition(4), raw & 0b0001 == 0, "CC for {raw:#x}");
        assert_eq!(sr.condition(5), raw & 0b0001 != 0, "CS for {raw:#x}");
        assert_eq!(sr.condition(6), raw & 0b0100 == 0, "NE for {raw:#x}");
        assert_eq!(sr.condition(7), raw & 0b0100 != 0, "EQ for {raw:#x}");
        assert_eq!(sr.condition(8), raw & 0b0010 == 0, "VC for {raw:#x}");
        assert_eq!(sr.condition(9), raw & 0b0010 != 0, "VS for {raw:#x}");
        assert_eq!(sr.condition(10), raw & 0b1000 == 0, "PL for {raw:#x}");
        assert_eq!(sr.condition(11), raw & 0b1000 != 0, "MI for {raw:#x}");
        assert_eq!(sr.condition(12), raw & 0b1010 == 0b1010 || raw & 0b1010 == 0, "GE for {raw:#x}");
        assert_eq!(sr.condition(13), raw & 0b1010 == 0b1000 || raw & 0b1010 == 0b0010, "LT for {raw:#x}");
        assert_eq!(sr.condition(14), raw & 0b1110 == 0b1010 || raw & 0b1110 == 0, "GT for {raw:#x}");
        assert_eq!(sr.condition(15), raw & 0b0100 != 0 || raw & 0b1010 == 0b1000 || raw & 0b1010 == 0b0010, "LE for {raw:#x}");
    }
}
