// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tests for the extended add/sub helpers behind the CCR computation.
//!
//! The signed variants must report overflow across the whole operation
//! including the carry-in, and the unsigned variants must accumulate the
//! carry, or X/V/C come out wrong on ADDX/SUBX chains.

use mac68k::utils::ExtendedOps;

macro_rules! test_operator {
    ($operator:expr, $expected:expr) => {
        let res = $operator;
        assert_eq!(res, $expected, "{} -> {:?}, expected {:?}", stringify!($operator), res, $expected);
    }
}

#[test]
fn unsigned_add() {
    test_operator!(255u8.extended_add(1, false), (0, true));
    test_operator!(255u8.extended_add(0, true), (0, true));
    test_operator!(255u8.extended_add(1, true), (1, true));
    test_operator!(0u8.extended_add(255, false), (255, false));
    test_operator!(0u8.extended_add(255, true), (0, true));
}

#[test]
fn signed_add() {
    test_operator!(127i8.extended_add(1, false), (-128, true));
    test_operator!(127i8.extended_add(0, true), (-128, true));
    test_operator!(127i8.extended_add(1, true), (-127, true));
    test_operator!(127i8.extended_add(-1, false), (126, false));
    test_operator!(127i8.extended_add(-1, true), (127, false)); // no intermediate overflow
    test_operator!((-128i8).extended_add(-1, false), (127, true));
    test_operator!((-128i8).extended_add(-1, true), (-128, false)); // no intermediate overflow
    test_operator!(0i8.extended_add(127, true), (-128, true));
}

#[test]
fn unsigned_sub() {
    test_operator!(0u8.extended_sub(1, false), (255u8, true));
    test_operator!(0u8.extended_sub(0, true), (255u8, true));
    test_operator!(0u8.extended_sub(1, true), (254u8, true));
    test_operator!(255u8.extended_sub(255, false), (0, false));
    test_operator!(255u8.extended_sub(255, true), (255u8, true));
}

#[test]
fn signed_sub() {
    test_operator!((-128i8).extended_sub(1, false), (127, true));
    test_operator!((-128i8).extended_sub(0, true), (127, true));
    test_operator!((-128i8).extended_sub(1, true), (126, true));
    test_operator!((-128i8).extended_sub(-1, false), (-127, false));
    test_operator!((-128i8).extended_sub(-1, true), (-128, false)); // no intermediate overflow
    test_operator!(127i8.extended_sub(-1, false), (-128, true));
    test_operator!(127i8.extended_sub(-1, true), (127, false)); // no intermediate overflow
    test_operator!(0i8.extended_sub(-128, true), (127, false));
}

#[test]
fn split_views_agree_with_the_native_ones() {
    // The signed/unsigned projections feed V and C respectively; both must
    // agree with the native-width computation.
    for a in [0u8, 1, 0x7f, 0x80, 0xff] {
        for b in [0u8, 1, 0x7f, 0x80, 0xff] {
            for x in [false, true] {
                assert_eq!(a.unsigned_add(b, x), a.extended_add(b, x));
                assert_eq!(a.signed_add(b, x), (a as i8).extended_add(b as i8, x));
                assert_eq!(a.unsigned_sub(b, x), a.extended_sub(b, x));
                assert_eq!(a.signed_sub(b, x), (a as i8).extended_sub(b as i8, x));
            }
        }
    }
}
