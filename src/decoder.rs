// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opcode -> ISA lookup table, generated once at startup.
//!
//! Each opcode word is classified by walking its pattern class; addressing
//! mode fields are validated so that the holes in the instruction map decode
//! to [Isa::Unknown] and raise an illegal instruction exception.

use crate::isa::Isa;
use crate::utils::bits;

use lazy_static::lazy_static;

lazy_static! {
    /// The 65,536-entry opcode lookup table.
    pub static ref DECODER: Box<[Isa; 0x1_0000]> = generate();
}

fn generate() -> Box<[Isa; 0x1_0000]> {
    let mut table = vec![Isa::Unknown; 0x1_0000];
    for (opcode, entry) in table.iter_mut().enumerate() {
        *entry = decode(opcode as u16);
    }
    table.into_boxed_slice().try_into().expect("table has 65536 entries")
}

// Effective-address category checks, (mode, reg) as encoded in the opcode.

fn ea_data(mode: u16, reg: u16) -> bool {
    mode != 1 && (mode != 7 || reg <= 4)
}

fn ea_any(mode: u16, reg: u16) -> bool {
    mode != 7 || reg <= 4
}

fn ea_alterable(mode: u16, reg: u16) -> bool {
    mode != 7 || reg <= 1
}

fn ea_data_alterable(mode: u16, reg: u16) -> bool {
    mode != 1 && ea_alterable(mode, reg)
}

fn ea_memory_alterable(mode: u16, reg: u16) -> bool {
    mode >= 2 && ea_alterable(mode, reg)
}

fn ea_control(mode: u16, reg: u16) -> bool {
    match mode {
        2 | 5 | 6 => true,
        7 => reg <= 3,
        _ => false,
    }
}

fn ea_control_alterable(mode: u16, reg: u16) -> bool {
    match mode {
        2 | 5 | 6 => true,
        7 => reg <= 1,
        _ => false,
    }
}

fn decode(opcode: u16) -> Isa {
    let mode = bits(opcode, 3, 5);
    let reg = bits(opcode, 0, 2);

    match bits(opcode, 12, 15) {
        0x0 => decode_0(opcode, mode, reg),
        0x1 | 0x2 | 0x3 => decode_move(opcode, mode, reg),
        0x4 => decode_4(opcode, mode, reg),
        0x5 => decode_5(opcode, mode, reg),
        0x6 => match bits(opcode, 8, 11) {
            0 => Isa::Bra,
            1 => Isa::Bsr,
            _ => Isa::Bcc,
        },
        0x7 => {
            if bits(opcode, 8, 8) == 0 {
                Isa::Moveq
            } else if bits(opcode, 8, 15) == 0x71 {
                // Illegal MOVEQ forms in the 0x7100 page are the escape
                // opcodes patched into the ROM.
                Isa::EmulOp
            } else {
                Isa::Unknown
            }
        },
        0x8 => decode_8(opcode, mode, reg),
        0x9 => decode_add_sub(opcode, mode, reg, Isa::Sub, Isa::Suba, Isa::Subx),
        0xa => Isa::Aline,
        0xb => decode_b(opcode, mode, reg),
        0xc => decode_c(opcode, mode, reg),
        0xd => decode_add_sub(opcode, mode, reg, Isa::Add, Isa::Adda, Isa::Addx),
        0xe => decode_e(opcode, mode, reg),
        0xf => decode_f(opcode),
        _ => unreachable!(),
    }
}

fn decode_0(opcode: u16, mode: u16, reg: u16) -> Isa {
    if bits(opcode, 8, 8) != 0 {
        // MOVEP steals the address-register-indirect encodings of the
        // dynamic bit instructions.
        if mode == 1 {
            return Isa::Movep;
        }
        return match bits(opcode, 6, 7) {
            0 if ea_data(mode, reg) && !(mode == 7 && reg == 4) => Isa::Btst,
            1 if ea_data_alterable(mode, reg) => Isa::Bchg,
            2 if ea_data_alterable(mode, reg) => Isa::Bclr,
            3 if ea_data_alterable(mode, reg) => Isa::Bset,
            _ => Isa::Unknown,
        };
    }

    let size = bits(opcode, 6, 7);

    // Static bit operations use all four size codes.
    if bits(opcode, 8, 15) == 0x08 {
        return match size {
            0 if ea_data(mode, reg) && !(mode == 7 && reg == 4) => Isa::Btst,
            1 if ea_data_alterable(mode, reg) => Isa::Bchg,
            2 if ea_data_alterable(mode, reg) => Isa::Bclr,
            _ if ea_data_alterable(mode, reg) => Isa::Bset,
            _ => Isa::Unknown,
        };
    }

    if size == 3 {
        // The size-11 slots of the immediate instructions hold the 68020
        // two-operand extensions.
        return match bits(opcode, 9, 11) {
            0 | 1 | 2 if ea_control(mode, reg) => Isa::Chk2,
            5 | 6 | 7 if ea_memory_alterable(mode, reg) => Isa::Cas,
            _ => Isa::Unknown,
        };
    }

    match bits(opcode, 8, 15) {
        0x00 => decode_immediate(opcode, mode, reg, Isa::Ori, Isa::Oriccr, Isa::Orisr),
        0x02 => decode_immediate(opcode, mode, reg, Isa::Andi, Isa::Andiccr, Isa::Andisr),
        0x04 if ea_data_alterable(mode, reg) => Isa::Subi,
        0x06 if ea_data_alterable(mode, reg) => Isa::Addi,
        0x0a => decode_immediate(opcode, mode, reg, Isa::Eori, Isa::Eoriccr, Isa::Eorisr),
        0x0c if ea_data(mode, reg) && !(mode == 7 && reg == 4) => Isa::Cmpi,
        0x0e if ea_memory_alterable(mode, reg) => Isa::Moves,
        _ => Isa::Unknown,
    }
}

fn decode_immediate(opcode: u16, mode: u16, reg: u16, normal: Isa, to_ccr: Isa, to_sr: Isa) -> Isa {
    if mode == 7 && reg == 4 {
        return match bits(opcode, 6, 7) {
            0 => to_ccr,
            1 => to_sr,
            _ => Isa::Unknown,
        };
    }
    if ea_data_alterable(mode, reg) {
        normal
    } else {
        Isa::Unknown
    }
}

fn decode_move(opcode: u16, mode: u16, reg: u16) -> Isa {
    if !ea_any(mode, reg) {
        return Isa::Unknown;
    }
    let dst_mode = bits(opcode, 6, 8);
    let dst_reg = bits(opcode, 9, 11);
    let byte = bits(opcode, 12, 13) == 1;

    if dst_mode == 1 {
        if byte {
            Isa::Unknown
        } else {
            Isa::Movea
        }
    } else if ea_data_alterable(dst_mode, dst_reg) {
        if byte && mode == 1 {
            // MOVE.B from an address register does not exist.
            Isa::Unknown
        } else {
            Isa::Move
        }
    } else {
        Isa::Unknown
    }
}

fn decode_4(opcode: u16, mode: u16, reg: u16) -> Isa {
    // The CHK, LEA and EXTB encodings have bit 8 set.
    if bits(opcode, 8, 8) != 0 {
        return match bits(opcode, 6, 8) {
            7 if ea_control(mode, reg) => Isa::Lea,
            7 if mode == 0 && bits(opcode, 9, 11) == 4 => Isa::Ext, // EXTB.L
            6 | 4 if ea_data(mode, reg) => Isa::Chk,
            _ => Isa::Unknown,
        };
    }

    let size = bits(opcode, 6, 7);
    match bits(opcode, 8, 11) {
        0x0 => match size {
            3 if ea_data_alterable(mode, reg) => Isa::Movefsr,
            _ if size < 3 && ea_data_alterable(mode, reg) => Isa::Negx,
            _ => Isa::Unknown,
        },
        0x2 => match size {
            3 if ea_data_alterable(mode, reg) => Isa::Movefccr,
            _ if size < 3 && ea_data_alterable(mode, reg) => Isa::Clr,
            _ => Isa::Unknown,
        },
        0x4 => match size {
            3 if ea_data(mode, reg) => Isa::Moveccr,
            _ if size < 3 && ea_data_alterable(mode, reg) => Isa::Neg,
            _ => Isa::Unknown,
        },
        0x6 => match size {
            3 if ea_data(mode, reg) => Isa::Movesr,
            _ if size < 3 && ea_data_alterable(mode, reg) => Isa::Not,
            _ => Isa::Unknown,
        },
        0x8 => match size {
            0 if mode == 1 => Isa::LinkL,
            0 if ea_data_alterable(mode, reg) => Isa::Nbcd,
            1 if mode == 0 => Isa::Swap,
            1 if mode == 1 => Isa::Bkpt,
            1 if ea_control(mode, reg) => Isa::Pea,
            2 | 3 if mode == 0 => Isa::Ext,
            2 | 3 if ea_control_alterable(mode, reg) || mode == 4 => Isa::Movem,
            _ => Isa::Unknown,
        },
        0xa => match size {
            3 => {
                if opcode == 0x4afc {
                    Isa::Illegal
                } else if ea_data_alterable(mode, reg) {
                    Isa::Tas
                } else {
                    Isa::Unknown
                }
            },
            // TST takes any mode on the 68020+, except byte on An.
            _ if ea_any(mode, reg) && !(mode == 1 && size == 0) => Isa::Tst,
            _ => Isa::Unknown,
        },
        0xc => match size {
            0 if ea_data(mode, reg) => Isa::Mull,
            1 if ea_data(mode, reg) => Isa::Divl,
            2 | 3 if ea_control(mode, reg) || mode == 3 => Isa::Movem,
            _ => Isa::Unknown,
        },
        0xe => decode_4e(opcode, mode, reg),
        _ => Isa::Unknown,
    }
}

fn decode_4e(opcode: u16, mode: u16, reg: u16) -> Isa {
    match bits(opcode, 6, 7) {
        1 => match mode {
            0 | 1 => Isa::Trap,
            2 => Isa::Link,
            3 => Isa::Unlk,
            4 | 5 => Isa::Moveusp,
            6 => match opcode {
                0x4e70 => Isa::Reset,
                0x4e71 => Isa::Nop,
                0x4e72 => Isa::Stop,
                0x4e73 => Isa::Rte,
                0x4e74 => Isa::Rtd,
                0x4e75 => Isa::Rts,
                0x4e76 => Isa::Trapv,
                0x4e77 => Isa::Rtr,
                _ => Isa::Unknown,
            },
            7 if reg == 2 || reg == 3 => Isa::Movec,
            _ => Isa::Unknown,
        },
        2 if ea_control(mode, reg) => Isa::Jsr,
        3 if ea_control(mode, reg) => Isa::Jmp,
        _ => Isa::Unknown,
    }
}

fn decode_5(opcode: u16, mode: u16, reg: u16) -> Isa {
    if bits(opcode, 6, 7) == 3 {
        return match mode {
            1 => Isa::Dbcc,
            7 if reg >= 2 && reg <= 4 => Isa::Trapcc,
            _ if ea_data_alterable(mode, reg) => Isa::Scc,
            _ => Isa::Unknown,
        };
    }
    if !ea_alterable(mode, reg) || mode == 1 && bits(opcode, 6, 7) == 0 {
        return Isa::Unknown;
    }
    if bits(opcode, 8, 8) != 0 {
        Isa::Subq
    } else {
        Isa::Addq
    }
}

fn decode_8(opcode: u16, mode: u16, reg: u16) -> Isa {
    match bits(opcode, 6, 8) {
        3 if ea_data(mode, reg) => Isa::Divu,
        7 if ea_data(mode, reg) => Isa::Divs,
        4 if mode <= 1 => Isa::Sbcd,
        5 if mode <= 1 => Isa::Pack,
        6 if mode <= 1 => Isa::Unpk,
        0 | 1 | 2 if ea_data(mode, reg) => Isa::Or,
        4 | 5 | 6 if ea_memory_alterable(mode, reg) => Isa::Or,
        _ => Isa::Unknown,
    }
}

fn decode_add_sub(opcode: u16, mode: u16, reg: u16, normal: Isa, address: Isa, extend: Isa) -> Isa {
    match bits(opcode, 6, 8) {
        3 | 7 if ea_any(mode, reg) => address,
        4 | 5 | 6 if mode <= 1 => extend,
        0 if mode != 1 && ea_any(mode, reg) => normal, // No byte source from An.
        1 | 2 if ea_any(mode, reg) => normal,
        4 | 5 | 6 if ea_memory_alterable(mode, reg) => normal,
        _ => Isa::Unknown,
    }
}

fn decode_b(opcode: u16, mode: u16, reg: u16) -> Isa {
    match bits(opcode, 6, 8) {
        3 | 7 if ea_any(mode, reg) => Isa::Cmpa,
        0 if mode != 1 && ea_any(mode, reg) => Isa::Cmp,
        1 | 2 if ea_any(mode, reg) => Isa::Cmp,
        4 | 5 | 6 if mode == 1 => Isa::Cmpm,
        4 | 5 | 6 if ea_data_alterable(mode, reg) => Isa::Eor,
        _ => Isa::Unknown,
    }
}

fn decode_c(opcode: u16, mode: u16, reg: u16) -> Isa {
    match bits(opcode, 6, 8) {
        3 if ea_data(mode, reg) => Isa::Mulu,
        7 if ea_data(mode, reg) => Isa::Muls,
        4 if mode <= 1 => Isa::Abcd,
        5 | 6 if mode <= 1 => {
            // EXG occupies the register-to-register forms next to ABCD.
            match bits(opcode, 3, 7) {
                0b01000 | 0b01001 | 0b10001 => Isa::Exg,
                _ => Isa::Unknown,
            }
        },
        0 | 1 | 2 if ea_data(mode, reg) => Isa::And,
        4 | 5 | 6 if ea_memory_alterable(mode, reg) => Isa::And,
        _ => Isa::Unknown,
    }
}

fn decode_e(opcode: u16, mode: u16, reg: u16) -> Isa {
    if bits(opcode, 6, 7) != 3 {
        // Register shifts: the type field selects the operation, bit 5
        // selects immediate or register count (kept in the operands).
        return match bits(opcode, 3, 4) {
            0 => Isa::Asr,
            1 => Isa::Lsr,
            2 => Isa::Roxr,
            _ => Isa::Ror,
        };
    }
    match bits(opcode, 9, 11) {
        0 if ea_memory_alterable(mode, reg) => Isa::Asm,
        1 if ea_memory_alterable(mode, reg) => Isa::Lsm,
        2 if ea_memory_alterable(mode, reg) => Isa::Roxm,
        3 if ea_memory_alterable(mode, reg) => Isa::Rom,
        _ if bits(opcode, 11, 11) == 1 => decode_bitfield(opcode, mode, reg),
        _ => Isa::Unknown,
    }
}

fn decode_bitfield(opcode: u16, mode: u16, reg: u16) -> Isa {
    let readable = mode == 0 || ea_control(mode, reg);
    let writable = mode == 0 || ea_control_alterable(mode, reg);
    match bits(opcode, 8, 10) {
        0 if readable => Isa::Bftst,
        1 if readable => Isa::Bfextu,
        2 if writable => Isa::Bfchg,
        3 if readable => Isa::Bfexts,
        4 if writable => Isa::Bfclr,
        5 if readable => Isa::Bfffo,
        6 if writable => Isa::Bfset,
        7 if writable => Isa::Bfins,
        _ => Isa::Unknown,
    }
}

fn decode_f(opcode: u16) -> Isa {
    match opcode & 0xff00 {
        0xf400 => {
            if bits(opcode, 5, 5) == 0 {
                Isa::Cinv
            } else {
                Isa::Cpush
            }
        },
        0xf500 => Isa::Pflush,
        0xf600 if bits(opcode, 3, 5) <= 4 => Isa::Move16,
        _ => Isa::Fline,
    }
}
