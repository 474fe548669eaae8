// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fetch/decode/execute core.

use crate::{M68040, MemoryAccess};
use crate::addressing_modes::{AddressingMode, EffectiveAddress};
use crate::exception::{ADDRESS_ERROR, DoubleBusError, Exception, Vector};
use crate::instruction::{Direction, Instruction, Operands, Size};
use crate::isa::Isa;
use crate::utils::{bit, bits, ExtendedOps, Integer};

pub(crate) const SR_UPPER_MASK: u16 = 0xf700;
pub(crate) const CCR_MASK: u16 = 0x001f;

/// Returns `()` on success, an exception vector on error. Alias for `Result<(), u8>`.
pub(crate) type InterpreterResult = Result<(), u8>;

impl M68040 {
    #[must_use]
    const fn check_supervisor(&self) -> Result<(), u8> {
        if self.regs.sr.s {
            Ok(())
        } else {
            Err(Vector::PrivilegeViolation as u8)
        }
    }

    /// Runs the interpreter loop once, queueing internally the exception
    /// that occurred during execution, if any.
    ///
    /// Err is returned only for an unrecoverable double bus error.
    pub fn interpreter<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> Result<(), DoubleBusError> {
        let vector = self.interpreter_exception(memory)?;
        if let Some(v) = vector {
            self.exception(Exception::from(v));
        }
        Ok(())
    }

    /// Runs the interpreter loop once, returning the vector of the exception
    /// that occurred during execution, if any.
    ///
    /// To process the returned exception, call [M68040::exception].
    ///
    /// This method may or may not execute an instruction: nothing runs while
    /// the CPU is stopped, and an access error during fetch aborts the step.
    pub fn interpreter_exception<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> Result<Option<u8>, DoubleBusError> {
        if !self.exceptions.is_empty() {
            self.process_pending_exceptions(memory)?;
        }

        if self.stopped {
            return Ok(None);
        }

        self.instruction_pc = self.regs.pc;

        let mut iter = self.iter_from_pc(memory);
        let instruction = match Instruction::from_memory(&mut iter) {
            Ok(i) => i,
            Err(e) => {
                let fault = iter.next_addr.wrapping_sub(2);
                drop(iter);
                // Faults during fetch record the fetch address themselves.
                let e = if e == ADDRESS_ERROR {
                    self.exception3_pc = self.instruction_pc;
                    self.exception3_addr = fault & 0xffff_fffe;
                    e
                } else {
                    self.bus_error(fault, true)
                };
                return Ok(Some(e));
            },
        };
        self.regs.pc = iter.next_addr;

        self.current_opcode = instruction.opcode;
        let isa = Isa::from(instruction.opcode);

        let trace = self.regs.sr.t1;
        match Execute::<M>::EXECUTE[isa as usize](self, memory, &instruction) {
            Ok(()) => {
                if trace && !isa.is_privileged() {
                    Ok(Some(Vector::Trace as u8))
                } else {
                    Ok(None)
                }
            },
            Err(e) => Ok(Some(e)),
        }
    }

    // Flag helpers shared by the arithmetic handlers.

    fn add<UT, ST, const ADDX: bool>(&mut self, dst: UT, src: UT) -> UT
    where
        UT: ExtendedOps<ST, UT>,
        ST: Integer,
    {
        let (res, v) = src.signed_add(dst, ADDX && self.regs.sr.x);
        let (ures, c) = src.unsigned_add(dst, ADDX && self.regs.sr.x);

        self.regs.sr.x = c;
        self.regs.sr.n = res < ST::ZERO;
        if ADDX {
            if res != ST::ZERO {
                self.regs.sr.z = false;
            }
        } else {
            self.regs.sr.z = res == ST::ZERO;
        }
        self.regs.sr.v = v;
        self.regs.sr.c = c;

        ures
    }

    /// Performs dst - src.
    fn sub<UT, ST, const SUBX: bool, const CMP: bool>(&mut self, dst: UT, src: UT) -> UT
    where
        UT: ExtendedOps<ST, UT>,
        ST: Integer,
    {
        let (res, v) = dst.signed_sub(src, SUBX && self.regs.sr.x);
        let (ures, c) = dst.unsigned_sub(src, SUBX && self.regs.sr.x);

        if !CMP {
            self.regs.sr.x = c;
        }
        self.regs.sr.n = res < ST::ZERO;
        if SUBX {
            if res != ST::ZERO {
                self.regs.sr.z = false;
            }
        } else {
            self.regs.sr.z = res == ST::ZERO;
        }
        self.regs.sr.v = v;
        self.regs.sr.c = c;

        ures
    }

    fn and<UT: Integer>(&mut self, dst: UT, src: UT) -> UT {
        let res = src & dst;
        self.movement_flags(res);
        res
    }

    fn or<UT: Integer>(&mut self, dst: UT, src: UT) -> UT {
        let res = src | dst;
        self.movement_flags(res);
        res
    }

    fn eor<UT: Integer>(&mut self, dst: UT, src: UT) -> UT {
        let res = src ^ dst;
        self.movement_flags(res);
        res
    }

    /// N and Z from the value, V and C cleared: the MOVE/logical rule.
    fn movement_flags<UT: Integer>(&mut self, value: UT) {
        self.regs.sr.n = value & UT::SIGN_BIT_MASK != UT::ZERO;
        self.regs.sr.z = value == UT::ZERO;
        self.regs.sr.v = false;
        self.regs.sr.c = false;
    }

    // Instruction handlers.

    pub(crate) fn execute_unknown(&mut self) -> InterpreterResult {
        Err(Vector::IllegalInstruction as u8)
    }

    pub(crate) fn execute_abcd<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, rx: u8, mode: Direction, ry: u8) -> InterpreterResult {
        let (src, dst) = if mode == Direction::MemoryToMemory {
            let src_addr = self.ariwpr(ry, Size::Byte);
            let dst_addr = self.ariwpr(rx, Size::Byte);
            (self.read_byte(memory, src_addr)? as u16, self.read_byte(memory, dst_addr)? as u16)
        } else {
            (self.regs.d[ry as usize] as u8 as u16, self.regs.d[rx as usize] as u8 as u16)
        };
        let src = src + self.regs.sr.x as u16;
        let bin_res = src + dst;

        let mut res = (src & 0x0f) + (dst & 0x0f);
        if res >= 0x0a {
            res += 0x06;
        }

        res += (src & 0xf0) + (dst & 0xf0);
        if res >= 0xa0 {
            res += 0x60;
        }

        self.regs.sr.n = res & 0x80 != 0;
        if res & 0xff != 0 { self.regs.sr.z = false; }
        self.regs.sr.v = src > 0x79 - dst && bin_res < 0x80;
        self.regs.sr.c = res >= 0x0100;
        self.regs.sr.x = self.regs.sr.c;

        if mode == Direction::MemoryToMemory {
            let addr = self.regs.a[rx as usize];
            self.write_byte(memory, addr, res as u8)
        } else {
            self.regs.d_byte(rx, res as u8);
            Ok(())
        }
    }

    pub(crate) fn execute_add<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, dir: Direction, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize] as u8, self.get_byte(memory, &mut ea)?)
                } else {
                    (self.get_byte(memory, &mut ea)?, self.regs.d[reg as usize] as u8)
                };

                let res = self.add::<u8, i8, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_byte(memory, &mut ea, res)?;
                } else {
                    self.regs.d_byte(reg, res);
                }
            },
            Size::Word => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize] as u16, self.get_word(memory, &mut ea)?)
                } else {
                    (self.get_word(memory, &mut ea)?, self.regs.d[reg as usize] as u16)
                };

                let res = self.add::<u16, i16, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_word(memory, &mut ea, res)?;
                } else {
                    self.regs.d_word(reg, res);
                }
            },
            Size::Long => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize], self.get_long(memory, &mut ea)?)
                } else {
                    (self.get_long(memory, &mut ea)?, self.regs.d[reg as usize])
                };

                let res = self.add::<u32, i32, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_long(memory, &mut ea, res)?;
                } else {
                    self.regs.d[reg as usize] = res;
                }
            },
        }

        Ok(())
    }

    pub(crate) fn execute_adda<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        let src = if size.is_word() {
            self.get_word(memory, &mut ea)? as i16 as u32
        } else {
            self.get_long(memory, &mut ea)?
        };

        self.regs.a[reg as usize] = self.regs.a[reg as usize].wrapping_add(src);

        Ok(())
    }

    pub(crate) fn execute_addi<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.add::<u8, i8, false>(data, imm as u8);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.add::<u16, i16, false>(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.add::<u32, i32, false>(data, imm);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_addq<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, imm: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let imm = if imm == 0 { 8 } else { imm };

        if am.is_ard() {
            let reg = am.register().unwrap() as usize;
            self.regs.a[reg] = self.regs.a[reg].wrapping_add(imm as u32);
            return Ok(());
        }

        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.add::<u8, i8, false>(data, imm);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.add::<u16, i16, false>(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.add::<u32, i32, false>(data, imm as u32);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_addx<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, rx: u8, size: Size, mode: Direction, ry: u8) -> InterpreterResult {
        match size {
            Size::Byte => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_byte(memory, src_addr)?, self.read_byte(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize] as u8, self.regs.d[rx as usize] as u8)
                };

                let res = self.add::<u8, i8, true>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_byte(memory, addr, res)
                } else {
                    self.regs.d_byte(rx, res);
                    Ok(())
                }
            },
            Size::Word => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_word(memory, src_addr)?, self.read_word(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize] as u16, self.regs.d[rx as usize] as u16)
                };

                let res = self.add::<u16, i16, true>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_word(memory, addr, res)
                } else {
                    self.regs.d_word(rx, res);
                    Ok(())
                }
            },
            Size::Long => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_long(memory, src_addr)?, self.read_long(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize], self.regs.d[rx as usize])
                };

                let res = self.add::<u32, i32, true>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_long(memory, addr, res)
                } else {
                    self.regs.d[rx as usize] = res;
                    Ok(())
                }
            },
        }
    }

    pub(crate) fn execute_and<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, dir: Direction, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let src = self.regs.d[reg as usize] as u8;
                let dst = self.get_byte(memory, &mut ea)?;

                let res = self.and(dst, src);

                if dir == Direction::DstEa {
                    self.set_byte(memory, &mut ea, res)?;
                } else {
                    self.regs.d_byte(reg, res);
                }
            },
            Size::Word => {
                let src = self.regs.d[reg as usize] as u16;
                let dst = self.get_word(memory, &mut ea)?;

                let res = self.and(dst, src);

                if dir == Direction::DstEa {
                    self.set_word(memory, &mut ea, res)?;
                } else {
                    self.regs.d_word(reg, res);
                }
            },
            Size::Long => {
                let src = self.regs.d[reg as usize];
                let dst = self.get_long(memory, &mut ea)?;

                let res = self.and(dst, src);

                if dir == Direction::DstEa {
                    self.set_long(memory, &mut ea, res)?;
                } else {
                    self.regs.d[reg as usize] = res;
                }
            },
        }

        Ok(())
    }

    pub(crate) fn execute_andi<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.and(data, imm as u8);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.and(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.and(data, imm);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_andiccr(&mut self, imm: u16) -> InterpreterResult {
        let sr = self.sr();
        self.regs.sr.set_ccr(sr & (imm | !CCR_MASK));
        Ok(())
    }

    pub(crate) fn execute_andisr(&mut self, imm: u16) -> InterpreterResult {
        self.check_supervisor()?;
        self.set_sr(self.sr() & imm);
        Ok(())
    }

    /// Shift/rotate kinds, encoded as in the opcode type field.
    const SHIFT_AS: u16 = 0;
    const SHIFT_LS: u16 = 1;
    const SHIFT_ROX: u16 = 2;
    const SHIFT_RO: u16 = 3;

    /// One shift or rotate, any kind, any size. The iteration count is at
    /// most 63, so stepping bit by bit keeps every flag case honest.
    fn shift_rotate(&mut self, kind: u16, dir: Direction, size: Size, count: u32, value: u32) -> u32 {
        let width = size as u32 * 8;
        let mask = if width == 32 { u32::MAX } else { (1 << width) - 1 };
        let sign_bit = 1 << (width - 1);
        let mut res = value & mask;

        self.regs.sr.v = false;
        self.regs.sr.c = false;
        if kind == Self::SHIFT_ROX && count == 0 {
            self.regs.sr.c = self.regs.sr.x;
        }

        for _ in 0..count {
            match (kind, dir) {
                (Self::SHIFT_AS, Direction::Left) | (Self::SHIFT_LS, Direction::Left) => {
                    let out = res & sign_bit != 0;
                    res = res << 1 & mask;
                    if kind == Self::SHIFT_AS && out != (res & sign_bit != 0) {
                        self.regs.sr.v = true;
                    }
                    self.regs.sr.c = out;
                    self.regs.sr.x = out;
                },
                (Self::SHIFT_AS, _) => {
                    let out = res & 1 != 0;
                    res = res >> 1 | res & sign_bit;
                    self.regs.sr.c = out;
                    self.regs.sr.x = out;
                },
                (Self::SHIFT_LS, _) => {
                    let out = res & 1 != 0;
                    res >>= 1;
                    self.regs.sr.c = out;
                    self.regs.sr.x = out;
                },
                (Self::SHIFT_ROX, Direction::Left) => {
                    let out = res & sign_bit != 0;
                    res = (res << 1 | self.regs.sr.x as u32) & mask;
                    self.regs.sr.x = out;
                    self.regs.sr.c = out;
                },
                (Self::SHIFT_ROX, _) => {
                    let out = res & 1 != 0;
                    res = res >> 1 | (self.regs.sr.x as u32) << (width - 1);
                    self.regs.sr.x = out;
                    self.regs.sr.c = out;
                },
                (_, Direction::Left) => {
                    let out = res & sign_bit != 0;
                    res = (res << 1 | out as u32) & mask;
                    self.regs.sr.c = out;
                },
                _ => {
                    let out = res & 1 != 0;
                    res = res >> 1 | (out as u32) << (width - 1);
                    self.regs.sr.c = out;
                },
            }
        }

        self.regs.sr.n = res & sign_bit != 0;
        self.regs.sr.z = res == 0;

        res
    }

    fn execute_shift_register(&mut self, kind: u16, rot: u8, dir: Direction, size: Size, mode: u8, reg: u8) -> InterpreterResult {
        let count = if mode != 0 {
            self.regs.d[rot as usize] % 64
        } else if rot == 0 {
            8
        } else {
            rot as u32
        };

        let value = self.regs.d[reg as usize];
        let res = self.shift_rotate(kind, dir, size, count, value);

        match size {
            Size::Byte => self.regs.d_byte(reg, res as u8),
            Size::Word => self.regs.d_word(reg, res as u16),
            Size::Long => self.regs.d[reg as usize] = res,
        }

        Ok(())
    }

    fn execute_shift_memory<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, kind: u16, dir: Direction, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));
        let value = self.get_word(memory, &mut ea)?;
        let res = self.shift_rotate(kind, dir, Size::Word, 1, value as u32);
        self.set_word(memory, &mut ea, res as u16)
    }

    pub(crate) fn execute_asm<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dir: Direction, am: AddressingMode) -> InterpreterResult {
        self.execute_shift_memory(memory, Self::SHIFT_AS, dir, am)
    }

    pub(crate) fn execute_asr(&mut self, rot: u8, dir: Direction, size: Size, mode: u8, reg: u8) -> InterpreterResult {
        self.execute_shift_register(Self::SHIFT_AS, rot, dir, size, mode, reg)
    }

    pub(crate) fn execute_bcc(&mut self, pc: u32, cc: u8, disp: i32) -> InterpreterResult {
        if self.regs.sr.condition(cc) {
            self.regs.pc = pc.wrapping_add(disp as u32);
        }
        Ok(())
    }

    pub(crate) fn execute_bchg<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode, mut count: u8) -> InterpreterResult {
        if am.is_drd() {
            count %= 32;
            let reg = am.register().unwrap() as usize;
            self.regs.sr.z = self.regs.d[reg] & 1 << count == 0;
            self.regs.d[reg] ^= 1 << count;
        } else {
            count %= 8;
            let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
            let data = self.get_byte(memory, &mut ea)?;
            self.regs.sr.z = data & 1 << count == 0;
            self.set_byte(memory, &mut ea, data ^ 1 << count)?;
        }
        Ok(())
    }

    pub(crate) fn execute_bclr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode, mut count: u8) -> InterpreterResult {
        if am.is_drd() {
            count %= 32;
            let reg = am.register().unwrap() as usize;
            self.regs.sr.z = self.regs.d[reg] & 1 << count == 0;
            self.regs.d[reg] &= !(1 << count);
        } else {
            count %= 8;
            let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
            let data = self.get_byte(memory, &mut ea)?;
            self.regs.sr.z = data & 1 << count == 0;
            self.set_byte(memory, &mut ea, data & !(1 << count))?;
        }
        Ok(())
    }

    pub(crate) fn execute_bra(&mut self, pc: u32, disp: i32) -> InterpreterResult {
        self.regs.pc = pc.wrapping_add(disp as u32);
        Ok(())
    }

    pub(crate) fn execute_bset<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode, mut count: u8) -> InterpreterResult {
        if am.is_drd() {
            count %= 32;
            let reg = am.register().unwrap() as usize;
            self.regs.sr.z = self.regs.d[reg] & 1 << count == 0;
            self.regs.d[reg] |= 1 << count;
        } else {
            count %= 8;
            let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
            let data = self.get_byte(memory, &mut ea)?;
            self.regs.sr.z = data & 1 << count == 0;
            self.set_byte(memory, &mut ea, data | 1 << count)?;
        }
        Ok(())
    }

    pub(crate) fn execute_bsr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, pc: u32, disp: i32) -> InterpreterResult {
        self.push_long(memory, self.regs.pc)?;
        self.regs.pc = pc.wrapping_add(disp as u32);
        Ok(())
    }

    pub(crate) fn execute_btst<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode, mut count: u8) -> InterpreterResult {
        if am.is_drd() {
            count %= 32;
            let reg = am.register().unwrap() as usize;
            self.regs.sr.z = self.regs.d[reg] & 1 << count == 0;
        } else {
            count %= 8;
            let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
            let data = self.get_byte(memory, &mut ea)?;
            self.regs.sr.z = data & 1 << count == 0;
        }
        Ok(())
    }

    pub(crate) fn execute_chk<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, opcode: u16, reg: u8, am: AddressingMode) -> InterpreterResult {
        // Opmode 110 is the word form, 100 the long form.
        if bits(opcode, 6, 8) == 6 {
            let mut ea = EffectiveAddress::new(am, Some(Size::Word));
            let src = self.get_word(memory, &mut ea)? as i16;
            let data = self.regs.d[reg as usize] as i16;

            if data < 0 || data > src {
                self.regs.sr.n = data < 0;
                return Err(Vector::ChkInstruction as u8);
            }
        } else {
            let mut ea = EffectiveAddress::new(am, Some(Size::Long));
            let src = self.get_long(memory, &mut ea)? as i32;
            let data = self.regs.d[reg as usize] as i32;

            if data < 0 || data > src {
                self.regs.sr.n = data < 0;
                return Err(Vector::ChkInstruction as u8);
            }
        }
        Ok(())
    }

    pub(crate) fn execute_clr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => self.set_byte(memory, &mut ea, 0)?,
            Size::Word => self.set_word(memory, &mut ea, 0)?,
            Size::Long => self.set_long(memory, &mut ea, 0)?,
        }

        self.regs.sr.n = false;
        self.regs.sr.z = true;
        self.regs.sr.v = false;
        self.regs.sr.c = false;

        Ok(())
    }

    pub(crate) fn execute_cmp<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let src = self.get_byte(memory, &mut ea)?;
                let dst = self.regs.d[reg as usize] as u8;
                self.sub::<u8, i8, false, true>(dst, src);
            },
            Size::Word => {
                let src = self.get_word(memory, &mut ea)?;
                let dst = self.regs.d[reg as usize] as u16;
                self.sub::<u16, i16, false, true>(dst, src);
            },
            Size::Long => {
                let src = self.get_long(memory, &mut ea)?;
                let dst = self.regs.d[reg as usize];
                self.sub::<u32, i32, false, true>(dst, src);
            },
        }

        Ok(())
    }

    pub(crate) fn execute_cmpa<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        let src = if size.is_word() {
            self.get_word(memory, &mut ea)? as i16 as u32
        } else {
            self.get_long(memory, &mut ea)?
        };

        self.sub::<u32, i32, false, true>(self.regs.a[reg as usize], src);

        Ok(())
    }

    pub(crate) fn execute_cmpi<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                self.sub::<u8, i8, false, true>(data, imm as u8);
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                self.sub::<u16, i16, false, true>(data, imm as u16);
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                self.sub::<u32, i32, false, true>(data, imm);
            },
        }

        Ok(())
    }

    pub(crate) fn execute_cmpm<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ax: u8, size: Size, ay: u8) -> InterpreterResult {
        let addry = self.ariwpo(ay, size);
        let addrx = self.ariwpo(ax, size);

        match size {
            Size::Byte => {
                let src = self.read_byte(memory, addry)?;
                let dst = self.read_byte(memory, addrx)?;
                self.sub::<u8, i8, false, true>(dst, src);
            },
            Size::Word => {
                let src = self.read_word(memory, addry)?;
                let dst = self.read_word(memory, addrx)?;
                self.sub::<u16, i16, false, true>(dst, src);
            },
            Size::Long => {
                let src = self.read_long(memory, addry)?;
                let dst = self.read_long(memory, addrx)?;
                self.sub::<u32, i32, false, true>(dst, src);
            },
        }

        Ok(())
    }

    pub(crate) fn execute_dbcc(&mut self, pc: u32, cc: u8, reg: u8, disp: i16) -> InterpreterResult {
        if !self.regs.sr.condition(cc) {
            let counter = (self.regs.d[reg as usize] as i16).wrapping_sub(1);
            self.regs.d_word(reg, counter as u16);

            if counter != -1 {
                self.regs.pc = pc.wrapping_add(disp as u32);
            }
        }
        Ok(())
    }

    pub(crate) fn execute_divs<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));

        let src = self.get_word(memory, &mut ea)? as i16 as i32;
        let dst = self.regs.d[reg as usize] as i32;

        if src == 0 {
            return Err(Vector::ZeroDivide as u8);
        }

        let quot = dst.wrapping_div(src);
        let rem = dst.wrapping_rem(src);

        if quot < i16::MIN as i32 || quot > i16::MAX as i32 {
            // Overflow leaves the destination untouched.
            self.regs.sr.v = true;
            self.regs.sr.c = false;
        } else {
            self.regs.d[reg as usize] = (rem as u16 as u32) << 16 | quot as u16 as u32;
            self.regs.sr.n = quot < 0;
            self.regs.sr.z = quot == 0;
            self.regs.sr.v = false;
            self.regs.sr.c = false;
        }

        Ok(())
    }

    pub(crate) fn execute_divu<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));

        let src = self.get_word(memory, &mut ea)? as u32;
        let dst = self.regs.d[reg as usize];

        if src == 0 {
            return Err(Vector::ZeroDivide as u8);
        }

        let quot = dst / src;
        let rem = dst % src;

        if quot > u16::MAX as u32 {
            self.regs.sr.v = true;
            self.regs.sr.c = false;
        } else {
            self.regs.d[reg as usize] = (rem as u16 as u32) << 16 | quot as u16 as u32;
            self.regs.sr.n = quot & 0x8000 != 0;
            self.regs.sr.z = quot == 0;
            self.regs.sr.v = false;
            self.regs.sr.c = false;
        }

        Ok(())
    }

    /// DIVS.L/DIVU.L/DIVSL/DIVUL: 32 or 64-bit dividend, 32-bit quotient
    /// and remainder.
    pub(crate) fn execute_divl<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Long));
        let src = self.get_long(memory, &mut ea)?;

        let dq = bits(ext, 12, 14) as usize;
        let dr = bits(ext, 0, 2) as usize;
        let signed = bit(ext, 11);
        let quad = bit(ext, 10);

        if src == 0 {
            return Err(Vector::ZeroDivide as u8);
        }

        if signed {
            let dividend = if quad {
                (self.regs.d[dr] as i64) << 32 | self.regs.d[dq] as i64 & 0xffff_ffff
            } else {
                self.regs.d[dq] as i32 as i64
            };
            let quot = dividend.wrapping_div(src as i32 as i64);
            let rem = dividend.wrapping_rem(src as i32 as i64);

            if quot < i32::MIN as i64 || quot > i32::MAX as i64 {
                self.regs.sr.v = true;
                self.regs.sr.c = false;
                return Ok(());
            }

            if dr != dq {
                self.regs.d[dr] = rem as u32;
            }
            self.regs.d[dq] = quot as u32;
            self.regs.sr.n = quot < 0;
            self.regs.sr.z = quot == 0;
        } else {
            let dividend = if quad {
                (self.regs.d[dr] as u64) << 32 | self.regs.d[dq] as u64
            } else {
                self.regs.d[dq] as u64
            };
            let quot = dividend / src as u64;
            let rem = dividend % src as u64;

            if quot > u32::MAX as u64 {
                self.regs.sr.v = true;
                self.regs.sr.c = false;
                return Ok(());
            }

            if dr != dq {
                self.regs.d[dr] = rem as u32;
            }
            self.regs.d[dq] = quot as u32;
            self.regs.sr.n = quot & 0x8000_0000 != 0;
            self.regs.sr.z = quot == 0;
        }

        self.regs.sr.v = false;
        self.regs.sr.c = false;
        Ok(())
    }

    /// MULS.L/MULU.L: 32x32 to 32 or 64 bits.
    pub(crate) fn execute_mull<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Long));
        let src = self.get_long(memory, &mut ea)?;

        let dl = bits(ext, 12, 14) as usize;
        let dh = bits(ext, 0, 2) as usize;
        let signed = bit(ext, 11);
        let quad = bit(ext, 10);

        let product = if signed {
            (src as i32 as i64).wrapping_mul(self.regs.d[dl] as i32 as i64) as u64
        } else {
            (src as u64).wrapping_mul(self.regs.d[dl] as u64)
        };

        self.regs.sr.c = false;
        if quad {
            self.regs.d[dh] = (product >> 32) as u32;
            self.regs.d[dl] = product as u32;
            self.regs.sr.n = product & 0x8000_0000_0000_0000 != 0;
            self.regs.sr.z = product == 0;
            self.regs.sr.v = false;
        } else {
            self.regs.d[dl] = product as u32;
            self.regs.sr.n = product & 0x8000_0000 != 0;
            self.regs.sr.z = product as u32 == 0;
            self.regs.sr.v = if signed {
                (product as i64) < i32::MIN as i64 || (product as i64) > i32::MAX as i64
            } else {
                product > u32::MAX as u64
            };
        }

        Ok(())
    }

    pub(crate) fn execute_eor<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let src = self.regs.d[reg as usize] as u8;
                let dst = self.get_byte(memory, &mut ea)?;
                let res = self.eor(dst, src);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let src = self.regs.d[reg as usize] as u16;
                let dst = self.get_word(memory, &mut ea)?;
                let res = self.eor(dst, src);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let src = self.regs.d[reg as usize];
                let dst = self.get_long(memory, &mut ea)?;
                let res = self.eor(dst, src);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_eori<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.eor(data, imm as u8);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.eor(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.eor(data, imm);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_eoriccr(&mut self, imm: u16) -> InterpreterResult {
        let sr = self.sr();
        self.regs.sr.set_ccr(sr ^ imm & CCR_MASK);
        Ok(())
    }

    pub(crate) fn execute_eorisr(&mut self, imm: u16) -> InterpreterResult {
        self.check_supervisor()?;
        self.set_sr(self.sr() ^ imm);
        Ok(())
    }

    pub(crate) fn execute_exg(&mut self, rx: u8, mode: Direction, ry: u8) -> InterpreterResult {
        match mode {
            Direction::ExchangeData => self.regs.d.swap(rx as usize, ry as usize),
            Direction::ExchangeAddress => self.regs.a.swap(rx as usize, ry as usize),
            _ => {
                let y = self.regs.a[ry as usize];
                self.regs.a[ry as usize] = self.regs.d[rx as usize];
                self.regs.d[rx as usize] = y;
            },
        }
        Ok(())
    }

    pub(crate) fn execute_ext(&mut self, opmode: u8, reg: u8) -> InterpreterResult {
        match opmode {
            2 => {
                let res = self.regs.d[reg as usize] as i8 as u16;
                self.regs.d_word(reg, res);
                self.movement_flags(res);
            },
            3 => {
                let res = self.regs.d[reg as usize] as i16 as u32;
                self.regs.d[reg as usize] = res;
                self.movement_flags(res);
            },
            _ => {
                // EXTB.L
                let res = self.regs.d[reg as usize] as i8 as u32;
                self.regs.d[reg as usize] = res;
                self.movement_flags(res);
            },
        }
        Ok(())
    }

    pub(crate) fn execute_illegal(&mut self) -> InterpreterResult {
        Err(Vector::IllegalInstruction as u8)
    }

    pub(crate) fn execute_aline(&mut self) -> InterpreterResult {
        Err(Vector::LineAEmulator as u8)
    }

    pub(crate) fn execute_fline(&mut self) -> InterpreterResult {
        Err(Vector::LineFEmulator as u8)
    }

    pub(crate) fn execute_jmp<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, None);
        self.regs.pc = self.get_effective_address(memory, &mut ea)?;
        Ok(())
    }

    pub(crate) fn execute_jsr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, None);
        let addr = self.get_effective_address(memory, &mut ea)?;
        self.push_long(memory, self.regs.pc)?;
        self.regs.pc = addr;
        Ok(())
    }

    pub(crate) fn execute_lea<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, None);
        self.regs.a[reg as usize] = self.get_effective_address(memory, &mut ea)?;
        Ok(())
    }

    pub(crate) fn execute_link<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, disp: i32) -> InterpreterResult {
        let value = self.regs.a[reg as usize];
        self.push_long(memory, value)?;
        self.regs.a[reg as usize] = self.regs.a[7];
        self.regs.a[7] = self.regs.a[7].wrapping_add(disp as u32);
        Ok(())
    }

    pub(crate) fn execute_lsm<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dir: Direction, am: AddressingMode) -> InterpreterResult {
        self.execute_shift_memory(memory, Self::SHIFT_LS, dir, am)
    }

    pub(crate) fn execute_lsr(&mut self, rot: u8, dir: Direction, size: Size, mode: u8, reg: u8) -> InterpreterResult {
        self.execute_shift_register(Self::SHIFT_LS, rot, dir, size, mode, reg)
    }

    pub(crate) fn execute_move<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, dst: AddressingMode, src: AddressingMode) -> InterpreterResult {
        let mut src_ea = EffectiveAddress::new(src, Some(size));
        let mut dst_ea = EffectiveAddress::new(dst, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut src_ea)?;
                self.movement_flags(data);
                self.set_byte(memory, &mut dst_ea, data)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut src_ea)?;
                self.movement_flags(data);
                self.set_word(memory, &mut dst_ea, data)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut src_ea)?;
                self.movement_flags(data);
                self.set_long(memory, &mut dst_ea, data)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_movea<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        self.regs.a[reg as usize] = if size.is_word() {
            self.get_word(memory, &mut ea)? as i16 as u32
        } else {
            self.get_long(memory, &mut ea)?
        };

        Ok(())
    }

    pub(crate) fn execute_moveccr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));
        let ccr = self.get_word(memory, &mut ea)?;
        self.regs.sr.set_ccr(ccr);
        Ok(())
    }

    pub(crate) fn execute_movefccr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));
        let ccr = self.regs.sr.ccr();
        self.set_word(memory, &mut ea, ccr)
    }

    pub(crate) fn execute_movefsr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        // MOVE from SR is privileged from the 68010 on.
        self.check_supervisor()?;
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));
        let sr = self.sr();
        self.set_word(memory, &mut ea, sr)
    }

    pub(crate) fn execute_movesr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        self.check_supervisor()?;
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));
        let sr = self.get_word(memory, &mut ea)?;
        self.set_sr(sr);
        Ok(())
    }

    pub(crate) fn execute_moveusp(&mut self, dir: Direction, reg: u8) -> InterpreterResult {
        self.check_supervisor()?;
        if dir == Direction::UspToRegister {
            self.regs.a[reg as usize] = self.regs.usp;
        } else {
            self.regs.usp = self.regs.a[reg as usize];
        }
        Ok(())
    }

    pub(crate) fn execute_movem<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dir: Direction, size: Size, am: AddressingMode, list: u16) -> InterpreterResult {
        let count = list.count_ones();
        let step = size as u32;

        if am.is_ariwpr() {
            // Predecrement: the mask is reversed (bit 0 is A7) and the
            // registers go to memory from high to low addresses.
            let reg = am.register().unwrap() as usize;
            let mut addr = self.regs.a[reg];
            for i in 0..16 {
                if bit(list, i) {
                    let value = if i < 8 { self.regs.a[7 - i as usize] } else { self.regs.d[15 - i as usize] };
                    addr = addr.wrapping_sub(step);
                    if size.is_word() {
                        self.write_word(memory, addr, value as u16)?;
                    } else {
                        self.write_long(memory, addr, value)?;
                    }
                }
            }
            self.regs.a[reg] = addr;
            return Ok(());
        }

        let mut ea = EffectiveAddress::new(am, Some(size));
        let postinc = am.is_ariwpo();
        let mut addr = if postinc {
            // The increment is applied once at the end.
            let reg = am.register().unwrap() as usize;
            let addr = self.regs.a[reg];
            self.regs.a[reg] = addr.wrapping_add(step * count);
            addr
        } else {
            self.get_effective_address(memory, &mut ea)?
        };

        for i in 0..16 {
            if !bit(list, i) {
                continue;
            }
            if dir == Direction::MemoryToRegister {
                let value = if size.is_word() {
                    self.read_word(memory, addr)? as i16 as u32
                } else {
                    self.read_long(memory, addr)?
                };
                if i < 8 {
                    self.regs.d[i as usize] = value;
                } else {
                    self.regs.a[i as usize - 8] = value;
                }
            } else {
                let value = if i < 8 { self.regs.d[i as usize] } else { self.regs.a[i as usize - 8] };
                if size.is_word() {
                    self.write_word(memory, addr, value as u16)?;
                } else {
                    self.write_long(memory, addr, value)?;
                }
            }
            addr = addr.wrapping_add(step);
        }

        Ok(())
    }

    pub(crate) fn execute_movep<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dreg: u8, dir: Direction, size: Size, areg: u8, disp: i16) -> InterpreterResult {
        let mut addr = self.regs.a[areg as usize].wrapping_add(disp as u32);
        let count = size as u32; // 2 or 4 bytes, every other address.

        if dir == Direction::RegisterToMemory {
            let mut shift = (count - 1) * 8;
            for _ in 0..count {
                self.write_byte(memory, addr, (self.regs.d[dreg as usize] >> shift) as u8)?;
                addr = addr.wrapping_add(2);
                shift = shift.wrapping_sub(8);
            }
        } else {
            let mut value = 0u32;
            for _ in 0..count {
                value = value << 8 | self.read_byte(memory, addr)? as u32;
                addr = addr.wrapping_add(2);
            }
            if size.is_word() {
                self.regs.d_word(dreg, value as u16);
            } else {
                self.regs.d[dreg as usize] = value;
            }
        }

        Ok(())
    }

    pub(crate) fn execute_moveq(&mut self, reg: u8, data: i8) -> InterpreterResult {
        let value = data as u32;
        self.regs.d[reg as usize] = value;
        self.movement_flags(value);
        Ok(())
    }

    /// MOVEC control register access, honoring the A7 aliasing of the three
    /// stack pointers.
    pub(crate) fn execute_movec(&mut self, dir: Direction, ext: u16) -> InterpreterResult {
        self.check_supervisor()?;

        let reg = bits(ext, 12, 14) as usize;
        let address_reg = bit(ext, 15);
        let ctrl = bits(ext, 0, 11);

        if dir == Direction::RegisterToMemory {
            let value = if address_reg { self.regs.a[reg] } else { self.regs.d[reg] };
            match ctrl {
                0x000 => self.regs.sfc = value & 7,
                0x001 => self.regs.dfc = value & 7,
                0x002 => self.regs.cacr = value & 0x8000_8000,
                0x003 => self.regs.tc = value & 0xc000,
                0x004 => self.regs.itt[0] = value,
                0x005 => self.regs.itt[1] = value,
                0x006 => self.regs.dtt[0] = value,
                0x007 => self.regs.dtt[1] = value,
                0x800 => self.regs.usp = value,
                0x801 => self.regs.vbr = value,
                0x802 => self.regs.caar = value,
                0x803 => if self.regs.sr.m { self.regs.a[7] = value } else { self.regs.msp = value },
                0x804 => if self.regs.sr.m { self.regs.isp = value } else { self.regs.a[7] = value },
                0x805 => self.regs.mmusr = value,
                0x806 => self.regs.urp = value,
                0x807 => self.regs.srp = value,
                _ => return Err(Vector::IllegalInstruction as u8),
            }
        } else {
            let value = match ctrl {
                0x000 => self.regs.sfc,
                0x001 => self.regs.dfc,
                0x002 => self.regs.cacr,
                0x003 => self.regs.tc,
                0x004 => self.regs.itt[0],
                0x005 => self.regs.itt[1],
                0x006 => self.regs.dtt[0],
                0x007 => self.regs.dtt[1],
                0x800 => self.regs.usp,
                0x801 => self.regs.vbr,
                0x802 => self.regs.caar,
                0x803 => if self.regs.sr.m { self.regs.a[7] } else { self.regs.msp },
                0x804 => if self.regs.sr.m { self.regs.isp } else { self.regs.a[7] },
                0x805 => self.regs.mmusr,
                0x806 => self.regs.urp,
                0x807 => self.regs.srp,
                _ => return Err(Vector::IllegalInstruction as u8),
            };
            if address_reg {
                self.regs.a[reg] = value;
            } else {
                self.regs.d[reg] = value;
            }
        }

        Ok(())
    }

    pub(crate) fn execute_moves<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, opcode: u16, ext: u16, am: AddressingMode) -> InterpreterResult {
        // Alternate address spaces collapse to the single memory plane, so
        // this degenerates to a plain sized move.
        self.check_supervisor()?;

        let size = Size::from(bits(opcode, 6, 7));
        let reg = bits(ext, 12, 14) as usize;
        let address_reg = bit(ext, 15);
        let to_memory = bit(ext, 11);
        let mut ea = EffectiveAddress::new(am, Some(size));

        if to_memory {
            let value = if address_reg { self.regs.a[reg] } else { self.regs.d[reg] };
            match size {
                Size::Byte => self.set_byte(memory, &mut ea, value as u8),
                Size::Word => self.set_word(memory, &mut ea, value as u16),
                Size::Long => self.set_long(memory, &mut ea, value),
            }
        } else {
            match size {
                Size::Byte => {
                    let value = self.get_byte(memory, &mut ea)?;
                    if address_reg {
                        self.regs.a[reg] = value as i8 as u32;
                    } else {
                        self.regs.d_byte(reg as u8, value);
                    }
                    Ok(())
                },
                Size::Word => {
                    let value = self.get_word(memory, &mut ea)?;
                    if address_reg {
                        self.regs.a[reg] = value as i16 as u32;
                    } else {
                        self.regs.d_word(reg as u8, value);
                    }
                    Ok(())
                },
                Size::Long => {
                    let value = self.get_long(memory, &mut ea)?;
                    if address_reg {
                        self.regs.a[reg] = value;
                    } else {
                        self.regs.d[reg] = value;
                    }
                    Ok(())
                },
            }
        }
    }

    /// MOVE16: 16-byte cache-line transfer, addresses aligned down.
    pub(crate) fn execute_move16<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, opmode: u8, reg: u8, other: u32) -> InterpreterResult {
        let (src, dst) = match opmode {
            0 => (self.regs.a[reg as usize], other),
            1 => (other, self.regs.a[reg as usize]),
            2 => (self.regs.a[reg as usize], other),
            3 => (other, self.regs.a[reg as usize]),
            _ => {
                let ry = (other >> 12 & 7) as usize;
                let src = self.regs.a[reg as usize];
                let dst = self.regs.a[ry];
                self.regs.a[reg as usize] = src.wrapping_add(16);
                // With Ax == Ay, a single increment survives.
                self.regs.a[ry] = self.regs.a[ry].wrapping_add(16);
                (src, dst)
            },
        };

        let src = src & !15;
        let dst = dst & !15;
        for i in (0..16).step_by(4) {
            let data = self.read_long(memory, src + i)?;
            self.write_long(memory, dst + i, data)?;
        }

        if opmode == 0 || opmode == 1 {
            self.regs.a[reg as usize] = self.regs.a[reg as usize].wrapping_add(16);
        }

        Ok(())
    }

    pub(crate) fn execute_muls<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));

        let src = self.get_word(memory, &mut ea)? as i16 as i32;
        let dst = self.regs.d[reg as usize] as i16 as i32;

        let res = (src * dst) as u32;
        self.regs.d[reg as usize] = res;
        self.movement_flags(res);

        Ok(())
    }

    pub(crate) fn execute_mulu<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Word));

        let src = self.get_word(memory, &mut ea)? as u32;
        let dst = self.regs.d[reg as usize] as u16 as u32;

        let res = src * dst;
        self.regs.d[reg as usize] = res;
        self.movement_flags(res);

        Ok(())
    }

    pub(crate) fn execute_nbcd<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
        let data = self.get_byte(memory, &mut ea)? as u16;
        let x = self.regs.sr.x as u16;

        // 0 - data - X in BCD: 0x9a is the ten's complement identity.
        let mut res = 0x9au16.wrapping_sub(data).wrapping_sub(x);
        if res != 0x9a {
            if res & 0x0f == 0x0a {
                res = (res & 0xf0) + 0x10;
            }
            res &= 0xff;
            self.regs.sr.c = true;
            self.regs.sr.x = true;
        } else {
            res = 0;
            self.regs.sr.c = false;
            self.regs.sr.x = false;
        }

        self.regs.sr.n = res & 0x80 != 0;
        if res != 0 { self.regs.sr.z = false; }

        self.set_byte(memory, &mut ea, res as u8)
    }

    pub(crate) fn execute_neg<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.sub::<u8, i8, false, false>(0, data);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.sub::<u16, i16, false, false>(0, data);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.sub::<u32, i32, false, false>(0, data);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_negx<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.sub::<u8, i8, true, false>(0, data);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.sub::<u16, i16, true, false>(0, data);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.sub::<u32, i32, true, false>(0, data);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_nop(&mut self) -> InterpreterResult {
        Ok(())
    }

    pub(crate) fn execute_not<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = !self.get_byte(memory, &mut ea)?;
                self.movement_flags(data);
                self.set_byte(memory, &mut ea, data)?;
            },
            Size::Word => {
                let data = !self.get_word(memory, &mut ea)?;
                self.movement_flags(data);
                self.set_word(memory, &mut ea, data)?;
            },
            Size::Long => {
                let data = !self.get_long(memory, &mut ea)?;
                self.movement_flags(data);
                self.set_long(memory, &mut ea, data)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_or<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, dir: Direction, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let src = self.regs.d[reg as usize] as u8;
                let dst = self.get_byte(memory, &mut ea)?;

                let res = self.or(dst, src);

                if dir == Direction::DstEa {
                    self.set_byte(memory, &mut ea, res)?;
                } else {
                    self.regs.d_byte(reg, res);
                }
            },
            Size::Word => {
                let src = self.regs.d[reg as usize] as u16;
                let dst = self.get_word(memory, &mut ea)?;

                let res = self.or(dst, src);

                if dir == Direction::DstEa {
                    self.set_word(memory, &mut ea, res)?;
                } else {
                    self.regs.d_word(reg, res);
                }
            },
            Size::Long => {
                let src = self.regs.d[reg as usize];
                let dst = self.get_long(memory, &mut ea)?;

                let res = self.or(dst, src);

                if dir == Direction::DstEa {
                    self.set_long(memory, &mut ea, res)?;
                } else {
                    self.regs.d[reg as usize] = res;
                }
            },
        }

        Ok(())
    }

    pub(crate) fn execute_ori<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.or(data, imm as u8);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.or(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.or(data, imm);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_oriccr(&mut self, imm: u16) -> InterpreterResult {
        let sr = self.sr();
        self.regs.sr.set_ccr(sr | imm & CCR_MASK);
        Ok(())
    }

    pub(crate) fn execute_orisr(&mut self, imm: u16) -> InterpreterResult {
        self.check_supervisor()?;
        self.set_sr(self.sr() | imm);
        Ok(())
    }

    pub(crate) fn execute_pack<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, rx: u8, mode: Direction, ry: u8, adjustment: u16) -> InterpreterResult {
        let src = if mode == Direction::MemoryToMemory {
            let addr = self.ariwpr(ry, Size::Word);
            self.read_word(memory, addr)?
        } else {
            self.regs.d[ry as usize] as u16
        };

        let src = src.wrapping_add(adjustment);
        let res = (src >> 4 & 0xf0 | src & 0x0f) as u8;

        if mode == Direction::MemoryToMemory {
            let addr = self.ariwpr(rx, Size::Byte);
            self.write_byte(memory, addr, res)
        } else {
            self.regs.d_byte(rx, res);
            Ok(())
        }
    }

    pub(crate) fn execute_unpk<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, rx: u8, mode: Direction, ry: u8, adjustment: u16) -> InterpreterResult {
        let src = if mode == Direction::MemoryToMemory {
            let addr = self.ariwpr(ry, Size::Byte);
            self.read_byte(memory, addr)?
        } else {
            self.regs.d[ry as usize] as u8
        };

        let res = ((src as u16 & 0xf0) << 4 | src as u16 & 0x0f).wrapping_add(adjustment);

        if mode == Direction::MemoryToMemory {
            let addr = self.ariwpr(rx, Size::Word);
            self.write_word(memory, addr, res)
        } else {
            self.regs.d_word(rx, res);
            Ok(())
        }
    }

    pub(crate) fn execute_pea<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, None);
        let addr = self.get_effective_address(memory, &mut ea)?;
        self.push_long(memory, addr)
    }

    pub(crate) fn execute_reset<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> InterpreterResult {
        self.check_supervisor()?;
        memory.reset_instruction();
        Ok(())
    }

    pub(crate) fn execute_rom<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dir: Direction, am: AddressingMode) -> InterpreterResult {
        self.execute_shift_memory(memory, Self::SHIFT_RO, dir, am)
    }

    pub(crate) fn execute_ror(&mut self, rot: u8, dir: Direction, size: Size, mode: u8, reg: u8) -> InterpreterResult {
        self.execute_shift_register(Self::SHIFT_RO, rot, dir, size, mode, reg)
    }

    pub(crate) fn execute_roxm<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, dir: Direction, am: AddressingMode) -> InterpreterResult {
        self.execute_shift_memory(memory, Self::SHIFT_ROX, dir, am)
    }

    pub(crate) fn execute_roxr(&mut self, rot: u8, dir: Direction, size: Size, mode: u8, reg: u8) -> InterpreterResult {
        self.execute_shift_register(Self::SHIFT_ROX, rot, dir, size, mode, reg)
    }

    pub(crate) fn execute_rtd<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, disp: u16) -> InterpreterResult {
        self.regs.pc = self.pop_long(memory)?;
        self.regs.a[7] = self.regs.a[7].wrapping_add(disp as i16 as u32);
        Ok(())
    }

    pub(crate) fn execute_rte<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> InterpreterResult {
        self.check_supervisor()?;

        loop {
            let sr = self.pop_word(memory)?;
            let pc = self.pop_long(memory)?;
            let format = self.pop_word(memory)?;

            match format >> 12 {
                0x0 => {
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                // A throwaway frame: load its SR and keep unwinding.
                0x1 => {
                    self.set_sr(sr);
                    continue;
                },
                0x2 | 0x3 => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(4);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                0x7 => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(52);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                0x8 => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(50);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                0x9 => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(12);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                0xa => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(24);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                0xb => {
                    self.regs.a[7] = self.regs.a[7].wrapping_add(84);
                    self.set_sr(sr);
                    self.regs.pc = pc;
                    return Ok(());
                },
                _ => return Err(Vector::FormatError as u8),
            }
        }
    }

    pub(crate) fn execute_rtr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> InterpreterResult {
        let ccr = self.pop_word(memory)?;
        let sr = self.sr() & SR_UPPER_MASK | ccr & CCR_MASK;
        self.regs.sr.set_ccr(sr);
        self.regs.pc = self.pop_long(memory)?;
        Ok(())
    }

    pub(crate) fn execute_rts<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M) -> InterpreterResult {
        self.regs.pc = self.pop_long(memory)?;
        Ok(())
    }

    pub(crate) fn execute_sbcd<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ry: u8, mode: Direction, rx: u8) -> InterpreterResult {
        let (src, dst) = if mode == Direction::MemoryToMemory {
            let src_addr = self.ariwpr(rx, Size::Byte);
            let dst_addr = self.ariwpr(ry, Size::Byte);
            (self.read_byte(memory, src_addr)?, self.read_byte(memory, dst_addr)?)
        } else {
            (self.regs.d[rx as usize] as u8, self.regs.d[ry as usize] as u8)
        };
        let src = src.wrapping_add(self.regs.sr.x as u8);

        let bin_res = (dst as u16).wrapping_sub(src as u16);

        let mut res = (dst & 0x0f).wrapping_sub(src & 0x0f);
        if res >= 0x0a {
            res = res.wrapping_sub(0x06);
        }

        res = res.wrapping_add((dst & 0xf0).wrapping_sub(src & 0xf0));
        if res >= 0xa0 || bin_res > 0x99 {
            res = res.wrapping_sub(0x60);
        }

        self.regs.sr.n = res & 0x80 != 0;
        if res != 0 { self.regs.sr.z = false; }
        self.regs.sr.v = res < 0x80 && bin_res > 0x99;
        self.regs.sr.c = src > dst;
        self.regs.sr.x = self.regs.sr.c;

        if mode == Direction::MemoryToMemory {
            let addr = self.regs.a[ry as usize];
            self.write_byte(memory, addr, res)
        } else {
            self.regs.d_byte(ry, res);
            Ok(())
        }
    }

    pub(crate) fn execute_scc<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, cc: u8, am: AddressingMode) -> InterpreterResult {
        let condition = self.regs.sr.condition(cc);

        let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
        self.set_byte(memory, &mut ea, if condition { 0xff } else { 0 })
    }

    pub(crate) fn execute_stop(&mut self, imm: u16) -> InterpreterResult {
        self.check_supervisor()?;

        // The 68040 stops regardless of what the loaded SR says.
        self.set_sr(imm);
        self.stopped = true;
        Ok(())
    }

    pub(crate) fn execute_sub<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, dir: Direction, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize] as u8, self.get_byte(memory, &mut ea)?)
                } else {
                    (self.get_byte(memory, &mut ea)?, self.regs.d[reg as usize] as u8)
                };

                let res = self.sub::<u8, i8, false, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_byte(memory, &mut ea, res)?;
                } else {
                    self.regs.d_byte(reg, res);
                }
            },
            Size::Word => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize] as u16, self.get_word(memory, &mut ea)?)
                } else {
                    (self.get_word(memory, &mut ea)?, self.regs.d[reg as usize] as u16)
                };

                let res = self.sub::<u16, i16, false, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_word(memory, &mut ea, res)?;
                } else {
                    self.regs.d_word(reg, res);
                }
            },
            Size::Long => {
                let (src, dst) = if dir == Direction::DstEa {
                    (self.regs.d[reg as usize], self.get_long(memory, &mut ea)?)
                } else {
                    (self.get_long(memory, &mut ea)?, self.regs.d[reg as usize])
                };

                let res = self.sub::<u32, i32, false, false>(dst, src);

                if dir == Direction::DstEa {
                    self.set_long(memory, &mut ea, res)?;
                } else {
                    self.regs.d[reg as usize] = res;
                }
            },
        }

        Ok(())
    }

    pub(crate) fn execute_suba<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        let src = if size.is_word() {
            self.get_word(memory, &mut ea)? as i16 as u32
        } else {
            self.get_long(memory, &mut ea)?
        };

        self.regs.a[reg as usize] = self.regs.a[reg as usize].wrapping_sub(src);

        Ok(())
    }

    pub(crate) fn execute_subi<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode, imm: u32) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.sub::<u8, i8, false, false>(data, imm as u8);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.sub::<u16, i16, false, false>(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.sub::<u32, i32, false, false>(data, imm);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_subq<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, imm: u8, size: Size, am: AddressingMode) -> InterpreterResult {
        let imm = if imm == 0 { 8 } else { imm };

        if am.is_ard() {
            let reg = am.register().unwrap() as usize;
            self.regs.a[reg] = self.regs.a[reg].wrapping_sub(imm as u32);
            return Ok(());
        }

        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                let res = self.sub::<u8, i8, false, false>(data, imm);
                self.set_byte(memory, &mut ea, res)?;
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                let res = self.sub::<u16, i16, false, false>(data, imm as u16);
                self.set_word(memory, &mut ea, res)?;
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                let res = self.sub::<u32, i32, false, false>(data, imm as u32);
                self.set_long(memory, &mut ea, res)?;
            },
        }

        Ok(())
    }

    pub(crate) fn execute_subx<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, rx: u8, size: Size, mode: Direction, ry: u8) -> InterpreterResult {
        match size {
            Size::Byte => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_byte(memory, src_addr)?, self.read_byte(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize] as u8, self.regs.d[rx as usize] as u8)
                };

                let res = self.sub::<u8, i8, true, false>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_byte(memory, addr, res)
                } else {
                    self.regs.d_byte(rx, res);
                    Ok(())
                }
            },
            Size::Word => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_word(memory, src_addr)?, self.read_word(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize] as u16, self.regs.d[rx as usize] as u16)
                };

                let res = self.sub::<u16, i16, true, false>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_word(memory, addr, res)
                } else {
                    self.regs.d_word(rx, res);
                    Ok(())
                }
            },
            Size::Long => {
                let (src, dst) = if mode == Direction::MemoryToMemory {
                    let src_addr = self.ariwpr(ry, size);
                    let dst_addr = self.ariwpr(rx, size);
                    (self.read_long(memory, src_addr)?, self.read_long(memory, dst_addr)?)
                } else {
                    (self.regs.d[ry as usize], self.regs.d[rx as usize])
                };

                let res = self.sub::<u32, i32, true, false>(dst, src);

                if mode == Direction::MemoryToMemory {
                    let addr = self.regs.a[rx as usize];
                    self.write_long(memory, addr, res)
                } else {
                    self.regs.d[rx as usize] = res;
                    Ok(())
                }
            },
        }
    }

    pub(crate) fn execute_swap(&mut self, reg: u8) -> InterpreterResult {
        let value = self.regs.d[reg as usize];
        let res = value.rotate_left(16);
        self.regs.d[reg as usize] = res;
        self.movement_flags(res);
        Ok(())
    }

    pub(crate) fn execute_tas<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(Size::Byte));
        let data = self.get_byte(memory, &mut ea)?;

        self.regs.sr.n = data & 0x80 != 0;
        self.regs.sr.z = data == 0;
        self.regs.sr.v = false;
        self.regs.sr.c = false;

        self.set_byte(memory, &mut ea, data | 0x80)
    }

    pub(crate) fn execute_trap(&mut self, vector: u8) -> InterpreterResult {
        Err(Vector::Trap0Instruction as u8 + vector)
    }

    pub(crate) fn execute_trapcc(&mut self, cc: u8) -> InterpreterResult {
        if self.regs.sr.condition(cc) {
            Err(Vector::TrapVInstruction as u8)
        } else {
            Ok(())
        }
    }

    pub(crate) fn execute_trapv(&mut self) -> InterpreterResult {
        if self.regs.sr.v {
            Err(Vector::TrapVInstruction as u8)
        } else {
            Ok(())
        }
    }

    pub(crate) fn execute_tst<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, size: Size, am: AddressingMode) -> InterpreterResult {
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let data = self.get_byte(memory, &mut ea)?;
                self.movement_flags(data);
            },
            Size::Word => {
                let data = self.get_word(memory, &mut ea)?;
                self.movement_flags(data);
            },
            Size::Long => {
                let data = self.get_long(memory, &mut ea)?;
                self.movement_flags(data);
            },
        }

        Ok(())
    }

    pub(crate) fn execute_unlk<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, reg: u8) -> InterpreterResult {
        self.regs.a[7] = self.regs.a[reg as usize];
        self.regs.a[reg as usize] = self.pop_long(memory)?;
        Ok(())
    }

    /// Cache and MMU maintenance: no caches and no MMU here, only the
    /// privilege check survives.
    pub(crate) fn execute_cache_mmu_op(&mut self) -> InterpreterResult {
        self.check_supervisor()
    }

    // Bit fields.

    /// Decodes a bit field extension word against the register file:
    /// (offset, width).
    fn bitfield_params(&self, ext: u16) -> (i32, u32) {
        let offset = if bit(ext, 11) {
            self.regs.d[bits(ext, 6, 8) as usize] as i32
        } else {
            bits(ext, 6, 10) as i32
        };
        let width = if bit(ext, 5) {
            self.regs.d[bits(ext, 0, 2) as usize] % 32
        } else {
            bits(ext, 0, 4) as u32
        };
        (offset, if width == 0 { 32 } else { width })
    }

    /// Reads a bit field, either rotating inside a data register or spanning
    /// up to five bytes of memory. Returns the field (right-aligned), plus
    /// the state needed to write it back.
    fn bitfield_load<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, am: AddressingMode, ext: u16) -> Result<BitField, u8> {
        let (offset, width) = self.bitfield_params(ext);

        if am.is_drd() {
            let reg = am.register().unwrap();
            let rot = offset.rem_euclid(32) as u32;
            let field = self.regs.d[reg as usize].rotate_left(rot) >> (32 - width);
            Ok(BitField { field, width, in_register: Some((reg, rot)), addr: 0, bit_offset: 0, span: 0 })
        } else {
            let mut ea = EffectiveAddress::new(am, None);
            let base = self.get_effective_address(memory, &mut ea)?;
            let addr = base.wrapping_add((offset >> 3) as u32);
            let bit_offset = (offset & 7) as u32;
            let span = (bit_offset + width + 7) / 8;

            let mut word = 0u64;
            for i in 0..span {
                word = word << 8 | self.read_byte(memory, addr.wrapping_add(i))? as u64;
            }
            let total = span * 8;
            let field = (word >> (total - bit_offset - width)) as u32 & width_mask(width);
            Ok(BitField { field, width, in_register: None, addr, bit_offset, span })
        }
    }

    fn bitfield_store<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, bf: &BitField, value: u32) -> InterpreterResult {
        let value = value & width_mask(bf.width);
        if let Some((reg, rot)) = bf.in_register {
            let rotated = self.regs.d[reg as usize].rotate_left(rot);
            let cleared = rotated & !(width_mask(bf.width) << (32 - bf.width));
            self.regs.d[reg as usize] = (cleared | value << (32 - bf.width)).rotate_right(rot);
        } else {
            let total = bf.span * 8;
            let shift = total - bf.bit_offset - bf.width;
            let mut word = 0u64;
            for i in 0..bf.span {
                word = word << 8 | self.read_byte(memory, bf.addr.wrapping_add(i))? as u64;
            }
            word &= !((width_mask(bf.width) as u64) << shift);
            word |= (value as u64) << shift;
            for i in (0..bf.span).rev() {
                self.write_byte(memory, bf.addr.wrapping_add(i), word as u8)?;
                word >>= 8;
            }
        }
        Ok(())
    }

    fn bitfield_flags(&mut self, field: u32, width: u32) {
        self.regs.sr.n = field & 1 << (width - 1) != 0;
        self.regs.sr.z = field == 0;
        self.regs.sr.v = false;
        self.regs.sr.c = false;
    }

    pub(crate) fn execute_bftst<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        Ok(())
    }

    pub(crate) fn execute_bfchg<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        self.bitfield_store(memory, &bf, !bf.field)
    }

    pub(crate) fn execute_bfclr<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        self.bitfield_store(memory, &bf, 0)
    }

    pub(crate) fn execute_bfset<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        self.bitfield_store(memory, &bf, u32::MAX)
    }

    pub(crate) fn execute_bfextu<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        self.regs.d[bits(ext, 12, 14) as usize] = bf.field;
        Ok(())
    }

    pub(crate) fn execute_bfexts<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);
        let shift = 32 - bf.width;
        self.regs.d[bits(ext, 12, 14) as usize] = (bf.field << shift) as i32 as u32 >> shift;
        Ok(())
    }

    pub(crate) fn execute_bfins<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let bf = self.bitfield_load(memory, am, ext)?;
        let value = self.regs.d[bits(ext, 12, 14) as usize] & width_mask(bf.width);
        self.bitfield_flags(value, bf.width);
        self.bitfield_store(memory, &bf, value)
    }

    pub(crate) fn execute_bfffo<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ext: u16, am: AddressingMode) -> InterpreterResult {
        let (offset, _) = self.bitfield_params(ext);
        let bf = self.bitfield_load(memory, am, ext)?;
        self.bitfield_flags(bf.field, bf.width);

        let mut ffo = offset.wrapping_add(bf.width as i32);
        for i in (0..bf.width).rev() {
            if bf.field & 1 << i != 0 {
                ffo = offset.wrapping_add((bf.width - 1 - i) as i32);
                break;
            }
        }
        self.regs.d[bits(ext, 12, 14) as usize] = ffo as u32;
        Ok(())
    }

    /// CAS: compare the operand with Dc; on match store Du, else load Dc.
    pub(crate) fn execute_cas<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, opcode: u16, ext: u16, am: AddressingMode) -> InterpreterResult {
        let size = Size::from(bits(opcode, 9, 10) - 1);
        let du = bits(ext, 6, 8) as usize;
        let dc = bits(ext, 0, 2) as usize;
        let mut ea = EffectiveAddress::new(am, Some(size));

        match size {
            Size::Byte => {
                let dst = self.get_byte(memory, &mut ea)?;
                self.sub::<u8, i8, false, true>(dst, self.regs.d[dc] as u8);
                if self.regs.sr.z {
                    let value = self.regs.d[du] as u8;
                    self.set_byte(memory, &mut ea, value)?;
                } else {
                    self.regs.d_byte(dc as u8, dst);
                }
            },
            Size::Word => {
                let dst = self.get_word(memory, &mut ea)?;
                self.sub::<u16, i16, false, true>(dst, self.regs.d[dc] as u16);
                if self.regs.sr.z {
                    let value = self.regs.d[du] as u16;
                    self.set_word(memory, &mut ea, value)?;
                } else {
                    self.regs.d_word(dc as u8, dst);
                }
            },
            Size::Long => {
                let dst = self.get_long(memory, &mut ea)?;
                self.sub::<u32, i32, false, true>(dst, self.regs.d[dc]);
                if self.regs.sr.z {
                    let value = self.regs.d[du];
                    self.set_long(memory, &mut ea, value)?;
                } else {
                    self.regs.d[dc] = dst;
                }
            },
        }

        Ok(())
    }

    /// CMP2/CHK2: bounds check against a (lower, upper) pair in memory.
    pub(crate) fn execute_chk2<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, opcode: u16, ext: u16, am: AddressingMode) -> InterpreterResult {
        let size = Size::from(bits(opcode, 9, 10));
        let reg = bits(ext, 12, 14) as usize;
        let address_reg = bit(ext, 15);
        let chk = bit(ext, 11);

        let mut ea = EffectiveAddress::new(am, Some(size));
        let addr = self.get_effective_address(memory, &mut ea)?;

        let (lower, upper) = match size {
            Size::Byte => (self.read_byte(memory, addr)? as i8 as i32, self.read_byte(memory, addr.wrapping_add(1))? as i8 as i32),
            Size::Word => (self.read_word(memory, addr)? as i16 as i32, self.read_word(memory, addr.wrapping_add(2))? as i16 as i32),
            Size::Long => (self.read_long(memory, addr)? as i32, self.read_long(memory, addr.wrapping_add(4))? as i32),
        };

        let value = if address_reg {
            self.regs.a[reg] as i32
        } else {
            match size {
                Size::Byte => self.regs.d[reg] as i8 as i32,
                Size::Word => self.regs.d[reg] as i16 as i32,
                Size::Long => self.regs.d[reg] as i32,
            }
        };

        self.regs.sr.z = value == lower || value == upper;
        self.regs.sr.c = if lower <= upper {
            value < lower || value > upper
        } else {
            // Wrapped (unsigned-style) bounds.
            value < lower && value > upper
        };

        if chk && self.regs.sr.c {
            Err(Vector::ChkInstruction as u8)
        } else {
            Ok(())
        }
    }
}

const fn width_mask(width: u32) -> u32 {
    if width == 32 { u32::MAX } else { (1 << width) - 1 }
}

/// State of a loaded bit field, enough to store a new value back.
struct BitField {
    field: u32,
    width: u32,
    /// Some((register, rotation)) for the data register form.
    in_register: Option<(u8, u32)>,
    addr: u32,
    bit_offset: u32,
    span: u32,
}

/// The execute dispatch table, indexed by [Isa].
pub(crate) struct Execute<M: MemoryAccess + ?Sized>(std::marker::PhantomData<M>);

type ExecuteFn<M> = fn(&mut M68040, &mut M, &Instruction) -> InterpreterResult;

impl<M: MemoryAccess + ?Sized> Execute<M> {
    pub const EXECUTE: [ExecuteFn<M>; Isa::_Size as usize] = [
        dispatch::unknown,
        dispatch::abcd,
        dispatch::add,
        dispatch::adda,
        dispatch::addi,
        dispatch::addq,
        dispatch::addx,
        dispatch::aline,
        dispatch::and,
        dispatch::andi,
        dispatch::andiccr,
        dispatch::andisr,
        dispatch::asm,
        dispatch::asr,
        dispatch::bcc,
        dispatch::bchg,
        dispatch::bclr,
        dispatch::bfchg,
        dispatch::bfclr,
        dispatch::bfexts,
        dispatch::bfextu,
        dispatch::bfffo,
        dispatch::bfins,
        dispatch::bfset,
        dispatch::bftst,
        dispatch::bkpt,
        dispatch::bra,
        dispatch::bset,
        dispatch::bsr,
        dispatch::btst,
        dispatch::cas,
        dispatch::chk,
        dispatch::chk2,
        dispatch::cache_mmu_op,
        dispatch::clr,
        dispatch::cmp,
        dispatch::cmpa,
        dispatch::cmpi,
        dispatch::cmpm,
        dispatch::cache_mmu_op,
        dispatch::dbcc,
        dispatch::divl,
        dispatch::divs,
        dispatch::divu,
        dispatch::unknown,
        dispatch::eor,
        dispatch::eori,
        dispatch::eoriccr,
        dispatch::eorisr,
        dispatch::exg,
        dispatch::ext,
        dispatch::fline,
        dispatch::illegal,
        dispatch::jmp,
        dispatch::jsr,
        dispatch::lea,
        dispatch::link,
        dispatch::link_l,
        dispatch::lsm,
        dispatch::lsr,
        dispatch::r#move,
        dispatch::move16,
        dispatch::movea,
        dispatch::moveccr,
        dispatch::movec,
        dispatch::movefccr,
        dispatch::movefsr,
        dispatch::movem,
        dispatch::movep,
        dispatch::moveq,
        dispatch::moves,
        dispatch::movesr,
        dispatch::moveusp,
        dispatch::mull,
        dispatch::muls,
        dispatch::mulu,
        dispatch::nbcd,
        dispatch::neg,
        dispatch::negx,
        dispatch::nop,
        dispatch::not,
        dispatch::or,
        dispatch::ori,
        dispatch::oriccr,
        dispatch::orisr,
        dispatch::pack,
        dispatch::pea,
        dispatch::cache_mmu_op,
        dispatch::reset,
        dispatch::rom,
        dispatch::ror,
        dispatch::roxm,
        dispatch::roxr,
        dispatch::rtd,
        dispatch::rte,
        dispatch::rtr,
        dispatch::rts,
        dispatch::sbcd,
        dispatch::scc,
        dispatch::stop,
        dispatch::sub,
        dispatch::suba,
        dispatch::subi,
        dispatch::subq,
        dispatch::subx,
        dispatch::swap,
        dispatch::tas,
        dispatch::trap,
        dispatch::trapcc,
        dispatch::trapv,
        dispatch::tst,
        dispatch::unlk,
        dispatch::unpk,
    ];
}

/// Thin adapters that destructure the operands for each handler.
mod dispatch {
    use super::*;

    pub fn unknown<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_unknown()
    }

    pub fn abcd<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeModeRegister(rx, _, mode, ry) => cpu.execute_abcd(m, rx, mode, ry),
            _ => unreachable!(),
        }
    }

    pub fn add<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, dir, size, am) => cpu.execute_add(m, reg, dir, size, am),
            _ => unreachable!(),
        }
    }

    pub fn adda<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeEffectiveAddress(reg, size, am) => cpu.execute_adda(m, reg, size, am),
            _ => unreachable!(),
        }
    }

    pub fn addi<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_addi(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn addq<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DataSizeEffectiveAddress(data, size, am) => cpu.execute_addq(m, data, size, am),
            _ => unreachable!(),
        }
    }

    pub fn addx<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeModeRegister(rx, size, mode, ry) => cpu.execute_addx(m, rx, size, mode, ry),
            _ => unreachable!(),
        }
    }

    pub fn aline<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_aline()
    }

    pub fn and<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, dir, size, am) => cpu.execute_and(m, reg, dir, size, am),
            _ => unreachable!(),
        }
    }

    pub fn andi<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_andi(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn andiccr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_andiccr(imm),
            _ => unreachable!(),
        }
    }

    pub fn andisr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_andisr(imm),
            _ => unreachable!(),
        }
    }

    pub fn asm<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionEffectiveAddress(dir, am) => cpu.execute_asm(m, dir, am),
            _ => unreachable!(),
        }
    }

    pub fn asr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RotationDirectionSizeModeRegister(rot, dir, size, mode, reg) => cpu.execute_asr(rot, dir, size, mode, reg),
            _ => unreachable!(),
        }
    }

    pub fn bcc<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ConditionDisplacement(cc, disp) => cpu.execute_bcc(i.pc.wrapping_add(2), cc, disp),
            _ => unreachable!(),
        }
    }

    pub fn bchg<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddressCount(am, count) => cpu.execute_bchg(m, am, count),
            _ => unreachable!(),
        }
    }

    pub fn bclr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddressCount(am, count) => cpu.execute_bclr(m, am, count),
            _ => unreachable!(),
        }
    }

    pub fn bfchg<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfchg(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfclr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfclr(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfexts<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfexts(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfextu<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfextu(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfffo<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfffo(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfins<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfins(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bfset<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bfset(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bftst<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_bftst(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn bkpt<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_illegal()
    }

    pub fn bra<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Displacement(disp) => cpu.execute_bra(i.pc.wrapping_add(2), disp),
            _ => unreachable!(),
        }
    }

    pub fn bset<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddressCount(am, count) => cpu.execute_bset(m, am, count),
            _ => unreachable!(),
        }
    }

    pub fn bsr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Displacement(disp) => cpu.execute_bsr(m, i.pc.wrapping_add(2), disp),
            _ => unreachable!(),
        }
    }

    pub fn btst<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddressCount(am, count) => cpu.execute_btst(m, am, count),
            _ => unreachable!(),
        }
    }

    pub fn cas<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_cas(m, i.opcode, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn chk<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_chk(m, i.opcode, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn chk2<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_chk2(m, i.opcode, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn cache_mmu_op<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_cache_mmu_op()
    }

    pub fn clr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddress(size, am) => cpu.execute_clr(m, size, am),
            _ => unreachable!(),
        }
    }

    pub fn cmp<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, _, size, am) => cpu.execute_cmp(m, reg, size, am),
            _ => unreachable!(),
        }
    }

    pub fn cmpa<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeEffectiveAddress(reg, size, am) => cpu.execute_cmpa(m, reg, size, am),
            _ => unreachable!(),
        }
    }

    pub fn cmpi<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_cmpi(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn cmpm<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeRegister(ax, size, ay) => cpu.execute_cmpm(m, ax, size, ay),
            _ => unreachable!(),
        }
    }

    pub fn dbcc<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ConditionRegisterDisplacement(cc, reg, disp) => cpu.execute_dbcc(i.pc.wrapping_add(2), cc, reg, disp),
            _ => unreachable!(),
        }
    }

    pub fn divl<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_divl(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn divs<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_divs(m, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn divu<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_divu(m, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn eor<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, _, size, am) => cpu.execute_eor(m, reg, size, am),
            _ => unreachable!(),
        }
    }

    pub fn eori<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_eori(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn eoriccr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_eoriccr(imm),
            _ => unreachable!(),
        }
    }

    pub fn eorisr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_eorisr(imm),
            _ => unreachable!(),
        }
    }

    pub fn exg<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterOpmodeRegister(rx, mode, ry) => cpu.execute_exg(rx, mode, ry),
            _ => unreachable!(),
        }
    }

    pub fn ext<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::OpmodeRegister(opmode, reg) => cpu.execute_ext(opmode, reg),
            _ => unreachable!(),
        }
    }

    pub fn fline<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_fline()
    }

    pub fn illegal<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_illegal()
    }

    pub fn jmp<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_jmp(m, am),
            _ => unreachable!(),
        }
    }

    pub fn jsr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_jsr(m, am),
            _ => unreachable!(),
        }
    }

    pub fn lea<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_lea(m, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn link<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDisplacement(reg, disp) => cpu.execute_link(m, reg, disp as i32),
            _ => unreachable!(),
        }
    }

    pub fn link_l<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDisplacementLong(reg, disp) => cpu.execute_link(m, reg, disp),
            _ => unreachable!(),
        }
    }

    pub fn lsm<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionEffectiveAddress(dir, am) => cpu.execute_lsm(m, dir, am),
            _ => unreachable!(),
        }
    }

    pub fn lsr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RotationDirectionSizeModeRegister(rot, dir, size, mode, reg) => cpu.execute_lsr(rot, dir, size, mode, reg),
            _ => unreachable!(),
        }
    }

    pub fn r#move<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressEffectiveAddress(size, dst, src) => cpu.execute_move(m, size, dst, src),
            _ => unreachable!(),
        }
    }

    pub fn move16<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Move16(opmode, reg, other) => cpu.execute_move16(m, opmode, reg, other),
            _ => unreachable!(),
        }
    }

    pub fn movea<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeRegisterEffectiveAddress(size, reg, am) => cpu.execute_movea(m, size, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn moveccr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_moveccr(m, am),
            _ => unreachable!(),
        }
    }

    pub fn movec<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionExtensionWord(dir, ext) => cpu.execute_movec(dir, ext),
            _ => unreachable!(),
        }
    }

    pub fn movefccr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_movefccr(m, am),
            _ => unreachable!(),
        }
    }

    pub fn movefsr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_movefsr(m, am),
            _ => unreachable!(),
        }
    }

    pub fn movem<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionSizeEffectiveAddressList(dir, size, am, list) => cpu.execute_movem(m, dir, size, am, list),
            _ => unreachable!(),
        }
    }

    pub fn movep<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeRegisterDisplacement(dreg, dir, size, areg, disp) => cpu.execute_movep(m, dreg, dir, size, areg, disp),
            _ => unreachable!(),
        }
    }

    pub fn moveq<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterData(reg, data) => cpu.execute_moveq(reg, data),
            _ => unreachable!(),
        }
    }

    pub fn moves<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_moves(m, i.opcode, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn movesr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_movesr(m, am),
            _ => unreachable!(),
        }
    }

    pub fn moveusp<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionRegister(dir, reg) => cpu.execute_moveusp(dir, reg),
            _ => unreachable!(),
        }
    }

    pub fn mull<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ExtensionWordEffectiveAddress(ext, am) => cpu.execute_mull(m, ext, am),
            _ => unreachable!(),
        }
    }

    pub fn muls<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_muls(m, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn mulu<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterEffectiveAddress(reg, am) => cpu.execute_mulu(m, reg, am),
            _ => unreachable!(),
        }
    }

    pub fn nbcd<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_nbcd(m, am),
            _ => unreachable!(),
        }
    }

    pub fn neg<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddress(size, am) => cpu.execute_neg(m, size, am),
            _ => unreachable!(),
        }
    }

    pub fn negx<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddress(size, am) => cpu.execute_negx(m, size, am),
            _ => unreachable!(),
        }
    }

    pub fn nop<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_nop()
    }

    pub fn not<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddress(size, am) => cpu.execute_not(m, size, am),
            _ => unreachable!(),
        }
    }

    pub fn or<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, dir, size, am) => cpu.execute_or(m, reg, dir, size, am),
            _ => unreachable!(),
        }
    }

    pub fn ori<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_ori(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn oriccr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_oriccr(imm),
            _ => unreachable!(),
        }
    }

    pub fn orisr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_orisr(imm),
            _ => unreachable!(),
        }
    }

    pub fn pack<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterModeRegisterAdjustment(rx, mode, ry, adj) => cpu.execute_pack(m, rx, mode, ry, adj),
            _ => unreachable!(),
        }
    }

    pub fn pea<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_pea(m, am),
            _ => unreachable!(),
        }
    }

    pub fn reset<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_reset(m)
    }

    pub fn rom<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionEffectiveAddress(dir, am) => cpu.execute_rom(m, dir, am),
            _ => unreachable!(),
        }
    }

    pub fn ror<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RotationDirectionSizeModeRegister(rot, dir, size, mode, reg) => cpu.execute_ror(rot, dir, size, mode, reg),
            _ => unreachable!(),
        }
    }

    pub fn roxm<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DirectionEffectiveAddress(dir, am) => cpu.execute_roxm(m, dir, am),
            _ => unreachable!(),
        }
    }

    pub fn roxr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RotationDirectionSizeModeRegister(rot, dir, size, mode, reg) => cpu.execute_roxr(rot, dir, size, mode, reg),
            _ => unreachable!(),
        }
    }

    pub fn rtd<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(disp) => cpu.execute_rtd(m, disp),
            _ => unreachable!(),
        }
    }

    pub fn rte<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_rte(m)
    }

    pub fn rtr<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_rtr(m)
    }

    pub fn rts<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_rts(m)
    }

    pub fn sbcd<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeModeRegister(ry, _, mode, rx) => cpu.execute_sbcd(m, ry, mode, rx),
            _ => unreachable!(),
        }
    }

    pub fn scc<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::ConditionEffectiveAddress(cc, am) => cpu.execute_scc(m, cc, am),
            _ => unreachable!(),
        }
    }

    pub fn stop<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Immediate(imm) => cpu.execute_stop(imm),
            _ => unreachable!(),
        }
    }

    pub fn sub<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterDirectionSizeEffectiveAddress(reg, dir, size, am) => cpu.execute_sub(m, reg, dir, size, am),
            _ => unreachable!(),
        }
    }

    pub fn suba<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeEffectiveAddress(reg, size, am) => cpu.execute_suba(m, reg, size, am),
            _ => unreachable!(),
        }
    }

    pub fn subi<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddressImmediate(size, am, imm) => cpu.execute_subi(m, size, am, imm),
            _ => unreachable!(),
        }
    }

    pub fn subq<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::DataSizeEffectiveAddress(data, size, am) => cpu.execute_subq(m, data, size, am),
            _ => unreachable!(),
        }
    }

    pub fn subx<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterSizeModeRegister(rx, size, mode, ry) => cpu.execute_subx(m, rx, size, mode, ry),
            _ => unreachable!(),
        }
    }

    pub fn swap<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Register(reg) => cpu.execute_swap(reg),
            _ => unreachable!(),
        }
    }

    pub fn tas<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::EffectiveAddress(am) => cpu.execute_tas(m, am),
            _ => unreachable!(),
        }
    }

    pub fn trap<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Vector(vector) => cpu.execute_trap(vector),
            _ => unreachable!(),
        }
    }

    pub fn trapcc<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Condition(cc) => cpu.execute_trapcc(cc),
            _ => unreachable!(),
        }
    }

    pub fn trapv<M: MemoryAccess + ?Sized>(cpu: &mut M68040, _: &mut M, _: &Instruction) -> InterpreterResult {
        cpu.execute_trapv()
    }

    pub fn tst<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::SizeEffectiveAddress(size, am) => cpu.execute_tst(m, size, am),
            _ => unreachable!(),
        }
    }

    pub fn unlk<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::Register(reg) => cpu.execute_unlk(m, reg),
            _ => unreachable!(),
        }
    }

    pub fn unpk<M: MemoryAccess + ?Sized>(cpu: &mut M68040, m: &mut M, i: &Instruction) -> InterpreterResult {
        match i.operands {
            Operands::RegisterModeRegisterAdjustment(rx, mode, ry, adj) => cpu.execute_unpk(m, rx, mode, ry, adj),
            _ => unreachable!(),
        }
    }
}
