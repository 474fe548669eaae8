// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instruction-related structs, enums and functions.
//!
//! The `new_*` constructors return the operands of one instruction shape.
//! They take the opcode and an iterator over the extension words, and fail
//! with the vector of the access or address error that interrupted the fetch.

use crate::addressing_modes::AddressingMode;
use crate::isa::{Isa, IsaEntry};
use crate::memory::{GetResult, MemoryAccess, MemoryIter};
use crate::memory_iter_next;
use crate::utils::bits;

/// M68040 instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode itself.
    pub opcode: u16,
    /// The address of the instruction.
    pub pc: u32,
    /// The operands.
    pub operands: Operands,
}

impl Instruction {
    /// Decodes the given opcode.
    pub fn from_opcode<M: MemoryAccess + ?Sized>(opcode: u16, pc: u32, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let isa = Isa::from(opcode);
        let decode = IsaEntry::<M>::ISA_ENTRY[isa as usize].decode;
        let operands = decode(opcode, memory)?;

        Ok(Instruction {
            opcode,
            pc,
            operands,
        })
    }

    /// Decodes the instruction at the iterator position.
    ///
    /// Returns Err when there was an error when reading memory (access or
    /// address error).
    pub fn from_memory<M: MemoryAccess + ?Sized>(memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let pc = memory.next_addr;
        let opcode = memory.next().unwrap()?;
        Self::from_opcode(opcode, pc, memory)
    }
}

/// Specify the direction of the operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Transfer from a register to memory.
    RegisterToMemory,
    /// Transfer from memory to a register.
    MemoryToRegister,
    /// Destination is a register.
    DstReg,
    /// Destination is in memory.
    DstEa,
    /// Left shift or rotation.
    Left,
    /// Right shift or rotation.
    Right,
    /// For MOVE USP only.
    RegisterToUsp,
    /// For MOVE USP only.
    UspToRegister,
    /// Register to register operation.
    RegisterToRegister,
    /// Memory to memory operation.
    MemoryToMemory,
    /// Exchange Data Registers (EXG only).
    ExchangeData,
    /// Exchange Address Registers (EXG only).
    ExchangeAddress,
    /// Exchange Data and Address Registers (EXG only).
    ExchangeDataAddress,
}

/// Size of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Size {
    Byte = 1,
    Word = 2,
    Long = 4,
}

impl Size {
    /// Returns Word when self is Byte, self otherwise.
    ///
    /// Byte post/pre increment on the stack pointer moves it by 2 to keep it
    /// aligned.
    #[inline(always)]
    pub fn as_word_long(self) -> Self {
        if self == Self::Byte {
            Self::Word
        } else {
            self
        }
    }

    /// Creates a new size from a single size bit (like MOVEM): 0 => Word,
    /// 1 => Long.
    #[inline(always)]
    pub fn from_bit(d: u16) -> Self {
        match d {
            0 => Self::Word,
            1 => Self::Long,
            _ => panic!("[Size::from_bit] Wrong size : expected 0 or 1, got {}", d),
        }
    }

    /// Creates a new size from the size bits of a MOVE or MOVEA instruction:
    /// 1 => Byte, 3 => Word, 2 => Long.
    #[inline(always)]
    pub fn from_move(d: u16) -> Self {
        match d {
            1 => Self::Byte,
            3 => Self::Word,
            2 => Self::Long,
            _ => panic!("[Size::from_move] Wrong Size : expected 1, 3 or 2, got {}", d),
        }
    }

    /// Returns true if it is Size::Byte, false otherwise.
    #[inline(always)]
    pub fn is_byte(self) -> bool {
        self == Self::Byte
    }

    /// Returns true if it is Size::Word, false otherwise.
    #[inline(always)]
    pub fn is_word(self) -> bool {
        self == Self::Word
    }

    /// Returns true if it is Size::Long, false otherwise.
    #[inline(always)]
    pub fn is_long(self) -> bool {
        self == Self::Long
    }
}

impl From<u16> for Size {
    /// Creates a new size from the primary size bits: 0 => Byte, 1 => Word,
    /// 2 => Long.
    fn from(d: u16) -> Self {
        match d {
            0 => Self::Byte,
            1 => Self::Word,
            2 => Self::Long,
            _ => panic!("[Size::from<u16>] Wrong size : expected 0, 1 or 2, got {}", d),
        }
    }
}

impl From<Size> for u16 {
    /// Returns `0`, `1` or `2` for Byte, Word or Long respectively.
    fn from(size: Size) -> u16 {
        match size {
            Size::Byte => 0,
            Size::Word => 1,
            Size::Long => 2,
        }
    }
}

impl Size {
    /// Returns the binary encoding of the size as used by MOVE and MOVEA.
    #[inline(always)]
    pub const fn into_move(self) -> u16 {
        match self {
            Self::Byte => 1,
            Self::Word => 3,
            Self::Long => 2,
        }
    }

    /// Returns the single-bit encoding used by MOVEM: 0 for Word, 1 for Long.
    pub fn into_bit(self) -> u16 {
        match self {
            Self::Word => 0,
            Self::Long => 1,
            _ => panic!("[Size::into_bit] Byte has no single-bit encoding"),
        }
    }
}

/// Operands of an instruction.
///
/// In each variant, the first operand is the left-most operand in the
/// instruction word (high-order bits); the last is the right-most operand or
/// the extension words, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operands {
    /// ILLEGAL, NOP, RESET, RTE, RTR, RTS, TRAPV, cache and MMU no-ops
    NoOperands,
    /// ANDI/EORI/ORI CCR/SR, STOP, RTD
    Immediate(u16),
    /// ADDI, ANDI, CMPI, EORI, ORI, SUBI
    SizeEffectiveAddressImmediate(Size, AddressingMode, u32),
    /// BCHG, BCLR, BSET, BTST
    EffectiveAddressCount(AddressingMode, u8),
    /// JMP, JSR, MOVE (f) SR CCR, NBCD, PEA, TAS
    EffectiveAddress(AddressingMode),
    /// CLR, NEG, NEGX, NOT, TST
    SizeEffectiveAddress(Size, AddressingMode),
    /// CHK, DIVS, DIVU, LEA, MULS, MULU (word forms)
    RegisterEffectiveAddress(u8, AddressingMode),
    /// MOVEP
    RegisterDirectionSizeRegisterDisplacement(u8, Direction, Size, u8, i16),
    /// MOVEA
    SizeRegisterEffectiveAddress(Size, u8, AddressingMode),
    /// MOVE
    SizeEffectiveAddressEffectiveAddress(Size, AddressingMode, AddressingMode),
    /// EXG
    RegisterOpmodeRegister(u8, Direction, u8),
    /// EXT, EXTB
    OpmodeRegister(u8, u8),
    /// TRAP
    Vector(u8),
    /// LINK
    RegisterDisplacement(u8, i16),
    /// LINK.L
    RegisterDisplacementLong(u8, i32),
    /// SWAP, UNLK, BKPT
    Register(u8),
    /// MOVE USP
    DirectionRegister(Direction, u8),
    /// MOVEM
    DirectionSizeEffectiveAddressList(Direction, Size, AddressingMode, u16),
    /// ADDQ, SUBQ
    DataSizeEffectiveAddress(u8, Size, AddressingMode),
    /// Scc
    ConditionEffectiveAddress(u8, AddressingMode),
    /// DBcc
    ConditionRegisterDisplacement(u8, u8, i16),
    /// BRA, BSR (8, 16 or 32-bit displacement)
    Displacement(i32),
    /// Bcc
    ConditionDisplacement(u8, i32),
    /// TRAPcc
    Condition(u8),
    /// MOVEQ
    RegisterData(u8, i8),
    /// ADD, AND, CMP, EOR, OR, SUB
    RegisterDirectionSizeEffectiveAddress(u8, Direction, Size, AddressingMode),
    /// ADDA, CMPA, SUBA
    RegisterSizeEffectiveAddress(u8, Size, AddressingMode),
    /// ABCD, ADDX, SBCD, SUBX
    RegisterSizeModeRegister(u8, Size, Direction, u8),
    /// CMPM
    RegisterSizeRegister(u8, Size, u8),
    /// ASm, LSm, ROm, ROXm
    DirectionEffectiveAddress(Direction, AddressingMode),
    /// ASr, LSr, ROr, ROXr
    RotationDirectionSizeModeRegister(u8, Direction, Size, u8, u8),
    /// MULx.L, DIVx.L, bit fields, CAS, CHK2/CMP2, MOVES: a raw extension
    /// word followed by an effective address. The handler decodes the word.
    ExtensionWordEffectiveAddress(u16, AddressingMode),
    /// MOVEC
    DirectionExtensionWord(Direction, u16),
    /// PACK, UNPK
    RegisterModeRegisterAdjustment(u8, Direction, u8, u16),
    /// MOVE16 (opmode bits, register, other operand: ext word or address)
    Move16(u8, u8, u32),
}

impl Operands {
    /// ILLEGAL, NOP, RESET, RTE, RTR, RTS, TRAPV
    pub fn new_no_operands<M: MemoryAccess + ?Sized>(_: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::NoOperands)
    }

    /// ANDI/EORI/ORI CCR/SR, STOP, RTD
    pub fn new_immediate<M: MemoryAccess + ?Sized>(_: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::Immediate(memory_iter_next!(memory)))
    }

    /// ADDI, ANDI, CMPI, EORI, ORI, SUBI
    pub fn new_size_effective_address_immediate<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let size = Size::from(bits(opcode, 6, 7));

        let imm = if size.is_long() {
            let high = memory_iter_next!(memory) as u32;
            high << 16 | memory_iter_next!(memory) as u32
        } else {
            memory_iter_next!(memory) as u32
        };

        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::SizeEffectiveAddressImmediate(size, am, imm))
    }

    /// BCHG, BCLR, BSET, BTST
    pub fn new_effective_address_count<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let count = if bits(opcode, 8, 8) != 0 {
            // Dynamic bit number.
            bits(opcode, 9, 11) as u8
        } else {
            memory_iter_next!(memory) as u8
        };

        let eamode = bits(opcode, 3, 5);
        let size = if eamode == 0 { Size::Long } else { Size::Byte };
        let am = AddressingMode::from_memory(eamode, bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::EffectiveAddressCount(am, count))
    }

    /// JMP, JSR, MOVE (f) SR CCR, NBCD, PEA, TAS
    pub fn new_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let isa = Isa::from(opcode);

        let size = match isa {
            Isa::Nbcd | Isa::Tas => Some(Size::Byte),
            Isa::Moveccr | Isa::Movefccr | Isa::Movefsr | Isa::Movesr => Some(Size::Word),
            Isa::Pea => Some(Size::Long),
            _ => None,
        };

        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, size, memory)?;
        Ok(Self::EffectiveAddress(am))
    }

    /// CLR, NEG, NEGX, NOT, TST
    pub fn new_size_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let size = Size::from(bits(opcode, 6, 7));
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::SizeEffectiveAddress(size, am))
    }

    /// CHK, DIVS, DIVU, LEA, MULS, MULU
    pub fn new_register_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let reg = bits(opcode, 9, 11) as u8;
        let size = if Isa::from(opcode) == Isa::Lea { Size::Long } else { Size::Word };
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::RegisterEffectiveAddress(reg, am))
    }

    /// MOVEP
    pub fn new_register_direction_size_register_displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let dreg = bits(opcode, 9, 11) as u8;
        let dir = if bits(opcode, 7, 7) != 0 { Direction::RegisterToMemory } else { Direction::MemoryToRegister };
        let size = Size::from_bit(bits(opcode, 6, 6));
        let areg = bits(opcode, 0, 2) as u8;
        let disp = memory_iter_next!(memory) as i16;
        Ok(Self::RegisterDirectionSizeRegisterDisplacement(dreg, dir, size, areg, disp))
    }

    /// MOVEA
    pub fn new_size_register_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let size = Size::from_move(bits(opcode, 12, 13));
        let areg = bits(opcode, 9, 11) as u8;
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::SizeRegisterEffectiveAddress(size, areg, am))
    }

    /// MOVE
    pub fn new_size_effective_address_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let size = Size::from_move(bits(opcode, 12, 13));

        // First read the source operand then the destination.
        let src = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        let dst = AddressingMode::from_memory(bits(opcode, 6, 8), bits(opcode, 9, 11) as u8, Some(size), memory)?;
        Ok(Self::SizeEffectiveAddressEffectiveAddress(size, dst, src))
    }

    /// EXG
    pub fn new_register_opmode_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        let regl = bits(opcode, 9, 11) as u8;
        let dir = match bits(opcode, 3, 7) {
            0b01000 => Direction::ExchangeData,
            0b01001 => Direction::ExchangeAddress,
            _ => Direction::ExchangeDataAddress,
        };
        let regr = bits(opcode, 0, 2) as u8;
        Ok(Self::RegisterOpmodeRegister(regl, dir, regr))
    }

    /// EXT, EXTB
    pub fn new_opmode_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::OpmodeRegister(bits(opcode, 6, 8) as u8, bits(opcode, 0, 2) as u8))
    }

    /// TRAP
    pub fn new_vector<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::Vector(bits(opcode, 0, 3) as u8))
    }

    /// LINK
    pub fn new_register_displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let reg = bits(opcode, 0, 2) as u8;
        let disp = memory_iter_next!(memory) as i16;
        Ok(Self::RegisterDisplacement(reg, disp))
    }

    /// LINK.L
    pub fn new_register_displacement_long<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let reg = bits(opcode, 0, 2) as u8;
        let high = memory_iter_next!(memory) as u32;
        let disp = (high << 16 | memory_iter_next!(memory) as u32) as i32;
        Ok(Self::RegisterDisplacementLong(reg, disp))
    }

    /// SWAP, UNLK, BKPT
    pub fn new_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::Register(bits(opcode, 0, 2) as u8))
    }

    /// MOVE USP
    pub fn new_direction_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        let dir = if bits(opcode, 3, 3) != 0 { Direction::UspToRegister } else { Direction::RegisterToUsp };
        Ok(Self::DirectionRegister(dir, bits(opcode, 0, 2) as u8))
    }

    /// MOVEM
    pub fn new_direction_size_effective_address_list<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let list = memory_iter_next!(memory);
        let dir = if bits(opcode, 10, 10) != 0 { Direction::MemoryToRegister } else { Direction::RegisterToMemory };
        let size = Size::from_bit(bits(opcode, 6, 6));
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::DirectionSizeEffectiveAddressList(dir, size, am, list))
    }

    /// ADDQ, SUBQ
    pub fn new_data_size_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let data = bits(opcode, 9, 11) as u8;
        let size = Size::from(bits(opcode, 6, 7));
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::DataSizeEffectiveAddress(data, size, am))
    }

    /// Scc
    pub fn new_condition_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let condition = bits(opcode, 8, 11) as u8;
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(Size::Byte), memory)?;
        Ok(Self::ConditionEffectiveAddress(condition, am))
    }

    /// DBcc
    pub fn new_condition_register_displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let disp = memory_iter_next!(memory) as i16;
        let condition = bits(opcode, 8, 11) as u8;
        let reg = bits(opcode, 0, 2) as u8;
        Ok(Self::ConditionRegisterDisplacement(condition, reg, disp))
    }

    /// TRAPcc
    pub fn new_condition<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        // The optional operand words are fetched and ignored.
        match bits(opcode, 0, 2) {
            2 => { memory_iter_next!(memory); },
            3 => { memory_iter_next!(memory); memory_iter_next!(memory); },
            _ => {},
        }
        Ok(Self::Condition(bits(opcode, 8, 11) as u8))
    }

    /// BRA, BSR
    pub fn new_displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::Displacement(displacement(opcode, memory)?))
    }

    /// Bcc
    pub fn new_condition_displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let disp = displacement(opcode, memory)?;
        Ok(Self::ConditionDisplacement(bits(opcode, 8, 11) as u8, disp))
    }

    /// MOVEQ
    pub fn new_register_data<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(Self::RegisterData(bits(opcode, 9, 11) as u8, opcode as i8))
    }

    /// ADD, AND, CMP, EOR, OR, SUB
    pub fn new_register_direction_size_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let reg = bits(opcode, 9, 11) as u8;
        // CMP and EOR ignore the direction.
        let dir = if bits(opcode, 8, 8) != 0 { Direction::DstEa } else { Direction::DstReg };
        let size = Size::from(bits(opcode, 6, 7));
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::RegisterDirectionSizeEffectiveAddress(reg, dir, size, am))
    }

    /// ADDA, CMPA, SUBA
    pub fn new_register_size_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let reg = bits(opcode, 9, 11) as u8;
        let size = Size::from_bit(bits(opcode, 8, 8));
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::RegisterSizeEffectiveAddress(reg, size, am))
    }

    /// ABCD, ADDX, SBCD, SUBX
    pub fn new_register_size_mode_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        let regl = bits(opcode, 9, 11) as u8;
        let size = Size::from(bits(opcode, 6, 7));
        let mode = if bits(opcode, 3, 3) != 0 { Direction::MemoryToMemory } else { Direction::RegisterToRegister };
        let regr = bits(opcode, 0, 2) as u8;
        Ok(Self::RegisterSizeModeRegister(regl, size, mode, regr))
    }

    /// CMPM
    pub fn new_register_size_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        let regl = bits(opcode, 9, 11) as u8;
        let size = Size::from(bits(opcode, 6, 7));
        let regr = bits(opcode, 0, 2) as u8;
        Ok(Self::RegisterSizeRegister(regl, size, regr))
    }

    /// ASm, LSm, ROm, ROXm
    pub fn new_direction_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let dir = if bits(opcode, 8, 8) != 0 { Direction::Left } else { Direction::Right };
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(Size::Word), memory)?;
        Ok(Self::DirectionEffectiveAddress(dir, am))
    }

    /// ASr, LSr, ROr, ROXr
    pub fn new_rotation_direction_size_mode_register<M: MemoryAccess + ?Sized>(opcode: u16, _: &mut MemoryIter<M>) -> GetResult<Self> {
        let count = bits(opcode, 9, 11) as u8;
        let dir = if bits(opcode, 8, 8) != 0 { Direction::Left } else { Direction::Right };
        let size = Size::from(bits(opcode, 6, 7));
        let mode = bits(opcode, 5, 5) as u8;
        let reg = bits(opcode, 0, 2) as u8;
        Ok(Self::RotationDirectionSizeModeRegister(count, dir, size, mode, reg))
    }

    /// MULx.L, DIVx.L, CAS, CHK2/CMP2, MOVES, bit fields
    pub fn new_extension_word_effective_address<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let ext = memory_iter_next!(memory);
        let size = match Isa::from(opcode) {
            Isa::Mull | Isa::Divl => Size::Long,
            Isa::Moves => Size::from(bits(opcode, 6, 7)),
            Isa::Cas => Size::from(bits(opcode, 9, 10) - 1),
            Isa::Chk2 => Size::from(bits(opcode, 9, 10)),
            _ => Size::Byte, // Bit fields compute their own spans.
        };
        let am = AddressingMode::from_memory(bits(opcode, 3, 5), bits(opcode, 0, 2) as u8, Some(size), memory)?;
        Ok(Self::ExtensionWordEffectiveAddress(ext, am))
    }

    /// MOVEC
    pub fn new_direction_extension_word<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let dir = if bits(opcode, 0, 0) != 0 { Direction::RegisterToMemory } else { Direction::MemoryToRegister };
        let ext = memory_iter_next!(memory);
        Ok(Self::DirectionExtensionWord(dir, ext))
    }

    /// PACK, UNPK
    pub fn new_register_mode_register_adjustment<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let regl = bits(opcode, 9, 11) as u8;
        let mode = if bits(opcode, 3, 3) != 0 { Direction::MemoryToMemory } else { Direction::RegisterToRegister };
        let regr = bits(opcode, 0, 2) as u8;
        let adjustment = memory_iter_next!(memory);
        Ok(Self::RegisterModeRegisterAdjustment(regl, mode, regr, adjustment))
    }

    /// MOVE16
    pub fn new_move16<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let opmode = bits(opcode, 3, 5) as u8;
        let reg = bits(opcode, 0, 2) as u8;
        let other = if opmode == 0b100 {
            // (Ax)+,(Ay)+ form: the other register lives in an extension word.
            memory_iter_next!(memory) as u32
        } else {
            let high = memory_iter_next!(memory) as u32;
            high << 16 | memory_iter_next!(memory) as u32
        };
        Ok(Self::Move16(opmode, reg, other))
    }
}

/// Bcc, BRA, BSR displacement: 8-bit in the opcode, escaping to a word
/// (0x00) or a long (0xff) in the extension words.
fn displacement<M: MemoryAccess + ?Sized>(opcode: u16, memory: &mut MemoryIter<M>) -> GetResult<i32> {
    match opcode as u8 {
        0x00 => Ok(memory_iter_next!(memory) as i16 as i32),
        0xff => {
            let high = memory_iter_next!(memory) as u32;
            Ok((high << 16 | memory_iter_next!(memory) as u32) as i32)
        },
        d => Ok(d as i8 as i32),
    }
}
