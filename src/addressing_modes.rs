// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Addressing mode-related structs, enums and functions.

use crate::{M68040, MemoryAccess};
use crate::instruction::Size;
use crate::memory_iter_next;
use crate::memory::{GetResult, MemoryIter};
use crate::utils::{bit, bits};

/// Addressing modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingMode {
    /// Data Register Direct.
    Drd(u8),
    /// Address Register Direct.
    Ard(u8),
    /// Address Register Indirect.
    Ari(u8),
    /// Address Register Indirect With POstincrement.
    Ariwpo(u8),
    /// Address Register Indirect With PRedecrement.
    Ariwpr(u8),
    /// Address Register Indirect With Displacement (address reg, displacement).
    Ariwd(u8, i16),
    /// Address Register Indirect with Index (address reg, extension).
    ///
    /// Covers both the brief form and the full 68020 form with base/outer
    /// displacements and memory indirection.
    Ariwi(u8, IndexExtension),
    /// Absolute Short.
    AbsShort(u16),
    /// Absolute Long.
    AbsLong(u32),
    /// Program Counter Indirect With Displacement (PC value, displacement).
    ///
    /// When using it with the assembler, the PC value is ignored.
    Pciwd(u32, i16),
    /// Program Counter Indirect with Index (PC value, extension).
    Pciwi(u32, IndexExtension),
    /// Immediate Data (cast this variant to the correct type when used).
    Immediate(u32),
}

impl AddressingMode {
    /// New addressing mode from a memory iterator over the extension words.
    pub fn from_memory<M: MemoryAccess + ?Sized>(mode: u16, reg: u8, size: Option<Size>, memory: &mut MemoryIter<M>) -> GetResult<Self> {
        Ok(match mode {
            0 => Self::Drd(reg),
            1 => Self::Ard(reg),
            2 => Self::Ari(reg),
            3 => Self::Ariwpo(reg),
            4 => Self::Ariwpr(reg),
            5 => Self::Ariwd(reg, memory_iter_next!(memory) as i16),
            6 => Self::Ariwi(reg, IndexExtension::from_memory(memory)?),
            7 => match reg {
                0 => Self::AbsShort(memory_iter_next!(memory)),
                1 => {
                    let high = (memory_iter_next!(memory) as u32) << 16;
                    let low = memory_iter_next!(memory) as u32;
                    Self::AbsLong(high | low)
                },
                2 => Self::Pciwd(memory.next_addr, memory_iter_next!(memory) as i16),
                3 => {
                    let pc = memory.next_addr;
                    Self::Pciwi(pc, IndexExtension::from_memory(memory)?)
                },
                4 => {
                    if size.map(Size::is_long).unwrap_or(false) {
                        let high = (memory_iter_next!(memory) as u32) << 16;
                        let low = memory_iter_next!(memory) as u32;
                        Self::Immediate(high | low)
                    } else {
                        Self::Immediate(memory_iter_next!(memory) as u32)
                    }
                },
                _ => panic!("[AddressingMode::from_memory] Wrong register {reg}"),
            },
            _ => panic!("[AddressingMode::from_memory] Wrong mode {mode}"),
        })
    }

    /// Returns the register of the addressing mode, or None if the mode has no associated register.
    #[inline(always)]
    pub const fn register(self) -> Option<u8> {
        match self {
            AddressingMode::Drd(reg) => Some(reg),
            AddressingMode::Ard(reg) => Some(reg),
            AddressingMode::Ari(reg) => Some(reg),
            AddressingMode::Ariwpo(reg) => Some(reg),
            AddressingMode::Ariwpr(reg) => Some(reg),
            AddressingMode::Ariwd(reg, _) => Some(reg),
            AddressingMode::Ariwi(reg, _) => Some(reg),
            _ => None,
        }
    }

    /// Returns true if `self` is `Drd`, false otherwise.
    #[inline(always)]
    pub const fn is_drd(self) -> bool {
        matches!(self, Self::Drd(_))
    }

    /// Returns true if `self` is `Ard`, false otherwise.
    #[inline(always)]
    pub const fn is_ard(self) -> bool {
        matches!(self, Self::Ard(_))
    }

    /// Returns true if `self` is `Drd` or `Ard`, false otherwise.
    #[inline(always)]
    pub const fn is_dard(self) -> bool {
        matches!(self, Self::Drd(_) | Self::Ard(_))
    }

    /// Returns true if `self` is `Ariwpo`, false otherwise.
    #[inline(always)]
    pub const fn is_ariwpo(self) -> bool {
        matches!(self, Self::Ariwpo(_))
    }

    /// Returns true if `self` is `Ariwpr`, false otherwise.
    #[inline(always)]
    pub const fn is_ariwpr(self) -> bool {
        matches!(self, Self::Ariwpr(_))
    }

    /// Returns true if `self` is `Immediate`, false otherwise.
    #[inline(always)]
    pub const fn is_immediate(self) -> bool {
        matches!(self, Self::Immediate(_))
    }

    /// Assembles `self` as an opcode effective address field.
    ///
    /// Set `long` to true if the immediate operand is long, false for byte and word sizes.
    ///
    /// Left tuple contains the mode and register encoded as in the low 6 bits of the opcode.
    /// Right tuple contains the extension words.
    ///
    /// The full indexed forms are never emitted by the generated code and
    /// panic here.
    pub fn assemble(self, long: bool) -> (u16, Box<[u16]>) {
        match self {
            AddressingMode::Drd(reg) => (reg as u16, Box::new([])),
            AddressingMode::Ard(reg) => (1 << 3 | reg as u16, Box::new([])),
            AddressingMode::Ari(reg) => (2 << 3 | reg as u16, Box::new([])),
            AddressingMode::Ariwpo(reg) => (3 << 3 | reg as u16, Box::new([])),
            AddressingMode::Ariwpr(reg) => (4 << 3 | reg as u16, Box::new([])),
            AddressingMode::Ariwd(reg, disp) => (5 << 3 | reg as u16, Box::new([disp as u16])),
            AddressingMode::Ariwi(reg, IndexExtension::Brief(bew)) => (6 << 3 | reg as u16, Box::new([bew.0])),
            AddressingMode::AbsShort(addr) => (7 << 3, Box::new([addr])),
            AddressingMode::AbsLong(addr) => (7 << 3 | 1, Box::new([(addr >> 16) as u16, addr as u16])),
            AddressingMode::Pciwd(_, disp) => (7 << 3 | 2, Box::new([disp as u16])),
            AddressingMode::Pciwi(_, IndexExtension::Brief(bew)) => (7 << 3 | 3, Box::new([bew.0])),
            AddressingMode::Immediate(imm) => {
                if long {
                    (7 << 3 | 4, Box::new([(imm >> 16) as u16, imm as u16]))
                } else {
                    (7 << 3 | 4, Box::new([imm as u16]))
                }
            },
            _ => panic!("{self:?} cannot be assembled"),
        }
    }

    /// Assembles `self` as an opcode effective address field for MOVE or MOVEA destination field.
    ///
    /// Left tuple contains the mode and register encoded as in the destination (bits 6 to 11).
    /// Right tuple contains the extension words.
    pub fn assemble_move_dst(self) -> (u16, Box<[u16]>) {
        match self {
            AddressingMode::Drd(reg) => ((reg as u16) << 9, Box::new([])),
            AddressingMode::Ard(reg) => ((reg as u16) << 9 | 1 << 6, Box::new([])),
            AddressingMode::Ari(reg) => ((reg as u16) << 9 | 2 << 6, Box::new([])),
            AddressingMode::Ariwpo(reg) => ((reg as u16) << 9 | 3 << 6, Box::new([])),
            AddressingMode::Ariwpr(reg) => ((reg as u16) << 9 | 4 << 6, Box::new([])),
            AddressingMode::Ariwd(reg, disp) => ((reg as u16) << 9 | 5 << 6, Box::new([disp as u16])),
            AddressingMode::Ariwi(reg, IndexExtension::Brief(bew)) => ((reg as u16) << 9 | 6 << 6, Box::new([bew.0])),
            AddressingMode::AbsShort(addr) => (7 << 6, Box::new([addr])),
            AddressingMode::AbsLong(addr) => (1 << 9 | 7 << 6, Box::new([(addr >> 16) as u16, addr as u16])),
            _ => panic!("{self:?} mode cannot be used as a destination mode."),
        }
    }

    /// Verifies that `self` is one of the given modes.
    ///
    /// `modes` contains the list of valid addressing modes.
    /// `regs` contains the valid register values for Mode 7, if 7 is in `modes`.
    pub fn verify(self, modes: &[u8], regs: &[u8]) -> bool {
        match self {
            AddressingMode::Drd(reg) => reg <= 7 && modes.contains(&0),
            AddressingMode::Ard(reg) => reg <= 7 && modes.contains(&1),
            AddressingMode::Ari(reg) => reg <= 7 && modes.contains(&2),
            AddressingMode::Ariwpo(reg) => reg <= 7 && modes.contains(&3),
            AddressingMode::Ariwpr(reg) => reg <= 7 && modes.contains(&4),
            AddressingMode::Ariwd(reg, _) => reg <= 7 && modes.contains(&5),
            AddressingMode::Ariwi(reg, _) => reg <= 7 && modes.contains(&6),
            AddressingMode::AbsShort(_) => modes.contains(&7) && regs.contains(&0),
            AddressingMode::AbsLong(_) => modes.contains(&7) && regs.contains(&1),
            AddressingMode::Pciwd(_, _) => modes.contains(&7) && regs.contains(&2),
            AddressingMode::Pciwi(_, _) => modes.contains(&7) && regs.contains(&3),
            AddressingMode::Immediate(_) => modes.contains(&7) && regs.contains(&4),
        }
    }
}

/// Raw Brief Extension Word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BriefExtensionWord(pub u16);

impl BriefExtensionWord {
    /// Creates a new brief extension word, to be used with the assembler.
    ///
    /// - `address`: true if the index register is an address register.
    /// - `reg`: the register number (must be <= 7).
    /// - `long`: true if long size, false for word size.
    /// - `disp`: the associated displacement value.
    pub const fn new(address: bool, reg: u8, long: bool, disp: i8) -> Self {
        assert!(reg <= 7, "Invalid register");
        let a = (address as u16) << 15;
        let r = (reg as u16) << 12;
        let s = (long as u16) << 11;
        let d = disp as u8 as u16;
        Self(a | r | s | d)
    }

    /// Returns the displacement associated with the brief extension word.
    pub const fn disp(self) -> i8 {
        self.0 as i8
    }
}

/// Index part shared by the brief and full extension words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct IndexRegister {
    /// True for an address register, false for a data register.
    address: bool,
    reg: u8,
    /// True for long size, false for sign-extended word.
    long: bool,
    /// Shift amount: the scale factor is `1 << scale`.
    scale: u8,
}

impl IndexRegister {
    fn from_ext_word(ext: u16) -> Self {
        Self {
            address: bit(ext, 15),
            reg: bits(ext, 12, 14) as u8,
            long: bit(ext, 11),
            scale: bits(ext, 9, 10) as u8,
        }
    }
}

/// The extension of an indexed addressing mode: either the 68000 brief word
/// or the 68020 full word with displacements and optional memory indirection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexExtension {
    Brief(BriefExtensionWord),
    Full(FullExtensionWord),
}

impl IndexExtension {
    pub(crate) fn from_memory<M: MemoryAccess + ?Sized>(memory: &mut MemoryIter<M>) -> GetResult<Self> {
        let ext = memory_iter_next!(memory);
        if !bit(ext, 8) {
            return Ok(Self::Brief(BriefExtensionWord(ext)));
        }

        let base_disp = match bits(ext, 4, 5) {
            2 => memory_iter_next!(memory) as i16 as i32,
            3 => {
                let high = (memory_iter_next!(memory) as u32) << 16;
                (high | memory_iter_next!(memory) as u32) as i32
            },
            _ => 0, // Null (or reserved) base displacement.
        };

        // The outer displacement field only exists for the indirect forms,
        // but its size bits decode the same way.
        let outer_disp = match bits(ext, 0, 1) {
            2 if bits(ext, 0, 2) != 0 => memory_iter_next!(memory) as i16 as i32,
            3 if bits(ext, 0, 2) != 0 => {
                let high = (memory_iter_next!(memory) as u32) << 16;
                (high | memory_iter_next!(memory) as u32) as i32
            },
            _ => 0,
        };

        Ok(Self::Full(FullExtensionWord { word: ext, base_disp, outer_disp }))
    }
}

/// Full (68020) extension word with its decoded displacements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FullExtensionWord {
    word: u16,
    base_disp: i32,
    outer_disp: i32,
}

impl FullExtensionWord {
    /// True if the base register is suppressed.
    const fn base_suppressed(self) -> bool {
        bit(self.word, 7)
    }

    /// True if the index operand is suppressed.
    const fn index_suppressed(self) -> bool {
        bit(self.word, 6)
    }

    /// The I/IS memory indirection selector (index suppress folded in).
    const fn indirection(self) -> u16 {
        bits(self.word, 0, 2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EffectiveAddress {
    /// The addressing mode.
    pub mode: AddressingMode,
    /// Where this effective address points to. `None` if not calculated yet.
    pub address: Option<u32>,
    /// The size of the data.
    pub size: Option<Size>,
}

impl EffectiveAddress {
    pub fn new(am: AddressingMode, size: Option<Size>) -> Self {
        Self {
            mode: am,
            address: None,
            size,
        }
    }
}

impl M68040 {
    /// Calculates the value of the given effective address.
    ///
    /// If the address has already been calculated (`ea.address` is Some), it
    /// is returned and no computation is performed. Otherwise the address is
    /// computed and memoized, or panic if the addressing mode is not in memory.
    ///
    /// Fallible because the 68020 indirect modes read a pointer from memory.
    pub(crate) fn get_effective_address<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, ea: &mut EffectiveAddress) -> GetResult<u32> {
        if ea.address.is_none() {
            ea.address = match ea.mode {
                AddressingMode::Ari(reg) => Some(self.regs.a[reg as usize]),
                AddressingMode::Ariwpo(reg) => Some(self.ariwpo(reg, ea.size.expect("ariwpo must have a size"))),
                AddressingMode::Ariwpr(reg) => Some(self.ariwpr(reg, ea.size.expect("ariwpr must have a size"))),
                AddressingMode::Ariwd(reg, disp) => Some(self.regs.a[reg as usize].wrapping_add(disp as u32)),
                AddressingMode::Ariwi(reg, ext) => {
                    let base = self.regs.a[reg as usize];
                    Some(self.indexed_address(memory, base, ext)?)
                },
                AddressingMode::AbsShort(addr) => Some(addr as i16 as u32),
                AddressingMode::AbsLong(addr) => Some(addr),
                AddressingMode::Pciwd(pc, disp) => Some(pc.wrapping_add(disp as u32)),
                AddressingMode::Pciwi(pc, ext) => Some(self.indexed_address(memory, pc, ext)?),
                _ => None,
            };
        }

        Ok(ea.address.expect("[get_effective_address] Trying to read effective address of a value not in memory."))
    }

    /// Computes an indexed effective address, brief or full form.
    fn indexed_address<M: MemoryAccess + ?Sized>(&mut self, memory: &mut M, base: u32, ext: IndexExtension) -> GetResult<u32> {
        match ext {
            IndexExtension::Brief(bew) => {
                let index = self.index_register(IndexRegister::from_ext_word(bew.0));
                Ok(base.wrapping_add(bew.disp() as u32).wrapping_add(index))
            },
            IndexExtension::Full(few) => {
                let base = if few.base_suppressed() { 0 } else { base };
                let index = if few.index_suppressed() {
                    0
                } else {
                    self.index_register(IndexRegister::from_ext_word(few.word))
                };
                let bd = few.base_disp as u32;
                let od = few.outer_disp as u32;

                match few.indirection() {
                    // No memory indirection.
                    0 => Ok(base.wrapping_add(bd).wrapping_add(index)),
                    // Indirect pre-indexed: the index takes part in the
                    // intermediate address.
                    1..=3 if !few.index_suppressed() => {
                        let inter = base.wrapping_add(bd).wrapping_add(index);
                        Ok(self.read_long(memory, inter)?.wrapping_add(od))
                    },
                    // Index suppressed: plain memory indirect.
                    1..=3 => {
                        let inter = base.wrapping_add(bd);
                        Ok(self.read_long(memory, inter)?.wrapping_add(od))
                    },
                    // Indirect post-indexed: the index is added after the fetch.
                    5..=7 => {
                        let inter = base.wrapping_add(bd);
                        Ok(self.read_long(memory, inter)?.wrapping_add(index).wrapping_add(od))
                    },
                    _ => Ok(base.wrapping_add(bd).wrapping_add(index)),
                }
            },
        }
    }

    fn index_register(&self, idx: IndexRegister) -> u32 {
        let raw = if idx.address {
            self.regs.a[idx.reg as usize]
        } else {
            self.regs.d[idx.reg as usize]
        };
        let value = if idx.long { raw } else { raw as i16 as u32 };
        value.wrapping_shl(idx.scale as u32)
    }

    /// Address Register Indirect With POstincrement.
    pub(crate) fn ariwpo(&mut self, reg: u8, size: Size) -> u32 {
        let size = if reg == 7 { size.as_word_long() } else { size };
        let addr = self.regs.a[reg as usize];
        self.regs.a[reg as usize] = addr.wrapping_add(size as u32);
        addr
    }

    /// Address Register Indirect With PRedecrement.
    pub(crate) fn ariwpr(&mut self, reg: u8, size: Size) -> u32 {
        let size = if reg == 7 { size.as_word_long() } else { size };
        let addr = self.regs.a[reg as usize].wrapping_sub(size as u32);
        self.regs.a[reg as usize] = addr;
        addr
    }
}
