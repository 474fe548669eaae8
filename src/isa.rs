// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ISA definition and the decode entry table.

use crate::decoder::DECODER;
use crate::instruction::Operands;
use crate::memory::{GetResult, MemoryAccess, MemoryIter};

/// ISA of the M68040.
///
/// Convert a raw opcode to this enum with the [from](Self::from) method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Isa {
    Unknown,
    Abcd,
    Add,
    Adda,
    Addi,
    Addq,
    Addx,
    Aline,
    And,
    Andi,
    Andiccr,
    Andisr,
    Asm,
    Asr,
    Bcc,
    Bchg,
    Bclr,
    Bfchg,
    Bfclr,
    Bfexts,
    Bfextu,
    Bfffo,
    Bfins,
    Bfset,
    Bftst,
    Bkpt,
    Bra,
    Bset,
    Bsr,
    Btst,
    Cas,
    Chk,
    Chk2,
    Cinv,
    Clr,
    Cmp,
    Cmpa,
    Cmpi,
    Cmpm,
    Cpush,
    Dbcc,
    Divl,
    Divs,
    Divu,
    EmulOp,
    Eor,
    Eori,
    Eoriccr,
    Eorisr,
    Exg,
    Ext,
    Fline,
    Illegal,
    Jmp,
    Jsr,
    Lea,
    Link,
    LinkL,
    Lsm,
    Lsr,
    Move,
    Move16,
    Movea,
    Moveccr,
    Movec,
    Movefccr,
    Movefsr,
    Movem,
    Movep,
    Moveq,
    Moves,
    Movesr,
    Moveusp,
    Mull,
    Muls,
    Mulu,
    Nbcd,
    Neg,
    Negx,
    Nop,
    Not,
    Or,
    Ori,
    Oriccr,
    Orisr,
    Pack,
    Pea,
    Pflush,
    Reset,
    Rom,
    Ror,
    Roxm,
    Roxr,
    Rtd,
    Rte,
    Rtr,
    Rts,
    Sbcd,
    Scc,
    Stop,
    Sub,
    Suba,
    Subi,
    Subq,
    Subx,
    Swap,
    Tas,
    Trap,
    Trapcc,
    Trapv,
    Tst,
    Unlk,
    Unpk,
    _Size,
}

impl From<u16> for Isa {
    /// Returns the instruction represented by the given opcode.
    fn from(opcode: u16) -> Self {
        DECODER[opcode as usize]
    }
}

impl Isa {
    /// True for the instructions that require supervisor privilege.
    ///
    /// A privileged instruction executed in user mode raises a privilege
    /// violation instead of being traced.
    pub fn is_privileged(self) -> bool {
        matches!(self,
            Isa::Andisr | Isa::Eorisr | Isa::Orisr | Isa::Movesr | Isa::Moveusp |
            Isa::Movec | Isa::Moves | Isa::Reset | Isa::Rte | Isa::Stop |
            Isa::Cinv | Isa::Cpush | Isa::Pflush)
    }
}

/// Struct used to store the decode function of an instruction.
#[derive(Clone, Copy)]
pub struct IsaEntry<M: MemoryAccess + ?Sized> {
    /// Function used to decode the instruction's operands.
    pub decode: fn(u16, &mut MemoryIter<M>) -> GetResult<Operands>,
}

impl<M: MemoryAccess + ?Sized> IsaEntry<M> {
    /// The array that maps instructions to their decode function. Index it using the [Isa] enum.
    pub const ISA_ENTRY: [IsaEntry<M>; Isa::_Size as usize] = [
        IsaEntry { /* Unknown */  decode: Operands::new_no_operands, },
        IsaEntry { /* Abcd */     decode: Operands::new_register_size_mode_register, },
        IsaEntry { /* Add */      decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Adda */     decode: Operands::new_register_size_effective_address, },
        IsaEntry { /* Addi */     decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Addq */     decode: Operands::new_data_size_effective_address, },
        IsaEntry { /* Addx */     decode: Operands::new_register_size_mode_register, },
        IsaEntry { /* Aline */    decode: Operands::new_no_operands, },
        IsaEntry { /* And */      decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Andi */     decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Andiccr */  decode: Operands::new_immediate, },
        IsaEntry { /* Andisr */   decode: Operands::new_immediate, },
        IsaEntry { /* Asm */      decode: Operands::new_direction_effective_address, },
        IsaEntry { /* Asr */      decode: Operands::new_rotation_direction_size_mode_register, },
        IsaEntry { /* Bcc */      decode: Operands::new_condition_displacement, },
        IsaEntry { /* Bchg */     decode: Operands::new_effective_address_count, },
        IsaEntry { /* Bclr */     decode: Operands::new_effective_address_count, },
        IsaEntry { /* Bfchg */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfclr */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfexts */   decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfextu */   decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfffo */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfins */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bfset */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bftst */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Bkpt */     decode: Operands::new_register, },
        IsaEntry { /* Bra */      decode: Operands::new_displacement, },
        IsaEntry { /* Bset */     decode: Operands::new_effective_address_count, },
        IsaEntry { /* Bsr */      decode: Operands::new_displacement, },
        IsaEntry { /* Btst */     decode: Operands::new_effective_address_count, },
        IsaEntry { /* Cas */      decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Chk */      decode: Operands::new_register_effective_address, },
        IsaEntry { /* Chk2 */     decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Cinv */     decode: Operands::new_no_operands, },
        IsaEntry { /* Clr */      decode: Operands::new_size_effective_address, },
        IsaEntry { /* Cmp */      decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Cmpa */     decode: Operands::new_register_size_effective_address, },
        IsaEntry { /* Cmpi */     decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Cmpm */     decode: Operands::new_register_size_register, },
        IsaEntry { /* Cpush */    decode: Operands::new_no_operands, },
        IsaEntry { /* Dbcc */     decode: Operands::new_condition_register_displacement, },
        IsaEntry { /* Divl */     decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Divs */     decode: Operands::new_register_effective_address, },
        IsaEntry { /* Divu */     decode: Operands::new_register_effective_address, },
        IsaEntry { /* EmulOp */   decode: Operands::new_no_operands, },
        IsaEntry { /* Eor */      decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Eori */     decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Eoriccr */  decode: Operands::new_immediate, },
        IsaEntry { /* Eorisr */   decode: Operands::new_immediate, },
        IsaEntry { /* Exg */      decode: Operands::new_register_opmode_register, },
        IsaEntry { /* Ext */      decode: Operands::new_opmode_register, },
        IsaEntry { /* Fline */    decode: Operands::new_no_operands, },
        IsaEntry { /* Illegal */  decode: Operands::new_no_operands, },
        IsaEntry { /* Jmp */      decode: Operands::new_effective_address, },
        IsaEntry { /* Jsr */      decode: Operands::new_effective_address, },
        IsaEntry { /* Lea */      decode: Operands::new_register_effective_address, },
        IsaEntry { /* Link */     decode: Operands::new_register_displacement, },
        IsaEntry { /* LinkL */    decode: Operands::new_register_displacement_long, },
        IsaEntry { /* Lsm */      decode: Operands::new_direction_effective_address, },
        IsaEntry { /* Lsr */      decode: Operands::new_rotation_direction_size_mode_register, },
        IsaEntry { /* Move */     decode: Operands::new_size_effective_address_effective_address, },
        IsaEntry { /* Move16 */   decode: Operands::new_move16, },
        IsaEntry { /* Movea */    decode: Operands::new_size_register_effective_address, },
        IsaEntry { /* Moveccr */  decode: Operands::new_effective_address, },
        IsaEntry { /* Movec */    decode: Operands::new_direction_extension_word, },
        IsaEntry { /* Movefccr */ decode: Operands::new_effective_address, },
        IsaEntry { /* Movefsr */  decode: Operands::new_effective_address, },
        IsaEntry { /* Movem */    decode: Operands::new_direction_size_effective_address_list, },
        IsaEntry { /* Movep */    decode: Operands::new_register_direction_size_register_displacement, },
        IsaEntry { /* Moveq */    decode: Operands::new_register_data, },
        IsaEntry { /* Moves */    decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Movesr */   decode: Operands::new_effective_address, },
        IsaEntry { /* Moveusp */  decode: Operands::new_direction_register, },
        IsaEntry { /* Mull */     decode: Operands::new_extension_word_effective_address, },
        IsaEntry { /* Muls */     decode: Operands::new_register_effective_address, },
        IsaEntry { /* Mulu */     decode: Operands::new_register_effective_address, },
        IsaEntry { /* Nbcd */     decode: Operands::new_effective_address, },
        IsaEntry { /* Neg */      decode: Operands::new_size_effective_address, },
        IsaEntry { /* Negx */     decode: Operands::new_size_effective_address, },
        IsaEntry { /* Nop */      decode: Operands::new_no_operands, },
        IsaEntry { /* Not */      decode: Operands::new_size_effective_address, },
        IsaEntry { /* Or */       decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Ori */      decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Oriccr */   decode: Operands::new_immediate, },
        IsaEntry { /* Orisr */    decode: Operands::new_immediate, },
        IsaEntry { /* Pack */     decode: Operands::new_register_mode_register_adjustment, },
        IsaEntry { /* Pea */      decode: Operands::new_effective_address, },
        IsaEntry { /* Pflush */   decode: Operands::new_no_operands, },
        IsaEntry { /* Reset */    decode: Operands::new_no_operands, },
        IsaEntry { /* Rom */      decode: Operands::new_direction_effective_address, },
        IsaEntry { /* Ror */      decode: Operands::new_rotation_direction_size_mode_register, },
        IsaEntry { /* Roxm */     decode: Operands::new_direction_effective_address, },
        IsaEntry { /* Roxr */     decode: Operands::new_rotation_direction_size_mode_register, },
        IsaEntry { /* Rtd */      decode: Operands::new_immediate, },
        IsaEntry { /* Rte */      decode: Operands::new_no_operands, },
        IsaEntry { /* Rtr */      decode: Operands::new_no_operands, },
        IsaEntry { /* Rts */      decode: Operands::new_no_operands, },
        IsaEntry { /* Sbcd */     decode: Operands::new_register_size_mode_register, },
        IsaEntry { /* Scc */      decode: Operands::new_condition_effective_address, },
        IsaEntry { /* Stop */     decode: Operands::new_immediate, },
        IsaEntry { /* Sub */      decode: Operands::new_register_direction_size_effective_address, },
        IsaEntry { /* Suba */     decode: Operands::new_register_size_effective_address, },
        IsaEntry { /* Subi */     decode: Operands::new_size_effective_address_immediate, },
        IsaEntry { /* Subq */     decode: Operands::new_data_size_effective_address, },
        IsaEntry { /* Subx */     decode: Operands::new_register_size_mode_register, },
        IsaEntry { /* Swap */     decode: Operands::new_register, },
        IsaEntry { /* Tas */      decode: Operands::new_effective_address, },
        IsaEntry { /* Trap */     decode: Operands::new_vector, },
        IsaEntry { /* Trapcc */   decode: Operands::new_condition, },
        IsaEntry { /* Trapv */    decode: Operands::new_no_operands, },
        IsaEntry { /* Tst */      decode: Operands::new_size_effective_address, },
        IsaEntry { /* Unlk */     decode: Operands::new_register, },
        IsaEntry { /* Unpk */     decode: Operands::new_register_mode_register_adjustment, },
    ];
}
