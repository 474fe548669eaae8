// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interpreter semantics: flags, divides, shifts, stack discipline.

use mac68k::M68040;

use quickcheck::quickcheck;

/// Builds a CPU with the given opcode words at 0x400 and 64 KiB of RAM.
fn cpu_with(words: &[u16]) -> (M68040, Vec<u8>) {
    let mut mem = vec![0u8; 0x1_0000];
    for (i, w) in words.iter().enumerate() {
        mem[0x400 + i * 2..0x402 + i * 2].copy_from_slice(&w.to_be_bytes());
    }
    let mut cpu = M68040::new();
    cpu.regs.pc = 0x400;
    cpu.regs.a[7] = 0x2000;
    (cpu, mem)
}

fn step(cpu: &mut M68040, mem: &mut [u8]) -> Option<u8> {
    cpu.interpreter_exception(mem).unwrap()
}

#[test]
fn move_immediate_sets_nz_and_clears_vc() {
    let (mut cpu, mut mem) = cpu_with(&[0x303c, 0x8000]); // move.w #$8000,d0
    cpu.regs.sr.v = true;
    cpu.regs.sr.c = true;

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.pc, 0x404);
    assert_eq!(cpu.regs.d[0] as u16, 0x8000);
    assert!(cpu.regs.sr.n);
    assert!(!cpu.regs.sr.z);
    assert!(!cpu.regs.sr.v);
    assert!(!cpu.regs.sr.c);
}

#[test]
fn add_byte_carry_latches_x() {
    let (mut cpu, mut mem) = cpu_with(&[0xd001]); // add.b d1,d0
    cpu.regs.d[0] = 0xff;
    cpu.regs.d[1] = 0x01;

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.d[0] as u8, 0);
    assert!(cpu.regs.sr.z);
    assert!(cpu.regs.sr.c);
    assert!(cpu.regs.sr.x);
    assert!(!cpu.regs.sr.v);
}

#[test]
fn x_follows_the_most_recent_arithmetic() {
    let (mut cpu, mut mem) = cpu_with(&[
        0xd001,         // add.b d1,d0  (carries, X set)
        0x303c, 0x1234, // move.w #$1234,d0  (must not touch X)
        0xd001,         // add.b d1,d0  (no carry, X cleared)
    ]);
    cpu.regs.d[0] = 0xff;
    cpu.regs.d[1] = 0x01;

    step(&mut cpu, &mut mem);
    assert!(cpu.regs.sr.x);
    step(&mut cpu, &mut mem);
    assert!(cpu.regs.sr.x, "MOVE must leave X alone");
    step(&mut cpu, &mut mem);
    assert!(!cpu.regs.sr.x);
}

#[test]
fn divs_by_zero_raises_vector_5() {
    let (mut cpu, mut mem) = cpu_with(&[0x81fc, 0x0000]); // divs.w #0,d0
    cpu.regs.d[0] = 100;
    assert_eq!(step(&mut cpu, &mut mem), Some(5));
    assert_eq!(cpu.regs.d[0], 100);
}

#[test]
fn divs_long_overflow_sets_v_and_keeps_the_destination() {
    // divs.l d1,d0 with the only overflowing operands: $80000000 / -1.
    let (mut cpu, mut mem) = cpu_with(&[0x4c41, 0x0800]);
    cpu.regs.d[0] = 0x8000_0000;
    cpu.regs.d[1] = 0xffff_ffff;

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.pc, 0x404);
    assert_eq!(cpu.regs.d[0], 0x8000_0000);
    assert!(cpu.regs.sr.v);
    assert!(!cpu.regs.sr.c);
}

#[test]
fn divsl_returns_quotient_and_remainder() {
    // divsl.l d1,d2:d0 (32-bit dividend in d0, remainder to d2).
    let (mut cpu, mut mem) = cpu_with(&[0x4c41, 0x0802]);
    cpu.regs.d[0] = 17;
    cpu.regs.d[1] = 5;

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.d[0], 3);
    assert_eq!(cpu.regs.d[2], 2);
    assert!(!cpu.regs.sr.v);
}

#[test]
fn divl_64_bit_dividend() {
    // divu.l d1,d2:d0 with a 64-bit dividend d2:d0.
    let (mut cpu, mut mem) = cpu_with(&[0x4c41, 0x0402]);
    cpu.regs.d[0] = 0x0000_0000;
    cpu.regs.d[1] = 0x0001_0000;
    cpu.regs.d[2] = 0x0000_0001; // dividend = 0x1_0000_0000

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.d[0], 0x0001_0000);
    assert_eq!(cpu.regs.d[2], 0);
}

#[test]
fn mulu_long_overflow_flag() {
    // mulu.l d1,d0: 32x32 truncated to 32, V on overflow.
    let (mut cpu, mut mem) = cpu_with(&[0x4c01, 0x0000]);
    cpu.regs.d[0] = 0x10000;
    cpu.regs.d[1] = 0x10000;

    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.d[0], 0);
    assert!(cpu.regs.sr.v);
}

#[test]
fn stop_stops_until_a_deliverable_interrupt() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e72, 0x2000]); // stop #$2000
    assert_eq!(step(&mut cpu, &mut mem), None);
    assert!(cpu.stopped);
    assert_eq!(cpu.sr(), 0x2000);

    // Stopped: nothing executes.
    let pc = cpu.regs.pc;
    assert_eq!(step(&mut cpu, &mut mem), None);
    assert_eq!(cpu.regs.pc, pc);

    // A level-1 interrupt (mask is 0) wakes it and raises the mask.
    cpu.exception(mac68k::exception::Exception::from(25));
    step(&mut cpu, &mut mem);
    assert!(!cpu.stopped);
    assert_eq!(cpu.regs.sr.interrupt_mask, 1);
}

#[test]
fn supervisor_stack_swaps_on_mode_changes() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e40]); // trap #0
    // Drop to user mode; the supervisor stack is parked in ISP.
    cpu.set_sr(0x0000);
    cpu.regs.a[7] = 0x1800; // user stack
    assert_eq!(cpu.regs.isp, 0x2000);

    cpu.interpreter(&mut mem[..]).unwrap(); // trap queued
    cpu.interpreter(&mut mem[..]).unwrap(); // frame built on the interrupt stack
    assert!(cpu.regs.sr.s);
    assert_eq!(cpu.regs.usp, 0x1800);
    // Format 0 frame: 8 bytes on the supervisor stack.
    assert_eq!(cpu.regs.a[7], 0x2000 - 8);
}

#[test]
fn byte_pushes_keep_the_stack_pointer_even() {
    let (mut cpu, mut mem) = cpu_with(&[0x1f00]); // move.b d0,-(sp)
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.a[7], 0x2000 - 2);
}

#[test]
fn asl_overflow_and_carry() {
    let (mut cpu, mut mem) = cpu_with(&[0xe300]); // asl.b #1,d0
    cpu.regs.d[0] = 0x80;

    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.d[0] as u8, 0);
    assert!(cpu.regs.sr.z);
    assert!(cpu.regs.sr.c);
    assert!(cpu.regs.sr.x);
    assert!(cpu.regs.sr.v, "the sign bit changed");
}

#[test]
fn roxl_rotates_through_x() {
    let (mut cpu, mut mem) = cpu_with(&[
        0x44fc, 0x0010, // move #$10,ccr (set X)
        0xe330,         // roxl.b #1,d0
    ]);
    step(&mut cpu, &mut mem);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.d[0] as u8, 1, "X rotated into bit 0");
    assert!(!cpu.regs.sr.c);
    assert!(!cpu.regs.sr.x);
}

#[test]
fn lsr_count_of_zero_clears_c_and_keeps_x() {
    let (mut cpu, mut mem) = cpu_with(&[
        0x44fc, 0x0011, // move #$11,ccr (X and C set)
        0xe029,         // lsr.b d0,d1 with d0 = 0
    ]);
    cpu.regs.d[1] = 0x5a;
    step(&mut cpu, &mut mem);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.d[1] as u8, 0x5a);
    assert!(!cpu.regs.sr.c);
    assert!(cpu.regs.sr.x);
}

#[test]
fn dbra_counts_to_minus_one() {
    let (mut cpu, mut mem) = cpu_with(&[0x51c8, 0xfffe]); // dbra d0,*-0
    cpu.regs.d[0] = 2;

    // Two taken branches, then fall-through at -1.
    for _ in 0..3 {
        step(&mut cpu, &mut mem);
    }
    assert_eq!(cpu.regs.d[0] as u16, 0xffff);
    assert_eq!(cpu.regs.pc, 0x404);
}

#[test]
fn bsr_pushes_the_return_address() {
    let (mut cpu, mut mem) = cpu_with(&[0x6100, 0x00fc]); // bsr.w *+0xfe
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.pc, 0x4fe);
    assert_eq!(cpu.regs.a[7], 0x1ffc);
    assert_eq!(mem[0x1ffc..0x2000], [0, 0, 0x04, 0x04]);
}

#[test]
fn movem_predecrement_and_back() {
    let (mut cpu, mut mem) = cpu_with(&[
        0x48e7, 0xc000, // movem.l d0-d1,-(sp)
        0x4cdf, 0x0003, // movem.l (sp)+,d0-d1
    ]);
    cpu.regs.d[0] = 0x1111_2222;
    cpu.regs.d[1] = 0x3333_4444;

    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.a[7], 0x2000 - 8);
    cpu.regs.d[0] = 0;
    cpu.regs.d[1] = 0;
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.a[7], 0x2000);
    assert_eq!(cpu.regs.d[0], 0x1111_2222);
    assert_eq!(cpu.regs.d[1], 0x3333_4444);
}

#[test]
fn pc_relative_reads_use_the_extension_address() {
    // lea (6,pc),a0: EA = 0x402 + 6.
    let (mut cpu, mut mem) = cpu_with(&[0x41fa, 0x0006]);
    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.a[0], 0x408);
}

#[test]
fn scaled_index_addressing() {
    // move.b (0,a0,d1.l*4),d0: brief extension word with scale 4.
    let (mut cpu, mut mem) = cpu_with(&[0x1030, 0x1c00]);
    cpu.regs.a[0] = 0x1000;
    cpu.regs.d[1] = 3;
    mem[0x100c] = 0x7e;

    step(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.d[0] as u8, 0x7e);
}

#[test]
fn cas_compare_and_swap() {
    let (mut cpu, mut mem) = cpu_with(&[0x0cd0, 0x0040]); // cas.w d0,d1,(a0)
    cpu.regs.a[0] = 0x1000;
    mem[0x1000] = 0x12;
    mem[0x1001] = 0x34;
    cpu.regs.d[0] = 0x1234; // compare matches
    cpu.regs.d[1] = 0x5678; // update

    step(&mut cpu, &mut mem);
    assert!(cpu.regs.sr.z);
    assert_eq!(&mem[0x1000..0x1002], &[0x56, 0x78]);
}

/// Thousands of steps over random memory: every byte pattern decodes into
/// either an instruction or an exception, and the machine state stays
/// self-consistent. A double bus error (random SSP into nowhere) is the one
/// legitimate way out.
#[test]
fn random_program_soak() {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    let mut rng = StdRng::seed_from_u64(0x68040);
    let mut mem = vec![0u8; 0x1_0000];
    rng.fill(&mut mem[..]);

    let mut cpu = M68040::new();
    cpu.regs.pc = 0x400;
    cpu.regs.a[7] = 0x2000;

    for _ in 0..10_000 {
        if cpu.interpreter(mem.as_mut_slice()).is_err() {
            break; // double bus error: the frame itself faulted
        }
        if cpu.stopped && !cpu.has_pending_exception() {
            break;
        }
    }
}

quickcheck! {
    /// Any opcode word with a random register file either executes or
    /// raises exactly one exception; the interpreter never wedges.
    fn decode_is_total(opcode: u16, d0: u32, a0: u32) -> bool {
        let mut mem = vec![0u8; 0x1_0000];
        mem[0x400..0x402].copy_from_slice(&opcode.to_be_bytes());
        let mut cpu = M68040::new();
        cpu.regs.pc = 0x400;
        cpu.regs.a[7] = 0x2000;
        cpu.regs.d[0] = d0;
        cpu.regs.a[0] = a0;

        cpu.interpreter_exception(mem.as_mut_slice()).is_ok()
    }

    /// The three stack pointers and A7 stay consistent with S and M across
    /// arbitrary SR writes, and the cached S/mask shadow never goes stale.
    fn stack_aliasing_is_consistent(sr: u16, sp: u32) -> bool {
        let mut cpu = M68040::new();
        cpu.regs.a[7] = sp;
        cpu.set_sr(sr);

        if cpu.emulated_sr() & 0x0700 != (cpu.regs.sr.interrupt_mask as u16) << 8 {
            return false;
        }

        // Whichever stack A7 aliases now, switching away and back must
        // restore it.
        let a7 = cpu.regs.a[7];
        cpu.set_sr(sr ^ 0x2000); // flip S
        cpu.set_sr(sr);
        cpu.regs.a[7] == a7
    }
}
