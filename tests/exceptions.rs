// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Exception stack frames, vectoring through VBR, and the RTE formats.

use mac68k::M68040;
use mac68k::exception::{Exception, Vector};

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

fn word(mem: &[u8], addr: u32) -> u16 {
    (mem[addr as usize] as u16) << 8 | mem[addr as usize + 1] as u16
}

fn long(mem: &[u8], addr: u32) -> u32 {
    (word(mem, addr) as u32) << 16 | word(mem, addr + 2) as u32
}

fn put_long(mem: &mut [u8], addr: u32, value: u32) {
    mem[addr as usize..addr as usize + 4].copy_from_slice(&value.to_be_bytes());
}

/// Points a vector at `handler` and parks a `stop #$2100` there, so the
/// vectored PC is observable as a stopped CPU right past the handler entry.
fn install_handler(mem: &mut [u8], vbr: u32, vector: u32, handler: u32) {
    put_long(mem, vbr + vector * 4, handler);
    mem[handler as usize..handler as usize + 4].copy_from_slice(&[0x4e, 0x72, 0x21, 0x00]);
}

fn process(cpu: &mut M68040, mem: &mut [u8]) {
    cpu.interpreter(mem).unwrap();
}

#[test]
fn illegal_instruction_frame_honors_vbr() {
    let (mut cpu, mut mem) = cpu_with(&[0x4afc]); // ILLEGAL
    // User mode, supervisor stack parked in ISP.
    cpu.set_sr(0x0000);
    cpu.regs.a[7] = 0x1800;
    let sr_before = cpu.sr();

    // Vector table at VBR = 0x100; vector 4 points at 0x500.
    cpu.regs.vbr = 0x100;
    install_handler(&mut mem, 0x100, 4, 0x500);

    process(&mut cpu, &mut mem); // raises vector 4
    process(&mut cpu, &mut mem); // builds the frame, runs the handler stop

    assert!(cpu.regs.sr.s);
    assert!(cpu.stopped);
    assert_eq!(cpu.regs.pc, 0x504);

    // Format 0 frame on the interrupt stack: SR, PC of the illegal
    // instruction, format|offset word.
    let sp = cpu.regs.a[7];
    assert_eq!(sp, 0x2000 - 8);
    assert_eq!(word(&mem, sp), sr_before);
    assert_eq!(long(&mem, sp + 2), 0x400);
    assert_eq!(word(&mem, sp + 6), 0x0010);
    assert_eq!(cpu.regs.usp, 0x1800);
}

#[test]
fn odd_word_store_builds_an_address_error_frame() {
    let (mut cpu, mut mem) = cpu_with(&[0x3080]); // move.w d0,(a0)
    cpu.regs.a[0] = 0x1001;
    install_handler(&mut mem, 0, 3, 0x600);

    process(&mut cpu, &mut mem);
    process(&mut cpu, &mut mem);

    assert_eq!(cpu.regs.pc, 0x604);
    let sp = cpu.regs.a[7];
    // Format $2 frame: SR, next PC, format|offset, faulting address.
    assert_eq!(long(&mem, sp + 2), 0x402);
    assert_eq!(word(&mem, sp + 6), 0x2000 | 3 << 2);
    assert_eq!(long(&mem, sp + 8), 0x1000, "low bit of the fault address is cleared");
}

#[test]
fn zero_divide_frame_records_the_instruction_address() {
    let (mut cpu, mut mem) = cpu_with(&[0x81fc, 0x0000]); // divs.w #0,d0
    install_handler(&mut mem, 0, 5, 0x700);

    process(&mut cpu, &mut mem);
    process(&mut cpu, &mut mem);

    assert_eq!(cpu.regs.pc, 0x704);
    let sp = cpu.regs.a[7];
    assert_eq!(word(&mem, sp + 6), 0x2000 | 5 << 2);
    // The extra long points back at the DIVS itself.
    assert_eq!(long(&mem, sp + 8), 0x400);
}

#[test]
fn unmapped_access_builds_a_68040_access_error_frame() {
    let (mut cpu, mut mem) = cpu_with(&[0x2010]); // move.l (a0),d0
    cpu.regs.a[0] = 0x8000_0000; // far outside the 64 KiB plane
    install_handler(&mut mem, 0, 2, 0x800);

    process(&mut cpu, &mut mem);
    process(&mut cpu, &mut mem);

    assert_eq!(cpu.regs.pc, 0x804);
    let sp = cpu.regs.a[7];
    // Format $7, 30 words deep.
    assert_eq!(sp, 0x2000 - 60);
    assert_eq!(word(&mem, sp + 6), 0x7000 | 2 << 2);
    // The effective address field carries the faulting address.
    assert_eq!(long(&mem, sp + 8), 0x8000_0000);
}

#[test]
fn rte_with_an_unknown_format_raises_format_error() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e73]); // rte
    // Hand-built frame with a bogus format word.
    cpu.regs.a[7] = 0x1ff8;
    mem[0x1ff8] = 0x20; // SR = $2000
    put_long(&mut mem, 0x1ffa, 0x1234);
    mem[0x1ffe] = 0xf0; // format $f

    let vector = cpu.interpreter_exception(&mut mem[..]).unwrap();
    assert_eq!(vector, Some(Vector::FormatError as u8));
}

#[test]
fn rte_pops_the_throwaway_frame_and_switches_stacks() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e73]); // rte
    // The two-stack layout an interrupt taken in master state leaves:
    // throwaway format $1 frame on the interrupt stack (live A7), the real
    // frame on the master stack. Loading the throwaway SR sets M and moves
    // A7 to the master stack mid-unwind.
    cpu.regs.a[7] = 0x1ff8;
    mem[0x1ff8] = 0x30; // saved SR: S+M
    put_long(&mut mem, 0x1ffa, 0x0); // PC copy, ignored
    mem[0x1ffe] = 0x10; // format $1
    mem[0x1fff] = 0x64;

    cpu.regs.msp = 0x2ff8;
    mem[0x2ff8] = 0x00; // interrupted SR: user
    put_long(&mut mem, 0x2ffa, 0x4242); // interrupted PC
    mem[0x2ffe] = 0x00; // format $0
    mem[0x2fff] = 0x64;

    assert_eq!(cpu.interpreter_exception(&mut mem[..]).unwrap(), None);
    assert_eq!(cpu.regs.pc, 0x4242);
    assert!(!cpu.regs.sr.s);
    // The drained interrupt stack was parked back in ISP.
    assert_eq!(cpu.regs.isp, 0x2000);
}

#[test]
fn interrupt_in_master_state_pushes_a_throwaway_frame() {
    let (mut cpu, mut mem) = cpu_with(&[]);
    cpu.set_sr(0x3000); // supervisor, master
    cpu.regs.a[7] = 0x3000; // master stack
    cpu.regs.isp = 0x2000;
    install_handler(&mut mem, 0, 25, 0x900);

    cpu.exception(Exception::from(Vector::Level1Interrupt));
    process(&mut cpu, &mut mem);

    assert_eq!(cpu.regs.pc, 0x904);

    // Normal frame went to the master stack.
    assert_eq!(cpu.regs.msp, 0x3000 - 8);
    assert_eq!(word(&mem, cpu.regs.msp + 6), 25 << 2);
    // The throwaway format $1 frame sits on the interrupt stack, which
    // became the live A7 when M was cleared.
    assert_eq!(cpu.regs.a[7], 0x2000 - 8);
    assert_eq!(word(&mem, cpu.regs.a[7] + 6), 0x1000 | 25 << 2);
}

#[test]
fn masked_interrupts_wait_for_the_mask_to_drop() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e71, 0x4e71]); // nops
    cpu.set_sr(0x2700);
    cpu.exception(Exception::from(Vector::Level1Interrupt));

    process(&mut cpu, &mut mem);
    // Still pending, the nop executed instead.
    assert_eq!(cpu.regs.pc, 0x402);
    assert!(cpu.has_pending_exception());

    cpu.set_sr(0x2000);
    process(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.sr.interrupt_mask, 1);
    assert!(!cpu.has_pending_exception());
}

#[test]
fn nmi_cuts_through_the_mask() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e71]);
    cpu.set_sr(0x2700);
    install_handler(&mut mem, 0, 31, 0xa00);

    cpu.exception(Exception::from(Vector::Level7Interrupt));
    process(&mut cpu, &mut mem);
    assert_eq!(cpu.regs.pc, 0xa04);
}

#[test]
fn trace_fires_after_one_instruction() {
    let (mut cpu, mut mem) = cpu_with(&[0x4e71]); // nop
    cpu.set_sr(0xa000); // T1 + S
    let vector = cpu.interpreter_exception(&mut mem[..]).unwrap();
    assert_eq!(vector, Some(Vector::Trace as u8));
}
