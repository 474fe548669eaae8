// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mac68k::M68040;

use criterion::{Criterion, criterion_group, criterion_main};

/// A counted DBRA-style loop ending in STOP, the classic TimeDBRA shape.
fn countdown(c: &mut Criterion) {
    let mut mem = vec![0u8; 0x1000];
    let program: [u16; 4] = [
        0x5380, // subq.l #1,d0
        0x66fc, // bne.s  *-2
        0x4e72, 0x2700, // stop #$2700
    ];
    for (i, w) in program.iter().enumerate() {
        mem[0x400 + i * 2..0x402 + i * 2].copy_from_slice(&w.to_be_bytes());
    }

    c.bench_function("countdown 10000", |b| {
        b.iter(|| {
            let mut cpu = M68040::new();
            cpu.regs.pc = 0x400;
            cpu.regs.a[7] = 0x800;
            cpu.regs.d[0] = 10_000;
            while !cpu.stopped {
                cpu.interpreter(mem.as_mut_slice()).unwrap();
            }
            cpu.regs.d[0]
        })
    });
}

criterion_group!(benches, countdown);
criterion_main!(benches);
