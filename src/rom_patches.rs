// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ROM decoding and patching.
//!
//! The patcher is a one-shot binary rewriter: it identifies the ROM by its
//! version word, locates known routines by fingerprint byte strings, by the
//! resource map or by the trap offset table, and overwrites 68k code with
//! no-ops, branches and escape opcodes. Every required fingerprint is a
//! correctness gate: a miss aborts startup instead of letting a silently
//! mispatched ROM run.

use crate::assembler::{self, Condition};
use crate::addressing_modes::AddressingMode;
use crate::emul_op::{CDROM_DRIVER_FLAGS, DISK_DRIVER_FLAGS, EmulOp, SONY_DRIVER_FLAGS};
use crate::instruction::Size;
use crate::machine::RomInfo;
use crate::memory::{MemoryPlane, ROM_BASE, SCRATCH_MIDDLE};
use crate::slot_rom::{self, SlotRomConfig};

use log::{debug, warn};

/// The 32-bit clean ROM class this core accepts.
pub const ROM_VERSION_32: u16 = 0x067c;

/// Faults while decoding or patching a ROM image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RomError {
    /// The image is not a known raw size and not a CHRP wrapper.
    BadSize(usize),
    /// A CHRP wrapper without usable decode directives.
    BadWrapper,
    /// The version word marks an unsupported ROM class.
    UnsupportedVersion(u16),
    /// A required resource or routine was not found.
    FingerprintMissing(&'static str),
}

impl std::fmt::Display for RomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadSize(size) => write!(f, "ROM size {size:#x} is not supported"),
            Self::BadWrapper => write!(f, "CHRP ROM wrapper carries no usable decode information"),
            Self::UnsupportedVersion(v) => write!(f, "ROM type {v:#06x} is not supported"),
            Self::FingerprintMissing(what) => write!(f, "ROM type not supported ({what} not found)"),
        }
    }
}

impl std::error::Error for RomError {}

const SIZE_512K: usize = 0x8_0000;
const SIZE_1M: usize = 0x10_0000;
const SIZE_4M: usize = 0x40_0000;

/// Decodes a ROM file into a flat image: raw images pass through, CHRP
/// wrappers are unpacked (plain LZSS or a `prcl` parcel chain).
pub fn decode_rom(data: &[u8]) -> Result<Vec<u8>, RomError> {
    match data.len() {
        SIZE_512K | SIZE_1M | SIZE_4M => return Ok(data.to_vec()),
        _ => {},
    }

    if !data.starts_with(b"<CHRP-BOOT>") {
        return Err(RomError::BadSize(data.len()));
    }

    // The wrapper is Forth source; the interesting directives look like
    // "xxxxxx constant lzss-offset" with six hex digits before the word.
    let (offset, size) = find_decode_info(data, b"constant lzss-offset", b"constant lzss-size")
        .or_else(|| find_decode_info(data, b"constant parcels-offset", b"constant parcels-size"))
        .ok_or(RomError::BadWrapper)?;

    let offset = offset as usize;
    if offset + 4 > data.len() {
        return Err(RomError::BadWrapper);
    }
    let end = (offset + size as usize).min(data.len());

    let mut rom = vec![0u8; SIZE_4M];
    if &data[offset..offset + 4] == b"prcl" {
        decode_parcels(&data[offset..end], &mut rom);
    } else {
        decode_lzss(&data[offset..end], &mut rom);
    }
    Ok(rom)
}

fn find_decode_info(data: &[u8], offset_key: &[u8], size_key: &[u8]) -> Option<(u32, u32)> {
    let offset = hex_before(data, offset_key)?;
    let size = hex_before(data, size_key)?;
    Some((offset, size))
}

/// Parses the six hex digits preceding a `constant` directive.
fn hex_before(data: &[u8], key: &[u8]) -> Option<u32> {
    let pos = data.windows(key.len()).position(|w| w == key)?;
    let digits = data.get(pos.checked_sub(7)?..pos - 1)?;
    let text = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text.trim(), 16).ok()
}

/// LZSS with a 4 KiB ring dictionary, as Apple's boot loader expects it.
pub fn decode_lzss(src: &[u8], dest: &mut [u8]) {
    let mut dict = [0u8; 0x1000];
    let mut dict_idx = 0xfeeusize;
    let mut run_mask = 0u32;
    let mut src = src.iter();
    let mut out = 0usize;

    loop {
        if run_mask < 0x100 {
            // Start a new run.
            let Some(&b) = src.next() else { break };
            run_mask = b as u32 | 0xff00;
        }
        let verbatim = run_mask & 1 != 0;
        run_mask >>= 1;
        if verbatim {
            let Some(&c) = src.next() else { break };
            dict[dict_idx] = c;
            dict_idx = (dict_idx + 1) & 0xfff;
            if out < dest.len() {
                dest[out] = c;
            }
            out += 1;
        } else {
            let Some(&idx) = src.next() else { break };
            let Some(&cnt) = src.next() else { break };
            let mut idx = idx as usize | (cnt as usize) << 4 & 0xf00;
            let cnt = (cnt & 0x0f) + 3;
            for _ in 0..cnt {
                let c = dict[idx];
                dict[dict_idx] = c;
                idx = (idx + 1) & 0xfff;
                dict_idx = (dict_idx + 1) & 0xfff;
                if out < dest.len() {
                    dest[out] = c;
                }
                out += 1;
            }
        }
    }
}

/// Walks a `prcl` parcel chain, LZSS-decoding every `rom ` parcel into the
/// destination.
pub fn decode_parcels(src: &[u8], dest: &mut [u8]) {
    let mut parcel_offset = 0x14usize;
    let mut out_start = 0usize;
    while parcel_offset != 0 && parcel_offset + 12 <= src.len() {
        let next_offset = be32(src, parcel_offset) as usize;
        let parcel_type = &src[parcel_offset + 4..parcel_offset + 8];
        if parcel_type == b"rom " {
            let lzss_offset = be32(src, parcel_offset + 8) as usize;
            let end = if next_offset == 0 { src.len() } else { next_offset };
            let payload = &src[parcel_offset + lzss_offset..end.min(src.len())];
            decode_lzss(payload, &mut dest[out_start..]);
            out_start = dest.len(); // Parcel ROMs concatenate; one fills it.
        }
        parcel_offset = next_offset;
    }
}

fn be16(data: &[u8], ofs: usize) -> u16 {
    (data[ofs] as u16) << 8 | data[ofs + 1] as u16
}

fn be32(data: &[u8], ofs: usize) -> u32 {
    (data[ofs] as u32) << 24 | (data[ofs + 1] as u32) << 16 | (data[ofs + 2] as u32) << 8 | data[ofs + 3] as u32
}

/// Patch-time parameters.
pub struct PatchConfig {
    pub model_id: u8,
    pub fpu: bool,
    pub frame_base: u32,
}

/// Mutable view over the ROM with the accessors the patch script needs.
struct Rom<'a> {
    data: &'a mut [u8],
}

impl Rom<'_> {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn read_u8(&self, ofs: u32) -> u8 {
        self.data[ofs as usize]
    }

    fn read_u16(&self, ofs: u32) -> u16 {
        be16(self.data, ofs as usize)
    }

    fn read_u32(&self, ofs: u32) -> u32 {
        be32(self.data, ofs as usize)
    }

    fn write_u8(&mut self, ofs: u32, value: u8) {
        self.data[ofs as usize] = value;
    }

    fn write_u16(&mut self, ofs: u32, value: u16) {
        self.data[ofs as usize..ofs as usize + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn write_u32(&mut self, ofs: u32, value: u32) {
        self.data[ofs as usize..ofs as usize + 4].copy_from_slice(&value.to_be_bytes());
    }

    /// Writes a run of opcode words, returning the offset past them.
    fn write_words(&mut self, ofs: u32, words: &[u16]) -> u32 {
        let mut at = ofs;
        for &w in words {
            self.write_u16(at, w);
            at += 2;
        }
        at
    }

    fn write_nops(&mut self, ofs: u32, count: u32) -> u32 {
        let mut at = ofs;
        for _ in 0..count {
            self.write_u16(at, assembler::nop());
            at += 2;
        }
        at
    }

    fn write_bytes(&mut self, ofs: u32, bytes: &[u8]) {
        self.data[ofs as usize..ofs as usize + bytes.len()].copy_from_slice(bytes);
    }

    /// Searches a ROM range for a byte string.
    fn find(&self, start: u32, end: u32, needle: &[u8]) -> Option<u32> {
        let end = (end as usize).min(self.data.len());
        let hay = self.data.get(start as usize..end)?;
        hay.windows(needle.len()).position(|w| w == needle).map(|p| p as u32 + start)
    }

    /// Searches the ROM resource map for a resource, returning its data
    /// offset and its map entry offset.
    fn find_resource(&self, rsrc_type: &[u8; 4], rsrc_id: i16) -> Option<(u32, u32)> {
        let lp = self.read_u32(0x1a);
        self.find_resource_from(self.read_u32(lp), rsrc_type, rsrc_id)
    }

    /// Continues a resource search behind a previous hit (for doubled
    /// resources).
    fn find_resource_after(&self, entry: u32, rsrc_type: &[u8; 4], rsrc_id: i16) -> Option<(u32, u32)> {
        self.find_resource_from(self.read_u32(entry + 8), rsrc_type, rsrc_id)
    }

    fn find_resource_from(&self, mut rsrc_ptr: u32, rsrc_type: &[u8; 4], rsrc_id: i16) -> Option<(u32, u32)> {
        let wanted = u32::from_be_bytes(*rsrc_type);
        while rsrc_ptr != 0 && (rsrc_ptr as usize) < self.data.len() {
            let data = self.read_u32(rsrc_ptr + 12);
            let rtype = self.read_u32(rsrc_ptr + 16);
            let id = self.read_u16(rsrc_ptr + 20) as i16;
            if rtype == wanted && id == rsrc_id {
                return Some((data, rsrc_ptr));
            }
            rsrc_ptr = self.read_u32(rsrc_ptr + 8);
        }
        None
    }

    /// Walks the compressed A-Trap offset table for the ROM address of a
    /// trap routine. The Toolbox table comes first, then the OS table.
    fn find_trap(&self, trap: u16) -> Option<u32> {
        let mut bp = self.read_u32(0x22);
        let mut rom_trap = 0xa800u16;
        let mut ofs = 0u32;

        for _ in 0..2 {
            for _ in 0..0x400 {
                let mut unimplemented = false;
                let b = self.read_u8(bp);
                bp += 1;
                if b == 0x80 {
                    unimplemented = true;
                } else if b == 0xff {
                    // Absolute address.
                    ofs = self.read_u32(bp);
                    bp += 4;
                } else if b & 0x80 != 0 {
                    // One-byte offset.
                    let add = ((b & 0x7f) as u32) << 1;
                    if add == 0 {
                        return None;
                    }
                    ofs = ofs.wrapping_add(add);
                } else {
                    // Two-byte offset, signed.
                    let b2 = self.read_u8(bp);
                    bp += 1;
                    let add = (((b as u16) << 8 | b2 as u16) << 1) as i16;
                    if add == 0 {
                        return None;
                    }
                    ofs = ofs.wrapping_add(add as u32);
                }
                if rom_trap == trap {
                    return if unimplemented { None } else { Some(ofs) };
                }
                rom_trap = rom_trap.wrapping_add(1);
            }
            rom_trap = 0xa000;
        }
        None
    }
}

/// Builds a block-device DRVR (Open/Prime/Control/Status quartet leading
/// with escape opcodes, shared IOReturn, Close refusing with closErr).
fn block_driver(name: &str, flags: u16, ops: [EmulOp; 4]) -> Vec<u8> {
    let open = vec![assembler::emul_op(ops[0] as u8), assembler::rts()];
    let control_len = 6u16; // escape + cmpi + bne + rts
    let status_len = 1u16;

    // pstring padded to even.
    let name_len = (name.len() as u16 + 2) & !1;
    let open_at = 18 + name_len;
    let prime_at = open_at + open.len() as u16 * 2;
    let control_at = prime_at + 4;
    let status_at = control_at + control_len * 2;
    let io_at = status_at + status_len * 2;
    let io = assembler::io_return();
    let close_at = io_at + io.len() as u16 * 2;

    let mut words: Vec<u16> = vec![flags, 0, 0, 0, open_at, prime_at, control_at, status_at, close_at];
    let mut bytes: Vec<u8> = words.drain(..).flat_map(u16::to_be_bytes).collect();
    bytes.push(name.len() as u8);
    bytes.extend_from_slice(name.as_bytes());
    while bytes.len() & 1 != 0 || bytes.len() < 18 + name_len as usize {
        bytes.push(0);
    }

    let mut body: Vec<u16> = Vec::new();
    body.extend(open);
    // Prime() branches into IOReturn.
    body.push(assembler::emul_op(ops[1] as u8));
    body.extend(assembler::bra((io_at - (prime_at + 4)) as i16));
    // Control() handles killIO inline.
    body.push(assembler::emul_op(ops[2] as u8));
    body.extend(assembler::cmpi(Size::Word, 1, AddressingMode::Ariwd(0, 0x1a)));
    body.extend(assembler::bcc(Condition::NE, (io_at - (control_at + 10)) as i16));
    body.push(assembler::rts());
    // Status() falls through into IOReturn.
    body.push(assembler::emul_op(ops[3] as u8));
    body.extend(io);
    // Close().
    body.push(assembler::moveq(-24, 0));
    body.push(assembler::rts());

    bytes.extend(body.iter().flat_map(|w| w.to_be_bytes()));
    bytes
}

/// Builds one serial DRVR half (.AIn/.AOut/.BIn/.BOut). Every entry loads
/// the port number before its escape; Close is live here.
fn serial_driver(name_bytes: &[u8], flags: u16, port: i8) -> Vec<u8> {
    let name_len = name_bytes.len() as u16;
    let open_at = 18 + name_len;
    let prime_at = open_at + 6;
    let control_at = prime_at + 6;
    let status_at = control_at + 14;
    let close_at = status_at + 6;
    let io_at = close_at + 6;

    let mut words: Vec<u16> = vec![flags, 0, 0, 0, open_at, prime_at, control_at, status_at, close_at];
    let mut bytes: Vec<u8> = words.drain(..).flat_map(u16::to_be_bytes).collect();
    bytes.extend_from_slice(name_bytes);

    let mut body: Vec<u16> = Vec::new();
    body.push(assembler::moveq(port, 0));
    body.push(assembler::emul_op(EmulOp::SerialOpen as u8));
    body.push(assembler::rts());

    body.push(assembler::moveq(port, 0));
    body.push(assembler::emul_op(EmulOp::SerialPrime as u8));
    body.extend(assembler::bra((io_at - (prime_at + 6)) as i16));

    body.push(assembler::moveq(port, 0));
    body.push(assembler::emul_op(EmulOp::SerialControl as u8));
    body.extend(assembler::cmpi(Size::Word, 1, AddressingMode::Ariwd(0, 0x1a)));
    body.extend(assembler::bcc(Condition::NE, (io_at - (control_at + 12)) as i16));
    body.push(assembler::rts());

    body.push(assembler::moveq(port, 0));
    body.push(assembler::emul_op(EmulOp::SerialStatus as u8));
    body.extend(assembler::bra((io_at - (status_at + 6)) as i16));

    body.push(assembler::moveq(port, 0));
    body.push(assembler::emul_op(EmulOp::SerialClose as u8));
    body.push(assembler::rts());

    body.extend(assembler::io_return());

    bytes.extend(body.iter().flat_map(|w| w.to_be_bytes()));
    bytes
}

/// The ADBOp() replacement: raise the mask, escape to the host, then call
/// the completion routine, which may call ADBOp() again.
fn adbop_patch() -> Vec<u16> {
    let mut words = Vec::new();
    words.push(assembler::move_sr_to_stack());
    words.extend(assembler::ori_sr(0x0700));
    words.push(assembler::emul_op(EmulOp::AdbOp as u8));
    words.extend(assembler::movem_push(0x70f0)); // d1-d3/a0-a3
    words.push(0x2648); // move.l  a0,a3
    words.push(0x4aab); words.push(0x0004); // tst.l  4(a3)
    words.push(0x6700); words.push(0x0018); // beq    1
    words.push(0x2053); // move.l  (a3),a0
    words.push(0x226b); words.push(0x0004); // move.l 4(a3),a1
    words.push(0x246b); words.push(0x0008); // move.l 8(a3),a2
    words.push(0x2678); words.push(0x0cf8); // move.l $cf8,a3
    words.push(assembler::jsr_ind(1));
    words.push(assembler::moveq(0, 0));
    words.push(0x6000); words.push(0x0004); // bra    2
    words.push(assembler::moveq(0, 0)); // 1
    words.extend(assembler::movem_pop(0x0f0e)); // 2
    words.push(assembler::move_stack_to_sr());
    words.push(assembler::rts());
    words
}

/// A trap routine body that raises the mask around an escape.
fn masked_escape(op: EmulOp) -> Vec<u16> {
    let mut words = Vec::new();
    words.push(assembler::move_sr_to_stack());
    words.extend(assembler::ori_sr(0x0700));
    words.push(assembler::emul_op(op as u8));
    words.push(assembler::move_stack_to_sr());
    words.push(assembler::rts());
    words
}

/// Installs the ROM patches for the 32-bit clean class. Returns the
/// locations the escape handlers need later.
pub fn patch_rom(mem: &mut MemoryPlane, config: &PatchConfig) -> Result<RomInfo, RomError> {
    let version = be16(mem.rom(), 8);
    if version != ROM_VERSION_32 {
        return Err(RomError::UnsupportedVersion(version));
    }

    let mut rom = Rom { data: mem.rom_mut() };
    let rom_size = rom.size();
    let mut info = RomInfo { version, ..RomInfo::default() };

    // UniversalInfo.
    let universal_dat = [0xdc, 0x00, 0x05, 0x05, 0x3f, 0xff, 0x01, 0x00];
    let base = rom.find(0x3400, 0x3c00, &universal_dat).ok_or(RomError::FingerprintMissing("UniversalInfo"))?;
    let universal = base - 0x10;
    info.universal_info = universal;
    debug!("universal {universal:08x}");

    // Disable the NuBus slots in UniversalInfo.
    let nubus_info = universal + rom.read_u32(universal + 12);
    rom.write_u8(nubus_info, 0x03);
    for i in 1..16 {
        rom.write_u8(nubus_info + i, 0x08);
    }

    // Model ID from the configuration.
    rom.write_u8(universal + 18, config.model_id);

    // Point the hardware base addresses at the scratch area so the ROM's
    // probes land somewhere harmless.
    let decoder_info = universal + rom.read_u32(universal);
    let mut wp = 0x94au32;
    while rom.read_u16(wp) != 0xffff {
        let ofs = rom.read_u16(wp) as i16;
        let lmg = rom.read_u16(wp + 2);
        wp += 4;
        if lmg != 0xcc0 {
            rom.write_u32(decoder_info.wrapping_add((ofs as i32 * 4) as u32), SCRATCH_MIDDLE);
        }
    }

    // Make the FPU optional.
    if !config.fpu {
        rom.write_u8(universal + 22, 4);
    }

    // Special reset opcode, then skip the hardware detection and tests.
    let at = rom.write_words(0x8c, &[assembler::emul_op(EmulOp::Reset as u8)]);
    rom.write_words(at, &assembler::jmp_abs(ROM_BASE + 0xba));

    // Don't GetHardwareInfo.
    rom.write_nops(0xc2, 2);

    // Don't init VIAs.
    rom.write_nops(0xc6, 15);

    // Fake the CPU type test.
    rom.write_words(0x7c0, &[assembler::moveq(4, 7), assembler::rts()]);

    // Don't clear the end of BootGlobs up to the end of RAM.
    let clear_globs_dat = [0x42, 0x9a, 0x36, 0x0a, 0x66, 0xfa];
    if let Some(base) = rom.find(0xa00, 0xb00, &clear_globs_dat) {
        debug!("clear_globs {base:08x}");
        rom.write_nops(base + 2, 2);
    }

    // Don't choke on unknown CPU types in InitMMU.
    let (mmu_start, mmu_end) = if rom_size <= SIZE_512K as u32 {
        (0x4000, 0x5_0000)
    } else {
        (0x8_0000, 0x9_0000)
    };
    let init_mmu_dat: [u8; 7] = if rom_size <= SIZE_512K as u32 {
        [0x0c, 0x47, 0x00, 0x03, 0x62, 0x00, 0xfe]
    } else {
        [0x0c, 0x47, 0x00, 0x04, 0x62, 0x00, 0xfd]
    };
    let base = rom.find(mmu_start, mmu_end, &init_mmu_dat).ok_or(RomError::FingerprintMissing("InitMMU"))?;
    debug!("init_mmu {base:08x}");
    let at = rom.write_nops(base, 4);
    rom.write_words(at + 2, &[assembler::moveq(0, 0), assembler::nop()]);

    // No RBV present.
    let init_mmu2_dat = [0x08, 0x06, 0x00, 0x0d, 0x67];
    if let Some(base) = rom.find(mmu_start, mmu_end, &init_mmu2_dat) {
        debug!("init_mmu2 {base:08x}");
        rom.write_u8(base + 4, 0x60); // bra
    }

    // Don't init the MMU.
    let init_mmu3_dat = [0x0c, 0x2e, 0x00, 0x01, 0xff, 0xe6, 0x66, 0x0c, 0x4c, 0xed, 0x03, 0x87, 0xff, 0xe8];
    let base = rom.find(mmu_start, mmu_end, &init_mmu3_dat).ok_or(RomError::FingerprintMissing("InitMMU3"))?;
    debug!("init_mmu3 {base:08x}");
    rom.write_nops(base + 6, 1);

    // Replace the XPRAM read routines.
    let read_xpram_dat = [0x26, 0x4e, 0x41, 0xf9, 0x50, 0xf0, 0x00, 0x00, 0x08, 0x90, 0x00, 0x02];
    if let Some(base) = rom.find(0x4_0000, 0x5_0000, &read_xpram_dat) {
        debug!("read_xpram {base:08x}");
        rom.write_words(base, &[assembler::emul_op(EmulOp::ReadXpram as u8), assembler::jmp_ind(6)]);
    }
    let read_xpram2_dat = [0x26, 0x4e, 0x08, 0x92, 0x00, 0x02, 0xea, 0x59, 0x02, 0x01, 0x00, 0x07, 0x00, 0x01, 0x00, 0xb8];
    if let Some(base) = rom.find(0x4_0000, 0x5_0000, &read_xpram2_dat) {
        debug!("read_xpram2 {base:08x}");
        rom.write_words(base, &[assembler::emul_op(EmulOp::ReadXpram as u8), assembler::jmp_ind(6)]);
    }
    if rom_size > SIZE_512K as u32 {
        let read_xpram3_dat = [0x48, 0xe7, 0xe0, 0x60, 0x02, 0x01, 0x00, 0x70, 0x0c, 0x01, 0x00, 0x20];
        if let Some(base) = rom.find(0x8_0000, 0x9_0000, &read_xpram3_dat) {
            debug!("read_xpram3 {base:08x}");
            rom.write_words(base, &[assembler::emul_op(EmulOp::ReadXpram2 as u8), assembler::rts()]);
        }
    }

    // Patch ClkNoMem.
    let mut base = rom.find_trap(0xa053).ok_or(RomError::FingerprintMissing("ClkNoMem"))?;
    if rom.read_u16(base) == 0x4ed5 {
        // Newer ROMs jump through A5 immediately; patch the real routine.
        let clk_no_mem_dat = [0x40, 0xc2, 0x00, 0x7c, 0x07, 0x00, 0x48, 0x42];
        base = rom.find(0xb_0000, 0xb_8000, &clk_no_mem_dat).ok_or(RomError::FingerprintMissing("ClkNoMem"))?;
    }
    debug!("clk_no_mem {base:08x}");
    rom.write_words(base, &[assembler::emul_op(EmulOp::ClkNoMem as u8), 0x4ed5]); // jmp (a5)

    // Patch BootGlobs.
    rom.write_words(0x10e, &[assembler::emul_op(EmulOp::PatchBootGlobs as u8), assembler::nop()]);

    // Don't init the SCC.
    let init_scc_dat = [0x08, 0x38, 0x00, 0x01, 0x0d, 0xd1, 0x67, 0x04];
    let base = rom.find(0xa00, 0xa80, &init_scc_dat).ok_or(RomError::FingerprintMissing("InitSCC"))?;
    debug!("init_scc {base:08x}");
    rom.write_words(base, &[assembler::rts()]);

    // Don't access 0x50f1a101.
    if rom.read_u16(0x4234) == 0x50f1 && rom.read_u16(0x4236) == 0xa101 {
        rom.write_nops(0x4232, 5);
    }

    // Don't init the IWM and SCSI.
    rom.write_words(0x9c0, &[assembler::rts()]);
    rom.write_words(0x9a0, &[assembler::rts()]);

    // Don't init the ASC.
    let init_asc_dat = [0x26, 0x68, 0x00, 0x30, 0x12, 0x00, 0xeb, 0x01];
    if let Some(base) = rom.find(0x4000, 0x5000, &init_asc_dat) {
        debug!("init_asc {base:08x}");
        rom.write_u16(base, 0x4ed6); // jmp (a6)
    }

    // Don't EnableExtCache, don't DisableIntSources.
    rom.write_nops(0x190, 2);
    rom.write_words(0x9f4c, &[assembler::rts()]);

    // Fake the CPU speed test: MacsBug uses TimeDBRA for key repeat, so the
    // counts stay plausible instead of zero.
    let mut at = 0x800;
    for lmg in [0x0d00u16, 0x0d02, 0x0b24, 0x0cea] {
        at = rom.write_words(at, &assembler::r#move(
            Size::Word,
            AddressingMode::Immediate(10000),
            AddressingMode::AbsShort(lmg),
        ));
    }
    rom.write_words(at, &[assembler::rts()]);

    // Fake zero-page handle: stray writes through it land mid-scratch.
    rom.write_words(0xccaa, &assembler::r#move(
        Size::Long,
        AddressingMode::Immediate(SCRATCH_MIDDLE),
        AddressingMode::Drd(0),
    ));

    // Don't write to the VIA in InitTimeMgr.
    let at = rom.write_words(0xb0e2, &[0x4cdf, 0x1f3f]); // movem.l (sp)+,d0-d5/a0-a4
    rom.write_words(at, &[assembler::rts()]);

    // Don't read the model ID from 0x5ffffffc.
    let model_id_dat = [0x20, 0x7c, 0x5f, 0xff, 0xff, 0xfc, 0x72, 0x07, 0xc2, 0x90];
    if let Some(base) = rom.find(0x4_0000, 0x5_0000, &model_id_dat) {
        debug!("model_id {base:08x}");
        rom.write_nops(base + 8, 4);
    }
    let model_id2_dat = [0x45, 0xf9, 0x5f, 0xff, 0xff, 0xfc, 0x20, 0x12];
    if let Some(base) = rom.find(0x4000, 0x5000, &model_id2_dat) {
        debug!("model_id2 {base:08x}");
        rom.write_words(base + 6, &[
            assembler::moveq(0, 0),
            0xb040, // cmp.w d0,d0
            0x4ed6, // jmp (a6)
        ]);
    }

    // Install the slot declaration ROM.
    let slot_config = SlotRomConfig { frame_base: config.frame_base, ..SlotRomConfig::default() };
    slot_rom::install(rom.data, &slot_config);

    // Don't probe the NuBus slots.
    let nubus_dat = [0x45, 0xfa, 0x00, 0x0a, 0x42, 0xa7, 0x10, 0x11];
    if let Some(base) = rom.find(0x5000, 0x6000, &nubus_dat) {
        debug!("nubus {base:08x}");
        rom.write_nops(base + 6, 3);
    }

    // Don't EnableOneSecInts.
    let lea_dat = [0x41, 0xf9];
    let base = rom.find(0x226, 0x22a, &lea_dat).ok_or(RomError::FingerprintMissing("EnableOneSecInts"))?;
    debug!("enable_one_sec_ints {base:08x}");
    rom.write_nops(base, 5);

    // Don't EnableParityPatch/Enable60HzInts.
    let base = match rom.find(0x230, 0x234, &lea_dat) {
        Some(base) => base,
        None if rom.read_u16(0x230) == 0x6100 => 0x230,
        None => return Err(RomError::FingerprintMissing("Enable60HzInts")),
    };
    debug!("enable_60hz_ints {base:08x}");
    rom.write_nops(base, 5);

    // Compute the boot stack pointer and fix the RAM sizes (CompBootStack).
    let at = rom.write_words(0x490, &[
        0x2038, 0x010c, // move.l $10c,d0
        0xd0b8, 0x02a6, // add.l  $2a6,d0
        0xe288,         // lsr.l  #1,d0
        0x0880, 0x0000, // bclr   #0,d0
        0x0440, 0x0400, // subi.w #$400,d0
        0x2040,         // move.l d0,a0
        assembler::emul_op(EmulOp::FixMemSize as u8),
    ]);
    rom.write_words(at, &[assembler::rts()]);

    let fix_memsize2_dat = [0x22, 0x30, 0x81, 0xe2, 0x0d, 0xdc, 0xff, 0xba, 0xd2, 0xb0, 0x81, 0xe2, 0x0d, 0xdc, 0xff, 0xec, 0x21, 0xc1, 0x1e, 0xf8];
    if let Some(base) = rom.find(0x4_c000, 0x4_c080, &fix_memsize2_dat) {
        debug!("fix_memsize2 {base:08x}");
        rom.write_nops(base + 16, 2);
    }

    // Don't open the .Sound driver; install our own drivers instead.
    rom.write_u16(0x1142, assembler::emul_op(EmulOp::InstallDrivers as u8));

    // Don't access SonyVars.
    let at = rom.write_nops(0x1144, 4);
    rom.write_nops(at + 4, 1);

    // Don't write to the VIA in InitADB.
    if rom.read_u16(0xa8a8) == 0 && rom_size > SIZE_512K as u32 {
        rom.write_nops(0xb2c6a, 3);
        let at = rom.write_nops(0xb2d2e, 12);
        rom.write_nops(at + 4, 2);
    } else {
        rom.write_nops(0xa8a8, 3);
        let at = rom.write_nops(0xa662, 5);
        rom.write_nops(at + 4, 2);
    }

    // Don't EnableSlotInts.
    let base = rom.find(0x2ee, 0x2f2, &lea_dat).ok_or(RomError::FingerprintMissing("EnableSlotInts"))?;
    debug!("enable_slot_ints {base:08x}");
    rom.write_nops(base, 5);

    // Don't mangle the frame buffer base (GetDevBase).
    let at = rom.write_nops(0x5b78, 2);
    rom.write_words(at, &[
        0x2401, // move.l d1,d2
        0x605e, // bra
    ]);

    if rom_size > SIZE_512K as u32 {
        let frame_base_dat = [0x22, 0x78, 0x0d, 0xd8, 0xd3, 0xe9, 0x00, 0x08];
        if let Some(base) = rom.find(0x8_c000, 0x8_d000, &frame_base_dat) {
            debug!("frame_base {base:08x}");
            rom.write_words(base, &[0x2401, assembler::rts()]);
        }
    }

    // Don't write to VIA2.
    let via2_dat = [0x20, 0x78, 0x0c, 0xec, 0x11, 0x7c, 0x00, 0x90];
    let base = rom.find(0xa000, 0xa400, &via2_dat).ok_or(RomError::FingerprintMissing("VIA2"))?;
    debug!("via2 {base:08x}");
    rom.write_words(base + 4, &[assembler::rts()]);

    let via2b_dat = [0x20, 0x78, 0x0c, 0xec, 0x11, 0x7c, 0x00, 0x90, 0x00, 0x13, 0x4e, 0x75];
    if let Some(base) = rom.find(0x4_0000, 0x4_4000, &via2b_dat) {
        debug!("via2b {base:08x}");
        rom.write_words(base + 4, &[assembler::rts()]);
    }

    // Don't use the PTEST instruction.
    if rom_size > SIZE_512K as u32 {
        let bmove_dat = [0x20, 0x5f, 0x22, 0x5f, 0x0c, 0x38, 0x00, 0x04, 0x01, 0x2f];
        if let Some(base) = rom.find(0x8_7000, 0x8_7800, &bmove_dat) {
            debug!("block_move {base:08x}");
            rom.write_words(base + 4, &[
                assembler::emul_op(EmulOp::BlockMove as u8),
                assembler::moveq(0, 0),
                assembler::rts(),
            ]);
        }

        let ptest2_dat = [0x0c, 0x38, 0x00, 0x04, 0x01, 0x2f, 0x6d, 0x54, 0x48, 0xe7, 0xf8, 0x60];
        if let Some(base) = rom.find(0, rom_size, &ptest2_dat) {
            debug!("ptest2 {base:08x}");
            rom.write_words(base + 8, &[
                assembler::nop(),
                0xf4f8, // cpusha dc/ic
                assembler::nop(),
                assembler::moveq(0, 0),
                assembler::rts(),
            ]);
        }
    }

    // Don't set MemoryDispatch() to an unimplemented trap.
    let memdisp_dat = [0x30, 0x3c, 0xa8, 0x9f, 0xa7, 0x46, 0x30, 0x3c, 0xa0, 0x5c, 0xa2, 0x47];
    if let Some(base) = rom.find(0x4_f100, 0x4_f180, &memdisp_dat) {
        debug!("memdisp {base:08x}");
        rom.write_nops(base + 10, 1);
    }

    // Don't let the .EDisk driver scan ROMBase..0xe00000 for electronic disks.
    if let Some((edisk_offset, _)) = rom.find_resource(b"DRVR", 51) {
        let edisk_dat = [0xd5, 0xfc, 0x00, 0x01, 0x00, 0x00, 0xb5, 0xfc, 0x00, 0xe0, 0x00, 0x00];
        if let Some(base) = rom.find(edisk_offset, edisk_offset + 0x1_0000, &edisk_dat) {
            debug!("edisk {base:08x}");
            rom.write_u16(base + 8, 0);
            rom.write_u16(base + 10, 0);
        }
    }

    // Replace the .Sony driver; .Disk and .AppleCD go into the slots after it.
    let (sony_offset, _) = rom.find_resource(b"DRVR", 4).ok_or(RomError::FingerprintMissing(".Sony driver"))?;
    info.sony_offset = sony_offset;
    debug!("sony {sony_offset:08x}");
    rom.write_bytes(sony_offset, &block_driver(".Sony", SONY_DRIVER_FLAGS,
        [EmulOp::SonyOpen, EmulOp::SonyPrime, EmulOp::SonyControl, EmulOp::SonyStatus]));
    rom.write_bytes(sony_offset + 0x100, &block_driver(".Disk", DISK_DRIVER_FLAGS,
        [EmulOp::DiskOpen, EmulOp::DiskPrime, EmulOp::DiskControl, EmulOp::DiskStatus]));
    rom.write_bytes(sony_offset + 0x200, &block_driver(".AppleCD", CDROM_DRIVER_FLAGS,
        [EmulOp::CdromOpen, EmulOp::CdromPrime, EmulOp::CdromControl, EmulOp::CdromStatus]));

    // Install the SERD patch and the serial drivers.
    let (serd_offset, _) = rom.find_resource(b"SERD", 0).ok_or(RomError::FingerprintMissing("SERD resource"))?;
    info.serd_offset = serd_offset;
    debug!("serd {serd_offset:08x}");
    rom.write_words(serd_offset + 12, &[assembler::emul_op(EmulOp::InstallSerd as u8), assembler::rts()]);
    rom.write_bytes(serd_offset + 0x100, &serial_driver(b"\x04.AIn\x09", 0x4d00, 0));
    rom.write_bytes(serd_offset + 0x200, &serial_driver(b"\x05.AOut\x09\x00", 0x4e00, 1));
    rom.write_bytes(serd_offset + 0x300, &serial_driver(b"\x04.BIn\x09", 0x4d00, 2));
    rom.write_bytes(serd_offset + 0x400, &serial_driver(b"\x05.BOut\x09\x00", 0x4e00, 3));

    // Replace ADBOp().
    let base = rom.find_trap(0xa07c).ok_or(RomError::FingerprintMissing("ADBOp"))?;
    rom.write_words(base, &adbop_patch());

    // Replace the Time Manager. Microseconds() and DebugUtil() get
    // generated routines right behind PrimeTime(); InstallDrivers()
    // activates them.
    let base = rom.find_trap(0xa058).ok_or(RomError::FingerprintMissing("InsTime"))?;
    rom.write_words(base, &[assembler::emul_op(EmulOp::InsTime as u8), assembler::rts()]);
    let base = rom.find_trap(0xa059).ok_or(RomError::FingerprintMissing("RmvTime"))?;
    rom.write_words(base, &masked_escape(EmulOp::RmvTime));
    let base = rom.find_trap(0xa05a).ok_or(RomError::FingerprintMissing("PrimeTime"))?;
    let at = rom.write_words(base, &masked_escape(EmulOp::PrimeTime));
    info.microseconds_offset = at;
    let at = rom.write_words(at, &[assembler::emul_op(EmulOp::Microseconds as u8), assembler::rts()]);
    info.debugutil_offset = at;
    rom.write_words(at, &[assembler::emul_op(EmulOp::DebugUtil as u8), assembler::rts()]);

    // Replace SCSIDispatch().
    let base = rom.find_trap(0xa815).ok_or(RomError::FingerprintMissing("SCSIDispatch"))?;
    rom.write_words(base, &[
        assembler::emul_op(EmulOp::ScsiDispatch as u8),
        0x2e49, // move.l a1,a7
        assembler::jmp_ind(0),
    ]);

    // Modify vCheckLoad() so resources can be patched after loading.
    let check_load_thunk = sony_offset + 0x300;
    rom.write_words(0x1b8f4, &assembler::jmp_abs(ROM_BASE + check_load_thunk));
    let at = rom.write_words(check_load_thunk, &[
        0x2f03,         // move.l d3,-(sp) (save type)
        0x2078, 0x07f0, // move.l $07f0,a0
        assembler::jsr_ind(0),
        0x221f,         // move.l (sp)+,d1 (restore type)
        assembler::emul_op(EmulOp::CheckLoad as u8),
    ]);
    rom.write_words(at, &[assembler::rts()]);

    // PowerOff() becomes a clean shutdown.
    let base = rom.find_trap(0xa05b).ok_or(RomError::FingerprintMissing("PowerOff"))?;
    rom.write_u16(base, assembler::emul_op(EmulOp::Shutdown as u8));

    // PutScrap()/GetScrap() patches: escape first for host sync, then jump
    // into the ROM routine. InstallDrivers() activates them.
    let base = rom.find_trap(0xa9fe).ok_or(RomError::FingerprintMissing("PutScrap"))?;
    info.put_scrap_patch = ROM_BASE + sony_offset + 0xc00;
    let at = rom.write_words(sony_offset + 0xc00, &[assembler::emul_op(EmulOp::PutScrap as u8)]);
    rom.write_words(at, &assembler::jmp_abs(ROM_BASE + base));

    let base = rom.find_trap(0xa9fd).ok_or(RomError::FingerprintMissing("GetScrap"))?;
    info.get_scrap_patch = ROM_BASE + sony_offset + 0xd00;
    let at = rom.write_words(sony_offset + 0xd00, &[assembler::emul_op(EmulOp::GetScrap as u8)]);
    rom.write_words(at, &assembler::jmp_abs(ROM_BASE + base));

    // Doubled PACK 4 means SANE can fall back to software floating point.
    let (_, entry) = rom.find_resource(b"PACK", 4).ok_or(RomError::FingerprintMissing("PACK 4"))?;
    if rom.find_resource_after(entry, b"PACK", 4).is_none() && !config.fpu {
        warn!("this ROM seems to require an FPU");
    }

    // Replace the VIA level-1 interrupt handler.
    let at = rom.write_words(0x9bc4, &[assembler::moveq(2, 0)]); // always the 60Hz interrupt
    rom.write_nops(at, 4);

    // The 60Hz handler walks the interrupt flags through the IRQ escape
    // until nothing is pending.
    let at = rom.write_nops(0xa296, 2);
    rom.write_words(at, &[
        assembler::emul_op(EmulOp::Irq as u8),
        0x4a80, // tst.l d0
        0x67f4, // beq back to the escape
    ]);

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzss_round_trip_of_a_known_stream() {
        // One verbatim run of 8 bytes: mask 0xff then the bytes.
        let src = [0xff, b'B', b'o', b'o', b't', b' ', b'T', b'N', b'T'];
        let mut dest = vec![0u8; 8];
        decode_lzss(&src, &mut dest);
        assert_eq!(&dest, b"Boot TNT");
    }

    #[test]
    fn lzss_dictionary_copies() {
        // Four verbatim bytes, then a copy of three from window index 0xfee
        // (idx = 0xee | (0xf0 << 4 & 0xf00), cnt = (0xf0 & 0x0f) + 3).
        let src = [
            0b0000_1111,
            b'a', b'b', b'a', b'b',
            0xee, 0xf0,
        ];
        let mut dest = vec![0u8; 7];
        decode_lzss(&src, &mut dest);
        assert_eq!(&dest[..4], b"abab");
        assert_eq!(&dest[4..], b"aba");
    }

    #[test]
    fn hex_directives_parse() {
        let wrapper = b"<CHRP-BOOT> blah 06a000 constant lzss-offset x 0f9b60 constant lzss-size";
        assert_eq!(hex_before(wrapper, b"constant lzss-offset"), Some(0x6a000));
        assert_eq!(hex_before(wrapper, b"constant lzss-size"), Some(0xf9b60));
    }

    #[test]
    fn block_driver_layout_matches_the_header() {
        let drvr = block_driver(".Sony", SONY_DRIVER_FLAGS, [EmulOp::SonyOpen, EmulOp::SonyPrime, EmulOp::SonyControl, EmulOp::SonyStatus]);
        assert_eq!(be16(&drvr, 0), SONY_DRIVER_FLAGS);
        // Entry offsets as the DRVR header carries them.
        assert_eq!(be16(&drvr, 8), 0x18); // Open
        assert_eq!(be16(&drvr, 10), 0x1c); // Prime
        assert_eq!(be16(&drvr, 12), 0x20); // Control
        assert_eq!(be16(&drvr, 14), 0x2c); // Status
        assert_eq!(be16(&drvr, 16), 0x52); // Close
        assert_eq!(&drvr[18..24], b"\x05.Sony");
        // Every entry leads with its escape word.
        assert_eq!(be16(&drvr, 0x18), 0x710c);
        assert_eq!(be16(&drvr, 0x1c), 0x710d);
        assert_eq!(be16(&drvr, 0x20), 0x710e);
        assert_eq!(be16(&drvr, 0x2c), 0x710f);
    }

    #[test]
    fn serial_driver_layout_matches_the_header() {
        let drvr = serial_driver(b"\x04.AIn\x09", 0x4d00, 0);
        assert_eq!(be16(&drvr, 8), 0x18); // Open
        assert_eq!(be16(&drvr, 10), 0x1e); // Prime
        assert_eq!(be16(&drvr, 12), 0x24); // Control
        assert_eq!(be16(&drvr, 14), 0x32); // Status
        assert_eq!(be16(&drvr, 16), 0x38); // Close
        // moveq #port,d0 then the escape.
        assert_eq!(be16(&drvr, 0x18), 0x7000);
        assert_eq!(be16(&drvr, 0x1a), 0x711b);
    }
}
