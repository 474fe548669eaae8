// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Slot declaration ROM.
//!
//! Describes a fake NuBus board with a video sResource (one entry per
//! supported color depth) and a CPU sResource, so the Slot Manager finds a
//! display without any real hardware probe.
//!
//! See Inside Macintosh: Devices, chapter 2 "Slot Manager", and Designing
//! Cards and Drivers for the Macintosh Family.

use crate::assembler;
use crate::emul_op::EmulOp;
use crate::instruction::Size;
use crate::addressing_modes::AddressingMode;

/// Hardware device ID of the fake board.
const BOARD_ID: u32 = 0x6b32; // 'k2'

/// Declaration ROM test pattern.
const TEST_PATTERN: u32 = 0x5a93_2bc7;

/// Parameters of the single emulated monitor.
pub struct SlotRomConfig {
    pub frame_base: u32,
    pub width: u16,
    pub height: u16,
    /// Indexed and direct depths to declare, in bits per pixel.
    pub depths: Vec<u8>,
    /// Slot ID byte of the video sResource.
    pub slot_id: u8,
}

impl Default for SlotRomConfig {
    fn default() -> Self {
        Self {
            frame_base: crate::memory::FRAME_BASE,
            width: 640,
            height: 480,
            depths: vec![1, 2, 4, 8, 16, 32],
            slot_id: 0x80,
        }
    }
}

/// Incremental builder over the declaration ROM image.
struct SlotRom {
    buf: Vec<u8>,
}

impl SlotRom {
    fn new() -> Self {
        Self { buf: Vec::with_capacity(4096) }
    }

    /// Current cursor, used as the target of offset entries.
    fn pos(&self) -> u32 {
        self.buf.len() as u32
    }

    /// An sResource offset entry: type byte plus a 24-bit relative offset.
    fn offs(&mut self, entry_type: u8, ptr: u32) {
        let offs = ptr.wrapping_sub(self.pos());
        self.buf.push(entry_type);
        self.buf.push((offs >> 16) as u8);
        self.buf.push((offs >> 8) as u8);
        self.buf.push(offs as u8);
    }

    /// An sResource word entry: type byte plus immediate data.
    fn rsrc(&mut self, entry_type: u8, data: u32) {
        self.buf.push(entry_type);
        self.buf.push((data >> 16) as u8);
        self.buf.push((data >> 8) as u8);
        self.buf.push(data as u8);
    }

    fn end_of_list(&mut self) {
        self.buf.extend_from_slice(&[0xff, 0, 0, 0]);
    }

    fn long(&mut self, data: u32) {
        self.buf.extend_from_slice(&data.to_be_bytes());
    }

    fn word(&mut self, data: u16) {
        self.buf.extend_from_slice(&data.to_be_bytes());
    }

    fn words(&mut self, words: &[u16]) {
        for &w in words {
            self.word(w);
        }
    }

    /// C string, padded to even length.
    fn string(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        if self.buf.len() & 1 != 0 {
            self.buf.push(0);
        }
    }

    /// Pascal string, padded to even length.
    fn pstring(&mut self, s: &str) {
        self.buf.push(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
        if self.buf.len() & 1 != 0 {
            self.buf.push(0);
        }
    }
}

/// Video mode parameter block for one depth.
fn vmode_parms(srom: &mut SlotRom, config: &SlotRomConfig, depth: u8) -> u32 {
    let ret = srom.pos();
    srom.long(50);          // Length
    srom.long(0);           // Base offset
    srom.word(config.width * depth as u16 / 8);
    srom.word(0);           // Bounds
    srom.word(0);
    srom.word(config.height);
    srom.word(config.width);
    srom.word(0);           // Version
    srom.word(0);           // Pack type
    srom.long(0);           // Pack size
    srom.long(0x0048_0000); // HRes
    srom.long(0x0048_0000); // VRes
    match depth {
        1 | 2 | 4 | 8 => {
            srom.word(0);            // Pixel type (indirect)
            srom.word(depth as u16); // Pixel size
            srom.word(1);            // CmpCount
            srom.word(depth as u16); // CmpSize
        },
        16 => {
            srom.word(16); // Pixel type (direct)
            srom.word(16);
            srom.word(3);
            srom.word(5);
        },
        _ => {
            srom.word(16);
            srom.word(32);
            srom.word(3);
            srom.word(8);
        },
    }
    srom.long(0); // Plane size
    srom.long(0); // Reserved
    ret
}

fn vmode_desc(srom: &mut SlotRom, params: u32, direct: bool) -> u32 {
    let ret = srom.pos();
    srom.offs(0x01, params);               // Video parameters
    srom.rsrc(0x03, 1);                    // Page count
    srom.rsrc(0x04, if direct { 2 } else { 0 }); // Device type
    srom.end_of_list();
    ret
}

/// The video driver: the Device Manager quartet leading with escape
/// opcodes, same body the patched .Sony carries. Entry offsets are relative
/// to the flags word and derived from the assembled body lengths.
fn video_driver(srom: &mut SlotRom) -> u32 {
    let name = ".Display_Video_Apple_Mac68k";

    let open = [assembler::emul_op(EmulOp::VideoOpen as u8), assembler::rts()].to_vec();

    let mut prime = vec![assembler::moveq(-1, 0)]; // No Prime(): paramErr
    prime.extend(assembler::bra(0x0e));            // Into IOReturn

    let mut control = vec![assembler::emul_op(EmulOp::VideoControl as u8)];
    control.extend(assembler::cmpi(Size::Word, 1, AddressingMode::Ariwd(0, 0x1a)));
    control.extend(assembler::bcc(assembler::Condition::NE, 0x04));
    control.push(assembler::rts());

    let status = vec![assembler::emul_op(EmulOp::VideoStatus as u8)];
    let io_return = assembler::io_return();
    let close = vec![assembler::moveq(-24, 0), assembler::rts()];

    // pstring padded to even, then a version word.
    let header = 18 + (name.len() + 2 & !1) as u16 + 2;
    let open_at = header;
    let prime_at = open_at + open.len() as u16 * 2;
    let control_at = prime_at + prime.len() as u16 * 2;
    let status_at = control_at + control.len() as u16 * 2;
    let close_at = status_at + (status.len() + io_return.len()) as u16 * 2;
    let length = close_at + close.len() as u16 * 2;

    let ret = srom.pos();
    srom.long(length as u32);
    srom.word(0x4c00); // Flags
    srom.word(0);
    srom.word(0);
    srom.word(0);
    srom.word(open_at);
    srom.word(prime_at);
    srom.word(control_at);
    srom.word(status_at);
    srom.word(close_at);
    srom.pstring(name);
    srom.word(1); // Driver version

    srom.words(&open);
    srom.words(&prime);
    srom.words(&control);
    srom.words(&status);
    srom.words(&io_return);
    srom.words(&close);
    ret
}

/// Builds the whole declaration ROM image.
pub fn build(config: &SlotRomConfig) -> Vec<u8> {
    let mut srom = SlotRom::new();

    // Board sResource.
    let board_type = srom.pos();
    srom.word(1); srom.word(0); srom.word(0); srom.word(0);
    let board_name = srom.pos();
    srom.string("Mac68k Slot ROM");
    let vendor_id = srom.pos();
    srom.string("mac68k");
    let rev_level = srom.pos();
    srom.string(concat!("V", env!("CARGO_PKG_VERSION")));
    let part_num = srom.pos();
    srom.string("mac68k");

    let vendor_info = srom.pos();
    srom.offs(0x01, vendor_id);
    srom.offs(0x03, rev_level);
    srom.offs(0x04, part_num);
    srom.end_of_list();

    let s_rsrc_board = srom.pos();
    srom.offs(0x01, board_type);
    srom.offs(0x02, board_name);
    srom.rsrc(0x20, BOARD_ID);
    srom.offs(0x24, vendor_info);
    srom.end_of_list();

    // Video sResource.
    let video_type = srom.pos();
    srom.word(3); srom.word(1); srom.word(1); srom.word(BOARD_ID as u16);
    let video_name = srom.pos();
    srom.string("Display_Video_Apple_Mac68k");

    let video_drvr = video_driver(&mut srom);
    let vid_drvr_dir = srom.pos();
    srom.offs(0x02, video_drvr); // sMacOS68020
    srom.end_of_list();

    let default_gamma = srom.pos();
    srom.long(38 + 0x100); // Length
    srom.word(0x2000);     // Resource ID
    srom.string("Mac HiRes Std Gamma");
    srom.word(0);      // Version
    srom.word(0);      // Type
    srom.word(0);      // FormulaSize
    srom.word(1);      // ChanCnt
    srom.word(0x0100); // DataCnt
    srom.word(8);      // ChanWidth
    for chunk in GAMMA_RAMP {
        srom.long(chunk);
    }

    let gamma_dir = srom.pos();
    srom.offs(0x80, default_gamma);
    srom.end_of_list();

    let minor_base = srom.pos();
    srom.long(config.frame_base);
    let minor_length = srom.pos();
    srom.long(0); // Frame buffer size (unspecified)

    let mut modes = Vec::new();
    for (i, &depth) in config.depths.iter().enumerate() {
        let parms = vmode_parms(&mut srom, config, depth);
        let desc = vmode_desc(&mut srom, parms, depth > 8);
        // Apple video modes are numbered from 0x80.
        modes.push((0x80 + i as u8, desc));
    }

    let s_rsrc_video = srom.pos();
    srom.offs(0x01, video_type);
    srom.offs(0x02, video_name);
    srom.offs(0x04, vid_drvr_dir);
    srom.rsrc(0x08, BOARD_ID);
    srom.offs(0x0a, minor_base);
    srom.offs(0x0b, minor_length);
    srom.offs(0x40, gamma_dir);
    srom.rsrc(0x7d, 6); // Video attributes: default to color, built-in
    for (mode, desc) in modes {
        srom.offs(mode, desc);
    }
    srom.end_of_list();

    // CPU sResource.
    let cpu_type = srom.pos();
    srom.word(10); srom.word(3); srom.word(0); srom.word(24); // CPU 68020
    let cpu_name = srom.pos();
    srom.string("CPU_68020");
    let cpu_major = srom.pos();
    srom.long(0); srom.long(0x7fff_ffff);
    let cpu_minor = srom.pos();
    srom.long(0xf080_0000); srom.long(0xf0ff_ffff);

    let s_rsrc_cpu = srom.pos();
    srom.offs(0x01, cpu_type);
    srom.offs(0x02, cpu_name);
    srom.offs(0x81, cpu_major);
    srom.offs(0x82, cpu_minor);
    srom.end_of_list();

    // sResource directory.
    let s_rsrc_dir = srom.pos();
    srom.offs(0x01, s_rsrc_board);
    srom.offs(config.slot_id, s_rsrc_video);
    srom.offs(0xf0, s_rsrc_cpu);
    srom.end_of_list();

    // Format/header block.
    srom.offs(0, s_rsrc_dir);       // sResource directory
    let length = srom.pos() + 16;
    srom.long(length);              // Length of declaration data
    srom.long(0);                   // CRC (calculated below)
    srom.word(0x0101);              // Rev. level, format
    srom.long(TEST_PATTERN);
    srom.word(0x000f);              // Byte lanes

    let mut image = srom.buf;
    let crc = checksum(&image);
    let crc_at = image.len() - 12;
    image[crc_at..crc_at + 4].copy_from_slice(&crc.to_be_bytes());
    image
}

/// Installs the declaration ROM at the top of the Mac ROM image.
pub fn install(rom: &mut [u8], config: &SlotRomConfig) {
    let image = build(config);
    let top = rom.len() - image.len();
    rom[top..].copy_from_slice(&image);
}

/// Declaration ROM CRC: rotate left one, add each byte. The CRC field
/// itself is taken as zero.
pub fn checksum(image: &[u8]) -> u32 {
    let crc_at = image.len() - 12;
    let mut crc = 0u32;
    for (i, &b) in image.iter().enumerate() {
        crc = crc.rotate_left(1);
        if !(crc_at..crc_at + 4).contains(&i) {
            crc = crc.wrapping_add(b as u32);
        }
    }
    crc
}

/// Standard Mac gamma ramp, 256 entries packed four to a long.
const GAMMA_RAMP: [u32; 64] = [
    0x0005090B, 0x0E101315, 0x17191B1D, 0x1E202224,
    0x2527282A, 0x2C2D2F30, 0x31333436, 0x37383A3B,
    0x3C3E3F40, 0x42434445, 0x4748494A, 0x4B4D4E4F,
    0x50515254, 0x55565758, 0x595A5B5C, 0x5E5F6061,
    0x62636465, 0x66676869, 0x6A6B6C6D, 0x6E6F7071,
    0x72737475, 0x76777879, 0x7A7B7C7D, 0x7E7F8081,
    0x81828384, 0x85868788, 0x898A8B8C, 0x8C8D8E8F,
    0x90919293, 0x94959596, 0x9798999A, 0x9B9B9C9D,
    0x9E9FA0A1, 0xA1A2A3A4, 0xA5A6A6A7, 0xA8A9AAAB,
    0xABACADAE, 0xAFB0B0B1, 0xB2B3B4B4, 0xB5B6B7B8,
    0xB8B9BABB, 0xBCBCBDBE, 0xBFC0C0C1, 0xC2C3C3C4,
    0xC5C6C7C7, 0xC8C9CACA, 0xCBCCCDCD, 0xCECFD0D0,
    0xD1D2D3D3, 0xD4D5D6D6, 0xD7D8D9D9, 0xDADBDCDC,
    0xDDDEDFDF, 0xE0E1E1E2, 0xE3E4E4E5, 0xE6E7E7E8,
    0xE9E9EAEB, 0xECECEDEE, 0xEEEFF0F1, 0xF1F2F3F3,
    0xF4F5F5F6, 0xF7F8F8F9, 0xFAFAFBFC, 0xFCFDFEFF,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_carries_pattern_and_crc() {
        let image = build(&SlotRomConfig::default());
        let n = image.len();
        // Byte lanes word at the very end.
        assert_eq!(&image[n - 2..], &[0x00, 0x0f]);
        // Test pattern precedes it.
        assert_eq!(&image[n - 6..n - 2], &TEST_PATTERN.to_be_bytes());
        // Recorded CRC matches a recomputation.
        let recorded = u32::from_be_bytes(image[n - 12..n - 8].try_into().unwrap());
        assert_eq!(recorded, checksum(&image));
        // Declared length covers the image.
        let length = u32::from_be_bytes(image[n - 16..n - 12].try_into().unwrap());
        assert_eq!(length as usize, n);
    }
}
