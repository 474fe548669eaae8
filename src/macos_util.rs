// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MacOS definitions and utility functions: LowMem globals, OS queues,
//! drive numbers and the 1904 epoch.

use crate::memory::MemoryAccess;

use chrono::NaiveDate;

/// LowMem globals this core reads or writes.
pub mod low_mem {
    /// Tick count (60.15 Hz).
    pub const TICKS: u32 = 0x16a;
    /// Date/time cache, seconds since 1904.
    pub const TIME: u32 = 0x20c;
    /// Event queue header.
    pub const EVENT_QUEUE: u32 = 0x14c;
    /// Drive queue header.
    pub const DRIVE_QUEUE: u32 = 0x308;
    /// Unit table base.
    pub const UTABLE_BASE: u32 = 0x11c;
    /// Unit table pointer handed back by the idle escape.
    pub const UNIT_TABLE: u32 = 0x2b6;
    /// Logical RAM size.
    pub const MEM_SIZE_LOGICAL: u32 = 0x1ef4;
    /// Physical RAM size.
    pub const MEM_SIZE_PHYSICAL: u32 = 0x1ef8;
    /// MacsBug flags.
    pub const MACS_BUG_FLAGS: u32 = 0xbff;
    /// ASC base pointer.
    pub const ASC_BASE: u32 = 0xcc0;
    /// Jump vector used by the vCheckLoad thunk.
    pub const CHECK_LOAD_VECTOR: u32 = 0x7f0;
}

/// OS queue header field offsets (QHdr).
pub const Q_HEAD: u32 = 2;
pub const Q_TAIL: u32 = 6;
/// Queue element link offset (QElem).
pub const Q_LINK: u32 = 0;

/// Offset of the queue element inside a DrvSts block.
pub const DS_Q_LINK: u32 = 6;
/// Offset of the drive number inside a DrvSts block.
pub const DS_Q_DRIVE: u32 = 12;

/// Device control entry offsets.
pub const DCTL_DRIVER: u32 = 0;
pub const DCTL_FLAGS: u32 = 4;
pub const DCTL_Q_HDR: u32 = 6;
/// Parameter block offsets used when opening drivers.
pub const IO_NAME_PTR: u32 = 18;

// Infallible Mac-side accessors. The Mac layer addresses fixed LowMem and
// patcher-verified structures; a miss here is a programming error upstream,
// not a guest fault, so it reads as zero and the store is dropped.

pub fn read_mac_u8<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32) -> u8 {
    mem.get_byte(addr).unwrap_or_default()
}

pub fn read_mac_u16<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32) -> u16 {
    mem.get_word(addr).unwrap_or_default()
}

pub fn read_mac_u32<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32) -> u32 {
    mem.get_long(addr).unwrap_or_default()
}

pub fn write_mac_u8<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32, value: u8) {
    let _ = mem.set_byte(addr, value);
}

pub fn write_mac_u16<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32, value: u16) {
    let _ = mem.set_word(addr, value);
}

pub fn write_mac_u32<M: MemoryAccess + ?Sized>(mem: &mut M, addr: u32, value: u32) {
    let _ = mem.set_long(addr, value);
}

/// Appends a queue element to an OS queue.
pub fn enqueue_mac<M: MemoryAccess + ?Sized>(mem: &mut M, elem: u32, list: u32) {
    write_mac_u32(mem, elem + Q_LINK, 0);
    if read_mac_u32(mem, list + Q_TAIL) == 0 {
        write_mac_u32(mem, list + Q_HEAD, elem);
        write_mac_u32(mem, list + Q_TAIL, elem);
    } else {
        let tail = read_mac_u32(mem, list + Q_TAIL);
        write_mac_u32(mem, tail + Q_LINK, elem);
        write_mac_u32(mem, list + Q_TAIL, elem);
    }
}

fn is_drive_number_free<M: MemoryAccess + ?Sized>(mem: &mut M, num: u16) -> bool {
    let mut e = read_mac_u32(mem, low_mem::DRIVE_QUEUE + Q_HEAD);
    while e != 0 {
        let d = e - DS_Q_LINK;
        if read_mac_u16(mem, d + DS_Q_DRIVE) == num {
            return false;
        }
        e = read_mac_u32(mem, e + Q_LINK);
    }
    true
}

/// Finds the first free drive number, starting at `num`.
pub fn find_free_drive_number<M: MemoryAccess + ?Sized>(mem: &mut M, mut num: u16) -> u16 {
    while !is_drive_number_free(mem, num) {
        num += 1;
    }
    num
}

/// True once the event queue header has been set up, i.e. the Mac has
/// booted far enough to service 60 Hz work.
pub fn has_mac_started<M: MemoryAccess + ?Sized>(mem: &mut M) -> bool {
    read_mac_u32(mem, low_mem::EVENT_QUEUE) != 0
}

/// Calculates a disk image file layout given the file size: data start
/// offset and usable size.
pub fn file_disk_layout(size: u64) -> (u64, u64) {
    if size == 419284 || size == 838484 {
        // 400K/800K DiskCopy image, 84 byte header.
        (84, (size - 84) & !0x1ff)
    } else {
        // 0..511 byte header.
        let start = size & 0x1ff;
        (start, size - start)
    }
}

// DebugUtil() selectors.
pub const DU_DEBUGGER_GET_MAX: u32 = 0;
pub const DU_DEBUGGER_ENTER: u32 = 1;
pub const DU_DEBUGGER_EXIT: u32 = 2;
pub const DU_DEBUGGER_POLL: u32 = 3;

/// Seconds between 1904-01-01 and 1970-01-01.
pub const MAC_EPOCH_OFFSET: u32 = 2_082_826_800;

/// Converts a local wall-clock time to MacOS time (seconds since 1.1.1904,
/// local time).
pub fn time_to_mac_time(local: chrono::NaiveDateTime) -> u32 {
    let epoch = NaiveDate::from_ymd_opt(1904, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("the Mac epoch is a valid date");
    (local - epoch).num_seconds() as u32
}

/// The current wall clock as MacOS time.
pub fn mac_time_now() -> u32 {
    time_to_mac_time(chrono::Local::now().naive_local())
}

/// Converts MacOS time to Unix time.
pub fn mac_time_to_time(t: u32) -> i64 {
    t as i64 - MAC_EPOCH_OFFSET as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_copy_layout() {
        assert_eq!(file_disk_layout(419284), (84, 409600));
        assert_eq!(file_disk_layout(838484), (84, 838400));
        // 1.44 MB raw image, no header.
        assert_eq!(file_disk_layout(1474560), (0, 1474560));
        // 42-byte junk header.
        assert_eq!(file_disk_layout(1474560 + 42), (42, 1474560));
    }

    #[test]
    fn mac_epoch() {
        let t = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap().and_hms_opt(0, 0, 1).unwrap();
        assert_eq!(time_to_mac_time(t), 1);
        let t = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(time_to_mac_time(t), 2_082_844_800);
    }

    #[test]
    fn drive_numbers_skip_queued_drives() {
        let mut mem = vec![0u8; 0x2000];
        let m = mem.as_mut_slice();

        // Two DrvSts blocks with drives 1 and 2 queued at 0x308.
        let d1 = 0x1000u32;
        let d2 = 0x1040u32;
        write_mac_u16(m, d1 + DS_Q_DRIVE, 1);
        write_mac_u16(m, d2 + DS_Q_DRIVE, 2);
        enqueue_mac(m, d1 + DS_Q_LINK, low_mem::DRIVE_QUEUE);
        enqueue_mac(m, d2 + DS_Q_LINK, low_mem::DRIVE_QUEUE);

        assert_eq!(find_free_drive_number(m, 1), 3);
        assert_eq!(find_free_drive_number(m, 5), 5);
    }
}
