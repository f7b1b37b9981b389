//! Numeric constants from MS-CFB.

pub const HEADER_LENGTH: usize = 76;

pub const SIGNATURE: u64 = 0xD0CF11E0A1B11AE1;
pub const BYTE_ORDER_MARK: u16 = 0xFFFE;
pub const CUTOFF_SIZE: u32 = 0x0000_1000;
pub const MINI_SECTOR_SHIFT: u16 = 0x0006;
pub const MINOR_VERSION: u16 = 0x003E;

pub const MAJOR_VERSION_3: u16 = 3;
pub const MAJOR_VERSION_4: u16 = 4;
pub const SECTOR_SHIFT_V3: u16 = 0x0009;
pub const SECTOR_SHIFT_V4: u16 = 0x000C;

pub const MAXREGSID: u32 = 0xFFFF_FFFA;
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
pub const NOSTREAM: u32 = 0xFFFF_FFFF;

pub const DIFAT_ENTRIES_IN_HEADER: u32 = 109;
pub const DIRECTORY_ENTRY_SIZE: u64 = 128;

pub const OBJECT_TYPE_UNALLOCATED: u8 = 0x00;
pub const OBJECT_TYPE_STORAGE: u8 = 0x01;
pub const OBJECT_TYPE_STREAM: u8 = 0x02;
pub const OBJECT_TYPE_ROOT: u8 = 0x05;

pub const COLOR_RED: u8 = 0x00;
pub const COLOR_BLACK: u8 = 0x01;

/// `(t - FILETIME_EPOCH_OFFSET) / 10_000_000` seconds since 1970-01-01 is the FILETIME formula.
pub const FILETIME_EPOCH_OFFSET: i64 = 116_444_736_000_000_000;
