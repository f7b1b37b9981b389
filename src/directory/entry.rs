//! A single directory entry (storage, stream, or root) and the validation
//! MS-CFB demands of its 128-byte on-disk record.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use derivative::Derivative;

use crate::constants;
use crate::error::{DefectReporter, Result};
use crate::filetime::from_filetime;
use crate::guid::Guid;
use crate::header::Header;
use crate::source::ByteSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryType {
    Unallocated,
    Storage,
    Stream,
    Root,
}

impl EntryType {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            constants::OBJECT_TYPE_UNALLOCATED => Some(EntryType::Unallocated),
            constants::OBJECT_TYPE_STORAGE => Some(EntryType::Storage),
            constants::OBJECT_TYPE_STREAM => Some(EntryType::Stream),
            constants::OBJECT_TYPE_ROOT => Some(EntryType::Root),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            constants::COLOR_RED => Some(Color::Red),
            constants::COLOR_BLACK => Some(Color::Black),
            _ => None,
        }
    }
}

/// One materialised directory entry, with its own cursor state for the
/// seekable stream it exposes. Cursor fields are `Cell`s so that reads and
/// seeks can go through a shared `&Entry` the way the single-file-cursor
/// model in the allocation engine requires.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Entry {
    pub id: u32,
    pub name: String,
    pub entry_type: EntryType,
    pub color: Color,
    pub left_sibling_id: u32,
    pub right_sibling_id: u32,
    pub child_id: u32,
    pub clsid: Guid,
    pub state_bits: u32,
    pub creation_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    pub sector_start: u32,
    pub size: u64,
    pub is_mini: bool,

    #[derivative(Debug = "ignore")]
    pub(crate) position: Cell<u64>,
    #[derivative(Debug = "ignore")]
    pub(crate) sector_number: Cell<u32>,
    #[derivative(Debug = "ignore")]
    pub(crate) position_in_sector: Cell<u64>,
    #[derivative(Debug = "ignore")]
    pub(crate) source_position: Cell<u64>,
}

fn decode_name(raw: &[u8], name_length: u16, reporter: &DefectReporter) -> Result<String> {
    let len = name_length as usize;
    if len == 0 {
        return Ok(String::new());
    }
    if len > 64 || len % 2 != 0 {
        reporter.error("name_length", format!("must be even and <= 64, got {}", len))?;
        return Ok(String::new());
    }
    let units: Vec<u16> = raw[..len]
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    match String::from_utf16(&units) {
        Ok(s) => Ok(s.trim_end_matches('\0').to_string()),
        Err(_) => {
            reporter.error("name", "directory entry name is not valid UTF-16LE, maybe truncated")?;
            Ok(String::new())
        }
    }
}

impl Entry {
    /// Reads and validates the 128-byte record at `position`, seeking
    /// `source` there first.
    pub fn parse(
        id: u32,
        source: &dyn ByteSource,
        header: &Header,
        reporter: &DefectReporter,
        position: u64,
    ) -> Result<Self> {
        source.seek(position)?;
        let raw = source.read(constants::DIRECTORY_ENTRY_SIZE as usize)?;
        if raw.len() != constants::DIRECTORY_ENTRY_SIZE as usize {
            reporter.fatal("entry", "truncated directory entry record")?;
        }

        let name_length = u16::from_le_bytes(raw[64..66].try_into().unwrap());
        let name = decode_name(&raw[0..64], name_length, reporter)?;

        if name.contains(['/', '\\', ':', '!']) {
            reporter.warning(
                "name",
                "the characters '/', '\\', ':', '!' must not appear in a directory entry name",
            )?;
        }

        let raw_type = raw[66];
        let entry_type = match EntryType::from_raw(raw_type) {
            Some(EntryType::Unallocated) => {
                reporter.error("type", "cannot construct an entry for an unallocated record")?;
                EntryType::Unallocated
            }
            Some(t) => t,
            None => {
                reporter.error("type", format!("must be 0x00, 0x01, 0x02, or 0x05, got {:#04x}", raw_type))?;
                EntryType::Stream
            }
        };

        let raw_color = raw[67];
        let color = match Color::from_raw(raw_color) {
            Some(color) => color,
            None => {
                reporter.warning("color", format!("must be 0x00 or 0x01, got {:#04x}", raw_color))?;
                Color::Black
            }
        };

        let mut left_sibling_id = u32::from_le_bytes(raw[68..72].try_into().unwrap());
        if left_sibling_id > constants::MAXREGSID && left_sibling_id != constants::NOSTREAM {
            reporter.warning("left_sibling_id", "must be NOSTREAM when absent")?;
            left_sibling_id = constants::NOSTREAM;
        }
        let mut right_sibling_id = u32::from_le_bytes(raw[72..76].try_into().unwrap());
        if right_sibling_id > constants::MAXREGSID && right_sibling_id != constants::NOSTREAM {
            reporter.warning("right_sibling_id", "must be NOSTREAM when absent")?;
            right_sibling_id = constants::NOSTREAM;
        }
        let mut child_id = u32::from_le_bytes(raw[76..80].try_into().unwrap());
        if child_id > constants::MAXREGSID && child_id != constants::NOSTREAM {
            reporter.warning("child_id", "must be NOSTREAM when absent")?;
            child_id = constants::NOSTREAM;
        }

        let clsid = Guid::from_bytes(raw[80..96].try_into().unwrap());
        let state_bits = u32::from_le_bytes(raw[96..100].try_into().unwrap());
        let creation_time_raw = u64::from_le_bytes(raw[100..108].try_into().unwrap());
        let modified_time_raw = u64::from_le_bytes(raw[108..116].try_into().unwrap());
        let sector_start = u32::from_le_bytes(raw[116..120].try_into().unwrap());
        let size = u64::from_le_bytes(raw[120..128].try_into().unwrap());

        if header.major_version == constants::MAJOR_VERSION_3 && size > 0x8000_0000 {
            reporter.error(
                "size",
                "must be <= 0x80000000 for a version 3 compound file",
            )?;
        }

        let creation_time = if creation_time_raw == 0 {
            None
        } else {
            from_filetime(creation_time_raw)
        };
        let modified_time = if modified_time_raw == 0 {
            None
        } else {
            from_filetime(modified_time_raw)
        };

        let is_mini = entry_type != EntryType::Root && size < header.cutoff_size as u64;

        let source_position = source.tell()?;

        let entry = Entry {
            id,
            name,
            entry_type,
            color,
            left_sibling_id,
            right_sibling_id,
            child_id,
            clsid,
            state_bits,
            creation_time,
            modified_time,
            sector_start,
            size,
            is_mini,
            position: Cell::new(0),
            sector_number: Cell::new(sector_start),
            position_in_sector: Cell::new(0),
            source_position: Cell::new(source_position),
        };

        Ok(entry)
    }

    pub fn sector_size(&self, header: &Header) -> u32 {
        if self.is_mini {
            header.mini_sector_size
        } else {
            header.sector_size
        }
    }

    pub fn sector_shift(&self, header: &Header) -> u16 {
        if self.is_mini {
            header.mini_sector_shift
        } else {
            header.sector_shift
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemSource;

    fn record(name: &str, entry_type: u8, color: u8, left: u32, right: u32, child: u32, size: u64) -> Vec<u8> {
        let mut buf = vec![0u8; 128];
        let utf16: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        let name_len = (utf16.len() * 2) as u16;
        for (i, unit) in utf16.iter().enumerate() {
            buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        buf[64..66].copy_from_slice(&name_len.to_le_bytes());
        buf[66] = entry_type;
        buf[67] = color;
        buf[68..72].copy_from_slice(&left.to_le_bytes());
        buf[72..76].copy_from_slice(&right.to_le_bytes());
        buf[76..80].copy_from_slice(&child.to_le_bytes());
        buf[120..128].copy_from_slice(&size.to_le_bytes());
        buf
    }

    fn dummy_header() -> Header {
        let mut bytes = vec![0u8; 512];
        bytes[0..8].copy_from_slice(&constants::SIGNATURE.to_be_bytes());
        bytes[24..26].copy_from_slice(&constants::MINOR_VERSION.to_le_bytes());
        bytes[26..28].copy_from_slice(&constants::MAJOR_VERSION_3.to_le_bytes());
        bytes[28..30].copy_from_slice(&constants::BYTE_ORDER_MARK.to_le_bytes());
        bytes[30..32].copy_from_slice(&constants::SECTOR_SHIFT_V3.to_le_bytes());
        bytes[32..34].copy_from_slice(&constants::MINI_SECTOR_SHIFT.to_le_bytes());
        bytes[56..60].copy_from_slice(&constants::CUTOFF_SIZE.to_le_bytes());
        bytes[60..64].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes());
        bytes[68..72].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes());
        for entry in bytes[76..512].chunks_exact_mut(4) {
            entry.copy_from_slice(&constants::NOSTREAM.to_le_bytes());
        }
        let source = MemSource::new(bytes);
        Header::parse(&source, &DefectReporter::default()).unwrap()
    }

    #[test]
    fn parses_a_well_formed_stream_entry() {
        let bytes = record("WordDocument", constants::OBJECT_TYPE_STREAM, constants::COLOR_BLACK, constants::NOSTREAM, constants::NOSTREAM, constants::NOSTREAM, 4096);
        let source = MemSource::new(bytes);
        let header = dummy_header();
        let entry = Entry::parse(1, &source, &header, &DefectReporter::default(), 0).unwrap();
        assert_eq!(entry.name, "WordDocument");
        assert_eq!(entry.entry_type, EntryType::Stream);
        assert!(!entry.is_mini);
    }

    #[test]
    fn small_stream_is_classified_as_mini() {
        let bytes = record("\x01CompObj", constants::OBJECT_TYPE_STREAM, constants::COLOR_RED, constants::NOSTREAM, constants::NOSTREAM, constants::NOSTREAM, 100);
        let source = MemSource::new(bytes);
        let header = dummy_header();
        let entry = Entry::parse(2, &source, &header, &DefectReporter::default(), 0).unwrap();
        assert!(entry.is_mini);
    }

    #[test]
    fn illegal_sibling_id_is_normalised_to_nostream() {
        let bytes = record("x", constants::OBJECT_TYPE_STREAM, constants::COLOR_BLACK, constants::MAXREGSID + 1, constants::NOSTREAM, constants::NOSTREAM, 0);
        let source = MemSource::new(bytes);
        let header = dummy_header();
        let entry = Entry::parse(3, &source, &header, &DefectReporter::new(crate::error::Severity::Fatal), 0).unwrap();
        assert_eq!(entry.left_sibling_id, constants::NOSTREAM);
    }

    #[test]
    fn unallocated_type_is_rejected_at_default_threshold() {
        let bytes = record("x", constants::OBJECT_TYPE_UNALLOCATED, constants::COLOR_BLACK, constants::NOSTREAM, constants::NOSTREAM, constants::NOSTREAM, 0);
        let source = MemSource::new(bytes);
        let header = dummy_header();
        assert!(Entry::parse(4, &source, &header, &DefectReporter::default(), 0).is_err());
    }
}
