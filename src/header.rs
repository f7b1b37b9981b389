//! The 76-byte CFB header: signature, geometry, and the allocation-chain
//! entry points, plus the first 109 DIFAT entries that live inside it.
//!
//! https://winprotocoldoc.blob.core.windows.net/productionwindowsarchives/MS-CFB/%5bMS-CFB%5d.pdf

use derivative::Derivative;

use crate::constants;
use crate::error::{DefectReporter, Result};
use crate::guid::Guid;
use crate::source::ByteSource;

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Header {
    pub major_version: u16,
    pub minor_version: u16,
    pub clsid: Guid,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub sector_size: u32,
    pub mini_sector_size: u32,
    pub directory_sector_count: u32,
    pub fat_sectors_count: u32,
    pub directory_sector_start: u32,
    pub cutoff_size: u32,
    pub minifat_sector_start: u32,
    pub minifat_sector_count: u32,
    pub difat_sector_start: u32,
    pub difat_sector_count: u32,
    /// The first 109 FAT sector locations, read straight out of the header.
    #[derivative(Debug = "ignore")]
    pub difat_head: Vec<u32>,
}

impl Header {
    /// Reads and validates the 76-byte header from `source`, reporting every
    /// deviation from MS-CFB through `reporter` at the severity the field
    /// calls for. A `Fatal` defect always aborts; anything milder is either
    /// raised or merely logged depending on `reporter`'s threshold.
    pub fn parse(source: &dyn ByteSource, reporter: &DefectReporter) -> Result<Self> {
        let raw = source.read(constants::HEADER_LENGTH)?;
        if raw.len() != constants::HEADER_LENGTH {
            reporter.fatal(
                "header",
                format!(
                    "truncated header: expected {} bytes, got {}",
                    constants::HEADER_LENGTH,
                    raw.len()
                ),
            )?;
        }

        let signature = u64::from_be_bytes(raw[0..8].try_into().unwrap());
        if signature != constants::SIGNATURE {
            reporter.fatal(
                "signature",
                format!("bad magic: {:#018x}", signature),
            )?;
        }

        let clsid = Guid::from_bytes(raw[8..24].try_into().unwrap());
        if !clsid.is_null() {
            reporter.error("clsid", "reserved class id must be all zeroes (CLSID_NULL)")?;
        }

        let minor_version = u16::from_le_bytes(raw[24..26].try_into().unwrap());
        let major_version = u16::from_le_bytes(raw[26..28].try_into().unwrap());
        let byte_order_mark = u16::from_le_bytes(raw[28..30].try_into().unwrap());
        let sector_shift = u16::from_le_bytes(raw[30..32].try_into().unwrap());
        let mini_sector_shift = u16::from_le_bytes(raw[32..34].try_into().unwrap());

        if major_version != constants::MAJOR_VERSION_3 && major_version != constants::MAJOR_VERSION_4 {
            reporter.error(
                "major_version",
                format!("must be 3 or 4, got {}", major_version),
            )?;
        }
        if minor_version != constants::MINOR_VERSION {
            reporter.warning(
                "minor_version",
                format!("should be {:#06x}, got {:#06x}", constants::MINOR_VERSION, minor_version),
            )?;
        }
        if byte_order_mark != constants::BYTE_ORDER_MARK {
            reporter.fatal(
                "byte_order_mark",
                format!("must be {:#06x}, got {:#06x}", constants::BYTE_ORDER_MARK, byte_order_mark),
            )?;
        }
        if sector_shift != constants::SECTOR_SHIFT_V3 && sector_shift != constants::SECTOR_SHIFT_V4 {
            reporter.error(
                "sector_shift",
                format!("must be 0x0009 or 0x000c, got {:#06x}", sector_shift),
            )?;
        }
        if sector_shift == constants::SECTOR_SHIFT_V3 && major_version != constants::MAJOR_VERSION_3 {
            reporter.error("sector_shift", "0x0009 requires major version 3")?;
        }
        if sector_shift == constants::SECTOR_SHIFT_V4 && major_version != constants::MAJOR_VERSION_4 {
            reporter.error("sector_shift", "0x000c requires major version 4")?;
        }
        if mini_sector_shift != constants::MINI_SECTOR_SHIFT {
            reporter.error(
                "mini_sector_shift",
                format!("must be 0x0006, got {:#06x}", mini_sector_shift),
            )?;
        }

        if raw[34..40] != [0u8; 6] {
            reporter.error("reserved", "reserved field must be all zeroes")?;
        }

        let directory_sector_count = u32::from_le_bytes(raw[40..44].try_into().unwrap());
        let fat_sectors_count = u32::from_le_bytes(raw[44..48].try_into().unwrap());
        let directory_sector_start = u32::from_le_bytes(raw[48..52].try_into().unwrap());
        // transaction_signature_number, raw[52..56]: unused, not validated.
        let cutoff_size = u32::from_le_bytes(raw[56..60].try_into().unwrap());
        let minifat_sector_start = u32::from_le_bytes(raw[60..64].try_into().unwrap());
        let minifat_sector_count = u32::from_le_bytes(raw[64..68].try_into().unwrap());
        let difat_sector_start = u32::from_le_bytes(raw[68..72].try_into().unwrap());
        let difat_sector_count = u32::from_le_bytes(raw[72..76].try_into().unwrap());

        if major_version == constants::MAJOR_VERSION_3 && directory_sector_count != 0 {
            reporter.error(
                "directory_sector_count",
                "must be zero when major version is 3",
            )?;
        }
        if cutoff_size != constants::CUTOFF_SIZE {
            reporter.error(
                "cutoff_size",
                format!("must be {:#06x}, got {:#06x}", constants::CUTOFF_SIZE, cutoff_size),
            )?;
        }

        let sector_shift = if sector_shift == constants::SECTOR_SHIFT_V4 {
            constants::SECTOR_SHIFT_V4
        } else {
            constants::SECTOR_SHIFT_V3
        };
        let sector_size = 1u32 << sector_shift;
        let mini_sector_size = 1u32 << constants::MINI_SECTOR_SHIFT;

        let difat_head = raw[76..constants::HEADER_LENGTH]
            .chunks_exact(4)
            .map(|quad| u32::from_le_bytes(quad.try_into().unwrap()))
            .collect::<Vec<_>>();

        log::debug!(
            target: "cfb::header",
            "parsed header: version {}.{:#06x}, sector_size {}, mini_sector_size {}",
            major_version, minor_version, sector_size, mini_sector_size
        );

        Ok(Header {
            major_version,
            minor_version,
            clsid,
            sector_shift,
            mini_sector_shift,
            sector_size,
            mini_sector_size,
            directory_sector_count,
            fat_sectors_count,
            directory_sector_start,
            cutoff_size,
            minifat_sector_start,
            minifat_sector_count,
            difat_sector_start,
            difat_sector_count,
            difat_head,
        })
    }
}
