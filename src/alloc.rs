//! The sector-chain allocation engine: `next_fat` walks the DIFAT → FAT
//! indirection, `next_minifat` walks the mini-FAT (itself stored in FAT
//! sectors).

use crate::constants;
use crate::error::Result;
use crate::header::Header;
use crate::source::ByteSource;

pub(crate) fn sector_position(sector: u32, sector_shift: u16) -> u64 {
    ((sector as u64) + 1) << sector_shift
}

/// Returns the sector following `current` in its FAT chain.
pub fn next_fat(source: &dyn ByteSource, header: &Header, current: u32) -> Result<u32> {
    let sector_size_in_entries = header.sector_size / 4;
    let mut block = current / sector_size_in_entries;

    let fat_sector = if block < constants::DIFAT_ENTRIES_IN_HEADER {
        source.get_long(76 + block as u64 * 4)?
    } else {
        block -= constants::DIFAT_ENTRIES_IN_HEADER;
        let mut sector = header.difat_sector_start;

        while block >= sector_size_in_entries {
            let position = sector_position(sector, header.sector_shift);
            sector = source.get_long(position + header.sector_size as u64 - 4)?;
            block -= sector_size_in_entries - 1;
        }

        let position = sector_position(sector, header.sector_shift);
        source.get_long(position + block as u64 * 4)?
    };

    let fat_position = sector_position(fat_sector, header.sector_shift);
    source.get_long(fat_position + (current % sector_size_in_entries) as u64 * 4)
}

/// Returns the mini-sector following `current` in its mini-FAT chain, or
/// `ENDOFCHAIN` if the mini-FAT sector chain ends before reaching `current`.
///
/// The mini-FAT is itself a plain sector chain addressed through the FAT:
/// the slot for `current` lives `current / sector_size_in_entries` mini-FAT
/// sectors past `minifat_sector_start`, walked forward one `next_fat` hop at
/// a time (not `(current + 1) * sector_size_in_entries <= current`, a
/// malformed condition some reference implementations carry that can never
/// advance the walk at all).
pub fn next_minifat(source: &dyn ByteSource, header: &Header, current: u32) -> Result<u32> {
    let sector_size_in_entries = header.sector_size / 4;
    let mut sector = header.minifat_sector_start;
    let mut steps = current / sector_size_in_entries;

    while steps > 0 {
        if sector == constants::ENDOFCHAIN {
            return Ok(constants::ENDOFCHAIN);
        }
        sector = next_fat(source, header, sector)?;
        steps -= 1;
    }
    if sector == constants::ENDOFCHAIN {
        return Ok(constants::ENDOFCHAIN);
    }

    let position = sector_position(sector, header.sector_shift);
    source.get_long(position + (current % sector_size_in_entries) as u64 * 4)
}
