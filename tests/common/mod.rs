//! Builds a small synthetic compound file in memory: a root entry whose
//! mini-stream holds a single small "CompObj" payload, plus five empty
//! sibling streams, arranged the way a real Word 97 document's directory
//! looks (same entry names, same general shape as the fixtures the
//! original implementation's test suite reads off disk) but assembled
//! byte-by-byte so the test suite carries no binary blob.

use cfb::constants;

const SECTOR: usize = 512;

fn dir_entry(
    name: &str,
    entry_type: u8,
    color: u8,
    left: u32,
    right: u32,
    child: u32,
    sector_start: u32,
    size: u64,
) -> [u8; 128] {
    let mut buf = [0u8; 128];
    let units: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
    assert!(units.len() * 2 <= 64, "name too long for fixture");
    for (i, unit) in units.iter().enumerate() {
        buf[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    buf[64..66].copy_from_slice(&((units.len() * 2) as u16).to_le_bytes());
    buf[66] = entry_type;
    buf[67] = color;
    buf[68..72].copy_from_slice(&left.to_le_bytes());
    buf[72..76].copy_from_slice(&right.to_le_bytes());
    buf[76..80].copy_from_slice(&child.to_le_bytes());
    buf[116..120].copy_from_slice(&sector_start.to_le_bytes());
    buf[120..128].copy_from_slice(&size.to_le_bytes());
    buf
}

/// The exact byte layout the original test suite's CompObj scenario walks:
/// "Microsoft Word-Dokument" at offset 32, "MSWordDoc" at offset 60, and
/// "Document" 27 bytes before the end of a 106-byte stream.
pub fn compobj_payload() -> Vec<u8> {
    let mut buf = vec![0u8; 106];
    buf[32..55].copy_from_slice(b"Microsoft Word-Dokument");
    buf[60..69].copy_from_slice(b"MSWordDoc");
    buf[79..87].copy_from_slice(b"Document");
    buf
}

/// A 7-entry, single-FAT-sector, version 3 compound file:
///
/// ```text
/// sector 0  FAT
/// sector 1  directory entries 0-3 (Root Entry, CompObj, Ole, 1Table)
/// sector 2  directory entries 4-6 (SummaryInformation, WordDocument,
///           DocumentSummaryInformation) + one unallocated filler slot
/// sector 3  mini-FAT
/// sector 4  root's mini-stream (holds CompObj's 106-byte payload)
/// ```
///
/// Every non-root stream other than CompObj is empty; only CompObj carries
/// content, which keeps the fixture to a single mini-stream sector.
pub fn simple_doc() -> Vec<u8> {
    let mut header = vec![0u8; SECTOR];
    header[0..8].copy_from_slice(&constants::SIGNATURE.to_be_bytes());
    header[24..26].copy_from_slice(&constants::MINOR_VERSION.to_le_bytes());
    header[26..28].copy_from_slice(&constants::MAJOR_VERSION_3.to_le_bytes());
    header[28..30].copy_from_slice(&constants::BYTE_ORDER_MARK.to_le_bytes());
    header[30..32].copy_from_slice(&constants::SECTOR_SHIFT_V3.to_le_bytes());
    header[32..34].copy_from_slice(&constants::MINI_SECTOR_SHIFT.to_le_bytes());
    header[44..48].copy_from_slice(&1u32.to_le_bytes()); // fat_sectors_count
    header[48..52].copy_from_slice(&1u32.to_le_bytes()); // directory_sector_start
    header[56..60].copy_from_slice(&constants::CUTOFF_SIZE.to_le_bytes());
    header[60..64].copy_from_slice(&3u32.to_le_bytes()); // minifat_sector_start
    header[64..68].copy_from_slice(&1u32.to_le_bytes()); // minifat_sector_count
    header[68..72].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes());
    header[76..80].copy_from_slice(&0u32.to_le_bytes()); // DIFAT[0] = FAT sector 0
    for entry in header[80..512].chunks_exact_mut(4) {
        entry.copy_from_slice(&constants::NOSTREAM.to_le_bytes());
    }

    let mut fat = vec![0u8; SECTOR];
    for entry in fat.chunks_exact_mut(4) {
        entry.copy_from_slice(&constants::NOSTREAM.to_le_bytes());
    }
    fat[0..4].copy_from_slice(&constants::NOSTREAM.to_le_bytes()); // sector 0: the FAT itself
    fat[4..8].copy_from_slice(&2u32.to_le_bytes()); // sector 1 -> sector 2 (directory chain)
    fat[8..12].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes()); // sector 2 ends
    fat[12..16].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes()); // sector 3 (mini-FAT) ends
    fat[16..20].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes()); // sector 4 (root data) ends

    let mut dir1 = vec![0u8; SECTOR];
    dir1[0..128].copy_from_slice(&dir_entry(
        "Root Entry",
        constants::OBJECT_TYPE_ROOT,
        constants::COLOR_BLACK,
        constants::NOSTREAM,
        constants::NOSTREAM,
        1,
        4,
        128,
    ));
    dir1[128..256].copy_from_slice(&dir_entry(
        "\u{1}CompObj",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        3,
        5,
        constants::NOSTREAM,
        0,
        106,
    ));
    dir1[256..384].copy_from_slice(&dir_entry(
        "\u{1}Ole",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        constants::NOSTREAM,
        constants::NOSTREAM,
        constants::NOSTREAM,
        constants::ENDOFCHAIN,
        0,
    ));
    dir1[384..512].copy_from_slice(&dir_entry(
        "1Table",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        2,
        constants::NOSTREAM,
        constants::NOSTREAM,
        constants::ENDOFCHAIN,
        0,
    ));

    let mut dir2 = vec![0u8; SECTOR];
    dir2[0..128].copy_from_slice(&dir_entry(
        "\u{5}SummaryInformation",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        constants::NOSTREAM,
        6,
        constants::NOSTREAM,
        constants::ENDOFCHAIN,
        0,
    ));
    dir2[128..256].copy_from_slice(&dir_entry(
        "WordDocument",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        constants::NOSTREAM,
        4,
        constants::NOSTREAM,
        constants::ENDOFCHAIN,
        0,
    ));
    dir2[256..384].copy_from_slice(&dir_entry(
        "\u{5}DocumentSummaryInformation",
        constants::OBJECT_TYPE_STREAM,
        constants::COLOR_BLACK,
        constants::NOSTREAM,
        constants::NOSTREAM,
        constants::NOSTREAM,
        constants::ENDOFCHAIN,
        0,
    ));
    // dir2[384..512] stays zeroed: an unallocated filler record nothing ever visits.

    let mut minifat = vec![0u8; SECTOR];
    for entry in minifat.chunks_exact_mut(4) {
        entry.copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes());
    }
    minifat[0..4].copy_from_slice(&1u32.to_le_bytes()); // mini-sector 0 -> 1
    minifat[4..8].copy_from_slice(&constants::ENDOFCHAIN.to_le_bytes()); // mini-sector 1 ends

    let mut root_data = vec![0u8; SECTOR];
    let payload = compobj_payload();
    root_data[0..payload.len()].copy_from_slice(&payload);

    let mut image = Vec::with_capacity(SECTOR * 6);
    image.extend_from_slice(&header);
    image.extend_from_slice(&fat);
    image.extend_from_slice(&dir1);
    image.extend_from_slice(&dir2);
    image.extend_from_slice(&minifat);
    image.extend_from_slice(&root_data);
    image
}
