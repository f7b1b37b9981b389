//! The byte-source abstraction: a thin, interior-mutable wrapper over a seekable
//! file that every other component reads through.
//!
//! A single [`FileSource`] is shared by the header, the allocation engine, the
//! directory, and every full-sector entry (see the concurrency model: there is
//! exactly one underlying file cursor). It is wrapped in a `RefCell` so that
//! many read-only holders (entries, the directory) can each drive the shared
//! cursor through `&self` methods, matching the single-threaded, single-cursor
//! model the format intrinsically has.

use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::error::Result;

fn expect_len(bytes: &[u8], len: usize) -> Result<()> {
    if bytes.len() < len {
        Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into())
    } else {
        Ok(())
    }
}

/// Capability set shared by anything the engine can read fixed-size
/// little-endian integers and raw byte ranges out of.
pub trait ByteSource {
    fn seek(&self, offset: u64) -> Result<u64>;
    fn read(&self, len: usize) -> Result<Vec<u8>>;
    fn tell(&self) -> Result<u64>;

    fn get_byte(&self, offset: u64) -> Result<u8> {
        self.seek(offset)?;
        let bytes = self.read(1)?;
        expect_len(&bytes, 1)?;
        Ok(bytes[0])
    }

    fn get_short(&self, offset: u64) -> Result<u16> {
        self.seek(offset)?;
        let bytes = self.read(2)?;
        expect_len(&bytes, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn get_long(&self, offset: u64) -> Result<u32> {
        self.seek(offset)?;
        let bytes = self.read(4)?;
        expect_len(&bytes, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// The real on-disk byte source, backed by a standard file handle.
pub struct FileSource {
    file: RefCell<File>,
}

impl FileSource {
    pub fn new(file: File) -> Self {
        Self {
            file: RefCell::new(file),
        }
    }

    pub fn len(&self) -> Result<u64> {
        Ok(self.file.borrow().metadata()?.len())
    }
}

impl ByteSource for FileSource {
    fn seek(&self, offset: u64) -> Result<u64> {
        Ok(self.file.borrow_mut().seek(SeekFrom::Start(offset))?)
    }

    fn read(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut file = self.file.borrow_mut();
        let mut total = 0;
        while total < len {
            let read = file.read(&mut buf[total..])?;
            if read == 0 {
                break;
            }
            total += read;
        }
        buf.truncate(total);
        Ok(buf)
    }

    fn tell(&self) -> Result<u64> {
        Ok(self.file.borrow_mut().stream_position()?)
    }
}

/// An in-memory byte source, used by the test suite to build synthetic CFB
/// images without touching the filesystem.
pub struct MemSource {
    data: RefCell<std::io::Cursor<Vec<u8>>>,
}

impl MemSource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: RefCell::new(std::io::Cursor::new(data)),
        }
    }

    pub fn len(&self) -> u64 {
        self.data.borrow().get_ref().len() as u64
    }
}

impl ByteSource for MemSource {
    fn seek(&self, offset: u64) -> Result<u64> {
        Ok(self.data.borrow_mut().seek(SeekFrom::Start(offset))?)
    }

    fn read(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut cursor = self.data.borrow_mut();
        let mut total = 0;
        while total < len {
            let read = cursor.read(&mut buf[total..])?;
            if read == 0 {
                break;
            }
            total += read;
        }
        buf.truncate(total);
        Ok(buf)
    }

    fn tell(&self) -> Result<u64> {
        Ok(self.data.borrow_mut().stream_position()?)
    }
}
