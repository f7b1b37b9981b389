//! The container facade: opens a byte source, builds the header and
//! directory, and hands out [`EntryHandle`]s bound to this container's
//! shared cursor.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::alloc::{next_fat, next_minifat};
use crate::constants;
use crate::directory::{Directory, Entry, EntryType};
use crate::error::{DefectReporter, Result, Severity};
use crate::guid::Guid;
use crate::header::Header;
use crate::source::{ByteSource, FileSource, MemSource};

/// Where a `seek` offset is measured from, mirroring `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// Builder-style options for opening a container: how strict to be about
/// structural defects, and whether to materialise the whole directory
/// up front.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    minimum_defect: Severity,
    lazy: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            minimum_defect: Severity::Error,
            lazy: false,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum_defect(mut self, severity: Severity) -> Self {
        self.minimum_defect = severity;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }
}

pub struct Container {
    source: Box<dyn ByteSource>,
    header: Header,
    reporter: DefectReporter,
    directory: Directory,
    path: Option<PathBuf>,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("path", &self.path)
            .field("header", &self.header)
            .finish()
    }
}

impl Container {
    pub fn open<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Self::from_source(Box::new(FileSource::new(file)), options, Some(path))
    }

    pub fn open_file(file: File, options: OpenOptions) -> Result<Self> {
        Self::from_source(Box::new(FileSource::new(file)), options, None)
    }

    /// Opens an in-memory image, as used by the test suite.
    pub fn from_bytes(bytes: Vec<u8>, options: OpenOptions) -> Result<Self> {
        Self::from_source(Box::new(MemSource::new(bytes)), options, None)
    }

    fn from_source(
        source: Box<dyn ByteSource>,
        options: OpenOptions,
        path: Option<PathBuf>,
    ) -> Result<Self> {
        let reporter = DefectReporter::new(options.minimum_defect);
        source.seek(0)?;
        let header = Header::parse(source.as_ref(), &reporter)?;
        let directory = Directory::new(source.as_ref(), &header, &reporter)?;
        if !options.lazy {
            directory.read_all(source.as_ref(), &header, &reporter)?;
        }

        log::info!(
            target: "cfb::container",
            "opened {}: version {}.{:#06x}, sector_size {}{}",
            path.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string()),
            header.major_version,
            header.minor_version,
            header.sector_size,
            if options.lazy {
                String::new()
            } else {
                format!(", {} entries", directory.len())
            }
        );

        Ok(Container {
            source,
            header,
            reporter,
            directory,
            path,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of directory entries materialised so far (every entry, once
    /// opened eagerly).
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn root(&self) -> Result<EntryHandle<'_>> {
        self.entry(0)
    }

    pub fn entry(&self, id: u32) -> Result<EntryHandle<'_>> {
        let entry = self
            .directory
            .get(id, self.source.as_ref(), &self.header, &self.reporter)?;
        Ok(EntryHandle {
            container: self,
            entry,
        })
    }

    pub fn entry_by_name(&self, name: &str) -> Result<EntryHandle<'_>> {
        let entry = self
            .directory
            .by_name(name, self.source.as_ref(), &self.header, &self.reporter)?;
        Ok(EntryHandle {
            container: self,
            entry,
        })
    }

    fn next_sector_for(&self, entry: &Entry, current: u32) -> Result<u32> {
        if entry.is_mini {
            next_minifat(self.source.as_ref(), &self.header, current)
        } else {
            next_fat(self.source.as_ref(), &self.header, current)
        }
    }

    fn physical_offset(&self, entry: &Entry, sector: u32, position_in_sector: u64) -> u64 {
        let shift = entry.sector_shift(&self.header);
        let base = if entry.is_mini {
            (sector as u64) << shift
        } else {
            ((sector as u64) + 1) << shift
        };
        base + position_in_sector
    }

    pub(crate) fn entry_tell(&self, id: u32) -> Result<u64> {
        let entry = self
            .directory
            .get(id, self.source.as_ref(), &self.header, &self.reporter)?;
        Ok(entry.position.get())
    }

    pub(crate) fn entry_seek(&self, id: u32, offset: i64, whence: Whence) -> Result<u64> {
        let entry = self
            .directory
            .get(id, self.source.as_ref(), &self.header, &self.reporter)?;

        let target = match whence {
            Whence::Set => offset,
            Whence::Cur => entry.position.get() as i64 + offset,
            Whence::End => entry.size as i64 - offset,
        }
        .max(0) as u64;

        let sector_size = entry.sector_size(&self.header) as u64;

        entry.position.set(target);
        entry.sector_number.set(entry.sector_start);

        let mut current_block = 0u64;
        while entry.sector_number.get() != constants::ENDOFCHAIN
            && (current_block + 1) * sector_size < target
        {
            let next = self.next_sector_for(&entry, entry.sector_number.get())?;
            entry.sector_number.set(next);
            current_block += 1;
        }

        let position_in_sector = target - current_block * sector_size;
        entry.position_in_sector.set(position_in_sector);

        // A sector number of ENDOFCHAIN means the chain ran out (an empty
        // stream, or a seek past its last sector): there is no physical
        // location to resolve, and the shared cursor should be left alone
        // rather than parked at a meaningless offset.
        if entry.sector_number.get() != constants::ENDOFCHAIN {
            let phys = self.physical_offset(&entry, entry.sector_number.get(), position_in_sector);
            if entry.is_mini {
                self.entry_seek(0, phys as i64, Whence::Set)?;
                entry.source_position.set(self.entry_tell(0)?);
            } else {
                self.source.seek(phys)?;
                entry.source_position.set(self.source.tell()?);
            }
        }

        Ok(target)
    }

    pub(crate) fn entry_read(&self, id: u32, n: usize) -> Result<Vec<u8>> {
        let entry = self
            .directory
            .get(id, self.source.as_ref(), &self.header, &self.reporter)?;

        let remaining_in_entry = entry.size.saturating_sub(entry.position.get());
        let want = (n as u64).min(remaining_in_entry);
        let sector_size = entry.sector_size(&self.header) as u64;

        if want > 0 {
            if entry.is_mini {
                // The root entry's cursor is shared by every mini-stream entry;
                // another entry may have moved it since this entry's last read,
                // so re-seek to where this entry itself left off.
                self.entry_seek(0, entry.source_position.get() as i64, Whence::Set)?;
            } else {
                self.source.seek(entry.source_position.get())?;
            }
        }

        let mut data = Vec::with_capacity(want as usize);
        while (data.len() as u64) < want {
            if entry.position.get() > entry.size {
                break;
            }
            if entry.sector_number.get() == constants::ENDOFCHAIN {
                break;
            }

            let to_read = want - data.len() as u64;
            let to_end = sector_size - entry.position_in_sector.get();
            let to_do = to_read.min(to_end);

            let chunk = if entry.is_mini {
                self.entry_read(0, to_do as usize)?
            } else {
                self.source.read(to_do as usize)?
            };
            let got = chunk.len() as u64;
            data.extend_from_slice(&chunk);
            entry.position.set(entry.position.get() + got);

            if entry.is_mini {
                entry.source_position.set(self.entry_tell(0)?);
            } else {
                entry.source_position.set(self.source.tell()?);
            }

            if got < to_do {
                break;
            }

            if to_read >= to_end {
                entry.position_in_sector.set(0);
                let next = self.next_sector_for(&entry, entry.sector_number.get())?;
                entry.sector_number.set(next);
                if next != constants::ENDOFCHAIN {
                    let phys = self.physical_offset(&entry, next, 0);
                    if entry.is_mini {
                        self.entry_seek(0, phys as i64, Whence::Set)?;
                    } else {
                        self.source.seek(phys)?;
                    }
                }
            } else {
                entry.position_in_sector.set(entry.position_in_sector.get() + to_do);
            }
        }

        Ok(data)
    }
}

/// A lightweight, borrowed handle to a materialised directory entry. Kept
/// separate from `Entry` itself so entries never need a back-reference to
/// their owning container.
#[derive(Clone)]
pub struct EntryHandle<'a> {
    container: &'a Container,
    entry: Rc<Entry>,
}

impl<'a> EntryHandle<'a> {
    pub fn id(&self) -> u32 {
        self.entry.id
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry.entry_type
    }

    pub fn clsid(&self) -> Guid {
        self.entry.clsid
    }

    pub fn state_bits(&self) -> u32 {
        self.entry.state_bits
    }

    pub fn size(&self) -> u64 {
        self.entry.size
    }

    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.entry.creation_time
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.entry.modified_time
    }

    pub fn left(&self) -> Result<Option<EntryHandle<'a>>> {
        if self.entry.left_sibling_id == constants::NOSTREAM {
            Ok(None)
        } else {
            Ok(Some(self.container.entry(self.entry.left_sibling_id)?))
        }
    }

    pub fn right(&self) -> Result<Option<EntryHandle<'a>>> {
        if self.entry.right_sibling_id == constants::NOSTREAM {
            Ok(None)
        } else {
            Ok(Some(self.container.entry(self.entry.right_sibling_id)?))
        }
    }

    pub fn child(&self) -> Result<Option<EntryHandle<'a>>> {
        if self.entry.child_id == constants::NOSTREAM {
            Ok(None)
        } else {
            Ok(Some(self.container.entry(self.entry.child_id)?))
        }
    }

    pub fn read(&self, n: usize) -> Result<Vec<u8>> {
        self.container.entry_read(self.entry.id, n)
    }

    pub fn seek(&self, offset: i64, whence: Whence) -> Result<u64> {
        self.container.entry_seek(self.entry.id, offset, whence)
    }

    pub fn tell(&self) -> Result<u64> {
        self.container.entry_tell(self.entry.id)
    }
}

impl<'a> fmt::Debug for EntryHandle<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryHandle")
            .field("id", &self.entry.id)
            .field("name", &self.entry.name)
            .field("type", &self.entry.entry_type)
            .finish()
    }
}
