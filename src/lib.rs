//! A reader for the Microsoft Compound File Binary format (the "OLE
//! structured storage" container underlying legacy `.doc`/`.xls`/`.ppt`,
//! Outlook `.msg`, and Windows Installer databases).
//!
//! A compound file is a small filesystem inside a single file: a header,
//! one or more sector-chain allocation tables (FAT, DIFAT, mini-FAT), and a
//! red-black tree of directory entries whose payloads live either in full
//! sectors or, for small streams, packed into a mini-stream. This crate
//! reads that structure; it does not interpret stream contents (no OLE
//! property-set parsing, no format-specific decoders) and it never writes.
//!
//! ```no_run
//! use cfb::{Container, OpenOptions};
//!
//! let container = Container::open("document.doc", OpenOptions::default())?;
//! for entry_id in 0..container.len() as u32 {
//!     let entry = container.entry(entry_id)?;
//!     println!("{}: {:?}", entry.name(), entry.entry_type());
//! }
//! # Ok::<(), cfb::Error>(())
//! ```

pub mod alloc;
pub mod constants;
pub mod container;
pub mod directory;
pub mod error;
pub mod filetime;
pub mod guid;
pub mod header;
pub mod source;

pub use container::{Container, EntryHandle, OpenOptions, Whence};
pub use directory::{Color, Entry, EntryType};
pub use error::{Defect, DefectReporter, Error, LookupKind, Result, Severity};
pub use guid::{Guid, CLSID_NULL};
pub use header::Header;
pub use source::{ByteSource, FileSource, MemSource};
