//! The directory: a cache of materialised [`Entry`] records indexed both by
//! id and by name, backed by the on-disk red-black tree.

pub mod entry;

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::alloc::{next_fat, sector_position};
use crate::constants;
use crate::error::{DefectReporter, Error, Result};
use crate::header::Header;
use crate::source::ByteSource;

pub use entry::{Color, Entry, EntryType};

/// Orders two directory-entry names the way the on-disk red-black tree is
/// built: shorter UTF-16 encodings sort first, then code-point-wise
/// lexicographic for names of equal length.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let a_len = a.encode_utf16().count();
    let b_len = b.encode_utf16().count();
    a_len.cmp(&b_len).then_with(|| a.chars().cmp(b.chars()))
}

/// Cache of materialised directory entries, indexed by id and by name.
/// Entries are never evicted: once constructed they live for the lifetime
/// of the container, matching the format's "parse once, cache forever"
/// lifecycle.
#[derive(Default)]
pub struct Directory {
    by_id: RefCell<HashMap<u32, Rc<Entry>>>,
    by_name: RefCell<HashMap<String, u32>>,
}

impl Directory {
    /// Materialises the root entry (id 0) and returns the directory wrapping it.
    pub fn new(source: &dyn ByteSource, header: &Header, reporter: &DefectReporter) -> Result<Self> {
        let directory = Directory {
            by_id: RefCell::new(HashMap::new()),
            by_name: RefCell::new(HashMap::new()),
        };
        directory.get(0, source, header, reporter)?;
        Ok(directory)
    }

    /// Returns the materialised entry for `id`, walking the directory
    /// sector chain and constructing it on first access. Any defect raised
    /// while constructing the record (truncated entry, unallocated type,
    /// past end of file) is reported as "no such id" rather than
    /// propagated, so a corrupted record doesn't abort the whole container.
    pub fn get(
        &self,
        id: u32,
        source: &dyn ByteSource,
        header: &Header,
        reporter: &DefectReporter,
    ) -> Result<Rc<Entry>> {
        if let Some(entry) = self.by_id.borrow().get(&id) {
            return Ok(entry.clone());
        }

        let entries_per_sector = header.sector_size / constants::DIRECTORY_ENTRY_SIZE as u32;
        let mut sector = header.directory_sector_start;
        let mut current = 0u32;
        while (current + 1) * entries_per_sector <= id {
            if sector == constants::ENDOFCHAIN {
                return Err(Error::not_found_id(id));
            }
            sector = next_fat(source, header, sector)?;
            current += 1;
        }
        if sector == constants::ENDOFCHAIN {
            return Err(Error::not_found_id(id));
        }

        let position = sector_position(sector, header.sector_shift)
            + (id - current * entries_per_sector) as u64 * constants::DIRECTORY_ENTRY_SIZE;

        let entry = Entry::parse(id, source, header, reporter, position).map_err(|err| {
            log::trace!(
                target: "cfb::directory",
                "entry {} failed to construct and is treated as absent: {}",
                id, err
            );
            Error::not_found_id(id)
        })?;
        let entry = Rc::new(entry);

        self.by_id.borrow_mut().insert(id, entry.clone());
        self.by_name.borrow_mut().insert(entry.name.clone(), id);

        Ok(entry)
    }

    /// Resolves a name via the cache, falling back to a walk of the on-disk
    /// red-black tree rooted at the root entry's child.
    pub fn by_name(
        &self,
        name: &str,
        source: &dyn ByteSource,
        header: &Header,
        reporter: &DefectReporter,
    ) -> Result<Rc<Entry>> {
        if let Some(&id) = self.by_name.borrow().get(name) {
            return self.get(id, source, header, reporter);
        }

        let root = self.get(0, source, header, reporter)?;
        if root.name == name {
            return Ok(root);
        }

        let mut current_id = root.child_id;
        while current_id != constants::NOSTREAM {
            let current = self.get(current_id, source, header, reporter)?;
            current_id = match compare_names(&current.name, name) {
                Ordering::Less => current.right_sibling_id,
                Ordering::Greater => current.left_sibling_id,
                Ordering::Equal => return Ok(current),
            };
        }

        Err(Error::not_found_name(name))
    }

    /// Depth-first materialises every entry reachable from the root: walks
    /// the sibling tree and, for each storage entry visited, recurses into
    /// its own child tree too.
    pub fn read_all(
        &self,
        source: &dyn ByteSource,
        header: &Header,
        reporter: &DefectReporter,
    ) -> Result<()> {
        let root = self.get(0, source, header, reporter)?;
        let mut stack = vec![root.child_id];

        while let Some(id) = stack.pop() {
            if id == constants::NOSTREAM {
                continue;
            }
            let entry = match self.get(id, source, header, reporter) {
                Ok(entry) => entry,
                // A corrupted record stops that branch of the walk, not the
                // whole container: the same policy `by_name` relies on.
                Err(Error::NotFound { .. }) => continue,
                Err(err) => return Err(err),
            };
            stack.push(entry.right_sibling_id);
            stack.push(entry.left_sibling_id);
            if entry.entry_type == EntryType::Storage {
                stack.push(entry.child_id);
            }
        }

        Ok(())
    }

    /// Number of entries materialised so far (all of them, after [`Directory::read_all`]).
    pub fn len(&self) -> usize {
        self.by_id.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
