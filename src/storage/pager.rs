//! Page cache backed by a single file.
//!
//! The cache is a fixed-capacity slab indexed by page number, matching the
//! design note that pages should be addressed by number rather than through
//! long-lived borrowed references: callers fetch a `Ref`/`RefMut` view per
//! operation and drop it before fetching the next page. `RefCell` (not a
//! `Mutex`) backs each slot — the engine is single-threaded and synchronous
//! by contract (spec §5), so a `Mutex`'s cross-thread guarantees would be
//! spurious; `RefCell` gives the same "checked-out view" shape without
//! implying thread-safety the engine doesn't have.

use std::cell::{Ref, RefCell, RefMut};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::err;
use crate::errors::Error;
use crate::storage::page::{Page, PAGE_SIZE};

pub const TABLE_MAX_PAGES: usize = 100;

pub struct Pager {
    file: File,
    cache: heapless::Vec<Option<RefCell<Page>>, TABLE_MAX_PAGES>,
    num_pages: u32,
}

impl Pager {
    /// Opens or creates `path` read/write. The file length must be a whole
    /// multiple of `PAGE_SIZE` or the file is declared corrupt.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let file_length = file.seek(SeekFrom::End(0))?;
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(err!(
                Storage,
                "Db file is not a whole number of pages. Corrupt file."
            ));
        }
        let num_pages = (file_length / PAGE_SIZE as u64) as u32;

        let mut cache = heapless::Vec::new();
        for _ in 0..TABLE_MAX_PAGES {
            let _ = cache.push(None);
        }

        Ok(Pager {
            file,
            cache,
            num_pages,
        })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Returns the page number of the next never-before-allocated page.
    /// The caller must call `get_page` on it to materialize it.
    pub fn unused_page_num(&self) -> u32 {
        self.num_pages
    }

    /// Fetches an immutable view of `page_num`, loading it from disk on a
    /// cache miss.
    pub fn get_page(&mut self, page_num: u32) -> Result<Ref<'_, Page>, Error> {
        self.load_if_missing(page_num)?;
        Ok(self.cache[page_num as usize].as_ref().unwrap().borrow())
    }

    /// Fetches a mutable view of `page_num`, loading it from disk on a
    /// cache miss.
    pub fn get_page_mut(&mut self, page_num: u32) -> Result<RefMut<'_, Page>, Error> {
        self.load_if_missing(page_num)?;
        Ok(self.cache[page_num as usize].as_mut().unwrap().borrow_mut())
    }

    fn load_if_missing(&mut self, page_num: u32) -> Result<(), Error> {
        if page_num as usize >= TABLE_MAX_PAGES {
            return Err(err!(
                Storage,
                "Tried to fetch page number {} out of bounds ({} max pages).",
                page_num,
                TABLE_MAX_PAGES
            ));
        }

        if self.cache[page_num as usize].is_some() {
            return Ok(());
        }

        let mut page = Page::zeroed();
        if page_num < self.num_pages {
            self.file
                .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
            let mut buf = [0u8; PAGE_SIZE];
            self.file.read_exact(&mut buf)?;
            page = Page::from_bytes(buf);
        }

        self.cache[page_num as usize] = Some(RefCell::new(page));
        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }
        Ok(())
    }

    /// Writes a loaded page's buffer back to its slot in the file. Fatal if
    /// the page was never loaded.
    pub fn flush(&mut self, page_num: u32) -> Result<(), Error> {
        let slot = self.cache[page_num as usize]
            .as_ref()
            .ok_or_else(|| err!(Storage, "Tried to flush null page {}.", page_num))?;

        self.file
            .seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(slot.borrow().as_bytes())?;
        Ok(())
    }

    /// Flushes every loaded page in ascending page number order and drops
    /// the cache. The caller is responsible for dropping `self` afterwards
    /// (which closes the file).
    pub fn close(&mut self) -> Result<(), Error> {
        for page_num in 0..self.num_pages {
            if self.cache[page_num as usize].is_some() {
                self.flush(page_num)?;
            }
        }
        for slot in self.cache.iter_mut() {
            *slot = None;
        }
        self.file.flush()?;
        Ok(())
    }
}
