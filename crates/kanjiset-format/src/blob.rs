use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use kanjiset_core::error::{Error, RangeError};

/// Append-only writer over `images.bin`.
///
/// Payloads are concatenated with no header or delimiter; the returned
/// `(seek_start, seek_end)` pair is the only way to find a payload again.
pub struct BlobWriter {
    out: BufWriter<File>,
    len: u64,
}

impl BlobWriter {
    /// Create (or truncate) a blob at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::create(path.as_ref())?;
        Ok(Self {
            out: BufWriter::new(f),
            len: 0,
        })
    }

    /// Open an existing blob for appending; writes start at its current length.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, Error> {
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        let len = f.metadata()?.len();
        Ok(Self {
            out: BufWriter::new(f),
            len,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, payload: &[u8]) -> Result<(u64, u64), Error> {
        let start = self.len;
        self.out.write_all(payload)?;
        self.len = start + payload.len() as u64;
        Ok((start, self.len))
    }

    /// Flush buffered bytes and fsync. Returns the final blob length.
    pub fn finish(self) -> Result<u64, Error> {
        let f = self
            .out
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?;
        f.sync_all()?;
        Ok(self.len)
    }
}

/// Random-access reader over `images.bin`.
pub struct BlobReader {
    file: File,
    len: u64,
    pos: Option<u64>,
    seeks: u64,
}

impl BlobReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = File::open(path.as_ref())?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            pos: None,
            seeks: 0,
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of seeks issued so far.
    pub fn seeks(&self) -> u64 {
        self.seeks
    }

    pub fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<u8>, Error> {
        RangeError::check(start, end, self.len)?;
        if self.pos != Some(start) {
            self.file.seek(SeekFrom::Start(start))?;
            self.seeks += 1;
        }
        let mut buf = vec![0u8; (end - start) as usize];
        if let Err(e) = self.file.read_exact(&mut buf) {
            self.pos = None;
            return Err(e.into());
        }
        self.pos = Some(end);
        Ok(buf)
    }

    /// Read every item's range in ascending `seek_start` order.
    ///
    /// The result is in read order, not input order; each payload is paired
    /// with the item it was read for.
    pub fn read_batch<T, F>(&mut self, items: Vec<T>, range_of: F) -> Result<Vec<(T, Vec<u8>)>, Error>
    where
        F: Fn(&T) -> (u64, u64),
    {
        let mut items = items;
        items.sort_by_key(|item| range_of(item).0);
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let (start, end) = range_of(&item);
            let bytes = self.read_range(start, end)?;
            out.push((item, bytes));
        }
        Ok(out)
    }
}
