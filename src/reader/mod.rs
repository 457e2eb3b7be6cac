//! Readers for the supported text formats.
//!
//! Every reader owns exactly one open file. The lazy record sequence returned by
//! [`Reader::read`] mutably borrows its reader, so a reader can only be driven by
//! one consumer at a time; queries that need the whole file replay it from the
//! start through [`Reader::records_snapshot`].

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::record::Record;

mod fasta;
mod fastq;
mod sam;
mod vcf;

pub use fasta::{FastaReader, FastaRecords};
pub use fastq::{FastqReader, FastqRecords};
pub use sam::{SamReader, SamRecords};
pub use vcf::{VariantFilter, VcfReader, VcfRecords};

pub trait Reader {
    type Record: Record;
    type Records<'a>: Iterator<Item = Result<Self::Record>>
    where
        Self: 'a;

    fn path(&self) -> &Path;

    fn is_open(&self) -> bool;

    /// Lazily yields records from the current position of the underlying file.
    fn read(&mut self) -> Result<Self::Records<'_>>;

    /// Repositions the underlying file to its first byte.
    fn rewind(&mut self) -> Result<()>;

    /// Releases the file. Calling it again is a no-op.
    fn close(&mut self);

    /// Rewinds, then replays every record of the file.
    fn records_snapshot(&mut self) -> Result<Self::Records<'_>> {
        self.rewind()?;
        self.read()
    }
}

/// A reader whose format starts with a header block that is parsed on open.
pub trait HeaderReader: Reader {
    type Header;

    /// Parses the header block and returns the cursor to the start of the file.
    /// Repeated calls leave the parsed header unchanged.
    fn parse_header(&mut self) -> Result<()>;

    fn header(&self) -> &Self::Header;

    /// Header entries belonging to one group, e.g. `@SQ` for SAM or `INFO` for VCF.
    fn header_group(&self, key: &str) -> Vec<&str>;
}

enum Handle {
    Plain(BufReader<File>),
    Compressed(BufReader<Box<dyn Read>>),
}

/// The file resource behind a reader. Inputs named `*.gz` are decompressed.
pub(crate) struct Source {
    path: PathBuf,
    handle: Option<Handle>,
    line_number: usize,
}

impl Source {
    pub(crate) fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let handle = Self::open_handle(&path)?;
        Ok(Self {
            path,
            handle: Some(handle),
            line_number: 0,
        })
    }

    fn open_handle(path: &Path) -> Result<Handle> {
        let unavailable = |source| Error::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        };
        let metadata = fs::metadata(path).map_err(unavailable)?;
        if metadata.is_dir() {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::Other,
                "is a directory",
            )));
        }
        if metadata.len() == 0 {
            return Err(Error::EmptyResource {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(unavailable)?;
        if is_gzip(path) {
            let (reader, format) = niffler::get_reader(Box::new(file))?;
            log::trace!("opened {} as {:?}", path.display(), format);
            Ok(Handle::Compressed(BufReader::new(reader)))
        } else {
            Ok(Handle::Plain(BufReader::new(file)))
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::Closed {
                path: self.path.clone(),
            })
        }
    }

    /// 1-based number of the line last returned by [`Source::read_line`].
    pub(crate) fn line_number(&self) -> usize {
        self.line_number
    }

    pub(crate) fn rewind(&mut self) -> Result<()> {
        self.ensure_open()?;
        // gzip streams cannot seek, so they are reopened
        let reopen = match &mut self.handle {
            Some(Handle::Plain(reader)) => {
                reader.seek(SeekFrom::Start(0))?;
                false
            }
            _ => true,
        };
        if reopen {
            self.handle = Some(Self::open_handle(&self.path)?);
        }
        self.line_number = 0;
        log::trace!("rewound {}", self.path.display());
        Ok(())
    }

    /// Reads the next line into `buf` without its line terminator.
    /// Returns `false` at end of input.
    pub(crate) fn read_line(&mut self, buf: &mut String) -> Result<bool> {
        buf.clear();
        let reader: &mut dyn BufRead = match &mut self.handle {
            Some(Handle::Plain(reader)) => reader,
            Some(Handle::Compressed(reader)) => reader,
            None => {
                return Err(Error::Closed {
                    path: self.path.clone(),
                })
            }
        };
        if reader.read_line(buf)? == 0 {
            return Ok(false);
        }
        self.line_number += 1;
        let len = buf.trim_end_matches(&['\n', '\r'][..]).len();
        buf.truncate(len);
        Ok(true)
    }

    pub(crate) fn close(&mut self) {
        if self.handle.take().is_some() {
            log::trace!("closed {}", self.path.display());
        }
        self.line_number = 0;
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}
