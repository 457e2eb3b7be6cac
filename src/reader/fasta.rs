use std::mem;
use std::path::Path;

use crate::error::{Error, Result};
use crate::reader::{Reader, Source};
use crate::record::SequenceRecord;
use crate::stats::SequenceStats;
use crate::types::is_nucleotide;

/// Reads multi-line FASTA files.
pub struct FastaReader {
    source: Source,
}

impl FastaReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            source: Source::open(path)?,
        })
    }

    /// Count and length statistics over the whole file.
    pub fn stats(&mut self) -> Result<SequenceStats> {
        let stats = SequenceStats::from_records(self.records_snapshot()?)?;
        self.rewind()?;
        Ok(stats)
    }
}

impl Reader for FastaReader {
    type Record = SequenceRecord;
    type Records<'a> = FastaRecords<'a> where Self: 'a;

    fn path(&self) -> &Path {
        self.source.path()
    }

    fn is_open(&self) -> bool {
        self.source.is_open()
    }

    fn read(&mut self) -> Result<FastaRecords<'_>> {
        self.source.ensure_open()?;
        Ok(FastaRecords {
            source: &mut self.source,
            line: String::new(),
            id: None,
            sequence: String::new(),
            done: false,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        self.source.rewind()
    }

    fn close(&mut self) {
        self.source.close();
    }
}

/// Lazy FASTA record sequence. Stops after the first invalid record.
pub struct FastaRecords<'a> {
    source: &'a mut Source,
    line: String,
    id: Option<String>,
    sequence: String,
    done: bool,
}

impl FastaRecords<'_> {
    fn finish(&mut self, id: String) -> Result<SequenceRecord> {
        let sequence = mem::take(&mut self.sequence).to_ascii_uppercase();
        if let Some(found) = sequence.chars().find(|&c| !is_nucleotide(c)) {
            self.done = true;
            return Err(Error::InvalidSequence { id, found });
        }
        Ok(SequenceRecord::new(id, sequence))
    }
}

impl Iterator for FastaRecords<'_> {
    type Item = Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.source.read_line(&mut self.line) {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    // a trailing header without an id is dropped
                    let id = self.id.take().filter(|id| !id.is_empty())?;
                    return Some(self.finish(id));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('>') {
                if let Some(id) = self.id.replace(header.trim().to_owned()) {
                    return Some(self.finish(id));
                }
            } else if self.id.is_some() {
                self.sequence.push_str(line);
            } else {
                log::debug!(
                    "ignoring sequence line {} before the first '>' header",
                    self.source.line_number()
                );
            }
        }
    }
}
