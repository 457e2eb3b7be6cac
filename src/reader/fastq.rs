use std::path::Path;

use crate::analysis::ReadProfile;
use crate::error::{Error, Result};
use crate::parser;
use crate::reader::{Reader, Source};
use crate::record::SequenceRecord;
use crate::stats::SequenceStats;
use crate::types::PHRED_OFFSET;

/// Reads four-line FASTQ records with Phred+33 qualities.
pub struct FastqReader {
    source: Source,
}

impl FastqReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            source: Source::open(path)?,
        })
    }

    /// Count, length and mean quality statistics over the whole file.
    pub fn stats(&mut self) -> Result<SequenceStats> {
        let stats = SequenceStats::from_records(self.records_snapshot()?)?;
        self.rewind()?;
        Ok(stats)
    }

    /// Per-read and per-position summaries over the whole file.
    pub fn profile(&mut self) -> Result<ReadProfile> {
        let profile = ReadProfile::from_records(self.records_snapshot()?)?;
        self.rewind()?;
        Ok(profile)
    }
}

impl Reader for FastqReader {
    type Record = SequenceRecord;
    type Records<'a> = FastqRecords<'a> where Self: 'a;

    fn path(&self) -> &Path {
        self.source.path()
    }

    fn is_open(&self) -> bool {
        self.source.is_open()
    }

    fn read(&mut self) -> Result<FastqRecords<'_>> {
        self.source.ensure_open()?;
        Ok(FastqRecords {
            source: &mut self.source,
            lines: Default::default(),
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

/// Lazy FASTQ record sequence. Stops after the first malformed record; an
/// incomplete trailing record ends the sequence silently.
pub struct FastqRecords<'a> {
    source: &'a mut Source,
    lines: [String; 4],
    done: bool,
}

impl FastqRecords<'_> {
    fn next_record(&mut self) -> Result<Option<SequenceRecord>> {
        let [header, sequence, separator, quality] = &mut self.lines;
        if !self.source.read_line(header)? {
            return Ok(None);
        }
        for line in [&mut *sequence, &mut *separator, &mut *quality] {
            if !self.source.read_line(line)? {
                log::debug!("dropping incomplete trailing record {:?}", header);
                return Ok(None);
            }
        }

        if !header.starts_with('@') {
            return Err(Error::MissingMarker {
                expected: '@',
                line: header.trim().to_owned(),
            });
        }
        if !separator.starts_with('+') {
            return Err(Error::MissingMarker {
                expected: '+',
                line: separator.trim().to_owned(),
            });
        }
        let id = parser::fastq_id(header).to_owned();
        let sequence = sequence.to_ascii_uppercase();
        if sequence.len() != quality.len() {
            return Err(Error::LengthMismatch {
                id,
                sequence: sequence.len(),
                quality: quality.len(),
            });
        }
        if sequence.is_empty() {
            return Err(Error::EmptySequence { id });
        }
        let scores = decode_quality(&id, quality)?;
        SequenceRecord::with_quality(id, sequence, scores).map(Some)
    }
}

impl Iterator for FastqRecords<'_> {
    type Item = Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_record();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result.transpose()
    }
}

/// Decodes a Phred+33 quality string.
pub(crate) fn decode_quality(id: &str, quality: &str) -> Result<Vec<u8>> {
    quality
        .chars()
        .map(|c| {
            u8::try_from(c)
                .ok()
                .and_then(|b| b.checked_sub(PHRED_OFFSET))
                .ok_or_else(|| Error::InvalidQuality {
                    id: id.to_owned(),
                    found: c,
                })
        })
        .collect()
}
