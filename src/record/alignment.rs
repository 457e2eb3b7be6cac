use std::fmt;

use getset::{CopyGetters, Getters};

use crate::parser::aligned_reference_length;
use crate::record::Record;

/// One mapped SAM alignment line.
///
/// `start` is the POS column as written (1-based); `end` is the last reference
/// position covered, inclusive, derived from the CIGAR string.
#[derive(Debug, Clone, Eq, PartialEq, Getters, CopyGetters)]
pub struct AlignmentRecord {
    id: String,
    #[getset(get = "pub")]
    chrom: String,
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get_copy = "pub")]
    end: u64,
    #[getset(get = "pub")]
    cigar: String,
    #[getset(get_copy = "pub")]
    mapq: u8,
    #[getset(get_copy = "pub")]
    flag: u16,
}

impl AlignmentRecord {
    /// Returns `None` when the end position does not fit in a `u64`.
    pub fn new(
        id: impl Into<String>,
        chrom: impl Into<String>,
        start: u64,
        cigar: impl Into<String>,
        mapq: u8,
        flag: u16,
    ) -> Option<Self> {
        let cigar = cigar.into();
        let end = match aligned_reference_length(&cigar)? {
            0 => start,
            aligned => start.checked_add(aligned - 1)?,
        };
        Some(Self {
            id: id.into(),
            chrom: chrom.into(),
            start,
            end,
            cigar,
            mapq,
            flag,
        })
    }
}

impl Record for AlignmentRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}-{} MAPQ={} FLAG={}",
            self.id, self.chrom, self.start, self.end, self.mapq, self.flag
        )
    }
}
