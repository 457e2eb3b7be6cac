use std::hash::Hash;

use getset::CopyGetters;
use indexmap::IndexMap;
use itertools::process_results;

use crate::error::Result;
use crate::record::SequenceRecord;

/// Record counts keyed by chromosome, in insertion order.
pub type RegionCounts = IndexMap<String, usize>;

/// Summary of a pass over FASTA or FASTQ records.
#[derive(Debug, Clone, Copy, Default, PartialEq, CopyGetters)]
pub struct SequenceStats {
    #[getset(get_copy = "pub")]
    count: usize,
    #[getset(get_copy = "pub")]
    total_length: usize,
    quality_sum: f64,
}

impl SequenceStats {
    pub fn push(&mut self, record: &SequenceRecord) {
        self.count += 1;
        self.total_length += record.len();
        self.quality_sum += record.mean_quality().unwrap_or(0.0);
    }

    /// Aggregates `records`, stopping at the first error.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<SequenceRecord>>,
    {
        process_results(records, |records| {
            let mut stats = Self::default();
            for record in records {
                stats.push(&record);
            }
            stats
        })
    }

    pub fn mean_length(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.total_length as f64 / self.count as f64
    }

    /// Mean of the per-record mean qualities; records without qualities count as 0.
    pub fn mean_quality(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.quality_sum / self.count as f64
    }
}

pub(crate) fn count_by<I, T, K, F>(records: I, key: F) -> Result<IndexMap<K, usize>>
where
    I: IntoIterator<Item = Result<T>>,
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    process_results(records, |records| {
        let mut counts = IndexMap::new();
        for record in records {
            *counts.entry(key(&record)).or_insert(0) += 1;
        }
        counts
    })
}
