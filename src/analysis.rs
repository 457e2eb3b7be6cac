//! Read-level summaries for quality control of sequencing runs.

use getset::{CopyGetters, Getters};
use itertools::process_results;

use crate::error::Result;
use crate::record::SequenceRecord;

/// Base counts observed at one read position.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BaseCounts {
    a: usize,
    c: usize,
    g: usize,
    t: usize,
    /// `N`, IUPAC codes and gaps.
    other: usize,
}

impl BaseCounts {
    fn push(&mut self, base: u8) {
        match base {
            b'A' => self.a += 1,
            b'C' => self.c += 1,
            b'G' => self.g += 1,
            b'T' => self.t += 1,
            _ => self.other += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.a + self.c + self.g + self.t + self.other
    }
}

/// Per-read and per-position measurements over a set of reads.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct ReadProfile {
    lengths: Vec<usize>,
    gc_percent: Vec<f64>,
    /// Mean Phred score of each read that carries qualities.
    mean_quality: Vec<f64>,
    bases: Vec<BaseCounts>,
    #[getset(skip)]
    quality_sums: Vec<u64>,
    #[getset(skip)]
    quality_counts: Vec<usize>,
}

impl ReadProfile {
    pub fn push(&mut self, record: &SequenceRecord) {
        self.lengths.push(record.len());
        self.gc_percent.push(record.gc_percent());

        let len = record.len();
        if self.bases.len() < len {
            self.bases.resize(len, BaseCounts::default());
        }
        for (counts, base) in self.bases.iter_mut().zip(record.sequence().bytes()) {
            counts.push(base);
        }

        if let Some(quality) = record.quality() {
            if let Some(mean) = record.mean_quality() {
                self.mean_quality.push(mean);
            }
            if self.quality_sums.len() < quality.len() {
                self.quality_sums.resize(quality.len(), 0);
                self.quality_counts.resize(quality.len(), 0);
            }
            for (i, &q) in quality.iter().enumerate() {
                self.quality_sums[i] += u64::from(q);
                self.quality_counts[i] += 1;
            }
        }
    }

    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<SequenceRecord>>,
    {
        process_results(records, |records| {
            let mut profile = Self::default();
            for record in records {
                profile.push(&record);
            }
            profile
        })
    }

    pub fn read_count(&self) -> usize {
        self.lengths.len()
    }

    /// Mean quality at each 0-based read position, over the reads long enough to reach it.
    pub fn per_position_mean_quality(&self) -> Vec<f64> {
        self.quality_sums
            .iter()
            .zip(&self.quality_counts)
            .map(|(&sum, &count)| sum as f64 / count as f64)
            .collect()
    }

    /// Mean of the per-read GC percentages, 0.0 without reads.
    pub fn mean_gc(&self) -> f64 {
        if self.gc_percent.is_empty() {
            return 0.0;
        }
        self.gc_percent.iter().sum::<f64>() / self.gc_percent.len() as f64
    }
}
