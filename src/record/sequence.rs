use std::fmt;

use getset::Getters;

use crate::error::{Error, Result};
use crate::record::Record;

/// A FASTA or FASTQ sequence, optionally with decoded Phred qualities.
#[derive(Debug, Clone, Eq, PartialEq, Getters)]
pub struct SequenceRecord {
    id: String,
    #[getset(get = "pub")]
    sequence: String,
    quality: Option<Vec<u8>>,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            quality: None,
        }
    }

    /// Builds a record carrying one quality score per base.
    pub fn with_quality(
        id: impl Into<String>,
        sequence: impl Into<String>,
        quality: Vec<u8>,
    ) -> Result<Self> {
        let id = id.into();
        let sequence = sequence.into();
        if sequence.len() != quality.len() {
            return Err(Error::LengthMismatch {
                id,
                sequence: sequence.len(),
                quality: quality.len(),
            });
        }
        Ok(Self {
            id,
            sequence,
            quality: Some(quality),
        })
    }

    pub fn quality(&self) -> Option<&[u8]> {
        self.quality.as_deref()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Mean Phred score, or `None` for records without qualities.
    pub fn mean_quality(&self) -> Option<f64> {
        match self.quality.as_deref() {
            Some(q) if !q.is_empty() => {
                Some(q.iter().map(|&v| f64::from(v)).sum::<f64>() / q.len() as f64)
            }
            _ => None,
        }
    }

    /// Percentage of `G` and `C` bases, 0.0 for an empty sequence.
    pub fn gc_percent(&self) -> f64 {
        if self.sequence.is_empty() {
            return 0.0;
        }
        let gc = self
            .sequence
            .bytes()
            .filter(|b| matches!(b, b'G' | b'C'))
            .count();
        gc as f64 / self.sequence.len() as f64 * 100.0
    }
}

impl Record for SequenceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SequenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bp)", self.id, self.sequence.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_quality_requires_equal_lengths() {
        let record = SequenceRecord::with_quality("r1", "ACGT", vec![30, 30, 20, 10]).unwrap();
        assert_eq!(record.quality(), Some(&[30, 30, 20, 10][..]));
        assert_eq!(record.mean_quality(), Some(22.5));

        let err = SequenceRecord::with_quality("r2", "ACGT", vec![30]).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch { ref id, sequence: 4, quality: 1 } if id == "r2"
        ));
    }

    #[test]
    fn test_gc_and_display() {
        let record = SequenceRecord::new("s1", "GGCATA");
        assert_eq!(record.id(), "s1");
        assert_eq!(record.quality(), None);
        assert_eq!(record.mean_quality(), None);
        assert!((record.gc_percent() - 50.0).abs() < 1e-9);
        assert_eq!(record.to_string(), "s1 (6 bp)");
        assert_eq!(SequenceRecord::new("e", "").gc_percent(), 0.0);
    }
}
