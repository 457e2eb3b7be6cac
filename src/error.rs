//! Error types shared by all readers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The file is missing or cannot be read.
    #[error("cannot access '{}': {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file '{}' is empty", .path.display())]
    EmptyResource { path: PathBuf },

    #[error("reader for '{}' is closed", .path.display())]
    Closed { path: PathBuf },

    /// Any failure while parsing the header block of a header-bearing format.
    #[error("failed to parse header of '{}': {source}", .path.display())]
    HeaderParse {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("VCF header has no '#CHROM' column header line")]
    MissingColumnHeader,

    #[error("invalid sequence for record '{id}': unexpected character {found:?}")]
    InvalidSequence { id: String, found: char },

    #[error("invalid FASTQ record: expected '{expected}', got {line:?}")]
    MissingMarker { expected: char, line: String },

    #[error("sequence and quality length mismatch for '{id}' ({sequence} vs {quality})")]
    LengthMismatch {
        id: String,
        sequence: usize,
        quality: usize,
    },

    #[error("empty sequence for '{id}'")]
    EmptySequence { id: String },

    #[error("invalid quality character {found:?} for '{id}'")]
    InvalidQuality { id: String, found: char },

    #[error("invalid region: start ({start}) must be <= end ({end})")]
    InvalidRange { start: u64, end: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Compression(#[from] niffler::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse_names_path_and_cause() {
        let error = Error::HeaderParse {
            path: PathBuf::from("calls.vcf"),
            source: Box::new(Error::MissingColumnHeader),
        };
        let msg = format!("{error}");
        assert!(msg.contains("calls.vcf"));
        assert!(msg.contains("#CHROM"));
    }

    #[test]
    fn test_invalid_range() {
        let msg = format!("{}", Error::InvalidRange { start: 20, end: 10 });
        assert!(msg.contains("start (20) must be <= end (10)"));
    }

    #[test]
    fn test_invalid_sequence_names_record() {
        let error = Error::InvalidSequence {
            id: "seq7".to_string(),
            found: 'Z',
        };
        let msg = format!("{error}");
        assert!(msg.contains("seq7"));
        assert!(msg.contains("'Z'"));
    }
}
