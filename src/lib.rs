pub mod analysis;
pub mod error;
pub(crate) mod parser;
pub mod reader;
pub mod record;
pub mod stats;
pub mod types;

pub use analysis::ReadProfile;
pub use error::{Error, Result};
pub use reader::{
    FastaReader, FastqReader, HeaderReader, Reader, SamReader, VariantFilter, VcfReader,
};
pub use record::{AlignmentRecord, Record, SequenceRecord, VariantRecord};
pub use stats::{RegionCounts, SequenceStats};
pub use types::{Region, SamHeader, VcfHeader};
