mod alignment;
mod sequence;
mod variant;

pub use alignment::AlignmentRecord;
pub use sequence::SequenceRecord;
pub use variant::{VariantRecord, MISSING_FILTER};

/// Common surface of every parsed record.
pub trait Record {
    /// Format-defined identifier: sequence name, read name, or `chrom:pos` for variants.
    fn id(&self) -> &str;
}
