use std::fmt;

use getset::{CopyGetters, Getters};
use indexmap::IndexMap;

use crate::record::Record;

/// Filter value used when a line has no FILTER column.
pub const MISSING_FILTER: &str = ".";

/// One VCF data line. The identifier is `chrom:pos`, not the ID column.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct VariantRecord {
    id: String,
    #[getset(get = "pub")]
    chrom: String,
    #[getset(get_copy = "pub")]
    pos: u64,
    #[getset(get = "pub")]
    ref_allele: String,
    #[getset(get = "pub")]
    alt_allele: String,
    #[getset(get_copy = "pub")]
    qual: Option<f64>,
    #[getset(get = "pub")]
    filter: String,
    #[getset(get = "pub")]
    info: IndexMap<String, String>,
}

impl VariantRecord {
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        ref_allele: impl Into<String>,
        alt_allele: impl Into<String>,
        info: IndexMap<String, String>,
    ) -> Self {
        let chrom = chrom.into();
        Self {
            id: format!("{chrom}:{pos}"),
            chrom,
            pos,
            ref_allele: ref_allele.into(),
            alt_allele: alt_allele.into(),
            qual: None,
            filter: MISSING_FILTER.to_owned(),
            info,
        }
    }

    pub fn with_qual(mut self, qual: Option<f64>) -> Self {
        self.qual = qual;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

impl Record for VariantRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom, self.pos, self.ref_allele, self.alt_allele
        )
    }
}
