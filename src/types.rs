use std::fmt;

use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use multimap::MultiMap;
use num_enum::TryFromPrimitive;
use strum::EnumString;

use crate::error::{Error, Result};
use crate::parser;

/// Characters allowed in a (upper-cased) nucleotide sequence, IUPAC ambiguity codes and gap included.
pub const NUCLEOTIDE_ALPHABET: &[u8] = b"ACGTURYKMSWBDHVN-";

/// Offset of the Phred+33 quality encoding.
pub const PHRED_OFFSET: u8 = b'!';

/// Reference name used by SAM for unmapped reads.
pub const UNMAPPED_REFERENCE: &str = "*";

/// Minimum number of mandatory columns in a SAM alignment line.
pub const SAM_MANDATORY_FIELDS: usize = 11;

/// Minimum number of columns a VCF data line needs to yield a variant.
pub const VCF_MIN_FIELDS: usize = 5;

pub fn is_nucleotide(c: char) -> bool {
    c.is_ascii() && NUCLEOTIDE_ALPHABET.contains(&(c as u8))
}

/// Why a SAM or VCF data line produced no record.
#[derive(Debug, Clone, Copy, Eq, PartialEq, strum::Display)]
pub(crate) enum SkipReason {
    #[strum(serialize = "too few fields")]
    TooFewFields,
    #[strum(serialize = "unmapped reference")]
    Unmapped,
    #[strum(serialize = "unparsable integer field")]
    InvalidInteger,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum CigarOp {
    Match = b'M',
    Insertion = b'I',
    Deletion = b'D',
    Skip = b'N',
    SoftClip = b'S',
    HardClip = b'H',
    Padding = b'P',
    SequenceMatch = b'=',
    SequenceMismatch = b'X',
}

impl CigarOp {
    pub fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match
                | CigarOp::Deletion
                | CigarOp::Skip
                | CigarOp::SequenceMatch
                | CigarOp::SequenceMismatch
        )
    }
}

/// A closed genomic interval `[start, end]` on one chromosome.
#[derive(Debug, Clone, Eq, PartialEq, Getters, CopyGetters)]
pub struct Region {
    #[getset(get = "pub")]
    chrom: String,
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get_copy = "pub")]
    end: u64,
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self {
            chrom: chrom.into(),
            start,
            end,
        })
    }

    /// Whether `[start, end]` on `chrom` shares at least one position with this region.
    pub fn overlaps(&self, chrom: &str, start: u64, end: u64) -> bool {
        self.chrom == chrom && start <= self.end && end >= self.start
    }

    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && self.start <= pos && pos <= self.end
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// SAM header lines grouped by record type tag (`@HD`, `@SQ`, `@RG`, ...).
///
/// Each entry is the rest of the line after the tag, tab-joined, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SamHeader {
    pub(crate) entries: MultiMap<String, String>,
}

impl Default for SamHeader {
    fn default() -> Self {
        Self {
            entries: MultiMap::new(),
        }
    }
}

impl SamHeader {
    pub(crate) fn push_line(&mut self, line: &str) {
        let mut parts = line.trim().split('\t');
        if let Some(tag) = parts.next() {
            let entry = parts.collect::<Vec<_>>().join("\t");
            self.entries.insert(tag.to_owned(), entry);
        }
    }

    pub fn group(&self, tag: &str) -> &[String] {
        self.entries.get_vec(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `@SQ` names mapped to their `LN` length, in header order.
    pub fn reference_sequences(&self) -> IndexMap<String, Option<u64>> {
        self.group("@SQ")
            .iter()
            .filter_map(|entry| {
                let mut name = None;
                let mut length = None;
                for field in entry.split('\t') {
                    if let Some(sn) = field.strip_prefix("SN:") {
                        name = Some(sn.to_owned());
                    } else if let Some(ln) = field.strip_prefix("LN:") {
                        length = ln.parse().ok();
                    }
                }
                name.map(|name| (name, length))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, EnumString)]
pub enum InfoType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum InfoNumber {
    Count(usize),
    Alleles,
    AlternateAlleles,
    Genotypes,
    Unknown,
}

/// Value of a `##key=value` meta-header line.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Text(String),
    Structured(IndexMap<String, String>),
}

/// A typed `##INFO` or `##FORMAT` definition.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct FieldDefinition {
    #[getset(get = "pub")]
    id: String,
    #[getset(get_copy = "pub")]
    number: InfoNumber,
    #[getset(get = "pub")]
    kind: InfoType,
    #[getset(get = "pub")]
    description: String,
}

impl FieldDefinition {
    fn from_mapping(mapping: &IndexMap<String, String>) -> Option<Self> {
        let number = parser::info_number(mapping.get("Number")?).ok()?.1;
        Some(Self {
            id: mapping.get("ID")?.clone(),
            number,
            kind: mapping.get("Type")?.parse().ok()?,
            description: mapping.get("Description").cloned().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct ContigDefinition {
    #[getset(get = "pub")]
    id: String,
    #[getset(get_copy = "pub")]
    length: Option<u64>,
}

/// VCF meta-header lines and the `#CHROM` column schema.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct VcfHeader {
    /// `##` lines, verbatim (trimmed) and in file order.
    pub(crate) meta: Vec<String>,
    /// Column names of the `#CHROM` line with the leading `#` removed.
    pub(crate) columns: Vec<String>,
}

impl VcfHeader {
    /// All meta lines starting with `##{key}=`, in file order.
    pub fn group(&self, key: &str) -> Vec<&str> {
        let prefix = format!("##{key}=");
        self.meta
            .iter()
            .filter(|line| line.starts_with(&prefix))
            .map(String::as_str)
            .collect()
    }

    /// Key/value pairs of every structured `##{key}=<...>` line.
    pub fn structured(&self, key: &str) -> Vec<IndexMap<String, String>> {
        self.group(key)
            .into_iter()
            .filter_map(|line| match parser::meta_line(line) {
                Ok((_, (_, MetaValue::Structured(mapping)))) => Some(mapping),
                _ => {
                    log::debug!("skipping unstructured header line {:?}", line);
                    None
                }
            })
            .collect()
    }

    pub fn info_definitions(&self) -> Vec<FieldDefinition> {
        self.definitions("INFO")
    }

    pub fn format_definitions(&self) -> Vec<FieldDefinition> {
        self.definitions("FORMAT")
    }

    fn definitions(&self, key: &str) -> Vec<FieldDefinition> {
        self.structured(key)
            .iter()
            .filter_map(|mapping| {
                let definition = FieldDefinition::from_mapping(mapping);
                if definition.is_none() {
                    log::debug!("skipping malformed ##{} definition {:?}", key, mapping);
                }
                definition
            })
            .collect()
    }

    pub fn contigs(&self) -> Vec<ContigDefinition> {
        self.structured("contig")
            .into_iter()
            .filter_map(|mut mapping| {
                Some(ContigDefinition {
                    id: mapping.remove("ID")?,
                    length: mapping.get("length").and_then(|l| l.parse().ok()),
                })
            })
            .collect()
    }

    /// Sample names: the columns following `FORMAT`.
    pub fn samples(&self) -> &[String] {
        match self.columns.iter().position(|c| c == "FORMAT") {
            Some(idx) => &self.columns[idx + 1..],
            None => &[],
        }
    }
}
