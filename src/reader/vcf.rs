use std::path::Path;

use crate::error::{Error, Result};
use crate::parser;
use crate::reader::{HeaderReader, Reader, Source};
use crate::record::{VariantRecord, MISSING_FILTER};
use crate::stats::{count_by, RegionCounts};
use crate::types::{Region, SkipReason, VcfHeader, VCF_MIN_FIELDS};

/// Reads VCF text files.
///
/// Data lines with fewer than five columns or a non-integer POS are skipped,
/// never reported.
pub struct VcfReader {
    source: Source,
    header: VcfHeader,
    header_parsed: bool,
}

/// Conjunction of optional conditions for [`VcfReader::filter_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantFilter {
    pub chrom: Option<String>,
    pub min_qual: Option<f64>,
    pub max_qual: Option<f64>,
}

impl VariantFilter {
    /// A missing QUAL compares as 0.0.
    pub fn matches(&self, record: &VariantRecord) -> bool {
        let qual = record.qual().unwrap_or(0.0);
        self.chrom.as_ref().map_or(true, |c| c == record.chrom())
            && self.min_qual.map_or(true, |min| qual >= min)
            && self.max_qual.map_or(true, |max| qual <= max)
    }
}

impl VcfReader {
    /// Opens `path` and parses its header; a missing `#CHROM` line is fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = Self {
            source: Source::open(path)?,
            header: VcfHeader::default(),
            header_parsed: false,
        };
        if let Err(source) = reader.parse_header() {
            reader.close();
            return Err(Error::HeaderParse {
                path: reader.path().to_path_buf(),
                source: Box::new(source),
            });
        }
        Ok(reader)
    }

    /// Number of non-empty lines outside the header. Lines that [`Reader::read`]
    /// would skip are counted too.
    pub fn count_variants(&mut self) -> Result<usize> {
        self.parse_header()?;
        self.source.rewind()?;
        let mut line = String::new();
        let mut count = 0;
        while self.source.read_line(&mut line)? {
            if !line.starts_with('#') && !line.trim().is_empty() {
                count += 1;
            }
        }
        self.source.rewind()?;
        Ok(count)
    }

    /// Variant counts per chromosome, sorted by chromosome name.
    pub fn stats_by_region(&mut self) -> Result<RegionCounts> {
        let mut counts = count_by(self.records_snapshot()?, |record| record.chrom().clone())?;
        counts.sort_keys();
        Ok(counts)
    }

    /// Variants on `chrom` with `start <= pos <= end`.
    pub fn filter_by_region(
        &mut self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<impl Iterator<Item = Result<VariantRecord>> + '_> {
        let region = Region::new(chrom, start, end)?;
        Ok(self.records_snapshot()?.filter(move |record| match record {
            Ok(record) => region.contains(record.chrom(), record.pos()),
            Err(_) => true,
        }))
    }

    /// Variants whose QUAL (missing counts as 0.0) is at least `min_qual`.
    pub fn filter_by_quality(
        &mut self,
        min_qual: f64,
    ) -> Result<impl Iterator<Item = Result<VariantRecord>> + '_> {
        let filter = VariantFilter {
            min_qual: Some(min_qual),
            ..Default::default()
        };
        Ok(self.records_snapshot()?.filter(move |record| match record {
            Ok(record) => filter.matches(record),
            Err(_) => true,
        }))
    }

    pub fn filter_records(&mut self, filter: &VariantFilter) -> Result<Vec<VariantRecord>> {
        let mut matching = Vec::new();
        for record in self.records_snapshot()? {
            let record = record?;
            if filter.matches(&record) {
                matching.push(record);
            }
        }
        Ok(matching)
    }
}

impl Reader for VcfReader {
    type Record = VariantRecord;
    type Records<'a> = VcfRecords<'a> where Self: 'a;

    fn path(&self) -> &Path {
        self.source.path()
    }

    fn is_open(&self) -> bool {
        self.source.is_open()
    }

    /// Yields variants from the current position, passing over `#` lines.
    fn read(&mut self) -> Result<VcfRecords<'_>> {
        self.parse_header()?;
        Ok(VcfRecords::new(&mut self.source, false))
    }

    fn rewind(&mut self) -> Result<()> {
        self.source.rewind()
    }

    fn close(&mut self) {
        self.source.close();
        self.header = VcfHeader::default();
        self.header_parsed = false;
    }

    /// Replays the file from the start and rewinds again once exhausted.
    fn records_snapshot(&mut self) -> Result<VcfRecords<'_>> {
        self.parse_header()?;
        self.source.rewind()?;
        Ok(VcfRecords::new(&mut self.source, true))
    }
}

impl HeaderReader for VcfReader {
    type Header = VcfHeader;

    fn parse_header(&mut self) -> Result<()> {
        if self.header_parsed {
            return Ok(());
        }
        self.source.rewind()?;
        let mut header = VcfHeader::default();
        let mut line = String::new();
        let mut found_columns = false;
        while self.source.read_line(&mut line)? {
            if line.starts_with("##") {
                header.meta.push(line.trim().to_owned());
            } else if line.starts_with("#CHROM") {
                header.columns = line
                    .trim()
                    .trim_start_matches('#')
                    .split('\t')
                    .map(str::to_owned)
                    .collect();
                found_columns = true;
                break;
            }
        }
        if !found_columns {
            return Err(Error::MissingColumnHeader);
        }
        self.source.rewind()?;
        log::debug!(
            "parsed VCF header of {} ({} meta lines, {} columns)",
            self.source.path().display(),
            header.meta.len(),
            header.columns.len()
        );
        self.header = header;
        self.header_parsed = true;
        Ok(())
    }

    fn header(&self) -> &VcfHeader {
        &self.header
    }

    /// Meta lines starting with `##{key}=`.
    fn header_group(&self, key: &str) -> Vec<&str> {
        self.header.group(key)
    }
}

/// Lazy sequence of variants.
pub struct VcfRecords<'a> {
    source: &'a mut Source,
    line: String,
    rewind_at_end: bool,
    done: bool,
}

impl<'a> VcfRecords<'a> {
    fn new(source: &'a mut Source, rewind_at_end: bool) -> Self {
        Self {
            source,
            line: String::new(),
            rewind_at_end,
            done: false,
        }
    }

    fn finish(&mut self) -> Option<Result<VariantRecord>> {
        self.done = true;
        if self.rewind_at_end {
            if let Err(e) = self.source.rewind() {
                return Some(Err(e));
            }
        }
        None
    }
}

impl Iterator for VcfRecords<'_> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.source.read_line(&mut self.line) {
                Ok(true) => {}
                Ok(false) => return self.finish(),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            if self.line.starts_with('#') {
                continue;
            }
            match parse_variant(self.line.trim()) {
                Ok(record) => return Some(Ok(record)),
                Err(reason) => log::debug!(
                    "skipping VCF line {}: {}",
                    self.source.line_number(),
                    reason
                ),
            }
        }
        None
    }
}

fn parse_variant(line: &str) -> std::result::Result<VariantRecord, SkipReason> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < VCF_MIN_FIELDS {
        return Err(SkipReason::TooFewFields);
    }
    let pos = fields[1]
        .parse()
        .map_err(|_| SkipReason::InvalidInteger)?;
    let qual = fields.get(5).and_then(|qual| qual.parse().ok());
    let filter = fields.get(6).copied().unwrap_or(MISSING_FILTER);
    let info = parser::info_field(fields.get(7).copied().unwrap_or(""));
    Ok(VariantRecord::new(fields[0], pos, fields[3], fields[4], info)
        .with_qual(qual)
        .with_filter(filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::fixture;
    use crate::record::Record;

    const VCF: &str = "##fileformat=VCFv4.2\n\
        ##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total Depth\">\n\
        ##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">\n\
        ##FILTER=<ID=q10,Description=\"Quality below 10\">\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
        chr2\t500\trs1\tG\tA\t50\tPASS\tDP=20;DB\n\
        chr1\t100\t.\tA\tT\t.\t.\tDP=10\n\
        chr1\t150\t.\tC\tG\t5\tq10\t.\n\
        chr1\tabc\t.\tC\tG\t5\tq10\t.\n\
        chr1\t300\t.\tT\n\
        \n\
        chr1\t400\t.\tT\tC\n";

    fn reader() -> (tempfile::NamedTempFile, VcfReader) {
        let file = fixture(".vcf", VCF);
        let reader = VcfReader::open(file.path()).unwrap();
        (file, reader)
    }

    #[test]
    fn test_minimal_file() {
        let file = fixture(
            ".vcf",
            "#CHROM\tPOS\tID\tREF\tALT\nchr1\t100\t.\tA\tT\t.\t.\tDP=10\n",
        );
        let mut reader = VcfReader::open(file.path()).unwrap();
        let records: Vec<_> = reader.read().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id(), "chr1:100");
        assert_eq!(record.chrom(), "chr1");
        assert_eq!(record.pos(), 100);
        assert_eq!(record.ref_allele(), "A");
        assert_eq!(record.alt_allele(), "T");
        assert_eq!(record.info().len(), 1);
        assert_eq!(record.info()["DP"], "10");
        assert_eq!(record.filter(), ".");
        assert!(reader.header().meta().is_empty());
        assert_eq!(reader.header().columns()[0], "CHROM");
    }

    #[test]
    fn test_missing_column_header_is_fatal() {
        let file = fixture(".vcf", "##fileformat=VCFv4.2\nchr1\t1\t.\tA\tT\n");
        match VcfReader::open(file.path()) {
            Err(Error::HeaderParse { path, source }) => {
                assert_eq!(path, file.path());
                assert!(matches!(*source, Error::MissingColumnHeader));
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected a header error"),
        }
    }

    #[test]
    fn test_parse_variant() {
        let record = parse_variant("chr2\t500\trs1\tG\tA\t50\tPASS\tDP=20;DB").unwrap();
        assert_eq!(record.id(), "chr2:500");
        assert_eq!(record.qual(), Some(50.0));
        assert_eq!(record.filter(), "PASS");
        assert_eq!(record.info()["DB"], "True");

        let record = parse_variant("chr1\t400\t.\tT\tC").unwrap();
        assert_eq!(record.filter(), ".");
        assert!(record.info().is_empty());
        assert_eq!(record.qual(), None);

        assert_eq!(
            parse_variant("chr1\t300\t.\tT").err(),
            Some(SkipReason::TooFewFields)
        );
        assert_eq!(
            parse_variant("chr1\tabc\t.\tC\tG").err(),
            Some(SkipReason::InvalidInteger)
        );
    }

    #[test]
    fn test_header_groups_and_idempotence() {
        let (_file, mut reader) = reader();
        let before = reader.header().clone();
        reader.parse_header().unwrap();
        reader.parse_header().unwrap();
        assert_eq!(reader.header(), &before);
        assert_eq!(before.meta().len(), 4);
        assert_eq!(reader.header_group("INFO").len(), 2);
        assert_eq!(
            reader.header_group("FILTER"),
            ["##FILTER=<ID=q10,Description=\"Quality below 10\">"]
        );
        assert!(reader.header_group("FORMAT").is_empty());
        assert_eq!(before.info_definitions()[1].id(), "DB");
    }

    #[test]
    fn test_counts() {
        let (_file, mut reader) = reader();
        // raw count includes the unparsable and short lines
        assert_eq!(reader.count_variants().unwrap(), 6);
        let stats = reader.stats_by_region().unwrap();
        assert_eq!(stats.keys().collect::<Vec<_>>(), ["chr1", "chr2"]);
        assert_eq!(stats["chr1"], 3);
        assert_eq!(stats.values().sum::<usize>(), reader.read().unwrap().count());
    }

    #[test]
    fn test_filter_by_region() {
        let (_file, mut reader) = reader();
        let positions: Vec<u64> = reader
            .filter_by_region("chr1", 100, 150)
            .unwrap()
            .map(|r| r.unwrap().pos())
            .collect();
        assert_eq!(positions, [100, 150]);

        // the cursor is back at the start once the filter is exhausted
        assert_eq!(reader.read().unwrap().count(), 4);

        assert!(matches!(
            reader.filter_by_region("chr1", 10, 1).err(),
            Some(Error::InvalidRange { start: 10, end: 1 })
        ));
    }

    #[test]
    fn test_quality_filters() {
        let (_file, mut reader) = reader();
        let ids: Vec<String> = reader
            .filter_by_quality(10.0)
            .unwrap()
            .map(|r| r.unwrap().id().to_owned())
            .collect();
        assert_eq!(ids, ["chr2:500"]);

        let filter = VariantFilter {
            chrom: Some("chr1".to_string()),
            max_qual: Some(5.0),
            ..Default::default()
        };
        let records = reader.filter_records(&filter).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.chrom() == "chr1"));
    }
}
