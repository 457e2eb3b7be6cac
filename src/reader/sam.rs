use std::path::Path;

use crate::error::{Error, Result};
use crate::reader::{HeaderReader, Reader, Source};
use crate::record::AlignmentRecord;
use crate::stats::{count_by, RegionCounts};
use crate::types::{Region, SamHeader, SkipReason, SAM_MANDATORY_FIELDS, UNMAPPED_REFERENCE};

/// Reads SAM text files: `@` header lines followed by tab-separated alignments.
///
/// Lines with fewer than eleven columns, an unmapped (`*`) reference or an
/// unparsable FLAG/POS/MAPQ are skipped, never reported.
pub struct SamReader {
    source: Source,
    header: SamHeader,
    header_parsed: bool,
}

impl SamReader {
    /// Opens `path` and parses its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = Self {
            source: Source::open(path)?,
            header: SamHeader::default(),
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

    /// Number of lines that look like mapped alignments. This is a raw line
    /// count: FLAG, POS and MAPQ are not parsed.
    pub fn count_alignments(&mut self) -> Result<usize> {
        self.source.rewind()?;
        let mut line = String::new();
        let mut count = 0;
        while self.source.read_line(&mut line)? {
            if !line.starts_with('@') && is_mapped_line(line.trim()) {
                count += 1;
            }
        }
        self.source.rewind()?;
        Ok(count)
    }

    /// Alignment counts per reference name, in order of first appearance.
    pub fn stats_by_chromosome(&mut self) -> Result<RegionCounts> {
        let counts = count_by(self.records_snapshot()?, |record| record.chrom().clone())?;
        self.rewind()?;
        Ok(counts)
    }

    /// Alignments on `chrom` whose `[start, end]` interval overlaps the query.
    pub fn filter_by_region(
        &mut self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Result<impl Iterator<Item = Result<AlignmentRecord>> + '_> {
        let region = Region::new(chrom, start, end)?;
        Ok(self.records_snapshot()?.filter(move |record| match record {
            Ok(record) => region.overlaps(record.chrom(), record.start(), record.end()),
            Err(_) => true,
        }))
    }
}

impl Reader for SamReader {
    type Record = AlignmentRecord;
    type Records<'a> = SamRecords<'a> where Self: 'a;

    fn path(&self) -> &Path {
        self.source.path()
    }

    fn is_open(&self) -> bool {
        self.source.is_open()
    }

    /// Always scans from the start of the file, passing over the header.
    fn read(&mut self) -> Result<SamRecords<'_>> {
        self.source.rewind()?;
        Ok(SamRecords {
            source: &mut self.source,
            line: String::new(),
            done: false,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        self.source.rewind()
    }

    fn close(&mut self) {
        self.source.close();
        self.header = SamHeader::default();
        self.header_parsed = false;
    }
}

impl HeaderReader for SamReader {
    type Header = SamHeader;

    fn parse_header(&mut self) -> Result<()> {
        if self.header_parsed {
            return Ok(());
        }
        self.source.rewind()?;
        let mut header = SamHeader::default();
        let mut line = String::new();
        while self.source.read_line(&mut line)? {
            if !line.starts_with('@') {
                break;
            }
            header.push_line(&line);
        }
        self.source.rewind()?;
        log::debug!(
            "parsed SAM header of {} ({} tags)",
            self.source.path().display(),
            header.tags().count()
        );
        self.header = header;
        self.header_parsed = true;
        Ok(())
    }

    fn header(&self) -> &SamHeader {
        &self.header
    }

    fn header_group(&self, key: &str) -> Vec<&str> {
        self.header.group(key).iter().map(String::as_str).collect()
    }
}

/// Lazy sequence of mapped alignments.
pub struct SamRecords<'a> {
    source: &'a mut Source,
    line: String,
    done: bool,
}

impl Iterator for SamRecords<'_> {
    type Item = Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.source.read_line(&mut self.line) {
                Ok(true) => {}
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            if self.done || self.line.starts_with('@') {
                continue;
            }
            match parse_alignment(self.line.trim()) {
                Ok(record) => return Some(Ok(record)),
                Err(reason) => log::debug!(
                    "skipping SAM line {}: {}",
                    self.source.line_number(),
                    reason
                ),
            }
        }
        None
    }
}

fn is_mapped_line(line: &str) -> bool {
    let fields: Vec<&str> = line.split('\t').collect();
    fields.len() >= SAM_MANDATORY_FIELDS && fields[2] != UNMAPPED_REFERENCE
}

fn parse_alignment(line: &str) -> std::result::Result<AlignmentRecord, SkipReason> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SAM_MANDATORY_FIELDS {
        return Err(SkipReason::TooFewFields);
    }
    let (qname, flag, rname, pos, mapq, cigar) =
        (fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]);
    if rname == UNMAPPED_REFERENCE {
        return Err(SkipReason::Unmapped);
    }
    let pos = pos.parse().map_err(|_| SkipReason::InvalidInteger)?;
    let mapq = match mapq {
        "*" => 0,
        mapq => mapq.parse().map_err(|_| SkipReason::InvalidInteger)?,
    };
    let flag = flag.parse().map_err(|_| SkipReason::InvalidInteger)?;
    AlignmentRecord::new(qname, rname, pos, cigar, mapq, flag).ok_or(SkipReason::InvalidInteger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::fixture;
    use crate::record::Record;

    const SAM: &str = "@HD\tVN:1.6\tSO:coordinate\n\
        @SQ\tSN:chrom1\tLN:1000\n\
        @SQ\tSN:chrom2\tLN:500\n\
        r1\t0\tchrom1\t100\t60\t50M10D20M\t*\t0\t0\tACGT\tIIII\n\
        r2\t16\tchrom1\t300\t*\t30I\t*\t0\t0\tACGT\tIIII\n\
        r3\t4\t*\t0\t0\t*\t*\t0\t0\tACGT\tIIII\n\
        r4\t0\tchrom2\t10\t20\t10M\t*\t0\t0\tACGT\n\
        r5\tx\tchrom2\t10\t20\t10M\t*\t0\t0\tACGT\tIIII\n\
        r6\t0\tchrom2\t50\t255\t5S10M\t*\t0\t0\tACGT\tIIII\tNM:i:0\n";

    fn reader() -> (tempfile::NamedTempFile, SamReader) {
        let file = fixture(".sam", SAM);
        let reader = SamReader::open(file.path()).unwrap();
        (file, reader)
    }

    #[test]
    fn test_parse_alignment() {
        let record = parse_alignment("r1\t0\tchrom1\t100\t60\t50M10D20M\t*\t0\t0\tA\tI").unwrap();
        assert_eq!(record.id(), "r1");
        assert_eq!(record.start(), 100);
        assert_eq!(record.end(), 179);
        assert_eq!(record.mapq(), 60);
        assert_eq!(
            parse_alignment("r1\t0\tchrom1\t100"),
            Err(SkipReason::TooFewFields)
        );
        assert_eq!(
            parse_alignment("r1\t0\t*\t0\t0\t*\t*\t0\t0\tA\tI"),
            Err(SkipReason::Unmapped)
        );
        assert_eq!(
            parse_alignment("r1\t0\tc\tpos\t0\t*\t*\t0\t0\tA\tI"),
            Err(SkipReason::InvalidInteger)
        );
        assert_eq!(
            parse_alignment("r1\t0\tc\t1\t256\t*\t*\t0\t0\tA\tI"),
            Err(SkipReason::InvalidInteger)
        );
    }

    #[test]
    fn test_coordinate_overflow_is_skipped() {
        let file = fixture(
            ".sam",
            "@SQ\tSN:chr1\tLN:100\n\
            r1\t0\tchr1\t18446744073709551615\t60\t10M\t*\t0\t0\tA\tI\n\
            r2\t0\tchr1\t1\t60\t9999999999999999999M9999999999999999999M\t*\t0\t0\tA\tI\n\
            r3\t0\tchr1\t5\t60\t10M\t*\t0\t0\tA\tI\n",
        );
        let mut reader = SamReader::open(file.path()).unwrap();
        let records: Vec<_> = reader.read().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "r3");
        assert_eq!(reader.count_alignments().unwrap(), 3);
    }

    #[test]
    fn test_header() {
        let (_file, mut reader) = reader();
        assert_eq!(reader.header_group("@SQ"), ["SN:chrom1\tLN:1000", "SN:chrom2\tLN:500"]);
        assert_eq!(reader.header_group("@HD"), ["VN:1.6\tSO:coordinate"]);
        assert!(reader.header_group("@PG").is_empty());

        let before = reader.header().clone();
        reader.parse_header().unwrap();
        reader.parse_header().unwrap();
        assert_eq!(reader.header(), &before);
        assert_eq!(reader.header().group("@SQ").len(), 2);
        assert_eq!(reader.header().reference_sequences()["chrom2"], Some(500));
    }

    #[test]
    fn test_read_skips_invalid_lines() {
        let (_file, mut reader) = reader();
        let records: Vec<_> = reader.read().unwrap().collect::<Result<_>>().unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["r1", "r2", "r6"]);
        assert_eq!(records[1].mapq(), 0);
        assert_eq!(records[1].end(), 300);
        assert_eq!(records[1].flag(), 16);
        assert_eq!(records[2].end(), 59);

        // read() always restarts from the top
        assert_eq!(reader.read().unwrap().count(), 3);
    }

    #[test]
    fn test_count_and_stats() {
        let (_file, mut reader) = reader();
        // r5 passes the raw line filter although its FLAG does not parse
        assert_eq!(reader.count_alignments().unwrap(), 4);
        let stats = reader.stats_by_chromosome().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get_index(0), Some((&"chrom1".to_string(), &2)));
        assert_eq!(stats["chrom2"], 1);
    }

    #[test]
    fn test_filter_by_region_is_overlap_based() {
        let (_file, mut reader) = reader();
        let hits: Vec<_> = reader
            .filter_by_region("chrom1", 150, 200)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "r1");

        let hits: Vec<_> = reader
            .filter_by_region("chrom1", 200, 300)
            .unwrap()
            .map(Result::unwrap)
            .map(|r| r.id().to_owned())
            .collect();
        assert_eq!(hits, ["r2"]);

        assert_eq!(reader.filter_by_region("chrom3", 1, 1000).unwrap().count(), 0);
    }

    #[test]
    fn test_filter_by_region_rejects_inverted_range() {
        let (_file, mut reader) = reader();
        assert!(matches!(
            reader.filter_by_region("chrom1", 200, 100).err(),
            Some(Error::InvalidRange { start: 200, end: 100 })
        ));
    }

    #[test]
    fn test_close_clears_header() {
        let (_file, mut reader) = reader();
        reader.close();
        reader.close();
        assert!(reader.header().is_empty());
        assert!(matches!(reader.read().err(), Some(Error::Closed { .. })));
    }
}
