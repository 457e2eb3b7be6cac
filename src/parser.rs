use indexmap::IndexMap;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag};
use nom::character::complete::{anychar, char, digit1, none_of};
use nom::combinator::{map, map_res, opt, rest, value};
use nom::multi::separated_list0;
use nom::sequence::{delimited, pair, preceded, separated_pair};
use nom::IResult;

use crate::types::{CigarOp, InfoNumber, MetaValue};

fn cigar_op(input: &str) -> IResult<&str, (u64, CigarOp)> {
    pair(
        map_res(digit1, str::parse::<u64>),
        map_res(anychar, |c: char| {
            u8::try_from(c)
                .ok()
                .and_then(|b| CigarOp::try_from(b).ok())
                .ok_or(c)
        }),
    )(input)
}

/// Number of reference bases covered by a CIGAR string, `None` if the sum overflows.
///
/// Characters that do not form a `<length><op>` pair are passed over.
pub(crate) fn aligned_reference_length(cigar: &str) -> Option<u64> {
    let mut input = cigar;
    let mut length: u64 = 0;
    while !input.is_empty() {
        match cigar_op(input) {
            Ok((remaining, (len, op))) => {
                if op.consumes_reference() {
                    length = length.checked_add(len)?;
                }
                input = remaining;
            }
            Err(_) => {
                let mut chars = input.chars();
                chars.next();
                input = chars.as_str();
            }
        }
    }
    Some(length)
}

/// Decodes a VCF INFO column into key/value pairs; bare keys become `"True"`.
pub(crate) fn info_field(info: &str) -> IndexMap<String, String> {
    if info.is_empty() || info == "." {
        return IndexMap::new();
    }
    info.split(';')
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((key, value)) => (key.to_owned(), value.to_owned()),
            None => (token.to_owned(), "True".to_owned()),
        })
        .collect()
}

/// First whitespace-delimited token of a FASTQ header line (without `@`).
pub(crate) fn fastq_id(header: &str) -> &str {
    header
        .strip_prefix('@')
        .unwrap_or(header)
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
}

pub(crate) fn info_number(input: &str) -> IResult<&str, InfoNumber> {
    alt((
        map(map_res(digit1, str::parse::<usize>), InfoNumber::Count),
        value(InfoNumber::AlternateAlleles, tag("A")),
        value(InfoNumber::Alleles, tag("R")),
        value(InfoNumber::Genotypes, tag("G")),
        value(InfoNumber::Unknown, tag(".")),
    ))(input)
}

fn string(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn keys_and_values(input: &str) -> IResult<&str, Vec<(&str, String)>> {
    fn key_value(input: &str) -> IResult<&str, (&str, String)> {
        separated_pair(
            is_not("<,=>"),
            char('='),
            alt((string, map(is_not(",>"), str::to_owned))),
        )(input)
    }
    separated_list0(char(','), key_value)(input)
}

/// Splits a `##key=value` line; `<...>` values are decoded into ordered pairs.
pub(crate) fn meta_line(line: &str) -> IResult<&str, (&str, MetaValue)> {
    let (remaining, (key, raw)) =
        separated_pair(preceded(tag("##"), is_not("=")), char('='), rest)(line)?;
    let value = match delimited(char('<'), keys_and_values, char('>'))(raw) {
        Ok(("", pairs)) => MetaValue::Structured(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        ),
        _ => MetaValue::Text(raw.to_owned()),
    };
    Ok((remaining, (key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_reference_length() {
        assert_eq!(aligned_reference_length("50M10D20M"), Some(80));
        assert_eq!(aligned_reference_length("30I"), Some(0));
        assert_eq!(aligned_reference_length("5S20M3I10M2N4=1X7H"), Some(37));
        assert_eq!(aligned_reference_length("*"), Some(0));
        assert_eq!(aligned_reference_length(""), Some(0));
        // malformed pieces are passed over
        assert_eq!(aligned_reference_length("12Z5M"), Some(5));
    }

    #[test]
    fn test_aligned_reference_length_overflow() {
        assert_eq!(
            aligned_reference_length("9999999999999999999M9999999999999999999M"),
            None
        );
        // insertions never count, however large
        assert_eq!(
            aligned_reference_length("9999999999999999999I9999999999999999999I1M"),
            Some(1)
        );
    }

    #[test]
    fn test_info_field() {
        let info = info_field("DP=30;AF=0.5;DB");
        assert_eq!(info["DP"], "30");
        assert_eq!(info["AF"], "0.5");
        assert_eq!(info["DB"], "True");
        assert_eq!(info_field("ANN=a=b;;X").get("ANN").map(String::as_str), Some("a=b"));
        assert_eq!(info_field("ANN=a=b;;X").len(), 2);
        assert!(info_field(".").is_empty());
        assert!(info_field("").is_empty());
    }

    #[test]
    fn test_fastq_id() {
        assert_eq!(fastq_id("@read1 length=36"), "read1");
        assert_eq!(fastq_id("@read2"), "read2");
        assert_eq!(fastq_id("@"), "unknown");
        assert_eq!(fastq_id("@   "), "unknown");
    }

    #[test]
    fn test_info_number() {
        assert_eq!(info_number("1").unwrap().1, InfoNumber::Count(1));
        assert_eq!(info_number("R").unwrap().1, InfoNumber::Alleles);
        assert_eq!(info_number(".").unwrap().1, InfoNumber::Unknown);
        assert!(info_number("Q").is_err());
    }

    #[test]
    fn test_meta_line() {
        let (_, (key, value)) = meta_line("##fileformat=VCFv4.2").unwrap();
        assert_eq!(key, "fileformat");
        assert_eq!(value, MetaValue::Text("VCFv4.2".to_string()));

        let line = r#"##INFO=<ID=DB,Number=0,Type=Flag,Description="dbSNP \"membership\", build 129">"#;
        let (_, (key, value)) = meta_line(line).unwrap();
        assert_eq!(key, "INFO");
        match value {
            MetaValue::Structured(mapping) => {
                assert_eq!(mapping["ID"], "DB");
                assert_eq!(mapping["Number"], "0");
                assert_eq!(mapping["Description"], r#"dbSNP "membership", build 129"#);
            }
            other => panic!("expected structured value, got {:?}", other),
        }

        let (_, (_, value)) = meta_line(r#"##FILTER=<ID=q10,Description="">"#).unwrap();
        assert!(matches!(value, MetaValue::Structured(m) if m["Description"].is_empty()));
    }
}
