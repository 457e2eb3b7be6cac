use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use itertools::Itertools;
use log::info;

use rust_biodata::{
    FastaReader, FastqReader, HeaderReader, Record, RegionCounts, SamReader,
    VariantFilter, VcfReader,
};

/// Summarize FASTA, FASTQ, SAM and VCF files.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sequence count and mean length.
    Fasta { path: PathBuf },
    /// Read count, mean length, mean quality and GC content.
    Fastq { path: PathBuf },
    /// Alignment counts per chromosome, optionally the alignments overlapping a region.
    Sam(RegionArgs),
    /// Variant counts per chromosome, optionally the variants inside a region.
    Vcf {
        #[command(flatten)]
        region: RegionArgs,
        /// Only report variants with at least this QUAL.
        #[arg(long)]
        min_qual: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct RegionArgs {
    path: PathBuf,
    #[arg(requires_all = ["start", "end"])]
    chrom: Option<String>,
    start: Option<u64>,
    end: Option<u64>,
}

impl RegionArgs {
    fn region(&self) -> Result<Option<(&str, u64, u64)>> {
        match (&self.chrom, self.start, self.end) {
            (Some(chrom), Some(start), Some(end)) => {
                if start < 1 {
                    bail!("region start must be at least 1, got {}", start);
                }
                if start > end {
                    bail!("region start {} is after its end {}", start, end);
                }
                Ok(Some((chrom.as_str(), start, end)))
            }
            _ => Ok(None),
        }
    }
}

fn check_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} is not a readable file", path.display());
    }
    Ok(())
}

fn print_counts(counts: &RegionCounts) {
    for (chrom, count) in counts {
        println!("{}\t{}", chrom, count);
    }
}

fn fasta(path: &Path) -> Result<()> {
    let mut reader =
        FastaReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let stats = reader.stats()?;
    println!("sequences\t{}", stats.count());
    println!("mean_length\t{:.2}", stats.mean_length());
    Ok(())
}

fn fastq(path: &Path) -> Result<()> {
    let mut reader =
        FastqReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let stats = reader.stats()?;
    let profile = reader.profile()?;
    println!("reads\t{}", stats.count());
    println!("mean_length\t{:.2}", stats.mean_length());
    println!("mean_quality\t{:.2}", stats.mean_quality());
    println!("mean_gc\t{:.2}", profile.mean_gc());
    println!(
        "per_position_quality\t{}",
        profile
            .per_position_mean_quality()
            .iter()
            .map(|q| format!("{:.1}", q))
            .join(",")
    );
    Ok(())
}

fn sam(args: &RegionArgs) -> Result<()> {
    let region = args.region()?;
    check_file(&args.path)?;
    let mut reader =
        SamReader::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?;
    info!(
        "{} reference sequences in header",
        reader.header().reference_sequences().len()
    );
    println!("alignments\t{}", reader.count_alignments()?);
    print_counts(&reader.stats_by_chromosome()?);
    if let Some((chrom, start, end)) = region {
        for record in reader.filter_by_region(chrom, start, end)? {
            println!("{}", record?);
        }
    }
    Ok(())
}

fn vcf(args: &RegionArgs, min_qual: Option<f64>) -> Result<()> {
    let region = args.region()?;
    check_file(&args.path)?;
    let mut reader =
        VcfReader::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?;
    info!(
        "{} meta lines, {} INFO definitions, samples: {}",
        reader.header().meta().len(),
        reader.header_group("INFO").len(),
        reader.header().samples().join(",")
    );
    println!("variants\t{}", reader.count_variants()?);
    print_counts(&reader.stats_by_region()?);
    let filter = VariantFilter {
        min_qual,
        ..Default::default()
    };
    if let Some((chrom, start, end)) = region {
        for record in reader.filter_by_region(chrom, start, end)? {
            let record = record?;
            if filter.matches(&record) {
                println!("{}\t{}", record.id(), record);
            }
        }
    } else if let Some(min_qual) = min_qual {
        for record in reader.filter_by_quality(min_qual)? {
            let record = record?;
            println!("{}\t{}", record.id(), record);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let now = Instant::now();
    let result = match &cli.command {
        Command::Fasta { path } => {
            check_file(path)?;
            fasta(path)
        }
        Command::Fastq { path } => {
            check_file(path)?;
            fastq(path)
        }
        Command::Sam(args) => sam(args),
        Command::Vcf { region, min_qual } => vcf(region, *min_qual),
    };
    result?;
    info!("done in {:.2?}", now.elapsed());
    Ok(())
}
