use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::{Arg, ArgMatches};
use indicatif::ProgressBar;
use rust_htslib::bam::Record;

use crate::core::error::Result;
use crate::core::rpileup::filters::{ByFlags, ByQuality, Sequential};
use crate::core::rpileup::pileup::MismatchPolicy;
use crate::core::workload::GenomicInterval;

use super::{parse, validate};

pub mod core {
    use super::*;

    pub const INPUT: &str = "input";
    pub const REFERENCE: &str = "reference";
    pub const REGIONS: &str = "regions";
    pub const THREADS: &str = "threads";
    pub const SAVETO: &str = "saveto";
    pub const NAME: &str = "name";
    pub const VERBOSE: &str = "verbose";

    pub const SECTION_NAME: &str = "Core";

    pub fn args<'a>() -> Vec<Arg<'a>> {
        let args = vec![
            Arg::new(INPUT)
                .short('i')
                .long(INPUT)
                .required(true)
                .takes_value(true)
                .multiple_values(true)
                .validator(validate::path)
                .long_help("Path to the input BAM file(s). May contain a space-separated list of files, in which case they are treated as technical replicates and pooled together. All files must be coordinate sorted, indexed and mapped against the same assembly."),
            Arg::new(REFERENCE)
                .short('r')
                .long(REFERENCE)
                .required(true)
                .takes_value(true)
                .validator(validate::path)
                .long_help("Indexed fasta file with a reference genome assembly. Contig/chromosome names must match the names in the input BAM headers."),
            Arg::new(REGIONS)
                .short('b')
                .long(REGIONS)
                .required(true)
                .takes_value(true)
                .validator(validate::path)
                .long_help("BED file (optionally gzipped) with target regions. The 4th column, if present, is used as the region name."),
            Arg::new(NAME)
                .short('n')
                .long(NAME)
                .takes_value(true)
                .long_help("Sample name. By default, the name of the first input BAM file without extension."),
            Arg::new(SAVETO)
                .short('o')
                .long(SAVETO)
                .takes_value(true)
                .validator(validate::prefix)
                .long_help("Prefix for the output tables, e.g. results/sample will produce results/sample-pileup.txt and so on. By default, the name of the first input BAM file without extension."),
            Arg::new(THREADS)
                .short('t')
                .long(THREADS)
                .takes_value(true)
                .validator(validate::numeric(1, usize::MAX))
                .default_value("1")
                .long_help("Maximum number of threads to spawn at once."),
            Arg::new(VERBOSE)
                .short('v')
                .long(VERBOSE)
                .takes_value(false)
                .long_help("Log debug messages, including per-region read statistics."),
        ];
        args.into_iter().map(|x| x.help_heading(Some(SECTION_NAME))).collect()
    }
}

pub mod reads_filtering {
    use super::*;

    pub const MAPQ: &str = "mapq";
    pub const ALLOW_MAPQ_255: &str = "mapq-255";
    pub const INCLUDE_FLAGS: &str = "in-flags";
    pub const EXCLUDE_FLAGS: &str = "ex-flags";

    pub const SECTION_NAME: &str = "Reads filtering";

    pub fn args<'a>() -> Vec<Arg<'a>> {
        let args = vec![
            Arg::new(MAPQ)
                .long(MAPQ)
                .takes_value(true)
                .validator(validate::numeric(0u8, 254u8))
                .default_value("20")
                .long_help("Use only reads with mapq ≥ threshold. Note that reads with mapq = 255 are skipped by default (mapq is not available according to the SAM spec)."),
            Arg::new(ALLOW_MAPQ_255)
                .long(ALLOW_MAPQ_255)
                .takes_value(false)
                .long_help("Use reads with mapq = 255. Useful for aligners that do not fully conform to the SAM specification."),
            Arg::new(INCLUDE_FLAGS)
                .long(INCLUDE_FLAGS)
                .takes_value(true)
                .validator(validate::numeric(0u16, 4095u16))
                .default_value("0")
                .long_help("Include only reads for which all the specified BAM flags are set. For example, a value of 3 will result in skipping reads that were not mapped in proper pairs. Use zero (0) to disable this filter."),
            Arg::new(EXCLUDE_FLAGS)
                .long(EXCLUDE_FLAGS)
                .takes_value(true)
                .validator(validate::numeric(0u16, 4095u16))
                .default_value("2820")
                .long_help("Exclude reads for which any of the specified BAM flags are set. The default 2820 skips unmapped reads, secondary and supplementary alignments, reads that fail platform/vendor quality checks. Duplicates are kept on purpose: every table is reported with and without them."),
        ];
        args.into_iter().map(|x| x.help_heading(Some(SECTION_NAME))).collect()
    }
}

pub mod pairing {
    use super::*;

    pub const POLICY: &str = "policy";
    pub const INSERT_MIN: &str = "insert-min";
    pub const INSERT_MAX: &str = "insert-max";

    pub const SECTION_NAME: &str = "Read pairs";

    pub fn args<'a>() -> Vec<Arg<'a>> {
        let args = vec![
            Arg::new(POLICY)
                .long(POLICY)
                .takes_value(true)
                .validator(validate::policy)
                .default_value("0")
                .long_help("How to reconcile variants reported by mates of the same fragment. 0: drop a variant if a mate overlapping it doesn't report it (alleles with N are exempt). 1: keep everything, except alleles with N."),
            Arg::new(INSERT_MIN)
                .long(INSERT_MIN)
                .takes_value(true)
                .validator(validate::numeric(0u64, u64::MAX))
                .default_value("124")
                .long_help("Smallest expected insert size of a proper pair. Deletions in pairs outside [insert-min, insert-max] are counted as having an unexpected mate distance."),
            Arg::new(INSERT_MAX)
                .long(INSERT_MAX)
                .takes_value(true)
                .validator(validate::numeric(0u64, u64::MAX))
                .default_value("593")
                .long_help("Largest expected insert size of a proper pair."),
        ];
        args.into_iter().map(|x| x.help_heading(Some(SECTION_NAME))).collect()
    }
}

pub fn all<'a>() -> Vec<Arg<'a>> {
    core::args().into_iter().chain(reads_filtering::args()).chain(pairing::args()).collect()
}

pub struct CoreArgs {
    pub name: String,
    pub threads: usize,
    pub bamfiles: Vec<PathBuf>,
    pub reference: PathBuf,
    pub regions: Vec<GenomicInterval>,
    pub saveto: PathBuf,
    pub readfilter: Sequential<Record, ByQuality, ByFlags>,
    pub policy: MismatchPolicy,
    pub insert_size: RangeInclusive<u64>,
}

impl CoreArgs {
    pub fn new(args: &ArgMatches, factory: impl Fn() -> ProgressBar) -> Result<Self> {
        let bamfiles = parse::bamfiles(factory(), args)?;
        Ok(Self {
            name: parse::name(factory(), args, &bamfiles)?,
            threads: parse::threads(factory(), args)?,
            reference: parse::reference(factory(), args)?,
            regions: parse::regions(factory(), args)?,
            saveto: parse::saveto(factory(), args, &bamfiles)?,
            readfilter: parse::readfilter(factory(), args)?,
            policy: parse::policy(factory(), args)?,
            insert_size: parse::insert_size(factory(), args)?,
            bamfiles,
        })
    }
}
