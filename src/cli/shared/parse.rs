use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::ArgMatches;
use indicatif::ProgressBar;
use itertools::Itertools;
use rust_htslib::bam::Record;

use crate::core::error::{PileupError, Result};
use crate::core::io::hts;
use crate::core::rpileup::filters::{ByFlags, ByQuality, Sequential};
use crate::core::rpileup::pileup::MismatchPolicy;
use crate::core::workload::{self, GenomicInterval};

use super::args;

/// Typed value of an argument. Validators run first, so failures here mean a missing default.
pub fn value<T: FromStr>(matches: &ArgMatches, key: &str) -> Result<T> {
    let raw = matches.value_of(key).ok_or_else(|| PileupError::config(format!("Missing value for --{}", key)))?;
    raw.parse().map_err(|_| PileupError::config(format!("Failed to parse --{} value: {}", key, raw)))
}

fn stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .ok_or_else(|| PileupError::config(format!("Can't derive a name from {}", path.display())))
}

pub fn readfilter(pbar: ProgressBar, matches: &ArgMatches) -> Result<Sequential<Record, ByQuality, ByFlags>> {
    pbar.set_message("Parsing reads filter options...");
    let (mapq, allow_mapq_255) =
        (value(matches, args::reads_filtering::MAPQ)?, matches.is_present(args::reads_filtering::ALLOW_MAPQ_255));
    let byquality = ByQuality::new(mapq, !allow_mapq_255);

    let (include, exclude) =
        (value(matches, args::reads_filtering::INCLUDE_FLAGS)?, value(matches, args::reads_filtering::EXCLUDE_FLAGS)?);
    let byflags = ByFlags::new(include, exclude);

    let msg = format!(
        "Reads filter options: require flags {}, disallow flags {}, mapq >= {}. ",
        byflags.include(),
        byflags.exclude(),
        byquality.mapq()
    );
    if allow_mapq_255 {
        pbar.finish_with_message(msg + "Mapq = 255 is allowed.");
    } else {
        pbar.finish_with_message(msg + "Mapq = 255 is NOT allowed.");
    }
    Ok(Sequential::new(byquality, byflags))
}

pub fn policy(pbar: ProgressBar, matches: &ArgMatches) -> Result<MismatchPolicy> {
    pbar.set_message("Parsing read pair mismatch policy...");
    let policy = value(matches, args::pairing::POLICY)?;
    pbar.finish_with_message(format!("Read pair mismatch policy: {}", policy));
    Ok(policy)
}

pub fn insert_size(pbar: ProgressBar, matches: &ArgMatches) -> Result<RangeInclusive<u64>> {
    pbar.set_message("Parsing expected insert size...");
    let (min, max): (u64, u64) = (value(matches, args::pairing::INSERT_MIN)?, value(matches, args::pairing::INSERT_MAX)?);
    if min > max {
        return Err(PileupError::config(format!("Min insert size {} is greater than the max {}", min, max)));
    }
    pbar.finish_with_message(format!("Expected insert size of proper pairs: [{}, {}]", min, max));
    Ok(min..=max)
}

pub fn bamfiles(pbar: ProgressBar, matches: &ArgMatches) -> Result<Vec<PathBuf>> {
    pbar.set_message("Parsing paths to the input files...");
    let result: Vec<PathBuf> = matches
        .values_of(args::core::INPUT)
        .map(|x| x.map(PathBuf::from).collect())
        .unwrap_or_default();
    if result.is_empty() {
        return Err(PileupError::config("At least one input BAM file is required"));
    }
    // Pooled files must share the assembly
    hts::contigs(&result)?;

    if result.len() == 1 {
        pbar.finish_with_message(format!("Input file path: {}", result[0].display()))
    } else {
        let paths = result.iter().map(|x| x.display()).join(" ");
        pbar.finish_with_message(format!("Input files that will be pooled: {}", paths));
    }
    Ok(result)
}

pub fn reference(pbar: ProgressBar, matches: &ArgMatches) -> Result<PathBuf> {
    pbar.set_message("Parsing path to the reference assembly...");
    let result: PathBuf = value(matches, args::core::REFERENCE)?;
    pbar.finish_with_message(format!("Path to the reference assembly: {}", result.display()));
    Ok(result)
}

pub fn regions(pbar: ProgressBar, matches: &ArgMatches) -> Result<Vec<GenomicInterval>> {
    let path: PathBuf = value(matches, args::core::REGIONS)?;
    pbar.set_message(format!("Parsing target regions from {}...", path.display()));
    let result = GenomicInterval::from_bed(&path)?;
    pbar.finish_with_message(format!(
        "Target regions: {} in total, the longest is {}bp",
        result.len(),
        workload::maxlen(&result)
    ));
    Ok(result)
}

pub fn threads(pbar: ProgressBar, matches: &ArgMatches) -> Result<usize> {
    pbar.set_message("Parsing number of threads allowed to launch...");
    let result = value(matches, args::core::THREADS)?;
    pbar.finish_with_message(format!("Using thread pool with at most {} threads", result));
    Ok(result)
}

pub fn name(pbar: ProgressBar, matches: &ArgMatches, bamfiles: &[PathBuf]) -> Result<String> {
    pbar.set_message("Parsing the sample name...");
    let result = match matches.value_of(args::core::NAME) {
        Some(x) => x.to_owned(),
        None => stem(&bamfiles[0])?,
    };
    pbar.finish_with_message(format!("Sample name: {}", result));
    Ok(result)
}

pub fn saveto(pbar: ProgressBar, matches: &ArgMatches, bamfiles: &[PathBuf]) -> Result<PathBuf> {
    pbar.set_message("Parsing output prefix...");
    let result = match matches.value_of(args::core::SAVETO) {
        Some(x) => PathBuf::from(x),
        None => PathBuf::from(stem(&bamfiles[0])?),
    };
    pbar.finish_with_message(format!("Results will be saved to {}-*", result.display()));
    Ok(result)
}
