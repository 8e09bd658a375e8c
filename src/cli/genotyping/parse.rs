use std::path::{Path, PathBuf};

use clap::ArgMatches;
use indicatif::ProgressBar;

use crate::cli::shared;
use crate::core::error::Result;
use crate::core::io::fasta::BasicFastaReader;
use crate::core::io::hts;
use crate::core::io::maf::{self, CandidateTable};
use crate::core::workload::{self, GenomicInterval};

use super::args;

pub fn candidates(pbar: ProgressBar, matches: &ArgMatches, reference: &Path) -> Result<CandidateTable> {
    let path: PathBuf = shared::parse::value(matches, args::candidates::CANDIDATES)?;
    pbar.set_message(format!("Parsing candidate variants from {}...", path.display()));
    let mut reference = BasicFastaReader::new(reference.to_owned());
    let table = maf::parse(&path, &mut reference)?;
    pbar.finish_with_message(format!("Candidate variants: {}", table.candidates().len()));
    Ok(table)
}

pub fn workload(
    pbar: ProgressBar,
    matches: &ArgMatches,
    regions: Vec<GenomicInterval>,
    bamfiles: &[PathBuf],
    candidates: &CandidateTable,
) -> Result<Vec<GenomicInterval>> {
    pbar.set_message("Shrinking target regions to candidates...");
    let padding = shared::parse::value(matches, args::candidates::PADDING)?;
    let contigs = hts::contigs(bamfiles)?;
    let total = regions.len();
    let ids = candidates.candidates().iter().map(|x| x.id());
    let result = GenomicInterval::around_candidates(regions, ids, &contigs, padding);
    pbar.finish_with_message(format!(
        "Regions with candidates: {} out of {}, the longest is {}bp",
        result.len(),
        total,
        workload::maxlen(&result)
    ));
    Ok(result)
}
