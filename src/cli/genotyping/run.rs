use std::sync::Arc;

use clap::ArgMatches;
use indicatif::ProgressBar;

use crate::cli::shared;
use crate::cli::shared::args::CoreArgs;
use crate::core::error::Result;
use crate::core::io::fasta::BasicFastaReader;
use crate::core::io::sink::FileSink;
use crate::core::processors::{GenotypingProcessor, Processor};
use crate::core::rpileup::hts::HTSPileupEngine;
use crate::core::rpileup::pileup::RegionPileup;
use crate::core::runner::PileupRunner;
use crate::core::workload;

use super::parse;

pub fn run(matches: &ArgMatches, core: CoreArgs, factory: impl Fn() -> ProgressBar) -> Result<()> {
    let candidates = parse::candidates(factory(), matches, &core.reference)?;
    let regions = parse::workload(factory(), matches, core.regions, &core.bamfiles, &candidates)?;

    let mut sink = FileSink::genotypes(&core.saveto, &candidates.output_header())?;
    let capacity = workload::maxlen(&regions);
    let pileup = RegionPileup::new(capacity, BasicFastaReader::new(core.reference), core.policy, core.insert_size);
    let engine = HTSPileupEngine::new(core.bamfiles, pileup, core.readfilter);
    let processor = Processor::Genotyping(GenotypingProcessor::new(Arc::new(candidates)));
    let runner = PileupRunner::new(engine, processor);

    shared::run(regions, runner, factory(), &mut sink)?;
    sink.flush()
}
