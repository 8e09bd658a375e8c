use clap::ArgMatches;
use indicatif::ProgressBar;

use crate::cli::shared;
use crate::cli::shared::args::CoreArgs;
use crate::core::error::Result;
use crate::core::io::fasta::BasicFastaReader;
use crate::core::io::sink::FileSink;
use crate::core::processors::{MetricsProcessor, Processor};
use crate::core::rpileup::hts::HTSPileupEngine;
use crate::core::rpileup::pileup::RegionPileup;
use crate::core::runner::PileupRunner;
use crate::core::workload;

pub fn run(_: &ArgMatches, core: CoreArgs, factory: impl Fn() -> ProgressBar) -> Result<()> {
    let capacity = workload::maxlen(&core.regions);
    let pileup = RegionPileup::new(capacity, BasicFastaReader::new(core.reference), core.policy, core.insert_size);
    let engine = HTSPileupEngine::new(core.bamfiles, pileup, core.readfilter);
    let runner = PileupRunner::new(engine, Processor::Metrics(MetricsProcessor::new()));

    let mut sink = FileSink::metrics(&core.saveto)?;
    shared::run(core.regions, runner, factory(), &mut sink)?;
    sink.flush()
}
