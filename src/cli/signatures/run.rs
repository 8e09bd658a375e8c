use clap::ArgMatches;
use indicatif::ProgressBar;

use crate::cli::shared;
use crate::cli::shared::args::CoreArgs;
use crate::core::error::Result;
use crate::core::io::fasta::BasicFastaReader;
use crate::core::io::sink::FileSink;
use crate::core::processors::{Processor, SignatureProcessor};
use crate::core::rpileup::hts::HTSPileupEngine;
use crate::core::rpileup::pileup::RegionPileup;
use crate::core::runner::PileupRunner;
use crate::core::workload;

use super::args;

pub fn run(matches: &ArgMatches, core: CoreArgs, factory: impl Fn() -> ProgressBar) -> Result<()> {
    let signatures = args::signatures(factory(), matches)?;

    let capacity = workload::maxlen(&core.regions);
    let pileup = RegionPileup::new(capacity, BasicFastaReader::new(core.reference), core.policy, core.insert_size);
    let engine = HTSPileupEngine::new(core.bamfiles, pileup, core.readfilter);
    let processor = Processor::Signatures(SignatureProcessor::new(core.name, signatures));
    let runner = PileupRunner::new(engine, processor);

    let mut sink = FileSink::signatures(&core.saveto)?;
    shared::run(core.regions, runner, factory(), &mut sink)?;
    sink.flush()
}
