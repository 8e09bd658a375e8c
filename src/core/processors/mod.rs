pub use genotyping::GenotypingProcessor;
pub use metrics::MetricsProcessor;
pub use signatures::{Signature, SignatureProcessor};

use crate::core::error::Result;
use crate::core::io::sink::OutputSink;
use crate::core::rpileup::pileup::RegionPileupView;

pub mod genotyping;
pub mod metrics;
pub mod signatures;

/// Consumer of finalized region pileups.
pub trait PileupProcessor {
    // Called once per region, the view is gone after the call
    fn receive(&mut self, view: &RegionPileupView) -> Result<()>;
    // Flush everything produced for the last received region
    fn finalize_region(&mut self, sink: &mut impl OutputSink) -> Result<()>;
}

/// Processor selected once at startup by the subcommand.
#[derive(Clone)]
pub enum Processor {
    Metrics(MetricsProcessor),
    Genotyping(GenotypingProcessor),
    Signatures(SignatureProcessor),
}

impl PileupProcessor for Processor {
    fn receive(&mut self, view: &RegionPileupView) -> Result<()> {
        match self {
            Processor::Metrics(x) => x.receive(view),
            Processor::Genotyping(x) => x.receive(view),
            Processor::Signatures(x) => x.receive(view),
        }
    }

    fn finalize_region(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        match self {
            Processor::Metrics(x) => x.finalize_region(sink),
            Processor::Genotyping(x) => x.finalize_region(sink),
            Processor::Signatures(x) => x.finalize_region(sink),
        }
    }
}
