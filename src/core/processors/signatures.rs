use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bio_types::genome::AbstractInterval;
use derive_getters::Getters;

use crate::core::error::{PileupError, Result};
use crate::core::io::sink::{Channel, OutputSink, RowBuffer, Table};
use crate::core::rpileup::pileup::{PositionPileup, RegionPileupView};
use crate::core::workload::GenomicInterval;

use super::PileupProcessor;

const MIN_COVERAGE: u32 = 100;
const MIN_EVIDENCE: f64 = 0.01;

/// Position-level pattern searched for in the pileup.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Signature {
    /// Many reads are hard-clipped at the same position
    TranslocationBreakpoint,
}

impl Signature {
    pub fn find(&self, interval: &GenomicInterval, positions: &[PositionPileup]) -> Vec<SignatureLocus> {
        match self {
            Signature::TranslocationBreakpoint => translocation_breakpoints(interval, positions),
        }
    }
}

impl FromStr for Signature {
    type Err = PileupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TranslocationBreakpoint" => Ok(Signature::TranslocationBreakpoint),
            _ => Err(PileupError::config(format!("Unknown signature: {}", s))),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Signature::TranslocationBreakpoint => write!(f, "TranslocationBreakpoint"),
        }
    }
}

/// Locus matching a signature. Coordinates are 1-based, inclusive.
#[derive(Clone, PartialEq, Debug, Getters)]
pub struct SignatureLocus {
    start: u64,
    end: u64,
    description: &'static str,
    clips: u32,
    coverage: u32,
}

impl SignatureLocus {
    pub fn evidence(&self) -> f64 {
        self.clips as f64 / self.coverage as f64
    }
}

fn translocation_breakpoints(interval: &GenomicInterval, positions: &[PositionPileup]) -> Vec<SignatureLocus> {
    let mut loci = Vec::new();
    for (offset, pos) in positions.iter().enumerate() {
        let coverage = pos.coverage();
        if coverage < MIN_COVERAGE {
            continue;
        }
        // Clipped sequence joins on the left of the first aligned base or on the right of the last one
        let (clips, description) = if pos.hard_clip_starts() >= pos.hard_clip_ends() {
            (*pos.hard_clip_starts(), "5' Translocation Breakpoint")
        } else {
            (*pos.hard_clip_ends(), "3' Translocation Breakpoint")
        };
        let position = interval.start() + offset as u64;
        let locus = SignatureLocus { start: position, end: position, description, clips, coverage };
        if locus.evidence() >= MIN_EVIDENCE {
            loci.push(locus);
        }
    }
    loci
}

#[derive(Clone)]
pub struct SignatureProcessor {
    sample: String,
    signatures: Vec<Signature>,
    buffer: RowBuffer,
}

impl SignatureProcessor {
    pub fn new(sample: String, signatures: Vec<Signature>) -> Self {
        Self { sample, signatures, buffer: RowBuffer::default() }
    }
}

impl PileupProcessor for SignatureProcessor {
    fn receive(&mut self, view: &RegionPileupView) -> Result<()> {
        let interval = view.interval();
        for signature in &self.signatures {
            for locus in signature.find(interval, view.positions_without_duplicates()) {
                let row = format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}/{}",
                    self.sample,
                    interval.contig(),
                    locus.start,
                    locus.end,
                    locus.description,
                    locus.evidence(),
                    locus.clips,
                    locus.coverage
                );
                self.buffer.write(Table::Signatures, Channel::All, &row)?;
            }
        }
        Ok(())
    }

    fn finalize_region(&mut self, sink: &mut impl OutputSink) -> Result<()> {
        self.buffer.replay(sink)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::io::fasta::testing::InMemoryFasta;
    use crate::core::read::testing::shortcats::*;
    use crate::core::read::testing::TestRead;
    use crate::core::rpileup::pileup::{Clip, MismatchPolicy, RegionPileup};

    use super::*;

    fn position(bases: u32, starts: u32, ends: u32) -> PositionPileup {
        let mut pos = PositionPileup::default();
        pos.reset(b'A');
        (0..bases).for_each(|_| pos.add_base(b'A'));
        (0..starts).for_each(|_| pos.add_clip_start(Clip::Hard, 30));
        (0..ends).for_each(|_| pos.add_clip_end(Clip::Hard, 30));
        pos
    }

    #[test]
    fn parse() {
        assert_eq!("TranslocationBreakpoint".parse::<Signature>().unwrap(), Signature::TranslocationBreakpoint);
        assert!("Inversion".parse::<Signature>().is_err());
    }

    #[test]
    fn translocation_breakpoints() {
        let interval = GenomicInterval::from_1based("chr1", 10, 13, "");
        let positions = [position(100, 0, 2), position(99, 50, 0), position(200, 1, 0), position(100, 3, 3)];

        let loci = Signature::TranslocationBreakpoint.find(&interval, &positions);
        assert_eq!(loci.len(), 2);
        assert_eq!((loci[0].start, loci[0].end, loci[0].description), (10, 10, "3' Translocation Breakpoint"));
        assert_eq!((loci[0].clips, loci[0].coverage), (2, 100));
        // Ties go to the clip starts
        assert_eq!((loci[1].start, loci[1].description, loci[1].clips), (13, "5' Translocation Breakpoint", 3));
    }

    #[test]
    fn processor() {
        let reference = InMemoryFasta::new(&[("chr1", b"ACGTACGTAC")]);
        let mut pileup = RegionPileup::new(10, reference, MismatchPolicy::StrictPairAgreement, 124..=593);
        pileup.prep_for(GenomicInterval::from_1based("chr1", 1, 10, "target")).unwrap();
        for i in 0..96 {
            pileup.add_record(&TestRead::new(&format!("full{}", i), "chr1", 1, vec![M(10)], b"ACGTACGTAC")).unwrap();
        }
        for i in 0..4 {
            pileup.add_record(&TestRead::new(&format!("clip{}", i), "chr1", 6, vec![H(5), M(5)], b"CGTAC")).unwrap();
        }
        // Duplicates are ignored
        let dup = TestRead::new("dup", "chr1", 6, vec![H(5), M(5)], b"CGTAC").with_flags(0x400);
        pileup.add_record(&dup).unwrap();

        let mut processor = SignatureProcessor::new("S1".into(), vec![Signature::TranslocationBreakpoint]);
        pileup.give_view_to(&mut processor).unwrap();
        let mut sink = RowBuffer::default();
        processor.finalize_region(&mut sink).unwrap();

        let rows = sink.rows(Table::Signatures, Channel::All).collect::<Vec<_>>();
        assert_eq!(rows, ["S1\tchr1\t6\t6\t5' Translocation Breakpoint\t0.04\t4/100"]);
    }
}
