use std::fmt::{Display, Formatter};

use bio_types::genome::AbstractInterval;
use derive_getters::Getters;

use crate::core::dna::Nucleotide;
use crate::core::error::Result;
use crate::core::io::sink::{Channel, OutputSink, RowBuffer, Table};
use crate::core::rpileup::pileup::{PositionPileup, RegionPileupView};
use crate::core::workload::GenomicInterval;

use super::PileupProcessor;

/// Coverage summary of a single region.
#[derive(Clone, PartialEq, Debug, Getters)]
pub struct IntervalMetrics {
    interval: GenomicInterval,
    length: usize,
    peak_coverage: u32,
    average_coverage: f64,
    gc_content: f64,
}

impl IntervalMetrics {
    pub fn new(interval: &GenomicInterval, positions: &[PositionPileup]) -> Self {
        let length = interval.len();
        let (mut total, mut peak, mut gc) = (0u64, 0u32, 0usize);
        for pos in positions {
            let coverage = pos.coverage();
            total += coverage as u64;
            peak = peak.max(coverage);
            gc += usize::from(Nucleotide::from(*pos.refbase()).is_gc());
        }
        let length_f = length.max(1) as f64;
        Self {
            interval: interval.clone(),
            length,
            peak_coverage: peak,
            average_coverage: total as f64 / length_f,
            gc_content: gc as f64 / length_f,
        }
    }
}

impl Display for IntervalMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.interval.contig(),
            self.interval.start(),
            self.interval.end(),
            self.interval.name(),
            self.length,
            self.peak_coverage,
            self.average_coverage,
            self.gc_content
        )
    }
}

/// Per-position pileup rows and per-region summaries, with and without duplicates.
#[derive(Clone, Default)]
pub struct MetricsProcessor {
    buffer: RowBuffer,
}

impl MetricsProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PileupProcessor for MetricsProcessor {
    fn receive(&mut self, view: &RegionPileupView) -> Result<()> {
        let interval = view.interval();
        for (channel, positions) in
            [(Channel::All, view.positions()), (Channel::Unique, view.positions_without_duplicates())]
        {
            for (offset, pos) in positions.iter().enumerate() {
                let row = format!("{}\t{}\t{}", interval.contig(), interval.start() + offset as u64, pos);
                self.buffer.write(Table::Pileup, channel, &row)?;
            }
            let summary = IntervalMetrics::new(interval, positions);
            self.buffer.write(Table::Intervals, channel, &summary.to_string())?;
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
    use crate::core::rpileup::pileup::{MismatchPolicy, RegionPileup};

    use super::*;

    #[test]
    fn metrics() {
        let reference = InMemoryFasta::new(&[("chr1", b"ACGTNACGTA")]);
        let mut pileup = RegionPileup::new(10, reference, MismatchPolicy::StrictPairAgreement, 124..=593);
        pileup.prep_for(GenomicInterval::from_1based("chr1", 2, 5, "exon")).unwrap();
        pileup.add_record(&TestRead::new("r1", "chr1", 1, vec![M(4)], b"ACGA")).unwrap();
        pileup
            .add_record(&TestRead::new("r2", "chr1", 3, vec![M(1), D(1), M(1)], b"GN").with_flags(0x1 | 0x2 | 0x400))
            .unwrap();

        let mut processor = MetricsProcessor::new();
        pileup.give_view_to(&mut processor).unwrap();
        let mut sink = RowBuffer::default();
        processor.finalize_region(&mut sink).unwrap();

        let rows = sink.rows(Table::Pileup, Channel::All).collect::<Vec<_>>();
        assert_eq!(
            rows,
            [
                "chr1\t2\tC\t1\t0\t1\t0\t0\t0\t0\t0\t0\t0\t0",
                "chr1\t3\tG\t2\t0\t0\t2\t0\t0\t0\t0\t0\t0\t0",
                "chr1\t4\tT\t2\t1\t0\t0\t0\t0\t1\t0\t0\t0\t0",
                "chr1\t5\tN\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0\t0",
            ]
        );
        let rows = sink.rows(Table::Pileup, Channel::Unique).map(|x| x.split('\t').nth(3)).collect::<Vec<_>>();
        assert_eq!(rows, [Some("1"), Some("1"), Some("1"), Some("0")]);

        let rows = sink.rows(Table::Intervals, Channel::All).collect::<Vec<_>>();
        assert_eq!(rows, ["chr1\t2\t5\texon\t4\t2\t1.25\t0.5"]);
        let rows = sink.rows(Table::Intervals, Channel::Unique).collect::<Vec<_>>();
        assert_eq!(rows, ["chr1\t2\t5\texon\t4\t1\t0.75\t0.5"]);

        // Everything was flushed
        let mut sink = RowBuffer::default();
        processor.finalize_region(&mut sink).unwrap();
        assert!(sink.is_empty());
    }
}
