use derive_getters::{Dissolve, Getters};
use rust_htslib::bam::Record;

use crate::core::error::Result;
use crate::core::io::fasta::FastaReader;
use crate::core::io::sink::RowBuffer;
use crate::core::processors::{PileupProcessor, Processor};
use crate::core::rpileup::filters::ReadsFilter;
use crate::core::rpileup::hts::HTSPileupEngine;
use crate::core::rpileup::pileup::RegionPileup;
use crate::core::rpileup::{ReadStats, ReadsCollidingEngine};
use crate::core::workload::GenomicInterval;

/// Everything produced for a single region.
#[derive(Clone, Debug, Getters, Dissolve)]
pub struct RegionReport {
    region: GenomicInterval,
    rows: RowBuffer,
    stats: ReadStats,
}

impl RegionReport {
    pub fn new(region: GenomicInterval, rows: RowBuffer, stats: ReadStats) -> Self {
        Self { region, rows, stats }
    }
}

pub trait Runner {
    fn run(&mut self, region: GenomicInterval) -> Result<RegionReport>;
}

/// Pileup engine + processor: prep_for -> add_record* -> give_view_to for every region.
pub struct PileupRunner<Ref: FastaReader, Filter> {
    engine: HTSPileupEngine<RegionPileup<Ref>, Filter>,
    processor: Processor,
}

impl<Ref, Filter> PileupRunner<Ref, Filter>
where
    Ref: FastaReader + 'static,
    Filter: ReadsFilter<Record>,
{
    pub fn new(engine: HTSPileupEngine<RegionPileup<Ref>, Filter>, processor: Processor) -> Self {
        Self { engine, processor }
    }
}

impl<Ref, Filter> Runner for PileupRunner<Ref, Filter>
where
    Ref: FastaReader + 'static,
    Filter: ReadsFilter<Record>,
{
    fn run(&mut self, region: GenomicInterval) -> Result<RegionReport> {
        let stats = self.engine.run(region.clone())?;
        self.engine.collider_mut().give_view_to(&mut self.processor)?;

        let mut rows = RowBuffer::default();
        self.processor.finalize_region(&mut rows)?;
        Ok(RegionReport { region, rows, stats })
    }
}

impl<Ref, Filter> Clone for PileupRunner<Ref, Filter>
where
    Ref: FastaReader + Clone + 'static,
    Filter: ReadsFilter<Record> + Clone,
{
    fn clone(&self) -> Self {
        Self { engine: self.engine.clone(), processor: self.processor.clone() }
    }
}
