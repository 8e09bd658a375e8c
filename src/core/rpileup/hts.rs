use std::path::PathBuf;

use bio_types::genome::AbstractInterval;
use rust_htslib::bam::{IndexedReader, Read, Record};

use crate::core::error::{PileupError, Result};
use crate::core::io::hts;
use crate::core::rpileup::filters::ReadsFilter;
use crate::core::rpileup::{ReadStats, ReadsCollider, ReadsCollidingEngine};
use crate::core::workload::GenomicInterval;

pub struct HTSPileupEngine<Collider, Filter> {
    collider: Collider,
    filter: Filter,
    // Opened on the first run
    htsreaders: Vec<IndexedReader>,
    htsfiles: Vec<PathBuf>,
}

impl<Collider, Filter> HTSPileupEngine<Collider, Filter>
where
    Collider: for<'a> ReadsCollider<'a, Record, Workload = GenomicInterval>,
    Filter: ReadsFilter<Record>,
{
    pub fn new(htsfiles: Vec<PathBuf>, collider: Collider, filter: Filter) -> Self {
        Self { collider, filter, htsreaders: Vec::new(), htsfiles }
    }

    fn open(&mut self) -> Result<()> {
        if self.htsreaders.len() != self.htsfiles.len() {
            self.htsreaders = self.htsfiles.iter().map(hts::open).collect::<Result<_>>()?;
        }
        Ok(())
    }
}

impl<Collider, Filter> ReadsCollidingEngine<Record, Collider> for HTSPileupEngine<Collider, Filter>
where
    Collider: for<'a> ReadsCollider<'a, Record, Workload = GenomicInterval>,
    Filter: ReadsFilter<Record>,
{
    fn run(&mut self, cwork: GenomicInterval) -> Result<ReadStats> {
        self.open()?;

        let (contig, range) = (cwork.contig().to_owned(), cwork.range());
        let region = cwork.to_string();
        // Regions without reads still produce (empty) results
        self.collider.reset(cwork)?;

        let mut stats = ReadStats::default();
        let mut record = Record::new();
        for (reader, path) in self.htsreaders.iter_mut().zip(&self.htsfiles) {
            if !reader.header().target_names().contains(&contig.as_bytes()) {
                continue;
            }
            reader.fetch((contig.as_str(), range.start, range.end)).map_err(|e| PileupError::hts(path, e))?;

            while let Some(r) = reader.read(&mut record) {
                r.map_err(|e| PileupError::hts(path, e))?;
                stats.processed += 1;
                if !self.filter.is_read_ok(&record) {
                    continue;
                }
                match self.collider.collide(&record) {
                    Ok(()) => stats.accepted += 1,
                    Err(e) if e.is_recoverable() => {
                        stats.malformed += 1;
                        tracing::warn!(region = %region, "Skipping read: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        self.collider.finalize();
        tracing::debug!(region = %region, processed = stats.processed, accepted = stats.accepted, "Region collided");
        Ok(stats)
    }

    fn collider(&self) -> &Collider {
        &self.collider
    }

    fn collider_mut(&mut self) -> &mut Collider {
        &mut self.collider
    }
}

impl<Collider, Filter> Clone for HTSPileupEngine<Collider, Filter>
where
    Collider: for<'a> ReadsCollider<'a, Record, Workload = GenomicInterval> + Clone,
    Filter: ReadsFilter<Record> + Clone,
{
    fn clone(&self) -> Self {
        Self::new(self.htsfiles.clone(), self.collider.clone(), self.filter.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::io::fasta::testing::InMemoryFasta;
    use crate::core::io::hts::testing::bam;
    use crate::core::rpileup::filters::{ByFlags, ByQuality, Sequential};
    use crate::core::rpileup::pileup::{MismatchPolicy, RegionPileup};
    use crate::core::variant::VariantID;

    use super::*;

    const CONTIGS: &[(&str, u64)] = &[("chr1", 20), ("chr2", 20)];

    fn pileup_engine(
        htsfiles: Vec<PathBuf>,
        flags: ByFlags,
    ) -> HTSPileupEngine<RegionPileup<InMemoryFasta>, Sequential<Record, ByQuality, ByFlags>> {
        let reference = InMemoryFasta::new(&[("chr1", b"ACGTACGTACGTACGTACGT"), ("chr2", b"AAAAAAAAAAAAAAAAAAAA")]);
        let pileup = RegionPileup::new(20, reference, MismatchPolicy::StrictPairAgreement, 124..=593);
        HTSPileupEngine::new(htsfiles, pileup, Sequential::new(ByQuality::new(20, true), flags))
    }

    #[test]
    fn run() {
        let dir = tempfile::tempdir().unwrap();
        let first = bam(
            dir.path(),
            "first.bam",
            CONTIGS,
            &[
                "pair\t99\tchr1\t1\t60\t10M\t=\t4\t13\tACGTTCGTAC\tIIIIIIIIII",
                "lowq\t0\tchr1\t2\t10\t5M\t*\t0\t0\tCGTAC\tIIIII",
                "pair\t147\tchr1\t4\t60\t10M\t=\t1\t-13\tTACGTACGTA\tIIIIIIIIII",
                "other\t0\tchr2\t1\t60\t5M\t*\t0\t0\tAAAAA\tIIIII",
            ],
        );
        let second = bam(
            dir.path(),
            "second.bam",
            CONTIGS,
            &["secondary\t256\tchr1\t3\t60\t5M\t*\t0\t0\tGTACG\tIIIII", "single\t0\tchr1\t5\t60\t5M\t*\t0\t0\tTCGTA\tIIIII"],
        );

        let mut engine = pileup_engine(vec![first, second], ByFlags::new(0, 2820));
        let stats = engine.run(GenomicInterval::from_1based("chr1", 1, 10, "test")).unwrap();
        assert_eq!((*stats.processed(), *stats.accepted(), *stats.malformed()), (5, 3, 0));

        let view = engine.collider().view().unwrap();
        assert_eq!(view.fragments().len(), 2);
        let coverage = view.positions().iter().map(|x| x.coverage()).collect::<Vec<_>>();
        assert_eq!(coverage, [1, 1, 1, 1, 2, 3, 3, 3, 3, 2]);

        // The second mate disagrees with the first one
        let snv = VariantID::snv("chr1", 5, b'A', b'T');
        assert_eq!(view.supporting(&snv).into_iter().collect::<Vec<_>>(), ["single"]);

        // Reusing the engine resets the collider
        let stats = engine.run(GenomicInterval::from_1based("chr2", 11, 20, "empty")).unwrap();
        assert_eq!(*stats.processed(), 0);
        let view = engine.collider().view().unwrap();
        assert!(view.fragments().is_empty());
        assert_eq!(view.positions().len(), 10);
    }

    #[test]
    fn malformed_reads_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let hts = bam(
            dir.path(),
            "unmapped.bam",
            CONTIGS,
            &["placed\t4\tchr2\t3\t60\t*\t*\t0\t0\tAAAAA\tIIIII", "mapped\t0\tchr2\t3\t60\t5M\t*\t0\t0\tAAAAA\tIIIII"],
        );

        let mut engine = pileup_engine(vec![hts], ByFlags::new(0, 0));
        let stats = engine.run(GenomicInterval::from_1based("chr2", 1, 10, "test")).unwrap();
        assert_eq!((*stats.processed(), *stats.accepted(), *stats.malformed()), (2, 1, 1));
        assert_eq!(engine.collider().view().unwrap().fragments().len(), 1);
    }

    #[test]
    fn fatal_errors() {
        let dir = tempfile::tempdir().unwrap();
        let hts = bam(dir.path(), "empty.bam", CONTIGS, &[]);

        let mut engine = pileup_engine(vec![hts], ByFlags::new(0, 0));
        let result = engine.run(GenomicInterval::from_1based("chr1", 1, 21, "test"));
        assert!(matches!(result, Err(PileupError::RegionTooLong { .. })));

        let mut engine = pileup_engine(vec![dir.path().join("missing.bam")], ByFlags::new(0, 0));
        let result = engine.run(GenomicInterval::from_1based("chr1", 1, 10, "test"));
        assert!(matches!(result, Err(PileupError::Hts { .. })));
    }
}
