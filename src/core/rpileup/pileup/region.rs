use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::RangeInclusive;

use bio_types::genome::AbstractInterval;
use rust_htslib::bam::record::Cigar;

use crate::core::dna::Nucleotide;
use crate::core::error::{PileupError, Result};
use crate::core::io::fasta::FastaReader;
use crate::core::processors::PileupProcessor;
use crate::core::read::AlignedRead;
use crate::core::rpileup::ReadsCollider;
use crate::core::variant::{EventType, VariantID};
use crate::core::workload::GenomicInterval;

use super::fragment::{Fragment, MismatchPolicy};
use super::position::{Clip, PositionPileup};
use super::view::RegionPileupView;

#[derive(Clone, Copy, Default)]
struct MateFlags {
    unmapped: bool,
    distance_unexpected: bool,
}

/// Region-scoped pileup aggregator.
///
/// Position buffers are allocated once for the largest region of the run and reused afterwards:
/// `prep_for` only resets the first `interval.len()` positions and moves the valid-length marker.
#[derive(Clone)]
pub struct RegionPileup<Ref: FastaReader> {
    reference: Ref,
    policy: MismatchPolicy,
    insert_size: RangeInclusive<u64>,

    region: Option<GenomicInterval>,
    refseq: Vec<u8>,
    positions: Vec<PositionPileup>,
    unique: Vec<PositionPileup>,
    valid: usize,

    fragments: HashMap<String, Fragment>,
    genotypes: HashMap<VariantID, HashSet<String>>,
    // SNV -> recorded MNVs that contain it
    mnvs: HashMap<VariantID, Vec<VariantID>>,
    finalized: bool,

    // Scratch buffers for the current match/mismatch run
    runref: Vec<u8>,
    runalt: Vec<u8>,
}

impl<Ref: FastaReader> RegionPileup<Ref> {
    pub fn new(capacity: usize, reference: Ref, policy: MismatchPolicy, insert_size: RangeInclusive<u64>) -> Self {
        Self {
            reference,
            policy,
            insert_size,
            region: None,
            refseq: Vec::with_capacity(capacity),
            positions: vec![PositionPileup::default(); capacity],
            unique: vec![PositionPileup::default(); capacity],
            valid: 0,
            fragments: HashMap::new(),
            genotypes: HashMap::new(),
            mnvs: HashMap::new(),
            finalized: false,
            runref: Vec::new(),
            runalt: Vec::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn prep_for(&mut self, interval: GenomicInterval) -> Result<()> {
        let length = interval.len();
        if length > self.capacity() {
            return Err(PileupError::RegionTooLong {
                region: interval.to_string(),
                length,
                capacity: self.capacity(),
            });
        }

        self.reference.fetch(interval.contig(), interval.range())?;
        self.refseq.clear();
        self.refseq.extend_from_slice(self.reference.result());
        if self.refseq.len() != length {
            return Err(PileupError::ReferenceFetch {
                contig: interval.contig().to_owned(),
                start: interval.start(),
                end: interval.end(),
            });
        }

        for (ind, refnuc) in self.refseq.iter().enumerate() {
            self.positions[ind].reset(*refnuc);
            self.unique[ind].reset(*refnuc);
        }
        self.valid = length;

        self.fragments.clear();
        self.genotypes.clear();
        self.mnvs.clear();
        self.finalized = false;
        self.region = Some(interval);
        Ok(())
    }

    pub fn add_record<R: AlignedRead>(&mut self, read: &R) -> Result<()> {
        let region = self.region.as_ref().ok_or_else(|| PileupError::config("Pileup must be primed before use"))?;
        let name = std::str::from_utf8(read.name()).map_err(|_| {
            PileupError::malformed(String::from_utf8_lossy(read.name()), region.to_string(), "read name is not UTF-8")
        })?;
        let malformed = |reason: String| PileupError::malformed(name, region.to_string(), reason);

        if read.contig() != region.contig() {
            return Err(malformed(format!("read is mapped to {}", read.contig())));
        }
        let cigar = read.cigar();
        let seq = read.seq();
        let qual = read.qual();
        validate(&cigar, &seq, qual).map_err(malformed)?;

        let duplicate = read.is_duplicate();
        let mate = self.mate_flags(read);

        let (start, end) = (read.pos() + 1, cigar.end_pos());
        if start < 1 || end < start {
            return Err(malformed(format!("invalid alignment span {}-{}", start, end)));
        }

        let deletions = self.deleted_bases(read.pos(), &cigar)?;
        let variants = self.walk(read.pos(), &cigar, &seq, qual, duplicate, mate, deletions)?;

        let fragment = self.fragments.entry(name.to_owned()).or_insert_with(|| Fragment::new(duplicate));
        let mapped = fragment.add(read.contig(), start as u64, end as u64);
        for v in variants {
            mapped.add(v);
        }
        self.finalized = false;
        Ok(())
    }

    /// Rebuilds the variant -> supporting fragments map. No-op if nothing changed since the last call.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.genotypes.clear();
        self.mnvs.clear();

        for (id, fragment) in &self.fragments {
            for variant in fragment.variants(self.policy) {
                match self.genotypes.get_mut(variant) {
                    Some(ids) => {
                        ids.insert(id.clone());
                    }
                    None => {
                        self.genotypes.insert(variant.clone(), HashSet::from([id.clone()]));
                    }
                }
            }
        }

        for mnv in self.genotypes.keys().filter(|x| *x.etype() == EventType::MNV) {
            for snv in mnv.constituents() {
                self.mnvs.entry(snv).or_default().push(mnv.clone());
            }
        }
        self.finalized = true;
    }

    pub fn view(&self) -> Option<RegionPileupView<'_>> {
        let region = self.region.as_ref()?;
        Some(RegionPileupView::new(
            region,
            &self.refseq,
            &self.positions[..self.valid],
            &self.unique[..self.valid],
            &self.fragments,
            &self.genotypes,
            &self.mnvs,
        ))
    }

    pub fn give_view_to(&mut self, consumer: &mut impl PileupProcessor) -> Result<()> {
        self.finalize();
        let view = self.view().ok_or_else(|| PileupError::config("Pileup must be primed before use"))?;
        consumer.receive(&view)
    }

    fn mate_flags<R: AlignedRead>(&self, read: &R) -> MateFlags {
        if !read.is_paired() {
            return MateFlags::default();
        }
        if read.is_mate_unmapped() {
            MateFlags { unmapped: true, distance_unexpected: false }
        } else if !read.is_proper_pair() {
            MateFlags { unmapped: false, distance_unexpected: true }
        } else {
            let distance_unexpected = !self.insert_size.contains(&read.insert_size().unsigned_abs());
            MateFlags { unmapped: false, distance_unexpected }
        }
    }

    /// Reference bases, anchor included, of every deletion the walk is going to record.
    /// Deletions running past the region are fetched here so that a failure leaves the pileup untouched.
    fn deleted_bases(&mut self, pos: i64, cigar: &[Cigar]) -> Result<VecDeque<Vec<u8>>> {
        let region = self.region.as_ref().ok_or_else(|| PileupError::config("Pileup must be primed before use"))?;
        let (contig, offset) = (region.contig(), region.range().start);
        let valid = self.valid as i64;

        let mut result = VecDeque::new();
        let mut pileup = pos - offset as i64;
        for op in cigar {
            match *op {
                Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) | Cigar::RefSkip(len) => pileup += len as i64,
                Cigar::Del(len) => {
                    if pileup > 0 && pileup < valid {
                        let anchor = pileup as usize - 1;
                        let last = anchor + len as usize;
                        let bases = if last < self.refseq.len() {
                            self.refseq[anchor..=last].to_vec()
                        } else {
                            let start = offset + anchor as u64;
                            self.reference.fetch(contig, start..(start + len as u64 + 1))?;
                            self.reference.result().to_vec()
                        };
                        result.push_back(bases);
                    }
                    pileup += len as i64;
                }
                Cigar::Ins(_) | Cigar::SoftClip(_) | Cigar::HardClip(_) | Cigar::Pad(_) => {}
            }
        }
        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &mut self,
        pos: i64,
        cigar: &[Cigar],
        seq: &[u8],
        qual: &[u8],
        duplicate: bool,
        mate: MateFlags,
        mut deletions: VecDeque<Vec<u8>>,
    ) -> Result<Vec<VariantID>> {
        let Self { region, refseq, positions, unique, valid, runref, runalt, .. } = self;
        let region = region.as_ref().ok_or_else(|| PileupError::config("Pileup must be primed before use"))?;
        let (contig, offset) = (region.contig(), region.range().start);
        let valid = *valid as i64;
        let inside = |p: i64| p >= 0 && p < valid;

        let mut variants = Vec::new();
        let mut pileup = pos - offset as i64;
        let mut readind = 0usize;
        let mut aligned = false;

        for op in cigar {
            match *op {
                Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
                    runref.clear();
                    runalt.clear();
                    let mut first = None;
                    for _ in 0..len {
                        if inside(pileup) {
                            let (ind, base) = (pileup as usize, seq[readind]);
                            positions[ind].add_base(base);
                            if !duplicate {
                                unique[ind].add_base(base);
                            }
                            first.get_or_insert(ind);
                            runref.push(refseq[ind]);
                            runalt.push(base.to_ascii_uppercase());
                        }
                        pileup += 1;
                        readind += 1;
                    }
                    if let Some(first) = first {
                        substitutions(contig, offset + first as u64 + 1, runref, runalt, &mut variants);
                    }
                    aligned = true;
                }
                Cigar::Ins(len) => {
                    if pileup > 0 && pileup < valid {
                        let ind = pileup as usize;
                        positions[ind].add_insertion(len);
                        if !duplicate {
                            unique[ind].add_insertion(len);
                        }
                        let inserted = &seq[readind..readind + len as usize];
                        let anchor = ind - 1;
                        variants.push(VariantID::insertion(contig, offset + anchor as u64 + 1, refseq[anchor], inserted));
                    }
                    readind += len as usize;
                    aligned = true;
                }
                Cigar::Del(len) => {
                    if pileup > 0 && pileup < valid {
                        let anchor = pileup as usize - 1;
                        let refbases = deletions
                            .pop_front()
                            .ok_or_else(|| PileupError::config("Deletion bases must be fetched before the walk"))?;
                        variants.push(VariantID::deletion(contig, offset + anchor as u64 + 1, &refbases));
                    }
                    for _ in 0..len {
                        if inside(pileup) {
                            let ind = pileup as usize;
                            positions[ind].add_deletion(mate.unmapped, mate.distance_unexpected);
                            if !duplicate {
                                unique[ind].add_deletion(mate.unmapped, mate.distance_unexpected);
                            }
                        }
                        pileup += 1;
                    }
                    aligned = true;
                }
                Cigar::SoftClip(len) | Cigar::HardClip(len) => {
                    let (clip, len) = match op {
                        Cigar::SoftClip(_) => (Clip::Soft, len as i64),
                        _ => (Clip::Hard, len as i64),
                    };
                    if !aligned {
                        // Clipped before the first aligned base
                        let quality = match clip {
                            Clip::Soft => qual[readind + len as usize],
                            Clip::Hard => qual[0],
                        };
                        if inside(pileup) {
                            positions[pileup as usize].add_clip_start(clip, quality);
                            if !duplicate {
                                unique[pileup as usize].add_clip_start(clip, quality);
                            }
                        }
                        for ind in (pileup - len..pileup).filter(|x| inside(*x)) {
                            positions[ind as usize].add_clip(clip);
                            if !duplicate {
                                unique[ind as usize].add_clip(clip);
                            }
                        }
                    } else {
                        // Clipped after the last aligned base
                        let quality = match clip {
                            Clip::Soft => qual[readind - 1],
                            Clip::Hard => qual[qual.len() - 1],
                        };
                        if inside(pileup - 1) {
                            positions[pileup as usize - 1].add_clip_end(clip, quality);
                            if !duplicate {
                                unique[pileup as usize - 1].add_clip_end(clip, quality);
                            }
                        }
                        for ind in (pileup..pileup + len).filter(|x| inside(*x)) {
                            positions[ind as usize].add_clip(clip);
                            if !duplicate {
                                unique[ind as usize].add_clip(clip);
                            }
                        }
                    }
                    if clip == Clip::Soft {
                        readind += len as usize;
                    }
                }
                Cigar::RefSkip(len) => pileup += len as i64,
                Cigar::Pad(_) => {}
            }
        }
        Ok(variants)
    }
}

/// Checks that every index the walk is going to touch exists.
fn validate(cigar: &[Cigar], seq: &[u8], qual: &[u8]) -> std::result::Result<(), String> {
    if seq.is_empty() {
        return Err("read has no sequence".into());
    }
    if qual.len() != seq.len() {
        return Err(format!("{} base qualities for {} bases", qual.len(), seq.len()));
    }

    let mut readind = 0usize;
    let mut aligned = false;
    for op in cigar {
        match *op {
            Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) | Cigar::Ins(len) => {
                readind += len as usize;
                aligned = true;
            }
            Cigar::Del(_) => aligned = true,
            Cigar::SoftClip(len) => {
                let len = len as usize;
                if !aligned && readind + len >= seq.len() {
                    return Err("soft clip covers the whole read".into());
                }
                if aligned && readind == 0 {
                    return Err("soft clip without aligned bases".into());
                }
                readind += len;
            }
            Cigar::HardClip(_) | Cigar::RefSkip(_) | Cigar::Pad(_) => {}
        }
    }
    if !aligned {
        return Err("no aligned bases".into());
    }
    if readind != seq.len() {
        return Err(format!("CIGAR consumes {} bases, but the read has {}", readind, seq.len()));
    }
    Ok(())
}

/// Splits a match/mismatch run into SNVs and MNVs. Matches and N calls break the run.
fn substitutions(contig: &str, first: u64, refbases: &[u8], altbases: &[u8], saveto: &mut Vec<VariantID>) {
    let mismatch = |i: usize| {
        Nucleotide::from(altbases[i]) != Nucleotide::Unknown && !altbases[i].eq_ignore_ascii_case(&refbases[i])
    };

    let mut ind = 0;
    while ind < altbases.len() {
        if !mismatch(ind) {
            ind += 1;
            continue;
        }
        let start = ind;
        while ind < altbases.len() && mismatch(ind) {
            ind += 1;
        }
        saveto.push(VariantID::substitution(
            contig,
            first + start as u64,
            &refbases[start..ind],
            &altbases[start..ind],
        ));
    }
}

impl<'a, R: AlignedRead, Ref: FastaReader + 'a> ReadsCollider<'a, R> for RegionPileup<Ref> {
    type ColliderResult = Option<RegionPileupView<'a>>;
    type Workload = GenomicInterval;

    fn reset(&mut self, info: Self::Workload) -> Result<()> {
        self.prep_for(info)
    }

    fn collide(&mut self, read: &R) -> Result<()> {
        self.add_record(read)
    }

    fn finalize(&mut self) {
        RegionPileup::finalize(self)
    }

    fn result(&'a self) -> Self::ColliderResult {
        self.view()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::io::fasta::testing::InMemoryFasta;
    use crate::core::read::testing::shortcats::*;
    use crate::core::read::testing::TestRead;

    use super::*;

    const REF: &[u8] = b"ACGTACGTACGTACGTACGT";

    fn pileup(policy: MismatchPolicy) -> RegionPileup<InMemoryFasta> {
        let reference = InMemoryFasta::new(&[("1", REF), ("2", b"AAAAAAAAAA")]);
        RegionPileup::new(20, reference, policy, 124..=593)
    }

    fn primed(contig: &str, start: u64, end: u64) -> RegionPileup<InMemoryFasta> {
        let mut pileup = pileup(MismatchPolicy::StrictPairAgreement);
        pileup.prep_for(GenomicInterval::from_1based(contig, start, end, "test")).unwrap();
        pileup
    }

    fn genotypes(pileup: &mut RegionPileup<InMemoryFasta>) -> HashMap<VariantID, usize> {
        pileup.finalize();
        pileup.genotypes.iter().map(|(k, v)| (k.clone(), v.len())).collect()
    }

    #[test]
    fn single_mismatch() {
        let mut pileup = primed("2", 1, 10);
        let read = TestRead::new("r1", "2", 1, vec![M(10)], b"AAAATAAAAA");
        pileup.add_record(&read).unwrap();

        let view = pileup.view().unwrap();
        let pos = &view.positions()[4];
        assert_eq!((pos.count(b'T'), pos.count(b'A'), pos.coverage()), (Some(1), Some(0), 1));
        assert_eq!(view.positions().iter().map(|x| x.coverage()).sum::<u32>(), 10);

        let expected = HashMap::from([(VariantID::snv("2", 5, b'A', b'T'), 1)]);
        assert_eq!(genotypes(&mut pileup), expected);
    }

    #[test]
    fn duplicates() {
        let mut pileup = primed("2", 1, 10);
        pileup.add_record(&TestRead::new("r1", "2", 1, vec![M(5)], b"AAAAA")).unwrap();
        pileup.add_record(&TestRead::new("r2", "2", 3, vec![M(5)], b"AAAAA").with_flags(0x1 | 0x2 | 0x400)).unwrap();

        let view = pileup.view().unwrap();
        let all = view.positions().iter().map(|x| x.coverage()).collect::<Vec<_>>();
        let unique = view.positions_without_duplicates().iter().map(|x| x.coverage()).collect::<Vec<_>>();
        assert_eq!(all, [1, 1, 2, 2, 2, 1, 1, 0, 0, 0]);
        assert_eq!(unique, [1, 1, 1, 1, 1, 0, 0, 0, 0, 0]);
        assert!(*view.fragments()["r2"].duplicate());
        assert!(!*view.fragments()["r1"].duplicate());
    }

    #[test]
    fn insertion() {
        let mut pileup = primed("1", 1, 10);
        // ACGT|GG|ACGT
        let read = TestRead::new("r1", "1", 1, vec![M(4), I(2), M(4)], b"ACGTGGACGT");
        pileup.add_record(&read).unwrap();

        let view = pileup.view().unwrap();
        assert_eq!(view.positions()[4].count(b'I'), Some(1));
        assert_eq!(view.positions().iter().map(|x| x.insertions()).sum::<u32>(), 1);

        let expected = VariantID::insertion("1", 4, b'T', b"GG");
        assert_eq!((expected.refbases().as_slice(), expected.altbases().as_slice()), (&b"T"[..], &b"TGG"[..]));
        assert_eq!(genotypes(&mut pileup), HashMap::from([(expected, 1)]));
    }

    #[test]
    fn deletion() {
        let mut pileup = primed("1", 1, 10);
        // ACG--CGTAC
        let read = TestRead::new("r1", "1", 1, vec![M(3), D(2), M(5)], b"ACGCGTAC");
        pileup.add_record(&read).unwrap();

        let view = pileup.view().unwrap();
        let deletions = view.positions().iter().map(|x| *x.deletions()).collect::<Vec<_>>();
        assert_eq!(deletions, [0, 0, 0, 1, 1, 0, 0, 0, 0, 0]);
        assert!(view.positions().iter().all(|x| x.coverage() == 1));

        assert_eq!(genotypes(&mut pileup), HashMap::from([(VariantID::deletion("1", 3, b"GTA"), 1)]));
    }

    #[test]
    fn deletion_beyond_region() {
        let mut pileup = primed("1", 1, 5);
        let read = TestRead::new("r1", "1", 1, vec![M(4), D(3), M(3)], b"ACGTTAC");
        pileup.add_record(&read).unwrap();

        assert_eq!(genotypes(&mut pileup), HashMap::from([(VariantID::deletion("1", 4, b"TACG"), 1)]));
        let view = pileup.view().unwrap();
        assert_eq!(view.positions()[4].count(b'D'), Some(1));
    }

    #[test]
    fn deletion_past_contig_end_leaves_pileup_untouched() {
        let mut pileup = primed("2", 1, 10);
        let read = TestRead::new("r1", "2", 8, vec![M(2), D(5), M(1)], b"AAA");
        assert!(matches!(pileup.add_record(&read), Err(PileupError::ReferenceFetch { .. })));

        let view = pileup.view().unwrap();
        assert!(view.positions().iter().all(|x| x.coverage() == 0));
        assert!(view.positions_without_duplicates().iter().all(|x| x.coverage() == 0));
        assert!(view.fragments().is_empty());
    }

    #[test]
    fn indels_at_region_start_are_not_anchored() {
        let mut pileup = primed("1", 5, 10);
        // Insertion right before the region start, deletion anchored on its last base
        let read = TestRead::new("r1", "1", 1, vec![M(4), I(1), M(2), D(1), M(3)], b"ACGTTACTAC");
        pileup.add_record(&read).unwrap();

        let expected = HashMap::from([(VariantID::deletion("1", 6, b"CG"), 1)]);
        assert_eq!(genotypes(&mut pileup), expected);
        let view = pileup.view().unwrap();
        assert_eq!(view.positions().iter().map(|x| x.insertions()).sum::<u32>(), 0);
    }

    #[test]
    fn substitution_runs() {
        let mut pileup = primed("2", 1, 10);
        let read = TestRead::new("r1", "2", 1, vec![M(10)], b"AACCAATANA");
        pileup.add_record(&read).unwrap();

        let expected = HashMap::from([
            (VariantID::substitution("2", 3, b"AA", b"CC"), 1),
            (VariantID::snv("2", 7, b'A', b'T'), 1),
        ]);
        assert_eq!(genotypes(&mut pileup), expected);

        let view = pileup.view().unwrap();
        assert_eq!(view.positions()[8].bases()[4], 1);
        assert_eq!(view.positions()[8].coverage(), 0);
    }

    #[test]
    fn read_outside_window() {
        let mut pileup = primed("1", 5, 10);
        let read = TestRead::new("r1", "1", 1, vec![M(12)], b"ACGTACGTACGT");
        pileup.add_record(&read).unwrap();

        let view = pileup.view().unwrap();
        assert_eq!(view.positions().len(), 6);
        assert!(view.positions().iter().all(|x| x.coverage() == 1));
        assert!(genotypes(&mut pileup).is_empty());
    }

    #[test]
    fn clips() {
        let mut pileup = primed("1", 1, 12);
        let qual = (0..10).map(|x| x * 10).collect::<Vec<u8>>();

        let read = TestRead::new("r1", "1", 3, vec![S(2), M(8)], b"TTGTACGTAC").with_qual(qual.clone());
        pileup.add_record(&read).unwrap();
        let read = TestRead::new("r2", "1", 1, vec![M(8), S(2)], b"ACGTACGTTT").with_qual(qual.clone());
        pileup.add_record(&read).unwrap();
        let read = TestRead::new("r3", "1", 4, vec![H(3), M(7), H(5)], b"TACGTAC").with_qual(qual[..7].to_vec());
        pileup.add_record(&read).unwrap();

        let view = pileup.view().unwrap();
        let pos = view.positions();
        assert_eq!((*pos[2].soft_clip_starts(), *pos[2].soft_clip_start_quals()), (1, 20));
        assert_eq!((*pos[0].soft_clips(), *pos[1].soft_clips(), *pos[2].soft_clips()), (1, 1, 0));

        assert_eq!((*pos[7].soft_clip_ends(), *pos[7].soft_clip_end_quals()), (1, 70));
        assert_eq!((*pos[8].soft_clips(), *pos[9].soft_clips(), *pos[10].soft_clips()), (1, 1, 0));

        assert_eq!((*pos[3].hard_clip_starts(), *pos[3].hard_clip_start_quals()), (1, 0));
        assert_eq!((*pos[9].hard_clip_ends(), *pos[9].hard_clip_end_quals()), (1, 60));
        assert_eq!(pos.iter().map(|x| *x.hard_clips()).collect::<Vec<_>>(), [1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn mate_flags() {
        let mut pileup = primed("1", 1, 10);
        let reads = [
            TestRead::new("proper", "1", 1, vec![M(2), D(1), M(2)], b"ACTA"),
            TestRead::new("unmapped", "1", 1, vec![M(2), D(1), M(2)], b"ACTA").with_flags(0x1 | 0x8),
            TestRead::new("improper", "1", 1, vec![M(2), D(1), M(2)], b"ACTA").with_flags(0x1),
            TestRead::new("far", "1", 1, vec![M(2), D(1), M(2)], b"ACTA").with_insert_size(-1000),
            TestRead::new("single", "1", 1, vec![M(2), D(1), M(2)], b"ACTA").with_flags(0),
        ];
        for read in &reads {
            pileup.add_record(read).unwrap();
        }

        let view = pileup.view().unwrap();
        let pos = &view.positions()[2];
        assert_eq!((*pos.deletions(), *pos.mate_unmapped(), *pos.mate_distance_unexpected()), (5, 1, 2));
    }

    #[test]
    fn malformed_records_are_isolated() {
        let mut pileup = primed("1", 1, 10);
        let before = pileup.positions.clone();

        let reads = [
            TestRead::new("short", "1", 1, vec![M(10)], b"ACGTACGTA"),
            TestRead::new("noqual", "1", 1, vec![M(4)], b"ACGT").with_qual(vec![]),
            TestRead::new("clipped", "1", 1, vec![S(4)], b"ACGT"),
            TestRead::new("contig", "2", 1, vec![M(4)], b"ACGT"),
        ];
        for read in &reads {
            let result = pileup.add_record(read);
            assert!(matches!(result, Err(PileupError::MalformedRecord { .. })), "{:?}", read);
        }
        assert_eq!(pileup.positions, before);
        assert!(pileup.fragments.is_empty());
    }

    #[test]
    fn region_too_long() {
        let mut pileup = pileup(MismatchPolicy::StrictPairAgreement);
        let result = pileup.prep_for(GenomicInterval::from_1based("1", 1, 21, "long"));
        assert!(matches!(result, Err(PileupError::RegionTooLong { length: 21, capacity: 20, .. })));
    }

    #[test]
    fn unknown_contig() {
        let mut pileup = pileup(MismatchPolicy::StrictPairAgreement);
        let result = pileup.prep_for(GenomicInterval::from_1based("X", 1, 5, "missing"));
        assert!(matches!(result, Err(PileupError::ReferenceFetch { .. })));
    }

    #[test]
    fn prep_for_is_idempotent() {
        let mut pileup = primed("1", 1, 10);
        pileup.add_record(&TestRead::new("r1", "1", 1, vec![M(10)], b"ACGTTCGTAC")).unwrap();

        let region = GenomicInterval::from_1based("1", 3, 12, "again");
        pileup.prep_for(region.clone()).unwrap();
        let first = pileup.positions[..pileup.valid].to_vec();
        pileup.prep_for(region).unwrap();
        assert_eq!(pileup.positions[..pileup.valid], first);
        assert!(first.iter().all(|x| x.coverage() == 0));
        assert_eq!(first.iter().map(|x| *x.refbase()).collect::<Vec<_>>(), b"GTACGTACGT");
        assert!(genotypes(&mut pileup).is_empty());
    }

    #[test]
    fn mates_reconciliation() {
        let mates = [
            TestRead::new("frag", "2", 1, vec![M(10)], b"AAAAAATAAA"),
            TestRead::new("frag", "2", 3, vec![M(8)], b"AAAAAAAA"),
        ];

        let mut strict = pileup(MismatchPolicy::StrictPairAgreement);
        let mut relaxed = pileup(MismatchPolicy::DropAmbiguous);
        for pileup in [&mut strict, &mut relaxed] {
            pileup.prep_for(GenomicInterval::from_1based("2", 1, 10, "test")).unwrap();
            for read in &mates {
                pileup.add_record(read).unwrap();
            }
        }

        assert!(genotypes(&mut strict).is_empty());
        assert_eq!(genotypes(&mut relaxed), HashMap::from([(VariantID::snv("2", 7, b'A', b'T'), 1)]));
        assert_eq!(strict.fragments["frag"].reads().len(), 2);
    }

    #[test]
    fn finalize_after_more_records() {
        let mut pileup = primed("2", 1, 10);
        pileup.add_record(&TestRead::new("r1", "2", 1, vec![M(3)], b"ATA")).unwrap();
        assert_eq!(genotypes(&mut pileup).len(), 1);

        pileup.add_record(&TestRead::new("r2", "2", 1, vec![M(3)], b"ATA")).unwrap();
        assert_eq!(genotypes(&mut pileup), HashMap::from([(VariantID::snv("2", 2, b'A', b'T'), 2)]));
    }
}
