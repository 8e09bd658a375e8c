use std::collections::{HashMap, HashSet};

use bio_types::genome::AbstractInterval;

use crate::core::variant::{EventType, VariantID};
use crate::core::workload::GenomicInterval;

use super::fragment::Fragment;
use super::position::PositionPileup;

/// Read-only snapshot of a finalized region pileup.
#[derive(Clone, Copy)]
pub struct RegionPileupView<'a> {
    interval: &'a GenomicInterval,
    reference: &'a [u8],
    positions: &'a [PositionPileup],
    unique: &'a [PositionPileup],
    fragments: &'a HashMap<String, Fragment>,
    genotypes: &'a HashMap<VariantID, HashSet<String>>,
    mnvs: &'a HashMap<VariantID, Vec<VariantID>>,
}

impl<'a> RegionPileupView<'a> {
    pub fn new(
        interval: &'a GenomicInterval,
        reference: &'a [u8],
        positions: &'a [PositionPileup],
        unique: &'a [PositionPileup],
        fragments: &'a HashMap<String, Fragment>,
        genotypes: &'a HashMap<VariantID, HashSet<String>>,
        mnvs: &'a HashMap<VariantID, Vec<VariantID>>,
    ) -> Self {
        debug_assert_eq!(positions.len(), interval.len());
        debug_assert_eq!(unique.len(), interval.len());
        Self { interval, reference, positions, unique, fragments, genotypes, mnvs }
    }

    pub fn interval(&self) -> &'a GenomicInterval {
        self.interval
    }

    pub fn reference(&self) -> &'a [u8] {
        self.reference
    }

    pub fn positions(&self) -> &'a [PositionPileup] {
        self.positions
    }

    pub fn positions_without_duplicates(&self) -> &'a [PositionPileup] {
        self.unique
    }

    pub fn fragments(&self) -> &'a HashMap<String, Fragment> {
        self.fragments
    }

    /// Variants that survived the mismatch policy, with their supporting fragments.
    pub fn genotypes(&self) -> &'a HashMap<VariantID, HashSet<String>> {
        self.genotypes
    }

    /// Index of a 1-based position inside the view
    pub fn index(&self, contig: &str, position: u64) -> Option<usize> {
        if contig != self.interval.contig() || position < self.interval.start() || position > self.interval.end() {
            return None;
        }
        Some((position - self.interval.start()) as usize)
    }

    /// True if the whole variant lies within the region.
    pub fn contains(&self, variant: &VariantID) -> bool {
        variant.is_within(self.interval.contig(), self.interval.start(), self.interval.end())
    }

    fn direct(&self, variant: &VariantID) -> impl Iterator<Item = &'a str> {
        self.genotypes.get(variant).into_iter().flat_map(|x| x.iter().map(String::as_str))
    }

    /// Fragments supporting the variant.
    ///
    /// Substitutions are matched through decomposition: an SNV is supported by every fragment with that exact SNV
    /// or with an MNV containing it, while an MNV needs the support of all its SNVs.
    pub fn supporting(&self, variant: &VariantID) -> HashSet<&'a str> {
        match variant.etype() {
            EventType::SNV => {
                let mut result: HashSet<&'a str> = self.direct(variant).collect();
                if let Some(mnvs) = self.mnvs.get(variant) {
                    for mnv in mnvs {
                        result.extend(self.direct(mnv));
                    }
                }
                result
            }
            EventType::MNV => {
                let mut snvs = variant.constituents().into_iter();
                let first = match snvs.next() {
                    Some(x) => self.supporting(&x),
                    None => return HashSet::new(),
                };
                snvs.fold(first, |acc, snv| {
                    let support = self.supporting(&snv);
                    acc.into_iter().filter(|x| support.contains(x)).collect()
                })
            }
            EventType::Insertion | EventType::Deletion => self.direct(variant).collect(),
        }
    }

    /// Number of non-duplicate fragments among the given ones.
    pub fn unique(&self, ids: &HashSet<&str>) -> usize {
        ids.iter().filter(|x| self.fragments.get(**x).map_or(false, |f| !*f.duplicate())).count()
    }

    /// Fragments that span [start, end] (1-based, inclusive) with their mates: (all, non-duplicate).
    pub fn spanning(&self, contig: &str, start: u64, end: u64) -> (usize, usize) {
        self.fragments.values().filter(|x| x.spans(contig, start, end)).fold((0, 0), |(all, unique), x| {
            (all + 1, unique + usize::from(!*x.duplicate()))
        })
    }
}
