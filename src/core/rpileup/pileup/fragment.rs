use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use derive_getters::Getters;
use itertools::Itertools;

use crate::core::variant::VariantID;

/// How to reconcile variants reported by different mates of the same fragment.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum MismatchPolicy {
    /// Every mate overlapping the variant must report it. Ambiguous alleles are exempt.
    StrictPairAgreement,
    /// Keep everything except ambiguous alleles.
    DropAmbiguous,
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(MismatchPolicy::StrictPairAgreement),
            "1" => Ok(MismatchPolicy::DropAmbiguous),
            _ => Err(format!("Unknown read pair mismatch policy {}, expected 0 or 1", s)),
        }
    }
}

impl Display for MismatchPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchPolicy::StrictPairAgreement => f.write_str("0 (strict pair agreement)"),
            MismatchPolicy::DropAmbiguous => f.write_str("1 (drop ambiguous alleles)"),
        }
    }
}

/// A single alignment record of a fragment. Coordinates are 1-based, inclusive.
#[derive(Clone, Eq, PartialEq, Debug, Getters)]
pub struct MappedRead {
    contig: String,
    start: u64,
    end: u64,
    variants: HashSet<VariantID>,
}

impl MappedRead {
    pub fn new(contig: String, start: u64, end: u64) -> Self {
        Self { contig, start, end, variants: HashSet::new() }
    }

    #[inline]
    pub fn add(&mut self, variant: VariantID) {
        self.variants.insert(variant);
    }

    #[inline]
    pub fn covers(&self, contig: &str, start: u64, end: u64) -> bool {
        self.contig == contig && self.start <= start && end <= self.end
    }

    /// True if the read overlaps the variant but doesn't report the visible part of it.
    fn rejects(&self, variant: &VariantID) -> bool {
        if self.covers(variant.contig(), *variant.position(), *variant.end()) {
            return !self.variants.contains(variant);
        }
        match variant.partial(&self.contig, self.start, self.end) {
            Some(partial) => !self.variants.contains(&partial),
            None => false,
        }
    }
}

/// All alignment records of one sequenced molecule seen in the current region.
#[derive(Clone, Eq, PartialEq, Debug, Getters)]
pub struct Fragment {
    duplicate: bool,
    reads: Vec<MappedRead>,
}

impl Fragment {
    pub fn new(duplicate: bool) -> Self {
        Self { duplicate, reads: Vec::with_capacity(2) }
    }

    pub fn add(&mut self, contig: &str, start: u64, end: u64) -> &mut MappedRead {
        self.reads.push(MappedRead::new(contig.to_owned(), start, end));
        let last = self.reads.len() - 1;
        &mut self.reads[last]
    }

    pub fn variants(&self, policy: MismatchPolicy) -> HashSet<&VariantID> {
        let mut variants: HashSet<&VariantID> = self.reads.iter().flat_map(|x| x.variants.iter()).collect();
        match policy {
            MismatchPolicy::StrictPairAgreement => {
                variants.retain(|v| v.is_ambiguous() || !self.reads.iter().any(|r| r.rejects(v)))
            }
            MismatchPolicy::DropAmbiguous => variants.retain(|v| !v.is_ambiguous()),
        }
        variants
    }

    /// True if the mates jointly cover [start, end] without gaps.
    pub fn spans(&self, contig: &str, start: u64, end: u64) -> bool {
        let mut covered = start;
        for read in self.reads.iter().filter(|x| x.contig == contig).sorted_by_key(|x| x.start) {
            if read.start > covered {
                break;
            }
            if read.end >= covered {
                covered = read.end + 1;
                if covered > end {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snv(pos: u64, alt: u8) -> VariantID {
        VariantID::snv("1", pos, b'A', alt)
    }

    fn fragment(reads: &[(u64, u64, Vec<VariantID>)]) -> Fragment {
        let mut fragment = Fragment::new(false);
        for (start, end, variants) in reads {
            let read = fragment.add("1", *start, *end);
            for v in variants {
                read.add(v.clone());
            }
        }
        fragment
    }

    #[test]
    fn mates_disagree() {
        // Both mates cover position 7, only one of them reports the SNV
        let fragment = fragment(&[(1, 10, vec![snv(7, b'T')]), (5, 15, vec![])]);

        assert!(fragment.variants(MismatchPolicy::StrictPairAgreement).is_empty());
        assert_eq!(fragment.variants(MismatchPolicy::DropAmbiguous), HashSet::from([&snv(7, b'T')]));
    }

    #[test]
    fn mates_agree() {
        let fragment = fragment(&[(1, 10, vec![snv(7, b'T')]), (5, 15, vec![snv(7, b'T')]), (20, 30, vec![])]);
        let expected_snv = snv(7, b'T');
        let expected = HashSet::from([&expected_snv]);

        assert_eq!(fragment.variants(MismatchPolicy::StrictPairAgreement), expected);
        assert_eq!(fragment.variants(MismatchPolicy::DropAmbiguous), expected);
    }

    #[test]
    fn ambiguous() {
        let fragment = fragment(&[(1, 10, vec![snv(7, b'N')]), (5, 15, vec![])]);

        assert_eq!(fragment.variants(MismatchPolicy::StrictPairAgreement), HashSet::from([&snv(7, b'N')]));
        assert!(fragment.variants(MismatchPolicy::DropAmbiguous).is_empty());
    }

    #[test]
    fn partial_overlap() {
        let mnv = VariantID::substitution("1", 9, b"AA", b"TT");

        // Second mate sees only position 10 and reports the matching half.
        // The lone SNV itself is rejected by the first mate, which reported it as a part of the MNV.
        let agree = fragment(&[(1, 10, vec![mnv.clone()]), (10, 20, vec![snv(10, b'T')])]);
        assert_eq!(agree.variants(MismatchPolicy::StrictPairAgreement), HashSet::from([&mnv]));

        // ...or sees the reference there
        let disagree = fragment(&[(1, 10, vec![mnv.clone()]), (10, 20, vec![])]);
        assert!(disagree.variants(MismatchPolicy::StrictPairAgreement).is_empty());
    }

    #[test]
    fn partial_indel_is_not_informative() {
        let deletion = VariantID::deletion("1", 10, b"AAA");
        let fragment = fragment(&[(1, 30, vec![deletion.clone()]), (5, 11, vec![])]);

        assert_eq!(fragment.variants(MismatchPolicy::StrictPairAgreement), HashSet::from([&deletion]));
    }

    #[test]
    fn spans() {
        let fragment = fragment(&[(10, 20, vec![]), (15, 30, vec![]), (40, 50, vec![])]);
        assert!(fragment.spans("1", 10, 30));
        assert!(fragment.spans("1", 12, 25));
        assert!(fragment.spans("1", 40, 40));
        assert!(!fragment.spans("1", 9, 20));
        assert!(!fragment.spans("1", 25, 45));
        assert!(!fragment.spans("2", 10, 20));

        // Adjacent mates leave no gap
        let fragment = self::fragment(&[(10, 20, vec![]), (21, 30, vec![])]);
        assert!(fragment.spans("1", 15, 25));
    }

    #[test]
    fn policy() {
        assert_eq!("0".parse::<MismatchPolicy>(), Ok(MismatchPolicy::StrictPairAgreement));
        assert_eq!("1".parse::<MismatchPolicy>(), Ok(MismatchPolicy::DropAmbiguous));
        assert!("2".parse::<MismatchPolicy>().is_err());
    }
}
