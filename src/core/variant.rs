use std::fmt::{Display, Formatter};

use derive_getters::Getters;

use crate::core::dna;

#[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub enum EventType {
    SNV,
    MNV,
    Insertion,
    Deletion,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::SNV => "SNV",
            EventType::MNV => "MNV",
            EventType::Insertion => "INSERTION",
            EventType::Deletion => "DELETION",
        };
        f.write_str(name)
    }
}

/// Structural key of a genetic change. Coordinates are 1-based and inclusive.
///
/// Insertions and deletions are anchored at the reference base preceding the event,
/// and both alleles start with that anchor base.
/// * SNV/MNV span the substituted bases.
/// * Insertions span the anchor and the base after it.
/// * Deletions span the anchor and every deleted base.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Getters)]
pub struct VariantID {
    etype: EventType,
    contig: String,
    position: u64,
    end: u64,
    refbases: Vec<u8>,
    altbases: Vec<u8>,
}

impl VariantID {
    pub fn snv(contig: &str, position: u64, refnuc: u8, altnuc: u8) -> Self {
        Self {
            etype: EventType::SNV,
            contig: contig.to_owned(),
            position,
            end: position,
            refbases: vec![refnuc],
            altbases: vec![altnuc],
        }
    }

    /// SNV or MNV depending on the allele length.
    pub fn substitution(contig: &str, position: u64, refbases: &[u8], altbases: &[u8]) -> Self {
        debug_assert!(!refbases.is_empty() && refbases.len() == altbases.len());
        let etype = if refbases.len() == 1 { EventType::SNV } else { EventType::MNV };
        Self {
            etype,
            contig: contig.to_owned(),
            position,
            end: position + refbases.len() as u64 - 1,
            refbases: refbases.to_vec(),
            altbases: altbases.to_vec(),
        }
    }

    pub fn insertion(contig: &str, anchor: u64, anchorbase: u8, inserted: &[u8]) -> Self {
        let mut altbases = Vec::with_capacity(inserted.len() + 1);
        altbases.push(anchorbase);
        altbases.extend_from_slice(inserted);
        Self {
            etype: EventType::Insertion,
            contig: contig.to_owned(),
            position: anchor,
            end: anchor + 1,
            refbases: vec![anchorbase],
            altbases,
        }
    }

    /// `refbases` holds the anchor base followed by the deleted bases.
    pub fn deletion(contig: &str, anchor: u64, refbases: &[u8]) -> Self {
        debug_assert!(refbases.len() >= 2);
        Self {
            etype: EventType::Deletion,
            contig: contig.to_owned(),
            position: anchor,
            end: anchor + refbases.len() as u64 - 1,
            refbases: refbases.to_vec(),
            altbases: vec![refbases[0]],
        }
    }

    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        dna::is_ambiguous(&self.altbases)
    }

    #[inline]
    pub fn overlaps(&self, contig: &str, start: u64, end: u64) -> bool {
        self.contig == contig && self.position <= end && start <= self.end
    }

    #[inline]
    pub fn is_within(&self, contig: &str, start: u64, end: u64) -> bool {
        self.contig == contig && start <= self.position && self.end <= end
    }

    /// Per-base SNVs of a substitution. Indels decompose into themselves.
    pub fn constituents(&self) -> Vec<VariantID> {
        match self.etype {
            EventType::MNV => self
                .refbases
                .iter()
                .zip(&self.altbases)
                .enumerate()
                .map(|(offset, (r, a))| VariantID::snv(&self.contig, self.position + offset as u64, *r, *a))
                .collect(),
            _ => vec![self.clone()],
        }
    }

    /// The part of the event observable inside [start, end].
    /// Substitutions are sliced to the overlap, indels can't be observed partially.
    pub fn partial(&self, contig: &str, start: u64, end: u64) -> Option<VariantID> {
        if !self.overlaps(contig, start, end) {
            return None;
        }
        if self.is_within(contig, start, end) {
            return Some(self.clone());
        }
        match self.etype {
            EventType::SNV | EventType::MNV => {
                let (from, to) = (self.position.max(start), self.end.min(end));
                let (first, last) = ((from - self.position) as usize, (to - self.position) as usize);
                Some(VariantID::substitution(
                    &self.contig,
                    from,
                    &self.refbases[first..=last],
                    &self.altbases[first..=last],
                ))
            }
            EventType::Insertion | EventType::Deletion => None,
        }
    }
}

impl Display for VariantID {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.contig,
            self.position,
            self.etype,
            String::from_utf8_lossy(&self.refbases),
            String::from_utf8_lossy(&self.altbases)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans() {
        let snv = VariantID::snv("1", 5, b'A', b'T');
        assert_eq!((snv.position, snv.end), (5, 5));

        let mnv = VariantID::substitution("1", 5, b"ACG", b"TTT");
        assert_eq!(mnv.etype, EventType::MNV);
        assert_eq!((mnv.position, mnv.end), (5, 7));

        let ins = VariantID::insertion("1", 10, b'C', b"GG");
        assert_eq!((ins.position, ins.end), (10, 11));
        assert_eq!((ins.refbases.as_slice(), ins.altbases.as_slice()), (b"C".as_ref(), b"CGG".as_ref()));

        let del = VariantID::deletion("1", 10, b"CAT");
        assert_eq!((del.position, del.end), (10, 12));
        assert_eq!(del.altbases, b"C");
    }

    #[test]
    fn structural_equality() {
        assert_eq!(VariantID::snv("1", 5, b'A', b'T'), VariantID::substitution("1", 5, b"A", b"T"));
        assert_ne!(VariantID::snv("1", 5, b'A', b'T'), VariantID::snv("2", 5, b'A', b'T'));
        assert_ne!(VariantID::snv("1", 5, b'A', b'T'), VariantID::snv("1", 5, b'A', b'G'));
    }

    #[test]
    fn constituents() {
        let mnv = VariantID::substitution("1", 5, b"AC", b"TG");
        assert_eq!(mnv.constituents(), vec![VariantID::snv("1", 5, b'A', b'T'), VariantID::snv("1", 6, b'C', b'G')]);

        let del = VariantID::deletion("1", 10, b"CAT");
        assert_eq!(del.constituents(), vec![del.clone()]);
    }

    #[test]
    fn partial() {
        let mnv = VariantID::substitution("1", 5, b"ACG", b"TTT");
        assert_eq!(mnv.partial("1", 1, 100), Some(mnv.clone()));
        assert_eq!(mnv.partial("1", 6, 100), Some(VariantID::substitution("1", 6, b"CG", b"TT")));
        assert_eq!(mnv.partial("1", 1, 5), Some(VariantID::snv("1", 5, b'A', b'T')));
        assert_eq!(mnv.partial("1", 8, 100), None);
        assert_eq!(mnv.partial("2", 1, 100), None);

        let del = VariantID::deletion("1", 10, b"CAT");
        assert_eq!(del.partial("1", 1, 11), None);
        assert_eq!(del.partial("1", 1, 12), Some(del.clone()));
    }

    #[test]
    fn display() {
        assert_eq!(VariantID::insertion("chr2", 7, b'A', b"T").to_string(), "chr2-7-INSERTION-A-AT");
    }
}
