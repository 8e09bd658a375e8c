use std::fmt::{Display, Formatter};

/// Pileup bucket for a sequenced base. Anything outside ACGT lands in `Unknown`.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash, Debug)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
    Unknown,
}

impl Nucleotide {
    pub const BUCKETS: usize = 5;

    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Nucleotide::A => 0,
            Nucleotide::C => 1,
            Nucleotide::G => 2,
            Nucleotide::T => 3,
            Nucleotide::Unknown => 4,
        }
    }

    pub fn symbol(&self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
            Nucleotide::T => b'T',
            Nucleotide::Unknown => b'N',
        }
    }

    #[inline]
    pub fn is_gc(&self) -> bool {
        matches!(self, Nucleotide::C | Nucleotide::G)
    }
}

impl Display for Nucleotide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol() as char)
    }
}

impl Default for Nucleotide {
    fn default() -> Self {
        Nucleotide::Unknown
    }
}

impl From<u8> for Nucleotide {
    #[inline]
    fn from(symbol: u8) -> Self {
        match symbol {
            b'A' | b'a' => Nucleotide::A,
            b'C' | b'c' => Nucleotide::C,
            b'G' | b'g' => Nucleotide::G,
            b'T' | b't' => Nucleotide::T,
            _ => Nucleotide::Unknown,
        }
    }
}

/// Alleles carrying an `N` are ambiguous and get special treatment during mate reconciliation.
#[inline]
pub fn is_ambiguous(allele: &[u8]) -> bool {
    allele.iter().any(|x| matches!(x, b'N' | b'n'))
}
