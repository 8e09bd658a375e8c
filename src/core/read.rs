use bio_types::genome;
#[cfg(test)]
use mockall::mock;
use rust_htslib::bam::record::CigarStringView;
use rust_htslib::bam::Record;

const FLAG_PAIRED: u16 = 0x1;
const FLAG_PROPER_PAIR: u16 = 0x2;
const FLAG_MATE_UNMAPPED: u16 = 0x8;
const FLAG_DUPLICATE: u16 = 0x400;

#[allow(clippy::len_without_is_empty)]
pub trait AlignedRead {
    // Shared by all mates of a fragment
    fn name(&self) -> &[u8];
    fn contig(&self) -> &str;
    // 0-based
    fn pos(&self) -> i64;
    fn cigar(&self) -> CigarStringView;
    fn seq(&self) -> Vec<u8>;
    fn qual(&self) -> &[u8];
    fn len(&self) -> usize;
    fn mapq(&self) -> u8;
    fn flags(&self) -> u16;
    fn insert_size(&self) -> i64;

    #[inline]
    fn is_paired(&self) -> bool {
        self.flags() & FLAG_PAIRED != 0
    }

    #[inline]
    fn is_proper_pair(&self) -> bool {
        self.flags() & FLAG_PROPER_PAIR != 0
    }

    #[inline]
    fn is_mate_unmapped(&self) -> bool {
        self.flags() & FLAG_MATE_UNMAPPED != 0
    }

    #[inline]
    fn is_duplicate(&self) -> bool {
        self.flags() & FLAG_DUPLICATE != 0
    }
}

#[cfg(test)]
mock! {
    pub Read {}
    impl AlignedRead for Read {
        fn name(&self) -> &[u8];
        fn contig(&self) -> &str;
        fn pos(&self) -> i64;
        fn cigar(&self) -> CigarStringView;
        fn seq(&self) -> Vec<u8>;
        fn qual(&self) -> &[u8];
        fn len(&self) -> usize;
        fn mapq(&self) -> u8;
        fn flags(&self) -> u16;
        fn insert_size(&self) -> i64;
    }
}

impl AlignedRead for Record {
    #[inline]
    fn name(&self) -> &[u8] {
        self.qname()
    }

    #[inline]
    fn contig(&self) -> &str {
        genome::AbstractInterval::contig(self)
    }

    #[inline]
    fn pos(&self) -> i64 {
        self.pos()
    }

    #[inline]
    fn cigar(&self) -> CigarStringView {
        self.cigar()
    }

    #[inline]
    fn seq(&self) -> Vec<u8> {
        self.seq().as_bytes()
    }

    #[inline]
    fn qual(&self) -> &[u8] {
        self.qual()
    }

    #[inline]
    fn len(&self) -> usize {
        self.seq_len()
    }

    #[inline]
    fn mapq(&self) -> u8 {
        self.mapq()
    }

    #[inline]
    fn flags(&self) -> u16 {
        self.flags()
    }

    #[inline]
    fn insert_size(&self) -> i64 {
        self.insert_size()
    }
}
