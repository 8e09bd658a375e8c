use std::fmt::{Display, Formatter};

use derive_getters::Getters;

use crate::core::dna::Nucleotide;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum Clip {
    Soft,
    Hard,
}

/// Read evidence collected at a single reference position.
#[derive(Clone, Default, Eq, PartialEq, Debug, Getters)]
pub struct PositionPileup {
    refbase: u8,
    // A, C, G, T, N
    bases: [u32; Nucleotide::BUCKETS],
    insertions: u32,
    deletions: u32,

    // Positions covered by a clipped part of some read
    soft_clips: u32,
    hard_clips: u32,

    soft_clip_starts: u32,
    soft_clip_ends: u32,
    hard_clip_starts: u32,
    hard_clip_ends: u32,

    soft_clip_start_quals: u64,
    soft_clip_end_quals: u64,
    hard_clip_start_quals: u64,
    hard_clip_end_quals: u64,

    mate_unmapped: u32,
    mate_distance_unexpected: u32,
}

impl PositionPileup {
    pub fn reset(&mut self, refbase: u8) {
        *self = Self { refbase, ..Default::default() };
    }

    #[inline]
    pub fn add_base(&mut self, base: u8) {
        self.bases[Nucleotide::from(base).index()] += 1;
    }

    #[inline]
    pub fn add_deletion(&mut self, mate_unmapped: bool, mate_distance_unexpected: bool) {
        self.deletions += 1;
        if mate_unmapped {
            self.mate_unmapped += 1;
        } else if mate_distance_unexpected {
            self.mate_distance_unexpected += 1;
        }
    }

    #[inline]
    pub fn add_insertion(&mut self, _length: u32) {
        self.insertions += 1;
    }

    #[inline]
    pub fn add_clip(&mut self, clip: Clip) {
        match clip {
            Clip::Soft => self.soft_clips += 1,
            Clip::Hard => self.hard_clips += 1,
        }
    }

    /// The read was clipped before its first aligned base, which sits at this position.
    #[inline]
    pub fn add_clip_start(&mut self, clip: Clip, quality: u8) {
        match clip {
            Clip::Soft => {
                self.soft_clip_starts += 1;
                self.soft_clip_start_quals += quality as u64;
            }
            Clip::Hard => {
                self.hard_clip_starts += 1;
                self.hard_clip_start_quals += quality as u64;
            }
        }
    }

    /// The read was clipped after its last aligned base, which sits at this position.
    #[inline]
    pub fn add_clip_end(&mut self, clip: Clip, quality: u8) {
        match clip {
            Clip::Soft => {
                self.soft_clip_ends += 1;
                self.soft_clip_end_quals += quality as u64;
            }
            Clip::Hard => {
                self.hard_clip_ends += 1;
                self.hard_clip_end_quals += quality as u64;
            }
        }
    }

    /// A + C + G + T + deletions. N calls and insertions are not coverage.
    #[inline]
    pub fn coverage(&self) -> u32 {
        self.bases[..4].iter().sum::<u32>() + self.deletions
    }

    /// Count for a base symbol, or for `I`/`D` events. `None` for anything else.
    pub fn count(&self, symbol: u8) -> Option<u32> {
        match symbol {
            b'A' | b'a' | b'C' | b'c' | b'G' | b'g' | b'T' | b't' => Some(self.bases[Nucleotide::from(symbol).index()]),
            b'I' => Some(self.insertions),
            b'D' => Some(self.deletions),
            _ => None,
        }
    }
}

impl Display for PositionPileup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.refbase as char,
            self.coverage(),
            self.bases[0],
            self.bases[1],
            self.bases[2],
            self.bases[3],
            self.insertions,
            self.deletions,
            self.soft_clip_starts,
            self.soft_clip_ends,
            self.hard_clip_starts,
            self.hard_clip_ends
        )
    }
}
