use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::path::Path;

use bio_types::genome::{AbstractInterval, Interval, Position};
use derive_getters::{Dissolve, Getters};
use itertools::Itertools;

use crate::core::error::Result;
use crate::core::io::bed;
use crate::core::variant::VariantID;

/// Named target region. Stored 0-based half-open, reported 1-based inclusive.
#[derive(Clone, Eq, PartialEq, Debug, Getters, Dissolve)]
pub struct GenomicInterval {
    name: String,
    interval: Interval,
}

impl GenomicInterval {
    pub fn new(name: String, interval: Interval) -> Self {
        debug_assert!(interval.range().start < interval.range().end);
        Self { name, interval }
    }

    /// 1-based, inclusive coordinates
    pub fn from_1based(contig: &str, start: u64, end: u64, name: &str) -> Self {
        debug_assert!(start >= 1 && start <= end);
        Self::new(name.to_owned(), Interval::new(contig.to_owned(), (start - 1)..end))
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.range().start + 1
    }

    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.range().end
    }

    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        (self.interval.range().end - self.interval.range().start) as usize
    }

    /// Extends both sides by `padding`, without running past the contig ends.
    pub fn padded(&self, padding: u64, length: Option<u64>) -> Self {
        let range = self.interval.range();
        let end = length.map_or(range.end + padding, |length| (range.end + padding).min(length));
        let start = range.start.saturating_sub(padding).min(end.saturating_sub(1));
        Self::new(self.name.clone(), Interval::new(self.contig().to_owned(), start..end))
    }

    pub fn from_bed(bed: impl AsRef<Path>) -> Result<Vec<GenomicInterval>> {
        Ok(bed::parse(bed)?.into_iter().map(|x| GenomicInterval::new(x.name, x.interval)).collect())
    }

    /// Shrinks padded regions to the candidates they overlap. Regions without candidates are dropped.
    ///
    /// Overlapping or abutting padded regions are merged first, so every candidate lands in a single window.
    /// Windows never run past the contig ends listed in `contigs`.
    pub fn around_candidates<'a>(
        regions: Vec<GenomicInterval>,
        candidates: impl Iterator<Item = &'a VariantID>,
        contigs: &[Interval],
        padding: u64,
    ) -> Vec<GenomicInterval> {
        let mut bycontig: HashMap<&str, Vec<&VariantID>> = HashMap::new();
        for c in candidates {
            bycontig.entry(c.contig().as_str()).or_default().push(c);
        }
        let lengths: HashMap<&str, u64> = contigs.iter().map(|x| (x.contig(), x.range().end)).collect();
        let limit = |contig: &str, end: u64| lengths.get(contig).map_or(end, |length| end.min(*length));

        merged(regions.iter().map(|x| x.padded(padding, lengths.get(x.contig()).copied())))
            .into_iter()
            .filter_map(|region| {
                let (start, end) = (region.start(), region.end());
                let (first, last) = bycontig
                    .get(region.contig())?
                    .iter()
                    .filter(|c| c.overlaps(region.contig(), start, end))
                    .fold(None, |span: Option<(u64, u64)>, c| match span {
                        None => Some((*c.position(), *c.end())),
                        Some((s, e)) => Some((s.min(*c.position()), e.max(*c.end()))),
                    })?;
                let first = first.saturating_sub(padding).max(1);
                let last = limit(region.contig(), last + padding).max(first);
                Some(GenomicInterval::from_1based(region.contig(), first, last, &region.name))
            })
            .collect()
    }
}

/// Sorts the regions and merges the overlapping or abutting ones. Merged regions join their names with `|`.
fn merged(regions: impl Iterator<Item = GenomicInterval>) -> Vec<GenomicInterval> {
    let mut result: Vec<GenomicInterval> = Vec::new();
    for region in regions.sorted() {
        match result.last_mut() {
            Some(last) if last.contig() == region.contig() && region.range().start <= last.range().end => {
                let range = last.range().start..last.range().end.max(region.range().end);
                last.interval = Interval::new(region.contig().to_owned(), range);
                if !last.name.split('|').any(|x| x == region.name) {
                    last.name.push('|');
                    last.name.push_str(&region.name);
                }
            }
            _ => result.push(region),
        }
    }
    result
}

/// Pileup capacity required to process every region of the workload.
pub fn maxlen(workload: &[GenomicInterval]) -> usize {
    workload.iter().map(|x| x.len()).max().unwrap_or(0)
}

impl AbstractInterval for GenomicInterval {
    fn contig(&self) -> &str {
        self.interval.contig()
    }

    fn range(&self) -> Range<Position> {
        self.interval.range()
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig(), self.start(), self.end())
    }
}

impl PartialOrd<Self> for GenomicInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GenomicInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.contig()
            .cmp(other.contig())
            .then(self.range().start.cmp(&other.range().start))
            .then(self.range().end.cmp(&other.range().end))
            .then(self.name.cmp(&other.name))
    }
}
