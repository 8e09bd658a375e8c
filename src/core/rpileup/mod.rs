use derive_getters::Getters;

pub use collider::ReadsCollider;

use crate::core::error::Result;
use crate::core::read::AlignedRead;
use crate::core::workload::GenomicInterval;

mod collider;
pub mod filters;
pub mod hts;
pub mod pileup;

/// Per-region read accounting.
#[derive(Clone, Copy, Default, Eq, PartialEq, Debug, Getters)]
pub struct ReadStats {
    // Fetched from the alignment files
    processed: u64,
    // Passed the filters
    accepted: u64,
    // Passed the filters, but rejected by the collider
    malformed: u64,
}

impl ReadStats {
    pub fn merge(&mut self, other: &ReadStats) {
        self.processed += other.processed;
        self.accepted += other.accepted;
        self.malformed += other.malformed;
    }
}

// Pileup engine
pub trait ReadsCollidingEngine<R: AlignedRead, Collider: for<'a> ReadsCollider<'a, R, Workload = GenomicInterval>> {
    // Reset and run the engine and collider for the given interval
    fn run(&mut self, cwork: GenomicInterval) -> Result<ReadStats>;
    fn collider(&self) -> &Collider;
    fn collider_mut(&mut self) -> &mut Collider;
}
