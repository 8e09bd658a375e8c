use bio_types::genome::AbstractInterval;

use crate::core::error::Result;
use crate::core::read::AlignedRead;

// A function computed on top of the reads overlapping a given interval
pub trait ReadsCollider<'a, R: AlignedRead> {
    type ColliderResult;
    type Workload: AbstractInterval;

    fn reset(&mut self, info: Self::Workload) -> Result<()>;
    fn collide(&mut self, read: &R) -> Result<()>;
    fn finalize(&mut self);
    fn result(&'a self) -> Self::ColliderResult;
}
