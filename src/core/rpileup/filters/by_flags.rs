use derive_getters::Getters;
use derive_more::Constructor;

use super::{AlignedRead, ReadsFilter};

/// Keeps reads that carry all `include` bits and none of the `exclude` bits.
#[derive(Constructor, Getters, Copy, Clone)]
pub struct ByFlags {
    include: u16,
    exclude: u16,
}

impl<R: AlignedRead> ReadsFilter<R> for ByFlags {
    #[inline]
    fn is_read_ok(&self, record: &R) -> bool {
        let flags = record.flags();
        (flags & self.include) == self.include && (flags & self.exclude) == 0
    }
}
