use derive_getters::Getters;
use derive_more::Constructor;

use super::{AlignedRead, ReadsFilter};

#[derive(Constructor, Getters, Copy, Clone)]
pub struct ByQuality {
    mapq: u8,
    no_mapq_255: bool, // 255 = mapping quality is not available
}

impl<R: AlignedRead> ReadsFilter<R> for ByQuality {
    #[inline]
    fn is_read_ok(&self, record: &R) -> bool {
        record.mapq() >= self.mapq && !(self.no_mapq_255 && record.mapq() == 255)
    }
}
