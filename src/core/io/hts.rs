use std::path::Path;

use bio_types::genome::{AbstractInterval, Interval};
use itertools::Itertools;
pub use rust_htslib::bam::IndexedReader;
use rust_htslib::bam::Read;

use crate::core::error::{PileupError, Result};

pub fn open(hts: impl AsRef<Path>) -> Result<IndexedReader> {
    IndexedReader::from_path(&hts).map_err(|e| {
        PileupError::hts(
            hts.as_ref(),
            format!("{}. Possible reasons: BAM file was not indexed (samtools index); you don't have read permissions", e),
        )
    })
}

/// Contigs of the given alignment files. All files must be mapped against identical assemblies.
pub fn contigs(hts: &[impl AsRef<Path>]) -> Result<Vec<Interval>> {
    let mut headers = Vec::with_capacity(hts.len());
    for path in hts {
        let reader = open(path)?;
        let header = reader.header();
        let contigs = (0..header.target_count())
            .map(|tid| {
                let name = String::from_utf8_lossy(header.tid2name(tid)).to_string();
                Interval::new(name, 0..header.target_len(tid).unwrap_or(0))
            })
            .collect_vec();
        headers.push((path.as_ref(), contigs));
    }

    let key = |x: &[Interval]| x.iter().map(|i| (i.contig().to_owned(), i.range().end)).sorted().collect_vec();
    let mut headers = headers.into_iter();
    let (first, expected) = match headers.next() {
        Some(x) => x,
        None => return Ok(Vec::new()),
    };
    for (path, contigs) in headers {
        if key(&expected) != key(&contigs) {
            return Err(PileupError::HeaderMismatch { first: first.to_owned(), second: path.to_owned() });
        }
    }
    Ok(expected)
}
