use std::ops::Range;
use std::path::PathBuf;

use bio_types::genome::Position;
#[cfg(test)]
use mockall::mock;
use rust_htslib::faidx;

use crate::core::error::{PileupError, Result};

/// Random access to a reference assembly. `range` is 0-based and half-open.
pub trait FastaReader {
    fn fetch(&mut self, contig: &str, range: Range<Position>) -> Result<()>;
    // Uppercased bases from the last successful fetch
    fn result(&self) -> &[u8];
}

#[cfg(test)]
mock! {
    pub FastaReader {}
    impl FastaReader for FastaReader {
        fn fetch(&mut self, contig: &str, range: Range<Position>) -> Result<()>;
        fn result(&self) -> &[u8];
    }
    impl Clone for FastaReader {
        fn clone(&self) -> Self;
    }
}

/// Faidx-backed reader. The index is opened on the first fetch so that clones stay cheap.
pub struct BasicFastaReader {
    faidx: Option<faidx::Reader>,
    cache: Vec<u8>,
    path: PathBuf,
}
unsafe impl Send for BasicFastaReader {}
unsafe impl Sync for BasicFastaReader {}

impl BasicFastaReader {
    pub fn new(path: PathBuf) -> Self {
        Self { faidx: None, cache: Vec::new(), path }
    }

    fn open(&mut self) -> Result<()> {
        if self.faidx.is_none() {
            let reader = faidx::Reader::from_path(&self.path).map_err(|e| {
                PileupError::config(format!("Failed to open indexed fasta {}: {}", self.path.display(), e))
            })?;
            self.faidx = Some(reader);
        }
        Ok(())
    }
}

impl FastaReader for BasicFastaReader {
    fn fetch(&mut self, contig: &str, range: Range<Position>) -> Result<()> {
        self.cache.clear();
        if range.is_empty() {
            return Ok(());
        }

        let error = || PileupError::ReferenceFetch { contig: contig.to_owned(), start: range.start + 1, end: range.end };
        self.open()?;
        let faidx = self.faidx.as_ref().ok_or_else(error)?;
        // faidx expects an inclusive end
        let seq = faidx.fetch_seq(contig, range.start as usize, range.end as usize - 1).map_err(|_| error())?;
        if seq.len() as u64 != range.end - range.start {
            return Err(error());
        }
        self.cache.extend(seq.iter().map(u8::to_ascii_uppercase));
        Ok(())
    }

    fn result(&self) -> &[u8] {
        &self.cache
    }
}

impl Clone for BasicFastaReader {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn fasta(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("ref.fa");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b">chr1\nACGTacgtNN\n>chr2\nTTTT\n").unwrap();
        let mut fai = std::fs::File::create(dir.path().join("ref.fa.fai")).unwrap();
        fai.write_all(b"chr1\t10\t6\t10\t11\nchr2\t4\t23\t4\t5\n").unwrap();
        path
    }

    #[test]
    fn fetch() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = BasicFastaReader::new(fasta(&dir));

        reader.fetch("chr1", 2..7).unwrap();
        assert_eq!(reader.result(), b"GTACG");

        reader.fetch("chr2", 0..4).unwrap();
        assert_eq!(reader.result(), b"TTTT");

        let mut clone = reader.clone();
        clone.fetch("chr1", 0..1).unwrap();
        assert_eq!(clone.result(), b"A");
    }

    #[test]
    fn out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = BasicFastaReader::new(fasta(&dir));

        assert!(matches!(reader.fetch("chr2", 2..10), Err(PileupError::ReferenceFetch { .. })));
        assert!(matches!(reader.fetch("chrX", 0..2), Err(PileupError::ReferenceFetch { .. })));
    }
}
