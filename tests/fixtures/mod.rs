use std::fs;
use std::path::{Path, PathBuf};

use rust_htslib::bam;
use rust_htslib::bam::record::Record;
use tempfile::TempDir;

pub const CONTIG: &str = "chr1";
pub const REFERENCE: &[u8] = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";

/// Temporary folder with a reference assembly and everything required to launch a subcommand.
pub struct Fixture {
    pub dir: TempDir,
    pub reference: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary folder");
        let reference = dir.path().join("reference.fa");

        let header = format!(">{}\n", CONTIG);
        let mut fasta = header.clone().into_bytes();
        fasta.extend_from_slice(REFERENCE);
        fasta.push(b'\n');
        fs::write(&reference, fasta).unwrap();
        // name, length, offset, bases per line, bytes per line
        let fai = format!("{}\t{}\t{}\t{}\t{}\n", CONTIG, REFERENCE.len(), header.len(), REFERENCE.len(), REFERENCE.len() + 1);
        fs::write(dir.path().join("reference.fa.fai"), fai).unwrap();

        Self { dir, reference }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Coordinate sorted SAM records -> indexed BAM.
    pub fn bam(&self, name: &str, length: u64, records: &[String]) -> PathBuf {
        let path = self.path(name);

        let mut header = bam::Header::new();
        let mut sq = bam::header::HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", &CONTIG);
        sq.push_tag(b"LN", &length);
        header.push_record(&sq);
        let view = bam::HeaderView::from_header(&header);

        let mut writer = bam::Writer::from_path(&path, &header, bam::Format::Bam).unwrap();
        for sam in records {
            let record = Record::from_sam(&view, sam.as_bytes()).unwrap();
            writer.write(&record).unwrap();
        }
        drop(writer);
        bam::index::build(&path, None, bam::index::Type::Bai, 1).unwrap();
        path
    }
}

/// Single-end SAM record with perfect base qualities.
pub fn sam(name: &str, flags: u16, pos: u64, cigar: &str, seq: &str) -> String {
    format!("{}\t{}\t{}\t{}\t60\t{}\t*\t0\t0\t{}\t{}", name, flags, CONTIG, pos, cigar, seq, "I".repeat(seq.len()))
}

pub fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path).unwrap().lines().map(String::from).collect()
}
