use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PileupError {
    /// Per-record problem. The record is dropped and the region goes on.
    #[error("Malformed record {read} in region {region}: {reason}")]
    MalformedRecord { read: String, region: String, reason: String },

    /// Declared allele disagrees with the reference stored in the pileup. Points to a coordinate bug.
    #[error("Reference mismatch for {variant} in region {region}: expected {expected}, pileup has {observed}")]
    ReferenceMismatch { variant: String, region: String, expected: String, observed: String },

    #[error("Composite variant {name} mixes contigs {first} and {second}")]
    ContigMismatch { name: String, first: String, second: String },

    #[error("Alignment files {} and {} are mapped against different assemblies", .first.display(), .second.display())]
    HeaderMismatch { first: PathBuf, second: PathBuf },

    #[error("Unsupported candidate variant at line {line}: {reason}")]
    UnsupportedVariant { line: usize, reason: String },

    #[error("Region {region} is {length}bp long, but the pileup was allocated for at most {capacity}bp")]
    RegionTooLong { region: String, length: usize, capacity: usize },

    #[error("Failed to fetch reference sequence for {contig}:{start}-{end}")]
    ReferenceFetch { contig: String, start: u64, end: u64 },

    #[error("Failed to read alignments from {}: {message}", .path.display())]
    Hts { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited table error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, PileupError>;

impl PileupError {
    pub fn malformed(read: impl Into<String>, region: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord { read: read.into(), region: region.into(), reason: reason.into() }
    }

    pub fn unsupported(line: usize, reason: impl Into<String>) -> Self {
        Self::UnsupportedVariant { line, reason: reason.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn hts(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Hts { path: path.into(), message: message.to_string() }
    }

    /// Only per-record failures may be skipped by the driver loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PileupError::MalformedRecord { .. } | PileupError::UnsupportedVariant { .. })
    }
}
