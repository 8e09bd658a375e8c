pub mod bed;
pub mod fasta;
pub mod hts;
pub mod maf;
pub mod sink;
mod utils;
