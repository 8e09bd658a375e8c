pub mod dna;
pub mod error;
pub mod io;
pub mod processors;
pub mod read;
pub mod rpileup;
pub mod runner;
pub mod variant;
pub mod workload;
