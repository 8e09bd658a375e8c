use clap::Arg;

use crate::cli::shared;
use crate::cli::shared::validate;

pub mod candidates {
    use super::*;

    pub const CANDIDATES: &str = "candidates";
    pub const PADDING: &str = "padding";

    pub const SECTION_NAME: &str = "Candidates";

    pub fn args<'a>() -> Vec<Arg<'a>> {
        let args = vec![
            Arg::new(CANDIDATES)
                .long(CANDIDATES)
                .required(true)
                .takes_value(true)
                .validator(validate::path)
                .long_help("Tab-delimited MAF-like table (optionally gzipped) with candidate variants. Required columns: Chromosome, Start_Position, Reference_Allele, Tumor_Seq_Allele2, Variant_Type. All columns are copied to the output."),
            Arg::new(PADDING)
                .long(PADDING)
                .takes_value(true)
                .validator(validate::numeric(0u64, 1_000_000u64))
                .default_value("5")
                .long_help("Target regions are padded by the given number of bases and then shrunk to the candidates they overlap (padded again). Regions without candidates are skipped."),
        ];
        args.into_iter().map(|x| x.help_heading(Some(SECTION_NAME))).collect()
    }
}

pub fn all<'a>() -> Vec<Arg<'a>> {
    shared::args::all().into_iter().chain(candidates::args()).collect()
}
