use clap::{Arg, ArgMatches};
use indicatif::ProgressBar;
use itertools::Itertools;

use crate::cli::shared;
use crate::cli::shared::validate;
use crate::core::error::Result;
use crate::core::processors::Signature;

pub mod search {
    use super::*;

    pub const SIGNATURES: &str = "signatures";

    pub const SECTION_NAME: &str = "Signatures";

    pub fn args<'a>() -> Vec<Arg<'a>> {
        let args = vec![Arg::new(SIGNATURES)
            .long(SIGNATURES)
            .takes_value(true)
            .validator(validate::signatures)
            .default_value("TranslocationBreakpoint")
            .long_help("Comma-separated list of signatures to search for. Supported: TranslocationBreakpoint (positions where at least 1% of >= 100 unique reads are hard-clipped).")];
        args.into_iter().map(|x| x.help_heading(Some(SECTION_NAME))).collect()
    }
}

pub fn all<'a>() -> Vec<Arg<'a>> {
    shared::args::all().into_iter().chain(search::args()).collect()
}

pub fn signatures(pbar: ProgressBar, matches: &ArgMatches) -> Result<Vec<Signature>> {
    pbar.set_message("Parsing signatures...");
    let raw: String = shared::parse::value(matches, search::SIGNATURES)?;
    let result: Vec<Signature> = raw.split(',').map(|x| x.trim().parse()).collect::<Result<Vec<_>>>()?;
    let result = result.into_iter().unique().collect_vec();
    pbar.finish_with_message(format!("Signatures to search for: {}", result.iter().join(", ")));
    Ok(result)
}
