use clap::Arg;

use crate::cli::shared;

pub fn all<'a>() -> Vec<Arg<'a>> {
    shared::args::all()
}
