pub use args::all as args;
pub use run::run;

mod args;
mod run;
