use clap::{crate_authors, crate_description, crate_name, crate_version, App, AppSettings, ArgMatches};
use indicatif::{MultiProgress, ProgressBar};
use rayon::ThreadPoolBuilder;
use tracing::Level;

use fragpile::cli;
use fragpile::cli::shared::args::{self, CoreArgs};
use fragpile::cli::shared::{parse, style};
use fragpile::core::error::{PileupError, Result};

const METRICS: &str = "metrics";
const GENOTYPING: &str = "genotyping";
const SIGNATURES: &str = "signatures";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_target(false).init();
}

fn launch(subcommand: &str, matches: &ArgMatches, core: CoreArgs, factory: impl Fn() -> ProgressBar) -> Result<()> {
    match subcommand {
        METRICS => cli::metrics::run(matches, core, factory),
        GENOTYPING => cli::genotyping::run(matches, core, factory),
        SIGNATURES => cli::signatures::run(matches, core, factory),
        _ => Err(PileupError::config(format!("Unknown subcommand: {}", subcommand))),
    }
}

fn run() -> Result<()> {
    let app = App::new(crate_name!())
        .author(crate_authors!("\n"))
        .version(crate_version!())
        .about(crate_description!())
        .max_term_width(120)
        .setting(AppSettings::DeriveDisplayOrder)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            App::new(METRICS)
                .about("Per-position pileup and per-region coverage summaries, with and without duplicates")
                .args(cli::metrics::args()),
        )
        .subcommand(
            App::new(GENOTYPING)
                .about("Supporting fragment counts for candidate variants and their composites")
                .args(cli::genotyping::args()),
        )
        .subcommand(
            App::new(SIGNATURES)
                .about("Positions matching clip-based signatures, e.g. translocation breakpoints")
                .args(cli::signatures::args()),
        );
    let matches = app.get_matches();
    let (subcommand, matches) =
        matches.subcommand().ok_or_else(|| PileupError::config("A subcommand is required"))?;

    logging(matches.is_present(args::core::VERBOSE));
    tracing::info!("Running {} {}", crate_name!(), subcommand);

    let style = style::parse::with_progress();
    let mbar = MultiProgress::new();
    let factory = || mbar.add(ProgressBar::new_spinner().with_style(style.clone()));

    let threads = parse::threads(factory(), matches)?;
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .map_err(|e| PileupError::config(format!("Failed to initialize thread pool: {}", e)))?;

    // Keeps the renderer alive until the worker is done
    let main = factory();
    main.set_message(format!("Running {}...", subcommand));

    std::thread::scope(|s| {
        let worker = s.spawn(|| {
            let result = CoreArgs::new(matches, factory).and_then(|core| launch(subcommand, matches, core, factory));
            match &result {
                Ok(()) => main.finish_with_message("Finished"),
                Err(_) => main.abandon_with_message("Failed"),
            }
            result
        });
        mbar.join()?;
        worker.join().unwrap_or_else(|_| Err(PileupError::config("Worker thread panicked")))
    })
}
