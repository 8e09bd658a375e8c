use std::cell::RefCell;

use indicatif::ProgressBar;
use rayon::prelude::*;

use crate::cli::shared;
use crate::cli::shared::thread_cache::ThreadCache;
use crate::core::error::Result;
use crate::core::io::sink::OutputSink;
use crate::core::rpileup::ReadStats;
use crate::core::runner::{RegionReport, Runner};
use crate::core::workload::GenomicInterval;

// Regions processed between two flushes of the output, per thread
const CHUNK_PER_THREAD: usize = 16;

/// Runs every region in parallel and writes the results into the sink in the workload order.
pub fn run<RunnerT, Sink>(
    workload: Vec<GenomicInterval>,
    runner: RunnerT,
    pbar: ProgressBar,
    sink: &mut Sink,
) -> Result<ReadStats>
where
    RunnerT: Runner + Clone + Send,
    Sink: OutputSink,
{
    pbar.set_style(shared::style::run::running());
    pbar.set_length(workload.len() as u64);

    let ctxstore = ThreadCache::new(move || RefCell::new(runner.clone()));
    let chunksize = (rayon::current_num_threads() * CHUNK_PER_THREAD).max(1);

    let mut stats = ReadStats::default();
    for chunk in workload.chunks(chunksize) {
        let reports = chunk
            .par_iter()
            .map(|region| {
                let report = ctxstore.get().borrow_mut().run(region.clone());
                pbar.inc(1);
                report
            })
            .collect::<Result<Vec<RegionReport>>>()?;

        for report in reports {
            let (region, mut rows, regstats) = report.dissolve();
            tracing::debug!(
                "{}: processed {} reads, accepted {}, malformed {}",
                region,
                regstats.processed(),
                regstats.accepted(),
                regstats.malformed()
            );
            rows.replay(sink)?;
            stats.merge(&regstats);
        }
    }

    pbar.set_style(shared::style::run::finished());
    pbar.finish_with_message(format!(
        "Finished with {} regions, processed reads: {}, accepted: {}, malformed: {}",
        workload.len(),
        stats.processed(),
        stats.accepted(),
        stats.malformed()
    ));
    tracing::info!(
        "Processed {} reads in {} regions: {} accepted, {} malformed",
        stats.processed(),
        workload.len(),
        stats.accepted(),
        stats.malformed()
    );
    Ok(stats)
}
