use crate::aggregate::Aggregator;
use crate::config::TallyConfig;
use crate::error::Result;
use crate::registry::Registry;
use crate::report::Report;
use crate::size_index::SizeIndex;
use crate::stats::PipelineStats;
use crate::summary::summarize;
use std::path::PathBuf;
use std::time::Instant;

/// Finished report together with the counters of the run that built it
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub stats: PipelineStats,
}

/// Load, join and summarize; nothing is written.
pub fn run(config: &TallyConfig) -> Result<RunOutcome> {
    config.validate()?;
    let started = Instant::now();
    let mut stats = PipelineStats::new();

    let mut registry = Registry::load(config.target_path())?;
    stats.namespaces = registry.namespaces.len();

    let (sizes, list_files) = SizeIndex::load(config.list_path(), &config.list_extension)?;
    stats.list_files = list_files;
    stats.indexed_paths = sizes.len();

    let mut aggregator = Aggregator::new(&mut registry, &sizes, &config.header_token);
    aggregator.ingest_dir(config.csv_path(), &config.csv_extension)?;
    stats.join = aggregator.finish();
    log::info!(
        "Joined {} CSV files: {} rows matched, {} dropped, {} without size",
        stats.join.files,
        stats.join.matched_rows,
        stats.join.dropped_rows,
        stats.join.unsized_rows
    );

    summarize(&mut registry)?;
    stats.total_bytes = registry.sum;
    stats.time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    Ok(RunOutcome {
        report: Report::new(registry),
        stats,
    })
}

/// Run the pipeline and emit the report to the configured output.
///
/// Returns the outcome and the path that was written.
pub fn run_and_write(config: &TallyConfig) -> Result<(RunOutcome, PathBuf)> {
    let outcome = run(config)?;
    let output = config.output_path();
    outcome.report.write(&output, config.format)?;
    Ok((outcome, output))
}
