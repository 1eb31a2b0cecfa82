use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use sumally_core::{OutputFormat, TallyConfig};

const CONFIG_ENV: &str = "SUMALLY_CONFIG";

#[derive(Parser)]
#[command(name = "sumally")]
#[command(
    about = "Sum storage bytes per namespace by joining listings against CSV exports",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Directory containing target/, list/ and csv/ (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Report file (default: result.<format> in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    format: Option<FormatFlag>,

    /// TOML config file (overrides SUMALLY_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum FormatFlag {
    Yaml,
    Json,
}

impl FormatFlag {
    const fn as_domain(self) -> OutputFormat {
        match self {
            FormatFlag::Yaml => OutputFormat::Yaml,
            FormatFlag::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = resolve_config(&cli)?;
    log::debug!("Resolved config: {config:?}");

    if cli.dry_run {
        let outcome = sumally_core::run(&config).context("Tally failed")?;
        let rendered = outcome
            .report
            .to_string_pretty(config.format)
            .context("Failed to render report")?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    let (outcome, path) = sumally_core::run_and_write(&config).context("Tally failed")?;
    log::info!(
        "{} namespaces, {} in {} ms -> {}",
        outcome.stats.namespaces,
        outcome.report.registry.sum_str,
        outcome.stats.time_ms,
        path.display()
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<TallyConfig> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => TallyConfig::from_toml_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TallyConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(format) = cli.format {
        config.format = format.as_domain();
    }
    if let Some(output) = &cli.output {
        config.output = Some(output.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
