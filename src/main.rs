//! CLI entry point for the signal survey tool.
//!
//! Summarizes a single survey, or compares two surveys of the same site to
//! measure building attenuation or booster gain.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use signal_survey::analyzers::analyzer::{
    compare_files, report_comparison, report_survey, summarize_file,
};
use signal_survey::analyzers::order::SortColumn;
use signal_survey::analyzers::types::DeltaType;
use signal_survey::config::EngineConfig;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "signal_survey")]
#[command(about = "Statistics and comparisons of radio signal surveys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReportOptions {
    /// Order keys by band before operator
    #[arg(short, long, default_value_t = false)]
    band: bool,

    /// Drop groups with too few readings before aggregation
    #[arg(short, long, default_value_t = false)]
    exclude_small: bool,

    /// Rank rows by MNO or BAND, then by signal
    #[arg(short, long)]
    sort: Option<String>,

    /// Directory the CSV reports are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Optional JSON engine config
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one survey file
    Survey {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        options: ReportOptions,
    },
    /// Compare an outdoor survey against an indoor survey
    Attenuation {
        #[arg(long)]
        outdoor: PathBuf,

        #[arg(long)]
        indoor: PathBuf,

        #[command(flatten)]
        options: ReportOptions,
    },
    /// Compare an indoor survey against the same site with a booster
    Gain {
        #[arg(long)]
        indoor: PathBuf,

        #[arg(long)]
        boosted: PathBuf,

        #[command(flatten)]
        options: ReportOptions,
    },
}

impl ReportOptions {
    /// Loads the config file if any, then applies flag overrides.
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("failed to load config from {path}"))?,
            None => EngineConfig::default(),
        };
        config.group_by_band |= self.band;
        config.exclude_small_groups |= self.exclude_small;
        Ok(config)
    }

    fn sort_column(&self) -> Option<SortColumn> {
        self.sort.as_deref().map(SortColumn::from_hint)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/signal_survey.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("signal_survey.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Survey { file, options } => {
            let config = options.engine_config()?;
            let summary = summarize_file(&file, &config)
                .with_context(|| format!("failed to summarize {}", file.display()))?;
            let path = report_survey(
                &summary,
                options.sort_column(),
                &config,
                &options.output_dir,
                now,
            )?;
            info!(report = %path.display(), "Done");
        }
        Commands::Attenuation {
            outdoor,
            indoor,
            options,
        } => {
            compare(&outdoor, &indoor, DeltaType::IndoorOutdoor, &options, now)?;
        }
        Commands::Gain {
            indoor,
            boosted,
            options,
        } => {
            compare(&indoor, &boosted, DeltaType::IndoorBooster, &options, now)?;
        }
    }

    Ok(())
}

/// Compares two surveys and writes the comparison reports.
#[tracing::instrument(skip_all, fields(first = %first.display(), second = %second.display(), ?delta_type))]
fn compare(
    first: &Path,
    second: &Path,
    delta_type: DeltaType,
    options: &ReportOptions,
    now: chrono::NaiveDateTime,
) -> Result<()> {
    let config = options.engine_config()?;
    let comparison = compare_files(first, second, &config, delta_type)
        .context("failed to compare surveys")?;

    let [common, only_first, only_second] = report_comparison(
        &comparison,
        options.sort_column(),
        &config,
        &options.output_dir,
        now,
    )?;
    info!(
        common = %common.display(),
        only_in_first = %only_first.display(),
        only_in_second = %only_second.display(),
        "Done"
    );
    Ok(())
}
