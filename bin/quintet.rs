use anyhow::{bail, Context, Result};
use clap::Parser;
use quintet::{
    parse, CycleRunner, DuplicateKeyPolicy, ProbeMode, QuintetError, StoreMetrics, StoreSet,
    StoreSettings,
};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "quintet")]
#[command(about = "Fan integers out to five in-memory index stores and report them", long_about = None)]
struct Args {
    /// Comma-separated integers (decimal, 0x hex or 0-prefixed octal)
    #[arg(long, env = "QUINTET_INT_STR")]
    int_str: Option<String>,

    /// Hash table bucket count
    #[arg(long, env = "QUINTET_BUCKET_COUNT")]
    bucket_count: Option<usize>,

    /// Sparse store probe mode (dense, ordered)
    #[arg(long, env = "QUINTET_PROBE_MODE")]
    probe_mode: Option<String>,

    /// Duplicate sparse key policy (overwrite, reject)
    #[arg(long, env = "QUINTET_DUPLICATE_POLICY")]
    duplicate_policy: Option<String>,

    /// JSON settings file, overridden by the flags above
    #[arg(long, env = "QUINTET_CONFIG")]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long, env = "QUINTET_OUTPUT")]
    output: Option<PathBuf>,

    /// Emit the report as JSON
    #[arg(long, env = "QUINTET_JSON")]
    json: bool,
}

fn load_settings(args: &Args) -> Result<StoreSettings> {
    let mut settings = match &args.config {
        Some(path) => StoreSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => StoreSettings::default(),
    };

    if let Some(count) = args.bucket_count {
        settings = settings.with_bucket_count(count);
    }
    if let Some(name) = &args.probe_mode {
        match ProbeMode::parse(name) {
            Some(mode) => settings = settings.with_probe_mode(mode),
            None => bail!(QuintetError::InvalidConfig(format!(
                "unknown probe mode '{}'",
                name
            ))),
        }
    }
    if let Some(name) = &args.duplicate_policy {
        match DuplicateKeyPolicy::parse(name) {
            Some(policy) => settings = settings.with_duplicate_policy(policy),
            None => bail!(QuintetError::InvalidConfig(format!(
                "unknown duplicate policy '{}'",
                name
            ))),
        }
    }
    Ok(settings)
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(&args)?;
    let mut stores = StoreSet::new(settings)?;
    let metrics = Arc::new(StoreMetrics::new()?);
    let runner = CycleRunner::with_metrics(metrics);

    let Some(int_str) = args.int_str.as_deref() else {
        warn!("missing int_str");
        bail!(QuintetError::InvalidInput(String::new()));
    };

    let outcome = runner.run(&mut stores, parse::tokens(int_str));
    // Stores are already empty here; this mirrors the unload-time release.
    let summary = runner.shutdown(&mut stores);
    info!(released = summary.total().total(), "Shutdown complete");
    let report = outcome?;

    let rendered = if args.json {
        report.to_json()?
    } else {
        report.to_string()
    };
    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting quintet v{}", quintet::VERSION);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            let code = err
                .downcast_ref::<QuintetError>()
                .map(QuintetError::errno)
                .unwrap_or(-22);
            ExitCode::from(code.unsigned_abs() as u8)
        }
    }
}
