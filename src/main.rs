use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use healthdash::{config::DashboardConfig, dashboard::Dashboard, layers::filter::LayerFilter};
use std::{
    env,
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Load health facility data and emit chart series and filtered map layers"
)]
struct Args {
    /// YAML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Static file server base URL or data directory (overrides the config).
    #[arg(short, long)]
    source: Option<String>,
    #[arg(long, value_enum, default_value = "json")]
    format: Format,
    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    governorate: Option<String>,
    /// Facility layer key, e.g. "Pharmacies".
    #[arg(long)]
    facility: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print the default configuration as YAML and exit.
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", DashboardConfig::default().to_yaml()?);
        return Ok(());
    }

    // ─── 2) resolve config ───────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(source) = args.source {
        config.source = source;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }

    let filter = LayerFilter::new(args.governorate, args.facility);
    if let Some(fac) = &filter.facility {
        if !config.layers.iter().any(|m| &m.key == fac) {
            warn!(facility = %fac, "unknown facility layer; every layer will be hidden");
        }
    }

    // ─── 3) load every feed ──────────────────────────────────────────
    info!(source = %config.source, "startup");
    let dashboard = Dashboard::new(config).context("building dashboard")?;
    let data = dashboard.load().await;
    let snapshot = data.snapshot(&filter);

    // ─── 4) emit ─────────────────────────────────────────────────────
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match args.format {
        Format::Json => snapshot.write_json(&mut out)?,
        Format::Csv => snapshot.write_csv(&mut out)?,
    }
    out.flush()?;

    if !snapshot.failures.is_empty() {
        warn!(
            failed = snapshot.failures.len(),
            "some feeds failed; their charts are empty"
        );
    }
    info!("all done");
    Ok(())
}
