use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use pulsecheck::{
    CancellationToken, Checker, CheckerConfig, CheckerError, NormalizedId, ProgressSnapshot,
    RunState, ScheduleStrategy,
};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pulsecheck", version)]
#[command(about = "Check which account ids still resolve to a real profile picture")]
struct Cli {
    /// File with one id (or username/URL containing one) per line; stdin if omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of probes in flight
    #[arg(long)]
    concurrency: Option<usize>,

    /// Base URL of the profile picture service
    #[arg(long)]
    endpoint: Option<String>,

    /// Final-URL substring that marks a placeholder picture
    #[arg(long)]
    marker: Option<String>,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum number of non-blank input lines
    #[arg(long)]
    max_ids: Option<usize>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Report unreachable ids separately instead of counting them dead
    #[arg(long)]
    distinguish_unreachable: bool,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write live ids to this file instead of stdout
    #[arg(long)]
    live_out: Option<PathBuf>,

    /// Write dead ids to this file instead of stdout
    #[arg(long)]
    dead_out: Option<PathBuf>,

    /// Suppress per-batch progress lines
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Chunked,
    Pool,
}

impl From<StrategyArg> for ScheduleStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Chunked => ScheduleStrategy::Chunked,
            StrategyArg::Pool => ScheduleStrategy::Pool,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn resolve_config(&self) -> Result<CheckerConfig> {
        let mut config = match &self.config {
            Some(path) => CheckerConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => CheckerConfig::default(),
        };

        if let Some(concurrency) = self.concurrency {
            config.concurrency_bound = concurrency;
        }
        if let Some(endpoint) = &self.endpoint {
            config.remote_endpoint_base = endpoint.clone();
        }
        if let Some(marker) = &self.marker {
            config.dead_marker = marker.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(max_ids) = self.max_ids {
            config.max_ids_per_run = max_ids;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy.into();
        }
        if self.distinguish_unreachable {
            config.distinguish_unreachable = true;
        }

        Ok(config)
    }
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn join_ids(ids: &[NormalizedId]) -> String {
    let mut out = String::new();
    for id in ids {
        out.push_str(id.as_str());
        out.push('\n');
    }
    out
}

async fn write_results(cli: &Cli, snapshot: &ProgressSnapshot) -> Result<()> {
    if let Some(path) = &cli.live_out {
        tokio::fs::write(path, join_ids(&snapshot.live))
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = &cli.dead_out {
        tokio::fs::write(path, join_ids(&snapshot.dead))
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(snapshot)?);
        }
        OutputFormat::Text => {
            if cli.live_out.is_none() {
                println!("# live ({})", snapshot.live.len());
                print!("{}", join_ids(&snapshot.live));
            }
            if cli.dead_out.is_none() {
                println!("# dead ({})", snapshot.dead.len());
                print!("{}", join_ids(&snapshot.dead));
            }
            if !snapshot.unreachable.is_empty() {
                println!("# unreachable ({})", snapshot.unreachable.len());
                print!("{}", join_ids(&snapshot.unreachable));
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pulsecheck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let checker = Checker::new(config).context("invalid configuration")?;

    let text = read_input(cli.input.as_deref()).await?;
    let parsed = checker.prepare(&text);
    if parsed.is_truncated() {
        eprintln!(
            "warning: only the first {} lines are checked, {} lines ignored",
            checker.config().max_ids_per_run,
            parsed.truncated_lines
        );
    }
    let ids = parsed.into_ids()?;
    eprintln!("Checking {} ids", ids.len());

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let state = RunState::new();
    let quiet = cli.quiet;
    let result = checker
        .check_ids(&state, &ids, &cancel, |snapshot| {
            if !quiet {
                eprintln!("{}", snapshot.summary());
            }
        })
        .await;

    match result {
        Ok(snapshot) => {
            write_results(&cli, &snapshot).await?;
            eprintln!("{}", snapshot.summary());
            Ok(())
        }
        Err(CheckerError::Cancelled(partial)) => {
            write_results(&cli, &partial).await?;
            anyhow::bail!(
                "cancelled after {} of {} ids",
                partial.processed,
                partial.total
            )
        }
        Err(e) => Err(e.into()),
    }
}
