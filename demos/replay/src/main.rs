//! replay — play routing solutions back through the gasfleet engine.
//!
//! Solutions come from a directory of solver dumps (`--solutions`) or, by
//! default, from a seeded synthetic solver.  Tick summaries and periodic
//! snapshots are exported under `--out`.
//!
//! ```text
//! RUST_LOG=gf_sim=debug cargo run -p replay -- --ticks 300 --fixed-secs 0.1
//! ```

mod scenario;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use gf_core::{DiagnosticSink, EngineConfig, TracingSink, TruckCode};
use gf_fleet::LoadModel;
use gf_intake::{Intake, JsonDirSource, Scripted, ScriptedSource, SolutionSource};
use gf_output::{CsvWriter, JsonLinesWriter, OutputWriter, RenderSnapshot, SnapshotObserver};
use gf_sim::{PlaybackMode, Runner, SimError};

use crate::scenario::Scenario;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Csv,
    Jsonl,
}

#[derive(Debug, Parser)]
#[command(name = "replay", about = "Play LPG delivery routing solutions back tick by tick")]
struct Args {
    /// Engine configuration (JSON, camelCase keys); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of solver dumps named by interval start; synthetic solver when omitted
    #[arg(long)]
    solutions: Option<PathBuf>,

    /// Interval start of the first solution
    #[arg(long, default_value = "2025-01-01T00:00:00")]
    start: NaiveDateTime,

    #[arg(long, default_value = "output/replay")]
    out: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Write a full snapshot every N ticks
    #[arg(long, default_value_t = 10)]
    snapshot_every: u64,

    /// Stop after this many ticks; runs until Ctrl-C when omitted
    #[arg(long)]
    ticks: Option<u64>,

    /// Fixed wall-clock seconds per node instead of fleet-speed pacing
    #[arg(long)]
    fixed_secs: Option<f64>,

    /// Break this truck down on operator request (see `--break-at`)
    #[arg(long, value_name = "CODE")]
    break_truck: Option<String>,

    /// Tick after which `--break-truck` takes effect
    #[arg(long, default_value_t = 60)]
    break_at: u64,

    /// Synthetic solver seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Synthetic solver: "not ready" replies before the first solution
    #[arg(long, default_value_t = 2)]
    warmup: usize,

    /// Synthetic solver reply latency (milliseconds)
    #[arg(long, default_value_t = 50)]
    latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let intake = build_intake(&args, &config);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    match args.format {
        Format::Csv => run(&args, config, intake, CsvWriter::new(&args.out)?).await,
        Format::Jsonl => run(&args, config, intake, JsonLinesWriter::new(&args.out)?).await,
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn build_intake(args: &Args, config: &EngineConfig) -> Intake {
    let source: Arc<dyn SolutionSource> = match &args.solutions {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "reading solver dumps");
            Arc::new(JsonDirSource::new(dir.clone()))
        }
        None => {
            let scenario = Scenario::new(args.seed, config.steps_per_cycle, config.cycle_span());
            let source = ScriptedSource::new()
                .with_latency(Duration::from_millis(args.latency_ms))
                .with_generator(move |at| Some(scenario.response(at)));
            for _ in 0..args.warmup {
                source.push(Scripted::NotReady);
            }
            tracing::info!(seed = args.seed, "using the synthetic solver");
            Arc::new(source)
        }
    };
    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    Intake::new(
        source,
        sink,
        config.cycle_span(),
        LoadModel { tonnes_per_m3: config.tonnes_per_m3 },
    )
}

// ── Run ───────────────────────────────────────────────────────────────────────

async fn run<W: OutputWriter>(
    args:   &Args,
    config: EngineConfig,
    intake: Intake,
    writer: W,
) -> Result<()> {
    let observer = SnapshotObserver::new(writer, args.snapshot_every);
    let mut runner = Runner::new(config, intake, args.start, observer)?;
    if let Some(secs) = args.fixed_secs {
        runner.set_mode(PlaybackMode::fixed(secs));
    }

    println!("=== replay — gasfleet playback ===");
    println!("First interval: {}  |  Output: {}", args.start, args.out.display());
    println!();

    runner.start().await.context("waiting for the first solution")?;
    tracing::info!(period_ms = runner.period().as_millis() as u64, "playback started");

    let t0 = Instant::now();
    let limit = args.ticks.unwrap_or(u64::MAX);
    let mut ticks = 0u64;
    let mut handoffs = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while ticks < limit {
        let result = tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
            result = runner.step() => result,
        };
        ticks += 1;

        match result {
            Ok(report) => {
                if let Some(generation) = report.handoff {
                    handoffs += 1;
                    tracing::info!(generation, now = %report.now, "next cycle adopted");
                }
            }
            // The cycle stays exhausted; the next tick retries the fetch.
            Err(SimError::SolutionUnavailable { at, reason }) => {
                tracing::warn!(%at, %reason, "next solution unavailable");
            }
            Err(e) => return Err(e.into()),
        }

        if ticks == args.break_at {
            if let Some(code) = &args.break_truck {
                match runner.report_breakdown(&TruckCode::new(code.as_str()), 3).await? {
                    Some(b) => tracing::info!(truck = %b.truck, at = %b.at, "operator breakdown"),
                    None => tracing::warn!(truck = %code, "unknown or already broken truck"),
                }
            }
        }
    }

    runner.stop();
    let elapsed = t0.elapsed();

    let observer = runner.observer_mut();
    observer.finish();
    if let Some(e) = observer.take_error() {
        eprintln!("output error: {e}");
    }

    // ── Summary ───────────────────────────────────────────────────────────

    println!("Played {ticks} ticks in {:.3} s, {handoffs} hand-offs", elapsed.as_secs_f64());
    let Some(cycle) = runner.cycle() else {
        return Ok(());
    };
    let status = cycle.status();
    println!(
        "Generation {}  |  cycles completed {}  |  simulated {} min  |  now {}",
        status.generation,
        status.cycles_completed,
        status.sim_elapsed.num_minutes(),
        status.now,
    );
    println!();

    let snap = RenderSnapshot::capture(cycle, None);
    println!("{:<6} {:<12} {:<10} {:>8} {:>8}", "Truck", "Status", "Node", "Cargo%", "Fuel%");
    println!("{}", "-".repeat(48));
    for t in &snap.trucks {
        println!(
            "{:<6} {:<12} {:<10} {:>8} {:>8}",
            t.code,
            t.status,
            t.node.to_string(),
            t.cargo_pct.to_string(),
            t.fuel_pct.to_string(),
        );
    }

    let delivered: f64 = snap.orders.iter().map(|o| o.delivered_m3).sum();
    let assigned: f64 = snap.orders.iter().map(|o| o.assigned_m3).sum();
    println!();
    println!("Orders: {}  |  delivered {delivered:.1} of {assigned:.1} m³", snap.orders.len());
    Ok(())
}
