//! Headless driver for the Game of Life engine.

mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use life_core::{Population, RunMode, RunnerConfig, Speed};
use life_world::{patterns, ManualScheduler, Scheduler, SimulationEngine, TokioScheduler};
use render::TextRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "life-runner", version, about = "Run Conway's Game of Life without a UI")]
struct Args {
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length
    #[arg(long, env = "LIFE_GRID_SIZE")]
    size: Option<usize>,

    /// Speed from 1 (slowest) to 20 (fastest)
    #[arg(long, env = "LIFE_SPEED")]
    speed: Option<u32>,

    /// Seed for randomize
    #[arg(long, env = "LIFE_SEED")]
    seed: Option<u64>,

    /// Live-cell probability for randomize
    #[arg(long)]
    density: Option<f64>,

    /// batch or timed
    #[arg(long)]
    mode: Option<RunMode>,

    /// Generations to step in batch mode
    #[arg(long)]
    generations: Option<u64>,

    /// Run time in timed mode, in milliseconds
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Preset to start from instead of a random grid
    #[arg(long)]
    pattern: Option<String>,

    /// Print the board after every generation
    #[arg(long)]
    render: bool,

    /// OpenTelemetry endpoint
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,
}

impl Args {
    fn resolve_config(self) -> Result<RunnerConfig> {
        let mut config = match &self.config {
            Some(path) => RunnerConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => RunnerConfig::default(),
        };

        if let Some(size) = self.size {
            config.engine.grid_size = size;
        }
        if let Some(speed) = self.speed {
            config.engine.initial_speed = Speed::new(speed)?;
        }
        if let Some(seed) = self.seed {
            config.engine.seed = Some(seed);
        }
        if let Some(density) = self.density {
            config.engine.density = density;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(duration_ms) = self.duration_ms {
            config.duration_ms = duration_ms;
        }
        if self.pattern.is_some() {
            config.pattern = self.pattern;
        }
        if self.render {
            config.render = true;
        }
        if self.otel_endpoint.is_some() {
            config.otel_endpoint = self.otel_endpoint;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug)]
struct RunSummary {
    generations: u64,
    population: Population,
    elapsed: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().resolve_config()?;

    telemetry::init_telemetry(config.otel_endpoint.as_deref())?;

    info!(
        mode = %config.mode,
        grid_size = config.engine.grid_size,
        speed = config.engine.initial_speed.get(),
        "Starting Game of Life runner"
    );

    let summary = match config.mode {
        RunMode::Batch => run_batch(&config)?,
        RunMode::Timed => run_timed(&config).await?,
    };

    info!(
        event = "run_summary",
        generations = summary.generations,
        live_cells = summary.population.live,
        dead_cells = summary.population.dead,
        population = format!("{:.1}%", summary.population.live_fraction() * 100.0),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Run complete"
    );
    crate::record_counter!("generations_run", summary.generations);
    crate::record_gauge!("final_population", summary.population.live);

    telemetry::shutdown_telemetry();

    Ok(())
}

fn build_engine<S: Scheduler>(config: &RunnerConfig, scheduler: S) -> Result<SimulationEngine<S>> {
    let renderer = TextRenderer::new(std::io::stdout(), config.render);
    let engine = SimulationEngine::from_config(&config.engine, scheduler, renderer)?;

    match &config.pattern {
        Some(name) => {
            let pattern = patterns::find(name).with_context(|| {
                format!(
                    "available patterns: {}",
                    patterns::names().collect::<Vec<_>>().join(", ")
                )
            })?;
            engine.apply_pattern_centered(pattern)?;
            info!(pattern = pattern.name, "Seeded grid from preset");
        }
        None => engine.randomize(),
    }

    Ok(engine)
}

/// Step a fixed number of generations by advancing a logical clock
fn run_batch(config: &RunnerConfig) -> Result<RunSummary> {
    let started = Instant::now();
    let scheduler = Arc::new(ManualScheduler::new());
    let engine = build_engine(config, scheduler.clone())?;
    let interval = engine.speed().interval();
    let report_every = (config.generations / 10).max(1);

    engine.start();
    for _ in 0..config.generations {
        scheduler.advance(interval);
        let generation = engine.generation();
        if generation % report_every == 0 {
            info!(
                generation,
                total = config.generations,
                live_cells = engine.count_live_cells(),
                "Progress"
            );
        }
    }
    engine.pause();

    Ok(RunSummary {
        generations: engine.generation(),
        population: engine.population(),
        elapsed: started.elapsed(),
    })
}

/// Run on the wall clock until the duration elapses or Ctrl+C arrives
async fn run_timed(config: &RunnerConfig) -> Result<RunSummary> {
    let started = Instant::now();
    let engine = build_engine(config, TokioScheduler::current()?)?;

    engine.start();
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_millis(config.duration_ms)) => {
            info!("Run duration reached");
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        }
    }
    engine.pause();

    Ok(RunSummary {
        generations: engine.generation(),
        population: engine.population(),
        elapsed: started.elapsed(),
    })
}
