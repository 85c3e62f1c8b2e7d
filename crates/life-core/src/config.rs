//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{Speed, MAX_GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Probability that `randomize` brings a cell to life
pub const DEFAULT_DENSITY: f64 = 0.3;

/// Engine configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of the square grid
    pub grid_size: usize,
    /// Speed the engine starts with (1 to 20)
    pub initial_speed: Speed,
    /// Live-cell probability used by randomize (0.0 to 1.0)
    pub density: f64,
    /// Random seed for reproducibility, OS entropy when unset
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            initial_speed: Speed::DEFAULT,
            density: DEFAULT_DENSITY,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(Error::InvalidSize {
                size: self.grid_size,
                max: MAX_GRID_SIZE,
            });
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(Error::Config(format!(
                "density {} is outside 0.0..=1.0",
                self.density
            )));
        }
        Ok(())
    }
}

/// How the runner drives the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Step a fixed number of generations on a logical clock
    Batch,
    /// Run on the wall clock for a fixed duration
    Timed,
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(RunMode::Batch),
            "timed" => Ok(RunMode::Timed),
            other => Err(Error::Config(format!("unknown run mode '{other}'"))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Batch => write!(f, "batch"),
            RunMode::Timed => write!(f, "timed"),
        }
    }
}

/// Headless runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub engine: EngineConfig,
    pub mode: RunMode,
    /// Generations to step in batch mode
    pub generations: u64,
    /// Wall-clock run time in timed mode (milliseconds)
    pub duration_ms: u64,
    /// Preset to start from; the grid is randomized when unset
    pub pattern: Option<String>,
    /// Print the board after every full-grid change
    pub render: bool,
    /// OpenTelemetry endpoint
    pub otel_endpoint: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            mode: RunMode::Batch,
            generations: 100,
            duration_ms: 5000,
            pattern: None,
            render: false,
            otel_endpoint: None,
        }
    }
}

impl RunnerConfig {
    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        if self.mode == RunMode::Timed && self.duration_ms == 0 {
            return Err(Error::Config("duration_ms must be positive in timed mode".to_string()));
        }
        Ok(())
    }
}
