//! Core type definitions for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Largest supported grid side length
pub const MAX_GRID_SIZE: usize = 4096;

/// Row/column coordinate of a cell, row-major with (0, 0) at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset by a non-negative delta, `None` on overflow
    pub fn offset(&self, d_row: usize, d_col: usize) -> Option<Self> {
        Some(Self {
            row: self.row.checked_add(d_row)?,
            col: self.col.checked_add(d_col)?,
        })
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Simulation speed setting.
///
/// Higher speeds mean shorter delays between automatic steps. The delay is
/// `1000ms - (speed - 1) * 45ms`, never below 50ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Speed(u32);

impl Speed {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 20;
    pub const DEFAULT: Speed = Speed(5);

    const BASE_INTERVAL_MS: u64 = 1000;
    const INTERVAL_STEP_MS: u64 = 45;
    const MIN_INTERVAL_MS: u64 = 50;

    /// Validate and wrap a raw speed value. Out-of-range values are rejected,
    /// never clamped.
    pub fn new(value: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSpeed {
                speed: value,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Delay between two automatic steps at this speed
    pub fn interval(self) -> Duration {
        let reduction = u64::from(self.0 - Self::MIN) * Self::INTERVAL_STEP_MS;
        let millis = Self::BASE_INTERVAL_MS
            .saturating_sub(reduction)
            .max(Self::MIN_INTERVAL_MS);
        Duration::from_millis(millis)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Speed {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Speed> for u32 {
    fn from(speed: Speed) -> Self {
        speed.0
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Live/dead cell counts for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Population {
    pub live: usize,
    pub dead: usize,
    pub total: usize,
}

impl Population {
    pub fn new(live: usize, total: usize) -> Self {
        Self {
            live,
            dead: total.saturating_sub(live),
            total,
        }
    }

    /// Fraction of cells alive, 0.0 for an empty grid
    pub fn live_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.live as f64 / self.total as f64
        }
    }
}
