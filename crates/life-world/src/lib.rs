//! Game of Life simulation engine.
//!
//! This crate implements the fixed-size grid, the B3/S23 step rule, and the
//! engine that drives repeated stepping through an injectable scheduler.

pub mod grid;
pub mod observer;
pub mod patterns;
pub mod scheduler;
pub mod engine;

pub use grid::Grid;
pub use observer::{GridEvent, GridObserver, NullObserver, RecordingObserver};
pub use patterns::Pattern;
pub use scheduler::{ManualScheduler, Scheduler, TickCallback, TimerHandle, TokioScheduler};
pub use engine::SimulationEngine;
