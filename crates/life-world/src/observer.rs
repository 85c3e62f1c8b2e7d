//! Change notifications from the engine to whatever reflects the grid.

use crate::grid::Grid;
use life_core::Speed;
use parking_lot::Mutex;
use std::sync::Arc;

/// What changed after an engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    /// A single cell was toggled
    CellChanged { row: usize, col: usize, alive: bool },
    /// The whole grid may have changed (step, clear, randomize, pattern)
    GridReplaced { generation: u64, live_cells: usize },
    RunStateChanged { running: bool },
    SpeedChanged { speed: Speed },
}

/// Receives every grid-affecting event together with the current grid.
///
/// Called synchronously while the engine holds its state lock, so
/// implementations must not call back into the engine.
pub trait GridObserver: Send {
    fn on_event(&mut self, event: &GridEvent, grid: &Grid);
}

impl<F> GridObserver for F
where
    F: FnMut(&GridEvent, &Grid) + Send,
{
    fn on_event(&mut self, event: &GridEvent, grid: &Grid) {
        self(event, grid)
    }
}

/// Discards all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl GridObserver for NullObserver {
    fn on_event(&mut self, _event: &GridEvent, _grid: &Grid) {}
}

/// Keeps every event in a shared log; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<GridEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GridEvent> {
        self.events.lock().clone()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<GridEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn last(&self) -> Option<GridEvent> {
        self.events.lock().last().copied()
    }
}

impl GridObserver for RecordingObserver {
    fn on_event(&mut self, event: &GridEvent, _grid: &Grid) {
        self.events.lock().push(*event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_shares_log() {
        let recorder = RecordingObserver::new();
        let mut sink = recorder.clone();
        let grid = Grid::new(2).unwrap();

        sink.on_event(&GridEvent::RunStateChanged { running: true }, &grid);
        sink.on_event(&GridEvent::GridReplaced { generation: 1, live_cells: 0 }, &grid);

        assert_eq!(recorder.len(), 2);
        assert_eq!(
            recorder.last(),
            Some(GridEvent::GridReplaced { generation: 1, live_cells: 0 })
        );
        assert_eq!(recorder.take().len(), 2);
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut sink = |event: &GridEvent, grid: &Grid| seen.push((*event, grid.size()));
            let event = GridEvent::CellChanged {
                row: 0,
                col: 1,
                alive: true,
            };
            sink.on_event(&event, &Grid::new(3).unwrap());
        }
        assert_eq!(
            seen,
            vec![(GridEvent::CellChanged { row: 0, col: 1, alive: true }, 3)]
        );
    }
}
