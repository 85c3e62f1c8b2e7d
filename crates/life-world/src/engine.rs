//! Simulation engine: double-buffered grid, generation stepping, and
//! run/pause/speed scheduling.
//!
//! All state lives behind one mutex. Timer callbacks hold a weak reference
//! to that state plus the epoch of the timer they belong to, and only step
//! while their epoch is still the active one. Because `pause`, `set_speed`
//! and friends swap the active timer under the same lock, a tick that fired
//! just before a cancellation can never step the grid after the cancelling
//! call returns.

use crate::grid::Grid;
use crate::observer::{GridEvent, GridObserver};
use crate::patterns::Pattern;
use crate::scheduler::{Scheduler, TickCallback, TimerHandle};
use life_core::{CellPos, EngineConfig, Error, Population, Result, Speed, DEFAULT_DENSITY};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Weak};
use tracing::{debug, info, instrument, trace};

#[derive(Debug, Clone, Copy)]
struct ActiveTimer {
    handle: TimerHandle,
    epoch: u64,
}

struct SimulationState {
    /// Index `current` is the live generation, the other one is scratch
    buffers: [Grid; 2],
    current: usize,
    generation: u64,
    speed: Speed,
    density: f64,
    active_timer: Option<ActiveTimer>,
    timer_epoch: u64,
    rng: ChaCha8Rng,
    observer: Box<dyn GridObserver>,
}

impl SimulationState {
    fn current_grid(&self) -> &Grid {
        &self.buffers[self.current]
    }

    fn is_running(&self) -> bool {
        self.active_timer.is_some()
    }

    fn notify(&mut self, event: GridEvent) {
        self.observer.on_event(&event, &self.buffers[self.current]);
    }

    fn notify_grid_replaced(&mut self) {
        let live_cells = self.current_grid().count_live();
        self.notify(GridEvent::GridReplaced {
            generation: self.generation,
            live_cells,
        });
    }

    /// Fill the scratch buffer from the current one
    fn calculate_next_generation(&mut self) {
        let current = self.current;
        let [first, second] = &mut self.buffers;
        let (from, into) = if current == 0 {
            (&*first, second)
        } else {
            (&*second, first)
        };
        from.next_generation_into(into);
    }

    fn step(&mut self) {
        self.calculate_next_generation();
        self.current = 1 - self.current;
        self.generation += 1;
        trace!(generation = self.generation, "Generation advanced");
        self.notify_grid_replaced();
    }

    fn reset_buffers(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
        self.generation = 0;
    }
}

fn on_tick(state: &Weak<Mutex<SimulationState>>, epoch: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock();
    let active_epoch = state.active_timer.map(|timer| timer.epoch);
    if active_epoch == Some(epoch) {
        state.step();
    } else {
        trace!(epoch, "Ignoring tick from a cancelled timer");
    }
}

/// Conway's Game of Life on a fixed `size × size` grid.
///
/// Every operation is synchronous. Automatic stepping goes through the
/// injected [`Scheduler`]; at most one repeating timer is armed at a time and
/// `is_running()` is true exactly while one is.
pub struct SimulationEngine<S: Scheduler> {
    state: Arc<Mutex<SimulationState>>,
    scheduler: S,
    size: usize,
}

impl<S: Scheduler> SimulationEngine<S> {
    /// Create an engine with all cells dead, generation 0, paused, at the
    /// default speed.
    pub fn new(size: usize, scheduler: S, observer: impl GridObserver + 'static) -> Result<Self> {
        Self::build(
            size,
            Speed::default(),
            DEFAULT_DENSITY,
            ChaCha8Rng::from_entropy(),
            scheduler,
            Box::new(observer),
        )
    }

    pub fn from_config(
        config: &EngineConfig,
        scheduler: S,
        observer: impl GridObserver + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::build(
            config.grid_size,
            config.initial_speed,
            config.density,
            rng,
            scheduler,
            Box::new(observer),
        )
    }

    fn build(
        size: usize,
        speed: Speed,
        density: f64,
        rng: ChaCha8Rng,
        scheduler: S,
        observer: Box<dyn GridObserver>,
    ) -> Result<Self> {
        let front = Grid::new(size)?;
        let back = front.clone();
        debug!(size, %speed, "Simulation engine created");

        Ok(Self {
            state: Arc::new(Mutex::new(SimulationState {
                buffers: [front, back],
                current: 0,
                generation: 0,
                speed,
                density,
                active_timer: None,
                timer_epoch: 0,
                rng,
                observer,
            })),
            scheduler,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn speed(&self) -> Speed {
        self.state.lock().speed
    }

    pub fn count_live_cells(&self) -> usize {
        self.state.lock().current_grid().count_live()
    }

    pub fn population(&self) -> Population {
        let state = self.state.lock();
        let grid = state.current_grid();
        Population::new(grid.count_live(), grid.total_cells())
    }

    /// Copy of the current generation
    pub fn snapshot(&self) -> Grid {
        self.state.lock().current_grid().clone()
    }

    pub fn is_alive(&self, row: usize, col: usize) -> Result<bool> {
        self.state.lock().current_grid().is_alive(row, col)
    }

    /// Live neighbors of an in-bounds cell in the current generation
    pub fn count_live_neighbors(&self, row: usize, col: usize) -> Result<u8> {
        self.check_bounds(row, col)?;
        Ok(self.state.lock().current_grid().live_neighbors(row, col))
    }

    /// Flip one cell, returning its new state. Does not touch the generation
    /// counter or the run state.
    pub fn toggle_cell(&self, row: usize, col: usize) -> Result<bool> {
        self.check_bounds(row, col)?;
        let mut state = self.state.lock();
        let current = state.current;
        let alive = state.buffers[current].toggle(row, col)?;
        debug!(row, col, alive, "Cell toggled");
        state.notify(GridEvent::CellChanged { row, col, alive });
        Ok(alive)
    }

    /// Advance exactly one generation
    pub fn step(&self) {
        self.state.lock().step();
    }

    #[instrument(skip(self))]
    pub fn start(&self) {
        let mut state = self.state.lock();
        self.start_locked(&mut state);
    }

    #[instrument(skip(self))]
    pub fn pause(&self) {
        let mut state = self.state.lock();
        self.pause_locked(&mut state);
    }

    pub fn toggle_start_pause(&self) {
        let mut state = self.state.lock();
        if state.is_running() {
            self.pause_locked(&mut state);
        } else {
            self.start_locked(&mut state);
        }
    }

    /// Stop, then kill every cell and reset the generation counter
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let mut state = self.state.lock();
        self.pause_locked(&mut state);
        state.reset_buffers();
        info!(event = "cleared", "Grid cleared");
        state.notify_grid_replaced();
    }

    /// Stop, then bring each cell to life independently with the configured
    /// density and reset the generation counter
    #[instrument(skip(self))]
    pub fn randomize(&self) {
        let mut state = self.state.lock();
        self.pause_locked(&mut state);

        let SimulationState {
            buffers,
            current,
            rng,
            density,
            ..
        } = &mut *state;
        buffers[*current].randomize(rng, *density);
        state.generation = 0;

        let live_cells = state.current_grid().count_live();
        info!(event = "randomized", live_cells, density = state.density, "Grid randomized");
        state.notify_grid_replaced();
    }

    /// Stop, clear, and stamp `pattern` with its top-left corner at `origin`.
    /// Nothing changes if any cell of the pattern falls outside the grid.
    #[instrument(skip(self, pattern), fields(pattern = pattern.name))]
    pub fn apply_pattern(&self, pattern: &Pattern, origin: CellPos) -> Result<()> {
        let cells = pattern.cells_at(origin).ok_or_else(|| Error::OutOfBounds {
            row: origin.row,
            col: origin.col,
            size: self.size,
        })?;
        for cell in &cells {
            self.check_bounds(cell.row, cell.col)?;
        }

        let mut state = self.state.lock();
        self.pause_locked(&mut state);
        state.reset_buffers();
        let current = state.current;
        for cell in cells {
            state.buffers[current].set(cell.row, cell.col, true)?;
        }

        info!(event = "pattern_applied", %origin, "Pattern applied");
        state.notify_grid_replaced();
        Ok(())
    }

    /// Like [`apply_pattern`](Self::apply_pattern), centered on the grid
    pub fn apply_pattern_centered(&self, pattern: &Pattern) -> Result<()> {
        let origin = pattern.centered_origin(self.size).ok_or_else(|| Error::OutOfBounds {
            row: pattern.height().saturating_sub(1),
            col: pattern.width().saturating_sub(1),
            size: self.size,
        })?;
        self.apply_pattern(pattern, origin)
    }

    /// Change the speed. Values outside 1..=20 are rejected and leave the
    /// engine untouched. A running timer is replaced by one at the new
    /// interval right away.
    #[instrument(skip(self))]
    pub fn set_speed(&self, speed: u32) -> Result<()> {
        let speed = Speed::new(speed)?;
        let mut state = self.state.lock();
        state.speed = speed;

        if self.disarm_timer(&mut state) {
            self.arm_timer(&mut state);
        }

        debug!(%speed, interval_ms = speed.interval().as_millis() as u64, "Speed changed");
        state.notify(GridEvent::SpeedChanged { speed });
        Ok(())
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row < self.size && col < self.size {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                row,
                col,
                size: self.size,
            })
        }
    }

    fn start_locked(&self, state: &mut SimulationState) {
        if state.is_running() {
            return;
        }
        self.arm_timer(state);
        info!(
            event = "started",
            generation = state.generation,
            speed = state.speed.get(),
            "Simulation started"
        );
        state.notify(GridEvent::RunStateChanged { running: true });
    }

    fn pause_locked(&self, state: &mut SimulationState) {
        if !self.disarm_timer(state) {
            return;
        }
        info!(event = "paused", generation = state.generation, "Simulation paused");
        state.notify(GridEvent::RunStateChanged { running: false });
    }

    fn arm_timer(&self, state: &mut SimulationState) {
        state.timer_epoch += 1;
        let epoch = state.timer_epoch;
        let weak = Arc::downgrade(&self.state);
        let callback: TickCallback = Arc::new(move || on_tick(&weak, epoch));

        let interval = state.speed.interval();
        let handle = self.scheduler.schedule_repeating(interval, callback);
        state.active_timer = Some(ActiveTimer { handle, epoch });
        debug!(%handle, epoch, interval_ms = interval.as_millis() as u64, "Step timer armed");
    }

    /// Cancel the active timer, returning whether there was one
    fn disarm_timer(&self, state: &mut SimulationState) -> bool {
        match state.active_timer.take() {
            Some(timer) => {
                self.scheduler.cancel(timer.handle);
                debug!(handle = %timer.handle, epoch = timer.epoch, "Step timer cancelled");
                true
            }
            None => false,
        }
    }
}

impl<S: Scheduler> Drop for SimulationEngine<S> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.active_timer.take() {
            self.scheduler.cancel(timer.handle);
        }
    }
}
