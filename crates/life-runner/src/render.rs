//! Plain-text board output for headless runs.

use life_world::{Grid, GridEvent, GridObserver};
use std::io::Write;
use tracing::{trace, warn};

/// Prints the board as `#`/`.` rows after every full-grid change
pub struct TextRenderer<W: Write + Send> {
    out: W,
    enabled: bool,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self { out, enabled }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, generation: u64, live_cells: usize, grid: &Grid) -> std::io::Result<()> {
        writeln!(self.out, "generation {generation} ({live_cells} alive)")?;
        for row in grid.rows() {
            let line: String = row.iter().map(|&alive| if alive { '#' } else { '.' }).collect();
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> GridObserver for TextRenderer<W> {
    fn on_event(&mut self, event: &GridEvent, grid: &Grid) {
        trace!(?event, "Grid event");
        if !self.enabled {
            return;
        }
        if let GridEvent::GridReplaced {
            generation,
            live_cells,
        } = *event
        {
            if let Err(e) = self.draw(generation, live_cells, grid) {
                warn!("Failed to render generation {}: {}", generation, e);
            }
        }
    }
}
