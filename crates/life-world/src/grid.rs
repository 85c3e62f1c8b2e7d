//! Square grid of alive/dead cells.

use life_core::{CellPos, Error, Result, MAX_GRID_SIZE};
use rand::Rng;

/// A fixed-size square grid, stored row-major. Positions outside the grid
/// read as dead; there is no wraparound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<bool>,
}

/// B3/S23: survive with 2 or 3 neighbors, birth with exactly 3
fn next_state(alive: bool, live_neighbors: u8) -> bool {
    matches!((alive, live_neighbors), (true, 2) | (true, 3) | (false, 3))
}

impl Grid {
    /// Create a grid of `size × size` dead cells
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 || size > MAX_GRID_SIZE {
            return Err(Error::InvalidSize {
                size,
                max: MAX_GRID_SIZE,
            });
        }
        Ok(Self {
            size,
            cells: vec![false; size * size],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Cell state, `None` outside the grid
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        self.contains(row, col).then(|| self.cells[self.index(row, col)])
    }

    pub fn is_alive(&self, row: usize, col: usize) -> Result<bool> {
        self.get(row, col).ok_or_else(|| self.out_of_bounds(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, alive: bool) -> Result<()> {
        self.check_bounds(row, col)?;
        let index = self.index(row, col);
        self.cells[index] = alive;
        Ok(())
    }

    /// Flip one cell, returning its new state
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<bool> {
        self.check_bounds(row, col)?;
        let index = self.index(row, col);
        self.cells[index] = !self.cells[index];
        Ok(self.cells[index])
    }

    pub fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if self.contains(row, col) {
            Ok(())
        } else {
            Err(self.out_of_bounds(row, col))
        }
    }

    /// Number of live cells among the (up to) eight neighbors of `(row, col)`.
    /// Neighbors outside the grid count as dead.
    pub fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for n_row in row.saturating_sub(1)..=row.saturating_add(1) {
            for n_col in col.saturating_sub(1)..=col.saturating_add(1) {
                if n_row == row && n_col == col {
                    continue;
                }
                if self.get(n_row, n_col) == Some(true) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Apply the rule to every cell of `self`, writing the result into `next`.
    ///
    /// Neighbor counts are read from `self` only, so `next` may hold anything
    /// beforehand; every cell of it is overwritten.
    pub fn next_generation_into(&self, next: &mut Grid) {
        debug_assert_eq!(self.size, next.size, "double buffers must match in size");
        for row in 0..self.size {
            for col in 0..self.size {
                let index = self.index(row, col);
                next.cells[index] = next_state(self.cells[index], self.live_neighbors(row, col));
            }
        }
    }

    /// Set every cell dead
    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Bring each cell to life independently with probability `density`
    /// (clamped to 0.0..=1.0)
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R, density: f64) {
        let density = density.clamp(0.0, 1.0);
        for cell in &mut self.cells {
            *cell = rng.gen_bool(density);
        }
    }

    pub fn count_live(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Row slices, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        self.cells.chunks(self.size)
    }

    /// Positions of all live cells in row-major order
    pub fn live_cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(move |(i, _)| CellPos::new(i / self.size, i % self.size))
    }

    fn index(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::OutOfBounds {
            row,
            col,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn from_rows(rows: &[&str]) -> Grid {
        let mut grid = Grid::new(rows.len()).unwrap();
        for (row, line) in rows.iter().enumerate() {
            assert_eq!(line.len(), rows.len(), "rows must form a square");
            for (col, byte) in line.bytes().enumerate() {
                grid.set(row, col, byte == b'#').unwrap();
            }
        }
        grid
    }

    fn step(grid: &Grid) -> Grid {
        let mut next = Grid::new(grid.size()).unwrap();
        grid.next_generation_into(&mut next);
        next
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10).unwrap();
        assert_eq!(grid.size(), 10);
        assert_eq!(grid.total_cells(), 100);
        assert_eq!(grid.count_live(), 0);
    }

    #[test]
    fn test_invalid_size() {
        assert!(matches!(Grid::new(0), Err(Error::InvalidSize { size: 0, .. })));
        assert!(Grid::new(MAX_GRID_SIZE + 1).is_err());
    }

    #[test]
    fn test_bounds() {
        let mut grid = Grid::new(4).unwrap();
        assert_eq!(grid.get(4, 0), None);
        assert!(matches!(
            grid.toggle(0, 4),
            Err(Error::OutOfBounds { row: 0, col: 4, size: 4 })
        ));
        assert!(grid.set(9, 9, true).is_err());
        assert_eq!(grid.count_live(), 0);
    }

    #[test]
    fn test_toggle() {
        let mut grid = Grid::new(3).unwrap();
        assert!(grid.toggle(1, 2).unwrap());
        assert!(grid.is_alive(1, 2).unwrap());
        assert!(!grid.toggle(1, 2).unwrap());
        assert_eq!(grid.count_live(), 0);
    }

    #[test]
    fn test_neighbors_no_wraparound() {
        let grid = from_rows(&["#...#", ".....", ".....", ".....", "#...#"]);
        // On a torus every corner would see the other three.
        assert_eq!(grid.live_neighbors(0, 0), 0);
        assert_eq!(grid.live_neighbors(4, 4), 0);
        assert_eq!(grid.live_neighbors(2, 2), 0);
    }

    #[test]
    fn test_corner_neighbors_at_most_three() {
        let grid = from_rows(&["##..", "##..", "....", "...."]);
        assert_eq!(grid.live_neighbors(0, 0), 3);
        assert_eq!(grid.live_neighbors(1, 1), 3);
        assert_eq!(grid.live_neighbors(2, 2), 1);
    }

    #[test]
    fn test_full_neighborhood() {
        let grid = from_rows(&["###", "###", "###"]);
        assert_eq!(grid.live_neighbors(1, 1), 8);
        assert_eq!(grid.live_neighbors(0, 1), 5);
    }

    #[test]
    fn test_isolated_cell_dies() {
        let grid = from_rows(&["...", ".#.", "..."]);
        assert_eq!(step(&grid).count_live(), 0);
    }

    #[test]
    #[rustfmt::skip]
    fn test_block_still_life() {
        let grid = from_rows(&[
            "......",
            "......",
            "..##..",
            "..##..",
            "......",
            "......",
        ]);
        assert_eq!(step(&grid), grid);
    }

    #[test]
    fn test_blinker_oscillates() {
        let horizontal = from_rows(&[".....", ".....", ".###.", ".....", "....."]);
        let vertical = from_rows(&[".....", "..#..", "..#..", "..#..", "....."]);
        assert_eq!(step(&horizontal), vertical);
        assert_eq!(step(&vertical), horizontal);
    }

    #[test]
    fn test_next_generation_overwrites_stale_buffer() {
        let grid = from_rows(&["...", ".#.", "..."]);
        let mut next = from_rows(&["###", "###", "###"]);
        grid.next_generation_into(&mut next);
        assert_eq!(next.count_live(), 0);
    }

    #[test]
    fn test_randomize_density() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut grid = Grid::new(50).unwrap();
        grid.randomize(&mut rng, 0.3);
        let fraction = grid.count_live() as f64 / grid.total_cells() as f64;
        // sigma = sqrt(0.3 * 0.7 / 2500) ~= 0.0092
        assert!((fraction - 0.3).abs() < 0.05, "fraction was {fraction}");

        grid.randomize(&mut rng, 0.0);
        assert_eq!(grid.count_live(), 0);
        grid.randomize(&mut rng, 1.0);
        assert_eq!(grid.count_live(), 2500);
    }

    #[test]
    fn test_live_cells_and_rows() {
        let grid = from_rows(&["#..", "..#", "..."]);
        let live: Vec<CellPos> = grid.live_cells().collect();
        assert_eq!(live, vec![CellPos::new(0, 0), CellPos::new(1, 2)]);
        let rows: Vec<&[bool]> = grid.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], &[false, false, true]);
    }

    fn arb_grid() -> impl Strategy<Value = Grid> {
        (1usize..12).prop_flat_map(|size| {
            prop::collection::vec(any::<bool>(), size * size).prop_map(move |cells| {
                let mut grid = Grid::new(size).unwrap();
                for (i, alive) in cells.into_iter().enumerate() {
                    grid.set(i / size, i % size, alive).unwrap();
                }
                grid
            })
        })
    }

    proptest! {
        #[test]
        fn prop_rule_applies_per_cell(grid in arb_grid()) {
            let next = step(&grid);
            for row in 0..grid.size() {
                for col in 0..grid.size() {
                    let neighbors = grid.live_neighbors(row, col);
                    let alive = grid.get(row, col).unwrap();
                    let expected = if alive {
                        neighbors == 2 || neighbors == 3
                    } else {
                        neighbors == 3
                    };
                    prop_assert_eq!(next.get(row, col), Some(expected));
                }
            }
        }

        #[test]
        fn prop_step_is_deterministic(grid in arb_grid()) {
            prop_assert_eq!(step(&grid), step(&grid));
        }

        #[test]
        fn prop_neighbor_count_bounded(grid in arb_grid()) {
            let last = grid.size() - 1;
            for row in 0..grid.size() {
                for col in 0..grid.size() {
                    let count = grid.live_neighbors(row, col);
                    prop_assert!(count <= 8);
                    let on_row_edge = row == 0 || row == last;
                    let on_col_edge = col == 0 || col == last;
                    if on_row_edge && on_col_edge {
                        prop_assert!(count <= 3);
                    } else if on_row_edge || on_col_edge {
                        prop_assert!(count <= 5);
                    }
                }
            }
        }
    }
}
