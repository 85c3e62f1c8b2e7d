//! Built-in preset patterns.
//!
//! Cell offsets are `(row, col)` relative to the pattern's top-left corner.

use life_core::{CellPos, Error, Result};

#[derive(Debug)]
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    pub fn height(&self) -> usize {
        self.cells.iter().map(|&(row, _)| row + 1).max().unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.cells.iter().map(|&(_, col)| col + 1).max().unwrap_or(0)
    }

    /// Absolute cell positions when stamped at `origin`, `None` on overflow
    pub fn cells_at(&self, origin: CellPos) -> Option<Vec<CellPos>> {
        self.cells
            .iter()
            .map(|&(row, col)| origin.offset(row, col))
            .collect()
    }

    /// Origin that centers the pattern on a grid, `None` if it does not fit
    pub fn centered_origin(&self, grid_size: usize) -> Option<CellPos> {
        let (height, width) = (self.height(), self.width());
        if height > grid_size || width > grid_size {
            return None;
        }
        Some(CellPos::new((grid_size - height) / 2, (grid_size - width) / 2))
    }
}

#[rustfmt::skip]
pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Block",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "LWSS",
        cells: &[(0, 1), (0, 4), (1, 0), (2, 0), (2, 4), (3, 0), (3, 1), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Look up a preset by name, ignoring case, spaces and punctuation
pub fn find(name: &str) -> Result<&'static Pattern> {
    let wanted = normalize(name);
    PATTERNS
        .iter()
        .find(|pattern| normalize(pattern.name) == wanted)
        .ok_or_else(|| Error::UnknownPattern(name.to_string()))
}

pub fn names() -> impl Iterator<Item = &'static str> {
    PATTERNS.iter().map(|pattern| pattern.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn test_find_pattern() {
        assert_eq!(find("glider").unwrap().name, "Glider");
        assert_eq!(find("r_pentomino").unwrap().name, "R-pentomino");
        assert_eq!(find("gosper-glider-gun").unwrap().name, "Gosper Glider Gun");
        assert!(matches!(find("spaceship 9000"), Err(Error::UnknownPattern(_))));
    }

    #[test]
    fn test_pattern_dimensions() {
        let pulsar = find("pulsar").unwrap();
        assert_eq!((pulsar.height(), pulsar.width()), (13, 13));
        assert_eq!(pulsar.cells.len(), 48);

        let gun = find("gosper glider gun").unwrap();
        assert_eq!((gun.height(), gun.width()), (9, 36));
        assert_eq!(gun.cells.len(), 36);
    }

    #[test]
    fn test_centered_origin() {
        let block = find("block").unwrap();
        assert_eq!(block.centered_origin(10), Some(CellPos::new(4, 4)));
        assert_eq!(block.centered_origin(1), None);
    }

    #[test]
    fn test_cells_at_offsets() {
        let blinker = find("blinker").unwrap();
        let cells = blinker.cells_at(CellPos::new(3, 5)).unwrap();
        assert_eq!(
            cells,
            vec![CellPos::new(3, 5), CellPos::new(3, 6), CellPos::new(3, 7)]
        );
        assert!(blinker.cells_at(CellPos::new(0, usize::MAX)).is_none());
    }

    fn stamp(pattern: &Pattern, size: usize) -> Grid {
        let origin = pattern.centered_origin(size).unwrap();
        let mut grid = Grid::new(size).unwrap();
        for cell in pattern.cells_at(origin).unwrap() {
            grid.set(cell.row, cell.col, true).unwrap();
        }
        grid
    }

    fn advance(grid: &Grid, generations: usize) -> Grid {
        let mut current = grid.clone();
        let mut next = Grid::new(grid.size()).unwrap();
        for _ in 0..generations {
            current.next_generation_into(&mut next);
            std::mem::swap(&mut current, &mut next);
        }
        current
    }

    fn live(grid: &Grid) -> Vec<CellPos> {
        grid.live_cells().collect()
    }

    #[test]
    fn test_r_pentomino_shape_and_growth() {
        let r = find("r-pentomino").unwrap();
        let grid = stamp(r, 100);
        let origin = r.centered_origin(100).unwrap();
        let cell = |row: usize, col: usize| grid.get(origin.row + row, origin.col + col).unwrap();

        // .##
        // ##.
        // .#.
        assert!(!cell(0, 0) && cell(0, 1) && cell(0, 2));
        assert!(cell(1, 0) && cell(1, 1) && !cell(1, 2));
        assert!(!cell(2, 0) && cell(2, 1) && !cell(2, 2));

        assert_eq!(advance(&grid, 1).count_live(), 6);
        let at_10 = advance(&grid, 10).count_live();
        let at_50 = advance(&grid, 50).count_live();
        assert_eq!(at_10, 11);
        assert_eq!(at_50, 64);
        assert_ne!(advance(&grid, 49), advance(&grid, 50));
    }

    #[test]
    fn test_toad_period_two() {
        let grid = stamp(find("toad").unwrap(), 8);
        assert_ne!(advance(&grid, 1), grid);
        assert_eq!(advance(&grid, 2), grid);
    }

    #[test]
    fn test_beacon_period_two() {
        let grid = stamp(find("beacon").unwrap(), 8);
        assert_eq!(advance(&grid, 1).count_live(), 6);
        assert_eq!(advance(&grid, 2), grid);
    }

    #[test]
    fn test_pulsar_period_three() {
        let grid = stamp(find("pulsar").unwrap(), 21);
        assert_ne!(advance(&grid, 1), grid);
        assert_ne!(advance(&grid, 2), grid);
        assert_eq!(advance(&grid, 3), grid);
    }

    #[test]
    fn test_block_is_still() {
        let grid = stamp(find("block").unwrap(), 6);
        assert_eq!(advance(&grid, 1), grid);
    }

    #[test]
    fn test_glider_moves_diagonally() {
        let grid = stamp(find("glider").unwrap(), 12);
        let shifted: Vec<CellPos> = live(&grid)
            .into_iter()
            .map(|pos| CellPos::new(pos.row + 1, pos.col + 1))
            .collect();
        assert_eq!(live(&advance(&grid, 4)), shifted);
    }

    #[test]
    fn test_lwss_moves_two_columns_west() {
        let grid = stamp(find("lwss").unwrap(), 16);
        let shifted: Vec<CellPos> = live(&grid)
            .into_iter()
            .map(|pos| CellPos::new(pos.row, pos.col - 2))
            .collect();
        assert_eq!(live(&advance(&grid, 4)), shifted);
        assert_ne!(live(&advance(&grid, 2)), live(&grid));
    }

    #[test]
    fn test_glider_gun_emits_gliders() {
        let grid = stamp(find("gosper glider gun").unwrap(), 128);
        // The gun repeats every 30 generations and leaves a glider behind
        // each time, so the population keeps climbing.
        assert!(advance(&grid, 90).count_live() > grid.count_live() + 5);
    }

    #[test]
    fn test_no_duplicate_cells() {
        for pattern in PATTERNS {
            let mut cells = pattern.cells.to_vec();
            cells.sort_unstable();
            cells.dedup();
            assert_eq!(cells.len(), pattern.cells.len(), "{} has duplicates", pattern.name);
        }
        assert_eq!(names().count(), PATTERNS.len());
    }
}
