//! Reference implementation of one Conway generation on the CPU
//!
//! Mirrors `shader/life.comp.wgsl`: B3/S23, cells outside the grid are dead,
//! live cells are written as [`ALIVE`](crate::grid::ALIVE) and dead ones as
//! [`DEAD`](crate::grid::DEAD).

use crate::grid::PixelGrid;

/// Number of live cells among the 8 neighbours of `(x, y)`
pub fn live_neighbours(grid: &PixelGrid, x: u32, y: u32) -> u32 {
    let mut count = 0;
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(grid.width()) || ny >= i64::from(grid.height()) {
                continue;
            }
            if grid.is_alive(nx as u32, ny as u32) {
                count += 1;
            }
        }
    }
    count
}

/// Whether a cell is alive in the next generation
pub fn next_state(alive: bool, neighbours: u32) -> bool {
    matches!((alive, neighbours), (true, 2) | (true, 3) | (false, 3))
}

/// Computes the next generation of `grid`
pub fn step(grid: &PixelGrid) -> PixelGrid {
    let mut next = PixelGrid::dead(grid.width(), grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let alive = next_state(grid.is_alive(x, y), live_neighbours(grid, x, y));
            next.set_alive(x, y, alive);
        }
    }
    next
}

/// Dead grid with the given cells alive
pub fn pattern(width: u32, height: u32, cells: &[(u32, u32)]) -> PixelGrid {
    let mut grid = PixelGrid::dead(width, height);
    for &(x, y) in cells {
        grid.set_alive(x, y, true);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_still_life() {
        let block = pattern(6, 6, &[(2, 2), (3, 2), (2, 3), (3, 3)]);
        assert_eq!(step(&block), block);
    }

    #[test]
    fn test_blinker_has_period_two() {
        let horizontal = pattern(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let vertical = pattern(5, 5, &[(2, 1), (2, 2), (2, 3)]);

        let once = step(&horizontal);
        assert_eq!(once, vertical);
        assert_eq!(step(&once), horizontal);
    }

    #[test]
    fn test_lonely_cell_dies() {
        let grid = pattern(3, 3, &[(1, 1)]);
        assert_eq!(step(&grid).live_cells(), 0);
    }

    #[test]
    fn test_edges_count_as_dead() {
        // An L in the corner gains its fourth corner cell and becomes a block
        let grid = pattern(4, 4, &[(0, 0), (1, 0), (0, 1)]);
        let next = step(&grid);
        assert_eq!(next.live_coords(), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_next_state_table() {
        for n in 0..=8 {
            assert_eq!(next_state(true, n), n == 2 || n == 3, "live with {n}");
            assert_eq!(next_state(false, n), n == 3, "dead with {n}");
        }
    }
}
