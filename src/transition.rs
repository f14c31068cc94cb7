// --- File: transition.rs ---
// Conway's rule (B3/S23) over a toroidal grid. Mirrors shaders/life.wgsl.
use crate::grid::{CellState, DoubleBuffer, Grid};
use rayon::prelude::*;

pub fn next_state(current: CellState, live_neighbors: u8) -> CellState {
    match (current, live_neighbors) {
        (CellState::Alive, 2 | 3) => CellState::Alive,
        (CellState::Dead, 3) => CellState::Alive,
        _ => CellState::Dead,
    }
}

/// Live cells among the eight wrapped neighbours of `(x, y)`.
pub fn live_neighbors(grid: &Grid, x: usize, y: usize) -> u8 {
    let (w, h) = grid.dimensions();
    let cells = grid.cells();
    let xs = [(x + w - 1) % w, x, (x + 1) % w];
    let ys = [(y + h - 1) % h, y, (y + 1) % h];
    let mut count = 0;
    for (j, &ny) in ys.iter().enumerate() {
        for (i, &nx) in xs.iter().enumerate() {
            if i == 1 && j == 1 {
                continue;
            }
            count += (cells[ny * w + nx] != 0) as u8;
        }
    }
    count
}

/// Writes the next generation of `current` into `next`, one row per rayon task.
///
/// Reads only `current`, so every cell sees the unmodified prior generation.
///
/// # Panics
///
/// Panics if the two grids differ in size.
pub fn step_into(current: &Grid, next: &mut Grid) {
    assert_eq!(
        current.dimensions(),
        next.dimensions(),
        "transition buffers must share dimensions"
    );
    let width = current.width();
    next.cells_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let here = CellState::from_word(current.cells()[y * width + x]);
                *out = next_state(here, live_neighbors(current, x, y)).to_word();
            }
        });
}

/// Pure form: returns the next generation as a fresh grid.
pub fn step(current: &Grid) -> Grid {
    let mut next = current.clone();
    step_into(current, &mut next);
    next
}

/// Advances a double buffer by one generation and flips `current`.
pub fn advance(buffers: &mut DoubleBuffer) {
    let (current, next) = buffers.split();
    step_into(current, next);
    buffers.swap();
}
// --- End of File: transition.rs ---
