// --- File: grid.rs ---
use crate::constants::MAX_GRID_CELLS;
use crate::error::{SimError, SimResult};
use crate::utils::random_cells;
use rand::Rng;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CellState {
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }

    // One u32 per cell, same encoding as the GPU storage buffers
    pub fn to_word(self) -> u32 {
        self as u32
    }

    pub fn from_word(word: u32) -> Self {
        if word != 0 {
            CellState::Alive
        } else {
            CellState::Dead
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InitialState {
    AllDead,
    Random { alive_probability: f64 },
}

/// Row-major index of `(x, y)` after wrapping both coordinates onto the torus.
pub fn wrap_index(width: usize, height: usize, x: isize, y: isize) -> usize {
    let wx = x.rem_euclid(width as isize) as usize;
    let wy = y.rem_euclid(height as isize) as usize;
    wy * width + wx
}

/// Cell count for a `width x height` grid, or `InvalidDimensions` when either
/// side is zero or the grid would not fit a 32-bit addressed cell buffer.
pub fn checked_cell_count(width: usize, height: usize) -> SimResult<usize> {
    width
        .checked_mul(height)
        .filter(|&count| count > 0 && count <= MAX_GRID_CELLS)
        .ok_or(SimError::InvalidDimensions { width, height })
}

/// Fixed-size toroidal grid of cells. Dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Grid {
    pub fn new<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        initial: InitialState,
        rng: &mut R,
    ) -> SimResult<Self> {
        let mut grid = Self::dead(width, height)?;
        if let InitialState::Random { alive_probability } = initial {
            grid.cells = random_cells(rng, width * height, alive_probability);
        }
        Ok(grid)
    }

    pub fn dead(width: usize, height: usize) -> SimResult<Self> {
        let count = checked_cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![0; count],
        })
    }

    /// Builds a dead grid and marks the listed `(x, y)` cells alive.
    pub fn from_alive(width: usize, height: usize, alive: &[(isize, isize)]) -> SimResult<Self> {
        let mut grid = Self::dead(width, height)?;
        for &(x, y) in alive {
            grid.set(x, y, CellState::Alive);
        }
        Ok(grid)
    }

    pub const fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, x: isize, y: isize) -> CellState {
        CellState::from_word(self.cells[wrap_index(self.width, self.height, x, y)])
    }

    pub fn set(&mut self, x: isize, y: isize, state: CellState) {
        let idx = wrap_index(self.width, self.height, x, y);
        self.cells[idx] = state.to_word();
    }

    pub fn fill(&mut self, state: CellState) {
        self.cells.fill(state.to_word());
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Alive cells as `(x, y)` pairs in row-major order.
    pub fn alive_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .map(|(i, _)| (i % self.width, i / self.width))
            .collect()
    }

    /// Raw cell words, ready for `bytemuck::cast_slice`.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u32] {
        &mut self.cells
    }
}

/// Two equally sized grids; `current` is selected by an index flip, never a copy.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    buffers: [Grid; 2],
    current: usize,
}

impl DoubleBuffer {
    pub fn new(initial: Grid) -> Self {
        let mut next = initial.clone();
        next.fill(CellState::Dead);
        Self {
            buffers: [initial, next],
            current: 0,
        }
    }

    pub fn current(&self) -> &Grid {
        &self.buffers[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Grid {
        &mut self.buffers[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Read-only `current` alongside writable `next`.
    pub fn split(&mut self) -> (&Grid, &mut Grid) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.current().dimensions()
    }
}
// --- End of File: grid.rs ---

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            Grid::dead(0, 4).unwrap_err(),
            SimError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Grid::new(4, 0, InitialState::AllDead, &mut rng).is_err());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let err = Grid::dead(usize::MAX, 2).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidDimensions {
                width: usize::MAX,
                height: 2
            }
        );
        assert!(checked_cell_count(MAX_GRID_CELLS, 2).is_err());
        assert!(checked_cell_count(1 << 16, 1 << 16).is_err());
        assert_eq!(checked_cell_count(MAX_GRID_CELLS, 1), Ok(MAX_GRID_CELLS));
        assert_eq!(checked_cell_count(300, 200), Ok(60_000));
    }

    #[test]
    fn test_all_dead_creation() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = Grid::new(8, 6, InitialState::AllDead, &mut rng).unwrap();
        assert_eq!(grid.dimensions(), (8, 6));
        assert_eq!(grid.len(), 48);
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn test_random_creation_is_seeded() {
        let initial = InitialState::Random {
            alive_probability: 0.5,
        };
        let a = Grid::new(16, 16, initial, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = Grid::new(16, 16, initial, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
        assert!(a.alive_count() > 0);
    }

    #[test]
    fn test_toroidal_get_set() {
        let mut grid = Grid::dead(4, 3).unwrap();
        grid.set(-1, -1, CellState::Alive);
        assert_eq!(grid.get(3, 2), CellState::Alive);
        assert_eq!(grid.get(7, 5), CellState::Alive);
        assert_eq!(grid.get(-5, -4), CellState::Alive);
        assert_eq!(grid.alive_cells(), vec![(3, 2)]);

        grid.set(4, 0, CellState::Alive);
        assert_eq!(grid.get(0, 0), CellState::Alive);
    }

    #[test]
    fn test_wrap_index() {
        assert_eq!(wrap_index(4, 4, 0, 0), 0);
        assert_eq!(wrap_index(4, 4, -1, 0), 3);
        assert_eq!(wrap_index(4, 4, 0, -1), 12);
        assert_eq!(wrap_index(4, 4, 5, 5), 5);
    }

    #[test]
    fn test_swap_round_trip() {
        let mut buffers = DoubleBuffer::new(Grid::from_alive(4, 4, &[(1, 1)]).unwrap());
        let original = buffers.current_index();
        buffers.swap();
        assert_ne!(buffers.current_index(), original);
        assert_eq!(buffers.current().alive_count(), 0);
        buffers.swap();
        assert_eq!(buffers.current_index(), original);
        assert_eq!(buffers.current().alive_cells(), vec![(1, 1)]);
    }

    #[test]
    fn test_split_returns_distinct_buffers() {
        let mut buffers = DoubleBuffer::new(Grid::from_alive(3, 3, &[(0, 0)]).unwrap());
        {
            let (current, next) = buffers.split();
            assert_eq!(current.alive_count(), 1);
            next.set(2, 2, CellState::Alive);
        }
        buffers.swap();
        assert_eq!(buffers.current().alive_cells(), vec![(2, 2)]);
        buffers.swap();
        let (current, next) = buffers.split();
        assert_eq!(current.alive_cells(), vec![(0, 0)]);
        assert_eq!(next.alive_cells(), vec![(2, 2)]);
    }
}
