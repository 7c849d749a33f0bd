use super::{Cell, rules::Rule};
use crate::error::EngineError;
use rayon::prelude::*;

/// Offsets of the 8-connected Moore neighborhood.
/// Order is irrelevant, the rule only needs a count.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Grid holds one generation of the cell matrix.
///
/// Dimensions are fixed at construction. Access outside them is an
/// [`EngineError::OutOfRange`], never a wrapped or clamped index; neighbor
/// counting is the one place where out-of-bounds coordinates are legal, and
/// there they always read as dead.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    /// Row-major, `width * height` cells.
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a grid with all cells initially dead.
    /// A zero width or height is rejected up front.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![Cell::Dead; width * height],
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// Convert 2D coordinates to 1D index
    const fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<(), EngineError> {
        if x < self.width && y < self.height {
            Ok(())
        } else {
            Err(EngineError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Cell at (x, y), with bounds checking.
    pub fn get(&self, x: usize, y: usize) -> Result<Cell, EngineError> {
        self.check_bounds(x, y)?;
        Ok(self.cells[self.index(x, y)])
    }

    /// Write the cell at (x, y). On out-of-range coordinates the grid is
    /// left untouched.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), EngineError> {
        self.check_bounds(x, y)?;
        let idx = self.index(x, y);
        self.cells[idx] = cell;
        Ok(())
    }

    /// Count live cells in the Moore neighborhood of (x, y).
    ///
    /// Neighbors outside the grid count as dead, so edge and corner cells are
    /// valid inputs and simply see fewer live neighbors. No wraparound.
    pub fn live_neighbors(&self, x: usize, y: usize) -> u8 {
        NEIGHBOR_OFFSETS
            .iter()
            .filter(|(dx, dy)| {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                nx >= 0
                    && (nx as usize) < self.width
                    && ny >= 0
                    && (ny as usize) < self.height
                    && self.cells[self.index(nx as usize, ny as usize)].is_alive()
            })
            .count() as u8
    }

    /// Fill `next` with the generation that follows this one, serially.
    ///
    /// Reads only `self` and overwrites every cell of `next`, so whatever
    /// `next` held before is irrelevant.
    pub fn step_into(&self, next: &mut Grid, rule: &dyn Rule) {
        debug_assert_eq!((self.width, self.height), (next.width, next.height));
        next.cells
            .chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| self.step_row(y, row, rule));
    }

    /// Parallel variant of [`step_into`](Grid::step_into).
    ///
    /// Rows are split across rayon workers, each owning a disjoint slice of
    /// `next` for the duration of the step, so no cell write contends with
    /// another and the result is bit-identical to the serial path.
    pub fn step_into_parallel(&self, next: &mut Grid, rule: &dyn Rule) {
        debug_assert_eq!((self.width, self.height), (next.width, next.height));
        next.cells
            .par_chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| self.step_row(y, row, rule));
    }

    fn step_row(&self, y: usize, row: &mut [Cell], rule: &dyn Rule) {
        for (x, cell) in row.iter_mut().enumerate() {
            let current = self.cells[self.index(x, y)];
            *cell = rule.next_state(current, self.live_neighbors(x, y));
        }
    }

    /// Overwrite every cell with an independently drawn uniform boolean.
    pub fn randomize<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cells
            .iter_mut()
            .for_each(|cell| *cell = rng.random::<bool>().into());
    }

    /// Reset all cells to dead.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = Cell::Dead);
    }

    /// Count of live cells in the whole grid.
    pub fn count_alive(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    /// Iterate over all cells with their positions.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &cell)| (i % self.width, i / self.width, cell))
    }

    /// Dead grid with the same dimensions, skipping re-validation.
    pub(crate) fn empty_like(&self) -> Grid {
        Grid {
            width: self.width,
            height: self.height,
            cells: vec![Cell::Dead; self.width * self.height],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConwayRule;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            Grid::new(0, 10),
            Err(EngineError::InvalidDimension { width: 0, height: 10 })
        );
        assert_eq!(
            Grid::new(10, 0),
            Err(EngineError::InvalidDimension { width: 10, height: 0 })
        );
        assert_eq!(
            Grid::new(0, 0),
            Err(EngineError::InvalidDimension { width: 0, height: 0 })
        );
    }

    #[test]
    fn test_new_grid_is_all_dead() {
        let grid = Grid::new(7, 3).unwrap();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.count_alive(), 0);
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut grid = Grid::new(10, 10).unwrap();
        grid.set(3, 4, Cell::Alive).unwrap();

        assert_eq!(grid.get(3, 4), Ok(Cell::Alive));
        assert_eq!(grid.get(4, 3), Ok(Cell::Dead));
        assert_eq!(grid.count_alive(), 1);
    }

    #[test]
    fn test_out_of_range_access_is_an_error() {
        let mut grid = Grid::new(10, 5).unwrap();

        let err = EngineError::OutOfRange { x: 10, y: 0, width: 10, height: 5 };
        assert_eq!(grid.get(10, 0), Err(err));
        assert_eq!(grid.set(10, 0, Cell::Alive), Err(err));
        assert!(grid.get(0, 5).is_err());
        assert!(grid.get(usize::MAX, usize::MAX).is_err());

        // A rejected write must not have touched anything.
        assert_eq!(grid.count_alive(), 0);
    }

    #[test]
    fn test_live_neighbors_interior() {
        let mut grid = Grid::new(10, 10).unwrap();

        // Horizontal blinker at (4,5), (5,5), (6,5)
        grid.set(4, 5, Cell::Alive).unwrap();
        grid.set(5, 5, Cell::Alive).unwrap();
        grid.set(6, 5, Cell::Alive).unwrap();

        assert_eq!(grid.live_neighbors(5, 5), 2);
        assert_eq!(grid.live_neighbors(5, 4), 3);
        assert_eq!(grid.live_neighbors(5, 6), 3);
    }

    #[test]
    fn test_neighbors_outside_grid_read_as_dead() {
        let mut grid = Grid::new(3, 3).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                grid.set(x, y, Cell::Alive).unwrap();
            }
        }

        // With wraparound a corner would see 8 live neighbors; without it,
        // only the 3 in-bounds ones.
        assert_eq!(grid.live_neighbors(0, 0), 3);
        assert_eq!(grid.live_neighbors(2, 2), 3);
        assert_eq!(grid.live_neighbors(1, 0), 5);
        assert_eq!(grid.live_neighbors(1, 1), 8);

        let mut lone = Grid::new(1, 1).unwrap();
        lone.set(0, 0, Cell::Alive).unwrap();
        assert_eq!(lone.live_neighbors(0, 0), 0);
    }

    #[test]
    fn test_blinker_steps_to_vertical() {
        let rule = ConwayRule;
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set(1, 2, Cell::Alive).unwrap();
        grid.set(2, 2, Cell::Alive).unwrap();
        grid.set(3, 2, Cell::Alive).unwrap();

        let mut next = grid.empty_like();
        grid.step_into(&mut next, &rule);

        assert_eq!(next.count_alive(), 3);
        assert!(next.get(2, 1).unwrap().is_alive());
        assert!(next.get(2, 2).unwrap().is_alive());
        assert!(next.get(2, 3).unwrap().is_alive());
        assert!(!next.get(1, 2).unwrap().is_alive());
        assert!(!next.get(3, 2).unwrap().is_alive());
    }

    #[test]
    fn test_block_is_a_still_life() {
        let rule = ConwayRule;
        let mut grid = Grid::new(6, 6).unwrap();
        grid.set(2, 2, Cell::Alive).unwrap();
        grid.set(3, 2, Cell::Alive).unwrap();
        grid.set(2, 3, Cell::Alive).unwrap();
        grid.set(3, 3, Cell::Alive).unwrap();

        let mut next = grid.empty_like();
        grid.step_into(&mut next, &rule);

        assert_eq!(next, grid);
    }

    #[test]
    fn test_step_overwrites_stale_scratch_contents() {
        let rule = ConwayRule;
        let grid = Grid::new(4, 4).unwrap();

        // Scratch full of garbage from an earlier generation.
        let mut next = grid.empty_like();
        for y in 0..4 {
            for x in 0..4 {
                next.set(x, y, Cell::Alive).unwrap();
            }
        }

        grid.step_into(&mut next, &rule);
        assert_eq!(next.count_alive(), 0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let rule = ConwayRule;
        let mut grid = Grid::new(50, 50).unwrap();
        for i in 0..100 {
            grid.set(i % 50, (i * 7) % 50, Cell::Alive).unwrap();
        }

        let mut serial = grid.empty_like();
        let mut parallel = grid.empty_like();
        grid.step_into(&mut serial, &rule);
        grid.step_into_parallel(&mut parallel, &rule);

        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_randomize_is_seed_reproducible() {
        let mut a = Grid::new(32, 32).unwrap();
        let mut b = Grid::new(32, 32).unwrap();
        a.randomize(&mut StdRng::seed_from_u64(42));
        b.randomize(&mut StdRng::seed_from_u64(42));

        assert_eq!(a, b);
    }

    #[test]
    fn test_randomize_is_roughly_uniform() {
        let mut grid = Grid::new(64, 64).unwrap();
        grid.randomize(&mut StdRng::seed_from_u64(7));

        // 4096 uniform draws; a 35%..65% band is far beyond any plausible
        // deviation for a working generator.
        let alive = grid.count_alive();
        let total = grid.width() * grid.height();
        assert!(alive > total * 35 / 100, "too few alive: {alive}");
        assert!(alive < total * 65 / 100, "too many alive: {alive}");
    }

    #[test]
    fn test_clear_kills_everything() {
        let mut grid = Grid::new(8, 8).unwrap();
        grid.randomize(&mut StdRng::seed_from_u64(1));
        assert!(grid.count_alive() > 0);

        grid.clear();
        assert_eq!(grid.count_alive(), 0);
    }

    #[test]
    fn test_iter_cells_positions() {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set(2, 1, Cell::Alive).unwrap();

        let cells: Vec<_> = grid.iter_cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (0, 0, Cell::Dead));
        assert_eq!(cells[5], (2, 1, Cell::Alive));
    }
}
