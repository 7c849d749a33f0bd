//! Simulation engine: generation counting, the double-buffered publish
//! protocol, and the background advance orchestration.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::Rng;
use tracing::{debug, trace};

use crate::domain::{Cell, ConwayRule, Grid, Rule};
use crate::error::EngineError;

/// Simulation owns the published grid and orchestrates generation advances.
///
/// Two orchestration shapes are supported:
/// - [`advance`](Simulation::advance) blocks the caller until the next
///   generation is computed and published;
/// - [`begin_advance`](Simulation::begin_advance) starts the computation on a
///   worker thread; [`is_running`](Simulation::is_running) polls it and
///   [`wait`](Simulation::wait) publishes its result.
///
/// At most one advance is in flight per engine; a second `begin_advance` is a
/// no-op and a blocking `advance` is rejected with
/// [`EngineError::AlreadyRunning`]. Nothing queues.
///
/// The publish step (buffer swap plus generation increment) happens in a
/// single `&mut self` call, so readers going through `&self` can never
/// observe a half-swapped state or a counter that disagrees with the grid.
/// Readers on other threads take [`snapshot`](Simulation::snapshot) handles,
/// which keep reading their generation unchanged across any later publish.
pub struct Simulation {
    current: Arc<Grid>,
    /// Reusable write target for the next generation. `None` while a worker
    /// owns it, or when a snapshot kept the displaced generation alive.
    /// Its contents between advances are unspecified; a step overwrites every
    /// cell before the buffer is ever published.
    scratch: Option<Grid>,
    rule: Arc<dyn Rule>,
    generation: u64,
    in_flight: Option<JoinHandle<Grid>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("width", &self.current.width())
            .field("height", &self.current.height())
            .field("generation", &self.generation)
            .field("in_flight", &self.in_flight.is_some())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Engine with all cells dead, evolving under Conway's B3/S23.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        Self::with_rule(width, height, Arc::new(ConwayRule))
    }

    /// Engine with a caller-supplied transition rule.
    pub fn with_rule(
        width: usize,
        height: usize,
        rule: Arc<dyn Rule>,
    ) -> Result<Self, EngineError> {
        let current = Grid::new(width, height)?;
        let scratch = current.empty_like();
        Ok(Self {
            current: Arc::new(current),
            scratch: Some(scratch),
            rule,
            generation: 0,
            in_flight: None,
        })
    }

    pub fn width(&self) -> usize {
        self.current.width()
    }

    pub fn height(&self) -> usize {
        self.current.height()
    }

    /// Number of completed advances since the last seed.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Cell in the published generation, with bounds checking.
    pub fn get(&self, x: usize, y: usize) -> Result<Cell, EngineError> {
        self.current.get(x, y)
    }

    /// Write a cell into the published generation, a seeding mechanism for
    /// use between advances.
    ///
    /// A write made while an advance is in flight is memory-safe (the worker
    /// keeps reading the snapshot it started from) but is overwritten when
    /// that advance publishes, so seed before starting one.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) -> Result<(), EngineError> {
        Arc::make_mut(&mut self.current).set(x, y, cell)
    }

    /// Flip a single cell and return its new state (interactive seeding).
    pub fn toggle(&mut self, x: usize, y: usize) -> Result<Cell, EngineError> {
        let cell = self.current.get(x, y)?.toggle();
        Arc::make_mut(&mut self.current).set(x, y, cell)?;
        Ok(cell)
    }

    /// Kill every cell and reset the generation counter.
    pub fn clear(&mut self) {
        Arc::make_mut(&mut self.current).clear();
        self.generation = 0;
        debug!("grid cleared");
    }

    /// Reseed every cell with an independently drawn uniform boolean and
    /// reset the generation counter.
    pub fn randomize(&mut self) {
        self.randomize_with(&mut rand::rng());
    }

    /// [`randomize`](Simulation::randomize) with a caller-supplied source,
    /// so seeding is reproducible (`StdRng::seed_from_u64` in tests).
    pub fn randomize_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        Arc::make_mut(&mut self.current).randomize(rng);
        self.generation = 0;
        debug!(alive = self.current.count_alive(), "grid reseeded");
    }

    /// Live-cell population of the published generation.
    pub fn count_alive(&self) -> usize {
        self.current.count_alive()
    }

    /// Cheap handle to the published generation.
    ///
    /// The grid behind it never mutates, so a snapshot taken before an
    /// advance still reads the old generation after that advance publishes.
    pub fn snapshot(&self) -> Arc<Grid> {
        Arc::clone(&self.current)
    }

    /// Compute and publish the next generation, blocking until done.
    ///
    /// Every cell of the scratch buffer is written from the published grid
    /// before the buffers swap roles, so the new generation becomes visible
    /// all at once. Returns [`EngineError::AlreadyRunning`] while a
    /// background advance started by [`begin_advance`](Simulation::begin_advance)
    /// has not been [`wait`](Simulation::wait)ed yet.
    pub fn advance(&mut self) -> Result<(), EngineError> {
        if self.in_flight.is_some() {
            return Err(EngineError::AlreadyRunning);
        }
        let mut next = self.take_scratch();
        self.current.step_into_parallel(&mut next, self.rule.as_ref());
        self.publish(next);
        Ok(())
    }

    /// Start computing the next generation on a worker thread.
    ///
    /// The worker reads a snapshot of the published grid and owns the scratch
    /// buffer until [`wait`](Simulation::wait) collects it; the result is not
    /// observable before then. Calling this while an advance is already in
    /// flight is a no-op, nothing queues. A started advance always runs to
    /// completion, there is no cancellation.
    pub fn begin_advance(&mut self) {
        if self.in_flight.is_some() {
            trace!("begin_advance ignored, an advance is already in flight");
            return;
        }
        let current = Arc::clone(&self.current);
        let rule = Arc::clone(&self.rule);
        let mut next = self.take_scratch();
        self.in_flight = Some(thread::spawn(move || {
            current.step_into_parallel(&mut next, rule.as_ref());
            next
        }));
        debug!(generation = self.generation, "background advance started");
    }

    /// Non-blocking poll: true while a background advance is still computing.
    pub fn is_running(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Block until the in-flight advance, if any, completes and publish its
    /// result. A no-op when nothing is in flight.
    pub fn wait(&mut self) {
        if let Some(worker) = self.in_flight.take() {
            let next = worker.join().expect("advance worker panicked");
            self.publish(next);
        }
    }

    /// Swap the freshly computed grid in as the published generation and
    /// count it. The displaced generation is reclaimed as the next scratch
    /// buffer unless a snapshot still holds it.
    fn publish(&mut self, next: Grid) {
        let displaced = std::mem::replace(&mut self.current, Arc::new(next));
        self.scratch = Arc::try_unwrap(displaced).ok();
        self.generation += 1;
        debug!(generation = self.generation, "generation published");
    }

    fn take_scratch(&mut self) -> Grid {
        self.scratch
            .take()
            .unwrap_or_else(|| self.current.empty_like())
    }
}
