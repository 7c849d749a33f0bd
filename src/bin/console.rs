//! Terminal driver for the simulation engine.
//!
//! External collaborator only: it seeds the grid, then repeatedly starts a
//! background advance, waits for it, and repaints from the read-only cell
//! interface. Nothing in the library depends on it.

use std::thread;
use std::time::Duration;

use life_engine::{EngineError, Simulation};
use tracing_subscriber::EnvFilter;

const WIDTH: usize = 64;
const HEIGHT: usize = 32;
const GENERATIONS: u64 = 200;
const FRAME_DELAY: Duration = Duration::from_millis(80);

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut sim = Simulation::new(WIDTH, HEIGHT)?;
    sim.randomize();

    while sim.generation() < GENERATIONS {
        sim.begin_advance();
        sim.wait();
        draw(&sim)?;
        thread::sleep(FRAME_DELAY);
    }
    Ok(())
}

fn draw(sim: &Simulation) -> Result<(), EngineError> {
    let mut frame = String::with_capacity((sim.width() + 1) * sim.height() + 16);
    frame.push_str("\x1B[2J\x1B[H");
    for y in 0..sim.height() {
        for x in 0..sim.width() {
            frame.push(if sim.get(x, y)?.is_alive() { '#' } else { '.' });
        }
        frame.push('\n');
    }
    println!(
        "{frame}generation {:>4}  population {:>5}",
        sim.generation(),
        sim.count_alive()
    );
    Ok(())
}
