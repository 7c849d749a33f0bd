//! Performance benchmark comparing the serial and parallel step paths

use std::time::Instant;

use life_engine::{ConwayRule, Grid};
use rand::{SeedableRng, rngs::StdRng};

fn random_grid(size: usize, seed: u64) -> Grid {
    let mut grid = Grid::new(size, size).expect("benchmark sizes are positive");
    grid.randomize(&mut StdRng::seed_from_u64(seed));
    grid
}

fn benchmark<F>(size: usize, iterations: u32, mut step: F) -> f64
where
    F: FnMut(&Grid, &mut Grid),
{
    let mut grid = random_grid(size, 42);
    let mut next = random_grid(size, 42);

    let start = Instant::now();
    for _ in 0..iterations {
        step(&grid, &mut next);
        std::mem::swap(&mut grid, &mut next);
    }
    start.elapsed().as_secs_f64() * 1000.0 / iterations as f64
}

fn main() {
    let rule = ConwayRule;
    let sizes = [100, 250, 500, 1000, 2000];
    let iterations = 20;

    println!("=== Generation step benchmark ===\n");
    println!("{:>12} {:>12} {:>12} {:>9}", "Size", "Serial", "Parallel", "Speedup");
    println!("{:-<48}", "");

    for size in sizes {
        let serial_ms = benchmark(size, iterations, |grid, next| grid.step_into(next, &rule));
        let parallel_ms =
            benchmark(size, iterations, |grid, next| grid.step_into_parallel(next, &rule));

        println!(
            "{:>12} {:>10.2}ms {:>10.2}ms {:>8.1}x",
            format!("{size}x{size}"),
            serial_ms,
            parallel_ms,
            serial_ms / parallel_ms
        );
    }

    let size = 2000;
    let cells = (size * size) as f64;
    let parallel_ms = benchmark(size, iterations, |grid, next| grid.step_into_parallel(next, &rule));
    println!(
        "\nThroughput at {size}x{size}: {:.1}M cells/sec",
        cells / (parallel_ms / 1000.0) / 1_000_000.0
    );
}
