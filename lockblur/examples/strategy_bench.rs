//! Benchmark comparing the scalar and vectorized blur strategies.
//!
//! Times full blurs of a screen-sized ARGB32 surface, then a single
//! transposed box pass against a single scalar horizontal pass to show where
//! the time goes.
//!
//! Run with: `cargo run --release --example strategy_bench --features internals`

use lockblur::grid::ScratchGrid;
use lockblur::kernel::Kernel;
use lockblur::scalar::horizontal_pass;
use lockblur::simd::{box_pass_transposed, box_passes};
use lockblur::{
    blur_with_strategy, ConvolutionStrategy, FastPathPolicy, PixelFormat, ScalarStrategy, Surface,
    VectorizedStrategy,
};
use std::time::{Duration, Instant};

fn test_surface(width: usize, height: usize) -> Surface {
    let mut surface = Surface::new(PixelFormat::Argb32, width, height).unwrap();
    let stride = surface.stride() / 4;
    for (i, word) in surface.words_mut().iter_mut().enumerate() {
        let (x, y) = (i % stride, i / stride);
        let v = ((x + y) % 256) as u32;
        *word = 0xff00_0000 | (v << 16) | ((255 - v) << 8) | (x as u32 & 0xff);
    }
    surface
}

fn time_blur(
    strategy: &dyn ConvolutionStrategy,
    input: &Surface,
    radius: usize,
    iterations: u32,
) -> Duration {
    // Warm up
    let mut surface = input.clone();
    blur_with_strategy(&mut surface, radius, strategy).unwrap();

    let mut total = Duration::ZERO;
    for _ in 0..iterations {
        let mut surface = input.clone();
        let start = Instant::now();
        blur_with_strategy(&mut surface, radius, strategy).unwrap();
        total += start.elapsed();
    }
    total / iterations
}

fn main() {
    let width = 1920;
    let height = 1080;
    let iterations = 10;
    let input = test_surface(width, height);

    println!("Surface: {width}x{height} argb32");
    println!("Iterations: {iterations}");
    println!();

    let scalar_edge = ScalarStrategy::default();
    let scalar_full = ScalarStrategy::new(Kernel::scalar_default(), FastPathPolicy::Never);
    let vectorized = VectorizedStrategy::new();

    println!(
        "{:>6} {:>14} {:>14} {:>14} {:>6}",
        "radius", "scalar edge", "scalar full", "vectorized", "boxes"
    );
    for radius in [2, 4, 8] {
        let edge = time_blur(&scalar_edge, &input, radius, iterations);
        let full = time_blur(&scalar_full, &input, radius, iterations);
        let vec = time_blur(&vectorized, &input, radius, iterations);
        println!(
            "{radius:>6} {:>11.2} ms {:>11.2} ms {:>11.2} ms {:>6}",
            edge.as_secs_f64() * 1000.0,
            full.as_secs_f64() * 1000.0,
            vec.as_secs_f64() * 1000.0,
            box_passes(radius),
        );
    }
    println!();

    // Single 1D passes over the same words.
    let src = ScratchGrid::from_vec(input.words().to_vec(), width, height);
    let mut same = ScratchGrid::try_new(width, height).unwrap();
    let mut transposed = ScratchGrid::try_new(height, width).unwrap();
    let kernel = Kernel::scalar_default();
    let box_kernel = Kernel::box_default();

    let start = Instant::now();
    for _ in 0..iterations {
        horizontal_pass(&src, &mut same, &kernel, 0, FastPathPolicy::Never);
    }
    let scalar_pass = start.elapsed() / iterations;

    let start = Instant::now();
    for _ in 0..iterations {
        box_pass_transposed(&src, &mut transposed, &box_kernel);
    }
    let box_pass = start.elapsed() / iterations;

    println!("Single pass:");
    println!(
        "  scalar 17-tap:          {:.2} ms",
        scalar_pass.as_secs_f64() * 1000.0
    );
    println!(
        "  vectorized 7-tap (T):   {:.2} ms ({:.1}x)",
        box_pass.as_secs_f64() * 1000.0,
        scalar_pass.as_secs_f64() / box_pass.as_secs_f64()
    );
}
