//! Scalar and vectorized strategies agree on what matters visually.
//!
//! They differ in kernel, border handling and fast path, so outputs are not
//! bit-identical. Away from the borders, on smooth content, they should
//! be within a few levels of each other and of the input.

mod common;

use common::generators::{gen_gradient, gen_noise};
use common::uniform_surface;
use lockblur::{
    blur_with, blur_with_strategy, BlurParams, BorderMode, ConvolutionStrategy, FastPathPolicy,
    PixelFormat, ScalarStrategy, StrategyKind, Surface, VectorizedStrategy,
};

/// Largest channel difference over pixels at least `margin` from every edge.
fn interior_max_diff(a: &Surface, b: &Surface, margin: usize) -> u8 {
    let mut max = 0;
    for y in margin..a.height() - margin {
        for x in margin..a.width() - margin {
            let (pa, pb) = (a.pixel(x, y).to_be_bytes(), b.pixel(x, y).to_be_bytes());
            for (ca, cb) in pa.iter().zip(pb) {
                max = max.max(ca.abs_diff(cb));
            }
        }
    }
    max
}

/// Mean absolute difference between horizontally adjacent channels, over
/// pixels at least `margin` from every edge.
fn interior_roughness(s: &Surface, margin: usize) -> f64 {
    let mut sum = 0u64;
    let mut n = 0u64;
    for y in margin..s.height() - margin {
        for x in margin..s.width() - margin - 1 {
            let (p, q) = (s.pixel(x, y).to_be_bytes(), s.pixel(x + 1, y).to_be_bytes());
            for (a, b) in p.iter().zip(q) {
                sum += u64::from(a.abs_diff(b));
                n += 1;
            }
        }
    }
    sum as f64 / n as f64
}

#[test]
fn test_contracts_differ_as_documented() {
    let scalar = ScalarStrategy::default();
    let vectorized = VectorizedStrategy::new();

    assert_eq!(scalar.taps(), 17);
    assert_eq!(scalar.border(), BorderMode::Truncate);
    assert_eq!(scalar.fast_path(), FastPathPolicy::EdgeBand);
    assert_eq!(vectorized.taps(), 7);
    assert_eq!(vectorized.border(), BorderMode::Mirror);
    assert_ne!(scalar.name(), vectorized.name());
}

#[test]
fn test_smooth_gradient_interior_agrees() {
    let input = gen_gradient(64, 48);

    // Convolve the interior too, so both sides really filter.
    let mut scalar = input.clone();
    let params = BlurParams::new()
        .with_strategy(StrategyKind::Scalar)
        .with_fast_path(FastPathPolicy::Never);
    blur_with(&mut scalar, 2, &params).unwrap();
    let mut vectorized = input.clone();
    blur_with(
        &mut vectorized,
        2,
        &BlurParams::new().with_strategy(StrategyKind::Vectorized),
    )
    .unwrap();

    // Three box passes reach nine pixels and the 17-tap kernel eight;
    // stay clear of both border treatments.
    let margin = 10;
    let diff = interior_max_diff(&scalar, &vectorized, margin);
    assert!(diff <= 2, "strategies differ by {diff} levels on a gradient");
    assert!(interior_max_diff(&scalar, &input, margin) <= 2);
    assert!(interior_max_diff(&vectorized, &input, margin) <= 2);
}

#[test]
fn test_both_smooth_noise() {
    let input = gen_noise(48, 48, 1234);
    let before = interior_roughness(&input, 8);

    let mut scalar = input.clone();
    let params = BlurParams::new()
        .with_strategy(StrategyKind::Scalar)
        .with_fast_path(FastPathPolicy::Never);
    blur_with(&mut scalar, 4, &params).unwrap();

    let mut vectorized = input.clone();
    blur_with_strategy(&mut vectorized, 4, &VectorizedStrategy::new()).unwrap();

    let scalar_after = interior_roughness(&scalar, 8);
    let vectorized_after = interior_roughness(&vectorized, 8);
    assert!(
        scalar_after < before / 4.0,
        "scalar roughness {scalar_after:.2} vs input {before:.2}"
    );
    assert!(
        vectorized_after < before / 4.0,
        "vectorized roughness {vectorized_after:.2} vs input {before:.2}"
    );
}

#[test]
fn test_uniform_interior_agrees() {
    for word in [0x0000_0000, 0xffff_ffff, 0x8012_34ff, 0xff80_8080] {
        let mut scalar = uniform_surface(PixelFormat::Argb32, 20, 20, word);
        let mut vectorized = scalar.clone();
        blur_with_strategy(&mut scalar, 3, &ScalarStrategy::default()).unwrap();
        blur_with_strategy(&mut vectorized, 3, &VectorizedStrategy::new()).unwrap();

        assert!(vectorized.words().iter().all(|&w| w == word), "{word:#010x}");
        assert_eq!(interior_max_diff(&scalar, &vectorized, 4), 0, "{word:#010x}");
    }
}

#[test]
fn test_auto_matches_resolved_strategy() {
    let input = gen_noise(31, 9, 77);
    let resolved = StrategyKind::Auto.resolve();

    let mut auto = input.clone();
    blur_with(&mut auto, 3, &BlurParams::default()).unwrap();
    let mut explicit = input.clone();
    blur_with(&mut explicit, 3, &BlurParams::new().with_strategy(resolved)).unwrap();

    assert_eq!(auto, explicit);
}

#[test]
fn test_vectorized_radius_widens_blur() {
    // A single bright pixel spreads further with more box passes.
    let mut small = uniform_surface(PixelFormat::Argb32, 41, 41, 0);
    let mut words = small.words().to_vec();
    words[20 * 41 + 20] = 0xffff_ffff;
    small = Surface::from_words(PixelFormat::Argb32, 41, 41, 41 * 4, words).unwrap();
    let mut large = small.clone();

    blur_with_strategy(&mut small, 2, &VectorizedStrategy::new()).unwrap();
    blur_with_strategy(&mut large, 6, &VectorizedStrategy::new()).unwrap();

    // Center drops further with the larger spread.
    assert!(large.pixel(20, 20) < small.pixel(20, 20));
}
