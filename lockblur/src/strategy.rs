//! The interface shared by the scalar and vectorized convolution paths.
//!
//! The two strategies are interchangeable but not bit-identical: they use
//! different kernels and different border handling, and only the scalar
//! path honors a [`FastPathPolicy`]. Those differences are part of the
//! contract and are reported through [`ConvolutionStrategy::taps`] and
//! [`ConvolutionStrategy::border`].

use crate::grid::{GridMut, ScratchGrid};

/// How a strategy treats kernel taps that fall outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Out-of-range taps are skipped; the divisor stays the full kernel
    /// total, so pixels near an edge come out darker.
    Truncate,
    /// Out-of-range taps read the pixel reflected about the edge
    /// (`-1 -> 0`, `len -> len - 1`).
    Mirror,
}

/// Decides which pixels skip convolution and are copied through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FastPathPolicy {
    /// Only the band within `radius` of each edge is convolved. A pixel at
    /// `index` passes through when `radius < index < extent - radius`.
    #[default]
    EdgeBand,
    /// Every pixel is convolved.
    Never,
}

impl FastPathPolicy {
    /// Returns `true` if the pixel at `index` along an axis of `extent`
    /// pixels is copied through instead of convolved.
    #[inline]
    #[must_use]
    pub fn passes_through(self, index: usize, extent: usize, radius: usize) -> bool {
        match self {
            Self::EdgeBand => radius < index && index < extent.saturating_sub(radius),
            Self::Never => false,
        }
    }
}

/// One implementation of the two-pass separable blur.
///
/// `convolve` receives the surface grid (source of the horizontal pass and
/// destination of the vertical pass) and an engine-owned scratch grid of
/// [`scratch_dims`](Self::scratch_dims). It must overwrite every word of the
/// surface grid it is responsible for and never reads scratch words it has
/// not written.
pub trait ConvolutionStrategy: std::fmt::Debug + Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Kernel length.
    fn taps(&self) -> usize;

    /// Border handling.
    fn border(&self) -> BorderMode;

    /// Dimensions of the scratch grid needed for a `width x height` image.
    fn scratch_dims(&self, width: usize, height: usize) -> (usize, usize) {
        (width, height)
    }

    /// Blurs `image` in place using `scratch` for the intermediate pass.
    fn convolve(&self, image: &mut GridMut<'_>, scratch: &mut ScratchGrid, radius: usize);
}

/// Which strategy [`crate::blur_with`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// Vectorized when the build target has a vector unit, scalar otherwise.
    #[default]
    Auto,
    /// Always the scalar strategy.
    Scalar,
    /// Always the vectorized strategy. `wide` falls back to plain arrays on
    /// targets without a vector unit, so this is correct everywhere, just
    /// not fast everywhere.
    Vectorized,
}

impl StrategyKind {
    /// Resolves [`StrategyKind::Auto`] for the current target.
    #[must_use]
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto if vector_unit_available() => Self::Vectorized,
            Self::Auto => Self::Scalar,
            other => other,
        }
    }
}

/// Whether the target has a vector unit `wide` maps onto.
#[must_use]
pub fn vector_unit_available() -> bool {
    cfg!(any(
        target_feature = "sse2",
        target_feature = "neon",
        target_feature = "simd128"
    ))
}
