//! # lockblur
//!
//! Separable Gaussian blur for packed-pixel surfaces, as used to obscure a
//! screenshot behind a lock screen.
//!
//! A blur is two 1-D passes: rows into an engine-owned scratch grid, then
//! columns back into the surface. Two strategies implement it:
//! - **Scalar**: 17-tap integer Gaussian, truncating borders, and an
//!   interior fast path that leaves pixels further than `radius` from every
//!   edge untouched (see [`FastPathPolicy`])
//! - **Vectorized**: repeated 7-tap box passes on `f32x8` lanes with
//!   mirrored borders, blurring every pixel
//!
//! The two agree visually, not bit for bit.
//!
//! ## Example
//!
//! ```rust
//! use lockblur::{blur, PixelFormat, Surface};
//!
//! let mut surface = Surface::new(PixelFormat::Argb32, 16, 16).unwrap();
//! surface.words_mut().fill(0xffff_0000);
//!
//! blur(&mut surface, 2)?;
//! assert!(surface.is_dirty());
//! # Ok::<(), lockblur::BlurError>(())
//! ```
//!
//! ## Pixel formats
//!
//! - `Argb32`, `Rgb24`: one pixel per 32-bit word, channels blurred
//!   independently
//! - `A8`: four alpha bytes per word; the last `width % 4` pixels of each
//!   row are left as they are
//! - `A1`: rejected with [`BlurError::UnsupportedFormat`]
//!
//! ## Features
//!
//! - **`internals`**: Expose internal modules for testing/benchmarking (unstable API)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod engine;
#[cfg(not(feature = "internals"))]
pub(crate) mod engine;

#[cfg(feature = "internals")]
pub mod format;
#[cfg(not(feature = "internals"))]
pub(crate) mod format;

#[cfg(feature = "internals")]
pub mod grid;
#[cfg(not(feature = "internals"))]
pub(crate) mod grid;

#[cfg(feature = "internals")]
pub mod kernel;
#[cfg(not(feature = "internals"))]
pub(crate) mod kernel;

#[cfg(feature = "internals")]
pub mod scalar;
#[cfg(not(feature = "internals"))]
pub(crate) mod scalar;

#[cfg(feature = "internals")]
pub mod simd;
#[cfg(not(feature = "internals"))]
pub(crate) mod simd;

pub mod strategy;
pub mod surface;

pub use grid::{GridMut, ScratchGrid, WordGrid};
pub use kernel::{Kernel, KernelError};
pub use scalar::ScalarStrategy;
pub use simd::VectorizedStrategy;
pub use strategy::{BorderMode, ConvolutionStrategy, FastPathPolicy, StrategyKind};
pub use surface::{PixelFormat, Surface, SurfaceError, SurfaceStatus};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGBA8;

use format::WordLayout;

/// Reasons a blur was skipped. The surface is unchanged and not marked dirty
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BlurError {
    /// The surface's pixel format cannot be blurred.
    UnsupportedFormat {
        /// Format of the rejected surface.
        format: PixelFormat,
    },
    /// The surface was marked failed before the call.
    InvalidSurface,
    /// The scratch buffer could not be allocated.
    AllocationFailed {
        /// Number of 32-bit words requested.
        words: usize,
    },
}

impl std::fmt::Display for BlurError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { format } => {
                write!(f, "unsupported pixel format: {format}")
            }
            Self::InvalidSurface => write!(f, "surface is in a failed state"),
            Self::AllocationFailed { words } => {
                write!(f, "could not allocate scratch buffer of {words} words")
            }
        }
    }
}

impl std::error::Error for BlurError {}

/// Blur parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use lockblur::{BlurParams, FastPathPolicy, Kernel, StrategyKind};
///
/// let params = BlurParams::new()
///     .with_strategy(StrategyKind::Scalar)   // portable path
///     .with_fast_path(FastPathPolicy::Never) // blur the interior too
///     .with_scalar_kernel(Kernel::box_filter(5)?);
/// # Ok::<(), lockblur::KernelError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlurParams {
    strategy: StrategyKind,
    fast_path: FastPathPolicy,
    scalar_kernel: Option<Kernel>,
}

impl BlurParams {
    /// Creates a new `BlurParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the strategy. Defaults to [`StrategyKind::Auto`].
    #[must_use]
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the scalar strategy's fast-path policy. Defaults to
    /// [`FastPathPolicy::EdgeBand`]. The vectorized strategy ignores it.
    #[must_use]
    pub fn with_fast_path(mut self, fast_path: FastPathPolicy) -> Self {
        self.fast_path = fast_path;
        self
    }

    /// Replaces the scalar strategy's 17-tap Gaussian.
    #[must_use]
    pub fn with_scalar_kernel(mut self, kernel: Kernel) -> Self {
        self.scalar_kernel = Some(kernel);
        self
    }

    /// Returns the selected strategy (possibly `Auto`).
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Returns the fast-path policy.
    #[must_use]
    pub fn fast_path(&self) -> FastPathPolicy {
        self.fast_path
    }

    /// Returns the custom scalar kernel, if one was set.
    #[must_use]
    pub fn scalar_kernel(&self) -> Option<&Kernel> {
        self.scalar_kernel.as_ref()
    }
}

/// Blurs `surface` in place with default parameters.
///
/// # Errors
/// See [`blur_with`].
pub fn blur(surface: &mut Surface, radius: usize) -> Result<(), BlurError> {
    blur_with(surface, radius, &BlurParams::default())
}

/// Blurs `surface` in place.
///
/// On success the surface's modification counter has been bumped (unless
/// there was nothing to blur, e.g. a zero-sized surface). On error nothing
/// was written and nothing stays allocated.
///
/// # Errors
/// - [`BlurError::InvalidSurface`] if the surface is marked failed
/// - [`BlurError::UnsupportedFormat`] for `A1` surfaces
/// - [`BlurError::AllocationFailed`] if the scratch buffer can't be reserved
///
/// # Example
/// ```rust
/// use lockblur::{blur_with, BlurParams, PixelFormat, StrategyKind, Surface};
///
/// let mut surface = Surface::new(PixelFormat::A1, 32, 32)?;
/// let params = BlurParams::new().with_strategy(StrategyKind::Vectorized);
/// assert!(blur_with(&mut surface, 3, &params).is_err());
/// assert!(!surface.is_dirty());
/// # Ok::<(), lockblur::SurfaceError>(())
/// ```
pub fn blur_with(
    surface: &mut Surface,
    radius: usize,
    params: &BlurParams,
) -> Result<(), BlurError> {
    // Validate before building anything so rejected calls never allocate.
    let layout = checked_layout(surface)?;

    let kind = params.strategy.resolve();
    log::trace!("strategy {:?} resolved to {kind:?}", params.strategy);
    match kind {
        StrategyKind::Vectorized => {
            engine::run(surface, layout, radius, &VectorizedStrategy::new())
        }
        _ => {
            let kernel = params
                .scalar_kernel
                .clone()
                .unwrap_or_else(Kernel::scalar_default);
            let strategy = ScalarStrategy::new(kernel, params.fast_path);
            engine::run(surface, layout, radius, &strategy)
        }
    }
}

/// Blurs `surface` in place with a caller-supplied strategy.
///
/// # Errors
/// Same as [`blur_with`].
pub fn blur_with_strategy(
    surface: &mut Surface,
    radius: usize,
    strategy: &dyn ConvolutionStrategy,
) -> Result<(), BlurError> {
    let layout = checked_layout(surface)?;
    engine::run(surface, layout, radius, strategy)
}

fn checked_layout(surface: &Surface) -> Result<WordLayout, BlurError> {
    WordLayout::for_surface(surface).map_err(|e| {
        log::debug!(
            "blur skipped on {}x{} {} surface: {e}",
            surface.width(),
            surface.height(),
            surface.format()
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red(width: usize, height: usize) -> Surface {
        let mut surface = Surface::new(PixelFormat::Argb32, width, height).unwrap();
        surface.words_mut().fill(0xffff_0000);
        surface
    }

    #[test]
    fn test_params_builder() {
        let params = BlurParams::new()
            .with_strategy(StrategyKind::Scalar)
            .with_fast_path(FastPathPolicy::Never)
            .with_scalar_kernel(Kernel::identity());
        assert_eq!(params.strategy(), StrategyKind::Scalar);
        assert_eq!(params.fast_path(), FastPathPolicy::Never);
        assert_eq!(params.scalar_kernel(), Some(&Kernel::identity()));

        let defaults = BlurParams::default();
        assert_eq!(defaults.strategy(), StrategyKind::Auto);
        assert_eq!(defaults.fast_path(), FastPathPolicy::EdgeBand);
        assert!(defaults.scalar_kernel().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = BlurError::UnsupportedFormat {
            format: PixelFormat::A1,
        };
        assert_eq!(err.to_string(), "unsupported pixel format: a1");
        assert_eq!(
            BlurError::AllocationFailed { words: 12 }.to_string(),
            "could not allocate scratch buffer of 12 words"
        );
    }

    #[test]
    fn test_vectorized_uniform_unchanged() {
        let mut surface = red(10, 10);
        let params = BlurParams::new().with_strategy(StrategyKind::Vectorized);
        blur_with(&mut surface, 2, &params).unwrap();
        assert!(surface.words().iter().all(|&w| w == 0xffff_0000));
        assert_eq!(surface.modification_count(), 1);
    }

    #[test]
    fn test_scalar_uniform_interior_unchanged() {
        let mut surface = red(10, 10);
        let params = BlurParams::new().with_strategy(StrategyKind::Scalar);
        blur_with(&mut surface, 2, &params).unwrap();
        for y in 3..=7 {
            for x in 3..=7 {
                assert_eq!(surface.pixel(x, y), 0xffff_0000, "({x}, {y})");
            }
        }
        // Corner: both passes truncated, so darker than the edge midpoint.
        assert!(surface.pixel(0, 0) < surface.pixel(0, 5));
    }

    #[test]
    fn test_failed_surface_rejected() {
        let mut surface = red(4, 4);
        surface.mark_failed();
        let before = surface.clone();
        assert_eq!(blur(&mut surface, 1), Err(BlurError::InvalidSurface));
        assert_eq!(surface, before);
    }

    #[test]
    fn test_custom_strategy() {
        let mut surface = red(6, 6);
        let strategy = ScalarStrategy::new(Kernel::identity(), FastPathPolicy::Never);
        blur_with_strategy(&mut surface, 1, &strategy).unwrap();
        assert!(surface.words().iter().all(|&w| w == 0xffff_0000));
        assert!(surface.is_dirty());
    }
}
