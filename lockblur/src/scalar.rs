//! Portable scalar strategy.
//!
//! One pixel, four channels at a time, with a 17-tap Gaussian by default.
//! Taps falling outside the image are dropped while the divisor stays the
//! full kernel total, so the convolved edge band darkens slightly. Pixels the
//! [`FastPathPolicy`] passes through are copied verbatim.

use crate::grid::{pack, unpack, GridMut, ScratchGrid, WordGrid};
use crate::kernel::Kernel;
use crate::strategy::{BorderMode, ConvolutionStrategy, FastPathPolicy};

/// Scalar two-pass blur: surface -> scratch horizontally, scratch -> surface
/// vertically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarStrategy {
    kernel: Kernel,
    fast_path: FastPathPolicy,
}

impl ScalarStrategy {
    /// Creates a strategy with an explicit kernel and fast-path policy.
    #[must_use]
    pub fn new(kernel: Kernel, fast_path: FastPathPolicy) -> Self {
        Self { kernel, fast_path }
    }

    /// The kernel this strategy convolves with.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// The fast-path policy in effect.
    #[must_use]
    pub fn fast_path(&self) -> FastPathPolicy {
        self.fast_path
    }
}

impl Default for ScalarStrategy {
    fn default() -> Self {
        Self::new(Kernel::scalar_default(), FastPathPolicy::EdgeBand)
    }
}

impl ConvolutionStrategy for ScalarStrategy {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn taps(&self) -> usize {
        self.kernel.len()
    }

    fn border(&self) -> BorderMode {
        BorderMode::Truncate
    }

    fn convolve(&self, image: &mut GridMut<'_>, scratch: &mut ScratchGrid, radius: usize) {
        horizontal_pass(image, scratch, &self.kernel, radius, self.fast_path);
        vertical_pass(scratch, image, &self.kernel, radius, self.fast_path);
    }
}

/// Weighted sum of the samples around `center` along an axis of `extent`
/// pixels, divided by the kernel total.
#[inline]
fn convolve_at(
    kernel: &Kernel,
    extent: usize,
    center: usize,
    sample: impl Fn(usize) -> u32,
) -> u32 {
    let half = kernel.half();
    let mut acc = [0u32; 4];

    for (k, &weight) in kernel.weights().iter().enumerate() {
        let Some(pos) = (center + k).checked_sub(half) else {
            continue;
        };
        if pos >= extent {
            continue;
        }
        let channels = unpack(sample(pos));
        let weight = u32::from(weight);
        for (a, c) in acc.iter_mut().zip(channels) {
            *a += c * weight;
        }
    }

    let total = kernel.total();
    pack(acc.map(|a| a / total))
}

/// Convolves every row of `src` into `dst` (same dimensions).
///
/// Columns the policy passes through are copied unchanged.
pub fn horizontal_pass<S, D>(
    src: &WordGrid<S>,
    dst: &mut WordGrid<D>,
    kernel: &Kernel,
    radius: usize,
    fast_path: FastPathPolicy,
) where
    S: AsRef<[u32]>,
    D: AsRef<[u32]> + AsMut<[u32]>,
{
    debug_assert!(src.same_size(dst));
    let width = src.width();

    for y in 0..src.height() {
        let row = src.row(y);
        let out = dst.row_mut(y);
        for x in 0..width {
            out[x] = if fast_path.passes_through(x, width, radius) {
                row[x]
            } else {
                convolve_at(kernel, width, x, |p| row[p])
            };
        }
    }
}

/// Convolves every column of `src` into `dst` (same dimensions).
///
/// Rows the policy passes through are copied unchanged.
pub fn vertical_pass<S, D>(
    src: &WordGrid<S>,
    dst: &mut WordGrid<D>,
    kernel: &Kernel,
    radius: usize,
    fast_path: FastPathPolicy,
) where
    S: AsRef<[u32]>,
    D: AsRef<[u32]> + AsMut<[u32]>,
{
    debug_assert!(src.same_size(dst));
    let height = src.height();

    for y in 0..height {
        if fast_path.passes_through(y, height, radius) {
            dst.row_mut(y).copy_from_slice(src.row(y));
            continue;
        }
        for x in 0..src.width() {
            let word = convolve_at(kernel, height, y, |p| src.get(x, p));
            dst.set(x, y, word);
        }
    }
}
