//! Vectorized box-blur strategy.
//!
//! Each pass is a 7-tap box filter over the rows of its source, written
//! transposed into its destination, so the same routine run twice
//! (surface -> scratch -> surface) covers both axes. The pass pair is
//! repeated to approximate a Gaussian: by the central limit theorem `n`
//! box passes of standard deviation `sigma_box` approach a Gaussian of
//! `sqrt(n) * sigma_box`.
//!
//! Optimizations:
//! - Four output pixels per step, held as two `f32x8` accumulators of two
//!   pixels x four channels
//! - Division by the kernel total replaced by a reciprocal multiply
//! - Interior steps skip the border reflection entirely

use crate::grid::{pack, unpack, GridMut, ScratchGrid, WordGrid};
use crate::kernel::Kernel;
use crate::strategy::{BorderMode, ConvolutionStrategy};
use wide::f32x8;

/// Standard deviation of a 7-wide box filter: `sqrt((7^2 - 1) / 12)`.
pub const SIGMA_BOX: f32 = 2.0;

/// Minimum number of box pass pairs, whatever the radius.
pub const MIN_BOX_PASSES: usize = 3;

const PIXELS_PER_STEP: usize = 4;

/// SIMD two-pass blur with mirrored borders and no fast path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorizedStrategy {
    kernel: Kernel,
}

impl VectorizedStrategy {
    /// Creates the strategy with the 7-tap box from [`Kernel::box_default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel: Kernel::box_default(),
        }
    }

    /// The box kernel each pass applies.
    #[must_use]
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

impl Default for VectorizedStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvolutionStrategy for VectorizedStrategy {
    fn name(&self) -> &'static str {
        "vectorized"
    }

    fn taps(&self) -> usize {
        self.kernel.len()
    }

    fn border(&self) -> BorderMode {
        BorderMode::Mirror
    }

    fn scratch_dims(&self, width: usize, height: usize) -> (usize, usize) {
        // Horizontal output is stored transposed.
        (height, width)
    }

    fn convolve(&self, image: &mut GridMut<'_>, scratch: &mut ScratchGrid, radius: usize) {
        let passes = box_passes(radius);
        log::trace!(
            "vectorized blur: {}x{} words, radius {radius}, {passes} box passes",
            image.width(),
            image.height()
        );
        for _ in 0..passes {
            box_pass_transposed(image, scratch, &self.kernel);
            box_pass_transposed(scratch, image, &self.kernel);
        }
    }
}

/// Number of box pass pairs approximating a Gaussian of spread `radius`:
/// `max(3, round(radius^2 / SIGMA_BOX^2))`.
#[must_use]
pub fn box_passes(radius: usize) -> usize {
    let sigma = radius as f32;
    let n = (sigma * sigma / (SIGMA_BOX * SIGMA_BOX)).round() as usize;
    n.max(MIN_BOX_PASSES)
}

/// Filters every row of `src` with `kernel` and writes the result transposed
/// into `dst`: source pixel `(x, y)` lands at `(y, x)`.
///
/// # Panics
/// Panics if `dst` is not `src.height() x src.width()`.
pub fn box_pass_transposed<S, D>(src: &WordGrid<S>, dst: &mut WordGrid<D>, kernel: &Kernel)
where
    S: AsRef<[u32]>,
    D: AsRef<[u32]> + AsMut<[u32]>,
{
    assert_eq!(dst.width(), src.height(), "destination must be transposed");
    assert_eq!(dst.height(), src.width(), "destination must be transposed");

    let (width, height, src_stride, dst_stride) =
        (src.width(), src.height(), src.stride(), dst.stride());
    box_rows_transposed(
        src.as_slice(),
        src_stride,
        width,
        height,
        dst.as_mut_slice(),
        dst_stride,
        kernel.weights(),
        kernel.total(),
    );
}

#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    "aarch64+neon",
))]
fn box_rows_transposed(
    src: &[u32],
    src_stride: usize,
    width: usize,
    height: usize,
    dst: &mut [u32],
    dst_stride: usize,
    weights: &[u8],
    total: u32,
) {
    let half = weights.len() / 2;
    let recip = f32x8::splat(1.0 / total as f32);

    for y in 0..height {
        let row = &src[y * src_stride..y * src_stride + width];

        let mut x = 0;
        while x < width {
            let interior = x >= half && x + PIXELS_PER_STEP + half <= width;
            let mut lo = f32x8::splat(0.0);
            let mut hi = f32x8::splat(0.0);

            for (tap, &weight) in weights.iter().enumerate() {
                let offset = tap as isize - half as isize;
                let weight = f32x8::splat(f32::from(weight));
                if interior {
                    let start = (x as isize + offset) as usize;
                    lo += load_pair(row[start], row[start + 1]) * weight;
                    hi += load_pair(row[start + 2], row[start + 3]) * weight;
                } else {
                    lo += gather_pair(row, x, offset, width) * weight;
                    hi += gather_pair(row, x + 2, offset, width) * weight;
                }
            }

            let lo: [f32; 8] = (lo * recip).round().into();
            let hi: [f32; 8] = (hi * recip).round().into();
            let live = (width - x).min(PIXELS_PER_STEP);
            for i in 0..live {
                let (half, lane) = if i < 2 { (&lo, i * 4) } else { (&hi, (i - 2) * 4) };
                let lanes = &half[lane..lane + 4];
                let word = pack([
                    to_channel(lanes[0]),
                    to_channel(lanes[1]),
                    to_channel(lanes[2]),
                    to_channel(lanes[3]),
                ]);
                dst[(x + i) * dst_stride + y] = word;
            }

            x += PIXELS_PER_STEP;
        }
    }
}

/// Spreads the channels of two adjacent pixels across eight lanes.
#[inline(always)]
fn load_pair(a: u32, b: u32) -> f32x8 {
    let a = unpack(a);
    let b = unpack(b);
    f32x8::from([
        a[0] as f32,
        a[1] as f32,
        a[2] as f32,
        a[3] as f32,
        b[0] as f32,
        b[1] as f32,
        b[2] as f32,
        b[3] as f32,
    ])
}

/// Like [`load_pair`] for output pixels `x` and `x + 1`, reflecting taps that
/// leave the row and zero-filling the lanes of output pixels past its end.
#[inline(always)]
fn gather_pair(row: &[u32], x: usize, offset: isize, width: usize) -> f32x8 {
    let sample = |out: usize| -> Option<u32> {
        (out < width).then(|| row[mirror(out as isize + offset, width)])
    };
    match (sample(x), sample(x + 1)) {
        (Some(a), Some(b)) => load_pair(a, b),
        (Some(a), None) => {
            let a = unpack(a);
            f32x8::from([
                a[0] as f32,
                a[1] as f32,
                a[2] as f32,
                a[3] as f32,
                0.0,
                0.0,
                0.0,
                0.0,
            ])
        }
        _ => f32x8::splat(0.0),
    }
}

#[inline(always)]
fn to_channel(v: f32) -> u32 {
    v.clamp(0.0, 255.0) as u32
}

/// Mirrors a coordinate outside `0..size` back inside.
///
/// The mirror is placed outside the last pixel, so the edge pixel is not
/// repeated at the mirror point: `-1 -> 0`, `-2 -> 1`, `size -> size - 1`.
/// Coordinates more than one image length away are reflected repeatedly.
#[inline]
#[must_use]
pub fn mirror(mut x: isize, size: usize) -> usize {
    let size = size as isize;
    while x < 0 || x >= size {
        if x < 0 {
            x = -x - 1;
        } else {
            x = 2 * size - 1 - x;
        }
    }
    x as usize
}
