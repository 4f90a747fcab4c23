//! Integer convolution kernels.
//!
//! Both strategies convolve with small unsigned weights and divide the
//! accumulated channel sums by the kernel total. Weights are `u8`, and every
//! constructor rejects kernels whose total times 255 would not fit a `u32`
//! accumulator.

/// Taps in the scalar strategy's Gaussian.
pub const SCALAR_TAPS: usize = 17;

/// `2 * spread^2` for the scalar Gaussian.
pub const SCALAR_TWO_SPREAD_SQ: f64 = 30.0;

/// Weight of the scalar Gaussian's center tap.
pub const SCALAR_SCALE: f64 = 80.0;

/// Taps in the vectorized strategy's box filter.
pub const BOX_TAPS: usize = 7;

/// Largest kernel total whose weighted sum of 8-bit channels fits a `u32`.
pub const MAX_TOTAL: u32 = u32::MAX / 255;

/// Error returned by [`Kernel::from_weights`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// No weights were given.
    Empty,
    /// Kernels need a center tap, so the length must be odd.
    EvenLength {
        /// Number of weights given.
        len: usize,
    },
    /// All weights were zero, leaving nothing to divide by.
    ZeroTotal,
    /// The weights sum past [`MAX_TOTAL`], so channel sums could overflow.
    TooLong {
        /// Sum of the weights given.
        total: u64,
    },
    /// A Gaussian parameter was out of range.
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
    },
}

impl std::fmt::Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "kernel has no taps"),
            Self::EvenLength { len } => write!(f, "kernel length {len} is not odd"),
            Self::ZeroTotal => write!(f, "kernel weights sum to zero"),
            Self::TooLong { total } => {
                write!(f, "kernel total {total} exceeds the maximum of {MAX_TOTAL}")
            }
            Self::InvalidParameter { name } => write!(f, "Gaussian {name} is out of range"),
        }
    }
}

impl std::error::Error for KernelError {}

/// A symmetric, odd-length integer kernel and its normalization divisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    weights: Vec<u8>,
    total: u32,
}

impl Kernel {
    /// Builds a sampled Gaussian.
    ///
    /// `k[i] = round(exp(-(i - half)^2 / two_spread_sq) * scale)` with
    /// `half = taps / 2`.
    ///
    /// # Errors
    /// Returns [`KernelError::EvenLength`] for an even `taps`,
    /// [`KernelError::InvalidParameter`] if `two_spread_sq` is not a positive
    /// finite number or `scale` is outside `1.0..=255.0`, and
    /// [`KernelError::TooLong`] if the weights sum past [`MAX_TOTAL`].
    pub fn gaussian(taps: usize, two_spread_sq: f64, scale: f64) -> Result<Self, KernelError> {
        if taps % 2 == 0 {
            return Err(KernelError::EvenLength { len: taps });
        }
        if !(two_spread_sq.is_finite() && two_spread_sq > 0.0) {
            return Err(KernelError::InvalidParameter {
                name: "two_spread_sq",
            });
        }
        if !(1.0..=255.0).contains(&scale) {
            return Err(KernelError::InvalidParameter { name: "scale" });
        }
        Self::from_weights(&sampled_gaussian(taps, two_spread_sq, scale))
    }

    /// The 17-tap kernel used by the scalar strategy (center 80, total 754).
    #[must_use]
    pub fn scalar_default() -> Self {
        Self::from_checked(sampled_gaussian(
            SCALAR_TAPS,
            SCALAR_TWO_SPREAD_SQ,
            SCALAR_SCALE,
        ))
    }

    /// A flat kernel of `taps` unit weights.
    ///
    /// # Errors
    /// Same as [`Kernel::from_weights`].
    pub fn box_filter(taps: usize) -> Result<Self, KernelError> {
        if taps > MAX_TOTAL as usize {
            return Err(KernelError::TooLong { total: taps as u64 });
        }
        Self::from_weights(&vec![1; taps])
    }

    /// The 7-tap box used by the vectorized strategy.
    #[must_use]
    pub fn box_default() -> Self {
        Self::from_checked(vec![1; BOX_TAPS])
    }

    /// Wraps caller-provided weights.
    ///
    /// # Errors
    /// Returns [`KernelError`] if `weights` is empty, has even length, sums
    /// to zero, or sums past [`MAX_TOTAL`].
    pub fn from_weights(weights: &[u8]) -> Result<Self, KernelError> {
        if weights.is_empty() {
            return Err(KernelError::Empty);
        }
        if weights.len() % 2 == 0 {
            return Err(KernelError::EvenLength { len: weights.len() });
        }
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return Err(KernelError::ZeroTotal);
        }
        if total > u64::from(MAX_TOTAL) {
            return Err(KernelError::TooLong { total });
        }
        Ok(Self::from_checked(weights.to_vec()))
    }

    // `weights` must already satisfy every `from_weights` check.
    fn from_checked(weights: Vec<u8>) -> Self {
        let total = weights.iter().map(|&w| u32::from(w)).sum();
        Self { weights, total }
    }

    /// The single-tap kernel `[1]`; convolving with it is a copy.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            weights: vec![1],
            total: 1,
        }
    }

    /// Tap weights, index 0 being the leftmost tap.
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &[u8] {
        &self.weights
    }

    /// Sum of all weights; always at least 1.
    #[inline]
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of taps.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always `false`; kernels have at least one tap.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Distance from the center tap to either end.
    #[inline]
    #[must_use]
    pub fn half(&self) -> usize {
        self.weights.len() / 2
    }
}

fn sampled_gaussian(taps: usize, two_spread_sq: f64, scale: f64) -> Vec<u8> {
    let half = (taps / 2) as f64;
    (0..taps)
        .map(|i| {
            let f = i as f64 - half;
            ((-f * f / two_spread_sq).exp() * scale).round() as u8
        })
        .collect()
}

impl Default for Kernel {
    fn default() -> Self {
        Self::scalar_default()
    }
}
