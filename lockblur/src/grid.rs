//! Word-addressed pixel grids.
//!
//! A grid is a `width x height` array of 32-bit words stored row-major with a
//! word stride that may exceed the width. Every access goes through `(x, y)`
//! or a row slice, so strides are checked once at construction instead of at
//! every pointer step.

use std::collections::TryReserveError;

/// Splits a packed word into its four 8-bit channels, most significant first.
#[inline(always)]
#[must_use]
pub fn unpack(word: u32) -> [u32; 4] {
    [
        (word >> 24) & 0xff,
        (word >> 16) & 0xff,
        (word >> 8) & 0xff,
        word & 0xff,
    ]
}

/// Packs four channel values (each `<= 255`) back into a word.
#[inline(always)]
#[must_use]
pub fn pack(channels: [u32; 4]) -> u32 {
    (channels[0] << 24) | (channels[1] << 16) | (channels[2] << 8) | channels[3]
}

/// A grid of packed pixel words over any word storage.
///
/// `D` is `Vec<u32>` for engine-owned scratch buffers and `&mut [u32]` for
/// views into a caller's surface.
#[derive(Debug, Clone)]
pub struct WordGrid<D> {
    data: D,
    width: usize,
    height: usize,
    stride: usize, // words per row (may be > width)
}

/// Engine-owned grid, used for the intermediate pass result.
pub type ScratchGrid = WordGrid<Vec<u32>>;

/// Mutable view over a surface's words.
pub type GridMut<'a> = WordGrid<&'a mut [u32]>;

impl ScratchGrid {
    /// Allocates a zeroed, tightly packed grid without aborting on failure.
    ///
    /// # Errors
    /// Returns the allocator's error if `width * height` words cannot be
    /// reserved (including when the product overflows).
    pub fn try_new(width: usize, height: usize) -> Result<Self, TryReserveError> {
        let words = width.checked_mul(height).unwrap_or(usize::MAX);
        let mut data = Vec::new();
        data.try_reserve_exact(words)?;
        data.resize(words, 0);
        Ok(Self {
            data,
            width,
            height,
            stride: width,
        })
    }

    /// Creates a tightly packed grid from row-major words.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    #[must_use]
    pub fn from_vec(data: Vec<u32>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
            stride: width,
        }
    }

    /// Consumes the grid, returning its words.
    #[must_use]
    pub fn into_vec(self) -> Vec<u32> {
        self.data
    }
}

impl<'a> GridMut<'a> {
    /// Wraps a word slice with an explicit stride.
    ///
    /// # Panics
    /// Panics if `stride < width` or the slice is shorter than the last row
    /// requires.
    #[must_use]
    pub fn new(data: &'a mut [u32], width: usize, height: usize, stride: usize) -> Self {
        assert!(stride >= width, "stride {stride} shorter than width {width}");
        if height > 0 {
            assert!(
                data.len() >= (height - 1) * stride + width,
                "grid of {width}x{height} (stride {stride}) does not fit {} words",
                data.len()
            );
        }
        Self {
            data,
            width,
            height,
            stride,
        }
    }
}

impl<D: AsRef<[u32]>> WordGrid<D> {
    /// Grid width in words.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Words per row, including padding.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the `width` words of row `y`.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[u32] {
        let start = y * self.stride;
        &self.data.as_ref()[start..start + self.width]
    }

    /// Gets the word at column `x` of row `y`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.data.as_ref()[y * self.stride + x]
    }

    /// All backing words, including row padding.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        self.data.as_ref()
    }

    /// Checks if two grids have the same dimensions.
    #[must_use]
    pub fn same_size<E: AsRef<[u32]>>(&self, other: &WordGrid<E>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl<D: AsRef<[u32]> + AsMut<[u32]>> WordGrid<D> {
    /// Returns the `width` words of row `y` mutably.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        let start = y * self.stride;
        &mut self.data.as_mut()[start..start + self.width]
    }

    /// All backing words, mutably, including row padding.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        self.data.as_mut()
    }

    /// Sets the word at column `x` of row `y`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, word: u32) {
        self.data.as_mut()[y * self.stride + x] = word;
    }
}
