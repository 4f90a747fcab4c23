//! Maps a surface's pixel format onto one 32-bit word per blurred unit.
//!
//! `Rgb24` and `Argb32` store one pixel per word. `A8` packs four adjacent
//! alpha bytes into a word, so the word grid is `width / 4` wide and the
//! one to three trailing pixels of each row are never touched. `A1` cannot
//! be expressed as words of 8-bit channels and is rejected.

use crate::grid::GridMut;
use crate::surface::{PixelFormat, Surface, SurfaceStatus};
use crate::BlurError;

/// Word geometry of a validated surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordLayout {
    width: usize,
    height: usize,
    stride: usize,
}

impl WordLayout {
    /// Validates `surface` and computes its word geometry.
    ///
    /// Never allocates.
    ///
    /// # Errors
    /// - [`BlurError::InvalidSurface`] if the surface is marked failed
    ///   (checked first).
    /// - [`BlurError::UnsupportedFormat`] for [`PixelFormat::A1`].
    pub fn for_surface(surface: &Surface) -> Result<Self, BlurError> {
        if surface.status() == SurfaceStatus::Failed {
            return Err(BlurError::InvalidSurface);
        }

        let width = match surface.format() {
            PixelFormat::A1 => {
                return Err(BlurError::UnsupportedFormat {
                    format: PixelFormat::A1,
                })
            }
            PixelFormat::A8 => surface.width() / 4,
            PixelFormat::Rgb24 | PixelFormat::Argb32 => surface.width(),
        };

        Ok(Self {
            width,
            height: surface.height(),
            stride: surface.stride() / 4,
        })
    }

    /// Words per row that take part in the blur.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Words per row in storage, padding included.
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether there is nothing to blur.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Views the surface words through this layout.
    ///
    /// # Panics
    /// Panics if `words` is shorter than the layout requires, which cannot
    /// happen for the surface the layout was computed from.
    #[must_use]
    pub fn grid<'a>(&self, words: &'a mut [u32]) -> GridMut<'a> {
        GridMut::new(words, self.width, self.height, self.stride)
    }
}
