//! Caller-owned pixel surfaces.
//!
//! A [`Surface`] is what the engine blurs in place: a packed-pixel buffer with
//! a format tag, a byte stride, a validity status and a modification counter.
//! Storage is kept as native-endian `u32` words so every row is word aligned,
//! which is what lets the engine treat 8-bit alpha rows as runs of words.

use imgref::{Img, ImgRef, ImgVec};
use rgb::RGBA8;

/// Pixel layouts a surface can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 bit per pixel. Never blurred.
    A1,
    /// 8-bit alpha only.
    A8,
    /// RGB in the low 24 bits of a 32-bit word; the top byte is unused.
    Rgb24,
    /// Alpha in the top byte, then red, green, blue.
    Argb32,
}

impl PixelFormat {
    /// Bits used by one pixel.
    #[must_use]
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::A1 => 1,
            Self::A8 => 8,
            Self::Rgb24 | Self::Argb32 => 32,
        }
    }

    /// Smallest legal byte stride for `width` pixels: the row length rounded
    /// up to a whole number of 32-bit words.
    ///
    /// Returns `None` if the computation overflows.
    #[must_use]
    pub fn min_stride(self, width: usize) -> Option<usize> {
        let bits = width.checked_mul(self.bits_per_pixel())?;
        let bytes = bits.checked_add(7)? / 8;
        Some(bytes.checked_add(3)? & !3)
    }

    /// Lowercase name as used on the command line and in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::A1 => "a1",
            Self::A8 => "a8",
            Self::Rgb24 => "rgb24",
            Self::Argb32 => "argb32",
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a surface is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceStatus {
    /// The surface holds valid pixels.
    #[default]
    Ok,
    /// A producer failed to fill the surface; its contents are meaningless.
    Failed,
}

/// Error type for surface construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SurfaceError {
    /// Stride is smaller than one row of pixels.
    StrideTooSmall {
        /// Stride provided, in bytes.
        stride: usize,
        /// Minimum stride for the width and format.
        min: usize,
    },
    /// Stride is not a multiple of 4 bytes.
    StrideNotWordAligned {
        /// Stride provided, in bytes.
        stride: usize,
    },
    /// The pixel data is shorter than `stride * height`.
    BufferTooSmall {
        /// Bytes (or words, for word input) required.
        expected: usize,
        /// Bytes (or words) provided.
        actual: usize,
    },
    /// `width`, `height` or `stride` overflow `usize` arithmetic.
    DimensionOverflow {
        /// Width requested.
        width: usize,
        /// Height requested.
        height: usize,
    },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrideTooSmall { stride, min } => {
                write!(f, "stride {stride} is smaller than the minimum row length {min}")
            }
            Self::StrideNotWordAligned { stride } => {
                write!(f, "stride {stride} is not a multiple of 4 bytes")
            }
            Self::BufferTooSmall { expected, actual } => {
                write!(f, "buffer holds {actual} units, {expected} required")
            }
            Self::DimensionOverflow { width, height } => {
                write!(f, "surface dimensions {width}x{height} overflow")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// A packed-pixel image owned by the caller and blurred in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    words: Vec<u32>,
    format: PixelFormat,
    width: usize,
    height: usize,
    stride: usize, // bytes per row, multiple of 4
    status: SurfaceStatus,
    modifications: u64,
}

impl Surface {
    /// Creates a zeroed surface with the minimum stride for its format.
    ///
    /// # Errors
    /// Returns [`SurfaceError::DimensionOverflow`] if the buffer size cannot
    /// be represented.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Result<Self, SurfaceError> {
        let stride = format
            .min_stride(width)
            .ok_or(SurfaceError::DimensionOverflow { width, height })?;
        let words = (stride / 4)
            .checked_mul(height)
            .ok_or(SurfaceError::DimensionOverflow { width, height })?;
        Ok(Self {
            words: vec![0; words],
            format,
            width,
            height,
            stride,
            status: SurfaceStatus::Ok,
            modifications: 0,
        })
    }

    /// Creates a surface from raw bytes laid out `stride` bytes per row.
    ///
    /// Bytes are read in native endianness, matching how a 32-bit pixel is
    /// stored in memory on the producing machine.
    ///
    /// # Errors
    /// Returns an error if the stride is misaligned or too short, or if
    /// `bytes` holds fewer than `stride * height` bytes.
    pub fn from_bytes(
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: usize,
        bytes: &[u8],
    ) -> Result<Self, SurfaceError> {
        check_stride(format, width, stride)?;
        let expected = stride
            .checked_mul(height)
            .ok_or(SurfaceError::DimensionOverflow { width, height })?;
        if bytes.len() < expected {
            return Err(SurfaceError::BufferTooSmall {
                expected,
                actual: bytes.len(),
            });
        }

        let words = bytes[..expected]
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            words,
            format,
            width,
            height,
            stride,
            status: SurfaceStatus::Ok,
            modifications: 0,
        })
    }

    /// Creates a surface from words laid out `stride` bytes per row.
    ///
    /// # Errors
    /// Returns an error if the stride is misaligned or too short, or if
    /// `words` holds fewer than `stride / 4 * height` words.
    pub fn from_words(
        format: PixelFormat,
        width: usize,
        height: usize,
        stride: usize,
        mut words: Vec<u32>,
    ) -> Result<Self, SurfaceError> {
        check_stride(format, width, stride)?;
        let expected = (stride / 4)
            .checked_mul(height)
            .ok_or(SurfaceError::DimensionOverflow { width, height })?;
        if words.len() < expected {
            return Err(SurfaceError::BufferTooSmall {
                expected,
                actual: words.len(),
            });
        }
        words.truncate(expected);

        Ok(Self {
            words,
            format,
            width,
            height,
            stride,
            status: SurfaceStatus::Ok,
            modifications: 0,
        })
    }

    /// Creates an [`PixelFormat::Argb32`] surface from straight RGBA pixels.
    #[must_use]
    pub fn from_rgba8(img: ImgRef<'_, RGBA8>) -> Self {
        let (width, height) = (img.width(), img.height());
        let mut words = Vec::with_capacity(width * height);
        for row in img.rows() {
            words.extend(row.iter().map(|px| {
                (u32::from(px.a) << 24)
                    | (u32::from(px.r) << 16)
                    | (u32::from(px.g) << 8)
                    | u32::from(px.b)
            }));
        }
        Self {
            words,
            format: PixelFormat::Argb32,
            width,
            height,
            stride: width * 4,
            status: SurfaceStatus::Ok,
            modifications: 0,
        }
    }

    /// Creates an [`PixelFormat::Rgb24`] surface, dropping alpha.
    #[must_use]
    pub fn from_rgba8_opaque(img: ImgRef<'_, RGBA8>) -> Self {
        let mut surface = Self::from_rgba8(img);
        surface.format = PixelFormat::Rgb24;
        for word in &mut surface.words {
            *word &= 0x00ff_ffff;
        }
        surface
    }

    /// Creates an [`PixelFormat::A8`] surface from one byte per pixel.
    #[must_use]
    pub fn from_gray8(img: ImgRef<'_, u8>) -> Self {
        let (width, height) = (img.width(), img.height());
        // min_stride cannot overflow for a width that already fits in memory.
        let stride = (width + 3) & !3;
        let mut words = vec![0u32; stride / 4 * height];
        {
            let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
            for (y, row) in img.rows().enumerate() {
                bytes[y * stride..y * stride + width].copy_from_slice(row);
            }
        }
        Self {
            words,
            format: PixelFormat::A8,
            width,
            height,
            stride,
            status: SurfaceStatus::Ok,
            modifications: 0,
        }
    }

    /// Converts to straight RGBA. `Rgb24` reads as opaque; `A8` and `A1`
    /// read as white with the stored coverage as alpha.
    #[must_use]
    pub fn to_rgba8(&self) -> ImgVec<RGBA8> {
        let mut pixels = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push(self.rgba_at(x, y));
            }
        }
        Img::new(pixels, self.width, self.height)
    }

    /// Extracts the alpha of every pixel (255 throughout for `Rgb24`).
    #[must_use]
    pub fn to_alpha8(&self) -> ImgVec<u8> {
        let mut pixels = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push(self.rgba_at(x, y).a);
            }
        }
        Img::new(pixels, self.width, self.height)
    }

    fn rgba_at(&self, x: usize, y: usize) -> RGBA8 {
        match self.format {
            PixelFormat::Argb32 | PixelFormat::Rgb24 => {
                let word = self.pixel(x, y);
                let a = if self.format == PixelFormat::Rgb24 {
                    0xff
                } else {
                    (word >> 24) as u8
                };
                RGBA8::new((word >> 16) as u8, (word >> 8) as u8, word as u8, a)
            }
            PixelFormat::A8 => RGBA8::new(0xff, 0xff, 0xff, self.bytes()[y * self.stride + x]),
            PixelFormat::A1 => {
                let byte = self.bytes()[y * self.stride + x / 8];
                let bit = if cfg!(target_endian = "little") {
                    x % 8
                } else {
                    7 - x % 8
                };
                RGBA8::new(0xff, 0xff, 0xff, if (byte >> bit) & 1 == 1 { 0xff } else { 0 })
            }
        }
    }

    /// Pixel format tag.
    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes per row, always a multiple of 4.
    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> SurfaceStatus {
        self.status
    }

    /// Flags the surface as failed; the engine will refuse to touch it.
    pub fn mark_failed(&mut self) {
        self.status = SurfaceStatus::Failed;
    }

    /// Records that the pixel contents changed. Anything derived from the
    /// previous contents (cached renderings, uploads) is stale.
    pub fn mark_dirty(&mut self) {
        self.modifications += 1;
    }

    /// Number of times the surface has been marked dirty.
    #[inline]
    #[must_use]
    pub fn modification_count(&self) -> u64 {
        self.modifications
    }

    /// Whether the surface has been modified since construction.
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.modifications > 0
    }

    /// The 32-bit word for pixel `(x, y)` of an `Rgb24`/`Argb32` surface.
    ///
    /// # Panics
    /// Panics if the coordinate is out of range or the format is not a
    /// one-word-per-pixel format.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        assert!(
            matches!(self.format, PixelFormat::Rgb24 | PixelFormat::Argb32),
            "pixel() needs a 32-bit format, surface is {}",
            self.format
        );
        assert!(x < self.width && y < self.height, "({x}, {y}) out of range");
        self.words[y * (self.stride / 4) + x]
    }

    /// Raw words, `stride / 4` per row.
    #[inline]
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Raw words, mutably. Callers writing through this should
    /// [`mark_dirty`](Self::mark_dirty) afterwards.
    #[inline]
    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    /// Raw bytes, `stride` per row.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Raw bytes, mutably.
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }
}

fn check_stride(format: PixelFormat, width: usize, stride: usize) -> Result<(), SurfaceError> {
    let min = format
        .min_stride(width)
        .ok_or(SurfaceError::DimensionOverflow { width, height: 0 })?;
    if stride % 4 != 0 {
        return Err(SurfaceError::StrideNotWordAligned { stride });
    }
    if stride < min {
        return Err(SurfaceError::StrideTooSmall { stride, min });
    }
    Ok(())
}
