//! Deterministic synthetic surfaces for lockblur tests.
//!
//! These use an LCG PRNG so inputs are identical across platforms.

use lockblur::{Img, PixelFormat, Surface, RGBA8};

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

// ============================================================================
// Surface Generation Functions
// ============================================================================

/// ARGB32 noise, every byte random.
pub fn gen_noise(width: usize, height: usize, seed: u64) -> Surface {
    let mut rng = Lcg::new(seed);
    let pixels: Vec<RGBA8> = (0..width * height)
        .map(|_| RGBA8::new(rng.next_u8(), rng.next_u8(), rng.next_u8(), rng.next_u8()))
        .collect();
    Surface::from_rgba8(Img::new(pixels, width, height).as_ref())
}

/// Opaque diagonal gradient: red rises along x, green along y.
pub fn gen_gradient(width: usize, height: usize) -> Surface {
    let pixels: Vec<RGBA8> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let r = if width > 1 { x * 255 / (width - 1) } else { 128 };
                let g = if height > 1 { y * 255 / (height - 1) } else { 128 };
                RGBA8::new(r as u8, g as u8, 96, 255)
            })
        })
        .collect();
    Surface::from_rgba8(Img::new(pixels, width, height).as_ref())
}

/// Alternating black and white columns (`0xff000000` / `0xffffffff`).
pub fn gen_stripes(width: usize, height: usize) -> Surface {
    let mut surface = Surface::new(PixelFormat::Argb32, width, height).expect("surface");
    let stride = surface.stride() / 4;
    for (i, word) in surface.words_mut().iter_mut().enumerate() {
        *word = if (i % stride) % 2 == 0 {
            0xff00_0000
        } else {
            0xffff_ffff
        };
    }
    surface
}

/// A8 surface of random alpha bytes, including the row padding.
pub fn gen_alpha_noise(width: usize, height: usize, seed: u64) -> Surface {
    let mut rng = Lcg::new(seed);
    let mut surface = Surface::new(PixelFormat::A8, width, height).expect("surface");
    for byte in surface.bytes_mut() {
        *byte = rng.next_u8();
    }
    surface
}
