//! Common test utilities for lockblur tests.

#![allow(dead_code)]

pub mod generators;

use lockblur::{PixelFormat, Surface};

/// Surface of `width x height` pixels, every word set to `word`.
pub fn uniform_surface(format: PixelFormat, width: usize, height: usize, word: u32) -> Surface {
    let mut surface = Surface::new(format, width, height).expect("surface dimensions");
    surface.words_mut().fill(word);
    surface
}
