//! Drives one blur: scratch allocation, both passes, dirty marking.

use crate::format::WordLayout;
use crate::grid::ScratchGrid;
use crate::strategy::ConvolutionStrategy;
use crate::surface::Surface;
use crate::BlurError;

/// Blurs `surface` in place with `strategy`.
///
/// `layout` must come from [`WordLayout::for_surface`] on this same surface.
/// The scratch grid lives only for the duration of the call.
///
/// # Errors
/// Returns [`BlurError::AllocationFailed`] if the scratch grid cannot be
/// reserved. The surface is then untouched and not marked dirty.
pub fn run(
    surface: &mut Surface,
    layout: WordLayout,
    radius: usize,
    strategy: &dyn ConvolutionStrategy,
) -> Result<(), BlurError> {
    if layout.is_empty() {
        log::trace!(
            "nothing to blur on {}x{} {} surface",
            surface.width(),
            surface.height(),
            surface.format()
        );
        return Ok(());
    }

    let (scratch_w, scratch_h) = strategy.scratch_dims(layout.width(), layout.height());
    let mut scratch = ScratchGrid::try_new(scratch_w, scratch_h).map_err(|_| {
        let words = scratch_w.saturating_mul(scratch_h);
        log::debug!("blur skipped: could not reserve {words} scratch words");
        BlurError::AllocationFailed { words }
    })?;

    log::trace!(
        "{} blur of {}x{} {} surface, radius {radius}, {} taps, {:?} border",
        strategy.name(),
        surface.width(),
        surface.height(),
        surface.format(),
        strategy.taps(),
        strategy.border()
    );

    {
        let mut image = layout.grid(surface.words_mut());
        strategy.convolve(&mut image, &mut scratch, radius);
    }
    drop(scratch);

    surface.mark_dirty();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use crate::scalar::ScalarStrategy;
    use crate::simd::VectorizedStrategy;
    use crate::grid::GridMut;
    use crate::strategy::{BorderMode, FastPathPolicy};
    use crate::surface::PixelFormat;

    /// Asks for more scratch than any allocator can give, and scribbles over
    /// the image if it is ever run.
    #[derive(Debug)]
    struct OversizedScratch;

    impl ConvolutionStrategy for OversizedScratch {
        fn name(&self) -> &'static str {
            "oversized"
        }

        fn taps(&self) -> usize {
            1
        }

        fn border(&self) -> BorderMode {
            BorderMode::Truncate
        }

        fn scratch_dims(&self, _width: usize, _height: usize) -> (usize, usize) {
            (usize::MAX / 8, 2)
        }

        fn convolve(&self, image: &mut GridMut<'_>, _scratch: &mut ScratchGrid, _radius: usize) {
            image.as_mut_slice().fill(0);
        }
    }

    fn filled(format: PixelFormat, width: usize, height: usize, word: u32) -> Surface {
        let mut surface = Surface::new(format, width, height).unwrap();
        surface.words_mut().fill(word);
        surface
    }

    #[test]
    fn test_marks_dirty_once() {
        let mut surface = filled(PixelFormat::Argb32, 12, 9, 0xff80_8080);
        let layout = WordLayout::for_surface(&surface).unwrap();
        run(&mut surface, layout, 2, &VectorizedStrategy::new()).unwrap();
        assert_eq!(surface.modification_count(), 1);
        assert!(surface.words().iter().all(|&w| w == 0xff80_8080));
    }

    #[test]
    fn test_empty_layout_is_noop() {
        let mut surface = filled(PixelFormat::A8, 3, 5, 0x0101_0101);
        let before = surface.clone();
        let layout = WordLayout::for_surface(&surface).unwrap();
        run(&mut surface, layout, 4, &ScalarStrategy::default()).unwrap();
        assert_eq!(surface, before);
    }

    #[test]
    fn test_a8_trailing_pixels_untouched() {
        // 6 alpha pixels per row: one word blurred, pixels 4 and 5 stray.
        let mut surface = Surface::new(PixelFormat::A8, 6, 3).unwrap();
        surface.bytes_mut().fill(200);
        surface.bytes_mut()[8] = 0;
        let layout = WordLayout::for_surface(&surface).unwrap();
        let kernel = Kernel::from_weights(&[1, 1, 1]).unwrap();
        let strategy = ScalarStrategy::new(kernel, FastPathPolicy::Never);
        run(&mut surface, layout, 0, &strategy).unwrap();

        let bytes = surface.bytes();
        for row in bytes.chunks_exact(8) {
            assert_eq!(&row[4..], &[200, 200, 200, 200]);
        }
        // One word per row, so the horizontal pass keeps only the center
        // tap (200 / 3 = 66) and the vertical pass truncates at rows 0 and 2.
        assert_eq!(&bytes[..2], &[22, 44]);
        assert_eq!(&bytes[8..10], &[44, 66]);
        assert_eq!(&bytes[16..18], &[22, 44]);
    }

    #[test]
    fn test_allocation_failure_leaves_surface_untouched() {
        let mut surface = filled(PixelFormat::Argb32, 9, 5, 0xff12_3456);
        let before = surface.clone();
        let layout = WordLayout::for_surface(&surface).unwrap();

        let result = run(&mut surface, layout, 3, &OversizedScratch);
        assert_eq!(
            result,
            Err(BlurError::AllocationFailed {
                words: (usize::MAX / 8) * 2
            })
        );
        assert_eq!(surface, before);
        assert!(!surface.is_dirty());
        assert_eq!(surface.modification_count(), 0);
    }

    #[test]
    fn test_allocation_failure_through_public_entry() {
        let mut surface = filled(PixelFormat::A8, 16, 4, 0x4080_c0ff);
        let before = surface.clone();
        let result = crate::blur_with_strategy(&mut surface, 2, &OversizedScratch);
        assert!(matches!(result, Err(BlurError::AllocationFailed { .. })));
        assert_eq!(surface, before);
        assert!(!surface.is_dirty());
    }
}
