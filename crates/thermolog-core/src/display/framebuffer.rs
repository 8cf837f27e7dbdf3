//! Monochrome framebuffer with change detection.
//!
//! Drawing targets this RAM buffer instead of the panel. After a frame is drawn,
//! only the rectangle containing changed pixels is pushed to the panel, in one
//! `fill_contiguous` call.
//!
//! Pixels are packed in the page layout used by SH1106/SSD1306 controllers: one
//! byte covers eight vertically stacked pixels, pages run top to bottom.

use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};
use log::debug;

use super::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;
const PAGES: usize = HEIGHT / 8;

/// Buffer size in bytes (128 x 64 / 8 = 1024).
pub const BUFFER_LEN: usize = WIDTH * PAGES;

/// Bounding box of pixels that have changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRect {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl DirtyRect {
    fn from_point(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn expand(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn area(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.min_x as i32, self.min_y as i32),
            Size::new(
                (self.max_x - self.min_x + 1) as u32,
                (self.max_y - self.min_y + 1) as u32,
            ),
        )
    }
}

/// 128x64 1-bit framebuffer implementing `DrawTarget<Color = BinaryColor>`.
#[derive(Clone)]
pub struct FrameBuffer {
    bits: [u8; BUFFER_LEN],
    dirty: Option<DirtyRect>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// A blank (all off) buffer with nothing to flush.
    pub const fn new() -> Self {
        Self {
            bits: [0; BUFFER_LEN],
            dirty: None,
        }
    }

    #[inline]
    const fn locate(x: usize, y: usize) -> (usize, u8) {
        ((y / 8) * WIDTH + x, 1 << (y % 8))
    }

    /// Colour of one pixel; off-screen coordinates read as `Off`.
    pub fn pixel(&self, x: i32, y: i32) -> BinaryColor {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return BinaryColor::Off;
        }
        let (idx, mask) = Self::locate(x as usize, y as usize);
        BinaryColor::from(self.bits[idx] & mask != 0)
    }

    /// Raw page-ordered bytes, as a SH1106/SSD1306 expects them.
    pub fn as_bytes(&self) -> &[u8; BUFFER_LEN] {
        &self.bits
    }

    /// Whether any pixel changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Mark the whole screen for the next flush.
    pub fn invalidate(&mut self) {
        self.dirty = Some(DirtyRect {
            min_x: 0,
            min_y: 0,
            max_x: WIDTH - 1,
            max_y: HEIGHT - 1,
        });
    }

    /// Number of lit pixels, mostly useful in tests.
    pub fn lit_pixels(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// Write one pixel, growing the dirty rect only if its colour changed.
    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, color: BinaryColor) {
        let (idx, mask) = Self::locate(x, y);
        let old = self.bits[idx];
        let new = if color.is_on() { old | mask } else { old & !mask };
        if new != old {
            self.bits[idx] = new;
            match &mut self.dirty {
                Some(rect) => rect.expand(x, y),
                None => self.dirty = Some(DirtyRect::from_point(x, y)),
            }
        }
    }

    /// Area changed since the last call, clearing the dirty state.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take().map(|rect| rect.area())
    }

    /// Push the dirty region to a panel and reset the dirty state.
    ///
    /// A no-op when nothing changed.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(area) = self.take_dirty() else {
            return Ok(());
        };

        debug!(
            "Flushing {}x{} dirty region at ({}, {})",
            area.size.width, area.size.height, area.top_left.x, area.top_left.y
        );

        let colors = area.points().map(|p| self.pixel(p.x, p.y));
        display.fill_contiguous(&area, colors)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as usize) < WIDTH
                && (coord.y as usize) < HEIGHT
            {
                self.set_pixel(coord.x as usize, coord.y as usize, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if let Some(bottom_right) = area.bottom_right() {
            for y in area.top_left.y..=bottom_right.y {
                for x in area.top_left.x..=bottom_right.x {
                    self.set_pixel(x as usize, y as usize, color);
                }
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_new_buffer_is_blank_and_clean() {
        let fb = FrameBuffer::new();
        assert!(!fb.is_dirty());
        assert_eq!(fb.lit_pixels(), 0);
        assert_eq!(fb.size(), Size::new(128, 64));
    }

    #[test]
    fn test_page_layout() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(3, 9), BinaryColor::On).draw(&mut fb).unwrap();

        // Page 1, column 3, bit 1.
        assert_eq!(fb.as_bytes()[WIDTH + 3], 0b0000_0010);
        assert_eq!(fb.pixel(3, 9), BinaryColor::On);
        assert_eq!(fb.pixel(3, 8), BinaryColor::Off);
    }

    #[test]
    fn test_off_screen_pixels_are_ignored() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(-1, 0), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(128, 10), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(5, 64), BinaryColor::On).draw(&mut fb).unwrap();
        assert!(!fb.is_dirty());
        assert_eq!(fb.pixel(200, 200), BinaryColor::Off);
    }

    #[test]
    fn test_redrawing_same_pixels_stays_clean() {
        let mut fb = FrameBuffer::new();
        let line = Line::new(Point::new(0, 18), Point::new(127, 18))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1));

        line.draw(&mut fb).unwrap();
        assert!(fb.is_dirty());
        let mut panel = MockDisplay::<BinaryColor>::new();
        panel.set_allow_out_of_bounds_drawing(true);
        fb.flush(&mut panel).unwrap();
        assert!(!fb.is_dirty());

        line.draw(&mut fb).unwrap();
        assert!(!fb.is_dirty());
    }

    #[test]
    fn test_flush_sends_only_dirty_rect() {
        let mut fb = FrameBuffer::new();
        Pixel(Point::new(2, 1), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(4, 3), BinaryColor::On).draw(&mut fb).unwrap();

        let mut panel = MockDisplay::<BinaryColor>::new();
        fb.flush(&mut panel).unwrap();

        panel.assert_pattern(&[
            "     ", //
            "  #..", //
            "  ...", //
            "  ..#", //
        ]);
    }

    #[test]
    fn test_flush_without_changes_is_noop() {
        let mut fb = FrameBuffer::new();
        let mut panel = MockDisplay::<BinaryColor>::new();
        fb.flush(&mut panel).unwrap();
        panel.assert_pattern(&[]);
    }

    #[test]
    fn test_invalidate_flushes_whole_screen() {
        let mut fb = FrameBuffer::new();
        fb.invalidate();

        let mut panel = MockDisplay::<BinaryColor>::new();
        panel.set_allow_out_of_bounds_drawing(true);
        fb.flush(&mut panel).unwrap();

        assert!(!fb.is_dirty());
        assert_eq!(panel.get_pixel(Point::new(63, 63)), Some(BinaryColor::Off));
    }

    #[test]
    fn test_clear_marks_only_changed_pixels() {
        let mut fb = FrameBuffer::new();
        fb.clear(BinaryColor::Off).unwrap();
        assert!(!fb.is_dirty());

        fb.clear(BinaryColor::On).unwrap();
        assert_eq!(fb.lit_pixels(), 128 * 64);
        assert!(fb.is_dirty());
    }
}
