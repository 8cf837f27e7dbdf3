//! 128x64 panel drawn in the terminal with half-block characters.
//!
//! Two pixel rows share one text line, so the panel takes 32 lines. Only the
//! lines touched since the last `present` are rewritten.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use thermolog_core::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, DisplayDriver, FrameBuffer};

/// Terminal row of the panel's top edge.
const TOP_ROW: u16 = 1;

/// Raw mode, alternate screen and a hidden cursor while alive.
///
/// Dropping it puts the terminal back, also when `main` bails out early.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

pub struct TermDisplay<W> {
    out: W,
    panel: FrameBuffer,
}

impl<W: Write> TermDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            panel: FrameBuffer::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn glyph(top: BinaryColor, bottom: BinaryColor) -> char {
        match (top.is_on(), bottom.is_on()) {
            (true, true) => '█',
            (true, false) => '▀',
            (false, true) => '▄',
            (false, false) => ' ',
        }
    }

    /// Rewrite the text lines covering `area`.
    fn draw_lines(&mut self, area: Rectangle) -> io::Result<()> {
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let first = area.top_left.y / 2;
        let last = bottom_right.y / 2;

        for line in first..=last {
            let glyphs: String = (0..DISPLAY_WIDTH_PX as i32)
                .map(|x| {
                    Self::glyph(
                        self.panel.pixel(x, line * 2),
                        self.panel.pixel(x, line * 2 + 1),
                    )
                })
                .collect();
            queue!(
                self.out,
                MoveTo(0, TOP_ROW + line as u16),
                Print('│'),
                Print(glyphs),
                Print('│')
            )?;
        }
        self.out.flush()
    }

    fn draw_frame(&mut self) -> io::Result<()> {
        let rule = "─".repeat(DISPLAY_WIDTH_PX as usize);
        let bottom = TOP_ROW + (DISPLAY_HEIGHT_PX / 2) as u16;
        queue!(
            self.out,
            Clear(ClearType::All),
            MoveTo(0, TOP_ROW - 1),
            Print(format!("┌{rule}┐")),
            MoveTo(0, bottom),
            Print(format!("└{rule}┘"))
        )?;
        self.out.flush()
    }
}

impl<W> OriginDimensions for TermDisplay<W> {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl<W: Write> DrawTarget for TermDisplay<W> {
    type Color = BinaryColor;
    type Error = io::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let Ok(()) = self.panel.draw_iter(pixels);
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let Ok(()) = self.panel.fill_contiguous(area, colors);
        Ok(())
    }
}

impl<W: Write> DisplayDriver for TermDisplay<W> {
    fn init(&mut self) -> Result<(), Self::Error> {
        let Ok(()) = self.panel.clear(BinaryColor::Off);
        self.panel.invalidate();
        self.draw_frame()?;
        self.present()
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        let Some(area) = self.panel.take_dirty() else {
            return Ok(());
        };

        let result = self.draw_lines(area);
        if result.is_err() {
            // Some lines may be missing on screen; redraw all of them next time.
            self.panel.invalidate();
        }
        result
    }
}
