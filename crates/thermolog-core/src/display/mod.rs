//! Display abstraction and rendering.
//!
//! The renderer draws every frame into a [`FrameBuffer`] and pushes only the
//! changed pixels to the panel, so any [`DisplayDriver`] works: an SH1106 over
//! I2C on the device, a terminal on the simulator host, or RAM in tests.

pub mod framebuffer;
pub mod renderer;

pub use framebuffer::FrameBuffer;
pub use renderer::Renderer;

use core::convert::Infallible;
use core::fmt::Debug;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use thiserror_no_std::Error;

/// Panel width in pixels.
pub const DISPLAY_WIDTH_PX: u32 = 128;

/// Panel height in pixels.
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// A monochrome panel that buffers drawing until [`present`](Self::present).
pub trait DisplayDriver: DrawTarget<Color = BinaryColor, Error: Debug> {
    /// Bring the panel up. Called once, before anything is drawn.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Make everything drawn so far visible.
    fn present(&mut self) -> Result<(), Self::Error>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryDisplayError {
    #[error("panel is offline")]
    Offline,
    #[error("panel used before init")]
    NotInitialized,
}

/// RAM-only panel, used by tests and headless runs.
///
/// `panel` holds what is currently visible; drawing goes to a staging buffer
/// until `present`.
#[derive(Clone, Default)]
pub struct MemoryDisplay {
    staging: FrameBuffer,
    panel: FrameBuffer,
    initialized: bool,
    offline: bool,
    presents: usize,
}

impl MemoryDisplay {
    pub const fn new() -> Self {
        Self {
            staging: FrameBuffer::new(),
            panel: FrameBuffer::new(),
            initialized: false,
            offline: false,
            presents: 0,
        }
    }

    /// Make every following call fail, as a disconnected panel would.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// What the panel currently shows.
    pub fn panel(&self) -> &FrameBuffer {
        &self.panel
    }

    /// Number of successful `present` calls.
    pub fn presents(&self) -> usize {
        self.presents
    }

    fn check(&self) -> Result<(), MemoryDisplayError> {
        if self.offline {
            return Err(MemoryDisplayError::Offline);
        }
        if !self.initialized {
            return Err(MemoryDisplayError::NotInitialized);
        }
        Ok(())
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

impl OriginDimensions for MemoryDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for MemoryDisplay {
    type Color = BinaryColor;
    type Error = MemoryDisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.check()?;
        infallible(self.staging.draw_iter(pixels));
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.check()?;
        infallible(self.staging.fill_contiguous(area, colors));
        Ok(())
    }
}

impl DisplayDriver for MemoryDisplay {
    fn init(&mut self) -> Result<(), Self::Error> {
        if self.offline {
            return Err(MemoryDisplayError::Offline);
        }
        self.initialized = true;
        infallible(self.staging.clear(BinaryColor::Off));
        self.panel = self.staging.clone();
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.check()?;
        self.panel = self.staging.clone();
        self.presents += 1;
        Ok(())
    }
}
