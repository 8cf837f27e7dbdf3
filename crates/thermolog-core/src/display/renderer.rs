//! Screen layout: current temperature header and the six-slot history.
//!
//! ```text
//! Now:    23.50°C
//! ---------------------
//! 1:23.50      4:--.--
//! 2:24.10<     5:--.--
//! 3:--.--      6:--.--
//! ```

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_9X15};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;
use log::debug;

use super::{DISPLAY_WIDTH_PX, DisplayDriver, FrameBuffer};
use crate::app_state::Snapshot;
use crate::history::{HISTORY_SLOTS, HistoryBuffer};

/// Longest formatted value, e.g. `-1234.56`.
pub const MAX_VALUE_LEN: usize = 8;

/// Longest slot label, e.g. `6:-1234.56<`.
pub const MAX_LABEL_LEN: usize = 16;

const _: () = assert!(MAX_LABEL_LEN >= 2 + MAX_VALUE_LEN + LAST_WRITTEN_MARKER.len());

pub const HEADER_LABEL: &str = "Now:";
pub const HEADER_VALUE_X: i32 = 50;
pub const RULE_Y: i32 = 18;
pub const ROWS_TOP_Y: i32 = 24;
pub const ROW_HEIGHT: i32 = 12;
pub const RIGHT_COLUMN_X: i32 = 68;
pub const SLOTS_PER_COLUMN: usize = 3;
pub const EMPTY_SLOT_TEXT: &str = "--.--";
pub const LAST_WRITTEN_MARKER: &str = "<";
/// Shown for values too wide for their column.
pub const OUT_OF_RANGE_TEXT: &str = "##.##";

pub const SPLASH_TEXT: &str = "Thermometer System";
pub const SPLASH_POSITION: Point = Point::new(10, 25);

/// Temperature with two decimals, e.g. `23.50`, or [`OUT_OF_RANGE_TEXT`]
/// when that needs more than [`MAX_VALUE_LEN`] characters.
pub fn format_celsius(celsius: f32) -> String<MAX_VALUE_LEN> {
    let mut s = String::new();
    if core::fmt::write(&mut s, format_args!("{:.2}", celsius)).is_err() {
        s.clear();
        let _ = s.push_str(OUT_OF_RANGE_TEXT);
    }
    s
}

/// Text for one history slot: `"{n}:"` then the value or a placeholder, with a
/// `<` marker on the most recent recorded slot.
pub fn slot_label(history: &HistoryBuffer, index: usize) -> String<MAX_LABEL_LEN> {
    // Every part below fits; the capacity is checked at compile time.
    let mut s = String::new();
    let _ = core::fmt::write(&mut s, format_args!("{}:", index + 1));

    if !history.is_recorded(index) {
        let _ = s.push_str(EMPTY_SLOT_TEXT);
        return s;
    }

    let value = history.get(index).unwrap_or_default();
    let _ = s.push_str(&format_celsius(value));
    if index == history.last_written_index() {
        let _ = s.push_str(LAST_WRITTEN_MARKER);
    }
    s
}

/// Top-left corner of a history slot.
pub const fn slot_position(index: usize) -> Point {
    let x = if index < SLOTS_PER_COLUMN {
        0
    } else {
        RIGHT_COLUMN_X
    };
    let y = ROWS_TOP_Y + (index % SLOTS_PER_COLUMN) as i32 * ROW_HEIGHT;
    Point::new(x, y)
}

/// Draw the full home screen for `snapshot`. The target is cleared first.
pub fn draw_home<T>(target: &mut T, snapshot: &Snapshot) -> Result<(), T::Error>
where
    T: DrawTarget<Color = BinaryColor>,
{
    let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let large = MonoTextStyle::new(&FONT_9X15, BinaryColor::On);

    target.clear(BinaryColor::Off)?;

    Text::with_baseline(HEADER_LABEL, Point::zero(), small, Baseline::Top).draw(target)?;
    let value = format_celsius(snapshot.latest_temperature);
    let next = Text::with_baseline(
        value.as_str(),
        Point::new(HEADER_VALUE_X, 0),
        large,
        Baseline::Top,
    )
    .draw(target)?;
    Text::with_baseline("°C", next, small, Baseline::Top).draw(target)?;

    Line::new(
        Point::new(0, RULE_Y),
        Point::new(DISPLAY_WIDTH_PX as i32 - 1, RULE_Y),
    )
    .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
    .draw(target)?;

    for index in 0..HISTORY_SLOTS {
        let label = slot_label(&snapshot.history, index);
        Text::with_baseline(label.as_str(), slot_position(index), small, Baseline::Top)
            .draw(target)?;
    }

    Ok(())
}

/// Draw the start-up banner. The target is cleared first.
pub fn draw_splash<T>(target: &mut T) -> Result<(), T::Error>
where
    T: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;
    Text::with_baseline(
        SPLASH_TEXT,
        SPLASH_POSITION,
        MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
        Baseline::Top,
    )
    .draw(target)?;
    Ok(())
}

/// Draws frames off-screen and sends only what changed to the panel.
#[derive(Clone, Default)]
pub struct Renderer {
    frame: FrameBuffer,
}

impl Renderer {
    pub const fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
        }
    }

    /// The last drawn frame.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn show_splash<D: DisplayDriver>(&mut self, display: &mut D) -> Result<(), D::Error> {
        let Ok(()) = draw_splash(&mut self.frame);
        self.present(display)
    }

    /// Draw `snapshot` and update the panel if anything changed.
    pub fn render<D: DisplayDriver>(
        &mut self,
        snapshot: &Snapshot,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let Ok(()) = draw_home(&mut self.frame, snapshot);
        self.present(display)
    }

    fn present<D: DisplayDriver>(&mut self, display: &mut D) -> Result<(), D::Error> {
        if !self.frame.is_dirty() {
            return Ok(());
        }

        let result = self
            .frame
            .flush(display)
            .and_then(|()| display.present());
        if result.is_err() {
            // The panel state is unknown; resend everything next time.
            debug!("Frame not presented, invalidating");
            self.frame.invalidate();
        }
        result
    }
}
