//! Presenter: draws completed readings on the OLED.
//!
//! ```text
//!  y=0   X Axis:          (small)
//!  y=10    0.1569         (large)
//!  y=35  Y Axis:
//!  y=45   -0.2353
//!  y=70  Z Axis:
//!  y=80    9.8067
//! ```
//!
//! The display is optional.  If `begin` fails the presenter stays
//! unconfigured, renders nothing and ignores the toggle input; the
//! diagnostic log line is emitted by the caller either way.

use log::{info, warn};

use crate::aggregator::AggregatedReading;
use crate::app::ports::{DisplayPort, TextSize};
use crate::protocol::Axis;

/// (label y, value y) per axis.
const ROWS: [(i32, i32); Axis::COUNT] = [(0, 10), (35, 45), (70, 80)];

const SPLASH: &str = "BLE Client";
const SPLASH_Y: i32 = 25;

#[derive(Debug, Default)]
pub struct Presenter {
    configured: bool,
    enabled: bool,
}

impl Presenter {
    pub const fn new() -> Self {
        Self {
            configured: false,
            enabled: false,
        }
    }

    /// Bring the panel up and draw the splash.  Returns whether the
    /// display is usable.
    pub fn init(&mut self, display: &mut impl DisplayPort, addr: u8) -> bool {
        if let Err(e) = display.begin(addr) {
            warn!("display init failed ({}), rendering to log only", e);
            self.configured = false;
            self.enabled = false;
            return false;
        }
        self.configured = true;
        self.enabled = true;

        display.clear();
        display.draw_text(0, SPLASH_Y, TextSize::Large, SPLASH);
        if let Err(e) = display.present() {
            warn!("splash present failed: {}", e);
        }
        info!("display ready at 0x{:02x}", addr);
        true
    }

    /// Draw `reading` if the display is configured and enabled.
    /// Returns whether anything was drawn.
    pub fn render(&mut self, display: &mut impl DisplayPort, reading: &AggregatedReading) -> bool {
        if !(self.configured && self.enabled) {
            return false;
        }

        display.clear();
        for axis in Axis::ALL {
            let (label_y, value_y) = ROWS[axis.index()];
            display.draw_text(0, label_y, TextSize::Small, axis_label(axis));
            display.draw_text(0, value_y, TextSize::Large, reading.axis(axis).as_str());
        }
        if let Err(e) = display.present() {
            warn!("display present failed: {}", e);
        }
        true
    }

    /// Flip display rendering.  Ignored when no display is configured;
    /// returns the new state otherwise.
    pub fn toggle(&mut self) -> Option<bool> {
        if !self.configured {
            return None;
        }
        self.enabled = !self.enabled;
        Some(self.enabled)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn axis_label(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "X Axis: ",
        Axis::Y => "Y Axis: ",
        Axis::Z => "Z Axis: ",
    }
}
