//! RGB status LED driver.
//!
//! Three LEDC PWM channels (CH0-2) drive discrete R/G/B LEDs (or a
//! common-cathode RGB LED).  Colours are latched with `set_colour` and only
//! reach the pins on `show`, so a caller can stage a colour and commit it
//! once.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives three LEDC PWM channels via hw_init.
//! On host/test: tracks state in-memory only.

use crate::config::Rgb;
use crate::drivers::hw_init;

pub struct StatusLed {
    latched: Rgb,
    shown: Rgb,
    brightness: u8,
}

impl StatusLed {
    /// `brightness` scales every channel, 255 = full.
    pub fn new(brightness: u8) -> Self {
        Self {
            latched: Rgb::OFF,
            shown: Rgb::OFF,
            brightness,
        }
    }

    pub fn set_colour(&mut self, colour: Rgb) {
        self.latched = colour;
    }

    pub fn show(&mut self) {
        let Rgb(r, g, b) = self.latched;
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, self.scale(r));
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, self.scale(g));
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, self.scale(b));
        self.shown = self.latched;
    }

    pub fn off(&mut self) {
        self.set_colour(Rgb::OFF);
        self.show();
    }

    /// Colour currently on the pins.
    pub fn current_colour(&self) -> Rgb {
        self.shown
    }

    fn scale(&self, channel: u8) -> u8 {
        ((u16::from(channel) * u16::from(self.brightness)) / 255) as u8
    }
}
