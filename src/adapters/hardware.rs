//! Hardware adapters — bridge real peripherals to the domain port traits.
//!
//! [`PeripheralHardware`] owns the accelerometer, the optional fuel gauge
//! and the status LED, exposing them through [`SensorPort`] and
//! [`IndicatorPort`].  [`CentralHardware`] owns the OLED and the LED for
//! [`IndicatorPort`] and [`DisplayPort`].
//! The drivers are generic over `embedded-hal`, so these adapters run on
//! the host against fakes as well as on the device.

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_hal::i2c::I2c;
use log::{error, info, warn};

use crate::app::ports::{DisplayPort, IndicatorPort, SensorPort, SensorSample, TextSize};
use crate::config::Rgb;
use crate::drivers::ssd1327::Ssd1327;
use crate::drivers::status_led::StatusLed;
use crate::drivers::{Accelerometer, FuelGauge};
use crate::error::{DisplayError, InitError, SensorError};

// ── Peripheral ────────────────────────────────────────────────

pub struct PeripheralHardware<A, G> {
    accel: A,
    gauge: Option<G>,
    led: StatusLed,
}

impl<A: Accelerometer, G: FuelGauge> PeripheralHardware<A, G> {
    /// Pass `gauge: None` on boards without a fuel gauge.
    pub fn new(accel: A, gauge: Option<G>, led: StatusLed) -> Self {
        Self { accel, gauge, led }
    }

    pub fn led(&self) -> &StatusLed {
        &self.led
    }
}

impl<A: Accelerometer, G: FuelGauge> SensorPort for PeripheralHardware<A, G> {
    fn begin(&mut self) -> Result<(), InitError> {
        if let Err(e) = self.accel.begin() {
            error!("ADXL343: {}", e);
            return Err(InitError::AccelerometerNotFound);
        }
        if let Some(gauge) = self.gauge.as_mut() {
            if let Err(e) = gauge.begin() {
                error!("MAX17048: {}", e);
                return Err(InitError::FuelGaugeNotFound);
            }
        }
        info!(
            "sensors up (fuel gauge {})",
            if self.gauge.is_some() { "fitted" } else { "absent" }
        );
        Ok(())
    }

    fn read(&mut self) -> Result<SensorSample, SensorError> {
        let reading = self.accel.read_acceleration()?;
        let battery = match self.gauge.as_mut() {
            Some(gauge) => match gauge.read_battery() {
                Ok(b) => Some(b),
                Err(e) => {
                    warn!("MAX17048 read failed: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(SensorSample { reading, battery })
    }
}

impl<A, G> IndicatorPort for PeripheralHardware<A, G> {
    fn set_colour(&mut self, colour: Rgb) {
        self.led.set_colour(colour);
    }

    fn show(&mut self) {
        self.led.show();
    }
}

// ── Central ───────────────────────────────────────────────────

pub struct CentralHardware<I2C> {
    oled: Ssd1327<I2C>,
    led: StatusLed,
}

impl<I2C: I2c> CentralHardware<I2C> {
    pub fn new(oled: Ssd1327<I2C>, led: StatusLed) -> Self {
        Self { oled, led }
    }

    pub fn led(&self) -> &StatusLed {
        &self.led
    }

    pub fn oled(&self) -> &Ssd1327<I2C> {
        &self.oled
    }
}

impl<I2C> IndicatorPort for CentralHardware<I2C> {
    fn set_colour(&mut self, colour: Rgb) {
        self.led.set_colour(colour);
    }

    fn show(&mut self) {
        self.led.show();
    }
}

impl<I2C: I2c> DisplayPort for CentralHardware<I2C> {
    fn begin(&mut self, addr: u8) -> Result<(), DisplayError> {
        self.oled.begin(addr)
    }

    fn clear(&mut self) {
        self.oled.clear_buffer();
    }

    fn draw_text(&mut self, x: i32, y: i32, size: TextSize, text: &str) {
        let font = match size {
            TextSize::Small => &FONT_6X10,
            TextSize::Large => &FONT_10X20,
        };
        self.oled.draw_text(x, y, font, text);
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        self.oled.present()
    }
}
