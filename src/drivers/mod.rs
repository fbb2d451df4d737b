//! Device drivers and hardware initialisation.
//!
//! The I2C drivers are generic over [`embedded_hal::i2c::I2c`], so they run
//! unchanged against the ESP-IDF bus on target and a register-map fake on
//! the host.

use crate::error::SensorError;
use crate::protocol::{BatteryState, Reading};

pub mod adxl343;
pub mod button;
pub mod hw_init;
pub mod max17048;
pub mod ssd1327;
pub mod status_led;

/// Three-axis accelerometer reporting in m/s².
pub trait Accelerometer {
    fn begin(&mut self) -> Result<(), SensorError>;

    fn read_acceleration(&mut self) -> Result<Reading, SensorError>;
}

/// Single-cell LiPo fuel gauge.
pub trait FuelGauge {
    fn begin(&mut self) -> Result<(), SensorError>;

    fn read_battery(&mut self) -> Result<BatteryState, SensorError>;
}
