//! Build-time configuration for both roles.
//!
//! Everything here is a compile-time constant; the serde-derived structs
//! collect them so services take one value instead of a dozen globals and
//! tests can override individual fields.

use serde::{Deserialize, Serialize};

use crate::drivers::adxl343::Range;

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Name the peripheral advertises and the central matches exactly.
pub const DEVICE_NAME: &str = "ESP32_ADXL343";

// ---------------------------------------------------------------------------
// Peripheral
// ---------------------------------------------------------------------------

/// Sample/publish period.
pub const PUBLISH_INTERVAL_MS: u32 = 500;
/// Append-only telemetry log on the SD card.
pub const LOG_PATH: &str = "/sdcard/adxl_log.csv";
/// SPI chip-select for the SD card.
pub const SD_CS_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Central
// ---------------------------------------------------------------------------

/// Upper bound on one blocking scan.
pub const SCAN_DURATION_MS: u32 = 30_000;
/// SSD1327 I2C address.
pub const DISPLAY_ADDR: u8 = 0x3D;
/// Main-loop poll period; also the button sampling cadence.
pub const CENTRAL_POLL_MS: u32 = 50;

// ---------------------------------------------------------------------------
// Indicator colours
// ---------------------------------------------------------------------------

/// 8-bit RGB triple for the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Self = Self(0, 0, 0);
    pub const RED: Self = Self(0xFF, 0, 0);
    pub const BLUE: Self = Self(0, 0, 0xFF);
    pub const YELLOW: Self = Self(0xFF, 0xFF, 0);
    pub const MAGENTA: Self = Self(0xFF, 0, 0xFF);
}

/// Peripheral: a central is connected.
pub const COLOUR_PERIPHERAL_CONNECTED: Rgb = Rgb::BLUE;
/// Peripheral: advertising / waiting.
pub const COLOUR_PERIPHERAL_IDLE: Rgb = Rgb::YELLOW;
/// Central: subscribed to a peripheral.
pub const COLOUR_CENTRAL_CONNECTED: Rgb = Rgb::BLUE;
/// Central: no link.
pub const COLOUR_CENTRAL_DISCONNECTED: Rgb = Rgb::RED;
/// Central: connect attempt failed (flashed once).
pub const COLOUR_CENTRAL_FAILED: Rgb = Rgb::MAGENTA;
/// Central: scan in progress.
pub const COLOUR_CENTRAL_SCANNING: Rgb = Rgb::YELLOW;

/// LED brightness scale (0–255) applied by the LED driver.
pub const INDICATOR_BRIGHTNESS: u8 = 25;

// ---------------------------------------------------------------------------
// Role configs
// ---------------------------------------------------------------------------

/// Range-check failure, naming the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError(pub &'static str);

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid config: {}", self.0)
    }
}

/// Sensor-bearing peripheral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeripheralConfig {
    pub device_name: heapless::String<29>,
    /// Sample/notify/log period (milliseconds)
    pub publish_interval_ms: u32,
    pub accel_range: Range,
    /// Fuel gauge fitted; a missing gauge is then fatal.
    pub battery_enabled: bool,
    pub logging_enabled: bool,
    pub log_path: heapless::String<64>,
    pub sd_cs_gpio: i32,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            device_name: fixed(DEVICE_NAME),
            publish_interval_ms: PUBLISH_INTERVAL_MS,
            accel_range: Range::G4,
            battery_enabled: false,
            logging_enabled: true,
            log_path: fixed(LOG_PATH),
            sd_cs_gpio: SD_CS_GPIO,
        }
    }
}

impl PeripheralConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError("device_name is empty"));
        }
        if self.publish_interval_ms == 0 {
            return Err(ConfigError("publish_interval_ms must be > 0"));
        }
        if self.logging_enabled && self.log_path.is_empty() {
            return Err(ConfigError("log_path is empty"));
        }
        Ok(())
    }
}

/// Display-bearing central.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralConfig {
    /// Advertised name to match (exact equality).
    pub device_name: heapless::String<29>,
    pub scan_duration_ms: u32,
    pub display_addr: u8,
    pub poll_interval_ms: u32,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            device_name: fixed(DEVICE_NAME),
            scan_duration_ms: SCAN_DURATION_MS,
            display_addr: DISPLAY_ADDR,
            poll_interval_ms: CENTRAL_POLL_MS,
        }
    }
}

impl CentralConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError("device_name is empty"));
        }
        if self.scan_duration_ms == 0 {
            return Err(ConfigError("scan_duration_ms must be > 0"));
        }
        if self.display_addr > 0x7F {
            return Err(ConfigError("display_addr is not a 7-bit address"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError("poll_interval_ms must be > 0"));
        }
        Ok(())
    }
}

/// Copy a constant into a fixed-capacity string, clipping at capacity.
fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
