//! GPIO / peripheral pin assignments shared by both boards.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Both roles run on a standard ESP32 devkit.

// ---------------------------------------------------------------------------
// I²C bus (ADXL343 + MAX17048 on the peripheral, SSD1327 on the central)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Standard-mode is enough for a 6-byte poll every 500 ms; the OLED flush
/// benefits from fast-mode.
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB or common-cathode RGB on LEDC)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 25;
pub const LED_G_GPIO: i32 = 26;
pub const LED_B_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// SD card (SPI, peripheral only)
// ---------------------------------------------------------------------------

pub const SD_SCK_GPIO: i32 = 18;
pub const SD_MOSI_GPIO: i32 = 23;
pub const SD_MISO_GPIO: i32 = 19;
// CS comes from `PeripheralConfig::sd_cs_gpio`.

// ---------------------------------------------------------------------------
// User button (central, active-low, boot strap pin with on-board pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC frequency for the RGB status LED (1 kHz, 8-bit).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
