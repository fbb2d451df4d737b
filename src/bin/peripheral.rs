//! ADXL link peripheral — entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PeripheralHardware   GattServer   TelemetryLogger<SdCard>   │
//! │  (Sensor+Indicator)   (GATTS)      (StoragePort)             │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ─────────────────   │
//! │                                                              │
//! │            PeripheralService (FSM · sample cadence)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sensor or BLE bring-up failure halts; a missing SD card only disables
//! the log.

use core::cell::RefCell;

use anyhow::Result;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use log::{error, info};

use adxl_link::adapters::gatt_server::GattServer;
use adxl_link::adapters::hardware::PeripheralHardware;
use adxl_link::adapters::log_sink::LogEventSink;
use adxl_link::adapters::storage::SdCard;
use adxl_link::adapters::time::Clock;
use adxl_link::app::PeripheralService;
use adxl_link::config::{INDICATOR_BRIGHTNESS, PeripheralConfig};
use adxl_link::drivers::adxl343::Adxl343;
use adxl_link::drivers::max17048::Max17048;
use adxl_link::drivers::status_led::StatusLed;
use adxl_link::drivers::hw_init;
use adxl_link::events::PERIPHERAL_LINK_EVENTS;
use adxl_link::pins;
use adxl_link::telemetry_log::TelemetryLogger;

/// Main-loop period.  The sample cadence itself comes from the config.
const LOOP_MS: u32 = 10;

fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("ADXL link peripheral v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {} — halting", e);
        halt();
    }

    let config = PeripheralConfig::default();
    if let Err(e) = config.validate() {
        error!("config rejected: {} — halting", e);
        halt();
    }

    // ── 2. Shared I2C bus: ADXL343 + optional MAX17048 ─────────
    let peripherals = Peripherals::take()?;
    // SAFETY: SDA/SCL are used by this bus only.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz()),
    )?;
    let bus = RefCell::new(i2c);

    let accel = Adxl343::new(RefCellDevice::new(&bus), config.accel_range);
    let gauge = config
        .battery_enabled
        .then(|| Max17048::new(RefCellDevice::new(&bus)));
    let mut hw = PeripheralHardware::new(accel, gauge, StatusLed::new(INDICATOR_BRIGHTNESS));

    // ── 3. BLE, storage, sink ─────────────────────────────────
    let mut server = GattServer::new(&config.device_name);
    if let Err(e) = server.init() {
        error!("{} — halting", e);
        halt();
    }
    let mut logger = TelemetryLogger::new(SdCard::new(), &config.log_path);
    let mut sink = LogEventSink::new();

    // ── 4. Start ──────────────────────────────────────────────
    let mut service = PeripheralService::new(config, &PERIPHERAL_LINK_EVENTS);
    if let Err(e) = service.start(&mut hw, &mut server, &mut logger, &mut sink) {
        error!("{} — halting", e);
        halt();
    }

    // ── 5. Loop ───────────────────────────────────────────────
    let clock = Clock::new();
    info!("System ready. Entering main loop.");
    loop {
        service.tick(clock.uptime_ms(), &mut hw, &mut server, &mut logger, &mut sink);
        FreeRtos::delay_ms(LOOP_MS);
    }
}
