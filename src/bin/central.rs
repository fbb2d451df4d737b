//! ADXL link central — entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  GattClient ──notify──▶ AGGREGATOR      CentralHardware      │
//! │  (GATTC + scan)                          (LED + OLED)         │
//! │                                                              │
//! │  ─────────────────── Port Trait Boundary ─────────────────   │
//! │                                                              │
//! │        CentralService (FSM · subscribe · render · toggle)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! BLE bring-up failure halts; a missing display only degrades rendering
//! to the log.

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use log::{error, info};

use adxl_link::adapters::gatt_client::GattClient;
use adxl_link::adapters::hardware::CentralHardware;
use adxl_link::adapters::log_sink::LogEventSink;
use adxl_link::aggregator::AGGREGATOR;
use adxl_link::app::CentralService;
use adxl_link::config::{CentralConfig, INDICATOR_BRIGHTNESS};
use adxl_link::drivers::button::ToggleButton;
use adxl_link::drivers::hw_init;
use adxl_link::drivers::ssd1327::Ssd1327;
use adxl_link::drivers::status_led::StatusLed;
use adxl_link::events::CENTRAL_LINK_EVENTS;
use adxl_link::pins;

fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("ADXL link central v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {} — halting", e);
        halt();
    }

    let config = CentralConfig::default();
    if let Err(e) = config.validate() {
        error!("config rejected: {} — halting", e);
        halt();
    }
    let poll_ms = config.poll_interval_ms;

    // ── 2. Display, indicator, toggle input ───────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: each GPIO below has a single owner.
    let (sda, scl, button) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyIOPin::new(pins::BUTTON_GPIO),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz()),
    )?;
    let mut ui = CentralHardware::new(Ssd1327::new(i2c), StatusLed::new(INDICATOR_BRIGHTNESS));

    let mut button = PinDriver::input(button)?;
    button.set_pull(Pull::Up)?;
    let mut toggle = ToggleButton::new(button);

    // ── 3. BLE ────────────────────────────────────────────────
    let mut client = GattClient::new();
    if let Err(e) = client.init() {
        error!("{} — halting", e);
        halt();
    }
    let mut sink = LogEventSink::new();

    // ── 4. Start ──────────────────────────────────────────────
    let mut service = CentralService::new(config, &AGGREGATOR, &CENTRAL_LINK_EVENTS);
    service.start(&mut ui);

    // ── 5. Loop ───────────────────────────────────────────────
    info!("System ready. Entering main loop.");
    loop {
        let pressed = toggle.poll();
        service.poll(&mut client, &mut ui, pressed, &mut sink);
        FreeRtos::delay_ms(poll_ms);
    }
}
