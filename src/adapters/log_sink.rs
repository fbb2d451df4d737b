//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  This is the
//! diagnostic text stream of both roles.

use core::fmt;

use log::{info, warn};

use crate::aggregator::AggregatedReading;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::protocol::{Axis, BatteryState, Reading, WireValue};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::PeripheralStarted { logging } => {
                info!("START | peripheral, logging={}", if *logging { "on" } else { "off" });
            }
            AppEvent::PeripheralStateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::Published {
                reading, battery, ..
            } => {
                info!("{}", PublishLine::new(reading, battery.as_ref()));
            }
            AppEvent::LoggingDisabled(e) => {
                warn!("LOG | disabled: {}", e);
            }
            AppEvent::CentralStateChanged { from, to } => {
                info!("STATE | {} -> {}", from.name(), to.name());
            }
            AppEvent::ScanExpired { elapsed_ms } => {
                info!("SCAN | no match after {} ms", elapsed_ms);
            }
            AppEvent::PeerFound {
                address,
                elapsed_ms,
            } => {
                info!("SCAN | device found at {} after {} ms", address, elapsed_ms);
            }
            AppEvent::ConnectFailed(e) => {
                warn!("LINK | failed to connect: {}", e);
            }
            AppEvent::Rendered { reading, .. } => {
                info!("{}", RenderLine(reading));
            }
            AppEvent::DisplayToggled { enabled } => {
                info!("DISPLAY | {}", if *enabled { "on" } else { "off" });
            }
        }
    }
}

/// `X:   0.1569 m/s^2  Y:  -0.2353 m/s^2  Z:   9.8067 m/s^2`, with the
/// battery appended when a gauge is fitted.
pub struct PublishLine<'a> {
    reading: &'a Reading,
    battery: Option<&'a BatteryState>,
}

impl<'a> PublishLine<'a> {
    pub fn new(reading: &'a Reading, battery: Option<&'a BatteryState>) -> Self {
        Self { reading, battery }
    }
}

impl fmt::Display for PublishLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, axis) in Axis::ALL.into_iter().enumerate() {
            if i > 0 {
                f.write_str("  ")?;
            }
            let value = WireValue::encode(self.reading.axis(axis));
            write!(f, "{}: {} m/s^2", axis.label(), value)?;
        }
        if let Some(b) = self.battery {
            write!(f, "  V: {:.2}  SoC: {:.2}%", b.voltage, b.state_of_charge)?;
        }
        Ok(())
    }
}

/// `X Axis:   0.1569 Y Axis:  -0.2353 Z Axis:   9.8067`
pub struct RenderLine<'a>(pub &'a AggregatedReading);

impl fmt::Display for RenderLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X Axis: {} Y Axis: {} Z Axis: {}",
            self.0.x(),
            self.0.y(),
            self.0.z()
        )
    }
}
