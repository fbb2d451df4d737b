//! Port traits — the hexagonal boundary between the link logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PeripheralService / CentralService
//! ```
//!
//! Driven adapters (sensors, indicator, display, storage, BLE stack, event
//! sinks) implement these traits.  The services consume them via generics,
//! so the state machines never touch hardware directly and every role runs
//! on the host against recording mocks.

use core::fmt;

use crate::config::Rgb;
use crate::error::{DisplayError, InitError, LinkError, SensorError, StorageError};
use crate::protocol::{Axis, BatteryState, Reading, WireValue};

// ───────────────────────────────────────────────────────────────
// Sensor port (peripheral: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Everything sampled in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSample {
    pub reading: Reading,
    /// `None` when no fuel gauge is fitted.
    pub battery: Option<BatteryState>,
}

pub trait SensorPort {
    /// Probe and configure every fitted sensor.
    fn begin(&mut self) -> Result<(), InitError>;

    /// One accelerometer poll plus, if fitted, one gauge read.
    fn read(&mut self) -> Result<SensorSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port
// ───────────────────────────────────────────────────────────────

/// Single RGB status light.
pub trait IndicatorPort {
    /// Latch a colour; takes effect on the next [`show`](Self::show).
    fn set_colour(&mut self, colour: Rgb);

    fn show(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display port (central)
// ───────────────────────────────────────────────────────────────

/// Text scale.  `Small` is the 1x font, `Large` the 2x one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Large,
}

/// Monochrome bitmap display with a text cursor.
pub trait DisplayPort {
    fn begin(&mut self, addr: u8) -> Result<(), DisplayError>;

    /// Blank the back buffer.
    fn clear(&mut self);

    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, x: i32, y: i32, size: TextSize, text: &str);

    /// Push the back buffer to the panel.
    fn present(&mut self) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (peripheral)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create or truncate.
    Write,
    /// Create if missing, always write at the end.
    Append,
}

/// Removable file storage.
pub trait StoragePort {
    type File;

    fn mount(&mut self, cs_gpio: i32) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> bool;

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, StorageError>;

    fn append(&mut self, file: &mut Self::File, data: &[u8]) -> Result<(), StorageError>;

    /// Flush and release.
    fn close(&mut self, file: Self::File);
}

// ───────────────────────────────────────────────────────────────
// GATT server port (peripheral)
// ───────────────────────────────────────────────────────────────

/// Implementations clear every axis's notification flag when a central
/// connects, before the connection is reported to the main loop.
pub trait GattServerPort {
    fn start_advertising(&mut self) -> Result<(), LinkError>;

    /// Force an axis's CCCD notification flag.
    fn set_notifications(&mut self, axis: Axis, enabled: bool);

    fn notifications_enabled(&self, axis: Axis) -> bool;

    /// Fire-and-forget.  Delivery is gated by the transport on the
    /// subscriber's CCCD, not by the caller.
    fn notify(&mut self, axis: Axis, value: &WireValue) -> Result<(), LinkError>;
}

// ───────────────────────────────────────────────────────────────
// GATT client port (central)
// ───────────────────────────────────────────────────────────────

/// 48-bit BLE device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeerAddress(pub [u8; 6]);

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// One scan result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advertisement<'a> {
    pub address: PeerAddress,
    /// Complete or shortened local name, if advertised.
    pub name: Option<&'a str>,
    pub rssi: i8,
}

/// Returned by the scan callback for each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// How a blocking scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    pub elapsed_ms: u32,
    /// The callback asked to stop before the bound.
    pub stopped_early: bool,
}

pub trait GattClientPort {
    /// Active scan, blocking for at most `duration_ms`.  Each result is
    /// handed to `on_result`; returning [`ScanControl::Stop`] ends the
    /// scan immediately.
    fn scan(
        &mut self,
        duration_ms: u32,
        on_result: &mut dyn FnMut(&Advertisement<'_>) -> ScanControl,
    ) -> ScanSummary;

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), LinkError>;

    fn discover_service(&mut self, uuid: u128) -> Result<(), LinkError>;

    fn discover_characteristic(&mut self, axis: Axis) -> Result<(), LinkError>;

    /// Route the axis's notifications to its aggregator slot.
    fn register_notify(&mut self, axis: Axis) -> Result<(), LinkError>;

    /// Write the axis characteristic's CCCD.
    fn write_descriptor(&mut self, axis: Axis, value: &[u8; 2]) -> Result<(), LinkError>;

    /// Close the link, if any.  Idempotent.
    fn disconnect(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The services emit structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
