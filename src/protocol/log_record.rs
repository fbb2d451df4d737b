//! Persisted telemetry record format.
//!
//! Comma-separated text, one line per sample cycle:
//!
//! ```text
//! Millis, Voltage, StateOfCharge, X, Y, Z\r\n      ← header, written once
//! 15000,4.12,87.50,0.1569,-0.2353,9.8067\r\n
//! 15500,,,0.1569,-0.2353,9.8067\r\n              ← no fuel gauge fitted
//! ```

use core::fmt::Write;

use super::Reading;

/// Header line written once when the log file is created.
pub const LOG_HEADER: &str = "Millis, Voltage, StateOfCharge, X, Y, Z\r\n";

/// Longest line a record can render to.
pub const MAX_RECORD_LEN: usize = 256;

/// Fuel-gauge sample taken in the same cycle as the reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatteryState {
    /// Cell voltage (V).
    pub voltage: f32,
    /// State of charge (%).
    pub state_of_charge: f32,
}

/// One append-only log line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    /// Monotonic milliseconds since boot.
    pub timestamp_ms: u64,
    pub reading: Reading,
    pub battery: Option<BatteryState>,
}

impl LogRecord {
    pub fn new(timestamp_ms: u64, reading: Reading, battery: Option<BatteryState>) -> Self {
        Self {
            timestamp_ms,
            reading,
            battery,
        }
    }

    /// Render as `timestamp_ms,voltage,soc,x,y,z\r\n`.
    ///
    /// Battery fields are left empty when no gauge is fitted.
    pub fn to_line(&self) -> heapless::String<MAX_RECORD_LEN> {
        let mut line = heapless::String::new();
        let _ = write!(line, "{},", self.timestamp_ms);
        match self.battery {
            Some(b) => {
                let _ = write!(line, "{:.2},{:.2},", b.voltage, b.state_of_charge);
            }
            None => {
                let _ = line.push_str(",,");
            }
        }
        let _ = write!(
            line,
            "{:.4},{:.4},{:.4}\r\n",
            self.reading.x, self.reading.y, self.reading.z
        );
        line
    }
}
