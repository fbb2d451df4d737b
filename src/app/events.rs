//! Outbound application events.
//!
//! The services emit these through the [`EventSink`](super::ports::EventSink)
//! port.  The log adapter turns them into the diagnostic text stream; tests
//! record them.

use crate::aggregator::AggregatedReading;
use crate::error::{InitError, LinkError};
use crate::fsm::central::CentralState;
use crate::fsm::peripheral::PeripheralState;
use crate::protocol::{BatteryState, Reading};

use super::ports::PeerAddress;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Peripheral drivers are up; carries whether a log file is active.
    PeripheralStarted { logging: bool },

    PeripheralStateChanged {
        from: PeripheralState,
        to: PeripheralState,
    },

    /// One sample cycle ran.  `notified` is false while no central is connected.
    Published {
        reading: Reading,
        battery: Option<BatteryState>,
        notified: bool,
    },

    /// Storage could not be brought up; telemetry continues unlogged.
    LoggingDisabled(InitError),

    CentralStateChanged {
        from: CentralState,
        to: CentralState,
    },

    /// A scan ended without finding the wanted name.
    ScanExpired { elapsed_ms: u32 },

    /// The wanted name was seen; `elapsed_ms` is how long the scan ran.
    PeerFound {
        address: PeerAddress,
        elapsed_ms: u32,
    },

    ConnectFailed(LinkError),

    /// A complete reading was presented.
    Rendered {
        reading: AggregatedReading,
        on_display: bool,
    },

    DisplayToggled { enabled: bool },
}
