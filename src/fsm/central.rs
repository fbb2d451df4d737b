//! Central scan/connect/subscribe state machine.
//!
//! ```text
//!  IDLE ──[ScanStarted]──▶ SCANNING ──[PeerMatched]──▶ CONNECTING
//!                            ▲  │                        │     │
//!             [ScanStarted]  │  └─[ScanExpired]          │ [Subscribed]
//!                            │     (scan again)          │     ▼
//!                      DISCONNECTED ◀──[ConnectFailed]───┘  CONNECTED
//!                            ▲                                 │
//!                            └──────────[LinkLost]─────────────┘
//! ```
//!
//! A failed connect always tears the link down before falling back, no
//! matter which resolution step failed.

use log::warn;

use super::Transition;
use crate::config::{
    COLOUR_CENTRAL_CONNECTED, COLOUR_CENTRAL_DISCONNECTED, COLOUR_CENTRAL_SCANNING, Rgb,
};
use crate::error::LinkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CentralState {
    Idle,
    Scanning,
    Connecting,
    Connected,
    Disconnected,
}

impl CentralState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scanning => "Scanning",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// States in which the main loop runs a scan.
    pub fn wants_scan(self) -> bool {
        matches!(self, Self::Idle | Self::Scanning | Self::Disconnected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralEvent {
    /// A bounded scan is about to start.
    ScanStarted,
    /// An advertisement carried the wanted name.
    PeerMatched,
    /// The scan ran to its bound without a match.
    ScanExpired,
    /// Service and characteristics resolved, CCCDs written.
    Subscribed,
    ConnectFailed(LinkError),
    LinkLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralAction {
    SetIndicator(Rgb),
    /// Flash the failure colour once.
    FlashFailure,
    /// Drop any partially open link.
    TearDown,
    /// Forget slots from a previous session.
    ResetReadings,
}

pub type CentralTransition = Transition<CentralState, CentralAction>;

/// Feed one event to the central machine.
pub fn step(state: CentralState, event: CentralEvent) -> CentralTransition {
    use CentralAction::*;
    use CentralEvent::*;
    use CentralState::*;

    match (state, event) {
        (Idle | Scanning | Disconnected, ScanStarted) => {
            Transition::to(state, Scanning).then(SetIndicator(COLOUR_CENTRAL_SCANNING))
        }

        (Scanning, PeerMatched) => Transition::to(Scanning, Connecting)
            .then(SetIndicator(Rgb::OFF))
            .then(ResetReadings),

        (Scanning, ScanExpired) => Transition::to(Scanning, Scanning).then(SetIndicator(Rgb::OFF)),

        (Connecting, Subscribed) => {
            Transition::to(Connecting, Connected).then(SetIndicator(COLOUR_CENTRAL_CONNECTED))
        }

        (Connecting, ConnectFailed(_)) => Transition::to(Connecting, Disconnected)
            .then(TearDown)
            .then(FlashFailure),

        (Connecting | Connected, LinkLost) => Transition::to(state, Disconnected)
            .then(ResetReadings)
            .then(SetIndicator(COLOUR_CENTRAL_DISCONNECTED)),

        (s, e) => {
            warn!("central: ignoring {:?} in {}", e, s.name());
            Transition::ignored(s)
        }
    }
}
