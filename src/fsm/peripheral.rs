//! Peripheral advertise/connect state machine.
//!
//! ```text
//!  IDLE ──[Started]──▶ ADVERTISING ──[CentralConnected]──▶ CONNECTED
//!                           ▲                                  │
//!                           └────────[CentralDisconnected]─────┘
//!                              disarm X,Y,Z · re-advertise
//! ```
//!
//! The disconnected state is transient: the disconnect transition disarms
//! every axis and restarts advertising in the same step.
//!
//! Notifications are forced off on connect by the GATT server itself, in
//! the stack callback and before the event is queued, so CCCD writes that
//! land before the main loop sees the connection are kept.

use log::warn;

use super::Transition;
use crate::config::{COLOUR_PERIPHERAL_CONNECTED, COLOUR_PERIPHERAL_IDLE, Rgb};
use crate::protocol::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeripheralState {
    Idle,
    Advertising,
    Connected,
}

impl PeripheralState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Advertising => "Advertising",
            Self::Connected => "Connected",
        }
    }

    /// Indicator colour shown while in this state.
    pub fn indicator(self) -> Rgb {
        match self {
            Self::Connected => COLOUR_PERIPHERAL_CONNECTED,
            Self::Idle | Self::Advertising => COLOUR_PERIPHERAL_IDLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralEvent {
    /// Drivers are up and the GATT service is registered.
    Started,
    CentralConnected,
    CentralDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralAction {
    /// Force the axis's notification flag off.
    DisarmNotifications(Axis),
    StartAdvertising,
    SetIndicator(Rgb),
}

pub type PeripheralTransition = Transition<PeripheralState, PeripheralAction>;

/// Feed one event to the peripheral machine.
pub fn step(state: PeripheralState, event: PeripheralEvent) -> PeripheralTransition {
    use PeripheralAction::*;
    use PeripheralEvent::*;
    use PeripheralState::*;

    match (state, event) {
        (Idle, Started) => Transition::to(Idle, Advertising)
            .then(StartAdvertising)
            .then(SetIndicator(Advertising.indicator())),

        (Advertising, CentralConnected) => {
            Transition::to(Advertising, Connected).then(SetIndicator(Connected.indicator()))
        }

        (Connected, CentralDisconnected) => Transition::to(Connected, Advertising)
            .then(DisarmNotifications(Axis::X))
            .then(DisarmNotifications(Axis::Y))
            .then(DisarmNotifications(Axis::Z))
            .then(StartAdvertising)
            .then(SetIndicator(Advertising.indicator())),

        (s, e) => {
            warn!("peripheral: ignoring {:?} in {}", e, s.name());
            Transition::ignored(s)
        }
    }
}
