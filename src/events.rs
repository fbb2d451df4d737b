//! Link events crossing from BLE stack callbacks into the main loop.
//!
//! The stack reports connects and disconnects on its own task.  Callbacks
//! only push a tagged event; the main loop drains the queue once per
//! iteration and feeds each event to the role's transition function.
//!
//! ```text
//! ┌──────────────────┐  push   ┌────────────────┐  drain  ┌─────────────┐
//! │ GATTS / GATTC cb │───────▶│ LinkEventQueue │───────▶│  Main Loop  │
//! └──────────────────┘         └────────────────┘         └─────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

/// Queue depth.  Link events arrive at human timescales, a handful per
/// session, so a small buffer never fills between two loop iterations.
pub const LINK_EVENT_DEPTH: usize = 8;

/// Events raised by the GATT server callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeripheralLinkEvent {
    CentralConnected,
    CentralDisconnected,
}

/// Events raised by the GATT client callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentralLinkEvent {
    /// The stack reported the connection open.
    Connected,
    /// The stack reported the connection closed.
    Disconnected,
}

/// Bounded MPSC queue of link events.
pub struct LinkEventQueue<E, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, E, N>,
}

impl<E, const N: usize> LinkEventQueue<E, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push from callback context.  Returns `false` if the queue is full
    /// and the event was dropped.
    pub fn push(&self, event: E) -> bool {
        if self.channel.try_send(event).is_err() {
            warn!("link event queue full, event dropped");
            return false;
        }
        true
    }

    /// Pop the oldest pending event.
    pub fn pop(&self) -> Option<E> {
        self.channel.try_receive().ok()
    }

    /// Hand every pending event to `handler`, oldest first.
    pub fn drain(&self, mut handler: impl FnMut(E)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    /// Discard anything pending.
    pub fn clear(&self) {
        self.channel.clear();
    }
}

impl<E, const N: usize> Default for LinkEventQueue<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Peripheral role: GATTS callbacks → main loop.
pub static PERIPHERAL_LINK_EVENTS: LinkEventQueue<PeripheralLinkEvent, LINK_EVENT_DEPTH> =
    LinkEventQueue::new();

/// Central role: GATTC callbacks → main loop.
pub static CENTRAL_LINK_EVENTS: LinkEventQueue<CentralLinkEvent, LINK_EVENT_DEPTH> =
    LinkEventQueue::new();
