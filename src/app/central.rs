//! Central application service.
//!
//! [`CentralService::poll`] is one iteration of the fixed-rate main loop:
//!
//! ```text
//!  1. drain link events        (LinkLost ─▶ Disconnected, colour D)
//!  2. Connecting?              connect ─▶ service ─▶ X,Y,Z ─▶ notify ─▶ CCCD 01 00
//!                              any failure ─▶ teardown ─▶ E until next iteration
//!  3. indicator                C when connected, else D and a bounded scan
//!  4. render                   only when Connected and X,Y,Z all fresh
//!  5. toggle input             flips display rendering
//! ```

use log::{debug, info};

use crate::aggregator::ReadingAggregator;
use crate::config::{
    COLOUR_CENTRAL_CONNECTED, COLOUR_CENTRAL_DISCONNECTED, COLOUR_CENTRAL_FAILED, CentralConfig,
    Rgb,
};
use crate::error::LinkError;
use crate::events::{CentralLinkEvent, LINK_EVENT_DEPTH, LinkEventQueue};
use crate::fsm::central::{self, CentralAction, CentralEvent, CentralState, CentralTransition};
use crate::presenter::Presenter;
use crate::protocol::{Axis, CCCD_NOTIFY_ON, SERVICE_UUID};

use super::events::AppEvent;
use super::ports::{
    Advertisement, DisplayPort, EventSink, GattClientPort, IndicatorPort, PeerAddress,
    ScanControl,
};

pub struct CentralService<'a> {
    config: CentralConfig,
    aggregator: &'a ReadingAggregator,
    link_events: &'a LinkEventQueue<CentralLinkEvent, LINK_EVENT_DEPTH>,
    presenter: Presenter,
    state: CentralState,
    peer: Option<PeerAddress>,
    renders: u64,
}

impl<'a> CentralService<'a> {
    pub fn new(
        config: CentralConfig,
        aggregator: &'a ReadingAggregator,
        link_events: &'a LinkEventQueue<CentralLinkEvent, LINK_EVENT_DEPTH>,
    ) -> Self {
        Self {
            config,
            aggregator,
            link_events,
            presenter: Presenter::new(),
            state: CentralState::Idle,
            peer: None,
            renders: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up the display.  A missing display is not an error.
    pub fn start(&mut self, ui: &mut (impl IndicatorPort + DisplayPort)) {
        self.presenter.init(ui, self.config.display_addr);
        ui.set_colour(Rgb::OFF);
        ui.show();
        info!("looking for {}", self.config.device_name);
    }

    // ── Per-iteration orchestration ───────────────────────────

    pub fn poll(
        &mut self,
        link: &mut impl GattClientPort,
        ui: &mut (impl IndicatorPort + DisplayPort),
        toggle_pressed: bool,
        sink: &mut impl EventSink,
    ) {
        while let Some(event) = self.link_events.pop() {
            match event {
                CentralLinkEvent::Disconnected => {
                    let t = central::step(self.state, CentralEvent::LinkLost);
                    self.apply(t, link, ui, sink);
                }
                CentralLinkEvent::Connected => debug!("link up"),
            }
        }

        // The failure colour stays up until the next iteration.
        let failed = self.state == CentralState::Connecting && !self.connect(link, ui, sink);

        if self.state.is_connected() {
            ui.set_colour(COLOUR_CENTRAL_CONNECTED);
            ui.show();
        } else if !failed {
            ui.set_colour(COLOUR_CENTRAL_DISCONNECTED);
            ui.show();
            if self.state.wants_scan() {
                self.scan(link, ui, sink);
            }
        }

        if self.state.is_connected() {
            if let Some(reading) = self.aggregator.take_complete() {
                let on_display = self.presenter.render(ui, &reading);
                self.renders += 1;
                sink.emit(&AppEvent::Rendered {
                    reading,
                    on_display,
                });
            }
        }

        if toggle_pressed {
            if let Some(enabled) = self.presenter.toggle() {
                sink.emit(&AppEvent::DisplayToggled { enabled });
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> CentralState {
        self.state
    }

    /// Address matched by the last successful scan.
    pub fn peer(&self) -> Option<PeerAddress> {
        self.peer
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    // ── Internal ──────────────────────────────────────────────

    fn scan(
        &mut self,
        link: &mut impl GattClientPort,
        ui: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        let t = central::step(self.state, CentralEvent::ScanStarted);
        self.apply(t, link, ui, sink);
        info!("scanning for up to {} ms", self.config.scan_duration_ms);

        let wanted = self.config.device_name.as_str();
        let mut found: Option<PeerAddress> = None;
        let summary = link.scan(self.config.scan_duration_ms, &mut |adv: &Advertisement<'_>| {
            if found.is_none() && adv.name == Some(wanted) {
                found = Some(adv.address);
                return ScanControl::Stop;
            }
            ScanControl::Continue
        });

        match found {
            Some(addr) => {
                info!("found {} at {} after {} ms", wanted, addr, summary.elapsed_ms);
                self.peer = Some(addr);
                // Anything still queued belongs to an earlier link.
                self.link_events.clear();
                sink.emit(&AppEvent::PeerFound {
                    address: addr,
                    elapsed_ms: summary.elapsed_ms,
                });
                let t = central::step(self.state, CentralEvent::PeerMatched);
                self.apply(t, link, ui, sink);
            }
            None => {
                info!("scan ended");
                sink.emit(&AppEvent::ScanExpired {
                    elapsed_ms: summary.elapsed_ms,
                });
                let t = central::step(self.state, CentralEvent::ScanExpired);
                self.apply(t, link, ui, sink);
            }
        }
    }

    fn connect(
        &mut self,
        link: &mut impl GattClientPort,
        ui: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let result = match self.peer {
            Some(peer) => {
                info!("connecting to {}", peer);
                open_link(link, &peer)
            }
            None => Err(LinkError::ConnectFailed),
        };

        let subscribed = result.is_ok();
        let event = match result {
            Ok(()) => {
                info!("subscribed to X, Y, Z");
                CentralEvent::Subscribed
            }
            Err(e) => {
                sink.emit(&AppEvent::ConnectFailed(e));
                CentralEvent::ConnectFailed(e)
            }
        };
        let t = central::step(self.state, event);
        self.apply(t, link, ui, sink);
        subscribed
    }

    fn apply(
        &mut self,
        t: CentralTransition,
        link: &mut impl GattClientPort,
        ui: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) {
        for action in &t.actions {
            match *action {
                CentralAction::SetIndicator(colour) => {
                    ui.set_colour(colour);
                    ui.show();
                }
                // Latched until the next indicator update replaces it.
                CentralAction::FlashFailure => {
                    ui.set_colour(COLOUR_CENTRAL_FAILED);
                    ui.show();
                }
                CentralAction::TearDown => link.disconnect(),
                CentralAction::ResetReadings => self.aggregator.clear(),
            }
        }

        if t.changed() {
            sink.emit(&AppEvent::CentralStateChanged {
                from: t.from,
                to: t.next,
            });
        }
        self.state = t.next;
    }
}

/// Resolve the telemetry service and arm all three axes.
///
/// Handlers are registered for every axis before any CCCD is written, so
/// no notification can arrive without a slot to land in.
fn open_link(link: &mut impl GattClientPort, peer: &PeerAddress) -> Result<(), LinkError> {
    link.connect(peer)?;
    link.discover_service(SERVICE_UUID)?;
    for axis in Axis::ALL {
        link.discover_characteristic(axis)?;
    }
    for axis in Axis::ALL {
        link.register_notify(axis)?;
    }
    for axis in Axis::ALL {
        link.write_descriptor(axis, &CCCD_NOTIFY_ON)?;
    }
    Ok(())
}
