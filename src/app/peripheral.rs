//! Peripheral application service.
//!
//! [`PeripheralService`] owns the connection state and the sample cadence.
//! Hardware, the GATT server and storage are injected at call sites.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────┐ ──▶ GattServerPort (notify X,Y,Z)
//!                 │  PeripheralService   │ ──▶ TelemetryLogger (append)
//!  link events ──▶│  FSM · sample timer  │ ──▶ IndicatorPort · EventSink
//!                 └──────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::PeripheralConfig;
use crate::error::InitError;
use crate::events::{LINK_EVENT_DEPTH, LinkEventQueue, PeripheralLinkEvent};
use crate::fsm::peripheral::{
    self, PeripheralAction, PeripheralEvent, PeripheralState, PeripheralTransition,
};
use crate::protocol::{Axis, LogRecord};
use crate::telemetry_log::TelemetryLogger;

use super::events::AppEvent;
use super::ports::{EventSink, GattServerPort, IndicatorPort, SensorPort, StoragePort};

pub struct PeripheralService<'a> {
    config: PeripheralConfig,
    link_events: &'a LinkEventQueue<PeripheralLinkEvent, LINK_EVENT_DEPTH>,
    state: PeripheralState,
    last_cycle_ms: Option<u64>,
    cycles: u64,
}

impl<'a> PeripheralService<'a> {
    pub fn new(
        config: PeripheralConfig,
        link_events: &'a LinkEventQueue<PeripheralLinkEvent, LINK_EVENT_DEPTH>,
    ) -> Self {
        Self {
            config,
            link_events,
            state: PeripheralState::Idle,
            last_cycle_ms: None,
            cycles: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring up sensors and storage, then start advertising.
    ///
    /// Sensor failures are fatal and returned; a storage failure only
    /// disables logging.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        server: &mut impl GattServerPort,
        logger: &mut TelemetryLogger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) -> Result<(), InitError> {
        if let Err(e) = hw.begin() {
            error!("{}", e);
            return Err(e);
        }

        if let Err(e) = logger.init(self.config.logging_enabled, self.config.sd_cs_gpio) {
            if e.is_fatal() {
                return Err(e);
            }
            warn!("continuing without telemetry log: {}", e);
            sink.emit(&AppEvent::LoggingDisabled(e));
        }
        sink.emit(&AppEvent::PeripheralStarted {
            logging: logger.is_active(),
        });

        let t = peripheral::step(self.state, PeripheralEvent::Started);
        self.apply(t, hw, server, sink);
        info!("advertising as {}", self.config.device_name);
        Ok(())
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One main-loop iteration: apply pending link events, then run a
    /// sample cycle if the interval has elapsed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + IndicatorPort),
        server: &mut impl GattServerPort,
        logger: &mut TelemetryLogger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        while let Some(event) = self.link_events.pop() {
            self.handle_link_event(event, hw, server, sink);
        }

        if self.cycle_due(now_ms) {
            self.last_cycle_ms = Some(now_ms);
            self.sample_cycle(now_ms, hw, server, logger, sink);
        }
    }

    /// Feed one link event to the state machine.
    pub fn handle_link_event(
        &mut self,
        event: PeripheralLinkEvent,
        hw: &mut impl IndicatorPort,
        server: &mut impl GattServerPort,
        sink: &mut impl EventSink,
    ) {
        let event = match event {
            PeripheralLinkEvent::CentralConnected => PeripheralEvent::CentralConnected,
            PeripheralLinkEvent::CentralDisconnected => PeripheralEvent::CentralDisconnected,
        };
        let t = peripheral::step(self.state, event);
        self.apply(t, hw, server, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> PeripheralState {
        self.state
    }

    /// Sample cycles run since start.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn cycle_due(&self, now_ms: u64) -> bool {
        match self.last_cycle_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.config.publish_interval_ms),
        }
    }

    fn sample_cycle(
        &mut self,
        now_ms: u64,
        hw: &mut impl SensorPort,
        server: &mut impl GattServerPort,
        logger: &mut TelemetryLogger<impl StoragePort>,
        sink: &mut impl EventSink,
    ) {
        let sample = match hw.read() {
            Ok(s) => s,
            Err(e) => {
                warn!("sensor read failed: {}", e);
                return;
            }
        };
        self.cycles += 1;

        let notified = self.state == PeripheralState::Connected;
        if notified {
            let wire = sample.reading.encode();
            for axis in Axis::ALL {
                if let Err(e) = server.notify(axis, &wire[axis.index()]) {
                    warn!("notify {} failed: {}", axis.label(), e);
                }
            }
        }

        let record = LogRecord::new(now_ms, sample.reading, sample.battery);
        if let Err(e) = logger.append(&record) {
            warn!("log append failed: {}", e);
        }

        sink.emit(&AppEvent::Published {
            reading: sample.reading,
            battery: sample.battery,
            notified,
        });
    }

    fn apply(
        &mut self,
        t: PeripheralTransition,
        hw: &mut impl IndicatorPort,
        server: &mut impl GattServerPort,
        sink: &mut impl EventSink,
    ) {
        for action in &t.actions {
            match *action {
                PeripheralAction::DisarmNotifications(axis) => {
                    server.set_notifications(axis, false);
                }
                PeripheralAction::StartAdvertising => {
                    if let Err(e) = server.start_advertising() {
                        error!("{}", e);
                    }
                }
                PeripheralAction::SetIndicator(colour) => {
                    hw.set_colour(colour);
                    hw.show();
                }
            }
        }

        if t.changed() {
            sink.emit(&AppEvent::PeripheralStateChanged {
                from: t.from,
                to: t.next,
            });
        }
        self.state = t.next;
    }
}
