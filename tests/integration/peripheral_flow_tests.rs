//! Peripheral role end to end: startup, sample cadence, notify gating,
//! link loss and storage degradation against recording mocks.

use adxl_link::adapters::gatt_server::GattServer;
use adxl_link::app::PeripheralService;
use adxl_link::app::events::AppEvent;
use adxl_link::app::ports::GattServerPort;
use adxl_link::config::{
    COLOUR_PERIPHERAL_CONNECTED, COLOUR_PERIPHERAL_IDLE, DEVICE_NAME, LOG_PATH,
    PeripheralConfig,
};
use adxl_link::error::InitError;
use adxl_link::events::{LINK_EVENT_DEPTH, LinkEventQueue, PeripheralLinkEvent};
use adxl_link::fsm::peripheral::PeripheralState;
use adxl_link::protocol::{Axis, BatteryState, CCCD_NOTIFY_ON, LOG_HEADER};
use adxl_link::telemetry_log::TelemetryLogger;

use crate::mock_hw::{Call, Journal, MockCard, MockSensors, MockServer, RecordingSink};

type Queue = LinkEventQueue<PeripheralLinkEvent, LINK_EVENT_DEPTH>;

struct Rig {
    journal: Journal,
    hw: MockSensors,
    server: MockServer,
    logger: TelemetryLogger<MockCard>,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let journal = Journal::new();
        Self {
            hw: MockSensors::new(&journal),
            server: MockServer::new(&journal),
            logger: TelemetryLogger::new(MockCard::new(&journal), LOG_PATH),
            sink: RecordingSink::new(),
            journal,
        }
    }

    fn without_card() -> Self {
        let mut rig = Self::new();
        rig.logger = TelemetryLogger::new(MockCard::missing(&rig.journal), LOG_PATH);
        rig
    }

    fn start<'a>(&mut self, queue: &'a Queue) -> PeripheralService<'a> {
        let mut svc = PeripheralService::new(PeripheralConfig::default(), queue);
        svc.start(&mut self.hw, &mut self.server, &mut self.logger, &mut self.sink)
            .expect("start");
        svc
    }

    fn tick(&mut self, svc: &mut PeripheralService<'_>, now_ms: u64) {
        svc.tick(
            now_ms,
            &mut self.hw,
            &mut self.server,
            &mut self.logger,
            &mut self.sink,
        );
    }

    fn notifies(&self) -> usize {
        self.journal.count(|c| matches!(c, Call::Notify(..)))
    }
}

#[test]
fn startup_advertises_with_idle_colour() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let svc = rig.start(&queue);

    assert_eq!(svc.state(), PeripheralState::Advertising);
    assert_eq!(rig.journal.count(|c| *c == Call::Advertise), 1);
    assert_eq!(rig.journal.last_colour(), Some(COLOUR_PERIPHERAL_IDLE));
    assert!(rig.logger.is_active());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::PeripheralStarted { logging: true })
    );
}

#[test]
fn missing_accelerometer_halts_before_advertising() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    rig.hw.begin_result = Err(InitError::AccelerometerNotFound);

    let mut svc = PeripheralService::new(PeripheralConfig::default(), &queue);
    let err = svc
        .start(&mut rig.hw, &mut rig.server, &mut rig.logger, &mut rig.sink)
        .unwrap_err();

    assert_eq!(err, InitError::AccelerometerNotFound);
    assert!(err.is_fatal());
    assert_eq!(svc.state(), PeripheralState::Idle);
    assert_eq!(rig.journal.count(|c| *c == Call::Advertise), 0);
}

#[test]
fn missing_fuel_gauge_is_fatal_when_configured() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    rig.hw.begin_result = Err(InitError::FuelGaugeNotFound);

    let mut svc = PeripheralService::new(PeripheralConfig::default(), &queue);
    let result = svc.start(&mut rig.hw, &mut rig.server, &mut rig.logger, &mut rig.sink);
    assert_eq!(result, Err(InitError::FuelGaugeNotFound));
}

#[test]
fn header_written_once_then_one_record_per_cycle() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);

    rig.tick(&mut svc, 0);
    rig.tick(&mut svc, 500);

    let text = rig.logger.storage().contents(LOG_PATH).expect("log file");
    let lines: Vec<&str> = text.split_inclusive("\r\n").collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], LOG_HEADER);
    assert_eq!(lines[1], "0,,,-3.1234,0.5000,9.8067\r\n");
    assert!(lines[2].starts_with("500,,,"));
    assert_eq!(rig.logger.appended(), 2);
}

#[test]
fn battery_fields_logged_when_gauge_fitted() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    rig.hw.battery = Some(BatteryState {
        voltage: 3.9,
        state_of_charge: 71.25,
    });
    let mut svc = rig.start(&queue);
    rig.tick(&mut svc, 1_000);

    let text = rig.logger.storage().contents(LOG_PATH).expect("log file");
    assert!(text.ends_with("1000,3.90,71.25,-3.1234,0.5000,9.8067\r\n"));
}

#[test]
fn cycles_follow_the_publish_interval() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);

    for now in [0, 100, 499, 500, 999, 1_000, 1_250, 1_500] {
        rig.tick(&mut svc, now);
    }
    // 0, 500, 1000, 1500
    assert_eq!(svc.cycles(), 4);
    assert_eq!(rig.hw.reads, 4);
}

#[test]
fn advertising_samples_and_logs_without_notifying() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);

    rig.tick(&mut svc, 0);
    rig.tick(&mut svc, 500);

    assert_eq!(rig.notifies(), 0);
    assert_eq!(rig.logger.appended(), 2);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::Published { notified: false, .. })),
        2
    );
}

#[test]
fn connect_disarms_all_axes_and_turns_indicator_connected() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);
    rig.server.subscribe(Axis::X, true);

    rig.server.connect(&queue);
    rig.tick(&mut svc, 0);

    assert_eq!(svc.state(), PeripheralState::Connected);
    assert_eq!(rig.server.notifications(), [false; 3]);
    assert_eq!(rig.journal.last_colour(), Some(COLOUR_PERIPHERAL_CONNECTED));
}

#[test]
fn subscriptions_written_before_the_connect_is_drained_are_kept() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);

    // The central subscribes while the loop is still busy elsewhere.
    rig.server.connect(&queue);
    for axis in Axis::ALL {
        rig.server.subscribe(axis, true);
    }
    rig.tick(&mut svc, 0);
    rig.tick(&mut svc, 500);

    assert_eq!(svc.state(), PeripheralState::Connected);
    assert_eq!(rig.server.notifications(), [true; 3]);
    assert_eq!(
        rig.journal.count(|c| matches!(c, Call::SetNotify(_, false))),
        0
    );
    assert_eq!(rig.notifies(), 6);
}

#[test]
fn host_server_delivers_to_a_central_that_subscribed_before_the_drain() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut server = GattServer::new(DEVICE_NAME);
    let mut svc = PeripheralService::new(PeripheralConfig::default(), &queue);
    svc.start(&mut rig.hw, &mut server, &mut rig.logger, &mut rig.sink)
        .expect("start");

    server.sim_connect(&queue);
    for axis in Axis::ALL {
        server.sim_write_cccd(axis, &CCCD_NOTIFY_ON);
    }
    for now in [0, 500] {
        svc.tick(now, &mut rig.hw, &mut server, &mut rig.logger, &mut rig.sink);
    }

    assert!(Axis::ALL.iter().all(|a| server.notifications_enabled(*a)));
    assert_eq!(server.sim_sent(), 6);
}

#[test]
fn connected_notifies_every_axis_each_cycle_regardless_of_cccd() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);
    rig.server.connect(&queue);

    rig.tick(&mut svc, 0);
    // Only Y subscribed; the transport gates delivery, not the service.
    rig.server.subscribe(Axis::Y, true);
    rig.tick(&mut svc, 500);
    rig.tick(&mut svc, 1_000);

    assert_eq!(rig.notifies(), 9);
    let calls = rig.journal.calls();
    let first: Vec<&Call> = calls
        .iter()
        .filter(|c| matches!(c, Call::Notify(..)))
        .take(3)
        .collect();
    assert_eq!(
        first,
        [
            &Call::Notify(Axis::X, " -3.1234".into()),
            &Call::Notify(Axis::Y, "  0.5000".into()),
            &Call::Notify(Axis::Z, "  9.8067".into()),
        ]
    );
}

#[test]
fn disconnect_disarms_before_advertising_restarts() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);
    rig.server.connect(&queue);
    rig.tick(&mut svc, 0);
    for axis in Axis::ALL {
        rig.server.subscribe(axis, true);
    }
    rig.journal.clear();

    queue.push(PeripheralLinkEvent::CentralDisconnected);
    rig.tick(&mut svc, 100);

    assert_eq!(svc.state(), PeripheralState::Advertising);
    assert_eq!(rig.server.notifications(), [false; 3]);
    let advertise = rig
        .journal
        .position(|c| *c == Call::Advertise)
        .expect("re-advertised");
    let last_disarm = rig
        .journal
        .rposition(|c| matches!(c, Call::SetNotify(_, false)))
        .expect("disarmed");
    assert!(last_disarm < advertise);
    assert_eq!(
        rig.journal.count(|c| matches!(c, Call::SetNotify(_, false))),
        3
    );
    assert_eq!(rig.journal.last_colour(), Some(COLOUR_PERIPHERAL_IDLE));
}

#[test]
fn notifies_stop_after_link_loss() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);
    rig.server.connect(&queue);
    rig.tick(&mut svc, 0);
    assert_eq!(rig.notifies(), 3);

    queue.push(PeripheralLinkEvent::CentralDisconnected);
    rig.tick(&mut svc, 500);
    rig.tick(&mut svc, 1_000);
    assert_eq!(rig.notifies(), 3);
    assert_eq!(svc.cycles(), 3);
}

#[test]
fn unmounted_storage_keeps_notifying_but_logs_nothing() {
    let queue = Queue::new();
    let mut rig = Rig::without_card();
    let mut svc = rig.start(&queue);

    assert!(!rig.logger.is_active());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::LoggingDisabled(InitError::StorageUnavailable))
    );

    rig.server.connect(&queue);
    for now in [0, 500, 1_000] {
        rig.tick(&mut svc, now);
    }

    assert_eq!(rig.notifies(), 9);
    assert_eq!(rig.logger.appended(), 0);
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Append(..))), 0);
}

#[test]
fn failed_sensor_read_skips_the_cycle() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    rig.hw.failing_reads = 1;
    let mut svc = rig.start(&queue);
    rig.server.connect(&queue);

    rig.tick(&mut svc, 0);
    assert_eq!(svc.cycles(), 0);
    assert_eq!(rig.notifies(), 0);

    rig.tick(&mut svc, 500);
    assert_eq!(svc.cycles(), 1);
    assert_eq!(rig.notifies(), 3);
}

#[test]
fn stray_disconnect_while_advertising_is_ignored() {
    let queue = Queue::new();
    let mut rig = Rig::new();
    let mut svc = rig.start(&queue);
    rig.journal.clear();

    queue.push(PeripheralLinkEvent::CentralDisconnected);
    rig.tick(&mut svc, 0);

    assert_eq!(svc.state(), PeripheralState::Advertising);
    assert_eq!(rig.journal.count(|c| *c == Call::Advertise), 0);
}
