//! Central role end to end: scan, connect, subscribe, aggregate, render,
//! link loss and display toggling against recording mocks.

use adxl_link::aggregator::ReadingAggregator;
use adxl_link::app::CentralService;
use adxl_link::app::events::AppEvent;
use adxl_link::app::ports::PeerAddress;
use adxl_link::config::{
    COLOUR_CENTRAL_CONNECTED, COLOUR_CENTRAL_DISCONNECTED, COLOUR_CENTRAL_FAILED,
    COLOUR_CENTRAL_SCANNING, CentralConfig, DEVICE_NAME, Rgb,
};
use adxl_link::error::LinkError;
use adxl_link::events::{CentralLinkEvent, LINK_EVENT_DEPTH, LinkEventQueue};
use adxl_link::fsm::central::CentralState;
use adxl_link::protocol::{Axis, CCCD_NOTIFY_ON, SERVICE_UUID};

use crate::mock_hw::{Call, FailAt, Journal, MockLink, MockUi, RecordingSink};

type Queue = LinkEventQueue<CentralLinkEvent, LINK_EVENT_DEPTH>;

const PEER: PeerAddress = PeerAddress([0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56]);
const OTHER: PeerAddress = PeerAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

struct Rig {
    journal: Journal,
    link: MockLink,
    ui: MockUi,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let journal = Journal::new();
        Self {
            link: MockLink::new(&journal)
                .advertise(OTHER, None)
                .advertise(OTHER, Some("ESP32_ADXL34"))
                .advertise(PEER, Some(DEVICE_NAME)),
            ui: MockUi::new(&journal),
            sink: RecordingSink::new(),
            journal,
        }
    }

    fn start<'a>(&mut self, agg: &'a ReadingAggregator, queue: &'a Queue) -> CentralService<'a> {
        let mut svc = CentralService::new(CentralConfig::default(), agg, queue);
        svc.start(&mut self.ui);
        svc
    }

    fn poll(&mut self, svc: &mut CentralService<'_>) {
        svc.poll(&mut self.link, &mut self.ui, false, &mut self.sink);
    }

    fn press(&mut self, svc: &mut CentralService<'_>) {
        svc.poll(&mut self.link, &mut self.ui, true, &mut self.sink);
    }

    /// Scan, match and subscribe.
    fn connect(&mut self, svc: &mut CentralService<'_>) {
        self.poll(svc);
        self.poll(svc);
        assert_eq!(svc.state(), CentralState::Connected);
    }

    fn value_draws(&self, text: &str) -> usize {
        self.journal.count(|c| *c == Call::Draw(text.to_string()))
    }
}

fn deliver(agg: &ReadingAggregator, x: &[u8], y: &[u8], z: &[u8]) {
    agg.on_notify(Axis::X, x);
    agg.on_notify(Axis::Y, y);
    agg.on_notify(Axis::Z, z);
}

#[test]
fn start_draws_splash_and_turns_indicator_off() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let svc = rig.start(&agg, &queue);

    assert_eq!(svc.state(), CentralState::Idle);
    assert!(svc.presenter().is_configured());
    assert_eq!(rig.journal.position(|c| *c == Call::DisplayBegin(0x3D)), Some(0));
    assert_eq!(rig.value_draws("BLE Client"), 1);
    assert_eq!(rig.journal.last_colour(), Some(Rgb::OFF));
}

#[test]
fn scan_stops_on_exact_name_and_moves_to_connecting() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);

    rig.poll(&mut svc);

    assert_eq!(svc.state(), CentralState::Connecting);
    assert_eq!(svc.peer(), Some(PEER));
    assert_eq!(rig.link.scans, 1);
    assert_eq!(rig.journal.count(|c| *c == Call::Scan(30_000)), 1);
    // Third advertisement matched: the scan ended long before its bound.
    let elapsed = rig
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::PeerFound {
                address,
                elapsed_ms,
            } if *address == PEER => Some(*elapsed_ms),
            _ => None,
        })
        .expect("peer found");
    assert_eq!(elapsed, 300);
    assert!(elapsed < CentralConfig::default().scan_duration_ms);
    // Scanning colour for the scan, off once it ends.
    let colours = rig.journal.colours();
    let scanning = colours
        .iter()
        .position(|c| *c == COLOUR_CENTRAL_SCANNING)
        .expect("scanning colour");
    assert_eq!(colours[scanning + 1], Rgb::OFF);
}

#[test]
fn scan_without_match_keeps_scanning_next_iteration() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    rig.link.adverts.truncate(2);
    let mut svc = rig.start(&agg, &queue);

    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Scanning);
    assert_eq!(svc.peer(), None);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::ScanExpired { elapsed_ms: 30_000 })
    );

    rig.poll(&mut svc);
    assert_eq!(rig.link.scans, 2);
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Connect(_))), 0);
}

#[test]
fn subscribe_resolves_everything_then_writes_all_cccds() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);
    rig.connect(&mut svc);

    let calls: Vec<Call> = rig
        .journal
        .calls()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                Call::Connect(_)
                    | Call::DiscoverService(_)
                    | Call::DiscoverChar(_)
                    | Call::RegisterNotify(_)
                    | Call::WriteCccd(..)
            )
        })
        .collect();
    assert_eq!(
        calls,
        [
            Call::Connect(PEER),
            Call::DiscoverService(SERVICE_UUID),
            Call::DiscoverChar(Axis::X),
            Call::DiscoverChar(Axis::Y),
            Call::DiscoverChar(Axis::Z),
            Call::RegisterNotify(Axis::X),
            Call::RegisterNotify(Axis::Y),
            Call::RegisterNotify(Axis::Z),
            Call::WriteCccd(Axis::X, CCCD_NOTIFY_ON),
            Call::WriteCccd(Axis::Y, CCCD_NOTIFY_ON),
            Call::WriteCccd(Axis::Z, CCCD_NOTIFY_ON),
        ]
    );
    assert_eq!(rig.journal.last_colour(), Some(COLOUR_CENTRAL_CONNECTED));
}

#[test]
fn cccd_writes_precede_any_render() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);

    rig.poll(&mut svc);
    // Arrives while still connecting; must not be drawn before subscribe.
    deliver(&agg, b" -3.1234", b"  0.5000", b"  9.8067");
    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Connected);

    let last_cccd = rig
        .journal
        .rposition(|c| matches!(c, Call::WriteCccd(..)))
        .expect("cccd written");
    let first_value = rig
        .journal
        .position(|c| *c == Call::Draw(" -3.1234".into()))
        .expect("rendered");
    assert!(last_cccd < first_value);
    assert_eq!(svc.renders(), 1);
}

#[test]
fn render_needs_all_three_axes_and_clears_fresh_flags() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);
    rig.connect(&mut svc);

    agg.on_notify(Axis::X, b"  1.0000");
    agg.on_notify(Axis::Y, b"  2.0000");
    rig.poll(&mut svc);
    assert_eq!(svc.renders(), 0);
    assert_eq!(agg.pending(), [true, true, false]);

    agg.on_notify(Axis::Z, b"  3.0000");
    rig.poll(&mut svc);
    assert_eq!(svc.renders(), 1);
    assert_eq!(agg.pending(), [false; 3]);
    assert_eq!(rig.value_draws("  3.0000"), 1);

    // Nothing new: no second render of the same set.
    rig.poll(&mut svc);
    assert_eq!(svc.renders(), 1);

    let rendered = rig
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Rendered { reading, on_display } => Some((*reading, *on_display)),
            _ => None,
        })
        .expect("render event");
    assert_eq!(rendered.0.x().as_str(), "  1.0000");
    assert_eq!(rendered.0.z().decode(), Some(3.0));
    assert!(rendered.1);
}

#[test]
fn short_payload_is_null_padded() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);
    rig.connect(&mut svc);

    deliver(&agg, b"1.5", b"-0.25", b"0");
    rig.poll(&mut svc);

    let reading = rig
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Rendered { reading, .. } => Some(*reading),
            _ => None,
        })
        .expect("render event");
    assert_eq!(reading.x().padded(), b"1.5\0\0\0\0\0");
    assert_eq!(reading.y().decode(), Some(-0.25));
}

#[test]
fn failed_characteristic_tears_down_flashes_and_rescans() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    rig.link.failures.push_back(FailAt::Characteristic(Axis::Y));
    let mut svc = rig.start(&agg, &queue);

    rig.poll(&mut svc);
    rig.journal.clear();
    rig.poll(&mut svc);

    assert!(rig.sink.events.contains(&AppEvent::ConnectFailed(
        LinkError::CharacteristicNotFound(Axis::Y.characteristic_uuid())
    )));
    assert_eq!(rig.journal.count(|c| *c == Call::DiscoverChar(Axis::Z)), 0);
    assert_eq!(rig.journal.count(|c| matches!(c, Call::WriteCccd(..))), 0);

    let teardown = rig
        .journal
        .position(|c| *c == Call::Disconnect)
        .expect("torn down");
    let flash = rig
        .journal
        .position(|c| *c == Call::Colour(COLOUR_CENTRAL_FAILED))
        .expect("flashed");
    assert!(teardown < flash);
    // The failure colour is left up; nothing waits on it.
    assert_eq!(rig.journal.last_colour(), Some(COLOUR_CENTRAL_FAILED));
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Scan(_))), 0);
    assert_eq!(svc.state(), CentralState::Disconnected);

    // Next iteration: not-connected colour, rescan, peer found again.
    rig.journal.clear();
    rig.poll(&mut svc);
    assert_eq!(rig.journal.colours().first(), Some(&COLOUR_CENTRAL_DISCONNECTED));
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Scan(_))), 1);
    assert_eq!(svc.state(), CentralState::Connecting);

    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Connected);
}

#[test]
fn late_link_loss_from_a_failed_attempt_spares_the_next_one() {
    static QUEUE: Queue = Queue::new();
    let agg = ReadingAggregator::new();
    let mut rig = Rig::new();
    rig.link.failures.push_back(FailAt::Register(Axis::Y));
    let mut svc = rig.start(&agg, &QUEUE);

    rig.poll(&mut svc);
    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Disconnected);

    // The dropped link is only reported while the rescan is running.
    rig.link.late_link_loss = Some(&QUEUE);
    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Connecting);
    assert!(QUEUE.is_empty());

    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Connected);
    assert_eq!(rig.journal.count(|c| *c == Call::Disconnect), 1);
}

#[test]
fn every_resolution_failure_tears_the_link_down() {
    for at in [
        FailAt::Connect,
        FailAt::Service,
        FailAt::Characteristic(Axis::X),
        FailAt::Register(Axis::Z),
        FailAt::Descriptor(Axis::Y),
    ] {
        let (agg, queue) = (ReadingAggregator::new(), Queue::new());
        let mut rig = Rig::new();
        rig.link.failures.push_back(at);
        let mut svc = rig.start(&agg, &queue);

        rig.poll(&mut svc);
        rig.journal.clear();
        rig.poll(&mut svc);

        assert_eq!(
            rig.journal.count(|c| *c == Call::Disconnect),
            1,
            "no teardown after {:?}",
            at
        );
        assert_ne!(svc.state(), CentralState::Connected, "{:?}", at);
    }
}

#[test]
fn link_loss_switches_indicator_and_rescans_in_one_iteration() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);
    rig.connect(&mut svc);
    agg.on_notify(Axis::X, b"  1.0000");
    rig.journal.clear();

    queue.push(CentralLinkEvent::Disconnected);
    rig.poll(&mut svc);

    let colours = rig.journal.colours();
    assert_eq!(colours.first(), Some(&COLOUR_CENTRAL_DISCONNECTED));
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Scan(_))), 1);
    assert_eq!(rig.link.scans, 2);
    assert!(rig.sink.events.contains(&AppEvent::CentralStateChanged {
        from: CentralState::Connected,
        to: CentralState::Disconnected,
    }));
    // Stale slot from the previous session is gone.
    assert_eq!(agg.pending(), [false; 3]);
}

#[test]
fn toggle_disables_display_rendering_only() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    let mut svc = rig.start(&agg, &queue);
    rig.connect(&mut svc);

    rig.press(&mut svc);
    assert!(!svc.presenter().is_enabled());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::DisplayToggled { enabled: false })
    );

    deliver(&agg, b"  4.0000", b"  5.0000", b"  6.0000");
    rig.poll(&mut svc);
    assert_eq!(svc.state(), CentralState::Connected);
    assert_eq!(svc.renders(), 1);
    assert_eq!(rig.value_draws("  4.0000"), 0);

    rig.press(&mut svc);
    deliver(&agg, b"  4.0000", b"  5.0000", b"  6.0000");
    rig.poll(&mut svc);
    assert_eq!(rig.value_draws("  4.0000"), 1);
}

#[test]
fn headless_central_still_renders_to_log_and_ignores_toggle() {
    let (agg, queue) = (ReadingAggregator::new(), Queue::new());
    let mut rig = Rig::new();
    rig.ui = MockUi::headless(&rig.journal);
    let mut svc = rig.start(&agg, &queue);
    assert!(!svc.presenter().is_configured());

    rig.connect(&mut svc);
    rig.press(&mut svc);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::DisplayToggled { .. })),
        0
    );

    deliver(&agg, b"  1.0000", b"  1.0000", b"  1.0000");
    rig.poll(&mut svc);
    assert_eq!(svc.renders(), 1);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::Rendered {
                on_display: false,
                ..
            }
        )),
        1
    );
    assert_eq!(rig.journal.count(|c| matches!(c, Call::Draw(_))), 0);
}
