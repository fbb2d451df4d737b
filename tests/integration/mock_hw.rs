//! Recording mocks for every port.
//!
//! All mocks of one test share a [`Journal`], so assertions can check the
//! relative order of calls made on different adapters (CCCD writes before
//! a render, disarm before re-advertise).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use adxl_link::app::events::AppEvent;
use adxl_link::app::ports::{
    Advertisement, DisplayPort, EventSink, GattClientPort, GattServerPort, IndicatorPort,
    OpenMode, PeerAddress, ScanControl, ScanSummary, SensorPort, SensorSample, StoragePort,
    TextSize,
};
use adxl_link::config::Rgb;
use adxl_link::error::{DisplayError, InitError, LinkError, SensorError, StorageError};
use adxl_link::events::{CentralLinkEvent, LINK_EVENT_DEPTH, LinkEventQueue, PeripheralLinkEvent};
use adxl_link::protocol::{Axis, BatteryState, Reading, WireValue};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Colour(Rgb),
    Show,
    DisplayBegin(u8),
    DisplayClear,
    Draw(String),
    Present,
    Advertise,
    SetNotify(Axis, bool),
    Notify(Axis, String),
    Scan(u32),
    Connect(PeerAddress),
    DiscoverService(u128),
    DiscoverChar(Axis),
    RegisterNotify(Axis),
    WriteCccd(Axis, [u8; 2]),
    Disconnect,
    Mount(i32),
    Append(String, String),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

#[allow(dead_code)]
impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Index of the first call matching `pred`.
    pub fn position(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }

    /// Index of the last call matching `pred`.
    pub fn rposition(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
        self.0.borrow().iter().rposition(pred)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Colours latched, in order.
    pub fn colours(&self) -> Vec<Rgb> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Colour(rgb) => Some(*rgb),
                _ => None,
            })
            .collect()
    }

    pub fn last_colour(&self) -> Option<Rgb> {
        self.colours().last().copied()
    }
}

// ── Peripheral hardware: sensors + indicator ──────────────────

pub struct MockSensors {
    journal: Journal,
    pub begin_result: Result<(), InitError>,
    pub reading: Reading,
    pub battery: Option<BatteryState>,
    /// Reads that fail before readings start flowing.
    pub failing_reads: u32,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            begin_result: Ok(()),
            reading: Reading::new(-3.1234, 0.5, 9.8067),
            battery: None,
            failing_reads: 0,
            reads: 0,
        }
    }
}

impl SensorPort for MockSensors {
    fn begin(&mut self) -> Result<(), InitError> {
        self.begin_result
    }

    fn read(&mut self) -> Result<SensorSample, SensorError> {
        if self.failing_reads > 0 {
            self.failing_reads -= 1;
            return Err(SensorError::Bus);
        }
        self.reads += 1;
        Ok(SensorSample {
            reading: self.reading,
            battery: self.battery,
        })
    }
}

impl IndicatorPort for MockSensors {
    fn set_colour(&mut self, colour: Rgb) {
        self.journal.push(Call::Colour(colour));
    }

    fn show(&mut self) {
        self.journal.push(Call::Show);
    }
}

// ── GATT server ───────────────────────────────────────────────

pub struct MockServer {
    journal: Journal,
    cccd: [bool; Axis::COUNT],
    pub advertise_result: Result<(), LinkError>,
}

#[allow(dead_code)]
impl MockServer {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            cccd: [false; Axis::COUNT],
            advertise_result: Ok(()),
        }
    }

    /// A central connects: the stack clears every axis, then queues the
    /// event for the main loop.
    pub fn connect(&mut self, events: &LinkEventQueue<PeripheralLinkEvent, LINK_EVENT_DEPTH>) {
        self.cccd = [false; Axis::COUNT];
        events.push(PeripheralLinkEvent::CentralConnected);
    }

    /// The central writes a CCCD.  Not journalled as a server call.
    pub fn subscribe(&mut self, axis: Axis, enabled: bool) {
        self.cccd[axis.index()] = enabled;
    }

    pub fn notifications(&self) -> [bool; Axis::COUNT] {
        self.cccd
    }
}

impl GattServerPort for MockServer {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        self.journal.push(Call::Advertise);
        self.advertise_result
    }

    fn set_notifications(&mut self, axis: Axis, enabled: bool) {
        self.journal.push(Call::SetNotify(axis, enabled));
        self.cccd[axis.index()] = enabled;
    }

    fn notifications_enabled(&self, axis: Axis) -> bool {
        self.cccd[axis.index()]
    }

    fn notify(&mut self, axis: Axis, value: &WireValue) -> Result<(), LinkError> {
        self.journal
            .push(Call::Notify(axis, value.as_str().to_string()));
        Ok(())
    }
}

// ── Storage card ──────────────────────────────────────────────

pub struct MockCard {
    journal: Journal,
    pub present: bool,
    mounted: bool,
    pub files: HashMap<String, String>,
}

#[allow(dead_code)]
impl MockCard {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            present: true,
            mounted: false,
            files: HashMap::new(),
        }
    }

    pub fn missing(journal: &Journal) -> Self {
        Self {
            present: false,
            ..Self::new(journal)
        }
    }

    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }
}

impl StoragePort for MockCard {
    type File = String;

    fn mount(&mut self, cs_gpio: i32) -> Result<(), StorageError> {
        self.journal.push(Call::Mount(cs_gpio));
        if !self.present {
            return Err(StorageError::MountFailed);
        }
        self.mounted = true;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.mounted && self.files.contains_key(path)
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<String, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        let entry = self.files.entry(path.to_string()).or_default();
        if mode == OpenMode::Write {
            entry.clear();
        }
        Ok(path.to_string())
    }

    fn append(&mut self, file: &mut String, data: &[u8]) -> Result<(), StorageError> {
        let text = String::from_utf8_lossy(data).into_owned();
        self.journal.push(Call::Append(file.clone(), text.clone()));
        self.files
            .get_mut(file.as_str())
            .ok_or(StorageError::WriteFailed)?
            .push_str(&text);
        Ok(())
    }

    fn close(&mut self, _file: String) {}
}

// ── Central UI: indicator + display ───────────────────────────

pub struct MockUi {
    journal: Journal,
    pub display_present: bool,
}

#[allow(dead_code)]
impl MockUi {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            display_present: true,
        }
    }

    pub fn headless(journal: &Journal) -> Self {
        Self {
            display_present: false,
            ..Self::new(journal)
        }
    }
}

impl IndicatorPort for MockUi {
    fn set_colour(&mut self, colour: Rgb) {
        self.journal.push(Call::Colour(colour));
    }

    fn show(&mut self) {
        self.journal.push(Call::Show);
    }
}

impl DisplayPort for MockUi {
    fn begin(&mut self, addr: u8) -> Result<(), DisplayError> {
        self.journal.push(Call::DisplayBegin(addr));
        if self.display_present {
            Ok(())
        } else {
            Err(DisplayError::NotFound(addr))
        }
    }

    fn clear(&mut self) {
        self.journal.push(Call::DisplayClear);
    }

    fn draw_text(&mut self, _x: i32, _y: i32, _size: TextSize, text: &str) {
        self.journal.push(Call::Draw(text.to_string()));
    }

    fn present(&mut self) -> Result<(), DisplayError> {
        self.journal.push(Call::Present);
        Ok(())
    }
}

// ── GATT client ───────────────────────────────────────────────

/// Resolution step at which [`MockLink`] reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum FailAt {
    Connect,
    Service,
    Characteristic(Axis),
    Register(Axis),
    Descriptor(Axis),
}

pub struct MockLink {
    journal: Journal,
    /// Advertisements seen by every scan, in order.
    pub adverts: Vec<(PeerAddress, Option<String>)>,
    /// Failures consumed one per connection attempt.
    pub failures: VecDeque<FailAt>,
    /// Milliseconds charged per advertisement delivered.
    pub ms_per_advert: u32,
    pub scans: u32,
    /// Queue that receives a late link-loss report during the next scan.
    pub late_link_loss: Option<&'static LinkEventQueue<CentralLinkEvent, LINK_EVENT_DEPTH>>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            adverts: Vec::new(),
            failures: VecDeque::new(),
            ms_per_advert: 100,
            scans: 0,
            late_link_loss: None,
        }
    }

    pub fn advertise(mut self, addr: PeerAddress, name: Option<&str>) -> Self {
        self.adverts.push((addr, name.map(str::to_string)));
        self
    }

    fn check(&mut self, step: FailAt, err: LinkError) -> Result<(), LinkError> {
        if self.failures.front() == Some(&step) {
            self.failures.pop_front();
            return Err(err);
        }
        Ok(())
    }
}

impl GattClientPort for MockLink {
    fn scan(
        &mut self,
        duration_ms: u32,
        on_result: &mut dyn FnMut(&Advertisement<'_>) -> ScanControl,
    ) -> ScanSummary {
        self.journal.push(Call::Scan(duration_ms));
        self.scans += 1;
        if let Some(events) = self.late_link_loss.take() {
            events.push(CentralLinkEvent::Disconnected);
        }
        let mut elapsed = 0u32;
        for (address, name) in &self.adverts {
            elapsed = elapsed.saturating_add(self.ms_per_advert);
            if elapsed > duration_ms {
                break;
            }
            let adv = Advertisement {
                address: *address,
                name: name.as_deref(),
                rssi: -60,
            };
            if on_result(&adv) == ScanControl::Stop {
                return ScanSummary {
                    elapsed_ms: elapsed,
                    stopped_early: true,
                };
            }
        }
        ScanSummary {
            elapsed_ms: duration_ms,
            stopped_early: false,
        }
    }

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), LinkError> {
        self.journal.push(Call::Connect(*peer));
        self.check(FailAt::Connect, LinkError::ConnectFailed)
    }

    fn discover_service(&mut self, uuid: u128) -> Result<(), LinkError> {
        self.journal.push(Call::DiscoverService(uuid));
        self.check(FailAt::Service, LinkError::ServiceNotFound)
    }

    fn discover_characteristic(&mut self, axis: Axis) -> Result<(), LinkError> {
        self.journal.push(Call::DiscoverChar(axis));
        self.check(
            FailAt::Characteristic(axis),
            LinkError::CharacteristicNotFound(axis.characteristic_uuid()),
        )
    }

    fn register_notify(&mut self, axis: Axis) -> Result<(), LinkError> {
        self.journal.push(Call::RegisterNotify(axis));
        self.check(FailAt::Register(axis), LinkError::SubscribeFailed)
    }

    fn write_descriptor(&mut self, axis: Axis, value: &[u8; 2]) -> Result<(), LinkError> {
        self.journal.push(Call::WriteCccd(axis, *value));
        self.check(FailAt::Descriptor(axis), LinkError::DescriptorWriteFailed)
    }

    fn disconnect(&mut self) {
        self.journal.push(Call::Disconnect);
    }
}

// ── Event sink ────────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
