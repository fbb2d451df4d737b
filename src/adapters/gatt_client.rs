//! BLE GATT client adapter (central role).
//!
//! Implements [`GattClientPort`] on top of Bluedroid GAP + GATTC.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid via raw `esp_idf_svc::sys`.
//! - **all other targets**: simulation with scripted peers.
//!
//! ## Threading
//!
//! Bluedroid reports everything from its own task.  The port methods are
//! blocking: each starts one stack operation, then polls a static
//! completion flag that the callback sets.  Scan results cross over a
//! bounded channel; notifications go straight into
//! [`AGGREGATOR`](crate::aggregator::AGGREGATOR); unsolicited link loss is
//! pushed to [`CENTRAL_LINK_EVENTS`](crate::events::CENTRAL_LINK_EVENTS).
//! An open that completes after `connect` has timed out is closed on
//! arrival and never reported.

use log::info;

use crate::app::ports::{Advertisement, GattClientPort, PeerAddress, ScanControl, ScanSummary};
use crate::error::{InitError, LinkError};
use crate::protocol::Axis;

#[cfg(target_os = "espidf")]
use log::{debug, error, warn};

#[cfg(target_os = "espidf")]
use super::ble_stack;

/// Upper bound on any single connect / discovery / write round trip.
pub const OP_TIMEOUT_MS: u32 = 5_000;

/// What to do with a GATTC open completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// `connect` is still waiting: the link is ours.
    Adopt,
    /// `connect` already gave up: close the link straight away.
    Abandon,
    Failed,
}

/// Classify an open completion.  `awaited` is whether `connect` was still
/// blocked on it when it arrived.
pub fn open_outcome(awaited: bool, ok: bool) -> OpenOutcome {
    match (ok, awaited) {
        (false, _) => OpenOutcome::Failed,
        (true, true) => OpenOutcome::Adopt,
        (true, false) => OpenOutcome::Abandon,
    }
}

/// One scan result as captured in the GAP callback.
#[derive(Debug, Clone)]
pub struct ScanHit {
    pub address: PeerAddress,
    /// Bluedroid `esp_ble_addr_type_t`.
    pub addr_type: u32,
    pub name: Option<heapless::String<29>>,
    pub rssi: i8,
}

impl ScanHit {
    pub fn advertisement(&self) -> Advertisement<'_> {
        Advertisement {
            address: self.address,
            name: self.name.as_deref(),
            rssi: self.rssi,
        }
    }
}

// ── ESP-IDF static state (callback bridge) ────────────────────

#[cfg(target_os = "espidf")]
mod bridge {
    use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32};

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::Channel;

    use super::ScanHit;

    pub static GATTC_IF: AtomicU32 = AtomicU32::new(0);
    pub static CONN_ID: AtomicU16 = AtomicU16::new(0);
    pub static CONNECTED: AtomicBool = AtomicBool::new(false);
    /// `connect` is blocked on an open request.
    pub static OPENING: AtomicBool = AtomicBool::new(false);
    /// Connection closed on arrival because its `connect` timed out.
    pub static ABANDONED_CONN: AtomicU32 = AtomicU32::new(u32::MAX);
    pub static SVC_START: AtomicU16 = AtomicU16::new(0);
    pub static SVC_END: AtomicU16 = AtomicU16::new(0);
    pub static SVC_FOUND: AtomicBool = AtomicBool::new(false);
    pub static CHAR_HANDLES: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];
    /// Axes whose notifications are routed to the aggregator.
    pub static ROUTED: [AtomicBool; 3] =
        [AtomicBool::new(false), AtomicBool::new(false), AtomicBool::new(false)];
    pub static SCAN_DONE: AtomicBool = AtomicBool::new(false);
    pub static SCAN_HITS: Channel<CriticalSectionRawMutex, ScanHit, 8> = Channel::new();

    /// Outcome of the operation in flight.
    pub static OP: AtomicU8 = AtomicU8::new(super::OP_IDLE);
}

#[cfg(target_os = "espidf")]
const OP_IDLE: u8 = 0;
#[cfg(target_os = "espidf")]
const OP_PENDING: u8 = 1;
#[cfg(target_os = "espidf")]
const OP_OK: u8 = 2;
#[cfg(target_os = "espidf")]
const OP_FAILED: u8 = 3;

#[cfg(target_os = "espidf")]
fn begin_op() {
    bridge::OP.store(OP_PENDING, core::sync::atomic::Ordering::Release);
}

#[cfg(target_os = "espidf")]
fn finish_op(ok: bool) {
    let _ = bridge::OP.compare_exchange(
        OP_PENDING,
        if ok { OP_OK } else { OP_FAILED },
        core::sync::atomic::Ordering::AcqRel,
        core::sync::atomic::Ordering::Acquire,
    );
}

/// Block until the callback completes the operation in flight.
#[cfg(target_os = "espidf")]
fn wait_op(timeout_ms: u32) -> bool {
    use core::sync::atomic::Ordering;
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(timeout_ms.into());
    loop {
        match bridge::OP.load(Ordering::Acquire) {
            OP_OK => return true,
            OP_FAILED => return false,
            _ if std::time::Instant::now() >= deadline => {
                bridge::OP.store(OP_IDLE, Ordering::Release);
                return false;
            }
            _ => std::thread::sleep(std::time::Duration::from_millis(10)),
        }
    }
}

#[cfg(target_os = "espidf")]
fn scan_params() -> esp_idf_svc::sys::esp_ble_scan_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_scan_params_t {
        scan_type: esp_ble_scan_type_t_BLE_SCAN_TYPE_ACTIVE,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        scan_filter_policy: esp_ble_scan_filter_t_BLE_SCAN_FILTER_ALLOW_ALL,
        scan_interval: 0x50,
        scan_window: 0x30,
        scan_duplicate: esp_ble_scan_duplicate_t_BLE_SCAN_DUPLICATE_DISABLE,
    }
}

/// Complete or shortened local name from a raw advertising payload.
#[cfg(target_os = "espidf")]
unsafe fn resolve_name(adv: *mut u8) -> Option<heapless::String<29>> {
    use esp_idf_svc::sys::*;
    let mut len: u8 = 0;
    // SAFETY: adv points at the stack's adv+scan-response buffer for this
    // result; the returned pointer aliases it with `len` valid bytes.
    let mut ptr = unsafe { esp_ble_resolve_adv_data(adv, ESP_BLE_AD_TYPE_NAME_CMPL as u8, &mut len) };
    if ptr.is_null() {
        ptr = unsafe { esp_ble_resolve_adv_data(adv, ESP_BLE_AD_TYPE_NAME_SHORT as u8, &mut len) };
    }
    if ptr.is_null() || len == 0 {
        return None;
    }
    let bytes = unsafe { core::slice::from_raw_parts(ptr, len as usize) };
    let text = core::str::from_utf8(bytes).ok()?;
    let mut name = heapless::String::new();
    name.push_str(text).ok()?;
    Some(name)
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use bridge::*;
    use core::sync::atomic::Ordering;
    use esp_idf_svc::sys::*;

    // SAFETY: each arm reads only the union member for its event.
    unsafe {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_PARAM_SET_COMPLETE_EVT => {
                debug!("BLE GAP: scan params set");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RESULT_EVT => {
                let r = &mut (*param).scan_rst;
                match r.search_evt {
                    esp_gap_search_evt_t_ESP_GAP_SEARCH_INQ_RES_EVT => {
                        let hit = ScanHit {
                            address: PeerAddress(r.bda),
                            addr_type: r.ble_addr_type,
                            name: resolve_name(r.ble_adv.as_mut_ptr()),
                            rssi: r.rssi as i8,
                        };
                        // Full channel: the main loop is behind, drop the result.
                        let _ = SCAN_HITS.try_send(hit);
                    }
                    esp_gap_search_evt_t_ESP_GAP_SEARCH_INQ_CMPL_EVT => {
                        SCAN_DONE.store(true, Ordering::Release);
                    }
                    _ => {}
                }
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_STOP_COMPLETE_EVT => {
                SCAN_DONE.store(true, Ordering::Release);
            }
            _ => {}
        }
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gattc_event_handler(
    event: esp_idf_svc::sys::esp_gattc_cb_event_t,
    gattc_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gattc_cb_param_t,
) {
    use bridge::*;
    use core::sync::atomic::Ordering;
    use esp_idf_svc::sys::*;

    use crate::aggregator::AGGREGATOR;
    use crate::events::{CENTRAL_LINK_EVENTS, CentralLinkEvent};

    // SAFETY: each arm reads only the union member for its event.
    unsafe {
        match event {
            esp_gattc_cb_event_t_ESP_GATTC_REG_EVT => {
                GATTC_IF.store(gattc_if as u32, Ordering::Release);
                info!("BLE GATTC: app registered (if={})", gattc_if);
                finish_op((*param).reg.status == esp_gatt_status_t_ESP_GATT_OK);
            }
            esp_gattc_cb_event_t_ESP_GATTC_OPEN_EVT => {
                let p = &(*param).open;
                let ok = p.status == esp_gatt_status_t_ESP_GATT_OK;
                let awaited = OPENING.swap(false, Ordering::AcqRel);
                match open_outcome(awaited, ok) {
                    OpenOutcome::Adopt => {
                        CONN_ID.store(p.conn_id, Ordering::Release);
                        CONNECTED.store(true, Ordering::Release);
                        CENTRAL_LINK_EVENTS.push(CentralLinkEvent::Connected);
                        finish_op(true);
                    }
                    OpenOutcome::Abandon => {
                        warn!("BLE GATTC: late open (conn_id={}), closing", p.conn_id);
                        ABANDONED_CONN.store(p.conn_id.into(), Ordering::Release);
                        esp_ble_gattc_close(gattc_if, p.conn_id);
                    }
                    OpenOutcome::Failed => {
                        warn!("BLE GATTC: open failed (status={})", p.status);
                        if awaited {
                            finish_op(false);
                        }
                    }
                }
            }
            esp_gattc_cb_event_t_ESP_GATTC_SEARCH_RES_EVT => {
                let p = &(*param).search_res;
                SVC_START.store(p.start_handle, Ordering::Release);
                SVC_END.store(p.end_handle, Ordering::Release);
                SVC_FOUND.store(true, Ordering::Release);
            }
            esp_gattc_cb_event_t_ESP_GATTC_SEARCH_CMPL_EVT => {
                let p = &(*param).search_cmpl;
                finish_op(p.status == esp_gatt_status_t_ESP_GATT_OK && SVC_FOUND.load(Ordering::Acquire));
            }
            esp_gattc_cb_event_t_ESP_GATTC_REG_FOR_NOTIFY_EVT => {
                finish_op((*param).reg_for_notify.status == esp_gatt_status_t_ESP_GATT_OK);
            }
            esp_gattc_cb_event_t_ESP_GATTC_WRITE_DESCR_EVT => {
                finish_op((*param).write.status == esp_gatt_status_t_ESP_GATT_OK);
            }
            esp_gattc_cb_event_t_ESP_GATTC_NOTIFY_EVT => {
                let p = &(*param).notify;
                let payload = core::slice::from_raw_parts(p.value, p.value_len as usize);
                for axis in Axis::ALL {
                    if ROUTED[axis.index()].load(Ordering::Acquire)
                        && CHAR_HANDLES[axis.index()].load(Ordering::Acquire) == p.handle
                    {
                        AGGREGATOR.on_notify(axis, payload);
                    }
                }
            }
            esp_gattc_cb_event_t_ESP_GATTC_DISCONNECT_EVT => {
                let conn_id = u32::from((*param).disconnect.conn_id);
                if ABANDONED_CONN
                    .compare_exchange(conn_id, u32::MAX, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    debug!("BLE GATTC: late link closed");
                    return;
                }
                for routed in &ROUTED {
                    routed.store(false, Ordering::Release);
                }
                // Only an unsolicited drop is news to the main loop.
                if CONNECTED.swap(false, Ordering::AcqRel) {
                    info!("BLE GATTC: link lost");
                    CENTRAL_LINK_EVENTS.push(CentralLinkEvent::Disconnected);
                }
                finish_op(false);
            }
            _ => {}
        }
    }
}

pub struct GattClient {
    /// Address type of the last matched scan result.
    peer_addr_type: u32,
    peer: Option<PeerAddress>,
    /// Simulation: peers that answer a scan, in order.
    #[cfg(not(target_os = "espidf"))]
    sim_peers: heapless::Vec<ScanHit, 4>,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_routed: [bool; Axis::COUNT],
    #[cfg(not(target_os = "espidf"))]
    sim_cccd: [[u8; 2]; Axis::COUNT],
}

impl GattClient {
    pub fn new() -> Self {
        Self {
            peer_addr_type: 0,
            peer: None,
            #[cfg(not(target_os = "espidf"))]
            sim_peers: heapless::Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_connected: false,
            #[cfg(not(target_os = "espidf"))]
            sim_routed: [false; Axis::COUNT],
            #[cfg(not(target_os = "espidf"))]
            sim_cccd: [[0; 2]; Axis::COUNT],
        }
    }

    /// Address of the open (or last attempted) link.
    pub fn peer(&self) -> Option<PeerAddress> {
        self.peer
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    pub fn init(&mut self) -> Result<(), InitError> {
        use esp_idf_svc::sys::*;

        ble_stack::init_bluedroid()?;
        // SAFETY: Bluedroid is enabled; callbacks are 'static fns.
        unsafe {
            esp_ble_gap_register_callback(Some(gap_event_handler));
            esp_ble_gattc_register_callback(Some(gattc_event_handler));
            begin_op();
            if esp_ble_gattc_app_register(0) != ESP_OK as i32 || !wait_op(OP_TIMEOUT_MS) {
                error!("BLE: gattc_app_register failed");
                return Err(InitError::TransportInitFailed);
            }
            let mut params = scan_params();
            if esp_ble_gap_set_scan_params(&mut params) != ESP_OK as i32 {
                error!("BLE: set_scan_params failed");
                return Err(InitError::TransportInitFailed);
            }
        }
        info!("BLE: GATT client registered");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init(&mut self) -> Result<(), InitError> {
        super::ble_stack::init_bluedroid()?;
        info!("BLE(sim): GATT client ready");
        Ok(())
    }

    /// Simulation: make a peer visible to the next scans.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_add_peer(&mut self, address: PeerAddress, name: &str) {
        let mut n = heapless::String::new();
        let _ = n.push_str(name);
        let _ = self.sim_peers.push(ScanHit {
            address,
            addr_type: 0,
            name: Some(n),
            rssi: -60,
        });
    }

    /// Simulation: the peripheral sends one notification.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_deliver(&self, axis: Axis, payload: &[u8]) {
        if self.sim_connected && self.sim_routed[axis.index()] {
            crate::aggregator::AGGREGATOR.on_notify(axis, payload);
        }
    }

    /// Simulation: last CCCD value written for `axis`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_cccd(&self, axis: Axis) -> [u8; 2] {
        self.sim_cccd[axis.index()]
    }

    /// Simulation: the peripheral goes away.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop_link(&mut self) {
        if self.sim_connected {
            self.sim_connected = false;
            self.sim_routed = [false; Axis::COUNT];
            crate::events::CENTRAL_LINK_EVENTS.push(crate::events::CentralLinkEvent::Disconnected);
        }
    }
}

impl Default for GattClient {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// GattClientPort implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl GattClientPort for GattClient {
    fn scan(
        &mut self,
        duration_ms: u32,
        on_result: &mut dyn FnMut(&Advertisement<'_>) -> ScanControl,
    ) -> ScanSummary {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        SCAN_HITS.clear();
        SCAN_DONE.store(false, Ordering::Release);
        let started = std::time::Instant::now();
        // SAFETY: scan params were set in init().
        let ret = unsafe { esp_ble_gap_start_scanning(duration_ms.div_ceil(1000)) };
        if ret != ESP_OK as i32 {
            warn!("BLE GAP: start_scanning failed ({})", ret);
            return ScanSummary::default();
        }

        let mut stopped_early = false;
        loop {
            while let Ok(hit) = SCAN_HITS.try_receive() {
                if on_result(&hit.advertisement()) == ScanControl::Stop {
                    self.peer_addr_type = hit.addr_type;
                    stopped_early = true;
                    break;
                }
            }
            let elapsed = started.elapsed().as_millis() as u32;
            if stopped_early || elapsed >= duration_ms || SCAN_DONE.load(Ordering::Acquire) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        if !SCAN_DONE.load(Ordering::Acquire) {
            // SAFETY: stopping an active scan has no preconditions.
            unsafe { esp_ble_gap_stop_scanning() };
        }
        ScanSummary {
            elapsed_ms: started.elapsed().as_millis() as u32,
            stopped_early,
        }
    }

    fn connect(&mut self, peer: &PeerAddress) -> Result<(), LinkError> {
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        self.peer = Some(*peer);
        let mut bda = peer.0;
        begin_op();
        bridge::OPENING.store(true, Ordering::Release);
        // SAFETY: bda outlives the call; Bluedroid copies it.
        let ret = unsafe {
            esp_ble_gattc_open(
                bridge::GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t,
                bda.as_mut_ptr(),
                self.peer_addr_type,
                true,
            )
        };
        if ret != ESP_OK as i32 || !wait_op(OP_TIMEOUT_MS) {
            // An open that completes from here on is closed on arrival.
            bridge::OPENING.store(false, Ordering::Release);
            return Err(LinkError::ConnectFailed);
        }
        Ok(())
    }

    fn discover_service(&mut self, uuid: u128) -> Result<(), LinkError> {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        SVC_FOUND.store(false, Ordering::Release);
        let mut filter = ble_stack::uuid128_to_esp(uuid);
        begin_op();
        // SAFETY: filter outlives the call.
        let ret = unsafe {
            esp_ble_gattc_search_service(
                GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t,
                CONN_ID.load(Ordering::Acquire),
                &mut filter,
            )
        };
        if ret != ESP_OK as i32 || !wait_op(OP_TIMEOUT_MS) {
            return Err(LinkError::ServiceNotFound);
        }
        Ok(())
    }

    fn discover_characteristic(&mut self, axis: Axis) -> Result<(), LinkError> {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        let uuid = axis.characteristic_uuid();
        // SAFETY: all-zero is a valid esp_gattc_char_elem_t.
        let mut elem: esp_gattc_char_elem_t = unsafe { core::mem::zeroed() };
        let mut count: u16 = 1;
        // SAFETY: reads the local attribute cache; out-params live here.
        let status = unsafe {
            esp_ble_gattc_get_char_by_uuid(
                GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t,
                CONN_ID.load(Ordering::Acquire),
                SVC_START.load(Ordering::Acquire),
                SVC_END.load(Ordering::Acquire),
                ble_stack::uuid128_to_esp(uuid),
                &mut elem,
                &mut count,
            )
        };
        if status != esp_gatt_status_t_ESP_GATT_OK || count == 0 {
            return Err(LinkError::CharacteristicNotFound(uuid));
        }
        CHAR_HANDLES[axis.index()].store(elem.char_handle, Ordering::Release);
        debug!("BLE GATTC: {} char (handle={})", axis.label(), elem.char_handle);
        Ok(())
    }

    fn register_notify(&mut self, axis: Axis) -> Result<(), LinkError> {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        let Some(peer) = self.peer else {
            return Err(LinkError::SubscribeFailed);
        };
        let mut bda = peer.0;
        ROUTED[axis.index()].store(true, Ordering::Release);
        begin_op();
        // SAFETY: bda outlives the call.
        let ret = unsafe {
            esp_ble_gattc_register_for_notify(
                GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t,
                bda.as_mut_ptr(),
                CHAR_HANDLES[axis.index()].load(Ordering::Acquire),
            )
        };
        if ret != ESP_OK as i32 || !wait_op(OP_TIMEOUT_MS) {
            ROUTED[axis.index()].store(false, Ordering::Release);
            return Err(LinkError::SubscribeFailed);
        }
        Ok(())
    }

    fn write_descriptor(&mut self, axis: Axis, value: &[u8; 2]) -> Result<(), LinkError> {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        let gattc_if = GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t;
        let conn_id = CONN_ID.load(Ordering::Acquire);
        // SAFETY: all-zero is a valid esp_gattc_descr_elem_t.
        let mut elem: esp_gattc_descr_elem_t = unsafe { core::mem::zeroed() };
        let mut count: u16 = 1;
        // SAFETY: reads the local attribute cache; out-params live here.
        let status = unsafe {
            esp_ble_gattc_get_descr_by_char_handle(
                gattc_if,
                conn_id,
                CHAR_HANDLES[axis.index()].load(Ordering::Acquire),
                ble_stack::uuid16_to_esp(crate::protocol::CCCD_UUID16),
                &mut elem,
                &mut count,
            )
        };
        if status != esp_gatt_status_t_ESP_GATT_OK || count == 0 {
            return Err(LinkError::DescriptorWriteFailed);
        }

        let mut payload = *value;
        begin_op();
        // SAFETY: payload outlives the call; Bluedroid copies it.
        let ret = unsafe {
            esp_ble_gattc_write_char_descr(
                gattc_if,
                conn_id,
                elem.handle,
                payload.len() as u16,
                payload.as_mut_ptr(),
                esp_gatt_write_type_t_ESP_GATT_WRITE_TYPE_RSP,
                esp_gatt_auth_req_t_ESP_GATT_AUTH_REQ_NONE,
            )
        };
        if ret != ESP_OK as i32 || !wait_op(OP_TIMEOUT_MS) {
            return Err(LinkError::DescriptorWriteFailed);
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        for routed in &ROUTED {
            routed.store(false, Ordering::Release);
        }
        // Clear first so the resulting DISCONNECT_EVT is not reported as a loss.
        if CONNECTED.swap(false, Ordering::AcqRel) {
            // SAFETY: closing a known connection id has no other preconditions.
            unsafe {
                esp_ble_gattc_close(
                    GATTC_IF.load(Ordering::Acquire) as esp_gatt_if_t,
                    CONN_ID.load(Ordering::Acquire),
                );
            }
            info!("BLE GATTC: link closed");
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl GattClientPort for GattClient {
    fn scan(
        &mut self,
        duration_ms: u32,
        on_result: &mut dyn FnMut(&Advertisement<'_>) -> ScanControl,
    ) -> ScanSummary {
        for hit in &self.sim_peers {
            if on_result(&hit.advertisement()) == ScanControl::Stop {
                self.peer_addr_type = hit.addr_type;
                return ScanSummary {
                    elapsed_ms: 0,
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
        self.peer = Some(*peer);
        if !self.sim_peers.iter().any(|p| p.address == *peer) {
            return Err(LinkError::ConnectFailed);
        }
        self.sim_connected = true;
        crate::events::CENTRAL_LINK_EVENTS.push(crate::events::CentralLinkEvent::Connected);
        info!("BLE(sim): connected to {}", peer);
        Ok(())
    }

    fn discover_service(&mut self, uuid: u128) -> Result<(), LinkError> {
        if !self.sim_connected || uuid != crate::protocol::SERVICE_UUID {
            return Err(LinkError::ServiceNotFound);
        }
        Ok(())
    }

    fn discover_characteristic(&mut self, axis: Axis) -> Result<(), LinkError> {
        if !self.sim_connected {
            return Err(LinkError::CharacteristicNotFound(axis.characteristic_uuid()));
        }
        Ok(())
    }

    fn register_notify(&mut self, axis: Axis) -> Result<(), LinkError> {
        if !self.sim_connected {
            return Err(LinkError::SubscribeFailed);
        }
        self.sim_routed[axis.index()] = true;
        Ok(())
    }

    fn write_descriptor(&mut self, axis: Axis, value: &[u8; 2]) -> Result<(), LinkError> {
        if !self.sim_connected {
            return Err(LinkError::DescriptorWriteFailed);
        }
        self.sim_cccd[axis.index()] = *value;
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.sim_connected {
            info!("BLE(sim): link closed");
        }
        self.sim_connected = false;
        self.sim_routed = [false; Axis::COUNT];
    }
}
