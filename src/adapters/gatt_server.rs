//! BLE GATT server adapter (peripheral role).
//!
//! Implements [`GattServerPort`] on top of Bluedroid.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATTS/GAP via raw `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs that log.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                   | Props        | Descriptors            |
//! |----------------|------------------------|--------------|------------------------|
//! | X              | `ba9f3faa-…-7ccd1e66be33` | Notify       | CCCD, "ADXL X Value" |
//! | Y              | `0e1f1e2e-…-7ff84eb93026` | Notify       | CCCD, "ADXL Y Value" |
//! | Z              | `1930a6a0-…-9d8c230c2358` | Notify       | CCCD, "ADXL Z Value" |
//!
//! The name goes in the advertising packet and the 128-bit service UUID in
//! the scan response, since both do not fit one legacy packet.
//!
//! Connect and disconnect are forwarded to
//! [`PERIPHERAL_LINK_EVENTS`](crate::events::PERIPHERAL_LINK_EVENTS); the
//! callback never restarts advertising itself.  A connect clears every
//! axis's notification flag before the event is queued, so the new
//! central's CCCD writes always land on a clean slate.

use log::{debug, info};

use crate::app::ports::GattServerPort;
use crate::error::{InitError, LinkError};
use crate::protocol::{Axis, WireValue};

#[cfg(not(target_os = "espidf"))]
use crate::events::{LinkEventQueue, PeripheralLinkEvent};

#[cfg(target_os = "espidf")]
use log::{error, warn};

#[cfg(target_os = "espidf")]
use super::ble_stack;

// ── ESP-IDF static state (callback bridge) ────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
mod bridge {
    use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, AtomicU32};

    pub static GATTS_IF: AtomicU32 = AtomicU32::new(0);
    pub static CONN_ID: AtomicU16 = AtomicU16::new(0);
    pub static CONNECTED: AtomicBool = AtomicBool::new(false);
    pub static SVC_HANDLE: AtomicU16 = AtomicU16::new(0);
    /// Axis whose characteristic and descriptors are being added.
    pub static BUILD_AXIS: AtomicU8 = AtomicU8::new(0);
    pub static CHAR_HANDLES: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];
    pub static CCCD_HANDLES: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];
    pub static NOTIFY_ENABLED: [AtomicBool; 3] =
        [AtomicBool::new(false), AtomicBool::new(false), AtomicBool::new(false)];
    pub static SERVICE_READY: AtomicBool = AtomicBool::new(false);
    /// Adv data and scan response both configured.
    pub static ADV_CONFIGURED: AtomicU8 = AtomicU8::new(0);
    pub static ADV_REQUESTED: AtomicBool = AtomicBool::new(false);
}

#[cfg(target_os = "espidf")]
const ADV_DATA_DONE: u8 = 0b01;
#[cfg(target_os = "espidf")]
const SCAN_RSP_DONE: u8 = 0b10;

#[cfg(target_os = "espidf")]
static SERVICE_UUID_LE: [u8; 16] = crate::protocol::SERVICE_UUID.to_le_bytes();

#[cfg(target_os = "espidf")]
static AUTO_RSP: esp_idf_svc::sys::esp_attr_control_t = esp_idf_svc::sys::esp_attr_control_t {
    auto_rsp: esp_idf_svc::sys::ESP_GATT_AUTO_RSP as u8,
};

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        // SAFETY: remaining fields are plain integers / arrays.
        ..unsafe { core::mem::zeroed() }
    }
}

/// Start advertising once both the service and the advertising payloads
/// are in place and the main loop has asked for it.
#[cfg(target_os = "espidf")]
fn try_start_advertising() {
    use bridge::*;
    use core::sync::atomic::Ordering;

    let configured = ADV_CONFIGURED.load(Ordering::Acquire) == ADV_DATA_DONE | SCAN_RSP_DONE;
    if configured && SERVICE_READY.load(Ordering::Acquire) && ADV_REQUESTED.swap(false, Ordering::AcqRel) {
        let mut params = adv_params();
        // SAFETY: params outlives the call; Bluedroid copies it.
        let ret = unsafe { esp_idf_svc::sys::esp_ble_gap_start_advertising(&mut params) };
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            error!("BLE GAP: start_advertising failed ({})", ret);
        }
    }
}

/// Add one axis characteristic; the descriptors follow from ADD_CHAR_EVT.
#[cfg(target_os = "espidf")]
unsafe fn add_axis_char(svc_handle: u16, axis: Axis) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = ble_stack::uuid128_to_esp(axis.characteristic_uuid());
    // SAFETY: char_uuid lives across the call; Bluedroid copies it.
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            0,
            crate::protocol::AXIS_CHAR_PROPERTIES as esp_gatt_char_prop_t,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
        );
    }
}

#[cfg(target_os = "espidf")]
unsafe fn add_descriptor(svc_handle: u16, uuid16: u16, perm: u32, value: &'static [u8]) {
    use esp_idf_svc::sys::*;
    let mut uuid = ble_stack::uuid16_to_esp(uuid16);
    let mut attr = esp_attr_value_t {
        attr_max_len: value.len().max(2) as u16,
        attr_len: value.len() as u16,
        attr_value: value.as_ptr() as *mut u8,
    };
    // SAFETY: the stack copies the initial value; `value` is 'static anyway.
    unsafe {
        esp_ble_gatts_add_char_descr(
            svc_handle,
            &mut uuid,
            perm as esp_gatt_perm_t,
            &mut attr,
            &AUTO_RSP as *const _ as *mut _,
        );
    }
}

#[cfg(target_os = "espidf")]
fn axis_at(i: u8) -> Option<Axis> {
    Axis::ALL.get(i as usize).copied()
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    _param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use bridge::*;
    use core::sync::atomic::Ordering;
    use esp_idf_svc::sys::*;

    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            ADV_CONFIGURED.fetch_or(ADV_DATA_DONE, Ordering::AcqRel);
            try_start_advertising();
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_SET_COMPLETE_EVT => {
            ADV_CONFIGURED.fetch_or(SCAN_RSP_DONE, Ordering::AcqRel);
            try_start_advertising();
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            info!("BLE GAP: advertising started");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use bridge::*;
    use core::sync::atomic::Ordering;
    use esp_idf_svc::sys::*;

    use crate::events::{PERIPHERAL_LINK_EVENTS, PeripheralLinkEvent};
    use crate::protocol::{CCCD_UUID16, SERVICE_UUID, USER_DESCRIPTION_UUID16};

    GATTS_IF.store(gatts_if as u32, Ordering::Relaxed);

    // SAFETY: Bluedroid passes a valid param union for the event it names;
    // each arm reads only the matching member.
    unsafe {
        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                info!("BLE GATTS: app registered (if={})", gatts_if);
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: ble_stack::uuid128_to_esp(SERVICE_UUID),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                // 1 service + 3 × (decl + value + CCCD + description)
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, 13);
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let svc_handle = (*param).create.service_handle;
                SVC_HANDLE.store(svc_handle, Ordering::Relaxed);
                info!("BLE GATTS: service created (handle={})", svc_handle);
                esp_ble_gatts_start_service(svc_handle);
                BUILD_AXIS.store(0, Ordering::Relaxed);
                add_axis_char(svc_handle, Axis::X);
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let p = &(*param).add_char;
                let i = BUILD_AXIS.load(Ordering::Relaxed);
                if let Some(axis) = axis_at(i) {
                    CHAR_HANDLES[axis.index()].store(p.attr_handle, Ordering::Relaxed);
                    debug!("BLE GATTS: {} char (handle={})", axis.label(), p.attr_handle);
                    add_descriptor(
                        p.service_handle,
                        CCCD_UUID16,
                        ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE,
                        &crate::protocol::CCCD_NOTIFY_OFF,
                    );
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
                let p = &(*param).add_char_descr;
                let i = BUILD_AXIS.load(Ordering::Relaxed);
                let Some(axis) = axis_at(i) else { return };
                if p.descr_uuid.len == 2 && p.descr_uuid.uuid.uuid16 == CCCD_UUID16 {
                    CCCD_HANDLES[axis.index()].store(p.attr_handle, Ordering::Relaxed);
                    add_descriptor(
                        p.service_handle,
                        USER_DESCRIPTION_UUID16,
                        ESP_GATT_PERM_READ,
                        axis.description().as_bytes(),
                    );
                } else {
                    BUILD_AXIS.store(i + 1, Ordering::Relaxed);
                    match axis_at(i + 1) {
                        Some(next) => add_axis_char(p.service_handle, next),
                        None => {
                            SERVICE_READY.store(true, Ordering::Release);
                            info!("BLE GATTS: X, Y, Z registered");
                            try_start_advertising();
                        }
                    }
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let p = &(*param).connect;
                for enabled in &NOTIFY_ENABLED {
                    enabled.store(false, Ordering::Release);
                }
                CONN_ID.store(p.conn_id, Ordering::Relaxed);
                CONNECTED.store(true, Ordering::Release);
                info!("BLE GATTS: central connected (conn_id={})", p.conn_id);
                PERIPHERAL_LINK_EVENTS.push(PeripheralLinkEvent::CentralConnected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                CONNECTED.store(false, Ordering::Release);
                info!("BLE GATTS: central disconnected");
                PERIPHERAL_LINK_EVENTS.push(PeripheralLinkEvent::CentralDisconnected);
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let p = &(*param).write;
                let data = core::slice::from_raw_parts(p.value, p.len as usize);
                for axis in Axis::ALL {
                    if p.handle == CCCD_HANDLES[axis.index()].load(Ordering::Relaxed) {
                        let enabled = data.first().is_some_and(|b| b & 0x01 != 0);
                        NOTIFY_ENABLED[axis.index()].store(enabled, Ordering::Release);
                        debug!("BLE GATTS: {} notify {}", axis.label(), enabled);
                    }
                }
            }
            _ => {}
        }
    }
}

pub struct GattServer {
    device_name: heapless::String<29>,
    /// Simulation: per-axis CCCD state.
    #[cfg(not(target_os = "espidf"))]
    sim_notify: [bool; Axis::COUNT],
    /// Simulation: notifications that passed the CCCD gate.
    #[cfg(not(target_os = "espidf"))]
    sim_sent: u64,
}

impl GattServer {
    pub fn new(device_name: &str) -> Self {
        let mut name = heapless::String::new();
        for c in device_name.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self {
            device_name: name,
            #[cfg(not(target_os = "espidf"))]
            sim_notify: [false; Axis::COUNT],
            #[cfg(not(target_os = "espidf"))]
            sim_sent: 0,
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Bring up Bluedroid, register the service and stage the
    /// advertising payloads.  Advertising itself starts on request.
    #[cfg(target_os = "espidf")]
    pub fn init(&mut self) -> Result<(), InitError> {
        use esp_idf_svc::sys::*;

        ble_stack::init_bluedroid()?;
        let name = ble_stack::c_name(&self.device_name);

        // SAFETY: Bluedroid is enabled; the callbacks are 'static fns and
        // every pointer passed below outlives its call.
        unsafe {
            esp_ble_gap_register_callback(Some(gap_event_handler));
            esp_ble_gatts_register_callback(Some(gatts_event_handler));
            let ret = esp_ble_gatts_app_register(0);
            if ret != ESP_OK as i32 {
                error!("BLE: gatts_app_register failed ({})", ret);
                return Err(InitError::TransportInitFailed);
            }

            esp_ble_gap_set_device_name(name.as_ptr().cast());

            let mut adv = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                min_interval: 0x0006,
                max_interval: 0x0010,
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                ..core::mem::zeroed()
            };
            let mut rsp = esp_ble_adv_data_t {
                set_scan_rsp: true,
                include_name: false,
                service_uuid_len: SERVICE_UUID_LE.len() as u16,
                p_service_uuid: SERVICE_UUID_LE.as_ptr() as *mut u8,
                ..core::mem::zeroed()
            };
            if esp_ble_gap_config_adv_data(&mut adv) != ESP_OK as i32
                || esp_ble_gap_config_adv_data(&mut rsp) != ESP_OK as i32
            {
                error!("BLE: advertising payload rejected");
                return Err(InitError::TransportInitFailed);
            }
        }
        info!("BLE: GATT server registered as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn init(&mut self) -> Result<(), InitError> {
        super::ble_stack::init_bluedroid()?;
        info!(
            "BLE(sim): GATT server '{}' (service {:032x})",
            self.device_name,
            crate::protocol::SERVICE_UUID
        );
        Ok(())
    }

    /// Simulation: a central connects.  Mirrors the stack callback: clear
    /// every axis, then queue the event.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect<const N: usize>(&mut self, events: &LinkEventQueue<PeripheralLinkEvent, N>) {
        self.sim_notify = [false; Axis::COUNT];
        events.push(PeripheralLinkEvent::CentralConnected);
    }

    /// Simulation: a central writes an axis CCCD.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_write_cccd(&mut self, axis: Axis, value: &[u8; 2]) {
        self.sim_notify[axis.index()] = value[0] & 0x01 != 0;
    }

    /// Simulation: notifications that reached a subscribed central.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_sent(&self) -> u64 {
        self.sim_sent
    }
}

// ───────────────────────────────────────────────────────────────
// GattServerPort implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl GattServerPort for GattServer {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        use core::sync::atomic::Ordering;
        bridge::ADV_REQUESTED.store(true, Ordering::Release);
        try_start_advertising();
        Ok(())
    }

    fn set_notifications(&mut self, axis: Axis, enabled: bool) {
        use core::sync::atomic::Ordering;
        bridge::NOTIFY_ENABLED[axis.index()].store(enabled, Ordering::Release);
    }

    fn notifications_enabled(&self, axis: Axis) -> bool {
        use core::sync::atomic::Ordering;
        bridge::NOTIFY_ENABLED[axis.index()].load(Ordering::Acquire)
    }

    fn notify(&mut self, axis: Axis, value: &WireValue) -> Result<(), LinkError> {
        use bridge::*;
        use core::sync::atomic::Ordering;
        use esp_idf_svc::sys::*;

        // Gate on the subscriber's CCCD and on a live link.
        if !CONNECTED.load(Ordering::Acquire) || !self.notifications_enabled(axis) {
            return Ok(());
        }
        let handle = CHAR_HANDLES[axis.index()].load(Ordering::Relaxed);
        let bytes = value.as_bytes();
        // SAFETY: bytes outlives the call; Bluedroid copies the payload.
        let ret = unsafe {
            esp_ble_gatts_send_indicate(
                GATTS_IF.load(Ordering::Relaxed) as esp_gatt_if_t,
                CONN_ID.load(Ordering::Relaxed),
                handle,
                bytes.len() as u16,
                bytes.as_ptr() as *mut u8,
                false,
            )
        };
        if ret != ESP_OK as i32 {
            warn!("BLE GATTS: notify {} failed ({})", axis.label(), ret);
            return Err(LinkError::NotifyFailed);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl GattServerPort for GattServer {
    fn start_advertising(&mut self) -> Result<(), LinkError> {
        info!("BLE(sim): advertising '{}'", self.device_name);
        Ok(())
    }

    fn set_notifications(&mut self, axis: Axis, enabled: bool) {
        self.sim_notify[axis.index()] = enabled;
    }

    fn notifications_enabled(&self, axis: Axis) -> bool {
        self.sim_notify[axis.index()]
    }

    fn notify(&mut self, axis: Axis, value: &WireValue) -> Result<(), LinkError> {
        if self.sim_notify[axis.index()] {
            self.sim_sent += 1;
            debug!("BLE(sim): notify {} = {}", axis.label(), value);
        }
        Ok(())
    }
}
