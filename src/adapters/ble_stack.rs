//! Bluedroid bring-up shared by both roles.
//!
//! Releases classic-BT memory, starts the controller in BLE-only mode and
//! enables Bluedroid.  Role adapters register their own GAP/GATT callbacks
//! afterwards.

use log::info;

use crate::error::InitError;

/// Maximum advertised name length that still fits a legacy ADV packet.
pub const MAX_NAME_LEN: usize = 29;

#[cfg(target_os = "espidf")]
pub fn init_bluedroid() -> Result<(), InitError> {
    use esp_idf_svc::sys::*;
    use log::error;

    // SAFETY: called once from the role's startup path before any callback
    // is registered; Bluedroid APIs are not re-entered concurrently here.
    unsafe {
        esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

        let mut bt_cfg = esp_bt_controller_config_t::default();
        let ret = esp_bt_controller_init(&mut bt_cfg);
        if ret != ESP_OK as i32 {
            error!("BLE: bt_controller_init failed ({})", ret);
            return Err(InitError::TransportInitFailed);
        }

        let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
        if ret != ESP_OK as i32 {
            error!("BLE: bt_controller_enable failed ({})", ret);
            return Err(InitError::TransportInitFailed);
        }

        let ret = esp_bluedroid_init();
        if ret != ESP_OK as i32 {
            error!("BLE: bluedroid_init failed ({})", ret);
            return Err(InitError::TransportInitFailed);
        }

        let ret = esp_bluedroid_enable();
        if ret != ESP_OK as i32 {
            error!("BLE: bluedroid_enable failed ({})", ret);
            return Err(InitError::TransportInitFailed);
        }
    }
    info!("BLE: Bluedroid up");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_bluedroid() -> Result<(), InitError> {
    info!("BLE(sim): stack init skipped");
    Ok(())
}

/// NUL-terminated copy of `name` for C APIs, clipped to [`MAX_NAME_LEN`].
pub fn c_name(name: &str) -> [u8; MAX_NAME_LEN + 1] {
    let mut out = [0u8; MAX_NAME_LEN + 1];
    let len = name.len().min(MAX_NAME_LEN);
    out[..len].copy_from_slice(&name.as_bytes()[..len]);
    out
}

/// Bluedroid stores 128-bit UUIDs little-endian.
#[cfg(target_os = "espidf")]
pub fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: esp_bt_uuid_t is a plain C struct/union; all-zero is valid.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
pub fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    // SAFETY: as above.
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}
