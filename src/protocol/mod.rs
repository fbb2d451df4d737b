//! Telemetry wire protocol shared by both roles.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                   | Perms  | Descriptors        |
//! |----------------|----------------------------------------|--------|--------------------|
//! | Accel X        | `ba9f3faa-7939-436b-8197-7ccd1e66be33` | Notify | CCCD, user desc    |
//! | Accel Y        | `0e1f1e2e-7381-4f30-8cff-7ff84eb93026` | Notify | CCCD, user desc    |
//! | Accel Z        | `1930a6a0-25ae-4ae4-a309-9d8c230c2358` | Notify | CCCD, user desc    |
//!
//! All three live under service `c2d80b23-524b-4df7-9bb1-e5c305833633`.
//! Each notification carries one [`WireValue`]; axes are never batched.

pub mod log_record;
pub mod wire;

pub use log_record::{BatteryState, LogRecord, LOG_HEADER};
pub use wire::{WireValue, WIRE_WIDTH};

// ───────────────────────────────────────────────────────────────
// Identifiers
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0xc2d80b23_524b_4df7_9bb1_e5c305833633;
pub const CHAR_ACCEL_X: u128 = 0xba9f3faa_7939_436b_8197_7ccd1e66be33;
pub const CHAR_ACCEL_Y: u128 = 0x0e1f1e2e_7381_4f30_8cff_7ff84eb93026;
pub const CHAR_ACCEL_Z: u128 = 0x1930a6a0_25ae_4ae4_a309_9d8c230c2358;

/// Client Characteristic Configuration descriptor.
pub const CCCD_UUID16: u16 = 0x2902;
/// Characteristic User Description descriptor.
pub const USER_DESCRIPTION_UUID16: u16 = 0x2901;

/// GATT characteristic property bits.
pub const CHAR_PROP_READ: u8 = 0x02;
pub const CHAR_PROP_NOTIFY: u8 = 0x10;
/// Axis characteristics are notify-only; nothing serves reads.
pub const AXIS_CHAR_PROPERTIES: u8 = CHAR_PROP_NOTIFY;

/// CCCD value that arms notifications (little-endian `0x0001`).
pub const CCCD_NOTIFY_ON: [u8; 2] = [0x01, 0x00];
/// CCCD value that disarms notifications.
pub const CCCD_NOTIFY_OFF: [u8; 2] = [0x00, 0x00];

// ───────────────────────────────────────────────────────────────
// Axis channels
// ───────────────────────────────────────────────────────────────

/// One of the three independently notifiable telemetry channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const COUNT: usize = 3;

    /// Every axis, in notification order.
    pub const ALL: [Axis; Axis::COUNT] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Characteristic UUID carrying this axis.
    pub const fn characteristic_uuid(self) -> u128 {
        match self {
            Self::X => CHAR_ACCEL_X,
            Self::Y => CHAR_ACCEL_Y,
            Self::Z => CHAR_ACCEL_Z,
        }
    }

    /// Reverse lookup used by transports that only see a UUID.
    pub fn from_characteristic_uuid(uuid: u128) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|axis| axis.characteristic_uuid() == uuid)
    }

    /// Text stored in the characteristic's user-description descriptor.
    pub const fn description(self) -> &'static str {
        match self {
            Self::X => "ADXL X Value",
            Self::Y => "ADXL Y Value",
            Self::Z => "ADXL Z Value",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Reading
// ───────────────────────────────────────────────────────────────

/// One accelerometer poll.  All three components come from the same poll.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Reading {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Encode every axis for transmission, indexed by [`Axis::index`].
    pub fn encode(&self) -> [WireValue; Axis::COUNT] {
        Axis::ALL.map(|axis| WireValue::encode(self.axis(axis)))
    }
}
