//! Error taxonomy for both roles.
//!
//! | Class        | Type                         | Recovery                               |
//! |--------------|------------------------------|----------------------------------------|
//! | FatalInit    | [`InitError::is_fatal`]      | halt, no retry                         |
//! | SoftInit     | [`InitError::StorageUnavailable`] | logging disabled, telemetry continues |
//! | LinkFailure  | [`LinkError`] while connecting | tear down, rescan                    |
//! | LinkLoss     | [`LinkError::Disconnected`]  | disarm notify, re-advertise / rescan   |
//!
//! All variants are `Copy` so they can travel through the event queue and
//! outbound events without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Init(InitError),
    Link(LinkError),
    Sensor(SensorError),
    Storage(StorageError),
    Display(DisplayError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The accelerometer did not answer with its device id.
    AccelerometerNotFound,
    /// A fuel gauge was configured but did not answer.
    FuelGaugeNotFound,
    /// The storage card could not be mounted.
    StorageUnavailable,
    /// The BLE stack failed to come up.
    TransportInitFailed,
}

impl InitError {
    /// FatalInit errors halt the device; everything else degrades.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::StorageUnavailable)
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccelerometerNotFound => write!(f, "could not find a valid ADXL343 sensor"),
            Self::FuelGaugeNotFound => write!(f, "could not find a valid MAX17048 fuel gauge"),
            Self::StorageUnavailable => write!(f, "storage card mount failed"),
            Self::TransportInitFailed => write!(f, "BLE stack initialisation failed"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Opening the connection to the matched address failed.
    ConnectFailed,
    /// The remote does not expose the telemetry service.
    ServiceNotFound,
    /// The service lacks one of the three axis characteristics.
    CharacteristicNotFound(u128),
    /// Registering the notification handler failed.
    SubscribeFailed,
    /// Writing a characteristic's CCCD failed.
    DescriptorWriteFailed,
    /// A notify could not be queued by the stack.
    NotifyFailed,
    /// Advertising could not be (re)started.
    AdvertisingFailed,
    /// The link dropped mid-session.
    Disconnected,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::ServiceNotFound => write!(f, "telemetry service not found"),
            Self::CharacteristicNotFound(uuid) => {
                write!(f, "characteristic {:032x} not found", uuid)
            }
            Self::SubscribeFailed => write!(f, "notification registration failed"),
            Self::DescriptorWriteFailed => write!(f, "CCCD write failed"),
            Self::NotifyFailed => write!(f, "notify failed"),
            Self::AdvertisingFailed => write!(f, "advertising start failed"),
            Self::Disconnected => write!(f, "link lost"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed.
    Bus,
    /// The device id register did not match.
    WrongDevice(u8),
    /// The driver was used before `begin` succeeded.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::WrongDevice(id) => write!(f, "unexpected device id 0x{:02x}", id),
            Self::NotInitialised => write!(f, "driver not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The card is missing or the filesystem could not be mounted.
    MountFailed,
    /// A file could not be opened.
    OpenFailed,
    /// A write did not complete.
    WriteFailed,
    /// Storage was used while unmounted.
    NotMounted,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MountFailed => write!(f, "mount failed"),
            Self::OpenFailed => write!(f, "open failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::NotMounted => write!(f, "not mounted"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// The controller did not acknowledge at the given address.
    NotFound(u8),
    /// Flushing the framebuffer failed.
    Bus,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(addr) => write!(f, "no display at 0x{:02x}", addr),
            Self::Bus => write!(f, "display bus error"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
