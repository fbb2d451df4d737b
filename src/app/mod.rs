//! Application core — pure domain logic, zero I/O.
//!
//! The two role services orchestrate the state machines, the sample
//! cadence, subscription and rendering.  All interaction with hardware
//! and the BLE stack happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod central;
pub mod events;
pub mod peripheral;
pub mod ports;

pub use central::CentralService;
pub use peripheral::PeripheralService;
