//! ADXL link firmware library.
//!
//! Both roles of the accelerometer telemetry link share this crate: the
//! peripheral samples an ADXL343 and notifies X/Y/Z over BLE, the central
//! subscribes and renders.  Everything above `adapters` and `drivers` is
//! pure logic and runs on the host.  ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod aggregator;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod pins;
pub mod presenter;
pub mod protocol;
pub mod telemetry_log;

pub mod adapters;
pub mod drivers;
