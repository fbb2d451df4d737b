//! Append-only telemetry log.
//!
//! ```text
//!  init ──mount──▶ exists? ──no──▶ write header ──▶ active
//!           │
//!           └─fail──▶ inactive (every append is a no-op)
//! ```
//!
//! Each record is appended with its own open/append/close so a power cut
//! loses at most the line in flight.

use log::{info, warn};

use crate::app::ports::{OpenMode, StoragePort};
use crate::error::{InitError, StorageError};
use crate::protocol::{LOG_HEADER, LogRecord};

pub struct TelemetryLogger<S: StoragePort> {
    storage: S,
    path: heapless::String<64>,
    active: bool,
    appended: u32,
}

impl<S: StoragePort> TelemetryLogger<S> {
    pub fn new(storage: S, path: &str) -> Self {
        let mut p = heapless::String::new();
        if p.push_str(path).is_err() {
            warn!("log path '{}' too long, logging will stay disabled", path);
        }
        Self {
            storage,
            path: p,
            active: false,
            appended: 0,
        }
    }

    /// Mount storage and create the file with its header if missing.
    ///
    /// Any failure leaves the logger inactive and reports
    /// [`InitError::StorageUnavailable`], which callers treat as soft.
    pub fn init(&mut self, enabled: bool, cs_gpio: i32) -> Result<(), InitError> {
        self.active = false;
        if !enabled {
            info!("telemetry log disabled by config");
            return Ok(());
        }
        if self.path.is_empty() {
            return Err(InitError::StorageUnavailable);
        }

        if let Err(e) = self.storage.mount(cs_gpio) {
            warn!("storage mount failed ({}), logging disabled", e);
            return Err(InitError::StorageUnavailable);
        }

        if !self.storage.exists(&self.path) {
            if let Err(e) = self.write_header() {
                warn!("cannot create {} ({}), logging disabled", self.path, e);
                return Err(InitError::StorageUnavailable);
            }
            info!("created {}", self.path);
        }

        self.active = true;
        info!("telemetry log at {}", self.path);
        Ok(())
    }

    /// Append one record.  A no-op while inactive.
    pub fn append(&mut self, record: &LogRecord) -> Result<(), StorageError> {
        if !self.active {
            return Ok(());
        }
        let line = record.to_line();
        let mut file = self.storage.open(&self.path, OpenMode::Append)?;
        let res = self.storage.append(&mut file, line.as_bytes());
        self.storage.close(file);
        res?;
        self.appended = self.appended.wrapping_add(1);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Records appended since boot.
    pub fn appended(&self) -> u32 {
        self.appended
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn write_header(&mut self) -> Result<(), StorageError> {
        let mut file = self.storage.open(&self.path, OpenMode::Write)?;
        let res = self.storage.append(&mut file, LOG_HEADER.as_bytes());
        self.storage.close(file);
        res
    }
}
