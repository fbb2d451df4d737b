//! ADXL343 three-axis accelerometer over I2C.
//!
//! Full-resolution mode keeps the scale at 4 mg/LSB for every range, so the
//! conversion to m/s² does not depend on [`Range`].

use embedded_hal::i2c::I2c;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use crate::protocol::Reading;

use super::Accelerometer;

/// Default address with ALT ADDRESS tied high.
pub const DEFAULT_ADDR: u8 = 0x53;

const REG_DEVID: u8 = 0x00;
const REG_POWER_CTL: u8 = 0x2D;
const REG_DATA_FORMAT: u8 = 0x31;
const REG_DATAX0: u8 = 0x32;

const DEVICE_ID: u8 = 0xE5;
const POWER_CTL_MEASURE: u8 = 0x08;
const DATA_FORMAT_FULL_RES: u8 = 0x08;
const DATA_FORMAT_RANGE_MASK: u8 = 0x03;

const MG_PER_LSB: f32 = 0.004;
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Measurement range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    G2,
    G4,
    G8,
    G16,
}

impl Range {
    const fn bits(self) -> u8 {
        match self {
            Self::G2 => 0b00,
            Self::G4 => 0b01,
            Self::G8 => 0b10,
            Self::G16 => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & DATA_FORMAT_RANGE_MASK {
            0b00 => Self::G2,
            0b01 => Self::G4,
            0b10 => Self::G8,
            _ => Self::G16,
        }
    }

    pub const fn g(self) -> u8 {
        match self {
            Self::G2 => 2,
            Self::G4 => 4,
            Self::G8 => 8,
            Self::G16 => 16,
        }
    }
}

pub struct Adxl343<I2C> {
    i2c: I2C,
    addr: u8,
    range: Range,
    ready: bool,
}

impl<I2C: I2c> Adxl343<I2C> {
    pub fn new(i2c: I2C, range: Range) -> Self {
        Self {
            i2c,
            addr: DEFAULT_ADDR,
            range,
            ready: false,
        }
    }

    /// Check the device id, apply the range and enter measurement mode.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        let id = self.read_reg(REG_DEVID)?;
        if id != DEVICE_ID {
            return Err(SensorError::WrongDevice(id));
        }
        self.write_range(self.range)?;
        self.write_reg(REG_POWER_CTL, POWER_CTL_MEASURE)?;
        self.ready = true;
        info!("ADXL343: ready, range ±{}g", self.range.g());
        Ok(())
    }

    pub fn set_range(&mut self, range: Range) -> Result<(), SensorError> {
        self.write_range(range)?;
        self.range = range;
        Ok(())
    }

    /// Range as read back from the device.
    pub fn range(&mut self) -> Result<Range, SensorError> {
        Ok(Range::from_bits(self.read_reg(REG_DATA_FORMAT)?))
    }

    /// One poll of all three axes, in m/s².
    pub fn poll(&mut self) -> Result<Reading, SensorError> {
        if !self.ready {
            return Err(SensorError::NotInitialised);
        }
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.addr, &[REG_DATAX0], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        let raw = |lo: usize| i16::from_le_bytes([buf[lo], buf[lo + 1]]);
        let reading = Reading::new(to_ms2(raw(0)), to_ms2(raw(2)), to_ms2(raw(4)));
        debug!("ADXL343: {:?}", reading);
        Ok(reading)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_range(&mut self, range: Range) -> Result<(), SensorError> {
        let mut format = self.read_reg(REG_DATA_FORMAT)?;
        format &= !(DATA_FORMAT_RANGE_MASK | DATA_FORMAT_FULL_RES);
        format |= range.bits() | DATA_FORMAT_FULL_RES;
        self.write_reg(REG_DATA_FORMAT, format)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.addr, &[reg, value])
            .map_err(|_| SensorError::Bus)
    }
}

impl<I2C: I2c> Accelerometer for Adxl343<I2C> {
    fn begin(&mut self) -> Result<(), SensorError> {
        Adxl343::begin(self)
    }

    fn read_acceleration(&mut self) -> Result<Reading, SensorError> {
        self.poll()
    }
}

fn to_ms2(raw: i16) -> f32 {
    f32::from(raw) * MG_PER_LSB * STANDARD_GRAVITY
}
