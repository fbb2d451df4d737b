//! MAX17048 LiPo fuel gauge over I2C.
//!
//! Registers are 16-bit big-endian words.

use embedded_hal::i2c::I2c;
use log::info;

use crate::error::SensorError;
use crate::protocol::BatteryState;

use super::FuelGauge;

pub const DEFAULT_ADDR: u8 = 0x36;

const REG_VCELL: u8 = 0x02;
const REG_SOC: u8 = 0x04;
const REG_MODE: u8 = 0x06;
const REG_VERSION: u8 = 0x08;

const MODE_QUICK_START: u16 = 0x4000;
const VERSION_MASK: u16 = 0xFFF0;
const VERSION_FAMILY: u16 = 0x0010;

/// VCELL resolution, 78.125 µV per LSB.
const VOLTS_PER_LSB: f32 = 78.125e-6;

pub struct Max17048<I2C> {
    i2c: I2C,
    addr: u8,
    ready: bool,
}

impl<I2C: I2c> Max17048<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            addr: DEFAULT_ADDR,
            ready: false,
        }
    }

    /// Check the silicon version and restart the fuel-gauge algorithm.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        let version = self.read_word(REG_VERSION)?;
        if version & VERSION_MASK != VERSION_FAMILY {
            return Err(SensorError::WrongDevice(version as u8));
        }
        self.write_word(REG_MODE, MODE_QUICK_START)?;
        self.ready = true;
        info!("MAX17048: ready, version 0x{:04x}", version);
        Ok(())
    }

    pub fn cell_voltage(&mut self) -> Result<f32, SensorError> {
        self.ensure_ready()?;
        Ok(f32::from(self.read_word(REG_VCELL)?) * VOLTS_PER_LSB)
    }

    /// State of charge in percent; the low byte is 1/256 %.
    pub fn charge_percent(&mut self) -> Result<f32, SensorError> {
        self.ensure_ready()?;
        Ok(f32::from(self.read_word(REG_SOC)?) / 256.0)
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn ensure_ready(&self) -> Result<(), SensorError> {
        if self.ready {
            Ok(())
        } else {
            Err(SensorError::NotInitialised)
        }
    }

    fn read_word(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_word(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.addr, &[reg, hi, lo])
            .map_err(|_| SensorError::Bus)
    }
}

impl<I2C: I2c> FuelGauge for Max17048<I2C> {
    fn begin(&mut self) -> Result<(), SensorError> {
        Max17048::begin(self)
    }

    fn read_battery(&mut self) -> Result<BatteryState, SensorError> {
        Ok(BatteryState {
            voltage: self.cell_voltage()?,
            state_of_charge: self.charge_percent()?,
        })
    }
}
