//! SSD1327 128×128 4-bit greyscale OLED over I2C.
//!
//! Drawing goes to an in-RAM framebuffer through embedded-graphics;
//! [`Ssd1327::present`] pushes the whole buffer to the panel.  Two pixels
//! share one byte, high nibble first.

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyleBuilder},
    pixelcolor::Gray4,
    prelude::*,
    text::{Baseline, Text, TextStyleBuilder},
};
use embedded_hal::i2c::I2c;
use log::info;

use crate::error::DisplayError;

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 128;
const BUFFER_LEN: usize = (WIDTH * HEIGHT / 2) as usize;

const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
/// Data bytes per I2C write, excluding the control byte.
const DATA_CHUNK: usize = 32;

const INIT_SEQUENCE: &[&[u8]] = &[
    &[0xAE],       // display off
    &[0xA0, 0x51], // remap: column, nibble, COM split
    &[0xA1, 0x00], // start line
    &[0xA2, 0x00], // display offset
    &[0xA4],       // normal display
    &[0xA8, 0x7F], // multiplex 1/128
    &[0xB1, 0xF1], // phase length
    &[0xB3, 0x00], // clock divider
    &[0xAB, 0x01], // internal VDD regulator
    &[0xB6, 0x0F], // second precharge
    &[0xBE, 0x0F], // VCOMH
    &[0xBC, 0x08], // precharge voltage
    &[0xD5, 0x62], // function selection B
    &[0xFD, 0x12], // unlock commands
];
const DISPLAY_ON: u8 = 0xAF;

pub struct Ssd1327<I2C> {
    i2c: I2C,
    addr: u8,
    buffer: [u8; BUFFER_LEN],
}

impl<I2C: I2c> Ssd1327<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            addr: 0,
            buffer: [0; BUFFER_LEN],
        }
    }

    /// Send the init sequence to `addr`, blank the panel and switch it on.
    pub fn begin(&mut self, addr: u8) -> Result<(), DisplayError> {
        self.addr = addr;
        for cmd in INIT_SEQUENCE {
            self.command(cmd).map_err(|_| DisplayError::NotFound(addr))?;
        }
        self.clear_buffer();
        self.present()?;
        self.command(&[DISPLAY_ON])?;
        info!("SSD1327: ready at 0x{:02x}", addr);
        Ok(())
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.fill(0);
    }

    /// Draw `text` in full white with its top-left corner at (`x`, `y`).
    pub fn draw_text(&mut self, x: i32, y: i32, font: &MonoFont<'_>, text: &str) {
        let style = MonoTextStyleBuilder::new()
            .font(font)
            .text_color(Gray4::WHITE)
            .build();
        let baseline = TextStyleBuilder::new().baseline(Baseline::Top).build();
        // Drawing into RAM is infallible.
        let _ = Text::with_text_style(text, Point::new(x, y), style, baseline).draw(self);
    }

    /// Push the framebuffer to the panel.
    pub fn present(&mut self) -> Result<(), DisplayError> {
        self.command(&[0x15, 0x00, (WIDTH / 2 - 1) as u8])?;
        self.command(&[0x75, 0x00, (HEIGHT - 1) as u8])?;

        let mut packet = [0u8; DATA_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in self.buffer.chunks(DATA_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            self.i2c
                .write(self.addr, &packet[..=chunk.len()])
                .map_err(|_| DisplayError::Bus)?;
        }
        Ok(())
    }

    /// Grey level at (`x`, `y`), for inspection.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        let idx = Self::index(x, y)?;
        let byte = self.buffer[idx];
        Some(if x % 2 == 0 { byte >> 4 } else { byte & 0x0F })
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn index(x: u32, y: u32) -> Option<usize> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        Some((y * WIDTH / 2 + x / 2) as usize)
    }

    fn command(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        let mut packet = [0u8; 4];
        packet[0] = CONTROL_COMMAND;
        packet[1..=bytes.len()].copy_from_slice(bytes);
        self.i2c
            .write(self.addr, &packet[..=bytes.len()])
            .map_err(|_| DisplayError::Bus)
    }
}

impl<I2C> OriginDimensions for Ssd1327<I2C> {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl<I2C: I2c> DrawTarget for Ssd1327<I2C> {
    type Color = Gray4;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, colour) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            let Some(idx) = Self::index(x, y) else {
                continue;
            };
            let luma = colour.luma() & 0x0F;
            let byte = &mut self.buffer[idx];
            *byte = if x % 2 == 0 {
                (*byte & 0x0F) | (luma << 4)
            } else {
                (*byte & 0xF0) | luma
            };
        }
        Ok(())
    }
}
