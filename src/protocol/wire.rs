//! Fixed-width ASCII encoding of one axis value.
//!
//! ```text
//!   -3.1234  ──encode──▶  " -3.1234"  (8 bytes, right-aligned, 4 decimals)
//! 12345.678  ──encode──▶  "12345.67"  (rendering truncated to 8 bytes)
//! ```
//!
//! Receivers copy at most [`WIRE_WIDTH`] bytes; anything shorter is
//! null-padded.  Decoding ignores surrounding spaces and padding NULs.

use core::fmt::{self, Write};

/// Field width, and the number of bytes carried per notification.
pub const WIRE_WIDTH: usize = 8;

/// Digits after the decimal point.
pub const WIRE_PRECISION: usize = 4;

/// One encoded axis sample.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WireValue {
    bytes: [u8; WIRE_WIDTH],
    len: u8,
}

impl WireValue {
    /// An empty, all-NUL value.
    pub const EMPTY: Self = Self {
        bytes: [0; WIRE_WIDTH],
        len: 0,
    };

    /// Render `value` right-aligned in an 8-character field with 4 decimals.
    ///
    /// Renderings wider than the field keep their first 8 bytes.
    pub fn encode(value: f32) -> Self {
        // -f32::MAX renders in 45 bytes at this precision.
        let mut text = heapless::String::<48>::new();
        let _ = write!(
            text,
            "{:>width$.prec$}",
            value,
            width = WIRE_WIDTH,
            prec = WIRE_PRECISION
        );
        Self::from_payload(text.as_bytes())
    }

    /// Copy a received notification payload into a value slot.
    ///
    /// Bytes past [`WIRE_WIDTH`] are dropped.
    pub fn from_payload(payload: &[u8]) -> Self {
        let len = payload.len().min(WIRE_WIDTH);
        let mut bytes = [0u8; WIRE_WIDTH];
        bytes[..len].copy_from_slice(&payload[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    /// Exactly the bytes sent on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The full null-padded field.
    pub fn padded(&self) -> &[u8; WIRE_WIDTH] {
        &self.bytes
    }

    /// Text view; non-ASCII payloads render as an empty string.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Parse the value back into a float.
    ///
    /// Returns `None` for empty or non-numeric payloads.
    pub fn decode(&self) -> Option<f32> {
        let text = core::str::from_utf8(self.as_bytes()).ok()?;
        let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
        if trimmed.is_empty() {
            return None;
        }
        trimmed.parse::<f32>().ok()
    }
}

impl Default for WireValue {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireValue({:?})", self.as_str())
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
