//! Polled push-button with press-edge detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The main loop samples the
//! pin once per iteration; a press is reported on the released → pressed
//! transition only, so holding the button toggles once.  At the 50 ms loop
//! rate contact bounce settles between samples.

use embedded_hal::digital::InputPin;

pub struct ToggleButton<P> {
    pin: P,
    was_pressed: bool,
}

impl<P: InputPin> ToggleButton<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            was_pressed: false,
        }
    }

    /// Sample the pin.  Returns `true` once per press.
    ///
    /// A read error counts as released.
    pub fn poll(&mut self) -> bool {
        let pressed = self.pin.is_low().unwrap_or(false);
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        edge
    }

    /// Level as of the last [`poll`](Self::poll).
    pub fn is_held(&self) -> bool {
        self.was_pressed
    }
}
