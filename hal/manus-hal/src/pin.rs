//! `embedded-hal` pin adapter
//!
//! Wraps any [`embedded_hal::digital::OutputPin`] as an [`OutputChannel`].
//! This is how a real relay board is injected: the board crate (rppal,
//! linux-embedded-hal, a chip HAL) hands over its output pins and the
//! controller only ever sees channels.

use embedded_hal::digital::{Error as _, OutputPin};

use crate::output::{ChannelError, OutputChannel};

/// Output channel backed by an `embedded-hal` pin
pub struct PinChannel<P> {
    /// Underlying pin, `None` once released
    pin: Option<P>,
    /// Line number reported in errors
    line: u8,
    /// If true, relay ON = pin LOW (active-low relay boards)
    inverted: bool,
    /// Logical state as of the last successful write
    on: bool,
}

impl<P: OutputPin> PinChannel<P> {
    /// Create a new pin channel and drive it OFF
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `line`: Line number used for logging and errors
    /// - `inverted`: If true, the relay is ON when the pin is LOW
    pub fn new(pin: P, line: u8, inverted: bool) -> Result<Self, ChannelError> {
        let mut channel = Self {
            pin: Some(pin),
            line,
            inverted,
            on: false,
        };
        // Ensure relay starts off
        channel.set(false)?;
        Ok(channel)
    }

    /// Create a channel for an active-high relay input
    pub fn active_high(pin: P, line: u8) -> Result<Self, ChannelError> {
        Self::new(pin, line, false)
    }

    /// Create a channel for an active-low relay input
    pub fn active_low(pin: P, line: u8) -> Result<Self, ChannelError> {
        Self::new(pin, line, true)
    }

    /// Whether this channel has been released
    pub fn is_released(&self) -> bool {
        self.pin.is_none()
    }
}

impl<P: OutputPin> OutputChannel for PinChannel<P> {
    fn line(&self) -> u8 {
        self.line
    }

    fn set(&mut self, on: bool) -> Result<(), ChannelError> {
        let line = self.line;
        let pin = self.pin.as_mut().ok_or(ChannelError::Released { line })?;

        // Normal: on=true, inverted=false → high
        // Inverted: on=true, inverted=true → low
        let result = if on != self.inverted {
            pin.set_high()
        } else {
            pin.set_low()
        };

        result.map_err(|e| ChannelError::Fault {
            line,
            reason: format!("{:?}", e.kind()),
        })?;
        self.on = on;
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.on
    }

    fn release(&mut self) -> Result<(), ChannelError> {
        if self.pin.is_none() {
            return Ok(());
        }
        self.set(false)?;
        self.pin = None;
        Ok(())
    }
}
