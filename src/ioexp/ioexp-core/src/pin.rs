use crate::constants::{interrupt_modes, pin_modes, PORT_PIN_COUNT};
use crate::error::Error;

/// One 8-bit GPIO group on the expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
}

impl Port {
    pub const ALL: [Port; 2] = [Port::A, Port::B];

    pub fn index(self) -> usize {
        match self {
            Port::A => 0,
            Port::B => 1,
        }
    }

    /// Translate a port A register offset into this port's offset
    pub fn register(self, port_a_register: u8) -> u8 {
        port_a_register + self.index() as u8
    }

    /// Extract this port's byte from a paired 16-bit register value
    pub fn byte_of(self, pair: u16) -> u8 {
        match self {
            Port::A => pair as u8,
            Port::B => (pair >> 8) as u8,
        }
    }
}

/// Bounds check shared by every pin accessor
pub fn check_pin(pin: u8) -> Result<u8, Error> {
    if (pin as usize) < PORT_PIN_COUNT {
        Ok(pin)
    } else {
        Err(Error::InvalidPin(pin))
    }
}

/// Non-interrupt GPIO configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    InputPullup,
    Output,
}

impl PinMode {
    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            pin_modes::INPUT => Ok(PinMode::Input),
            pin_modes::INPUT_PULLUP => Ok(PinMode::InputPullup),
            pin_modes::OUTPUT => Ok(PinMode::Output),
            _ => Err(Error::UnknownPinMode(code)),
        }
    }

    /// (direction bit, pull-up bit); direction 1 means input.
    ///
    /// Outputs keep the pull-up on: on the open-drain MCP23018 it is what
    /// actually drives the line high.
    pub fn register_bits(self) -> (bool, bool) {
        match self {
            PinMode::Input => (true, false),
            PinMode::InputPullup => (true, true),
            PinMode::Output => (false, true),
        }
    }
}

/// Trigger policy for an interrupt-enabled pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    Disabled,
    Rising,
    Falling,
    Change,
    OnLow,
    OnLowWake,
    OnHigh,
    OnHighWake,
}

/// What the device compares a pin against to raise its flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Comparison {
    /// INTCON = 0: any change from the previous pin state
    PreviousState,
    /// INTCON = 1: mismatch against the DEFVAL bit
    DefaultValue(bool),
}

impl InterruptMode {
    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            interrupt_modes::DISABLED => Ok(InterruptMode::Disabled),
            interrupt_modes::RISING => Ok(InterruptMode::Rising),
            interrupt_modes::FALLING => Ok(InterruptMode::Falling),
            interrupt_modes::CHANGE => Ok(InterruptMode::Change),
            interrupt_modes::ONLOW => Ok(InterruptMode::OnLow),
            interrupt_modes::ONHIGH => Ok(InterruptMode::OnHigh),
            interrupt_modes::ONLOW_WE => Ok(InterruptMode::OnLowWake),
            interrupt_modes::ONHIGH_WE => Ok(InterruptMode::OnHighWake),
            _ => Err(Error::UnsupportedMode(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            InterruptMode::Disabled => interrupt_modes::DISABLED,
            InterruptMode::Rising => interrupt_modes::RISING,
            InterruptMode::Falling => interrupt_modes::FALLING,
            InterruptMode::Change => interrupt_modes::CHANGE,
            InterruptMode::OnLow => interrupt_modes::ONLOW,
            InterruptMode::OnHigh => interrupt_modes::ONHIGH,
            InterruptMode::OnLowWake => interrupt_modes::ONLOW_WE,
            InterruptMode::OnHighWake => interrupt_modes::ONHIGH_WE,
        }
    }

    /// Comparison source to program; `None` only for `Disabled`
    pub fn comparison(self) -> Option<Comparison> {
        match self {
            InterruptMode::Rising | InterruptMode::Falling | InterruptMode::Change => {
                Some(Comparison::PreviousState)
            }
            // DEFVAL = 1 flags the pin whenever it reads low
            InterruptMode::OnLow | InterruptMode::OnLowWake => Some(Comparison::DefaultValue(true)),
            InterruptMode::OnHigh | InterruptMode::OnHighWake => {
                Some(Comparison::DefaultValue(false))
            }
            InterruptMode::Disabled => None,
        }
    }

    /// Decide whether a flagged pin fires given its captured level
    pub fn fires_on(self, captured_high: bool) -> bool {
        match self {
            InterruptMode::Rising => captured_high,
            InterruptMode::Falling => !captured_high,
            InterruptMode::Disabled => false,
            // The flag alone already encodes the comparison mismatch
            _ => true,
        }
    }
}
