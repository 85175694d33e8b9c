use core::fmt;

/// Validation failures reported by the expander driver
///
/// Every variant is logged at the point of detection; the value is returned
/// so callers can react, but ignoring it is always safe since nothing has
/// been mutated when an `Error` comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Pin index outside `0..PORT_PIN_COUNT`
    InvalidPin(u8),
    /// Trigger mode code outside the supported set
    UnsupportedMode(u8),
    /// Pin mode code outside input / input-pullup / output
    UnknownPinMode(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPin(pin) => write!(f, "invalid pin {}", pin),
            Error::UnsupportedMode(code) => write!(f, "unsupported interrupt mode 0x{:02x}", code),
            Error::UnknownPinMode(code) => write!(f, "unknown pin mode 0x{:02x}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
