use crate::constants::PORT_PIN_COUNT;
use crate::error::Error;
use crate::pin::{check_pin, InterruptMode};

/// Callback invoked from worker context when a pin's trigger condition holds
///
/// Any per-registration context is captured by the implementor itself.
pub trait InterruptHandler {
    fn handle(&self);
}

/// One slot of a port's handler table
///
/// Invariant: `handler` is present iff `mode != Disabled`.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerEntry<H> {
    handler: Option<H>,
    mode: InterruptMode,
}

impl<H> HandlerEntry<H> {
    pub const fn disabled() -> Self {
        Self {
            handler: None,
            mode: InterruptMode::Disabled,
        }
    }

    pub fn handler(&self) -> Option<&H> {
        self.handler.as_ref()
    }

    pub fn mode(&self) -> InterruptMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.handler.is_some()
    }
}

/// Fixed-capacity pin -> handler table for one port
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerTable<H> {
    entries: [HandlerEntry<H>; PORT_PIN_COUNT],
}

impl<H> HandlerTable<H> {
    /// All entries start disabled
    pub fn new() -> Self {
        Self {
            entries: core::array::from_fn(|_| HandlerEntry::disabled()),
        }
    }

    pub fn entry(&self, pin: u8) -> Result<&HandlerEntry<H>, Error> {
        let pin = check_pin(pin)?;
        Ok(&self.entries[pin as usize])
    }

    /// Store a handler; registering `Disabled` resets the slot instead
    pub fn register(&mut self, pin: u8, handler: H, mode: InterruptMode) -> Result<(), Error> {
        let pin = check_pin(pin)?;
        self.entries[pin as usize] = match mode {
            InterruptMode::Disabled => HandlerEntry::disabled(),
            _ => HandlerEntry {
                handler: Some(handler),
                mode,
            },
        };
        Ok(())
    }

    pub fn reset(&mut self, pin: u8) -> Result<(), Error> {
        let pin = check_pin(pin)?;
        self.entries[pin as usize] = HandlerEntry::disabled();
        Ok(())
    }

    /// Entries in ascending pin order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &HandlerEntry<H>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(pin, entry)| (pin as u8, entry))
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_active()).count()
    }
}

impl<H> Default for HandlerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
