use crate::constants::MAX_PENDING;
use crate::pin::Port;
use crate::registry::{HandlerTable, InterruptHandler};
use heapless::Vec;
use log::{error, trace};

/// Flag and capture registers of both ports, read in one bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptSnapshot {
    pub flags: u16,    // INTFA | INTFB << 8
    pub captures: u16, // INTCAPA | INTCAPB << 8
}

impl InterruptSnapshot {
    /// (flags, captures) for a single port
    pub fn port(&self, port: Port) -> (u8, u8) {
        (port.byte_of(self.flags), port.byte_of(self.captures))
    }
}

/// Pins of one port whose handler should run, ascending
///
/// A pin fires when its flag is set, it has a handler, and its mode accepts
/// the captured level (rising needs a high capture, falling a low one, every
/// other mode fires on the flag alone).
pub fn fired<'a, H>(
    flags: u8,
    captures: u8,
    table: &'a HandlerTable<H>,
) -> impl Iterator<Item = (u8, &'a H)> + 'a {
    table.iter().filter_map(move |(pin, entry)| {
        let mask = 1u8 << pin;
        if flags & mask == 0 {
            return None;
        }
        let handler = entry.handler()?;
        if entry.mode().fires_on(captures & mask != 0) {
            Some((pin, handler))
        } else {
            None
        }
    })
}

/// Decode one port and invoke its handlers in place
///
/// Returns the number of handlers invoked.
pub fn service_interrupts<H: InterruptHandler>(
    flags: u8,
    captures: u8,
    table: &HandlerTable<H>,
) -> usize {
    let mut invoked = 0;
    for (pin, handler) in fired(flags, captures, table) {
        trace!("Servicing pin {}", pin);
        handler.handle();
        invoked += 1;
    }
    invoked
}

/// Handlers selected by one service cycle, detached from their tables
///
/// Collecting first and running later lets the caller drop any lock
/// guarding the tables before callbacks execute.
pub struct Dispatch<H> {
    pending: Vec<(Port, u8, H), MAX_PENDING>,
}

impl<H> Dispatch<H> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Append the fired handlers of `port`
    pub fn collect(&mut self, port: Port, flags: u8, captures: u8, table: &HandlerTable<H>)
    where
        H: Clone,
    {
        for (pin, handler) in fired(flags, captures, table) {
            if self.pending.push((port, pin, handler.clone())).is_err() {
                error!("Dispatch queue full, dropping {:?}{}", port, pin);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// (port, pin) pairs in invocation order
    pub fn iter(&self) -> impl Iterator<Item = (Port, u8)> + '_ {
        self.pending.iter().map(|(port, pin, _)| (*port, *pin))
    }

    /// Invoke every collected handler in collection order
    pub fn run(self) -> usize
    where
        H: InterruptHandler,
    {
        let count = self.pending.len();
        for (port, pin, handler) in self.pending {
            trace!("Dispatching {:?}{}", port, pin);
            handler.handle();
        }
        count
    }
}

impl<H> Default for Dispatch<H> {
    fn default() -> Self {
        Self::new()
    }
}
