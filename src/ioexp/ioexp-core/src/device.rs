use crate::bus::{RegisterBus, SharedBus};
use crate::constants::registers::*;
use crate::decoder::InterruptSnapshot;
use crate::pin::{Comparison, Port};
use log::{debug, trace};

/// Register protocol of one MCP23018 on a shared bus
///
/// Each method is a single bus transaction: the bus lock is held from the
/// first register access to the last.
pub struct Mcp23018<S> {
    bus: S,
    address: u8,
}

impl<S: SharedBus> Mcp23018<S> {
    pub fn new(bus: S, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Put IOCON in the layout the rest of the driver assumes
    /// (BANK = 0, sequential addressing on)
    pub fn begin(&self) {
        debug!("Initializing MCP23018 at 0x{:02x}", self.address);
        let address = self.address;
        self.bus
            .transaction(|bus| bus.write_register(address, IOCON, 0x00));
    }

    pub fn set_control_bit(&self, bit: u8, state: bool) {
        let address = self.address;
        self.bus
            .transaction(|bus| bus.set_bit(address, IOCON, bit, state));
    }

    /// Direction bytes for both ports; a set bit is an input
    pub fn set_directions(&self, port_a: u8, port_b: u8) {
        self.write_pair(IODIRA, port_a, port_b);
    }

    pub fn set_pullups(&self, port_a: u8, port_b: u8) {
        self.write_pair(GPPUA, port_a, port_b);
    }

    /// Write a port A register and its port B twin
    pub fn write_pair(&self, register: u8, port_a: u8, port_b: u8) {
        let address = self.address;
        let value = u16::from(port_a) | (u16::from(port_b) << 8);
        self.bus
            .transaction(|bus| bus.write_pair(address, register, value));
    }

    pub fn read_pair(&self, register: u8) -> u16 {
        let address = self.address;
        self.bus
            .transaction(|bus| bus.read_pair(address, register))
    }

    /// Set or clear bit `pin` of the `port` copy of a port A register
    pub fn set_bit_in_register(&self, port: Port, register: u8, pin: u8, state: bool) {
        let address = self.address;
        self.bus
            .transaction(|bus| bus.set_bit(address, port.register(register), pin, state));
    }

    /// Program comparison source and enable interrupt-on-change for a pin
    pub fn arm_pin(&self, port: Port, pin: u8, comparison: Comparison) {
        let address = self.address;
        self.bus.transaction(|bus| {
            match comparison {
                Comparison::PreviousState => {
                    bus.set_bit(address, port.register(INTCONA), pin, false);
                }
                Comparison::DefaultValue(level) => {
                    bus.set_bit(address, port.register(INTCONA), pin, true);
                    bus.set_bit(address, port.register(DEFVALA), pin, level);
                }
            }
            bus.set_bit(address, port.register(GPINTENA), pin, true);
        });
    }

    pub fn disarm_pin(&self, port: Port, pin: u8) {
        self.set_bit_in_register(port, GPINTENA, pin, false);
    }

    /// Direction and pull-up bits of one pin
    pub fn configure_pin(&self, port: Port, pin: u8, input: bool, pullup: bool) {
        let address = self.address;
        self.bus.transaction(|bus| {
            bus.set_bit(address, port.register(IODIRA), pin, input);
            bus.set_bit(address, port.register(GPPUA), pin, pullup);
        });
    }

    /// Current logical levels of a port
    pub fn port_state(&self, port: Port) -> u8 {
        let address = self.address;
        self.bus
            .transaction(|bus| bus.read_register(address, port.register(GPIOA)))
    }

    /// Drive one output latch bit
    pub fn set_pin(&self, port: Port, pin: u8, state: bool) {
        self.set_bit_in_register(port, OLATA, pin, state);
    }

    /// Read flags, then captures, without releasing the bus in between
    ///
    /// With IOCON.INTCC set the capture read clears the pending interrupt,
    /// so the flags must already be in hand by then.
    pub fn read_snapshot(&self) -> InterruptSnapshot {
        let address = self.address;
        let snapshot = self.bus.transaction(|bus| {
            let flags = bus.read_pair(address, INTFA);
            let captures = bus.read_pair(address, INTCAPA);
            InterruptSnapshot { flags, captures }
        });
        trace!(
            "MCP23018 0x{:02x} flags {:04x} captures {:04x}",
            address,
            snapshot.flags,
            snapshot.captures
        );
        snapshot
    }
}
