use crate::bus::SharedI2c;
use crate::isr::{HostInterruptLine, InterruptSignal};
use ioexp_core::constants::registers::*;
use ioexp_core::constants::{iocon, PORT_COUNT};
use ioexp_core::{Port, RegisterBus, SharedBus};
use log::{trace, warn};
use std::collections::HashMap;

/// Register-level model of an MCP23018
///
/// Interrupt conditions are evaluated when an input changes: INTCON selects
/// previous-state or DEFVAL comparison, the first event on an idle port
/// latches INTCAP, and INTF accumulates until cleared by the INTCAP read
/// (IOCON.INTCC = 1) or the GPIO read (INTCC = 0). A DEFVAL mismatch is a
/// level condition and latches again the moment the flags are cleared.
pub struct SimulatedMcp23018 {
    registers: [u8; REGISTER_COUNT],
    inputs: [u8; PORT_COUNT],   // External line levels
    previous: [u8; PORT_COUNT], // Levels at the last evaluation
    host: Option<InterruptSignal>,
}

impl SimulatedMcp23018 {
    /// Power-on state: all inputs, lines idle high
    pub fn new() -> Self {
        let mut registers = [0; REGISTER_COUNT];
        registers[IODIRA as usize] = 0xFF;
        registers[IODIRB as usize] = 0xFF;
        Self {
            registers,
            inputs: [0xFF; PORT_COUNT],
            previous: [0xFF; PORT_COUNT],
            host: None,
        }
    }

    fn reg(&self, port: Port, port_a_register: u8) -> u8 {
        self.registers[port.register(port_a_register) as usize]
    }

    fn control_bit(&self, bit: u8) -> bool {
        self.registers[IOCON as usize] & (1 << bit) != 0
    }

    /// Logical level of every pin of a port
    pub fn levels(&self, port: Port) -> u8 {
        let direction = self.reg(port, IODIRA);
        (self.reg(port, OLATA) & !direction) | (self.inputs[port.index()] & direction)
    }

    pub fn flags(&self, port: Port) -> u8 {
        self.reg(port, INTFA)
    }

    /// Change the external level of one line
    pub fn drive(&mut self, port: Port, pin: u8, level: bool) {
        let input = &mut self.inputs[port.index()];
        if level {
            *input |= 1 << pin;
        } else {
            *input &= !(1 << pin);
        }
        self.evaluate(port);
    }

    fn evaluate(&mut self, port: Port) {
        let levels = self.levels(port);
        let previous = self.previous[port.index()];
        self.previous[port.index()] = levels;

        let enabled = self.reg(port, GPINTENA) & self.reg(port, IODIRA);
        let control = self.reg(port, INTCONA);
        let changed = (levels ^ previous) & !control;
        let mismatched = (levels ^ self.reg(port, DEFVALA)) & control;
        self.latch(port, levels, enabled & (changed | mismatched));
    }

    fn latch(&mut self, port: Port, levels: u8, triggered: u8) {
        if triggered == 0 {
            return;
        }

        trace!("Simulated {:?} triggered {:08b}", port, triggered);
        if self.reg(port, INTFA) == 0 {
            self.registers[port.register(INTCAPA) as usize] = levels;
        }
        self.registers[port.register(INTFA) as usize] |= triggered;
        self.update_line();
    }

    /// State of the INT line wired to the host (INTA, or both ports when
    /// mirrored)
    pub fn interrupt_asserted(&self) -> bool {
        let pending_a = self.flags(Port::A) != 0;
        if self.control_bit(iocon::MIRROR) {
            pending_a || self.flags(Port::B) != 0
        } else {
            pending_a
        }
    }

    fn update_line(&mut self) {
        if !self.interrupt_asserted() {
            return;
        }
        // Host attachment is one-shot
        if let Some(signal) = self.host.take() {
            signal.raise();
        }
    }

    /// Attach the host handler; fires at once if the line is already active
    pub fn attach_host_interrupt(&mut self, signal: InterruptSignal) {
        self.host = Some(signal);
        self.update_line();
    }

    /// Clear a port's flags; a DEFVAL mismatch still present latches again
    fn clear(&mut self, port: Port) {
        self.registers[port.register(INTFA) as usize] = 0;

        let levels = self.levels(port);
        let enabled = self.reg(port, GPINTENA) & self.reg(port, IODIRA);
        let held = enabled & self.reg(port, INTCONA) & (levels ^ self.reg(port, DEFVALA));
        self.latch(port, levels, held);
    }

    fn read(&mut self, register: u8) -> u8 {
        match register {
            GPIOA | GPIOB => {
                let port = if register == GPIOA { Port::A } else { Port::B };
                if !self.control_bit(iocon::INTCC) {
                    self.clear(port);
                }
                self.levels(port)
            }
            INTCAPA | INTCAPB => {
                let port = if register == INTCAPA { Port::A } else { Port::B };
                let value = self.registers[register as usize];
                if self.control_bit(iocon::INTCC) {
                    self.clear(port);
                }
                value
            }
            0x0B => self.registers[IOCON as usize],
            _ if (register as usize) < REGISTER_COUNT => self.registers[register as usize],
            _ => {
                warn!("Simulated read of unknown register 0x{:02x}", register);
                0
            }
        }
    }

    fn write(&mut self, register: u8, value: u8) {
        match register {
            INTFA | INTFB | INTCAPA | INTCAPB => {
                warn!("Write to read-only register 0x{:02x} ignored", register);
            }
            GPIOA => self.registers[OLATA as usize] = value,
            GPIOB => self.registers[OLATB as usize] = value,
            0x0B => self.registers[IOCON as usize] = value,
            _ if (register as usize) < REGISTER_COUNT => self.registers[register as usize] = value,
            _ => warn!("Simulated write of unknown register 0x{:02x}", register),
        }
    }
}

impl Default for SimulatedMcp23018 {
    fn default() -> Self {
        Self::new()
    }
}

/// A bus with simulated expanders at fixed addresses
pub struct SimulatedBus {
    devices: HashMap<u8, SimulatedMcp23018>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
        }
    }

    pub fn with_devices(addresses: &[u8]) -> Self {
        let mut bus = Self::new();
        for &address in addresses {
            bus.add_device(address);
        }
        bus
    }

    pub fn add_device(&mut self, address: u8) {
        self.devices.insert(address, SimulatedMcp23018::new());
    }

    pub fn device(&self, address: u8) -> Option<&SimulatedMcp23018> {
        self.devices.get(&address)
    }

    pub fn device_mut(&mut self, address: u8) -> Option<&mut SimulatedMcp23018> {
        let device = self.devices.get_mut(&address);
        if device.is_none() {
            warn!("No simulated device at 0x{:02x}", address);
        }
        device
    }

    pub fn drive(&mut self, address: u8, port: Port, pin: u8, level: bool) {
        if let Some(device) = self.device_mut(address) {
            device.drive(port, pin, level);
        }
    }

    /// Pending flags of both ports (A low byte)
    pub fn pending(&self, address: u8) -> u16 {
        self.device(address)
            .map(|device| u16::from(device.flags(Port::A)) | (u16::from(device.flags(Port::B)) << 8))
            .unwrap_or(0)
    }

    pub fn attach_host_interrupt(&mut self, address: u8, signal: InterruptSignal) {
        if let Some(device) = self.device_mut(address) {
            device.attach_host_interrupt(signal);
        }
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedBus {
    fn read_register(&mut self, address: u8, register: u8) -> u8 {
        // An absent device reads as a released bus
        self.device_mut(address)
            .map(|device| device.read(register))
            .unwrap_or(0xFF)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) {
        if let Some(device) = self.device_mut(address) {
            device.write(register, value);
        }
    }

    fn read_pair(&mut self, address: u8, register: u8) -> u16 {
        let low = self.read_register(address, register);
        let high = self.read_register(address, register + 1);
        u16::from(low) | (u16::from(high) << 8)
    }

    fn write_pair(&mut self, address: u8, register: u8, value: u16) {
        self.write_register(address, register, value as u8);
        self.write_register(address, register + 1, (value >> 8) as u8);
    }
}

/// Host interrupt pin wired to a simulated expander's INT output
pub struct SimulatedLine {
    bus: SharedI2c<SimulatedBus>,
    address: u8,
    signal: InterruptSignal,
}

impl SimulatedLine {
    pub fn new(bus: SharedI2c<SimulatedBus>, address: u8, signal: InterruptSignal) -> Self {
        Self {
            bus,
            address,
            signal,
        }
    }
}

impl HostInterruptLine for SimulatedLine {
    fn arm(&mut self) {
        let address = self.address;
        let signal = self.signal.clone();
        self.bus
            .transaction(|sim| sim.attach_host_interrupt(address, signal));
    }
}

#[cfg(test)]
mod sim_tests {
    use super::*;
    use crate::isr::interrupt_channel;
    use std::time::Duration;

    fn configured() -> SimulatedMcp23018 {
        let mut device = SimulatedMcp23018::new();
        device.write(IOCON, (1 << iocon::MIRROR) | (1 << iocon::INTPOL) | (1 << iocon::INTCC));
        device
    }

    #[test]
    fn test_change_latches_capture_and_clears_on_read() {
        let mut device = configured();
        device.write(GPINTENA, 0b0000_0011);

        device.drive(Port::A, 1, false);
        device.drive(Port::A, 0, false); // Second event keeps the first capture
        assert_eq!(device.flags(Port::A), 0b0000_0011);
        assert!(device.interrupt_asserted());

        assert_eq!(device.read(INTFA), 0b0000_0011);
        assert_eq!(device.read(INTCAPA), 0b1111_1101);
        assert_eq!(device.flags(Port::A), 0);
        assert!(!device.interrupt_asserted());
    }

    #[test]
    fn test_default_value_comparison() {
        let mut device = configured();
        device.write(GPINTENB, 0b1000_0000);
        device.write(INTCONB, 0b1000_0000);
        device.write(DEFVALB, 0b1000_0000); // Fire while low

        device.drive(Port::B, 7, false);
        assert_eq!(device.flags(Port::B), 0b1000_0000);
        device.read(INTCAPB);

        // Returning high matches DEFVAL again
        device.drive(Port::B, 7, true);
        device.read(INTCAPB);
        assert_eq!(device.flags(Port::B), 0);
    }

    #[test]
    fn test_level_condition_latches_again_after_capture_read() {
        let (signal, wake) = interrupt_channel();
        let mut device = configured();
        device.write(GPINTENA, 0b0000_0001);
        device.write(INTCONA, 0b0000_0001);
        device.write(DEFVALA, 0b0000_0001);

        device.drive(Port::A, 0, false);
        assert_eq!(device.read(INTCAPA), 0b1111_1110);

        // Still low: flagged and captured again, line re-asserted
        assert_eq!(device.flags(Port::A), 0b0000_0001);
        assert!(device.interrupt_asserted());
        device.attach_host_interrupt(signal);
        assert_eq!(wake.wait_timeout(Duration::from_millis(10)), Some(true));

        device.drive(Port::A, 0, true);
        assert_eq!(device.read(INTCAPA), 0b1111_1110);
        assert_eq!(device.flags(Port::A), 0);
        assert!(!device.interrupt_asserted());
    }

    #[test]
    fn test_level_condition_latches_again_after_gpio_read() {
        let mut device = SimulatedMcp23018::new();
        device.write(IOCON, 1 << iocon::MIRROR);
        device.write(GPINTENB, 0b0100_0000);
        device.write(INTCONB, 0b0100_0000);

        // DEFVAL 0: fires while high
        device.drive(Port::B, 6, false);
        device.drive(Port::B, 6, true);
        assert_eq!(device.flags(Port::B), 0b0100_0000);
        device.read(GPIOB);
        assert_eq!(device.flags(Port::B), 0b0100_0000);

        device.drive(Port::B, 6, false);
        device.read(GPIOB);
        assert_eq!(device.flags(Port::B), 0);
    }

    #[test]
    fn test_disabled_and_output_pins_stay_quiet() {
        let mut device = configured();
        device.write(GPINTENA, 0b0000_0100);
        device.write(IODIRA, 0b1111_1011);
        device.drive(Port::A, 2, false);
        device.drive(Port::A, 3, false);
        assert_eq!(device.flags(Port::A), 0);
    }

    #[test]
    fn test_host_attachment_is_one_shot() {
        let (signal, wake) = interrupt_channel();
        let mut device = configured();
        device.write(GPINTENB, 0b0000_0001);
        device.attach_host_interrupt(signal.clone());

        device.drive(Port::B, 0, false);
        assert_eq!(wake.wait_timeout(Duration::from_millis(10)), Some(true));

        // Still pending and detached: nothing new until re-armed
        device.drive(Port::B, 0, true);
        assert_eq!(wake.wait_timeout(Duration::from_millis(10)), None);
        device.attach_host_interrupt(signal);
        assert_eq!(wake.wait_timeout(Duration::from_millis(10)), Some(true));
    }

    #[test]
    fn test_unmirrored_line_follows_port_a_only() {
        let mut device = SimulatedMcp23018::new();
        device.write(GPINTENB, 0xFF);
        device.drive(Port::B, 3, false);
        assert_eq!(device.flags(Port::B), 0b0000_1000);
        assert!(!device.interrupt_asserted());
    }
}
