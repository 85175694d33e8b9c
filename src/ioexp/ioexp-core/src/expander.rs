use crate::bus::SharedBus;
use crate::constants::{iocon, registers};
use crate::decoder::{service_interrupts, Dispatch};
use crate::device::Mcp23018;
use crate::error::Error;
use crate::pin::{check_pin, InterruptMode, PinMode, Port};
use crate::registry::{HandlerTable, InterruptHandler};
use log::{debug, error, trace, warn};

/// Interrupt-multiplexing driver for one MCP23018
///
/// Owns the handler tables of both ports. The bus handle `S` is shared with
/// every other user of the same physical bus.
pub struct IoExpander<S, H> {
    device: Mcp23018<S>,
    handlers: [HandlerTable<H>; 2],
}

impl<S: SharedBus, H> IoExpander<S, H> {
    /// Bring the device into interrupt-multiplexing configuration
    ///
    /// Both INT pins mirrored onto one line, active-high, cleared by the
    /// capture read; every pin an input with pull-up and no interrupt.
    pub fn new(bus: S, address: u8) -> Self {
        let device = Mcp23018::new(bus, address);
        device.begin();

        device.set_control_bit(iocon::MIRROR, true);
        device.set_control_bit(iocon::INTPOL, true);
        device.set_control_bit(iocon::INTCC, true);

        device.set_directions(0xFF, 0xFF);
        device.set_pullups(0xFF, 0xFF);
        device.write_pair(registers::GPINTENA, 0x00, 0x00);

        debug!("I/O expander 0x{:02x} configured", address);
        Self {
            device,
            handlers: [HandlerTable::new(), HandlerTable::new()],
        }
    }

    pub fn address(&self) -> u8 {
        self.device.address()
    }

    /// Read-only view of a port's handler table
    pub fn handlers(&self, port: Port) -> &HandlerTable<H> {
        &self.handlers[port.index()]
    }

    fn validate(&self, port: Port, pin: u8) -> Result<u8, Error> {
        check_pin(pin).map_err(|err| {
            error!(
                "Invalid pin {} on port {:?} of expander 0x{:02x}",
                pin,
                port,
                self.address()
            );
            err
        })
    }

    /// Register `handler` for `pin` and arm its interrupt
    ///
    /// `Disabled` behaves as `detach_interrupt`. Re-attaching an active pin
    /// replaces its handler and reprograms the comparison source.
    pub fn attach_interrupt(
        &mut self,
        port: Port,
        pin: u8,
        handler: H,
        mode: InterruptMode,
    ) -> Result<(), Error> {
        let comparison = match mode.comparison() {
            Some(comparison) => comparison,
            None => return self.detach_interrupt(port, pin),
        };
        let pin = self.validate(port, pin)?;

        self.handlers[port.index()].register(pin, handler, mode)?;
        self.device.arm_pin(port, pin, comparison);

        debug!("Attached {:?} interrupt on {:?}{}", mode, port, pin);
        Ok(())
    }

    /// `attach_interrupt` taking a raw trigger mode code
    ///
    /// An unknown code is rejected before anything is touched: the pin is
    /// neither registered nor armed.
    pub fn attach_interrupt_code(
        &mut self,
        port: Port,
        pin: u8,
        handler: H,
        code: u8,
    ) -> Result<(), Error> {
        match InterruptMode::from_code(code) {
            Ok(mode) => self.attach_interrupt(port, pin, handler, mode),
            Err(err) => {
                self.validate(port, pin)?;
                warn!(
                    "Unsupported interrupt mode 0x{:02x} for {:?}{}, pin left disarmed",
                    code, port, pin
                );
                Err(err)
            }
        }
    }

    /// Disarm `pin` and clear its handler; detaching twice is harmless
    pub fn detach_interrupt(&mut self, port: Port, pin: u8) -> Result<(), Error> {
        let pin = self.validate(port, pin)?;

        self.device.disarm_pin(port, pin);
        self.handlers[port.index()].reset(pin)?;

        debug!("Detached interrupt on {:?}{}", port, pin);
        Ok(())
    }

    pub fn pin_mode(&mut self, port: Port, pin: u8, mode: PinMode) -> Result<(), Error> {
        let pin = self.validate(port, pin)?;
        let (input, pullup) = mode.register_bits();
        self.device.configure_pin(port, pin, input, pullup);
        Ok(())
    }

    /// `pin_mode` taking a raw pin mode code
    pub fn pin_mode_code(&mut self, port: Port, pin: u8, code: u8) -> Result<(), Error> {
        let pin = self.validate(port, pin)?;
        match PinMode::from_code(code) {
            Ok(mode) => self.pin_mode(port, pin, mode),
            Err(err) => {
                error!("Unknown pin mode 0x{:02x} for {:?}{}", code, port, pin);
                Err(err)
            }
        }
    }

    pub fn digital_read(&self, port: Port, pin: u8) -> Result<bool, Error> {
        let pin = self.validate(port, pin)?;
        let bits = self.device.port_state(port);
        Ok((bits >> pin) & 1 != 0)
    }

    pub fn digital_write(&self, port: Port, pin: u8, state: bool) -> Result<(), Error> {
        let pin = self.validate(port, pin)?;
        self.device.set_pin(port, pin, state);
        Ok(())
    }

    /// Read the snapshot and select the handlers to run, without running them
    pub fn collect_interrupts(&self) -> Dispatch<H>
    where
        H: Clone,
    {
        let snapshot = self.device.read_snapshot();
        let mut dispatch = Dispatch::new();
        for port in Port::ALL {
            let (flags, captures) = snapshot.port(port);
            dispatch.collect(port, flags, captures, &self.handlers[port.index()]);
        }
        trace!(
            "Expander 0x{:02x}: {} handler(s) pending",
            self.address(),
            dispatch.len()
        );
        dispatch
    }

    /// Service one interrupt: snapshot under the bus lock, then port A
    /// pins ascending, then port B pins ascending
    ///
    /// Returns the number of handlers invoked.
    pub fn on_interrupt(&self) -> usize
    where
        H: InterruptHandler,
    {
        let snapshot = self.device.read_snapshot();
        Port::ALL
            .iter()
            .map(|&port| {
                let (flags, captures) = snapshot.port(port);
                service_interrupts(flags, captures, &self.handlers[port.index()])
            })
            .sum()
    }
}
