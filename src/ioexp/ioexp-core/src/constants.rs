// Expander geometry
pub const PORT_COUNT: usize = 2;
pub const PORT_PIN_COUNT: usize = 8;
pub const MAX_PENDING: usize = PORT_COUNT * PORT_PIN_COUNT;

// Factory strapping of the address pin (ADDR tied low)
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// MCP23018 register offsets with IOCON.BANK = 0.
///
/// Port B registers sit at the port A offset plus one, so a paired
/// (16-bit) access addressed at the A offset covers both ports.
pub mod registers {
    pub const IODIRA: u8 = 0x00; // Direction (1 = input)
    pub const IODIRB: u8 = 0x01;
    pub const IPOLA: u8 = 0x02; // Input polarity
    pub const IPOLB: u8 = 0x03;
    pub const GPINTENA: u8 = 0x04; // Interrupt-on-change enable
    pub const GPINTENB: u8 = 0x05;
    pub const DEFVALA: u8 = 0x06; // Default compare value
    pub const DEFVALB: u8 = 0x07;
    pub const INTCONA: u8 = 0x08; // Comparison source (1 = DEFVAL, 0 = previous)
    pub const INTCONB: u8 = 0x09;
    pub const IOCON: u8 = 0x0A; // Device control (mirrored at 0x0B)
    pub const GPPUA: u8 = 0x0C; // Pull-up enable
    pub const GPPUB: u8 = 0x0D;
    pub const INTFA: u8 = 0x0E; // Interrupt flags (read-only)
    pub const INTFB: u8 = 0x0F;
    pub const INTCAPA: u8 = 0x10; // Interrupt capture (read-only)
    pub const INTCAPB: u8 = 0x11;
    pub const GPIOA: u8 = 0x12; // Port state
    pub const GPIOB: u8 = 0x13;
    pub const OLATA: u8 = 0x14; // Output latch
    pub const OLATB: u8 = 0x15;

    pub const REGISTER_COUNT: usize = 0x16;
}

/// Bit positions inside IOCON
pub mod iocon {
    pub const BANK: u8 = 7;
    pub const MIRROR: u8 = 6; // INTA/INTB internally connected
    pub const SEQOP: u8 = 5; // 1 disables address auto-increment
    pub const ODR: u8 = 2;
    pub const INTPOL: u8 = 1; // 1 = INT pins active-high
    pub const INTCC: u8 = 0; // 1 = reading INTCAP clears the interrupt
}

/// Numeric trigger mode codes accepted by `InterruptMode::from_code`
pub mod interrupt_modes {
    pub const DISABLED: u8 = 0x00;
    pub const RISING: u8 = 0x01;
    pub const FALLING: u8 = 0x02;
    pub const CHANGE: u8 = 0x03;
    pub const ONLOW: u8 = 0x04;
    pub const ONHIGH: u8 = 0x05;
    pub const ONLOW_WE: u8 = 0x0C;
    pub const ONHIGH_WE: u8 = 0x0D;
}

/// Numeric pin mode codes accepted by `PinMode::from_code`
pub mod pin_modes {
    pub const INPUT: u8 = 0x01;
    pub const OUTPUT: u8 = 0x03;
    pub const INPUT_PULLUP: u8 = 0x05;
}
