/// Register-level transport to devices on the shared bus
///
/// Implemented outside this crate (I2C driver, simulator, test mock).
/// Failures are not reported: every access is best-effort.
pub trait RegisterBus {
    /// Read one 8-bit register
    fn read_register(&mut self, address: u8, register: u8) -> u8;
    fn write_register(&mut self, address: u8, register: u8, value: u8);

    /// Read `register` and `register + 1` in one transaction (low byte first)
    fn read_pair(&mut self, address: u8, register: u8) -> u16;
    fn write_pair(&mut self, address: u8, register: u8, value: u16);

    /// Read-modify-write of a single bit
    fn set_bit(&mut self, address: u8, register: u8, bit: u8, state: bool) {
        let current = self.read_register(address, register);
        let value = if state {
            current | (1 << bit)
        } else {
            current & !(1 << bit)
        };
        self.write_register(address, register, value);
    }
}

/// Mutual exclusion over a `RegisterBus` shared by every device on it
///
/// A transaction holds the lock for the whole closure, so multi-register
/// sequences are atomic with respect to other bus users.
pub trait SharedBus {
    type Bus: RegisterBus;

    fn transaction<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Self::Bus) -> R;
}

/// Single-context sharing (bare-metal main loop, tests)
impl<B: RegisterBus> SharedBus for core::cell::RefCell<B> {
    type Bus = B;

    fn transaction<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut B) -> R,
    {
        let mut bus = self.borrow_mut();
        f(&mut *bus)
    }
}

impl<T: SharedBus + ?Sized> SharedBus for &T {
    type Bus = T::Bus;

    fn transaction<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Self::Bus) -> R,
    {
        (**self).transaction(f)
    }
}
