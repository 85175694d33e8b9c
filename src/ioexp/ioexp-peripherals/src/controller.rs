use crate::callback::Callback;
use crate::config::ExpanderConfig;
use ioexp_core::{Error, InterruptMode, IoExpander, PinMode, Port, SharedBus};
use log::{error, trace};
use std::sync::{Arc, Mutex, MutexGuard};

/// Thread-safe handle on one expander
///
/// Configuration calls may come from any thread, including from inside a
/// callback. Lock order is controller then bus; callbacks run with neither
/// held.
pub struct ExpanderController<S> {
    name: Arc<str>,
    inner: Arc<Mutex<IoExpander<S, Callback>>>,
}

impl<S> Clone for ExpanderController<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SharedBus> ExpanderController<S> {
    pub fn new(bus: S, config: &ExpanderConfig) -> Self {
        Self {
            name: Arc::from(config.name.as_str()),
            inner: Arc::new(Mutex::new(IoExpander::new(bus, config.address))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, IoExpander<S, Callback>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            error!("{}: controller lock poisoned, recovering", self.name);
            poisoned.into_inner()
        })
    }

    pub fn attach_interrupt<F>(
        &self,
        port: Port,
        pin: u8,
        callback: F,
        mode: InterruptMode,
    ) -> Result<(), Error>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock()
            .attach_interrupt(port, pin, Callback::new(callback), mode)
    }

    pub fn attach_interrupt_code<F>(
        &self,
        port: Port,
        pin: u8,
        callback: F,
        code: u8,
    ) -> Result<(), Error>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock()
            .attach_interrupt_code(port, pin, Callback::new(callback), code)
    }

    pub fn detach_interrupt(&self, port: Port, pin: u8) -> Result<(), Error> {
        self.lock().detach_interrupt(port, pin)
    }

    /// Trigger mode currently registered for a pin
    pub fn interrupt_mode(&self, port: Port, pin: u8) -> Result<InterruptMode, Error> {
        let expander = self.lock();
        let entry = expander.handlers(port).entry(pin)?;
        Ok(entry.mode())
    }

    pub fn pin_mode(&self, port: Port, pin: u8, mode: PinMode) -> Result<(), Error> {
        self.lock().pin_mode(port, pin, mode)
    }

    pub fn pin_mode_code(&self, port: Port, pin: u8, code: u8) -> Result<(), Error> {
        self.lock().pin_mode_code(port, pin, code)
    }

    pub fn digital_read(&self, port: Port, pin: u8) -> Result<bool, Error> {
        self.lock().digital_read(port, pin)
    }

    pub fn digital_write(&self, port: Port, pin: u8, state: bool) -> Result<(), Error> {
        self.lock().digital_write(port, pin, state)
    }

    /// Bottom half of one interrupt: snapshot and select under the
    /// controller lock, then release it and run the callbacks
    pub fn on_interrupt(&self) -> usize {
        let dispatch = self.lock().collect_interrupts();
        if dispatch.is_empty() {
            trace!("{}: nothing to dispatch", self.name);
            return 0;
        }
        trace!("{}: dispatching {} callback(s)", self.name, dispatch.len());
        dispatch.run()
    }
}
