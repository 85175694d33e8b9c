use ioexp_core::{RegisterBus, SharedBus};
use log::error;
use std::sync::{Arc, Mutex};

/// Bus handle shared by every device driver on one physical I2C bus
///
/// Clones refer to the same lock; a transaction holds it for its whole
/// closure.
pub struct SharedI2c<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedI2c<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: RegisterBus> SharedI2c<B> {
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }
}

impl<B: RegisterBus> SharedBus for SharedI2c<B> {
    type Bus = B;

    fn transaction<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut B) -> R,
    {
        let mut bus = self.inner.lock().unwrap_or_else(|poisoned| {
            error!("Bus lock poisoned by a panicking holder, recovering");
            poisoned.into_inner()
        });
        f(&mut *bus)
    }
}
