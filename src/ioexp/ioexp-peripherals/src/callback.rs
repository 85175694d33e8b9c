use ioexp_core::InterruptHandler;
use log::error;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Boxed interrupt callback with its context captured by the closure
///
/// A panic inside the closure is caught and logged, so one faulty callback
/// leaves the worker, and every other pin on the expander, in service.
#[derive(Clone)]
pub struct Callback(Arc<dyn Fn() + Send + Sync>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Callback(Arc::new(f))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl InterruptHandler for Callback {
    fn handle(&self) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| (self.0)())) {
            error!(
                "Interrupt callback {:?} panicked: {}",
                self,
                panic_message(payload.as_ref())
            );
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0))
    }
}
