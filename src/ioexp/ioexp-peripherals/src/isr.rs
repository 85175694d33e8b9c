use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Create the single-slot wake channel between top and bottom half
pub fn interrupt_channel() -> (InterruptSignal, InterruptWake) {
    let (tx, rx) = bounded(1);
    (InterruptSignal { tx }, InterruptWake { rx })
}

/// Top half: what the host interrupt handler calls
///
/// Never blocks and never touches the bus. Signals raised while a wake is
/// already pending are absorbed.
#[derive(Clone)]
pub struct InterruptSignal {
    tx: Sender<()>,
}

impl InterruptSignal {
    /// Returns false when the wake was coalesced into one already pending
    /// (or nobody is listening any more)
    pub fn raise(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.tx.is_full()
    }
}

/// Bottom-half side of the wake channel
pub struct InterruptWake {
    rx: Receiver<()>,
}

impl InterruptWake {
    /// Block until woken; false once every `InterruptSignal` is gone
    pub fn wait(&self) -> bool {
        self.rx.recv().is_ok()
    }

    /// `wait` with an upper bound; `None` on timeout
    pub fn wait_timeout(&self, timeout: Duration) -> Option<bool> {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => Some(true),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(false),
        }
    }
}

/// Host-side attachment of the expander's INT line
///
/// The attachment is one-shot (level triggered, detaches itself on firing),
/// so the worker calls `arm` again after every service cycle, once the
/// capture read has released the line.
pub trait HostInterruptLine: Send {
    fn arm(&mut self);
}
