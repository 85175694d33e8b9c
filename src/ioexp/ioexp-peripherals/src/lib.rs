pub mod bus;
pub mod callback;
pub mod config;
pub mod controller;
pub mod isr;
#[cfg(any(test, feature = "simulated"))]
pub mod sim;
pub mod worker;

pub use bus::SharedI2c;
pub use callback::Callback;
pub use config::ExpanderConfig;
pub use controller::ExpanderController;
pub use isr::{interrupt_channel, HostInterruptLine, InterruptSignal, InterruptWake};
pub use worker::spawn_service_task;
