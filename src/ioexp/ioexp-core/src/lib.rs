#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod constants;
pub mod decoder;
pub mod device;
pub mod error;
pub mod expander;
pub mod pin;
pub mod registry;

pub use bus::{RegisterBus, SharedBus};
pub use decoder::{Dispatch, InterruptSnapshot};
pub use device::Mcp23018;
pub use error::Error;
pub use expander::IoExpander;
pub use pin::{InterruptMode, PinMode, Port};
pub use registry::{HandlerEntry, HandlerTable, InterruptHandler};
