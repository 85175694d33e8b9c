use crate::config::ExpanderConfig;
use crate::controller::ExpanderController;
use crate::isr::{HostInterruptLine, InterruptWake};
use ioexp_core::SharedBus;
use log::{debug, trace};
use std::io;
use std::thread::{self, JoinHandle};

// Bottom half: one wake, one service cycle, then hand the line back
fn service_loop<S, L>(controller: ExpanderController<S>, wake: InterruptWake, mut line: L)
where
    S: SharedBus,
    L: HostInterruptLine,
{
    line.arm();
    while wake.wait() {
        let dispatched = controller.on_interrupt();
        trace!("{}: serviced, {} callback(s)", controller.name(), dispatched);
        line.arm();
    }
    debug!("{}: interrupt signal dropped, worker exiting", controller.name());
}

/// Spawn the dedicated service thread of one expander
///
/// The thread arms `line`, then services one interrupt per wake from the
/// matching `InterruptSignal`. It exits once every signal is dropped.
pub fn spawn_service_task<S, L>(
    config: &ExpanderConfig,
    controller: ExpanderController<S>,
    wake: InterruptWake,
    line: L,
) -> io::Result<JoinHandle<()>>
where
    S: SharedBus + Send + 'static,
    L: HostInterruptLine + 'static,
{
    let mut builder = thread::Builder::new().name(config.name.clone());
    if let Some(size) = config.worker_stack_size {
        builder = builder.stack_size(size);
    }
    debug!("{}: starting worker for 0x{:02x}", config.name, config.address);
    builder.spawn(move || service_loop(controller, wake, line))
}

#[cfg(test)]
mod worker_tests {
    use super::*;
    use crate::bus::SharedI2c;
    use crate::isr::interrupt_channel;
    use crate::sim::{SimulatedBus, SimulatedLine};
    use crossbeam_channel::bounded;
    use ioexp_core::{InterruptMode, Port};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingLine(Arc<AtomicUsize>);

    impl HostInterruptLine for CountingLine {
        fn arm(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn init_bus(address: u8) -> SharedI2c<SimulatedBus> {
        let _ = env_logger::builder().is_test(true).try_init();
        SharedI2c::new(SimulatedBus::with_devices(&[address]))
    }

    // Wait for the worker to consume whatever is latched
    fn wait_serviced(bus: &SharedI2c<SimulatedBus>, address: u8) {
        for _ in 0..1000 {
            if bus.transaction(|sim| sim.pending(address)) == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("interrupt at 0x{:02x} never serviced", address);
    }

    #[test]
    fn test_worker_runs_callbacks() {
        let config = ExpanderConfig::new("worker-test", 0x20);
        let bus = init_bus(config.address);
        let controller = ExpanderController::new(bus.clone(), &config);

        let (tx, rx) = bounded(4);
        controller
            .attach_interrupt(Port::B, 6, move || tx.send(()).unwrap(), InterruptMode::Falling)
            .unwrap();

        let (signal, wake) = interrupt_channel();
        let line = SimulatedLine::new(bus.clone(), config.address, signal);
        spawn_service_task(&config, controller, wake, line).unwrap();

        bus.transaction(|sim| sim.drive(0x20, Port::B, 6, false));
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());
        bus.transaction(|sim| sim.drive(0x20, Port::B, 6, true));
        wait_serviced(&bus, 0x20);
        assert!(rx.try_recv().is_err());
        bus.transaction(|sim| sim.drive(0x20, Port::B, 6, false));
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_worker_rearms_after_each_wake_and_exits() {
        let mut config = ExpanderConfig::new("worker-exit", 0x21);
        config.worker_stack_size = Some(64 * 1024);
        let controller = ExpanderController::new(init_bus(config.address), &config);

        let arms = Arc::new(AtomicUsize::new(0));
        let (signal, wake) = interrupt_channel();
        let worker =
            spawn_service_task(&config, controller, wake, CountingLine(Arc::clone(&arms))).unwrap();

        // Spurious wake: nothing pending, the line is still re-armed
        assert!(signal.raise());
        drop(signal);
        worker.join().unwrap();
        assert_eq!(arms.load(Ordering::SeqCst), 2);
    }
}
