use crossbeam_channel::{unbounded, Receiver, Sender};
use ioexp_core::{InterruptMode, Port, SharedBus};
use ioexp_peripherals::sim::{SimulatedBus, SimulatedLine};
use ioexp_peripherals::{
    interrupt_channel, spawn_service_task, ExpanderConfig, ExpanderController, SharedI2c,
};
use std::thread;
use std::time::Duration;

const ADDRESS_A: u8 = 0x20;
const ADDRESS_B: u8 = 0x21;
const TIMEOUT: Duration = Duration::from_secs(1);

type Bus = SharedI2c<SimulatedBus>;

struct Rig {
    bus: Bus,
    a: ExpanderController<Bus>,
    b: ExpanderController<Bus>,
}

fn start_worker(bus: &Bus, config: ExpanderConfig) -> ExpanderController<Bus> {
    let controller = ExpanderController::new(bus.clone(), &config);
    let (signal, wake) = interrupt_channel();
    let line = SimulatedLine::new(bus.clone(), config.address, signal);
    spawn_service_task(&config, controller.clone(), wake, line).unwrap();
    controller
}

fn init_rig() -> Rig {
    let _ = env_logger::builder().is_test(true).try_init();
    let bus = SharedI2c::new(SimulatedBus::with_devices(&[ADDRESS_A, ADDRESS_B]));
    let a = start_worker(&bus, ExpanderConfig::new("expander A", ADDRESS_A));
    let b = start_worker(&bus, ExpanderConfig::new("expander B", ADDRESS_B));
    Rig { bus, a, b }
}

impl Rig {
    fn drive(&self, address: u8, port: Port, pin: u8, level: bool) {
        self.bus
            .transaction(|sim| sim.drive(address, port, pin, level));
    }

    fn wait_serviced(&self, address: u8) {
        for _ in 0..1000 {
            if self.bus.transaction(|sim| sim.pending(address)) == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("0x{:02x} still pending", address);
    }
}

fn events() -> (Sender<&'static str>, Receiver<&'static str>) {
    unbounded()
}

#[test]
fn test_falling_edge_reaches_callback() {
    let rig = init_rig();
    let (tx, rx) = events();
    rig.a
        .attach_interrupt(Port::A, 0, move || tx.send("a0").unwrap(), InterruptMode::Falling)
        .unwrap();

    rig.drive(ADDRESS_A, Port::A, 0, false);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("a0"));
}

#[test]
fn test_wrong_edge_is_ignored() {
    let rig = init_rig();
    let (tx, rx) = events();
    rig.a
        .attach_interrupt(Port::B, 2, move || tx.send("b2").unwrap(), InterruptMode::Rising)
        .unwrap();

    rig.drive(ADDRESS_A, Port::B, 2, false);
    rig.wait_serviced(ADDRESS_A);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    rig.drive(ADDRESS_A, Port::B, 2, true);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("b2"));
}

#[test]
fn test_expanders_are_serviced_independently() {
    let rig = init_rig();
    let (tx, rx) = events();
    let tx_b = tx.clone();
    rig.a
        .attach_interrupt(Port::A, 1, move || tx.send("a").unwrap(), InterruptMode::Change)
        .unwrap();
    rig.b
        .attach_interrupt(Port::B, 3, move || tx_b.send("b").unwrap(), InterruptMode::Change)
        .unwrap();

    rig.drive(ADDRESS_B, Port::B, 3, false);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("b"));
    rig.drive(ADDRESS_A, Port::A, 1, false);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("a"));

    // Same pin number on the other expander stays quiet
    rig.drive(ADDRESS_B, Port::A, 1, false);
    rig.wait_serviced(ADDRESS_B);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_callback_detaching_itself_runs_once() {
    let rig = init_rig();
    let (tx, rx) = events();
    let handle = rig.b.clone();
    rig.b
        .attach_interrupt(
            Port::A,
            7,
            move || {
                handle.detach_interrupt(Port::A, 7).unwrap();
                tx.send("once").unwrap();
            },
            InterruptMode::Change,
        )
        .unwrap();

    rig.drive(ADDRESS_B, Port::A, 7, false);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("once"));
    assert_eq!(rig.b.interrupt_mode(Port::A, 7), Ok(InterruptMode::Disabled));

    rig.drive(ADDRESS_B, Port::A, 7, true);
    rig.wait_serviced(ADDRESS_B);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn test_level_mode_repeats_while_held() {
    let rig = init_rig();
    let (tx, rx) = events();
    rig.a
        .attach_interrupt(Port::A, 4, move || tx.send("low").unwrap(), InterruptMode::OnLow)
        .unwrap();

    // Each capture read re-latches the condition, so service cycles repeat
    rig.drive(ADDRESS_A, Port::A, 4, false);
    for _ in 0..3 {
        assert_eq!(rx.recv_timeout(TIMEOUT), Ok("low"));
    }

    rig.drive(ADDRESS_A, Port::A, 4, true);
    rig.wait_serviced(ADDRESS_A);
    // Cycles already past the capture read may still report
    while rx.recv_timeout(Duration::from_millis(50)).is_ok() {}
    assert_eq!(rig.bus.transaction(|sim| sim.pending(ADDRESS_A)), 0);
    assert_eq!(rig.a.interrupt_mode(Port::A, 4), Ok(InterruptMode::OnLow));
}

#[test]
fn test_panicking_callback_keeps_worker_alive() {
    let rig = init_rig();
    let (tx, rx) = events();
    rig.a
        .attach_interrupt(Port::A, 0, || panic!("callback failure"), InterruptMode::Change)
        .unwrap();
    rig.a
        .attach_interrupt(Port::A, 1, move || tx.send("a1").unwrap(), InterruptMode::Change)
        .unwrap();

    rig.drive(ADDRESS_A, Port::A, 0, false);
    rig.wait_serviced(ADDRESS_A);
    rig.drive(ADDRESS_A, Port::A, 1, false);
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("a1"));

    // Both flagged in one cycle: pin 0 panics first, pin 1 still runs
    rig.bus.transaction(|sim| {
        sim.drive(ADDRESS_A, Port::A, 0, true);
        sim.drive(ADDRESS_A, Port::A, 1, true);
    });
    assert_eq!(rx.recv_timeout(TIMEOUT), Ok("a1"));
}
