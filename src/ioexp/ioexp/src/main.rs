extern crate clap;
use crossbeam_channel::bounded; // Inter-thread communication
use log::{error, info};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ioexp_core::constants::DEFAULT_ADDRESS;
use ioexp_core::{InterruptMode, PinMode, Port, SharedBus};
use ioexp_peripherals::sim::{SimulatedBus, SimulatedLine};
use ioexp_peripherals::{
    interrupt_channel, spawn_service_task, ExpanderConfig, ExpanderController, SharedI2c,
};

type Bus = SharedI2c<SimulatedBus>;

// Time-of-flight sensor shutdown lines on expander A, port A
const TOF_SHUTDOWN_PINS: [u8; 4] = [0, 1, 2, 3];
// Buttons on expander A, port B
const BUTTON_PINS: [u8; 4] = [0, 1, 2, 3];
// Quadrature encoder channels on expander B, port A
const ENCODER_A: u8 = 0;
const ENCODER_B: u8 = 1;

/// Configures command-line interface using clap
fn get_cli_config<'a>() -> clap::ArgMatches<'a> {
    let description = "Interrupt multiplexing over two MCP23018 I/O expanders (simulated bus)";
    clap::App::new("I/O expander interrupt demo")
        .version("0.1")
        .about(description)
        .arg(
            clap::Arg::with_name("address-a")
                .long("address-a")
                .takes_value(true)
                .help("Bus address of expander A (hex)"),
        )
        .arg(
            clap::Arg::with_name("address-b")
                .long("address-b")
                .takes_value(true)
                .help("Bus address of expander B (hex)"),
        )
        .arg(
            clap::Arg::with_name("period")
                .long("period")
                .takes_value(true)
                .default_value("250")
                .help("Stimulus period in milliseconds"),
        )
        .subcommand(clap::SubCommand::with_name("buttons").help("Press the buttons in turn"))
        .subcommand(clap::SubCommand::with_name("encoder").help("Turn the encoder back and forth"))
        .get_matches()
}

fn parse_address(text: Option<&str>, default: u8) -> Result<u8, String> {
    match text {
        None => Ok(default),
        Some(text) => {
            let digits = text.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(digits, 16).map_err(|e| format!("bad address {:?}: {}", text, e))
        }
    }
}

fn start_expander(bus: &Bus, config: ExpanderConfig) -> Option<ExpanderController<Bus>> {
    let controller = ExpanderController::new(bus.clone(), &config);
    let (signal, wake) = interrupt_channel();
    let line = SimulatedLine::new(bus.clone(), config.address, signal);
    match spawn_service_task(&config, controller.clone(), wake, line) {
        Ok(_) => Some(controller),
        Err(e) => {
            error!("{}: worker spawn failed: {:?}", config.name, e);
            None
        }
    }
}

fn setup_tof_shutdown(expander: &ExpanderController<Bus>) {
    for &pin in TOF_SHUTDOWN_PINS.iter() {
        let result = expander
            .pin_mode(Port::A, pin, PinMode::Output)
            .and_then(|_| expander.digital_write(Port::A, pin, true));
        if let Err(e) = result {
            error!("ToF shutdown pin {}: {}", pin, e);
        }
    }
}

fn setup_buttons(expander: &ExpanderController<Bus>) {
    for &pin in BUTTON_PINS.iter() {
        let result = expander.attach_interrupt(
            Port::B,
            pin,
            move || info!("Button {} pressed", pin),
            InterruptMode::Falling,
        );
        if let Err(e) = result {
            error!("Button {}: {}", pin, e);
        }
    }
}

fn setup_encoder(expander: &ExpanderController<Bus>) -> Arc<AtomicI32> {
    let position = Arc::new(AtomicI32::new(0));
    let counter = Arc::clone(&position);
    let handle = expander.clone();
    let result = expander.attach_interrupt(
        Port::A,
        ENCODER_A,
        move || {
            let a = handle.digital_read(Port::A, ENCODER_A);
            let b = handle.digital_read(Port::A, ENCODER_B);
            if let (Ok(a), Ok(b)) = (a, b) {
                let step = if a != b { 1 } else { -1 };
                let now = counter.fetch_add(step, Ordering::SeqCst) + step;
                info!("Encoder position {}", now);
            }
        },
        InterruptMode::Change,
    );
    if let Err(e) = result {
        error!("Encoder: {}", e);
    }
    position
}

// Quadrature sequence (A, B), clockwise
const QUADRATURE: [(bool, bool); 4] = [(false, false), (true, false), (true, true), (false, true)];

/// Main entry point for the expander demo
fn main() {
    env_logger::init();

    // Set up Ctrl-C handler with channel communication
    let (signal_sender, signal_receiver) = bounded(1);
    let handler_result = ctrlc::set_handler(move || {
        if signal_sender.is_full() {
            std::process::exit(-1); // Second Ctrl-C forces exit
        }
        let _send_result = signal_sender.send(());
    });

    if let Err(e) = handler_result {
        error!("Signal handler failed: {:?}", e);
        return;
    }

    let cli_matches = get_cli_config();
    let subcommand = cli_matches.subcommand_name();
    match subcommand {
        Some("buttons") | Some("encoder") => {}
        _ => {
            error!("No stimulus selected (buttons or encoder)");
            return;
        }
    }

    let addresses = (
        parse_address(cli_matches.value_of("address-a"), DEFAULT_ADDRESS),
        parse_address(cli_matches.value_of("address-b"), DEFAULT_ADDRESS + 1),
    );
    let (address_a, address_b) = match addresses {
        (Ok(a), Ok(b)) if a != b => (a, b),
        (Ok(a), Ok(_)) => {
            error!("Both expanders at 0x{:02x}", a);
            return;
        }
        (Err(e), _) | (_, Err(e)) => {
            error!("{}", e);
            return;
        }
    };
    let period = match cli_matches.value_of("period").map(str::parse::<u64>) {
        Some(Ok(ms)) if ms > 0 => Duration::from_millis(ms),
        _ => {
            error!("Invalid period");
            return;
        }
    };

    let bus = SharedI2c::new(SimulatedBus::with_devices(&[address_a, address_b]));
    let expander_a = match start_expander(&bus, ExpanderConfig::new("expander A", address_a)) {
        Some(controller) => controller,
        None => return,
    };
    let expander_b = match start_expander(&bus, ExpanderConfig::new("expander B", address_b)) {
        Some(controller) => controller,
        None => return,
    };

    setup_tof_shutdown(&expander_a);
    setup_buttons(&expander_a);
    let position = setup_encoder(&expander_b);

    // Stimulus loop: act on the simulated lines until Ctrl-C
    let mut step: usize = 0;
    loop {
        if !signal_receiver.is_empty() {
            break;
        }

        match subcommand {
            Some("buttons") => {
                let pin = BUTTON_PINS[(step / 2) % BUTTON_PINS.len()];
                let pressed = step % 2 == 0;
                bus.transaction(|sim| sim.drive(address_a, Port::B, pin, !pressed));
            }
            _ => {
                // Eight steps clockwise, eight back
                let phase = if (step / 8) % 2 == 0 { step % 4 } else { 3 - step % 4 };
                let (a, b) = QUADRATURE[phase];
                bus.transaction(|sim| {
                    sim.drive(address_b, Port::A, ENCODER_B, b);
                    sim.drive(address_b, Port::A, ENCODER_A, a);
                });
            }
        }

        step = step.wrapping_add(1);
        std::thread::sleep(period);
    }

    info!(
        "Shutting down, encoder at {}",
        position.load(Ordering::SeqCst)
    );
}
