use std::env;

use inquire::Select;
use rigol_dp7xx::psu::Dp7xx;
use rigol_dp7xx::pacer::StdClock;
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
const SERIAL_TIMEOUT_MS: u64 = 1000;
const OUTPUT_VOLTAGE_V: f32 = 5.0;
const CURRENT_LIMIT_A: f32 = 0.1;
const OVP_LEVEL_V: f32 = 12.0;
const OCP_LEVEL_A: f32 = 0.5;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            // A serial read timing out is what tells the driver no reply came.
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    // Connecting identifies the PSU, runs its self test and reads its limits.
    let mut psu: Dp7xx<PortWrapper, StdClock> =
        Dp7xx::connect(PortWrapper(port)).expect("Failed to connect to PSU");
    println!("{}", psu);

    psu.set_voltage(OUTPUT_VOLTAGE_V).unwrap();
    psu.set_current(CURRENT_LIMIT_A).unwrap();
    println!(
        "Setpoints: {}V {}A",
        psu.get_voltage().unwrap(),
        psu.get_current().unwrap()
    );

    println!("\n--- Protection ---");
    psu.set_ovp_level(OVP_LEVEL_V).unwrap();
    psu.set_ocp_level(OCP_LEVEL_A).unwrap();
    psu.set_ovp_state(true).unwrap();
    psu.set_ocp_state(true).unwrap();
    println!("ovp: {}", psu.get_ovp_summary().unwrap());
    println!("ocp: {}", psu.get_ocp_summary().unwrap());

    psu.set_output(true).unwrap();
    println!("Output enabled");
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    println!("\n--- Ramp 0V -> 10V over 5s ---");
    psu.ramp_voltage(0.0, 10.0, 5.0, 50).unwrap();

    if psu.get_ovp_tripped().unwrap() {
        println!("OVP tripped, clearing");
        psu.clear_ovp().unwrap();
    }
    if psu.get_ocp_tripped().unwrap() {
        println!("OCP tripped, clearing");
        psu.clear_ocp().unwrap();
    }

    psu.set_output(false).unwrap();
    println!("Output disabled");
}
