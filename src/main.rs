//! Ags3870 command-line utility
//!
//! Copyright 2019 Ryan Kurte

extern crate embedded_hal;
extern crate linux_embedded_hal;
use linux_embedded_hal::I2cdev;

extern crate structopt;
use structopt::StructOpt;

extern crate humantime;
use humantime::{Duration as HumanDuration};

#[macro_use] extern crate log;
extern crate simplelog;
use simplelog::{TermLogger, LevelFilter};

extern crate sensor_ags3870;
use sensor_ags3870::Ags3870;
use sensor_ags3870::clock::SystemClock;

#[derive(StructOpt)]
#[structopt(name = "ags3870-util")]
/// A Command Line Interface (CLI) for interacting with a local Ags3870 methane sensor over I2C
pub struct Options {

    /// Specify the i2c interface to use to connect to the ags3870 device
    #[structopt(short="d", long = "i2c", default_value = "/dev/i2c-1", env = "AGS3870_I2C")]
    i2c: String,

    /// Specify the (7-bit, hex) i2c address of the ags3870 device
    #[structopt(short="a", long = "address", default_value = "1a", parse(try_from_str = "parse_hex"))]
    address: u8,

    #[structopt(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[structopt(long = "log-level", default_value = "info")]
    level: LevelFilter,
}

#[derive(StructOpt)]
pub enum Command {
    /// Poll the sensor for CH4 concentration readings
    #[structopt(name = "read")]
    Read {
        /// Specify period for taking measurements
        #[structopt(short = "p", long = "sample-period", default_value="10s")]
        period: HumanDuration,

        /// Preheat time to wait for prior to reading
        #[structopt(long = "preheat", default_value="120s")]
        preheat: HumanDuration,

        /// Skip waiting for the sensor to preheat
        #[structopt(long = "skip-preheat")]
        skip_preheat: bool,

        /// Number of consecutive read errors allowed prior to exiting
        #[structopt(long = "allowed-errors", default_value="3")]
        allowed_errors: usize,
    },

    /// Read the sensor firmware version
    #[structopt(name = "version")]
    Version,

    /// Read the sensor resistance
    #[structopt(name = "resistance")]
    Resistance,

    /// Set the zero point calibration value
    #[structopt(name = "calibrate")]
    Calibrate {
        /// Zero calibration value
        value: u16,
    },

    /// Read the zero point calibration status and value
    #[structopt(name = "calibration")]
    Calibration,

    /// Dump the raw contents of a register
    #[structopt(name = "register")]
    Register {
        /// Register address (hex)
        #[structopt(parse(try_from_str = "parse_hex"))]
        address: u8,
    },
}

fn parse_hex(src: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(src.trim_start_matches("0x"), 16)
}

fn main() {
    // Load options
    let opts = Options::from_args();

    // Setup logging
    TermLogger::init(opts.level, simplelog::Config::default()).unwrap();

    debug!("Connecting to I2C device");
    let i2c = match I2cdev::new(&opts.i2c) {
        Ok(v) => v,
        Err(e) => {
            error!("Error opening I2C device '{}': {:?}", &opts.i2c, e);
            std::process::exit(-1);
        }
    };

    debug!("Connecting to AGS3870 at {:#04x}", opts.address);
    let mut sensor = Ags3870::with_address(i2c, SystemClock::new(), opts.address);
    if !sensor.begin() {
        error!("Error connecting to AGS3870: no response at address {:#04x}", opts.address);
        std::process::exit(-2);
    }

    match opts.command {
        Command::Read{ period, preheat, skip_preheat, allowed_errors } => {
            if !skip_preheat {
                info!("Waiting {} for sensor to preheat", preheat);
                std::thread::sleep(*preheat);
            }

            let mut errors = 0;

            loop {
                debug!("Starting sensor read cycle");

                let ppm = sensor.read_ppm();

                match sensor.last_error() {
                    None => {
                        info!("CH4: {} ppm", ppm);
                        errors = 0;
                    },
                    Some(e) => {
                        warn!("Error reading sensor data: {:?} (last good: {} ppm)", e, ppm);
                        errors += 1;
                    },
                }

                if errors > allowed_errors {
                    error!("Exceeded maximum allowed read errors");
                    std::process::exit(-3);
                }

                // Wait for another sensor reading
                std::thread::sleep(*period);
            }
        },
        Command::Version => {
            let v = sensor.version();
            if let Some(e) = sensor.last_error() {
                error!("Error reading version: {:?}", e);
                std::process::exit(-4);
            }
            info!("Firmware version: {:#04x}", v);
        },
        Command::Resistance => {
            let r = sensor.read_resistance();
            if let Some(e) = sensor.last_error() {
                error!("Error reading resistance: {:?}", e);
                std::process::exit(-4);
            }
            info!("Resistance: {} ohm", r);
        },
        Command::Calibrate{ value } => {
            if !sensor.manual_zero_calibration(value) {
                error!("Error writing zero calibration: {:?}", sensor.last_error());
                std::process::exit(-5);
            }
            info!("Zero calibration set to {}", value);
        },
        Command::Calibration => {
            match sensor.zero_calibration_data() {
                Some(d) => info!("Zero calibration status: {:#06x} value: {}", d.status, d.value),
                None => {
                    error!("Error reading zero calibration: {:?}", sensor.last_error());
                    std::process::exit(-4);
                }
            }
        },
        Command::Register{ address } => {
            match sensor.read_register(address) {
                Some(r) => info!("Register {:#04x}: {:02x?} crc: {:#04x}", address, r.data, r.crc),
                None => {
                    error!("Error reading register {:#04x}: {:?}", address, sensor.last_error());
                    std::process::exit(-4);
                }
            }
        },
    }
}
