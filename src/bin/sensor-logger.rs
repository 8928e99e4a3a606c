use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use sensorlog::config::{DEFAULT_BAUD_RATE, DEFAULT_CSV_PATH, DEFAULT_DEVICE_NAME};
use sensorlog::{Config, LocalClock, Shutdown};

/// Wait for the sensor board to be plugged in, and log its readings to CSV.
/// The output file is recreated every time the board (re)connects.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Text that must appear in the serial port's description
    #[arg(long, default_value = DEFAULT_DEVICE_NAME)]
    device_name: String,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// CSV file to write (replaced on every connection)
    #[arg(short, long, default_value = DEFAULT_CSV_PATH)]
    output: PathBuf,

    /// Seconds between scans for the device
    #[arg(long, default_value_t = 5)]
    scan_interval: u64,

    /// Seconds to wait after connecting, while the board resets
    #[arg(long, default_value_t = 2)]
    settle_delay: u64,

    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> Config {
        Config::default()
            .with_device_name(self.device_name)
            .with_baud_rate(self.baud_rate)
            .with_csv_path(self.output)
            .with_scan_interval(Duration::from_secs(self.scan_interval))
            .with_settle_delay(Duration::from_secs(self.settle_delay))
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Args::parse().into_config();
    info!("Sensor logger (v{})", env!("CARGO_PKG_VERSION"));

    // Must happen before ctrlc spawns its thread, see LocalClock::detect.
    let clock = LocalClock::detect();

    let (handle, shutdown) = Shutdown::channel();
    if let Err(e) = ctrlc::set_handler(move || handle.request()) {
        error!("{}", sensorlog::Error::from(e));
        return ExitCode::FAILURE;
    }

    match sensorlog::run(&config, &shutdown, clock) {
        Ok(()) => {
            info!("Terminated by user.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
