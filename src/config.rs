use std::path::PathBuf;
use std::time::Duration;

/// Description reported by the CP210x bridge on the ESP32 dev boards.
pub const DEFAULT_DEVICE_NAME: &str = "Silicon Labs CP210x USB to UART Bridge";
pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_CSV_PATH: &str = "sensor_log.csv";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Substring that must appear in a port's description (case-sensitive).
    pub device_name: String,
    pub baud_rate: u32,
    /// Per-read timeout. This also bounds how long an interrupt can go
    /// unnoticed while a session is active.
    pub read_timeout: Duration,
    /// Opening the port toggles DTR/RTS, which resets the ESP32. We need to
    /// give it time to boot before anything useful arrives.
    pub settle_delay: Duration,
    pub scan_interval: Duration,
    pub csv_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_secs(2),
            scan_interval: Duration::from_secs(5),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
        }
    }
}

impl Config {
    pub fn with_device_name(mut self, device_name: impl Into<String>) -> Self {
        self.device_name = device_name.into();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_scan_interval(mut self, scan_interval: Duration) -> Self {
        self.scan_interval = scan_interval;
        self
    }

    pub fn with_csv_path(mut self, csv_path: impl Into<PathBuf>) -> Self {
        self.csv_path = csv_path.into();
        self
    }
}
