pub mod config;
pub mod csv_log;
pub mod error;
pub mod protocol;
pub mod session;
pub mod shutdown;
pub mod transport;
pub mod watcher;

use log::info;
use time::OffsetDateTime;

pub use config::Config;
pub use csv_log::LocalClock;
pub use error::{Error, Result};
use session::SessionEnd;
pub use shutdown::{Shutdown, ShutdownHandle};
use transport::{SerialTransport, Transport};

enum State {
    Waiting,
    Logging { port_name: String },
}

/// Log from the configured device until shutdown is requested, reconnecting
/// whenever it goes away and comes back.
/// Returns Ok once shutdown was requested. Errors only stem from the output
/// file (or timestamps), the device coming and going is business as usual.
pub fn run(config: &Config, shutdown: &Shutdown, clock: LocalClock) -> Result<()> {
    run_with(&mut SerialTransport, config, shutdown, || clock.now())
}

pub fn run_with<T: Transport>(
    transport: &mut T,
    config: &Config,
    shutdown: &Shutdown,
    now: impl Fn() -> OffsetDateTime,
) -> Result<()> {
    let mut state = State::Waiting;
    info!("Waiting for device ({})...", config.device_name);
    loop {
        state = match state {
            State::Waiting => match watcher::wait_for_device(transport, config, shutdown) {
                Some(port_name) => State::Logging { port_name },
                None => return Ok(()),
            },
            State::Logging { port_name } => {
                match session::run_session(transport, &port_name, config, shutdown, &now)? {
                    SessionEnd::Interrupted => return Ok(()),
                    SessionEnd::ConnectionLost(_) => {
                        info!("Waiting again for new connection...");
                        // Give the device a moment to actually disappear:
                        // scanning right away will usually just find the
                        // port that we lost a moment ago.
                        if shutdown.wait(config.scan_interval) {
                            info!("Stopped waiting for device.");
                            return Ok(());
                        }
                        State::Waiting
                    }
                }
            }
        };
    }
}
