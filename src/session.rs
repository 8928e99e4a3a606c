use std::io::{BufRead, BufReader, Read};

use log::{debug, error, info, warn};
use time::OffsetDateTime;

use crate::config::Config;
use crate::csv_log::{CsvLog, LogRow};
use crate::error::Result;
use crate::protocol::{self, Line};
use crate::shutdown::Shutdown;
use crate::transport::Transport;

#[derive(Debug)]
pub enum SessionEnd {
    /// The port could not be opened, or stopped working (usually: the device
    /// was unplugged). Not an error as far as the caller is concerned, the
    /// device will hopefully come back.
    ConnectionLost(serialport::Error),
    /// The user asked us to stop.
    Interrupted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub rows_logged: u64,
    pub malformed_lines: u64,
    pub ignored_lines: u64,
}

/// Run one logging session against `port_name`: open the port, recreate the
/// output file, and log records until the connection goes away or shutdown is
/// requested. Only output file problems are returned as errors.
pub fn run_session<T: Transport>(
    transport: &mut T,
    port_name: &str,
    config: &Config,
    shutdown: &Shutdown,
    now: impl Fn() -> OffsetDateTime,
) -> Result<SessionEnd> {
    info!("Found device on port {port_name}");
    let port = match transport.open(port_name, config) {
        Ok(port) => port,
        Err(e) => {
            error!("Serial connection failed: {e}");
            return Ok(SessionEnd::ConnectionLost(e));
        }
    };

    // log_from_port takes ownership of the port, so it is closed by the time
    // it returns - no matter how the session ended.
    let result = log_from_port(port, config, shutdown, now);
    info!("Serial port closed.");
    result
}

fn log_from_port<P: Read>(
    port: P,
    config: &Config,
    shutdown: &Shutdown,
    now: impl Fn() -> OffsetDateTime,
) -> Result<SessionEnd> {
    if shutdown.wait(config.settle_delay) {
        info!("Logging stopped by user.");
        return Ok(SessionEnd::Interrupted);
    }

    let mut log = CsvLog::recreate(&config.csv_path)?;
    info!("Logging started. Writing to {}", log.path().display());

    let mut reader = BufReader::new(port);
    let (end, stats) = log_lines(&mut reader, &mut log, shutdown, now)?;
    info!(
        "Session finished: {} row(s) logged, {} malformed line(s) skipped, {} line(s) ignored",
        stats.rows_logged, stats.malformed_lines, stats.ignored_lines
    );
    Ok(end)
}

/// The main read loop of a session.
/// Reads are expected to time out regularly (the device only sends a line
/// every so often), which is also when we check for shutdown requests. A
/// line that is still incomplete when a read times out stays in the buffer
/// and is completed by subsequent reads.
pub fn log_lines<R: BufRead>(
    reader: &mut R,
    log: &mut CsvLog,
    shutdown: &Shutdown,
    now: impl Fn() -> OffsetDateTime,
) -> Result<(SessionEnd, SessionStats)> {
    let mut stats = SessionStats::default();
    let mut buf = Vec::new();
    loop {
        if shutdown.is_requested() {
            info!("Logging stopped by user.");
            return Ok((SessionEnd::Interrupted, stats));
        }

        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                // Some platforms report a vanished device as EOF rather than
                // as an error. Anything left in buf is a torn line.
                error!("Serial connection lost: port closed");
                return Ok((
                    SessionEnd::ConnectionLost(serialport::Error::new(
                        serialport::ErrorKind::NoDevice,
                        "port closed",
                    )),
                    stats,
                ));
            }
            Ok(_) => (),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                error!("Serial connection lost or failed: {e}");
                return Ok((SessionEnd::ConnectionLost(e.into()), stats));
            }
        }
        if buf.last() != Some(&b'\n') {
            // EOF in the middle of a line, the next read reports it.
            continue;
        }

        // Firmware occasionally spits out garbage while booting, which
        // shouldn't bring down the session.
        let line = String::from_utf8_lossy(&buf).into_owned();
        buf.clear();

        match protocol::parse_line(&line) {
            Ok(Line::Record(record)) => {
                let row = LogRow::new(record, now())?;
                log.append(&row)?;
                stats.rows_logged += 1;
                info!("Logged {row}");
            }
            Ok(Line::Noise) | Ok(Line::Truncated { .. }) => {
                stats.ignored_lines += 1;
                debug!("Ignored line: {:?}", line.trim());
            }
            Err(e) => {
                stats.malformed_lines += 1;
                warn!("Skipped malformed line: {}", e.received_message);
            }
        }
    }
}
