use std::fs::File;
use std::path::{Path, PathBuf};

use log::{info, warn};
use time::{OffsetDateTime, UtcOffset};

use crate::error::{Error, Result};
use crate::protocol::SensorRecord;

pub const HEADER: [&str; 5] = [
    "Real Timestamp",
    "Elapsed Time (s)",
    "Distance (cm)",
    "Temperature (C)",
    "Humidity (%)",
];

/// Wall clock for row timestamps, in local time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalClock {
    offset: UtcOffset,
}

impl LocalClock {
    /// Determine the local UTC offset. This must happen before any other
    /// threads are spawned (i.e. before installing the Ctrl-C handler):
    /// time refuses to read the local offset from multi-threaded processes on
    /// most unixes.
    /// The offset is fixed from here on, so a DST change while running is
    /// not picked up.
    pub fn detect() -> LocalClock {
        match UtcOffset::current_local_offset() {
            Ok(offset) => LocalClock { offset },
            Err(e) => {
                warn!("Unable to determine local time offset ({e}), timestamps will be UTC");
                LocalClock {
                    offset: UtcOffset::UTC,
                }
            }
        }
    }

    pub fn with_offset(offset: UtcOffset) -> LocalClock {
        LocalClock { offset }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

pub fn format_timestamp(date_time: OffsetDateTime) -> std::result::Result<String, time::error::Format> {
    let format = time::macros::format_description!(
        version = 2,
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    );
    date_time.format(&format)
}

// Debug (unlike Display) keeps the ".0" on integral values, i.e. 22.0 rather
// than 22, which is what every existing consumer of these logs expects.
fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// A record, stamped with the time at which we received it. The device only
/// knows how long it has been running, not what time it is.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRow {
    pub timestamp: String,
    pub record: SensorRecord,
}

impl LogRow {
    pub fn new(record: SensorRecord, received_at: OffsetDateTime) -> Result<LogRow> {
        Ok(LogRow {
            timestamp: format_timestamp(received_at)?,
            record,
        })
    }

    fn to_fields(&self) -> [String; 5] {
        [
            self.timestamp.clone(),
            self.record.elapsed_seconds.to_string(),
            format_float(self.record.distance_cm),
            format_float(self.record.temperature_c),
            self.record.humidity_pct.to_string(),
        ]
    }
}

impl std::fmt::Display for LogRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {:.1} cm | {:.1} °C | {}%",
            self.timestamp,
            self.record.distance_cm,
            self.record.temperature_c,
            self.record.humidity_pct
        )
    }
}

/// The output CSV for a single session.
pub struct CsvLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvLog {
    /// Delete whatever is at `path` and start a fresh log containing only the
    /// header row.
    pub fn recreate(path: &Path) -> Result<CsvLog> {
        let output_error = |source| Error::Output {
            path: path.to_path_buf(),
            source,
        };

        match std::fs::remove_file(path) {
            Ok(()) => info!("Deleted old {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (),
            Err(e) => return Err(output_error(e)),
        }

        let file = File::create(path).map_err(output_error)?;
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush().map_err(output_error)?;

        Ok(CsvLog {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a row and make sure it's on disk before returning. The device
    /// is typically unplugged without warning (or the host loses power), so
    /// buffering rows in memory means losing them.
    pub fn append(&mut self, row: &LogRow) -> Result<()> {
        let output_error = |source| Error::Output {
            path: self.path.clone(),
            source,
        };
        self.writer.write_record(row.to_fields())?;
        self.writer.flush().map_err(output_error)?;
        self.writer.get_ref().sync_all().map_err(output_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    const HEADER_LINE: &str =
        "Real Timestamp,Elapsed Time (s),Distance (cm),Temperature (C),Humidity (%)\r\n";

    fn record(elapsed_seconds: i64, distance_cm: f64, temperature_c: f64, humidity_pct: i64) -> SensorRecord {
        SensorRecord {
            elapsed_seconds,
            distance_cm,
            temperature_c,
            humidity_pct,
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(datetime!(2024-03-05 07:08:09 UTC)).unwrap(),
            "2024-03-05 07:08:09"
        );
        // Local time is written as-is, without the offset.
        assert_eq!(
            format_timestamp(datetime!(2024-12-31 23:59:59 -5)).unwrap(),
            "2024-12-31 23:59:59"
        );
    }

    #[test]
    fn test_clock_applies_offset() {
        let clock = LocalClock::with_offset(offset!(+2));
        assert_eq!(clock.now().offset(), offset!(+2));
    }

    #[test]
    fn test_row_display() {
        let row = LogRow::new(record(12, 34.56, 22.0, 55), datetime!(2024-03-05 07:08:09 UTC)).unwrap();
        assert_eq!(row.to_string(), "2024-03-05 07:08:09 | 34.6 cm | 22.0 °C | 55%");
    }

    #[test]
    fn test_recreate_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_log.csv");
        std::fs::write(&path, "stale,data\r\n1,2,3,4,5\r\n").unwrap();

        let log = CsvLog::recreate(&path).unwrap();
        assert_eq!(log.path(), path.as_path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HEADER_LINE);
    }

    #[test]
    fn test_recreate_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_log.csv");

        CsvLog::recreate(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HEADER_LINE);
    }

    #[test]
    fn test_recreate_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("sensor_log.csv");

        match CsvLog::recreate(&path) {
            Err(Error::Output { path: error_path, .. }) => assert_eq!(error_path, path),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("recreate should fail"),
        }
    }

    #[test]
    fn test_append_is_visible_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_log.csv");
        let mut log = CsvLog::recreate(&path).unwrap();

        let at = datetime!(2024-03-05 07:08:09 UTC);
        log.append(&LogRow::new(record(12, 34.5, 22.1, 55), at).unwrap())
            .unwrap();
        log.append(&LogRow::new(record(13, 30.0, -1.25, 0), at).unwrap())
            .unwrap();

        // No drop: rows must already be on disk while the log is still open.
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!(
                "{HEADER_LINE}2024-03-05 07:08:09,12,34.5,22.1,55\r\n2024-03-05 07:08:09,13,30.0,-1.25,0\r\n"
            )
        );
        drop(log);
    }
}
