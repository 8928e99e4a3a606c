use std::str::FromStr;

/// Advisory prefixes emitted by the sensor firmware. Anything starting with
/// one of these is a human-readable notice (low battery, sensor errors, etc.),
/// never telemetry - even if it happens to contain commas.
pub const SENTINEL_PREFIXES: [&str; 2] = ["\u{26A0}\u{FE0F}", "\u{1F514}"];

pub const FIELD_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorRecord {
    pub elapsed_seconds: i64,
    pub distance_cm: f64,
    pub temperature_c: f64,
    pub humidity_pct: i64,
}

/// Line represents the classification of any line sent by the device.
#[derive(Debug, PartialEq)]
pub enum Line {
    Record(SensorRecord),
    /// Empty lines, lines without any comma, and sentinel-prefixed advisories.
    Noise,
    /// Comma separated, but with the wrong number of fields. In practice this
    /// happens when the device resets mid-line or when output from the boot
    /// loader gets interleaved with telemetry, so it's dropped without fuss.
    Truncated { field_count: usize },
}

#[derive(Debug)]
pub struct ParseError {
    pub received_message: String,
    pub reason: String,
}

impl PartialEq for ParseError {
    fn eq(&self, other: &Self) -> bool {
        self.received_message == other.received_message
    }
}

impl Eq for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.received_message, self.reason)
    }
}

impl std::error::Error for ParseError {}

fn parse_field<T: FromStr>(line: &str, field: &str, name: &str) -> Result<T, ParseError> {
    T::from_str(field.trim()).map_err(|_| ParseError {
        received_message: line.to_string(),
        reason: format!("unable to parse {name} from {field:?}"),
    })
}

/// Parse a line received from the sensor.
/// The caller is expected to pass in the line with its terminator removed,
/// surrounding whitespace is trimmed here regardless.
/// Note: a ParseError is only returned for lines that look like telemetry
/// (exactly four fields) but contain values that can't be parsed. Everything
/// else that isn't a record is Noise or Truncated, neither of which is an
/// error.
pub fn parse_line(line: &str) -> Result<Line, ParseError> {
    let line = line.trim();
    if line.is_empty()
        || !line.contains(',')
        || SENTINEL_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
    {
        return Ok(Line::Noise);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Ok(Line::Truncated {
            field_count: fields.len(),
        });
    }

    Ok(Line::Record(SensorRecord {
        elapsed_seconds: parse_field(line, fields[0], "elapsed seconds")?,
        distance_cm: parse_field(line, fields[1], "distance")?,
        temperature_c: parse_field(line, fields[2], "temperature")?,
        humidity_pct: parse_field(line, fields[3], "humidity")?,
    }))
}
