use std::env;
use std::io::BufRead;
use std::process::ExitCode;

use sensorlog::protocol::{parse_line, Line};
use sensorlog::transport::{SerialTransport, Transport};
use sensorlog::watcher::describe;
use sensorlog::Config;

fn list_ports(config: &Config) -> ExitCode {
    let ports = match SerialTransport.available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("Unable to list serial ports: {e}");
            return ExitCode::FAILURE;
        }
    };
    if ports.is_empty() {
        eprintln!("No serial ports found.");
    }
    for port in &ports {
        let description = describe(port);
        let marker = if description.contains(&config.device_name) {
            "*"
        } else {
            " "
        };
        println!("{marker} {0}\t{description}", port.port_name);
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    eprintln!(
        "Sensor spy (v{}). Without arguments, lists serial ports (* marks the one sensor-logger would pick). Given a port, dumps what the sensor sends.",
        env!("CARGO_PKG_VERSION")
    );
    let config = Config::default();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return list_ports(&config);
    }

    let port = match SerialTransport.open(&args[1], &config) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("Unable to open {0}: {e}", args[1]);
            return ExitCode::FAILURE;
        }
    };

    let mut reader = std::io::BufReader::new(port);
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => (),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                eprintln!("Read failed: {e}");
                return ExitCode::FAILURE;
            }
        }
        let line = String::from_utf8_lossy(&buf).trim().to_string();
        buf.clear();
        let kind = match parse_line(&line) {
            Ok(Line::Record(_)) => "record",
            Ok(Line::Noise) => "noise",
            Ok(Line::Truncated { .. }) => "truncated",
            Err(_) => "malformed",
        };
        println!("[{kind:>9}] {line}");
    }
}
