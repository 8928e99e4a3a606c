use std::io::Read;

use serialport::SerialPortInfo;

use crate::config::Config;

/// Everything the logger needs from the OS serial layer. Production code uses
/// SerialTransport; tests substitute scripted ports so that plugging and
/// unplugging can be simulated.
pub trait Transport {
    type Port: Read;

    fn available_ports(&mut self) -> serialport::Result<Vec<SerialPortInfo>>;

    fn open(&mut self, port_name: &str, config: &Config) -> serialport::Result<Self::Port>;
}

pub struct SerialTransport;

impl Transport for SerialTransport {
    type Port = Box<dyn serialport::SerialPort>;

    fn available_ports(&mut self) -> serialport::Result<Vec<SerialPortInfo>> {
        serialport::available_ports()
    }

    fn open(&mut self, port_name: &str, config: &Config) -> serialport::Result<Self::Port> {
        serialport::new(port_name, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            // The timeout determines how quickly an interrupt is noticed
            // mid-session (see session::log_lines).
            .timeout(config.read_timeout)
            .open()
    }
}
