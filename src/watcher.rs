use log::{debug, info, warn};
use serialport::{SerialPortInfo, SerialPortType};

use crate::config::Config;
use crate::shutdown::Shutdown;
use crate::transport::Transport;

/// Human-readable description of a port, as shown by the OS device manager:
/// the USB product string where available. Non-USB ports (and USB ports that
/// don't report anything useful) fall back to their name.
pub fn describe(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .as_ref()
            .or(usb.manufacturer.as_ref())
            .unwrap_or(&port.port_name)
            .clone(),
        _ => port.port_name.clone(),
    }
}

/// Returns the first port whose description contains `target`. Matching is
/// case-sensitive, and if several identical adapters are plugged in we simply
/// go with whichever the OS listed first.
pub fn find_port<'a>(ports: &'a [SerialPortInfo], target: &str) -> Option<&'a SerialPortInfo> {
    ports.iter().find(|port| describe(port).contains(target))
}

/// Poll until a matching device shows up, returning its port name. Returns
/// None only if shutdown was requested while waiting.
pub fn wait_for_device<T: Transport>(
    transport: &mut T,
    config: &Config,
    shutdown: &Shutdown,
) -> Option<String> {
    loop {
        if shutdown.is_requested() {
            info!("Stopped waiting for device.");
            return None;
        }

        match transport.available_ports() {
            Ok(ports) => {
                if let Some(port) = find_port(&ports, &config.device_name) {
                    return Some(port.port_name.clone());
                }
                debug!(
                    "No match among {} port(s): {:?}",
                    ports.len(),
                    ports.iter().map(describe).collect::<Vec<_>>()
                );
            }
            // Listing ports can fail transiently (e.g. udev hiccups while a
            // device is being plugged in), so we just try again later.
            Err(e) => warn!("Unable to list serial ports: {e}"),
        }

        if shutdown.wait(config.scan_interval) {
            info!("Stopped waiting for device.");
            return None;
        }
    }
}
