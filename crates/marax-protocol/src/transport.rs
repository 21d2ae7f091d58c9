//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Serial port setup for the machine's UART."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use marax_common::config::SerialConfig;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

/// Open the machine's UART as configured: 8N1, no flow control.
///
/// The port read timeout is the poll interval, so an idle line surfaces as a
/// `TimedOut` read every poll interval instead of blocking forever. Anything
/// the device sent before we opened the port is discarded.
pub fn open_serial(config: &SerialConfig) -> serialport::Result<Box<dyn SerialPort>> {
    let port = serialport::new(config.device.as_str(), config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(config.poll_interval)
        .open()?;

    info!(device = %config.device, baud_rate = config.baud_rate, "opened serial port");

    port.clear(ClearBuffer::Input)?;
    debug!(device = %config.device, "cleared stale serial input");
    Ok(port)
}
