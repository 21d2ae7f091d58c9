//! ---
//! marax_section: "04-binary"
//! marax_subsection: "binary"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Byte source selection for the line reader."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use marax_common::config::SerialConfig;
use marax_protocol::sim::{SimulatedMachine, DEFAULT_EMIT_INTERVAL};
use marax_protocol::{open_serial, LineReader, MachineMode};
use tracing::{info, warn};

/// Start the line reader on the serial device, or on a simulated machine
/// when `simulate` is set.
pub fn open_reader(config: &SerialConfig, simulate: Option<MachineMode>) -> Result<LineReader> {
    let reader = match simulate {
        Some(mode) => {
            warn!(mode = %mode, "reading from a simulated machine, not the serial device");
            let machine = SimulatedMachine::new(mode, DEFAULT_EMIT_INTERVAL, rand::random());
            LineReader::spawn(machine)
        }
        None => {
            let port = open_serial(config).with_context(|| {
                format!("unable to open serial device at {}", config.device)
            })?;
            info!(
                discard = config.discard_initial_lines,
                "starting line reader with warm-up"
            );
            LineReader::spawn_with_warmup(port, config.discard_initial_lines)
        }
    };
    reader.context("failed to start line reader thread")
}
