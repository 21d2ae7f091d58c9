//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Decoded machine status snapshot and its field vocabulary."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::decode::{decode, DecodeError};

/// Protocol tag announcing steam priority. Every other tag means coffee priority.
pub const STEAM_TAG: char = 'V';

/// Brewing priority the machine is currently configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineMode {
    Coffee,
    Steam,
}

impl MachineMode {
    /// Classify a protocol mode tag.
    ///
    /// Only [`STEAM_TAG`] selects steam; anything else falls back to coffee
    /// without complaint.
    pub fn from_tag(tag: char) -> Self {
        if tag == STEAM_TAG {
            MachineMode::Steam
        } else {
            MachineMode::Coffee
        }
    }

    /// Label value used when exporting the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineMode::Coffee => "coffee",
            MachineMode::Steam => "steam",
        }
    }
}

impl fmt::Display for MachineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One complete status record reported by the machine over its UART.
///
/// A value of this type only ever comes out of a successful [`decode`]; there
/// is no way to observe a partially decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineStatus {
    /// Firmware version string, verbatim from the wire.
    pub version: String,
    pub mode: MachineMode,
    /// Current steam boiler temperature in device units.
    pub steam_temp: u16,
    /// Steam temperature the controller is heating towards.
    pub steam_target_temp: u16,
    /// Heat exchanger temperature.
    pub hx_temp: u16,
    /// Fast-heat countdown. Starts around 1500 and reaches 0 once the
    /// accelerated heating phase is over.
    pub ready_countdown: u16,
    /// Whether the heating element is energised.
    pub heating: bool,
}

impl MachineStatus {
    /// True while the machine is still running its fast-heat phase.
    pub fn is_fast_heating(&self) -> bool {
        self.ready_countdown > 0
    }
}

impl FromStr for MachineStatus {
    type Err = DecodeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        decode(line.as_bytes())
    }
}

/// Positional fields of a status record that carry typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    SteamTemp,
    SteamTargetTemp,
    HxTemp,
    ReadyCountdown,
    Heating,
}

impl StatusField {
    /// Integer fields in wire order (fields 1 to 4).
    pub const NUMERIC: [StatusField; 4] = [
        StatusField::SteamTemp,
        StatusField::SteamTargetTemp,
        StatusField::HxTemp,
        StatusField::ReadyCountdown,
    ];

    /// Zero-based position of the field within a record.
    pub fn position(&self) -> usize {
        match self {
            StatusField::SteamTemp => 1,
            StatusField::SteamTargetTemp => 2,
            StatusField::HxTemp => 3,
            StatusField::ReadyCountdown => 4,
            StatusField::Heating => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusField::SteamTemp => "steam_temp",
            StatusField::SteamTargetTemp => "steam_target_temp",
            StatusField::HxTemp => "hx_temp",
            StatusField::ReadyCountdown => "ready_countdown",
            StatusField::Heating => "heating",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
