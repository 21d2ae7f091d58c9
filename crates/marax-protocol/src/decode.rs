//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Decoder for the comma separated status record."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Status record decoding.
//!
//! A record looks like `C1.23,068,120,054,0820,1`: a mode tag glued to the
//! firmware version, four integers and a heating flag. Decoding checks the
//! record in wire order and stops at the first problem, so the reported error
//! is always the leftmost one.

use std::num::ParseIntError;

use thiserror::Error;

use crate::status::{MachineMode, MachineStatus, StatusField};

/// Number of comma separated fields in a record.
pub const FIELD_COUNT: usize = 6;

/// Reasons a record can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unable to parse line {line:?}, expected 6 fields but found {found}")]
    FieldCount { line: String, found: usize },
    #[error("unable to parse line {line:?}, the mode and version parts could not be found")]
    ModeVersion { line: String },
    #[error("invalid {field} value {value:?}: {source}")]
    InvalidNumber {
        field: StatusField,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid {field} flag {value:?}, expected one of 1/0/t/f/true/false")]
    InvalidFlag { field: StatusField, value: String },
}

impl DecodeError {
    /// Shape problems: wrong field count or a missing mode/version token.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DecodeError::FieldCount { .. } | DecodeError::ModeVersion { .. }
        )
    }

    /// Field that failed to parse, if the error concerns a single value.
    pub fn field(&self) -> Option<StatusField> {
        match self {
            DecodeError::InvalidNumber { field, .. } | DecodeError::InvalidFlag { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}

/// Decode one raw record into a [`MachineStatus`].
///
/// Accepts the record with or without its `\r\n` / `\n` terminator. Integer
/// fields outside `0..=65535`, negatives included, are rejected rather than
/// narrowed.
pub fn decode(raw: &[u8]) -> Result<MachineStatus, DecodeError> {
    let text = String::from_utf8_lossy(raw);
    let line = strip_terminator(&text);

    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            line: line.to_owned(),
            found: parts.len(),
        });
    }

    let mut mode_version = parts[0].chars();
    let (tag, version) = match mode_version.next() {
        Some(tag) if !mode_version.as_str().is_empty() => (tag, mode_version.as_str()),
        _ => {
            return Err(DecodeError::ModeVersion {
                line: line.to_owned(),
            })
        }
    };

    let [steam_temp, steam_target_temp, hx_temp, ready_countdown] =
        StatusField::NUMERIC.map(|field| parse_number(field, parts[field.position()]));

    Ok(MachineStatus {
        version: version.to_owned(),
        mode: MachineMode::from_tag(tag),
        steam_temp: steam_temp?,
        steam_target_temp: steam_target_temp?,
        hx_temp: hx_temp?,
        ready_countdown: ready_countdown?,
        heating: parse_flag(
            StatusField::Heating,
            parts[StatusField::Heating.position()],
        )?,
    })
}

fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

fn parse_number(field: StatusField, value: &str) -> Result<u16, DecodeError> {
    value
        .parse::<u16>()
        .map_err(|source| DecodeError::InvalidNumber {
            field,
            value: value.to_owned(),
            source,
        })
}

fn parse_flag(field: StatusField, value: &str) -> Result<bool, DecodeError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Ok(true),
        "0" | "f" | "false" => Ok(false),
        _ => Err(DecodeError::InvalidFlag {
            field,
            value: value.to_owned(),
        }),
    }
}
