//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "One read-then-decode cycle per scrape."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::decode::{decode, DecodeError};
use crate::reader::{LineReader, ReadError, DEFAULT_READ_TIMEOUT};
use crate::status::MachineStatus;

/// Why a scrape produced no status.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("unable to read line: {0}")]
    Read(#[from] ReadError),
    #[error("unable to decode line: {0}")]
    Decode(#[from] DecodeError),
}

impl ScrapeError {
    /// Stable label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Read(ReadError::Timeout(_)) => "timeout",
            ScrapeError::Read(_) => "stream",
            ScrapeError::Decode(err) if err.is_structural() => "structural",
            ScrapeError::Decode(_) => "numeric",
        }
    }

    /// Every label [`ScrapeError::kind`] can return.
    pub const KINDS: [&'static str; 4] = ["timeout", "stream", "structural", "numeric"];
}

/// Produces a fresh [`MachineStatus`] on demand.
#[derive(Debug, Clone)]
pub struct StatusSource {
    reader: LineReader,
    read_timeout: Duration,
}

impl StatusSource {
    pub fn new(reader: LineReader, read_timeout: Duration) -> Self {
        Self {
            reader,
            read_timeout,
        }
    }

    pub fn with_default_timeout(reader: LineReader) -> Self {
        Self::new(reader, DEFAULT_READ_TIMEOUT)
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Read one record and decode it. No retries: the first failure is returned.
    pub async fn poll(&self) -> Result<MachineStatus, ScrapeError> {
        let line = self.reader.read_line(self.read_timeout).await?;
        let status = decode(&line)?;
        debug!(
            version = %status.version,
            mode = %status.mode,
            steam_temp = status.steam_temp,
            hx_temp = status.hx_temp,
            heating = status.heating,
            fast_heating = status.is_fast_heating(),
            "decoded machine status"
        );
        Ok(status)
    }
}
