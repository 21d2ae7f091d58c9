//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Serial status protocol: bounded line reads and record decoding."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Protocol layer for the Mara X status UART.
//!
//! The machine prints one status record per line at 9600 baud. This crate
//! turns that byte stream into [`MachineStatus`] values: [`LineReader`] pulls
//! one line under a deadline, [`decode`] validates and types it, and
//! [`StatusSource`] chains the two for a single scrape.

pub mod decode;
pub mod reader;
pub mod sim;
pub mod source;
pub mod status;
pub mod testing;
pub mod transport;

pub use decode::{decode, DecodeError};
pub use reader::{LineReader, ReadError, DEFAULT_READ_TIMEOUT};
pub use sim::SimulatedMachine;
pub use source::{ScrapeError, StatusSource};
pub use status::{MachineMode, MachineStatus, StatusField};
pub use transport::open_serial;
