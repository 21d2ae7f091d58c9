//! ---
//! marax_section: "03-configuration-logging"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Shared configuration and logging for the exporter workspace."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Configuration loading and tracing setup shared by every crate in the
//! workspace.

pub mod config;
pub mod logging;

pub use config::{ExporterConfig, LoadedConfig, LoggingConfig, MetricsConfig, SerialConfig};
pub use logging::{init_tracing, LogFormat};
