//! ---
//! marax_section: "02-metrics-export"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Prometheus export of machine status."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
//! Prometheus side of the exporter: renders status snapshots as gauges and
//! serves them over HTTP, reading the machine afresh on every scrape.

use std::sync::Arc;

use prometheus::Registry;

pub mod device;
pub mod exporter;
pub mod server;

pub use device::device_families;
pub use exporter::{ExporterMetrics, StatusExporter};
pub use server::{router, spawn_http_server, MetricsServer};

/// Shared registry type for metrics that outlive a single scrape.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

pub use prometheus;
