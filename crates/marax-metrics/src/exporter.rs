//! ---
//! marax_section: "02-metrics-export"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Scrape handling: poll the machine, render device and exporter series."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use marax_protocol::{ScrapeError, StatusSource};
use prometheus::proto::MetricFamily;
use prometheus::{
    GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, TextEncoder,
};
use tracing::{error, warn};

use crate::device::device_families;
use crate::SharedRegistry;

/// Error kind recorded when a decoded status could not be turned into series.
pub const RENDER_FAILURE_KIND: &str = "render";

/// Metrics about the exporter itself. These live across scrapes.
#[derive(Clone)]
pub struct ExporterMetrics {
    registry: SharedRegistry,
    scrapes_total: IntCounter,
    scrape_errors: IntCounterVec,
    scrape_duration_seconds: Histogram,
    build_info: GaugeVec,
}

impl ExporterMetrics {
    pub fn new(registry: SharedRegistry) -> Result<Self> {
        let scrapes_total = IntCounter::with_opts(Opts::new(
            "mara_x_scrapes_total",
            "Total number of status reads attempted on behalf of a scrape",
        ))?;
        registry.register(Box::new(scrapes_total.clone()))?;

        let scrape_errors = IntCounterVec::new(
            Opts::new(
                "mara_x_scrape_errors_total",
                "Status reads that produced no snapshot, by failure kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(scrape_errors.clone()))?;
        for kind in ScrapeError::KINDS.into_iter().chain([RENDER_FAILURE_KIND]) {
            scrape_errors.with_label_values(&[kind]);
        }

        let buckets = prometheus::exponential_buckets(0.005, 2.0, 10)
            .context("failed to construct histogram buckets")?;
        let scrape_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mara_x_scrape_duration_seconds",
                "Time spent reading and decoding one status record",
            )
            .buckets(buckets),
        )?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;

        let build_info = GaugeVec::new(
            Opts::new(
                "mara_x_exporter_build_info",
                "Build metadata for the running exporter binary",
            ),
            &["version"],
        )?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry,
            scrapes_total,
            scrape_errors,
            scrape_duration_seconds,
            build_info,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.scrapes_total.inc();
        self.scrape_duration_seconds.observe(elapsed.as_secs_f64());
    }

    pub fn record_failure(&self, kind: &str, elapsed: Duration) {
        self.scrapes_total.inc();
        self.scrape_errors.with_label_values(&[kind]).inc();
        self.scrape_duration_seconds.observe(elapsed.as_secs_f64());
    }

    pub fn set_build_info(&self, version: &str) {
        self.build_info.with_label_values(&[version]).set(1.0);
    }

    pub fn scrape_errors(&self, kind: &str) -> u64 {
        self.scrape_errors.with_label_values(&[kind]).get()
    }

    pub fn scrapes(&self) -> u64 {
        self.scrapes_total.get()
    }
}

/// Turns scrapes into status reads.
///
/// Concurrent scrapes queue on the line reader, which serves one read at a
/// time; each scrape's deadline runs from the moment it asks.
pub struct StatusExporter {
    source: StatusSource,
    metrics: ExporterMetrics,
}

impl StatusExporter {
    pub fn new(source: StatusSource, metrics: ExporterMetrics) -> Self {
        Self {
            source,
            metrics,
        }
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Poll the machine once and gather every family for this scrape.
    ///
    /// A failed poll is logged and contributes no device series at all; the
    /// exporter's own series are always included.
    pub async fn collect(&self) -> Vec<MetricFamily> {
        let started = Instant::now();
        let mut families = match self.source.poll().await {
            Ok(status) => self.settle(device_families(&status), started.elapsed()),
            Err(err) => {
                warn!(error = %err, kind = err.kind(), "error collecting metrics from serial port");
                self.metrics.record_failure(err.kind(), started.elapsed());
                Vec::new()
            }
        };
        families.extend(self.metrics.registry().gather());
        families
    }

    fn settle(
        &self,
        built: prometheus::Result<Vec<MetricFamily>>,
        elapsed: Duration,
    ) -> Vec<MetricFamily> {
        match built {
            Ok(families) => {
                self.metrics.record_success(elapsed);
                families
            }
            Err(err) => {
                error!(error = %err, "failed to build device metrics");
                self.metrics.record_failure(RENDER_FAILURE_KIND, elapsed);
                Vec::new()
            }
        }
    }

    /// [`StatusExporter::collect`] encoded in the text exposition format.
    pub async fn render(&self) -> Result<String> {
        let families = self.collect().await;
        TextEncoder::new()
            .encode_to_string(&families)
            .context("failed to encode metrics")
    }
}
