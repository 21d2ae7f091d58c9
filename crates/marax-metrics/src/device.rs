//! ---
//! marax_section: "02-metrics-export"
//! marax_subsection: "module"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Prometheus series describing one machine status snapshot."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use marax_protocol::MachineStatus;
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, IntGauge, Opts, Registry};

pub const INFO_METRIC: &str = "mara_x_info";

/// Integer gauges exported for every status, as `(name, help)`.
pub const STATUS_GAUGES: [(&str, &str); 5] = [
    (
        "mara_x_steam_temperature",
        "The current steam temperature.",
    ),
    (
        "mara_x_steam_target_temperature",
        "The steam target temperature it wants to reach.",
    ),
    ("mara_x_hx_temperature", "Temperature of the heat exchanger."),
    (
        "mara_x_ready_countdown",
        "Shows if the machine is in 'fast heating' mode.",
    ),
    (
        "mara_x_heating",
        "Indicates whether the heating element is on or off.",
    ),
];

/// Build the device series for one snapshot.
///
/// A throwaway registry is used per snapshot so nothing from an earlier
/// scrape can leak into this one.
pub fn device_families(status: &MachineStatus) -> prometheus::Result<Vec<MetricFamily>> {
    let registry = Registry::new();

    let info = GaugeVec::new(
        Opts::new(INFO_METRIC, "Contains information about the Mara X machine."),
        &["version", "mode"],
    )?;
    registry.register(Box::new(info.clone()))?;
    info.with_label_values(&[status.version.as_str(), status.mode.as_str()])
        .set(1.0);

    let values = [
        status.steam_temp,
        status.steam_target_temp,
        status.hx_temp,
        status.ready_countdown,
        u16::from(status.heating),
    ];
    for ((name, help), value) in STATUS_GAUGES.iter().zip(values) {
        let gauge = IntGauge::with_opts(Opts::new(*name, *help))?;
        registry.register(Box::new(gauge.clone()))?;
        gauge.set(i64::from(value));
    }

    Ok(registry.gather())
}
