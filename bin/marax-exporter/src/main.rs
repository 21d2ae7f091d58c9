//! ---
//! marax_section: "04-binary"
//! marax_subsection: "binary"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Binary entrypoint for the Mara X exporter."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use marax_common::config::ExporterConfig;
use marax_common::logging::{init_tracing, LogFormat};
use marax_metrics::{new_registry, spawn_http_server, ExporterMetrics, StatusExporter};
use marax_protocol::{MachineMode, StatusSource};
use tokio::signal;
use tracing::info;

mod device;

const SERVICE_NAME: &str = "marax-exporter";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Prometheus exporter for the Lelit Mara X serial status line",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long = "serial-dev", value_name = "PATH", help = "Path to the serial device to read")]
    serial_dev: Option<String>,

    #[arg(long, help = "Serial baud rate")]
    baud_rate: Option<u32>,

    #[arg(long, help = "Port for the http server to listen on (all interfaces)")]
    port: Option<u16>,

    #[arg(long, value_name = "ADDR", conflicts_with = "port", help = "Full listen address for the http server")]
    listen: Option<SocketAddr>,

    #[arg(long, value_name = "FORMAT", help = "Override the log format (structured-json, json, pretty)")]
    log_format: Option<LogFormat>,

    #[arg(long, value_enum, value_name = "MODE", help = "Read from a simulated machine instead of the serial device")]
    simulate: Option<CliMachineMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMachineMode {
    Coffee,
    Steam,
}

impl From<CliMachineMode> for MachineMode {
    fn from(value: CliMachineMode) -> Self {
        match value {
            CliMachineMode::Coffee => MachineMode::Coffee,
            CliMachineMode::Steam => MachineMode::Steam,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Serve metrics until interrupted")]
    Run,
    #[command(about = "Read one status record, print it as JSON and exit")]
    Probe,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ExporterConfig) {
        if let Some(device) = &self.serial_dev {
            config.serial.device = device.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(port) = self.port {
            config.metrics.listen.set_port(port);
        }
        if let Some(listen) = self.listen {
            config.metrics.listen = listen;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/marax.toml"));
    candidates.push(PathBuf::from("/etc/marax-exporter/marax.toml"));

    let loaded = ExporterConfig::load(&candidates)?;
    let mut config = loaded.config;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_tracing(SERVICE_NAME, &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; running with defaults"),
    }

    let reader = device::open_reader(&config.serial, cli.simulate.map(MachineMode::from))?;
    let source = StatusSource::new(reader, config.serial.read_timeout);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_exporter(config, source).await?,
        Commands::Probe => {
            let status = source.poll().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn run_exporter(config: ExporterConfig, source: StatusSource) -> Result<()> {
    let registry = new_registry();
    let metrics = ExporterMetrics::new(registry)?;
    metrics.set_build_info(env!("CARGO_PKG_VERSION"));

    let read_timeout = source.read_timeout();
    let exporter = Arc::new(StatusExporter::new(source, metrics));
    let server = spawn_http_server(exporter, config.metrics.listen, &config.metrics.path)?;

    info!(
        address = %server.addr(),
        device = %config.serial.device,
        read_timeout = ?read_timeout,
        "exporter running; waiting for termination signal"
    );
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    server.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::try_parse_from([
            "marax-exporter",
            "--serial-dev",
            "/dev/ttyUSB0",
            "--port",
            "9100",
            "--log-format",
            "json",
        ])
        .unwrap();
        let mut config = ExporterConfig::default();
        config.logging.format = LogFormat::Pretty;
        cli.apply_overrides(&mut config);

        assert_eq!(config.serial.device, "/dev/ttyUSB0");
        assert_eq!(config.metrics.listen.port(), 9100);
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["marax-exporter", "--log-format", "xml"]).is_err());
    }
}
