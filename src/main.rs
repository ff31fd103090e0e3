//! QR Scan CLI
//!
//! Opens a camera (or a still image), scans until a QR code decodes and
//! prints its payload on stdout. Exits non-zero when the scan ends
//! without a value.

use clap::Parser;
use qr_scan::{
    capture::{Camera, FileConfig, ImageFileCamera},
    decode::RqrrDecoder,
    permission::{PermissionProvider, PromptPermission, StaticPermission},
    session::{LogPreview, ScanScreen, ScreenDeps, StderrNotifier},
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Scan a QR code from a camera or an image file.
#[derive(Debug, Parser)]
#[command(name = "qr-scan", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera device index (overrides the config file).
    #[arg(short, long)]
    device: Option<u32>,

    /// Scan a still image instead of a camera.
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Treat camera access as granted without asking.
    #[arg(long)]
    grant: bool,

    /// Serve Prometheus metrics on this port (0 disables).
    #[arg(long)]
    metrics_port: Option<u16>,
}

fn load_config(cli: &Cli) -> Result<FileConfig, qr_scan::ScanError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(device) = cli.device {
        config.capture.device_id = device;
    }
    if cli.grant {
        config.permission.auto_grant = true;
    }
    if let Some(port) = cli.metrics_port {
        config.output.metrics_port = port;
    }
    config.validate()?;
    Ok(config)
}

fn camera_for(cli: &Cli) -> Option<Box<dyn Camera>> {
    if let Some(path) = &cli.image {
        return Some(Box::new(ImageFileCamera::new(path)));
    }
    native_camera()
}

#[cfg(feature = "camera")]
fn native_camera() -> Option<Box<dyn Camera>> {
    Some(Box::new(qr_scan::capture::NokhwaCamera::new()))
}

#[cfg(not(feature = "camera"))]
fn native_camera() -> Option<Box<dyn Camera>> {
    None
}

#[cfg(feature = "metrics")]
fn start_metrics(port: u16, stats: Arc<qr_scan::session::ScanStats>) {
    use qr_scan::metrics::{MetricsRegistry, MetricsServer, MetricsServerConfig};

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            return;
        }
    };
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry, stats);

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Metrics runtime failed to start: {}", e);
                return;
            }
        };
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn start_metrics(port: u16, _stats: Arc<qr_scan::session::ScanStats>) {
    warn!(port, "Built without the `metrics` feature; not serving metrics");
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only the payload
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("QR Scan v{}", qr_scan::VERSION);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    let Some(camera) = camera_for(&cli) else {
        eprintln!("No camera backend: pass --image or build with the `camera` feature");
        return ExitCode::from(2);
    };

    let permission: Box<dyn PermissionProvider> = if config.permission.auto_grant {
        Box::new(StaticPermission::granted())
    } else {
        Box::new(PromptPermission::new())
    };

    let deps = ScreenDeps {
        camera,
        decoder: Arc::new(RqrrDecoder::new()),
        permission,
        notifier: Box::new(StderrNotifier),
        preview: Box::new(LogPreview::default()),
    };

    let screen = match ScanScreen::new(&config, deps) {
        Ok(screen) => screen,
        Err(e) => {
            error!("Failed to create scan screen: {}", e);
            return ExitCode::from(2);
        }
    };

    let handle = screen.handle();
    if let Err(e) = ctrlc::set_handler(move || {
        handle.cancel();
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    if config.output.metrics_port != 0 {
        start_metrics(config.output.metrics_port, Arc::clone(screen.stats()));
    }

    info!("Scanning; press Ctrl-C to cancel");
    let result = screen.run();

    match result.parse() {
        Some(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        None => {
            info!("Scan ended without a result");
            ExitCode::FAILURE
        }
    }
}
