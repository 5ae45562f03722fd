//! RDRAND device CLI
//!
//! Loads the rdrand device module and streams hardware random bytes to
//! stdout.

use clap::{Parser, ValueEnum};
use rdrand_device::{
    device::{DeviceModule, FileConfig, ModuleEvent, RdRandDevice},
    metrics::MetricsRegistry,
    source::RdRand,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Bytes requested per device read in follow mode.
const FOLLOW_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Hex,
    Raw,
}

#[derive(Debug, Parser)]
#[command(name = "rdrand", version, about = "Read hardware random bytes from the CPU")]
struct Cli {
    /// Number of bytes to read.
    #[arg(short = 'n', long, default_value_t = 32)]
    bytes: usize,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Hex)]
    format: Format,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stream until interrupted instead of reading a fixed count.
    #[arg(long)]
    follow: bool,
}

fn main() {
    // Logs go to stderr, stdout carries the random bytes
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("rdrand: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    info!("RDRAND device v{}", rdrand_device::VERSION);

    let config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    let metrics = MetricsRegistry::new()?;
    if config.metrics.port != 0 {
        spawn_metrics_server(config.metrics.port, metrics.clone());
    }

    let instruction = RdRand::detect();
    let mut module = DeviceModule::new(config.device, instruction).with_metrics(metrics.clone());
    module.handle(ModuleEvent::Load)?;

    let result = match module.device() {
        Some(device) if cli.follow => stream(&device, cli.format),
        Some(device) => read_count(&device, cli.bytes, cli.format),
        None => Ok(()),
    };

    module.handle(ModuleEvent::Unload)?;

    let snapshot = metrics.snapshot();
    info!(
        "Done. {} bytes delivered in {} reads, {} failures",
        snapshot.bytes_delivered, snapshot.reads, snapshot.read_failures
    );

    result
}

fn read_count(
    device: &RdRandDevice<RdRand>,
    count: usize,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let limit = device.config().max_transfer;
    let mut out = io::stdout().lock();
    let mut remaining = count;
    let mut buf = vec![0u8; limit.min(count)];

    while remaining > 0 {
        let chunk = &mut buf[..limit.min(remaining)];
        let n = read_chunk(device, chunk, &mut out, format)?;
        remaining -= n;
    }

    if matches!(format, Format::Hex) {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn stream(device: &RdRandDevice<RdRand>, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut out = io::stdout().lock();
    let mut buf = vec![0u8; device.config().max_transfer.min(FOLLOW_CHUNK)];

    while running.load(Ordering::SeqCst) {
        match read_chunk(device, &mut buf, &mut out, format) {
            Ok(_) => {}
            Err(e) if is_broken_pipe(e.as_ref()) => break,
            Err(e) => return Err(e),
        }
    }

    info!("Stream stopped");
    out.flush()?;
    Ok(())
}

/// Reads one chunk from the device and writes whatever was delivered.
fn read_chunk(
    device: &RdRandDevice<RdRand>,
    buf: &mut [u8],
    out: &mut impl Write,
    format: Format,
) -> Result<usize, Box<dyn std::error::Error>> {
    match device.read(buf) {
        Ok(n) => {
            emit(out, &buf[..n], format)?;
            Ok(n)
        }
        Err(rdrand_device::DeviceError::Read(err)) => {
            emit(out, &buf[..err.delivered], format)?;
            Err(err.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn emit(out: &mut impl Write, bytes: &[u8], format: Format) -> io::Result<()> {
    match format {
        Format::Raw => out.write_all(bytes),
        Format::Hex => {
            for b in bytes {
                write!(out, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

fn is_broken_pipe(err: &(dyn std::error::Error + 'static)) -> bool {
    err.downcast_ref::<io::Error>()
        .map(|e| e.kind() == io::ErrorKind::BrokenPipe)
        .unwrap_or(false)
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(port: u16, registry: MetricsRegistry) {
    use rdrand_device::metrics::{MetricsServer, MetricsServerConfig};

    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Failed to start metrics runtime: {}", e);
                return;
            }
        };
        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry);
        if let Err(e) = runtime.block_on(server.run()) {
            warn!("Metrics server stopped: {}", e);
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(port: u16, _registry: MetricsRegistry) {
    warn!(port, "Metrics port configured but built without the `metrics` feature");
}
