use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use sensor_ingest::config::{BleConfig, TransportConfig, UdpConfig};
use sensor_ingest::engine::{Session, SessionOptions};
use sensor_ingest::hal::mock::SimulatedGattClient;
use sensor_ingest::hal::BleTransport;
use sensor_ingest::storage::FileSink;
use sensor_ingest::{SessionConfig, SessionState};

#[derive(Parser, Debug)]
#[command(name = "sensor-ingest", about = "Record sensor module telemetry over UDP or BLE")]
struct Cli {
    /// JSON session config; command-line options override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Append accepted frames to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Samples kept per channel
    #[arg(long, global = true)]
    capacity: Option<usize>,

    /// Write the frame sequence as the first log column
    #[arg(long, global = true)]
    record_sequence: bool,

    /// Status line interval in milliseconds
    #[arg(long, global = true, default_value_t = 500)]
    status_interval_ms: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Listen for comma-delimited datagrams
    Udp {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Poll the sensor module's GATT characteristics
    Ble {
        #[arg(long)]
        name: Option<String>,
    },
    /// Poll a simulated sensor module (no hardware needed)
    Simulate {
        #[arg(long, default_value_t = 100)]
        poll_interval_ms: u64,
    },
    /// Print the effective config as JSON and exit
    ShowConfig,
}

fn build_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    match &cli.command {
        Command::Udp { bind } => {
            let mut udp = match &config.transport {
                TransportConfig::Udp(udp) => udp.clone(),
                _ => UdpConfig::default(),
            };
            if let Some(bind) = bind {
                udp.bind_addr = bind.clone();
            }
            config.transport = TransportConfig::Udp(udp);
        }
        Command::Ble { name } => {
            let mut ble = match &config.transport {
                TransportConfig::Ble(ble) => ble.clone(),
                _ => BleConfig::default(),
            };
            if let Some(name) = name {
                ble.device_name = name.clone();
            }
            config.transport = TransportConfig::Ble(ble);
        }
        _ => {}
    }

    if let Some(log) = &cli.common.log {
        config.log_path = log.clone();
    }
    if let Some(capacity) = cli.common.capacity {
        config.buffer_capacity = capacity;
    }
    if cli.common.record_sequence {
        config.record_sequence = true;
    }

    config.validate()?;
    Ok(config)
}

fn status_line(session: &Session) -> String {
    let mut line = format!(
        "[{}] {} | {}",
        session.session_state().name(),
        session.connection_state(),
        session.stats().summary()
    );
    if let Some(frame) = session.latest_frame() {
        let labelled: Vec<String> = frame
            .labelled()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect();
        line.push_str(" | ");
        line.push_str(&labelled.join(" "));
    }
    line
}

async fn run(mut session: Session, status_interval: Duration) -> Result<SessionState> {
    let mut ticker = tokio::time::interval(status_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("{}", status_line(&session));
                if session.is_finished() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                println!("Stopping...");
                break;
            }
        }
    }

    let final_state = session.stop_session().await;
    println!("{}", status_line(&session));
    if let Some(err) = session.last_error() {
        println!("Last error: {}", err);
    }
    Ok(final_state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let status_interval = Duration::from_millis(cli.common.status_interval_ms.max(50));

    let session = match &cli.command {
        Command::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        Command::Simulate { poll_interval_ms } => {
            let ble = BleConfig {
                settle_delay_ms: 0,
                poll_interval_ms: *poll_interval_ms,
                ..BleConfig::default()
            };
            let transport = BleTransport::new(SimulatedGattClient::with_config(&ble), ble);
            let sink = FileSink::open(&config.log_path).await?;
            Session::start_with(Box::new(transport), Box::new(sink), SessionOptions::from(&config))?
        }
        Command::Udp { .. } | Command::Ble { .. } => Session::start(config).await?,
    };

    let final_state = run(session, status_interval).await?;
    if let SessionState::Failed { reason, .. } = final_state {
        anyhow::bail!("session failed: {}", reason);
    }
    Ok(())
}
