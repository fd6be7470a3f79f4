//! Robot Telemetry - agent binary
//!
//! Reads sensor events as JSON lines on standard input, probes the host and
//! publishes one telemetry snapshot per tick to RabbitMQ.

use clap::{Args, Parser, Subcommand};
use robot_telemetry::config::{
    resolve_robot_name, DEFAULT_BATTERY_CAPACITY_WH, DEFAULT_QUEUE_NAME,
    DEFAULT_TICK_INTERVAL_SECS,
};
use robot_telemetry::sensors::source::{spawn_stdin_source, EVENT_CHANNEL_CAPACITY};
use robot_telemetry::{
    AgentConfig, AmqpChannel, BrokerSettings, ComputeProbe, HardwareProbe, SensorView,
    SnapshotBuilder, TelemetryAgent, TelemetrySnapshot,
};
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "robot_telemetry")]
#[command(about = "Robot telemetry agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Fuses robot sensor readings and host hardware state into periodic telemetry snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Robot identifier (defaults to the host name)
    #[arg(long, env = "ROBOT_NAME")]
    robot_name: Option<String>,

    /// Battery pack capacity in watt-hours
    #[arg(long, env = "BATTERY_SPEC_WH", default_value_t = DEFAULT_BATTERY_CAPACITY_WH)]
    battery_wh: f64,

    /// Seconds between telemetry snapshots
    #[arg(short, long, default_value_t = DEFAULT_TICK_INTERVAL_SECS)]
    interval: u64,

    /// Destination queue
    #[arg(long, env = "TELEMETRY_QUEUE", default_value = DEFAULT_QUEUE_NAME)]
    queue: String,

    #[command(flatten)]
    broker: BrokerArgs,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the broker and publish telemetry (default)
    Run,

    /// Build a single snapshot from host state only and print it
    Snapshot(SnapshotArgs),

    /// Show detected hardware
    Probe,
}

#[derive(Args)]
struct BrokerArgs {
    /// Full broker URI, overrides the individual settings
    #[arg(long, env = "RABBITMQ_URI", hide_env_values = true)]
    rabbitmq_uri: Option<String>,

    #[arg(long, env = "RABBITMQ_HOST")]
    rabbitmq_host: Option<String>,

    #[arg(long, env = "RABBITMQ_PORT")]
    rabbitmq_port: Option<u16>,

    #[arg(long, env = "RABBITMQ_USER")]
    rabbitmq_user: Option<String>,

    #[arg(long, env = "RABBITMQ_PASS", hide_env_values = true)]
    rabbitmq_pass: Option<String>,

    #[arg(long, env = "RABBITMQ_VHOST")]
    rabbitmq_vhost: Option<String>,
}

impl From<BrokerArgs> for BrokerSettings {
    fn from(args: BrokerArgs) -> Self {
        Self {
            uri: args.rabbitmq_uri,
            host: args.rabbitmq_host,
            port: args.rabbitmq_port,
            user: args.rabbitmq_user,
            password: args.rabbitmq_pass,
            vhost: args.rabbitmq_vhost,
        }
    }
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = AgentConfig::new(resolve_robot_name(cli.robot_name.as_deref()))
        .with_battery_capacity_wh(cli.battery_wh)
        .with_tick_interval_secs(cli.interval)
        .with_queue_name(cli.queue);

    match cli.command {
        Some(Commands::Run) | None => run_command(config, cli.broker).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(config, &args)?,
        Some(Commands::Probe) => probe_command(),
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(level, rust_log.as_deref()))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Level from the command line flags, refined by `RUST_LOG` directives when set.
fn log_filter(level: Level, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives.unwrap_or_default())
}

async fn run_command(config: AgentConfig, broker: BrokerArgs) -> anyhow::Result<()> {
    config.validate()?;
    let broker = BrokerSettings::from(broker).resolve()?;
    info!("ROBOT_NAME = {}", config.robot_name);

    let channel = AmqpChannel::connect(&broker, &config.queue_name).await?;
    let probe = HardwareProbe::detect();
    info!("Hardware probe ready (GPU backend: {})", probe.gpu_backend());

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let source = spawn_stdin_source(events_tx);

    let mut agent = TelemetryAgent::new(config, probe, channel);
    let stats = agent
        .run(events_rx, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    source.abort();

    info!(
        "Stopped after {} ticks ({} delivered, {} dropped, {} sensor events)",
        stats.ticks, stats.delivered, stats.dropped, stats.events
    );

    agent.into_channel().close().await?;
    Ok(())
}

fn snapshot_command(config: AgentConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let mut probe = HardwareProbe::detect();
    let builder = SnapshotBuilder::new(config.robot_name, config.battery_capacity_wh);
    let snapshot = builder.build(&SensorView::default(), probe.probe());

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        "pretty" => print_pretty_snapshot(&snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn probe_command() {
    let mut probe = HardwareProbe::detect();
    let compute = probe.probe();

    println!("Hardware");
    println!("========");
    println!(
        "  CPU: {} ({} cores, {}, {:.0} MHz)",
        compute.cpu.model, compute.cpu.cores, compute.cpu.architecture, compute.cpu.frequency_mhz
    );
    println!(
        "  Memory: {:.1} GB total",
        compute.memory.total_bytes as f64 / 1024.0 / 1024.0 / 1024.0
    );
    println!(
        "  Disk: {} ({:.1} GB total, {:.1}% used)",
        compute.disk.disk_type,
        compute.disk.total_bytes as f64 / 1024.0 / 1024.0 / 1024.0,
        compute.disk.usage_percent
    );
    match &compute.gpu.name {
        Some(name) if compute.gpu.available => println!("  GPU: {}", name),
        _ => println!("  GPU: not available (backend: {})", probe.gpu_backend()),
    }
    match &compute.npu.name {
        Some(name) if compute.npu.available => println!(
            "  NPU: {} ({:.1}% load)",
            name, compute.npu.utilization_percent
        ),
        _ => println!("  NPU: not available"),
    }
}

fn print_pretty_snapshot(snapshot: &TelemetrySnapshot) {
    println!(
        "Telemetry Snapshot for {} ({})",
        snapshot.bot,
        chrono::DateTime::from_timestamp_nanos(snapshot.ts as i64).format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}", snapshot.report());
}
