//! lsl2osc - Forward discovered sample streams as OSC messages
//!
//! Every delivered sample becomes one OSC message addressed
//! `/<type>/<name>` carrying the sample's values.

use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use lsl_osc::delivery::DrainPolicy;
use lsl_osc::osc::{OscConfig, OscMessage, OscSender};
use lsl_osc::reader::{ContinuousReader, ReaderConfig};
use lsl_osc::registry::OpenMode;
use lsl_osc::stream::ChannelValue;
use lsl_osc::substrate::{DiscoveryConfig, MemoryConnector, SyntheticSource};

/// Slowest accepted polling period
const MAX_TICK_MS: u64 = 60_000;

/// Pipe data from discovered streams to OSC
#[derive(Parser, Debug)]
#[command(name = "lsl2osc")]
#[command(version)]
#[command(about = "Pipe data from discovered streams to OSC")]
struct Args {
    /// Stream filter, e.g. "type='EEG'" or "(type='EEG' and name='BioSemi') or type='HR'".
    /// Case-sensitive. Empty matches every stream.
    #[arg(long, default_value = "")]
    pred: String,

    /// OSC destination address
    #[arg(long, default_value = "127.0.0.1")]
    ip: IpAddr,

    /// OSC destination port
    #[arg(long, default_value = "5005")]
    port: u16,

    /// Echo every forwarded message
    #[arg(short, long)]
    verbose: bool,

    /// Only follow the first matching stream
    #[arg(long)]
    single: bool,

    /// Forward every buffered sample instead of only the latest per tick
    #[arg(long)]
    all: bool,

    /// Polling period in milliseconds (1 to 60000)
    #[arg(
        long,
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..=MAX_TICK_MS)
    )]
    tick_ms: u64,

    /// Seconds a stopped stream stays discoverable
    #[arg(long, default_value = "5")]
    forget_after: f64,

    /// Synthetic source TYPE:NAME[:CHANNELS[:RATE]] (repeatable)
    #[arg(long = "source", value_name = "SPEC")]
    sources: Vec<SyntheticSource>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> lsl_osc::Result<()> {
    let discovery = DiscoveryConfig::default()
        .predicate(args.pred)
        .forget_after(Duration::try_from_secs_f64(args.forget_after)?);
    let network = discovery.network();
    // A malformed predicate stops us here, before polling starts
    let resolver = discovery.resolver(network.clone())?;

    let mut sender = OscSender::bind(&OscConfig::with_target(args.ip, args.port)).await?;

    if args.sources.is_empty() {
        tracing::info!("No synthetic sources given, the in-process network is empty");
    }
    let producers = args
        .sources
        .into_iter()
        .map(|source| source.spawn(&network))
        .collect::<Result<Vec<_>, _>>()?;

    let config = ReaderConfig::default()
        .fetch_all(!args.single)
        .open_mode(OpenMode::Background);
    let mut reader = ContinuousReader::new(resolver, MemoryConnector::new(network), config);
    let policy = DrainPolicy::from_latest_only(!args.all);

    let mut ticker = tokio::time::interval(Duration::from_millis(args.tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    println!("Now watching for streams...");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                reader.for_each(
                    |sample| {
                        let message = OscMessage::from_sample(&sample);
                        if args.verbose {
                            println!(
                                "{} [{}] @ {:.3} ({}, {}, {} Hz, {})",
                                message.address,
                                describe(sample.values()),
                                sample.timestamp(),
                                sample.host(),
                                sample.uid(),
                                sample.nominal_srate(),
                                sample.format_label(),
                            );
                        }
                        sender.forward(&message);
                    },
                    policy,
                );
            }
            _ = &mut shutdown => {
                println!("Catching Ctrl-C or SIGTERM, bye!");
                break;
            }
        }
    }

    for producer in producers {
        producer.abort();
    }

    Ok(())
}

fn describe(values: &[ChannelValue]) -> String {
    values
        .iter()
        .map(|v| match v {
            ChannelValue::String(s) => format!("{:?}", s),
            other => other.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
