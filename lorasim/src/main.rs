//! main - runs a simulated LoRaWAN device and packet forwarder against a network server

use anyhow::Result;
use async_std::channel::Sender;
use async_std::prelude::*;
use clap::Parser;
use lorasim::LoraSim;
use signal_hook::consts::signal::*;
use signal_hook_async_std::Signals;
use slog::{Drain, Logger, info, o};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file describing the gateway, the device and its session keys.
    #[arg(long, default_value = "lorasim.toml")]
    config: String,

    /// Network server address (host:port) to forward to.  Overrides [udp] server in the config file.
    #[arg(long)]
    server: Option<String>,

    /// Milliseconds between uplinks.  Overrides [default_data] interval in the config file.
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[async_std::main]
async fn main() -> Result<()> {
    exit_on_panic();
    let logger = init_logging();

    let args = Args::parse();
    let mut config = lorasim::load_config_file(&args.config, &logger)?;
    if let Some(server) = args.server {
        config.udp.server = server;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.default_data.interval = interval_ms;
    }

    let sim = LoraSim::start(config, logger.clone()).await?;

    wait_for_signal().await?;
    let uplinks = sim.counters().uplinks();
    let session = sim.graceful_shutdown().await;
    info!(
        &logger,
        "Sent {uplinks} uplinks, next FCnt {}", session.fcnt_up()
    );

    Ok(())
}

fn init_logging() -> Logger {
    // Use info level logging by default
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info") }
    }
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog_envlogger::new(drain);
    slog::Logger::root(drain, o!())
}

fn exit_on_panic() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        std::process::exit(1);
    }));
}

async fn wait_for_signal() -> Result<i32> {
    let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
    let handle = signals.handle();
    let (sig_sender, sig_receiver) = async_std::channel::unbounded();
    let signals_task = async_std::task::spawn(handle_signals(signals, sig_sender));
    let signal = sig_receiver.recv().await;
    handle.close();
    signals_task.await;
    Ok(signal?)
}

async fn handle_signals(signals: Signals, sig_sender: Sender<i32>) {
    let mut signals = signals.fuse();
    while let Some(signal) = signals.next().await {
        match signal {
            // Nothing to reload.
            SIGHUP => {}
            SIGTERM | SIGINT | SIGQUIT => {
                let _ = sig_sender.send(signal).await;
            }
            _ => unreachable!(),
        }
    }
}
