//! vigia CLI - demo operation producer for the completion monitor.
//!
//! Spawns the classic demo set (slow factorials labeled A, B and C), watches
//! them with [`vigia_core::watch_pending`], then prints the results the
//! operations delivered. Progress goes to stdout; diagnostics go to stderr
//! behind an `EnvFilter` so they never interleave with the dot stream unless
//! asked for.

use std::env;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vigia_core::{LabeledOps, MonitorConfig, watch_pending};

const USAGE: &str = "\
Usage: vigia [--interval <secs>] [--cycle <secs>]

Watches the demo operations (A: 23 steps, B: 34, C: 45, one second per
step) and reports progress: one '.' per idle interval, the pending list
after every idle cycle without a completion, and one line per finished
operation.

Options:
  --interval <secs>   Seconds between idle dots (default 0.1)
  --cycle <secs>      Idle seconds before a pending-list report (default 5)
  -h, --help          Print this help";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn parse_args(args: &[String]) -> Result<Option<MonitorConfig>> {
    let mut config = MonitorConfig::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--interval" => config.interval = parse_seconds(iter.next(), "--interval")?,
            "--cycle" => config.cycle = parse_seconds(iter.next(), "--cycle")?,
            other => bail!("unknown argument '{other}'\n\n{USAGE}"),
        }
    }
    Ok(Some(config))
}

fn parse_seconds(value: Option<&String>, flag: &str) -> Result<Duration> {
    let raw = value.with_context(|| format!("{flag} requires a value in seconds"))?;
    let secs: f64 = raw
        .parse()
        .with_context(|| format!("{flag}: '{raw}' is not a number"))?;
    if !secs.is_finite() || secs <= 0.0 {
        bail!("{flag} must be a positive number of seconds");
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Slow factorial: one second of simulated work per multiplication step.
///
/// The result travels through the oneshot channel, not the join handle; the
/// monitor only ever sees the opaque handle.
fn spawn_factorial(steps: u64) -> (JoinHandle<()>, oneshot::Receiver<f64>) {
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        let mut product = 1.0_f64;
        for factor in 2..=steps {
            tokio::time::sleep(Duration::from_secs(1)).await;
            product *= factor as f64;
        }
        let _ = tx.send(product);
    });
    (handle, rx)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(config) = parse_args(&args)? else {
        println!("{USAGE}");
        return Ok(());
    };

    let steps = [("A", 23_u64), ("B", 34), ("C", 45)];
    let mut ops = LabeledOps::new();
    let mut results = Vec::new();
    for (label, n) in steps {
        let (handle, rx) = spawn_factorial(n);
        ops.insert(label, handle);
        results.push((label, n, rx));
    }

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let stats = watch_pending(ops, &mut sink, config)
        .await
        .context("monitor failed")?;
    tracing::debug!(
        completed = stats.completed,
        idle_ticks = stats.idle_ticks,
        "watch finished"
    );

    for (label, n, rx) in results {
        match rx.await {
            Ok(value) => println!("{label} ({n}!) = {value:e}"),
            Err(_) => tracing::warn!(label, "operation finished without delivering a result"),
        }
    }

    Ok(())
}
