use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WatcherConfig;
use workflow::runner::Runner;

mod console;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Keeps the detection list and map in sync with the detection service")]
struct Args {
    /// Base URL of the detection service
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
    /// Load the watcher config from YAML (overrides the surface flags)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 8)]
    list_interval: u64,
    #[arg(long, default_value_t = 30)]
    map_interval: u64,
    #[arg(long, default_value_t = 15)]
    list_capacity: usize,
    /// Seconds between console refreshes while watching
    #[arg(long, default_value_t = 5)]
    refresh: u64,
    /// Run a single full load for both surfaces, print, and exit
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Print `--once` reports as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.config {
        WatcherConfig::load(path)?
    } else {
        WatcherConfig::from_args(
            &args.server,
            args.list_interval,
            args.map_interval,
            args.list_capacity,
        )
    };

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;

    runtime.block_on(async {
        let runner = Runner::new(&config)?;

        if args.once {
            let reports = runner.run_once().await;
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&reports).context("encoding reports")?
                );
            } else {
                for report in &reports {
                    runner.printer().publish(report);
                }
            }
            return Ok(());
        }

        runner
            .printer()
            .publish_status(&format!("watching {} (Ctrl+C to stop)...", config.server_url));
        runner
            .serve(Duration::from_secs(args.refresh.max(1)), async {
                if let Err(err) = signal::ctrl_c().await {
                    log::error!("awaiting Ctrl+C failed: {}", err);
                }
            })
            .await;
        for controller in [runner.list(), runner.map()] {
            let metrics = controller.metrics();
            runner.printer().publish_status(&format!(
                "{} deactivated: {} polls, {} full loads, {} inserted, {} failures",
                controller.config().name,
                metrics.polls,
                metrics.full_loads,
                metrics.inserted,
                metrics.failures
            ));
        }
        Ok::<(), anyhow::Error>(())
    })
}
