//! Failover Dispatch CLI
//!
//! Sends read queries to whichever endpoint of a pool is most likely to answer.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌────────────────────────────────────────────────────────┐
//!                   │                   FAILOVER DISPATCH                     │
//!   fetch <path>    │  ┌──────────┐    ┌────────────┐    ┌───────────────┐   │
//!   ────────────────┼─▶│  engine  │───▶│  selector  │───▶│    prober     │───┼──▶ probe GET
//!                   │  └────┬─────┘    └─────┬──────┘    └───────┬───────┘   │
//!                   │       │                │ scores            │ outcomes  │
//!                   │       │                ▼                   ▼           │
//!                   │       │          ┌──────────────────────────────┐      │
//!                   │       │          │        health registry       │◀─┐   │
//!                   │       │          └──────────────────────────────┘  │   │
//!                   │       ▼                                    janitor ─┘   │
//!                   │  ┌──────────────────┐                                   │
//!   { server, data }│  │ retry + timeout  │──── primary, then fallbacks ──────┼──▶ query GET
//!   ◀───────────────┼──│  per endpoint    │                                   │
//!                   │  └──────────────────┘                                   │
//!                   └────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use failover_dispatch::config::watcher::{changed_sections, ConfigWatcher};
use failover_dispatch::config::{resolve_config, DispatcherConfig};
use failover_dispatch::health::{BatchOutcome, HealthRegistry};
use failover_dispatch::lifecycle::{signals, startup, Components, Shutdown};

#[derive(Parser)]
#[command(name = "failover-dispatch")]
#[command(
    about = "Dispatch read queries across a pool of interchangeable endpoints",
    long_about = None
)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint address; repeat to build the pool. Replaces the configured list.
    #[arg(short, long = "endpoint")]
    endpoints: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch a JSON GET query and print the answer with the serving endpoint
    Fetch {
        /// Path and query appended to the chosen endpoint.
        path: String,

        /// Per-attempt timeout in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Retries per endpoint.
        #[arg(long)]
        retries: Option<u32>,

        /// Skip health probing and scoring.
        #[arg(long)]
        no_health_check: bool,
    },
    /// Probe every endpoint once and print the health report
    Probe,
    /// Keep probing and evicting until Ctrl+C, reloading the config file on change
    Monitor {
        /// Seconds between probe attempts. Probe rounds are still limited to one
        /// per `health.probe_window_secs`; a report is printed only after a round runs.
        #[arg(long, default_value_t = 60)]
        report_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    apply_endpoint_override(&mut config, &cli.endpoints);

    startup::init_observability(&config);
    tracing::info!(
        endpoints = config.endpoint_list().len(),
        timeout_ms = config.dispatch.timeout_ms,
        retry_count = config.dispatch.retry_count,
        health_check = config.dispatch.health_check_enabled,
        "Configuration loaded"
    );

    let components = Components::build(&config)?;

    match cli.command {
        Commands::Fetch {
            path,
            timeout_ms,
            retries,
            no_health_check,
        } => {
            let mut dispatch = config.dispatch.clone();
            if let Some(timeout_ms) = timeout_ms {
                dispatch.timeout_ms = timeout_ms;
            }
            if let Some(retries) = retries {
                dispatch.retry_count = retries;
            }
            if no_health_check {
                dispatch.health_check_enabled = false;
            }

            let requester = &components.requester;
            let result = components
                .engine
                .run(
                    &config.endpoints,
                    path,
                    |endpoint, path| requester.get_json(endpoint, path),
                    &dispatch,
                )
                .await;

            match result {
                Ok(dispatched) => println!("{}", serde_json::to_string_pretty(&dispatched)?),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Probe => {
            components.prober.probe_batch(&config.endpoint_list()).await;
            print_report(&components.registry)?;
        }
        Commands::Monitor { report_secs } => {
            monitor(cli.config, cli.endpoints, config, components, report_secs).await?;
        }
    }

    Ok(())
}

fn apply_endpoint_override(config: &mut DispatcherConfig, endpoints: &[String]) {
    if !endpoints.is_empty() {
        config.endpoints = endpoints.join("\n");
    }
}

fn print_report(registry: &HealthRegistry) -> Result<(), serde_json::Error> {
    let report = registry.snapshot(Instant::now());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn monitor(
    config_path: Option<PathBuf>,
    endpoint_override: Vec<String>,
    config: DispatcherConfig,
    components: Components,
    report_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = ArcSwap::from_pointee(config.clone());
    let shutdown = Arc::new(Shutdown::new());
    let mut stop = shutdown.subscribe();

    let mut prober = components.prober.clone();
    let mut janitor = tokio::spawn(components.janitor(&config).run(shutdown.subscribe()));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { signals::shutdown_on_ctrl_c(&shutdown).await });
    }

    // Without a config file the channel simply never yields.
    let (_watcher, mut updates) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(&path, config.clone());
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let mut ticker = time::interval(Duration::from_secs(report_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let endpoints = current.load().endpoint_list();
                match prober.probe_batch(&endpoints).await {
                    BatchOutcome::Throttled => {
                        tracing::debug!("Probe window still open, skipping report");
                    }
                    BatchOutcome::Probed { .. } => print_report(&components.registry)?,
                }
            }
            Some(mut new_config) = updates.recv() => {
                apply_endpoint_override(&mut new_config, &endpoint_override);
                let changed = changed_sections(&current.load(), &new_config);

                if changed.contains(&"health") {
                    // Same registry, fresh probe window and eviction settings.
                    prober = components.prober_for(&new_config.health);
                    janitor.abort();
                    let sweeper = components.janitor(&new_config).run(shutdown.subscribe());
                    janitor = tokio::spawn(sweeper);
                }
                if changed.contains(&"observability") {
                    tracing::warn!("Observability settings changed, restart to apply them");
                }

                tracing::info!(
                    ?changed,
                    endpoints = new_config.endpoint_list().len(),
                    "Configuration reloaded"
                );
                current.store(Arc::new(new_config));
            }
            _ = stop.recv() => {
                tracing::info!("Monitor stopping");
                break;
            }
        }
    }

    Ok(())
}
