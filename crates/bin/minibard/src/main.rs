//! # minibard — minibar daemon
//!
//! Composition root that wires a device backend into the action engine and
//! exposes it on the command line.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialise `tracing`
//! - Construct the configured device directory (adapter)
//! - Construct the `ActionEngine`, injecting the directory via the port trait
//! - Trigger actions on a blocking worker and stop them on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use minibar_adapter_audio::PcmClip;
use minibar_adapter_virtual::VirtualDirectory;
use minibar_app::engine::ActionEngine;
use minibar_app::ports::DeviceDirectory;
use minibar_domain::running_action::{LogLevel, RunningAction};
use minibar_domain::time::elapsed_ms;
use tracing_subscriber::EnvFilter;

use crate::config::{BackendKind, Config};

#[derive(Parser)]
#[command(name = "minibard", version, about = "Trigger beverage machine actions")]
struct Cli {
    /// Path of the configuration file
    #[arg(short, long, global = true, default_value = "minibar.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the devices the backend can see right now
    Devices,
    /// List configured actions
    Actions,
    /// Trigger a configured action and print its log
    Trigger {
        /// Name of the action in the configuration file
        name: String,
        /// Print the run as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    init_tracing(&config.logging.filter);

    match config.backend_kind()? {
        BackendKind::Virtual => {
            let directory = VirtualDirectory::from_config(&config.backend.virtual_devices);
            run(cli.command, &config, directory).await
        }
        BackendKind::Cpal => run_cpal(cli.command, &config).await,
    }
}

#[cfg(feature = "cpal")]
async fn run_cpal(command: Command, config: &Config) -> anyhow::Result<ExitCode> {
    run(command, config, minibar_adapter_audio::CpalDirectory).await
}

#[cfg(not(feature = "cpal"))]
async fn run_cpal(_command: Command, _config: &Config) -> anyhow::Result<ExitCode> {
    anyhow::bail!("minibard was built without the `cpal` feature")
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?} ({err}), falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run<D>(command: Command, config: &Config, directory: D) -> anyhow::Result<ExitCode>
where
    D: DeviceDirectory + 'static,
{
    match command {
        Command::Devices => {
            list_devices(&directory)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Actions => {
            list_actions(config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Trigger { name, json } => trigger(config, directory, &name, json).await,
    }
}

fn list_devices<D: DeviceDirectory>(directory: &D) -> anyhow::Result<()> {
    let devices = directory.devices().context("failed to enumerate devices")?;
    if devices.is_empty() {
        println!("no devices attached");
    }
    for device in devices {
        let capabilities: Vec<String> = device.capabilities.iter().map(ToString::to_string).collect();
        println!("{}\t{}", device.name, capabilities.join(", "));
    }
    Ok(())
}

fn list_actions(config: &Config) {
    for name in config.actions.keys() {
        match config.action(name) {
            Ok(action) => {
                let clip = config
                    .sound_file(name)
                    .and_then(|path| std::fs::read(path).ok())
                    .and_then(|bytes| PcmClip::decode(&bytes).ok())
                    .map(|clip| format!(" [{:.1}s]", clip.duration().as_secs_f32()))
                    .unwrap_or_default();
                println!("{name}\t{action}{clip}");
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                tracing::warn!(action = %name, error = %format!("{err:#}"), "action unavailable");
                println!("{name}\t(unavailable)");
            }
        }
    }
}

#[tracing::instrument(skip(config, directory))]
async fn trigger<D>(
    config: &Config,
    directory: D,
    name: &str,
    json: bool,
) -> anyhow::Result<ExitCode>
where
    D: DeviceDirectory + 'static,
{
    let action = config.action(name)?;
    let engine = ActionEngine::new(directory);
    let mut running = RunningAction::for_action(&action);
    let stop = running.stop_handle();

    let mut worker = tokio::task::spawn_blocking(move || {
        engine.trigger(&action, &mut running);
        running
    });
    let running = tokio::select! {
        result = &mut worker => result?,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::info!("stop requested");
                    stop.stop();
                }
                Err(err) => tracing::warn!(%err, "failed to listen for ctrl-c"),
            }
            worker.await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&running)?);
    } else {
        print_log(&running);
    }
    Ok(if running.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_log(running: &RunningAction) {
    println!("{} [{}]", running.description(), running.id());
    for entry in running.entries() {
        let level = match entry.level {
            LogLevel::Info => "INFO ",
            LogLevel::Error => "ERROR",
        };
        println!(
            "{} {level} {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.message
        );
    }
    match running.finished_at() {
        Some(finished) => println!(
            "status: {:?} after {}ms",
            running.status(),
            elapsed_ms(running.started_at(), finished)
        ),
        None => println!("status: {:?}", running.status()),
    }
}
