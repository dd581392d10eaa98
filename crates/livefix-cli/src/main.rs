//! Livefix CLI - drives the negotiation pipeline against simulated backends.
//!
//! The `watch` command plays the host UI role: it reacts to failures on the
//! result stream by running the simulated grant/resolution flows and
//! resuming the negotiation, exactly as a real host would.

mod cli;
mod sim;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use livefix::{
    ErrorKind, Fix, Priority, ReactiveBinding, RequestDescriptor, UpdateConfig, UpdateResult,
};
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Level;

use crate::cli::{Cli, Commands};
use crate::sim::{SimPermission, SimSensor, SimSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => UpdateConfig::load(path)?,
        None => UpdateConfig::load_or_default(Path::new("livefix.toml"))?,
    };

    match cli.command {
        Commands::Watch {
            deny_permission,
            settings_resolution,
            reject_resolution,
            fixes,
            switch_after,
            json,
        } => {
            watch(
                config,
                deny_permission,
                settings_resolution,
                reject_resolution,
                fixes,
                switch_after,
                json,
            )
            .await
        }
        Commands::Last { deny_permission } => last(deny_permission).await,
    }
}

async fn watch(
    config: UpdateConfig,
    deny_permission: bool,
    settings_resolution: bool,
    reject_resolution: bool,
    fixes: u32,
    switch_after: Option<u32>,
    json: bool,
) -> Result<()> {
    let permission = SimPermission::new(!deny_permission);
    let settings = SimSettings::new(!settings_resolution);
    let (handle, mut results) = livefix::spawn(
        Box::new(permission.clone()),
        Box::new(settings.clone()),
        Box::new(SimSensor::new()),
    );

    // Descriptors flow through the reactive binding: the newest always wins
    let (req_tx, req_rx) = mpsc::channel(4);
    let _binding = ReactiveBinding::bind(ReceiverStream::new(req_rx), handle.clone());
    req_tx.send(config.descriptor()?).await?;

    let mut streamed = 0u32;
    while let Some(result) = results.recv().await {
        if json {
            println!("{}", serde_json::to_string(&result)?);
        }
        match result {
            UpdateResult::Success(fix) => {
                if !json {
                    print_fix(&fix);
                }
                streamed += 1;
                if switch_after == Some(streamed) {
                    if !json {
                        println!("{} switching to a low-power descriptor", "*".cyan().bold());
                    }
                    let low_power = RequestDescriptor::new(Priority::LowPower, 5000, 2500)?;
                    req_tx.send(low_power).await?;
                }
                if streamed >= fixes {
                    handle.cancel();
                    break;
                }
            }
            UpdateResult::Failure(err) => match err.kind() {
                ErrorKind::PermissionsRequired => {
                    if !json {
                        println!(
                            "{} permission required; running host grant flow",
                            "!".yellow().bold()
                        );
                    }
                    handle.solicit_permission();
                    permission.grant();
                    handle.resume_after_permission();
                }
                ErrorKind::SettingsChangeRequired => match err.resolution() {
                    Some(token) if !reject_resolution => {
                        if !json {
                            println!(
                                "{} settings change required ({}); accepting resolution",
                                "!".yellow().bold(),
                                token.tag().unwrap_or("unspecified")
                            );
                        }
                        settings.resolve();
                        handle.resume_after_settings(true);
                    }
                    Some(_) => {
                        if !json {
                            println!(
                                "{} settings change required; rejecting resolution",
                                "!".yellow().bold()
                            );
                        }
                        handle.resume_after_settings(false);
                    }
                    None => {
                        if !json {
                            println!(
                                "{} settings change still required; giving up",
                                "x".red().bold()
                            );
                        }
                        break;
                    }
                },
                ErrorKind::Unavailable => {
                    if !json {
                        println!("{} location unavailable", "x".red().bold());
                    }
                    break;
                }
                ErrorKind::Cancelled => break,
            },
        }
    }

    Ok(())
}

async fn last(deny_permission: bool) -> Result<()> {
    let sensor = SimSensor::with_last_known(Fix::new(59.9139, 10.7522, 8.0));
    let (handle, mut results) = livefix::spawn(
        Box::new(SimPermission::new(!deny_permission)),
        Box::new(SimSettings::new(true)),
        Box::new(sensor),
    );

    handle.last_known();
    match tokio::time::timeout(Duration::from_secs(1), results.recv()).await {
        Ok(Some(UpdateResult::Success(fix))) => print_fix(&fix),
        Ok(Some(UpdateResult::Failure(err))) => {
            println!("{} {}", "x".red().bold(), err);
        }
        _ => println!("no cached fix available"),
    }

    Ok(())
}

fn print_fix(fix: &Fix) {
    println!(
        "{} {:.5}, {:.5}  \u{00b1}{:.1}m  {}",
        "fix".green().bold(),
        fix.lat,
        fix.lon,
        fix.accuracy_m,
        fix.timestamp.format("%H:%M:%S%.3f").to_string().dimmed()
    );
}
