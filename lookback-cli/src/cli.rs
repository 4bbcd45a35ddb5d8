use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Text, validator::Validation};
use lookback_core::{
    AddressForm, Config, LoadingTracker, NotificationQueue, SearchError, SearchSession, ServiceId,
};
use std::{fs, path::PathBuf, sync::Arc};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "lookback", version, about = "Last week's weather for an address")]
pub struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up an address and show the weather of the past week.
    Search(SearchArgs),

    /// Set the base URL of a service.
    Configure {
        /// Service short name: "geocoding" or "weather".
        service: String,
    },

    /// Show the config file location and the effective settings.
    Config,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub street: Option<String>,

    /// House number.
    #[arg(long)]
    pub number: Option<String>,

    #[arg(long)]
    pub postal_code: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    /// Also print the hourly series.
    #[arg(long)]
    pub hourly: bool,

    /// Write the result as JSON into this directory.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Search(args) => search(args).await,
            Command::Configure { service } => configure(&service),
            Command::Config => show_config(),
        }
    }
}

/// Flag value if given, otherwise a required prompt.
fn field(value: Option<String>, label: &str) -> anyhow::Result<String> {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(v);
    }

    let answer = Text::new(label)
        .with_validator(|input: &str| {
            Ok(if input.trim().is_empty() {
                Validation::Invalid("This field is required".into())
            } else {
                Validation::Valid
            })
        })
        .prompt()?;
    Ok(answer)
}

fn read_form(args: &mut SearchArgs) -> anyhow::Result<AddressForm> {
    Ok(AddressForm {
        street: field(args.street.take(), "Street:")?,
        number: field(args.number.take(), "Number:")?,
        postal_code: field(args.postal_code.take(), "Postal code:")?,
        city: field(args.city.take(), "City:")?,
        country: field(args.country.take(), "Country:")?,
    })
}

async fn search(mut args: SearchArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let form = read_form(&mut args)?;

    let loading = Arc::new(LoadingTracker::new());
    let notifications = Arc::new(NotificationQueue::new(config.default_notification_duration()));
    let toasts = render::spawn_notifications(&notifications);
    let spinner = render::spawn_loading(&loading);

    let mut session = SearchSession::from_config(&config, loading.clone(), notifications.clone())?;
    let mut result = session.search(&form).await;

    // Geocoding worked but the weather did not: offer to fetch it again.
    while matches!(result, Err(SearchError::Request(_))) && session.location().is_some() {
        tokio::task::yield_now().await;
        if !Confirm::new("Retry fetching the weather?").with_default(true).prompt()? {
            break;
        }
        match session.retry().await {
            Some(retried) => result = retried,
            None => break,
        }
    }

    if let Ok(outcome) = &result {
        render::print_outcome(outcome, args.hourly);
        if let Some(dir) = &args.export {
            export(&session, dir)?;
        }
    }

    drop(session);
    drop(notifications);
    drop(loading);
    toasts.await.context("notification printer stopped unexpectedly")?;
    spinner.await.context("loading indicator stopped unexpectedly")?;

    // Failures were already shown to the user as notifications.
    result.map(|_| ()).map_err(|err| anyhow!("search failed: {err}"))
}

fn export(session: &SearchSession, dir: &std::path::Path) -> anyhow::Result<()> {
    let Some(document) = session.export() else {
        bail!("Nothing to export yet");
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;
    let path = dir.join(document.file_name());
    let json = document.to_pretty_json().context("Failed to serialize export")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("\nSaved {}", path.display());
    Ok(())
}

fn configure(service: &str) -> anyhow::Result<()> {
    let id = ServiceId::try_from(service)?;
    let mut config = Config::load()?;
    let current = config.service_url(id);

    let url = Text::new(&format!("Base URL for the {id} service:"))
        .with_default(&current)
        .with_validator(|input: &str| {
            Ok(if input.starts_with("http://") || input.starts_with("https://") {
                Validation::Valid
            } else {
                Validation::Invalid("Expected an http:// or https:// URL".into())
            })
        })
        .prompt()?;

    config.upsert_service_url(id, url.trim().to_string());
    config.save()?;

    println!("Saved {id} endpoint to {}", Config::config_file_path()?.display());
    Ok(())
}

fn show_config() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("config file: {}", Config::config_file_path()?.display());
    for id in ServiceId::all() {
        println!("{id:<10} {}", config.service_url(*id));
    }
    println!("timezone   {}", config.timezone);
    println!(
        "retry      {} retries, {} ms step",
        config.retry.max_retries, config.retry.delay_step_ms
    );
    println!("toasts     {} ms", config.notifications.default_duration_ms);
    Ok(())
}
