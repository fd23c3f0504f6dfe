#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal frontend for the crime risk application.
//!
//! Runs the prediction form and the incident map view against terminal
//! bindings, so the same controllers that drive the browser can be
//! exercised from a shell:
//!
//! ```text
//! crime_risk predict --hour 22 --day Saturday --month 10
//! crime_risk map --json
//! ```
//!
//! Uses `indicatif-log-bridge` (via [`crime_risk_cli_utils::init_logger`])
//! so log lines and the loading spinner never fight for the terminal.

mod map;
mod predict;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Datelike as _, Timelike as _};
use clap::{Parser, Subcommand};
use crime_risk_client::{ClientConfig, HttpRiskApi};
use crime_risk_models::{Hour, Month, PredictionQuery, Weekday};
use crime_risk_view::{IncidentMapView, MapViewConfig, PredictionForm, SubmitOutcome};

#[derive(Parser)]
#[command(name = "crime_risk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request a risk prediction. Missing fields default to the current
    /// local time.
    Predict {
        /// Hour of day (0-23).
        #[arg(long)]
        hour: Option<Hour>,
        /// Day of week (e.g. "Monday").
        #[arg(long, value_parser = Weekday::parse_field)]
        day: Option<Weekday>,
        /// Month (1-12 or a month name).
        #[arg(long)]
        month: Option<Month>,
        /// Print the result panel HTML instead of text.
        #[arg(long)]
        html: bool,
    },
    /// Load incident data and render the map view.
    Map {
        /// Map view TOML overriding the built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reload the data this many extra times after the first load.
        #[arg(long, default_value_t = 0)]
        reload: u32,
        /// Print render descriptions as JSON lines.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = crime_risk_cli_utils::init_logger();
    let cli = Cli::parse();

    let api = HttpRiskApi::new(ClientConfig::from_env())?;
    log::debug!("Using backend at {}", api.config().base_url);

    match cli.command {
        Command::Predict {
            hour,
            day,
            month,
            html,
        } => {
            let query = resolve_query(hour, day, month)?;
            let form = PredictionForm::new();
            let mut surface = predict::TerminalForm::new(&multi, html);
            let outcome = form.submit(&mut surface, &api, query).await;
            if matches!(&outcome, SubmitOutcome::Rendered(banner) if banner.is_error()) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Map {
            config,
            reload,
            json,
        } => {
            let config = match config {
                Some(path) => MapViewConfig::from_path(&path)?,
                None => MapViewConfig::embedded(),
            };
            let mut view = IncidentMapView::new(map::TerminalMap::new(&multi, json), config);
            let mut state = view.mount(&api).await;
            for _ in 0..reload {
                state = view.load(&api).await;
            }
            log::info!("Map view finished in state {state:?}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Fills unset fields from the current local time.
fn resolve_query(
    hour: Option<Hour>,
    day: Option<Weekday>,
    month: Option<Month>,
) -> Result<PredictionQuery, Box<dyn std::error::Error>> {
    let now = chrono::Local::now();

    let hour = match hour {
        Some(hour) => hour,
        None => u8::try_from(now.hour())
            .ok()
            .and_then(Hour::new)
            .ok_or("clock returned an invalid hour")?,
    };
    let day = day
        .unwrap_or_else(|| Weekday::from_monday_offset(now.weekday().num_days_from_monday()));
    let month = match month {
        Some(month) => month,
        None => u8::try_from(now.month())
            .ok()
            .and_then(Month::from_number)
            .ok_or("clock returned an invalid month")?,
    };

    Ok(PredictionQuery { hour, day, month })
}
