#![doc(
    html_logo_url = "https://raw.githubusercontent.com/getsentry/relay/master/artwork/relay-icon.png",
    html_favicon_url = "https://raw.githubusercontent.com/getsentry/relay/master/artwork/relay-icon.png"
)]

use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use relay_rebalancing::{FullRebalance, RebalancedRates};
use serde::Serialize;

use crate::config::{Config, OverridableConfig};
use crate::input::{ClassId, InputDocument};

mod config;
mod input;

/// Rebalances dynamic sampling rates across classes.
///
/// This command takes a JSON document with classes and their event counts on stdin and writes
/// the sample rate of every class to stdout, together with the rate for classes that were not
/// listed. Optionally, a YAML or JSON config file provides defaults and logging settings.
///
/// Example input:
///
///     {"classes": [{"id": 1, "count": 1000.0}, {"id": 2, "count": 10.0}],
///      "sampleRate": 0.1, "totalNumClasses": 10, "total": 5000.0}
#[derive(Debug, Parser)]
#[command(verbatim_doc_comment)]
struct Cli {
    /// Path to a YAML or JSON config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to an input JSON document (defaults to stdin).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The sample rate to achieve across the population.
    #[arg(long)]
    rate: Option<f64>,

    /// How far sample rates are pulled towards an even distribution, between 0 and 1.
    #[arg(long)]
    intensity: Option<f64>,

    /// The log level (error, warn, info, debug, trace, off).
    #[arg(long)]
    log_level: Option<String>,

    /// Rebalance only the listed classes, ignoring implicit classes.
    #[arg(long)]
    full: bool,

    /// Pretty print the output JSON.
    #[arg(long)]
    pretty: bool,
}

/// The result written to stdout.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Rates(RebalancedRates<ClassId>),
    Full(FullRebalance<ClassId>),
}

impl Cli {
    fn overrides(&self) -> OverridableConfig {
        OverridableConfig {
            sample_rate: self.rate,
            intensity: self.intensity,
            log_level: self.log_level.clone(),
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::from_path(path)?,
            None => Config::default(),
        };

        config.apply_override(&self.overrides())?;
        Ok(config)
    }

    fn load_input(&self) -> Result<InputDocument> {
        let json = match self.input {
            Some(ref path) => fs::read_to_string(path).context("failed to read input")?,
            None => {
                let mut json = String::new();
                io::stdin()
                    .read_to_string(&mut json)
                    .context("failed to read input")?;
                json
            }
        };

        serde_json::from_str(&json).context("failed to parse input")
    }

    pub fn run(self) -> Result<()> {
        let config = self.load_config()?;
        relay_log::init(&config.logging);

        let document = self.load_input()?;
        let output = rebalance(document, &config, &self.overrides(), self.full)?;

        let mut stdout = io::stdout().lock();
        if self.pretty {
            serde_json::to_writer_pretty(&mut stdout, &output)?;
        } else {
            serde_json::to_writer(&mut stdout, &output)?;
        }
        writeln!(stdout)?;

        Ok(())
    }
}

/// Rebalances the classes of the document, sorted by id for stable output.
fn rebalance(
    document: InputDocument,
    config: &Config,
    overrides: &OverridableConfig,
    full: bool,
) -> Result<Output> {
    let knobs = document.knobs(&config.rebalancing, overrides);
    let num_classes = document.classes.len();

    relay_log::debug!(
        sample_rate = knobs.sample_rate,
        intensity = knobs.intensity,
        full,
        "rebalancing {num_classes} classes"
    );

    let output = if full {
        let mut rebalance = document
            .into_full_input(&knobs)
            .run()
            .context("failed to rebalance classes")?;

        rebalance.classes.sort_by(|a, b| a.id.cmp(&b.id));
        Output::Full(rebalance)
    } else {
        let mut rates = document
            .into_input(&knobs)
            .run()
            .context("failed to rebalance classes")?;

        relay_log::info!(
            implicit_rate = rates.implicit_rate,
            "rebalanced {num_classes} classes"
        );

        rates.classes.sort_by(|a, b| a.id.cmp(&b.id));
        Output::Rates(rates)
    };

    Ok(output)
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = cli.run() {
        let error: &(dyn Error + 'static) = error.as_ref();
        relay_log::ensure_error(error);
        std::process::exit(1);
    }
}
