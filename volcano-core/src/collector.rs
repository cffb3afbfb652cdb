//! Per-location orchestration and the run driver.

use anyhow::Result;
use chrono::Utc;
use futures::future::{join_all, try_join_all};
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::{
    CollectError, Config,
    config::ParameterSet,
    merge::{SanitizeReport, merge_responses, sanitize},
    model::{Location, LocationResult, OutputLayout, RunOutput},
    output::write_output,
    provider::{HourlyProvider, expected_parameters, providers_from_config},
};

/// Outcome of one `Collector::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the output file was written.
    pub written: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Collector {
    providers: Arc<[Arc<dyn HourlyProvider>]>,
    expected: Arc<ParameterSet>,
    locations: Vec<Location>,
    output_path: PathBuf,
    layout: OutputLayout,
    limit: Option<Arc<Semaphore>>,
}

impl Collector {
    /// Build a collector with the Open-Meteo providers described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let providers = providers_from_config(config)?;
        Ok(Self::new(config, providers))
    }

    /// Build a collector over explicit providers, listed in merge order.
    pub fn new(config: &Config, providers: Vec<Arc<dyn HourlyProvider>>) -> Self {
        let expected = expected_parameters(&providers);

        Self {
            providers: providers.into(),
            expected: Arc::new(expected),
            locations: config.locations.clone(),
            output_path: config.output_path.clone(),
            layout: config.layout,
            limit: config.max_concurrent_locations.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    pub fn expected_parameters(&self) -> &ParameterSet {
        &self.expected
    }

    /// Collect every location concurrently.
    ///
    /// The result has one slot per configured location, in order; failed
    /// locations are `None`.
    pub async fn collect_all(&self) -> Vec<Option<LocationResult>> {
        let handles: Vec<_> = self
            .locations
            .iter()
            .cloned()
            .map(|location| {
                let providers = Arc::clone(&self.providers);
                let expected = Arc::clone(&self.expected);
                let limit = self.limit.clone();

                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    collect_location(&providers, &expected, &location).await
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(&self.locations)
            .map(|(joined, location)| match joined {
                Ok(result) => result,
                Err(err) => {
                    error!(location = %location.name, error = %err, "Collection task failed");
                    None
                }
            })
            .collect()
    }

    /// Collect all locations and write the snapshot if anything succeeded.
    ///
    /// Only a failure to write the output file is returned as an error.
    pub async fn run(&self) -> Result<RunSummary> {
        info!(locations = self.locations.len(), "Starting air quality collection");

        let slots = self.collect_all().await;
        let failed = slots.iter().filter(|slot| slot.is_none()).count();
        let results: Vec<LocationResult> = slots.into_iter().flatten().collect();
        let succeeded = results.len();

        let written = if results.is_empty() {
            info!("No data was fetched, output file left unchanged");
            Ok(None)
        } else {
            let output = RunOutput::new(self.layout, results, Utc::now());
            write_output(&self.output_path, &output).map(|()| {
                info!(path = %self.output_path.display(), "Saved data");
                Some(self.output_path.clone())
            })
        };

        if let Err(err) = &written {
            error!(error = %format!("{err:#}"), "Failed to save data");
        }
        info!(succeeded, failed, "Collection finished");

        Ok(RunSummary { succeeded, failed, written: written? })
    }
}

/// Collect one location, logging and swallowing any failure.
pub async fn collect_location(
    providers: &[Arc<dyn HourlyProvider>],
    expected: &ParameterSet,
    location: &Location,
) -> Option<LocationResult> {
    info!(location = %location.name, "Fetching data");

    match try_collect_location(providers, expected, location).await {
        Ok((result, report)) => {
            info!(
                location = %location.name,
                hours = result.hourly.len(),
                padded = report.padded.len(),
                resized = report.resized.len(),
                "Data received"
            );
            Some(result)
        }
        Err(err) => {
            let reason = format!("{:#}", anyhow::Error::from(err));
            error!(location = %location.name, error = %reason, "Failed to collect location");
            None
        }
    }
}

async fn try_collect_location(
    providers: &[Arc<dyn HourlyProvider>],
    expected: &ParameterSet,
    location: &Location,
) -> Result<(LocationResult, SanitizeReport), CollectError> {
    let responses =
        try_join_all(providers.iter().map(|provider| provider.fetch_hourly(location))).await?;

    let mut merged = merge_responses(&responses);
    let hourly_units = std::mem::take(&mut merged.units);
    let (hourly, report) = sanitize(merged, expected, &location.name)?;

    let result = LocationResult {
        name: location.name.clone(),
        latitude: location.latitude,
        longitude: location.longitude,
        hourly,
        hourly_units,
    };
    Ok((result, report))
}
