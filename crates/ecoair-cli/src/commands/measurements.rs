//! Measurement history.

use anyhow::Result;
use ecoair_store::{BackendKind, MeasurementQuery, NewMeasurement, Pollutants, StorageFacade};
use time::OffsetDateTime;

use crate::cli::MeasureAction;
use crate::format::{format_samples_text, parse_datetime, to_json};

use super::OutputOptions;

pub async fn cmd_measure(
    storage: &StorageFacade,
    action: MeasureAction,
    opts: OutputOptions,
) -> Result<()> {
    match action {
        MeasureAction::Record {
            city,
            aqi,
            pm25,
            pm10,
            o3,
            no2,
            at,
        } => {
            let pollutants = Pollutants {
                pm25,
                pm10,
                o3,
                no2,
            };
            let mut measurement = NewMeasurement::new(city.as_str(), aqi).pollutants(pollutants);
            if let Some(at) = at {
                measurement = measurement.measured_at(parse_datetime(&at)?);
            }

            if storage.kind() == BackendKind::KeyValue && !opts.quiet {
                eprintln!("Note: the key-value backend does not persist measurements");
            }
            storage.record_measurement(&measurement).await?;
            opts.notice(format!("Recorded AQI {aqi} for '{}'", city.trim()));
        }
        MeasureAction::Range {
            city,
            days,
            since,
            until,
            limit,
        } => {
            let samples = if since.is_none() && until.is_none() && limit.is_none() {
                match days {
                    Some(days) => storage.measurement_range_days(&city, days).await?,
                    None => storage.measurement_range(&city).await?,
                }
            } else {
                let mut query = match days {
                    Some(days) => MeasurementQuery::trailing(&city, days, OffsetDateTime::now_utc()),
                    None => MeasurementQuery::new().city(&city),
                };
                if let Some(since) = since {
                    query = query.since(parse_datetime(&since)?);
                }
                if let Some(until) = until {
                    query = query.until(parse_datetime(&until)?);
                }
                if let Some(limit) = limit {
                    query = query.limit(limit);
                }
                storage.query_measurements(&query).await?
            };

            if opts.is_json() {
                print!("{}", to_json(&samples)?);
            } else {
                print!("{}", format_samples_text(&city, &samples, opts.no_color));
            }
        }
    }

    Ok(())
}
