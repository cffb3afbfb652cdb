//! Combining provider responses into one validated hourly series.

use std::collections::BTreeMap;
use tracing::warn;

use crate::{
    CollectError,
    config::ParameterSet,
    model::{ApiResponse, HourlySeries, Values},
};

/// The `hourly` and `hourly_units` objects of several responses, folded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedHourly {
    pub time: Option<Vec<String>>,
    pub values: BTreeMap<String, Values>,
    pub units: BTreeMap<String, String>,
}

/// What `sanitize` had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Parameters missing from the responses, now all-null.
    pub padded: Vec<String>,
    /// Parameters whose length disagreed with `time`, now resized.
    pub resized: Vec<String>,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.padded.is_empty() && self.resized.is_empty()
    }
}

/// Fold responses in order. On any key collision, including `time` and
/// units, the later response replaces the earlier one.
pub fn merge_responses<'a, I>(responses: I) -> MergedHourly
where
    I: IntoIterator<Item = &'a ApiResponse>,
{
    let mut merged = MergedHourly::default();

    for response in responses {
        if let Some(hourly) = &response.hourly {
            if let Some(time) = &hourly.time {
                merged.time = Some(time.clone());
            }
            // A `null` parameter counts as absent and never replaces an earlier array.
            for (name, values) in &hourly.values {
                if let Some(values) = values {
                    merged.values.insert(name.clone(), values.clone());
                }
            }
        }
        if let Some(units) = &response.hourly_units {
            for (name, unit) in units {
                merged.units.insert(name.clone(), unit.clone());
            }
        }
    }

    merged
}

/// Make sure every expected parameter is present with one value per hour.
///
/// Fails only when there is no usable `time` series. Extra parameters the
/// API returned beyond `expected` are kept.
pub fn sanitize(
    merged: MergedHourly,
    expected: &ParameterSet,
    location: &str,
) -> Result<(HourlySeries, SanitizeReport), CollectError> {
    let time = match merged.time {
        Some(time) if !time.is_empty() => time,
        _ => return Err(CollectError::MissingTime),
    };
    let len = time.len();

    let mut values = merged.values;
    let mut report = SanitizeReport::default();

    for name in expected.iter() {
        match values.get(name).map(Vec::len) {
            Some(got) if got == len => {}
            Some(got) if got > 0 => {
                warn!(
                    location,
                    parameter = %name,
                    got,
                    expected = len,
                    "Parameter length does not match time series, resizing"
                );
                if let Some(series) = values.get_mut(name) {
                    series.resize(len, None);
                }
                report.resized.push(name.clone());
            }
            _ => {
                warn!(
                    location,
                    parameter = %name,
                    "Parameter missing from response, filling with nulls"
                );
                values.insert(name.clone(), vec![None; len]);
                report.padded.push(name.clone());
            }
        }
    }

    Ok((HourlySeries { time, values }, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HourlyBlock;

    fn response(
        time: Option<&[&str]>,
        values: &[(&str, Values)],
        units: &[(&str, &str)],
    ) -> ApiResponse {
        ApiResponse {
            error: false,
            reason: None,
            hourly: Some(HourlyBlock {
                time: time.map(|t| t.iter().map(|s| s.to_string()).collect()),
                values: values.iter().map(|(k, v)| (k.to_string(), Some(v.clone()))).collect(),
            }),
            hourly_units: Some(units.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
        }
    }

    const HOURS: &[&str] = &["2025-01-01T00:00", "2025-01-01T01:00"];
    const THREE_HOURS: &[&str] = &["2025-01-01T00:00", "2025-01-01T01:00", "2025-01-01T02:00"];
    const NO_HOURS: &[&str] = &[];

    #[test]
    fn later_response_wins_on_collision() {
        let air = response(
            Some(HOURS),
            &[("carbon_monoxide", vec![Some(1.0), Some(2.0)])],
            &[("carbon_monoxide", "μg/m³"), ("time", "iso8601")],
        );
        let weather = response(
            Some(THREE_HOURS),
            &[("carbon_monoxide", vec![Some(9.0), Some(9.0), Some(9.0)])],
            &[("carbon_monoxide", "ppm")],
        );

        let merged = merge_responses([&air, &weather]);

        assert_eq!(merged.time.as_ref().unwrap().len(), 3);
        assert_eq!(merged.values["carbon_monoxide"], vec![Some(9.0); 3]);
        assert_eq!(merged.units["carbon_monoxide"], "ppm");
        assert_eq!(merged.units["time"], "iso8601");
    }

    #[test]
    fn merge_keeps_earlier_time_when_later_has_none() {
        let air = response(Some(HOURS), &[], &[]);
        let weather = response(None, &[("wind_speed_10m", vec![Some(3.0), Some(4.0)])], &[]);

        let merged = merge_responses([&air, &weather]);

        assert_eq!(merged.time.unwrap(), HOURS.to_vec());
        assert!(merged.values.contains_key("wind_speed_10m"));
    }

    #[test]
    fn null_parameter_is_padded_and_keeps_earlier_array() {
        let mut air = response(Some(HOURS), &[("carbon_monoxide", vec![Some(1.0), Some(2.0)])], &[]);
        if let Some(hourly) = air.hourly.as_mut() {
            hourly.values.insert("nitrogen_dioxide".to_string(), None);
        }
        let mut weather = response(None, &[], &[]);
        if let Some(hourly) = weather.hourly.as_mut() {
            hourly.values.insert("carbon_monoxide".to_string(), None);
        }
        let expected = ParameterSet::from(["carbon_monoxide", "nitrogen_dioxide"]);

        let (series, report) =
            sanitize(merge_responses([&air, &weather]), &expected, "Kilauea").unwrap();

        assert_eq!(report.padded, vec!["nitrogen_dioxide"]);
        assert_eq!(series.get("nitrogen_dioxide").unwrap(), &vec![None, None]);
        assert_eq!(series.get("carbon_monoxide").unwrap(), &vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn sanitize_keeps_complete_series() {
        let merged = merge_responses([&response(
            Some(HOURS),
            &[("sulphur_dioxide", vec![Some(0.5), None])],
            &[],
        )]);
        let expected = ParameterSet::from(["sulphur_dioxide"]);

        let (series, report) = sanitize(merged, &expected, "Kilauea").unwrap();

        assert!(report.is_clean());
        assert_eq!(series.get("sulphur_dioxide").unwrap(), &vec![Some(0.5), None]);
    }

    #[test]
    fn sanitize_pads_missing_and_empty_parameters() {
        let merged = merge_responses([&response(
            Some(HOURS),
            &[("sulphur_dioxide", vec![Some(0.5), Some(0.7)]), ("nitrogen_dioxide", vec![])],
            &[],
        )]);
        let expected = ParameterSet::from(["sulphur_dioxide", "carbon_monoxide", "nitrogen_dioxide"]);

        let (series, report) = sanitize(merged, &expected, "Kilauea").unwrap();

        assert_eq!(report.padded, vec!["carbon_monoxide", "nitrogen_dioxide"]);
        assert_eq!(series.get("carbon_monoxide").unwrap(), &vec![None, None]);
        assert_eq!(series.get("nitrogen_dioxide").unwrap(), &vec![None, None]);
        for name in expected.iter() {
            assert_eq!(series.get(name).unwrap().len(), series.len());
        }
    }

    #[test]
    fn sanitize_resizes_mismatched_lengths() {
        let merged = merge_responses([&response(
            Some(HOURS),
            &[
                ("carbon_monoxide", vec![Some(1.0)]),
                ("sulphur_dioxide", vec![Some(1.0), Some(2.0), Some(3.0)]),
            ],
            &[],
        )]);
        let expected = ParameterSet::from(["carbon_monoxide", "sulphur_dioxide"]);

        let (series, report) = sanitize(merged, &expected, "Etna").unwrap();

        assert_eq!(report.resized, vec!["carbon_monoxide", "sulphur_dioxide"]);
        assert_eq!(series.get("carbon_monoxide").unwrap(), &vec![Some(1.0), None]);
        assert_eq!(series.get("sulphur_dioxide").unwrap(), &vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn sanitize_fails_without_time() {
        let merged = merge_responses([&response(None, &[("carbon_monoxide", vec![Some(1.0)])], &[])]);
        let err = sanitize(merged, &ParameterSet::from(["carbon_monoxide"]), "Poás").unwrap_err();

        assert!(matches!(err, CollectError::MissingTime));
    }

    #[test]
    fn sanitize_fails_with_empty_time() {
        let merged = merge_responses([&response(Some(NO_HOURS), &[], &[])]);
        let err = sanitize(merged, &ParameterSet::from(["carbon_monoxide"]), "Poás").unwrap_err();

        assert!(matches!(err, CollectError::MissingTime));
    }

    #[test]
    fn sanitize_fails_when_no_hourly_block() {
        let merged = merge_responses([&ApiResponse::default()]);

        assert!(sanitize(merged, &ParameterSet::default(), "Poás").is_err());
    }
}
