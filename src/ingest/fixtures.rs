/// Test fixtures: representative JSON payloads from the POWER hourly API.
///
/// These fixtures are structurally complete but truncated to a couple of
/// hours. They reflect the GeoJSON envelope returned by:
///   https://power.larc.nasa.gov/api/temporal/hourly/point?format=JSON&...
///
/// POWER hourly response shape:
///   response.type                    - "Feature"
///   response.geometry.coordinates    - [lon, lat, elevation]
///   response.properties.parameter
///     .<CODE>                        - e.g. "T2M", "PRECTOTCORR"
///       .<YYYYMMDDHH>                - numeric value (local solar time)
///   response.header.fill_value       - sentinel for missing data (-999)
///   response.parameters.<CODE>       - units and long names
///
/// Note: timestamp keys are strings without separators; they sort
/// chronologically as text.

/// Two consecutive hours near Campinas with all five parameters.
#[cfg(test)]
pub(crate) fn fixture_two_hours_json() -> &'static str {
    r#"{
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-47.21, -23.0872, 608.12] },
      "properties": {
        "parameter": {
          "T2M": { "2024100400": 18.42, "2024100401": 17.95 },
          "RH2M": { "2024100400": 86.5, "2024100401": 88.1 },
          "WS2M": { "2024100400": 2.31, "2024100401": 2.05 },
          "ALLSKY_SFC_SW_DWN": { "2024100400": 0.0, "2024100401": 0.0 },
          "PRECTOTCORR": { "2024100400": 0.12, "2024100401": 0.0 }
        }
      },
      "header": {
        "title": "NASA/POWER Source Native Resolution Hourly Data",
        "api": { "version": "v2.5.9", "name": "POWER Hourly API" },
        "sources": ["merra2", "power"],
        "fill_value": -999.0,
        "time_standard": "LST",
        "start": "20241004",
        "end": "20241004"
      },
      "messages": [],
      "parameters": {
        "T2M": { "units": "C", "longname": "Temperature at 2 Meters" },
        "RH2M": { "units": "%", "longname": "Relative Humidity at 2 Meters" },
        "WS2M": { "units": "m/s", "longname": "Wind Speed at 2 Meters" },
        "ALLSKY_SFC_SW_DWN": { "units": "Wh/m^2", "longname": "All Sky Surface Shortwave Downward Irradiance" },
        "PRECTOTCORR": { "units": "mm/hour", "longname": "Precipitation Corrected" }
      },
      "times": { "data": 0.41, "process": 0.02 }
    }"#
}

/// Temperature keys listed out of order, crossing midnight.
#[cfg(test)]
pub(crate) fn fixture_unordered_keys_json() -> &'static str {
    r#"{
      "properties": {
        "parameter": {
          "T2M": { "2024100401": 17.1, "2024100323": 18.0, "2024100400": 17.6 }
        }
      },
      "header": { "fill_value": -999.0 }
    }"#
}

/// Three hours where hour 01 has a fill-value precipitation and hour 02 a
/// null temperature. Only hour 00 is usable.
#[cfg(test)]
pub(crate) fn fixture_fill_value_json() -> &'static str {
    r#"{
      "properties": {
        "parameter": {
          "T2M": { "2024100400": 18.4, "2024100401": 18.0, "2024100402": null },
          "PRECTOTCORR": { "2024100400": 0.0, "2024100401": -999.0, "2024100402": 0.3 }
        }
      },
      "header": { "fill_value": -999.0 }
    }"#
}

/// Payload carrying only temperature, without a header.
#[cfg(test)]
pub(crate) fn fixture_temperature_only_json() -> &'static str {
    r#"{
      "properties": {
        "parameter": {
          "T2M": { "2024100400": 18.4 }
        }
      }
    }"#
}

/// Error envelope POWER returns for invalid requests (e.g. latitude > 90).
#[cfg(test)]
pub(crate) fn fixture_error_message_json() -> &'static str {
    r#"{
      "header": "The POWER Hourly API failed to complete your request; please review the errors below and the POWER Docs.",
      "messages": ["Please provide a latitude between -90 and 90 decimal degrees."]
    }"#
}

/// Deterministic synthetic hourly series for `[start, end]` inclusive, with
/// daily cycles on every variable. Stands in for a parsed POWER download.
#[cfg(test)]
pub(crate) fn fixture_synthetic_series(
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    columns: &[crate::model::Variable],
) -> crate::model::ObservationSeries {
    use crate::model::{ObservationSeries, Variable};
    use chrono::{Datelike, Timelike};

    let mut rows = Vec::new();
    let mut ts = start.and_hms_opt(0, 0, 0).unwrap();
    let last = end.and_hms_opt(23, 0, 0).unwrap();

    while ts <= last {
        let phase = (ts.hour() as f64) / 24.0 * std::f64::consts::TAU;
        let drift = (ts.ordinal() as f64 * 0.37).sin();
        let values = columns
            .iter()
            .map(|v| match v {
                Variable::Temperature => 20.0 + 5.0 * phase.sin() + drift,
                Variable::Humidity => 70.0 - 12.0 * phase.sin() + 2.0 * drift,
                Variable::WindSpeed => 2.5 + phase.cos() + 0.3 * drift,
                Variable::SolarIrradiance => (600.0 * phase.sin()).max(0.0),
                Variable::Precipitation => ((ts.day() * 7 + ts.hour()) % 11) as f64 * 0.05,
            })
            .collect();
        rows.push((ts, values));
        ts += chrono::Duration::hours(1);
    }

    ObservationSeries::from_rows(columns.to_vec(), rows).unwrap()
}
