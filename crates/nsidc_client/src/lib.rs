//! Sea Ice Index API client.
//!
//! Fetches the daily extent series for a hemisphere from the NSIDC-style
//! index endpoint and classifies it into the latest / monthly / historical
//! views served by the API layer.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use common::{Error, ExtentReading, Hemisphere, HemisphereStatus};
use serde::Deserialize;
use tracing::debug;

/// Square kilometers per million km², the unit the index publishes in.
const MILLION_KM2: f64 = 1_000_000.0;

/// Days of daily readings kept in the monthly view.
const MONTHLY_WINDOW_DAYS: i64 = 30;

/// Sea Ice Index client with connection pooling and a bounded timeout.
#[derive(Debug, Clone)]
pub struct NsidcClient {
    client: reqwest::Client,
    base_url: String,
}

// ── Upstream response types ───────────────────────────────────────────

/// Daily series response from `/extent/{hemisphere}/daily.json`.
#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(default)]
    pub data: Vec<DailyPoint>,
}

/// One row of the daily series. Extent and anomaly are in million km²;
/// either may be null for days the index has no measurement.
#[derive(Debug, Deserialize)]
pub struct DailyPoint {
    pub date: String,
    #[serde(default)]
    pub extent: Option<f64>,
    #[serde(default)]
    pub anomaly: Option<f64>,
}

// ── Implementation ────────────────────────────────────────────────────

impl NsidcClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("ice-monitor/0.1 (sea-ice extent dashboard)")
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .expect("failed to build sea-ice index HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    /// Fetch the raw daily series for a hemisphere, oldest first.
    ///
    /// Rows without a usable measurement are dropped rather than failing
    /// the whole fetch; a payload with zero usable rows is an error.
    pub async fn fetch_series(&self, hemisphere: Hemisphere) -> Result<Vec<ExtentReading>, Error> {
        let url = format!("{}/extent/{}/daily.json", self.base_url, hemisphere.as_str());

        debug!("Fetching sea-ice series: {}", url);

        let resp = self.client.get(&url).send().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("request for {} failed: {}", hemisphere, e))
        })?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "sea-ice index returned {} for {}: {}",
                status,
                hemisphere,
                &body[..body.len().min(500)]
            )));
        }

        let series: DailySeriesResponse = resp.json().await.map_err(|e| {
            Error::MalformedUpstreamData(format!("JSON parse error for {}: {}", hemisphere, e))
        })?;

        let readings = parse_series(hemisphere, &series.data);
        if readings.is_empty() {
            return Err(Error::MalformedUpstreamData(format!(
                "no usable readings in {} series ({} rows)",
                hemisphere,
                series.data.len()
            )));
        }

        debug!("Got {} valid readings for {}", readings.len(), hemisphere);

        Ok(readings)
    }

    /// Fetch and classify a hemisphere's record into dashboard views.
    pub async fn fetch_status(&self, hemisphere: Hemisphere) -> Result<HemisphereStatus, Error> {
        let readings = self.fetch_series(hemisphere).await?;
        classify(hemisphere, readings).ok_or_else(|| {
            Error::MalformedUpstreamData(format!("empty series for {}", hemisphere))
        })
    }
}

/// Convert raw rows to readings, dropping rows without a usable measurement.
/// The result is chronological and deduplicated by date.
fn parse_series(hemisphere: Hemisphere, rows: &[DailyPoint]) -> Vec<ExtentReading> {
    let mut readings: Vec<ExtentReading> = Vec::with_capacity(rows.len());

    for row in rows {
        let date = match NaiveDate::parse_from_str(&row.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                debug!("skipping row with unparseable date {:?}", row.date);
                continue;
            }
        };

        let extent_km2 = match row.extent {
            Some(v) if v.is_finite() && v >= 0.0 => v * MILLION_KM2,
            _ => {
                debug!("skipping {} row without a valid extent", date);
                continue;
            }
        };

        let anomaly_km2 = row.anomaly.filter(|v| v.is_finite()).map(|v| v * MILLION_KM2);

        readings.push(ExtentReading {
            hemisphere,
            date,
            extent_km2,
            anomaly_km2,
        });
    }

    readings.sort_by_key(|r| r.date);
    readings.dedup_by_key(|r| r.date);
    readings
}

/// Split a chronological series into the cached views.
///
/// The monthly view is the trailing 30 days ending at the newest reading,
/// so the latest reading is always the maximum date in the monthly view.
/// Returns `None` for an empty series.
pub fn classify(hemisphere: Hemisphere, readings: Vec<ExtentReading>) -> Option<HemisphereStatus> {
    let latest = readings.last()?.clone();
    let window_start = latest.date - chrono::Duration::days(MONTHLY_WINDOW_DAYS);
    let monthly: Vec<ExtentReading> = readings
        .iter()
        .filter(|r| r.date > window_start)
        .cloned()
        .collect();

    Some(HemisphereStatus {
        hemisphere,
        latest,
        monthly,
        historical: readings,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> &'static str {
        r#"{
            "data": [
                {"date": "2026-06-04", "extent": 10.98, "anomaly": null},
                {"date": "2026-06-01", "extent": 11.25, "anomaly": -0.62},
                {"date": "2026-06-02", "extent": null},
                {"date": "not-a-date", "extent": 11.10},
                {"date": "2026-06-03", "extent": -3.0},
                {"date": "2026-07-20", "extent": 9.41, "anomaly": -0.88}
            ]
        }"#
    }

    fn reading(hemisphere: Hemisphere, date: (i32, u32, u32), extent_km2: f64) -> ExtentReading {
        ExtentReading {
            hemisphere,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("valid date"),
            extent_km2,
            anomaly_km2: None,
        }
    }

    #[test]
    fn test_deserialize_daily_series() {
        let parsed: DailySeriesResponse =
            serde_json::from_str(sample_payload()).expect("payload should deserialize");
        assert_eq!(parsed.data.len(), 6);
        assert_eq!(parsed.data[2].extent, None);
    }

    #[test]
    fn test_parse_series_skips_unusable_rows() {
        let parsed: DailySeriesResponse =
            serde_json::from_str(sample_payload()).expect("payload should deserialize");
        let readings = parse_series(Hemisphere::North, &parsed.data);

        // null extent, bad date, and negative extent rows are dropped.
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| r.hemisphere == Hemisphere::North));
        assert_eq!(
            readings[0].date,
            NaiveDate::from_ymd_opt(2026, 6, 1).expect("valid date")
        );
        assert!((readings[0].extent_km2 - 11_250_000.0).abs() < 1.0);
        assert!((readings[0].anomaly_km2.expect("anomaly") + 620_000.0).abs() < 1.0);
        assert_eq!(readings[1].anomaly_km2, None);
    }

    #[test]
    fn test_parse_series_sorts_chronologically() {
        let parsed: DailySeriesResponse =
            serde_json::from_str(sample_payload()).expect("payload should deserialize");
        let readings = parse_series(Hemisphere::South, &parsed.data);

        let parsed_order: Vec<NaiveDate> = readings.iter().map(|r| r.date).collect();
        let mut sorted = parsed_order.clone();
        sorted.sort();
        assert_eq!(parsed_order, sorted);
        assert_eq!(
            readings.last().expect("non-empty").date,
            NaiveDate::from_ymd_opt(2026, 7, 20).expect("valid date")
        );
    }

    #[test]
    fn test_classify_empty_series() {
        assert!(classify(Hemisphere::North, Vec::new()).is_none());
    }

    #[test]
    fn test_classify_monthly_window() {
        // 90 days of readings ending 2026-07-20: only the trailing 30 days
        // belong in the monthly view.
        let end = NaiveDate::from_ymd_opt(2026, 7, 20).expect("valid date");
        let readings: Vec<ExtentReading> = (0..90)
            .rev()
            .map(|back| {
                let date = end - chrono::Duration::days(back);
                ExtentReading {
                    hemisphere: Hemisphere::North,
                    date,
                    extent_km2: 10_000_000.0,
                    anomaly_km2: None,
                }
            })
            .collect();

        let status = classify(Hemisphere::North, readings).expect("non-empty series");

        assert_eq!(status.historical.len(), 90);
        assert_eq!(status.monthly.len(), 30);
        assert_eq!(status.latest.date, end);
        assert_eq!(
            status.monthly.iter().map(|r| r.date).max().expect("non-empty"),
            status.latest.date
        );
    }

    #[test]
    fn test_classify_short_series_keeps_everything() {
        let readings = vec![
            reading(Hemisphere::South, (2026, 7, 18), 14_200_000.0),
            reading(Hemisphere::South, (2026, 7, 19), 14_150_000.0),
            reading(Hemisphere::South, (2026, 7, 20), 14_100_000.0),
        ];

        let status = classify(Hemisphere::South, readings).expect("non-empty series");

        assert_eq!(status.monthly.len(), 3);
        assert_eq!(status.historical.len(), 3);
        assert!((status.latest.extent_km2 - 14_100_000.0).abs() < 1.0);
    }
}
