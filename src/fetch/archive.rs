//! Client for the Open-Meteo historical archive.
//!
//! One request covers exactly one day at one coordinate:
//! `GET {base}?latitude=..&longitude=..&start_date=D&end_date=D&daily=..&timezone=auto`.
//! The answer carries a `daily` object whose members are arrays indexed by day
//! offset; index 0 is the requested day.

use crate::fetch::error::FetchError;
use crate::fetch::source::WeatherSource;
use crate::types::location::LatLon;
use crate::types::observation::{FetchOutcome, WeatherObservation};
use async_trait::async_trait;
use bon::bon;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Metrics requested for every lookup.
pub const DAILY_METRICS: &str = "temperature_2m_max,temperature_2m_min,temperature_2m_mean,\
precipitation_sum,rain_sum,snowfall_sum,wind_speed_10m_max,wind_gusts_10m_max,\
wind_direction_10m_dominant,weather_code";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailySeries>,
}

#[derive(Debug, Default, Deserialize)]
struct DailySeries {
    #[serde(default)]
    weather_code: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    rain_sum: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_gusts_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m_dominant: Vec<Option<f64>>,
}

/// Body the archive sends with a 400 answer, e.g. for dates outside its coverage.
#[derive(Debug, Deserialize)]
struct ArchiveErrorBody {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

fn first(series: &[Option<f64>]) -> Option<f64> {
    series.first().copied().flatten()
}

/// Decodes an archive response body.
///
/// A missing `daily` object or a null first `weather_code` is "no data"; a body
/// that is not the expected JSON shape is a [`FetchError::Protocol`].
pub fn parse_daily_response(body: &[u8], url: &str) -> Result<FetchOutcome, FetchError> {
    let response: ArchiveResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Protocol(url.to_string(), e))?;

    let Some(daily) = response.daily else {
        return Ok(FetchOutcome::NoData);
    };
    let Some(code) = first(&daily.weather_code) else {
        return Ok(FetchOutcome::NoData);
    };

    let mut observation = WeatherObservation::from_code(code.round() as i64);
    observation.temperature_max = first(&daily.temperature_2m_max);
    observation.temperature_min = first(&daily.temperature_2m_min);
    observation.temperature_mean = first(&daily.temperature_2m_mean);
    observation.precipitation_mm = first(&daily.precipitation_sum);
    observation.rain_mm = first(&daily.rain_sum);
    observation.snowfall_cm = first(&daily.snowfall_sum);
    observation.wind_speed_max_kmh = first(&daily.wind_speed_10m_max);
    observation.wind_gusts_max_kmh = first(&daily.wind_gusts_10m_max);
    observation.wind_direction_deg = first(&daily.wind_direction_10m_dominant);
    Ok(FetchOutcome::Observed(observation))
}

/// Performs single-day lookups against the archive API.
///
/// Each call is a standalone request; the inner `reqwest::Client` pools
/// connections across calls.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[bon]
impl WeatherFetcher {
    /// Creates a fetcher.
    ///
    /// * `.base_url(String)`: archive endpoint, defaults to [`DEFAULT_ARCHIVE_URL`].
    /// * `.timeout(Duration)`: per-request bound, defaults to [`DEFAULT_TIMEOUT`].
    /// * `.client(Client)`: reuse an existing HTTP client instead of building one.
    #[builder]
    pub fn new(
        base_url: Option<String>,
        timeout: Option<Duration>,
        client: Option<Client>,
    ) -> Result<Self, FetchError> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = match client {
            Some(client) => client,
            None => Client::builder()
                .gzip(true)
                .timeout(timeout)
                .build()
                .map_err(FetchError::ClientBuild)?,
        };
        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            timeout,
        })
    }

    fn request_label(&self, location: LatLon, date: NaiveDate) -> String {
        format!(
            "{}?latitude={}&longitude={}&date={}",
            self.base_url,
            location.latitude(),
            location.longitude(),
            date
        )
    }

    fn classify(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Network(url.to_string(), error)
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherFetcher {
    async fn fetch(&self, location: LatLon, date: NaiveDate) -> Result<FetchOutcome, FetchError> {
        let url = self.request_label(location, date);
        let day = date.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", location.latitude().to_string()),
                ("longitude", location.longitude().to_string()),
                ("start_date", day.clone()),
                ("end_date", day),
                ("daily", DAILY_METRICS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(&url, e))?;

        if !status.is_success() {
            let error_body = serde_json::from_slice::<ArchiveErrorBody>(&body).ok();
            if status == StatusCode::BAD_REQUEST {
                if let Some(ArchiveErrorBody { error: true, reason }) = &error_body {
                    debug!(
                        "Archive has no data for {}: {}",
                        url,
                        reason.as_deref().unwrap_or("no reason given")
                    );
                    return Ok(FetchOutcome::NoData);
                }
            }
            return Err(FetchError::HttpStatus {
                url,
                status,
                reason: error_body.and_then(|b| b.reason),
            });
        }

        parse_daily_response(&body, &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const FULL_DAY: &str = r#"{
        "latitude": 40.7,
        "longitude": -74.0,
        "daily_units": {"weather_code": "wmo code"},
        "daily": {
            "time": ["2021-05-01"],
            "weather_code": [61],
            "temperature_2m_max": [21.4],
            "temperature_2m_min": [12.1],
            "temperature_2m_mean": [16.0],
            "precipitation_sum": [3.2],
            "rain_sum": [3.2],
            "snowfall_sum": [0.0],
            "wind_speed_10m_max": [18.7],
            "wind_gusts_10m_max": [40.3],
            "wind_direction_10m_dominant": [250]
        }
    }"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, 1).unwrap()
    }

    /// Serves one canned HTTP response and hands back the raw request it received.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (request_tx, request_rx) = oneshot::channel();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 16 * 1024];
            let read = socket.read(&mut buffer).await.unwrap();
            let _ = request_tx.send(String::from_utf8_lossy(&buffer[..read]).into_owned());
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        (format!("http://{}/v1/archive", address), request_rx)
    }

    fn fetcher(base_url: String, timeout: Duration) -> WeatherFetcher {
        let client = Client::builder().no_proxy().build().unwrap();
        WeatherFetcher::builder()
            .base_url(base_url)
            .timeout(timeout)
            .client(client)
            .build()
            .unwrap()
    }

    #[test]
    fn test_parse_full_day() {
        let outcome = parse_daily_response(FULL_DAY.as_bytes(), "test").unwrap();
        let observation = outcome.into_observation().unwrap();
        assert_eq!(observation.weather_code, Some(61));
        assert_eq!(observation.condition, "Slight rain");
        assert_eq!(observation.temperature_max, Some(21.4));
        assert_eq!(observation.temperature_min, Some(12.1));
        assert_eq!(observation.precipitation_mm, Some(3.2));
        assert_eq!(observation.snowfall_cm, Some(0.0));
        assert_eq!(observation.wind_gusts_max_kmh, Some(40.3));
        assert_eq!(observation.wind_direction_deg, Some(250.0));
    }

    #[test]
    fn test_parse_missing_daily_is_no_data() {
        let outcome = parse_daily_response(br#"{"latitude": 1.0}"#, "test").unwrap();
        assert_eq!(outcome, FetchOutcome::NoData);
    }

    #[test]
    fn test_parse_null_weather_code_is_no_data() {
        let body = br#"{"daily": {"weather_code": [null], "temperature_2m_max": [12.0]}}"#;
        assert_eq!(parse_daily_response(body, "test").unwrap(), FetchOutcome::NoData);

        let empty = br#"{"daily": {"weather_code": []}}"#;
        assert_eq!(parse_daily_response(empty, "test").unwrap(), FetchOutcome::NoData);
    }

    #[test]
    fn test_parse_partial_metrics() {
        let body = br#"{"daily": {"weather_code": [3], "rain_sum": [null]}}"#;
        let observation = parse_daily_response(body, "test")
            .unwrap()
            .into_observation()
            .unwrap();
        assert_eq!(observation.condition, "Overcast");
        assert_eq!(observation.rain_mm, None);
        assert_eq!(observation.temperature_mean, None);
    }

    #[test]
    fn test_parse_garbage_is_protocol_error() {
        let result = parse_daily_response(b"<html>rate limited</html>", "test");
        assert!(matches!(result, Err(FetchError::Protocol(_, _))));

        let wrong_shape = parse_daily_response(br#"{"daily": {"weather_code": "61"}}"#, "test");
        assert!(matches!(wrong_shape, Err(FetchError::Protocol(_, _))));
    }

    #[tokio::test]
    async fn test_fetch_sends_single_day_query() {
        let (base_url, request) = serve_once("200 OK", FULL_DAY).await;
        let fetcher = fetcher(base_url, Duration::from_secs(5));

        let outcome = fetcher.fetch(LatLon(40.71, -74.0), date()).await.unwrap();
        assert!(outcome.is_observed());

        let raw_request = request.await.unwrap();
        let request_line = raw_request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /v1/archive?"));
        assert!(request_line.contains("latitude=40.71"));
        assert!(request_line.contains("longitude=-74"));
        assert!(request_line.contains("start_date=2021-05-01"));
        assert!(request_line.contains("end_date=2021-05-01"));
        assert!(request_line.contains("timezone=auto"));
        assert!(request_line.contains("weather_code"));
    }

    #[tokio::test]
    async fn test_fetch_out_of_range_is_no_data() {
        let (base_url, _request) = serve_once(
            "400 Bad Request",
            r#"{"error": true, "reason": "Parameter 'start_date' is out of allowed range"}"#,
        )
        .await;
        let outcome = fetcher(base_url, Duration::from_secs(5))
            .fetch(LatLon(1.0, 1.0), date())
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::NoData);
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_http_status() {
        let (base_url, _request) = serve_once("503 Service Unavailable", "{}").await;
        let result = fetcher(base_url, Duration::from_secs(5))
            .fetch(LatLon(1.0, 1.0), date())
            .await;
        match result {
            Err(FetchError::HttpStatus { status, .. }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let result = fetcher(format!("http://{}/v1/archive", address), Duration::from_millis(200))
            .fetch(LatLon(1.0, 1.0), date())
            .await;
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher(format!("http://{}/v1/archive", address), Duration::from_secs(5))
            .fetch(LatLon(1.0, 1.0), date())
            .await;
        assert!(matches!(result, Err(FetchError::Network(_, _))));
    }
}
