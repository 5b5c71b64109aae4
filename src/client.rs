use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::MateriaEntry;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Per-operation timing reported by the board service's debug endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TimingStat {
    #[serde(default)]
    pub calls: u64,
    #[serde(default)]
    pub avg_time: f64,
    #[serde(default)]
    pub total_time: f64,
}

pub type TimingReport = BTreeMap<String, TimingStat>;

/// Where materia snapshots and diagnostics come from.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Full snapshot of materia entries priced for `world`.
    async fn fetch_materia(&self, world: &str) -> Result<Vec<MateriaEntry>>;

    async fn fetch_timings(&self) -> Result<TimingReport>;
}

/// HTTP client for the materia board service.
pub struct MarketClient {
    base_url: String,
    client: Client,
}

impl MarketClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn materia_url(&self) -> String {
        format!("{}/materia", self.base_url)
    }

    pub fn timing_url(&self) -> String {
        format!("{}/debug/timing", self.base_url)
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let started = Instant::now();
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(
            url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "GET completed"
        );
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Board service returned an error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketSource for MarketClient {
    async fn fetch_materia(&self, world: &str) -> Result<Vec<MateriaEntry>> {
        let url = self.materia_url();
        let body = self.get_text(&url, &[("world", world)]).await?;
        decode_materia(&body)
    }

    async fn fetch_timings(&self) -> Result<TimingReport> {
        let url = self.timing_url();
        let body = self.get_text(&url, &[]).await?;
        decode_timings(&body)
    }
}

pub fn decode_materia(body: &str) -> Result<Vec<MateriaEntry>> {
    Ok(serde_json::from_str(body)?)
}

pub fn decode_timings(body: &str) -> Result<TimingReport> {
    Ok(serde_json::from_str(body)?)
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_drop_trailing_slash() {
        let client = MarketClient::new("http://localhost:8000/", Duration::from_secs(5))
            .expect("build client");
        assert_eq!(client.materia_url(), "http://localhost:8000/materia");
        assert_eq!(client.timing_url(), "http://localhost:8000/debug/timing");
    }

    #[test]
    fn decodes_materia_snapshot() {
        let body = r#"[
            {"id": 1, "name": "Craftsman's Cunning Materia XI", "stat": "CP",
             "stat_increase": 9, "average_gil": 4200, "historical_avg": 4000,
             "cheapest_listings": [{"pricePerUnit": 3900, "quantity": 2, "worldName": "Faerie"}],
             "total_quantity": 2, "listing_count": 1, "color": "Blue",
             "scrip_cost": null, "scrip_type": null},
            {"id": 2, "name": "Gatherer's Guile Materia XI", "stat": "Gathering"}
        ]"#;
        let entries = decode_materia(body).expect("decode");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].cheapest_price(), Some(3900));
        assert_eq!(entries[1].average_gil, None);
        assert!(entries[1].cheapest_listings.is_empty());
    }

    #[test]
    fn rejects_non_array_snapshot() {
        let err = decode_materia(r#"{"detail": "Not Found"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn decodes_timing_report() {
        let body = r#"{
            "Universalis": {"calls": 2, "avg_time": 0.5, "total_time": 1.0},
            "XIVAPI Stat Query": {"calls": 15, "avg_time": 0.2, "total_time": 3.0}
        }"#;
        let report = decode_timings(body).expect("decode");
        assert_eq!(report.len(), 2);
        assert_eq!(report["Universalis"].calls, 2);
        assert!((report["XIVAPI Stat Query"].total_time - 3.0).abs() < f64::EPSILON);
        assert!(decode_timings("{}").expect("empty").is_empty());
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        let short = truncate_body(&long);
        assert_eq!(short.chars().count(), 201);
        assert_eq!(truncate_body("ok"), "ok");
    }
}
