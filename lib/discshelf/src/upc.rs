//! UPCitemdb product lookup.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{DiscshelfError, Result};
use crate::retry::with_retry;
use crate::traits::UpcLookup;

pub const DEFAULT_BASE_URL: &str = "https://api.upcitemdb.com/prod/trial/";

#[derive(Deserialize, Debug)]
struct LookupResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    items: Vec<LookupItem>,
}

#[derive(Deserialize, Debug)]
struct LookupItem {
    #[serde(default)]
    title: String,
}

/// First non-empty title of an `OK` answer.
fn first_title(response: LookupResponse) -> Option<String> {
    if response.code != "OK" {
        return None;
    }
    response
        .items
        .into_iter()
        .map(|item| item.title.trim().to_string())
        .find(|title| !title.is_empty())
}

#[derive(Debug, Clone)]
pub struct UpcItemDbClient {
    base_url: Url,
    api_key: Option<String>,
    client: Client,
}

#[derive(Default)]
pub struct UpcItemDbClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl UpcItemDbClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Paid plans authenticate with a `user_key` header.
    pub fn api_key(mut self, key: &str) -> Self {
        if !key.is_empty() {
            self.api_key = Some(key.to_string());
        }
        self
    }

    pub fn build(self) -> Result<UpcItemDbClient> {
        let base = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // a trailing slash keeps `join` from dropping the last path segment
        let base_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;

        Ok(UpcItemDbClient {
            base_url,
            api_key: self.api_key,
            client: Client::new(),
        })
    }
}

impl UpcItemDbClient {
    async fn request_lookup(&self, barcode: &str) -> Result<Option<String>> {
        let mut url = self.base_url.join("lookup")?;
        url.query_pairs_mut().append_pair("upc", barcode);
        debug!("Request: GET {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("user_key", key).header("key_type", "3scale");
        }
        let response = request.send().await?;
        let status = response.status();

        match status {
            s if s.is_success() => {
                let body: LookupResponse = response.json().await?;
                Ok(first_title(body))
            }
            // unknown or malformed codes are a miss, not an outage
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(None),
            _ => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_string());
                Err(DiscshelfError::Api {
                    status: status.as_u16(),
                    message: text,
                })
            }
        }
    }
}

#[async_trait]
impl UpcLookup for UpcItemDbClient {
    fn id(&self) -> &'static str {
        "upcitemdb"
    }

    fn name(&self) -> &'static str {
        "UPCitemdb"
    }

    async fn lookup(&self, barcode: &str) -> Result<Option<String>> {
        let barcode = barcode.trim();
        info!("Looking up barcode {}", barcode);
        with_retry("UPCitemdb lookup", || self.request_lookup(barcode)).await
    }

    async fn health_check(&self) -> bool {
        // any HTTP answer means the service is reachable
        self.client.get(self.base_url.clone()).send().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_title() {
        let ok: LookupResponse = serde_json::from_str(
            r#"{"code":"OK","total":2,"items":[{"title":"  "},{"title":"The Matrix (1999) DVD","brand":"Warner"}]}"#,
        )
        .unwrap();
        assert_eq!(first_title(ok), Some("The Matrix (1999) DVD".to_string()));

        let empty: LookupResponse =
            serde_json::from_str(r#"{"code":"OK","total":0,"items":[]}"#).unwrap();
        assert_eq!(first_title(empty), None);

        let invalid: LookupResponse =
            serde_json::from_str(r#"{"code":"INVALID_UPC","message":"Not a valid UPC code."}"#)
                .unwrap();
        assert_eq!(first_title(invalid), None);
    }

    #[test]
    fn test_builder_keeps_path() {
        let client = UpcItemDbClientBuilder::new()
            .base_url("https://api.upcitemdb.com/prod/v1")
            .build()
            .unwrap();
        assert_eq!(
            client.base_url.join("lookup").unwrap().as_str(),
            "https://api.upcitemdb.com/prod/v1/lookup"
        );
    }
}
