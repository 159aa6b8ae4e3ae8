use crate::error::{DiscshelfError, Result};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Thin JSON client for the v3 API shared by Radarr and Sonarr.
#[derive(Debug, Clone)]
pub struct ArrClient {
    base_url: Url,
    api_key: Option<String>,
    client: Client,
}

#[derive(Default)]
pub struct ArrClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl ArrClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        let mut resolved_url = url.to_string();
        if Path::new("/.dockerenv").exists() && resolved_url.contains("localhost") {
            resolved_url = resolved_url.replace("localhost", "host.docker.internal");
            info!("Docker detected, using {} for manager connection", resolved_url);
        }
        self.base_url = Some(resolved_url);
        self
    }

    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn build(self) -> Result<ArrClient> {
        let base_url_str = self.base_url.ok_or(DiscshelfError::NotConfigured)?;
        let base_url = Url::parse(&format!("{}/", base_url_str.trim_end_matches('/')))?;

        Ok(ArrClient {
            base_url,
            api_key: self.api_key,
            client: Client::new(),
        })
    }
}

impl ArrClient {
    pub fn endpoint_url(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(&format!("api/v3/{endpoint}"))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.endpoint_url(endpoint, query)?;
        debug!("Request: {} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }
        if let Some(b) = body {
            request = request.json(b);
        }
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        self.request::<T, ()>(Method::GET, endpoint, query, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        self.request(Method::POST, endpoint, &[], Some(body)).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            let text = if text.trim().is_empty() { "null" } else { text.as_str() };
            serde_json::from_str(text).map_err(|e| DiscshelfError::Api {
                status: status.as_u16(),
                message: format!("JSON parse error: {e}"),
            })
        } else {
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

    pub async fn check_connection(&self) -> bool {
        self.get::<serde_json::Value>("system/status", &[]).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let client = ArrClientBuilder::new()
            .base_url("http://192.168.1.10:7878/radarr/")
            .api_key("k")
            .build()
            .unwrap();
        let url = client
            .endpoint_url("movie/lookup", &[("term", "The Matrix 1999")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://192.168.1.10:7878/radarr/api/v3/movie/lookup?term=The+Matrix+1999"
        );
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            ArrClientBuilder::new().build(),
            Err(DiscshelfError::NotConfigured)
        ));
    }
}
