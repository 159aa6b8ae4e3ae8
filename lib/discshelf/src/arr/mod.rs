//! Radarr (movies) and Sonarr (series) as [`LibraryManager`]s.
//!
//! Both speak the same v3 API shape, so one manager type covers both and the
//! [`ArrFlavor`] supplies the resource name and add options.

mod client;
mod models;

pub use client::{ArrClient, ArrClientBuilder};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::media::{ManagedItem, MediaType};
use tracing::info;

use crate::error::{DiscshelfError, Result};
use crate::matcher::token_set_ratio;
use crate::normalize::normalize;
use crate::retry::with_retry;
use crate::traits::LibraryManager;
use models::ArrTitle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrFlavor {
    Radarr,
    Sonarr,
}

impl ArrFlavor {
    fn resource(&self) -> &'static str {
        match self {
            ArrFlavor::Radarr => "movie",
            ArrFlavor::Sonarr => "series",
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            ArrFlavor::Radarr => MediaType::Movie,
            ArrFlavor::Sonarr => MediaType::Series,
        }
    }

    // Adding a disc we already own must not kick off a download.
    fn add_options(&self) -> Value {
        match self {
            ArrFlavor::Radarr => json!({ "searchForMovie": false }),
            ArrFlavor::Sonarr => json!({ "searchForMissingEpisodes": false }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrSettings {
    pub root_folder: String,
    pub quality_profile_id: i64,
    /// Sonarr v3 only
    pub language_profile_id: Option<i64>,
}

pub struct ArrManager {
    flavor: ArrFlavor,
    client: ArrClient,
    settings: ArrSettings,
}

impl ArrManager {
    pub fn radarr(client: ArrClient, settings: ArrSettings) -> Self {
        Self {
            flavor: ArrFlavor::Radarr,
            client,
            settings,
        }
    }

    pub fn sonarr(client: ArrClient, settings: ArrSettings) -> Self {
        Self {
            flavor: ArrFlavor::Sonarr,
            client,
            settings,
        }
    }

    pub fn flavor(&self) -> ArrFlavor {
        self.flavor
    }
}

/// Best lookup result for a confirmed title: title similarity plus a bonus
/// for a matching year. Ties keep the manager's own ordering.
fn pick_lookup_result<'a>(results: &'a [Value], title: &str, year: Option<i32>) -> Option<&'a Value> {
    let wanted = normalize(title);
    let mut best: Option<(f64, &Value)> = None;

    for result in results {
        let Some(candidate_title) = result.get("title").and_then(Value::as_str) else {
            continue;
        };
        let mut score = token_set_ratio(&wanted, &normalize(candidate_title));
        let candidate_year = result
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|y| i32::try_from(y).ok());
        if let (Some(wanted_year), Some(found)) = (year, candidate_year) {
            match (wanted_year - found).abs() {
                0 => score += 10.0,
                1 => score += 5.0,
                _ => {}
            }
        }
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, result));
        }
    }

    best.map(|(_, value)| value)
}

fn build_add_payload(mut lookup: Value, flavor: ArrFlavor, settings: &ArrSettings) -> Value {
    if let Some(fields) = lookup.as_object_mut() {
        fields.insert("qualityProfileId".into(), json!(settings.quality_profile_id));
        fields.insert("rootFolderPath".into(), json!(settings.root_folder));
        fields.insert("monitored".into(), json!(true));
        fields.insert("addOptions".into(), flavor.add_options());
        if flavor == ArrFlavor::Sonarr {
            fields.insert("seasonFolder".into(), json!(true));
            if let Some(language) = settings.language_profile_id {
                fields.insert("languageProfileId".into(), json!(language));
            }
        }
    }
    lookup
}

#[async_trait]
impl LibraryManager for ArrManager {
    fn id(&self) -> &'static str {
        match self.flavor {
            ArrFlavor::Radarr => "radarr",
            ArrFlavor::Sonarr => "sonarr",
        }
    }

    fn name(&self) -> &'static str {
        match self.flavor {
            ArrFlavor::Radarr => "Radarr",
            ArrFlavor::Sonarr => "Sonarr",
        }
    }

    fn media_type(&self) -> MediaType {
        self.flavor.media_type()
    }

    async fn list_items(&self) -> Result<Vec<ManagedItem>> {
        let resource = self.flavor.resource();
        let rows: Vec<ArrTitle> = with_retry(&format!("{} list", self.name()), || {
            self.client.get(resource, &[])
        })
        .await?;

        let media_type = self.media_type();
        let items: Vec<ManagedItem> = rows
            .into_iter()
            .filter_map(|row| row.into_managed(media_type))
            .collect();
        info!("{} lists {} titles", self.name(), items.len());
        Ok(items)
    }

    async fn add_item(&self, title: &str, year: Option<i32>) -> Result<ManagedItem> {
        let resource = self.flavor.resource();
        let term = match year {
            Some(year) => format!("{} {year}", title.trim()),
            None => title.trim().to_string(),
        };
        let lookup_endpoint = format!("{resource}/lookup");
        let query = [("term", term.as_str())];

        let results: Vec<Value> = with_retry(&format!("{} lookup", self.name()), || {
            self.client.get(&lookup_endpoint, &query)
        })
        .await?;

        let chosen = pick_lookup_result(&results, title, year)
            .cloned()
            .ok_or_else(|| DiscshelfError::NoLookupResult { term: term.clone() })?;
        let row: ArrTitle = serde_json::from_value(chosen.clone())?;

        if let Some(existing) = row.clone().into_managed(self.media_type()) {
            info!("'{}' is already managed by {} (id {})", existing.title, self.name(), existing.id);
            return Ok(existing);
        }

        info!(
            "Adding '{}' ({:?}) to {} under {}",
            row.title,
            row.year,
            self.name(),
            self.settings.root_folder
        );
        let payload = build_add_payload(chosen, self.flavor, &self.settings);
        // not retried: a timed-out POST may still have created the title
        let created: ArrTitle = self.client.post(resource, &payload).await?;

        created
            .into_managed(self.media_type())
            .ok_or_else(|| DiscshelfError::Api {
                status: 500,
                message: format!("{} did not return an id for '{}'", self.name(), row.title),
            })
    }

    async fn health_check(&self) -> bool {
        self.client.check_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ArrSettings {
        ArrSettings {
            root_folder: "/tv".to_string(),
            quality_profile_id: 1,
            language_profile_id: Some(1),
        }
    }

    #[test]
    fn test_pick_prefers_title_and_year() {
        let results = vec![
            json!({"title": "The Office", "year": 2001, "tvdbId": 78107}),
            json!({"title": "The Office (US)", "year": 2005, "tvdbId": 73244}),
            json!({"title": "Office Space", "year": 1999}),
        ];
        let picked = pick_lookup_result(&results, "The Office", Some(2005)).unwrap();
        assert_eq!(picked["tvdbId"], 73244);

        // no year: the manager's own ranking breaks the tie
        let picked = pick_lookup_result(&results, "The Office", None).unwrap();
        assert_eq!(picked["tvdbId"], 78107);

        assert!(pick_lookup_result(&[], "The Office", None).is_none());
    }

    #[test]
    fn test_add_payload_for_series() {
        let payload = build_add_payload(
            json!({"title": "Firefly", "tvdbId": 78874, "year": 2002}),
            ArrFlavor::Sonarr,
            &settings(),
        );
        assert_eq!(payload["tvdbId"], 78874);
        assert_eq!(payload["rootFolderPath"], "/tv");
        assert_eq!(payload["qualityProfileId"], 1);
        assert_eq!(payload["languageProfileId"], 1);
        assert_eq!(payload["monitored"], true);
        assert_eq!(payload["addOptions"]["searchForMissingEpisodes"], false);
    }

    #[test]
    fn test_add_payload_for_movie() {
        let payload = build_add_payload(
            json!({"title": "Heat", "tmdbId": 949, "year": 1995}),
            ArrFlavor::Radarr,
            &settings(),
        );
        assert_eq!(payload["addOptions"]["searchForMovie"], false);
        assert!(payload.get("seasonFolder").is_none());
        assert!(payload.get("languageProfileId").is_none());
    }
}
