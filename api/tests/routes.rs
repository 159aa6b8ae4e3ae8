use std::sync::Arc;

use api::{router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use discshelf::{
    catalog::new_media_item, Catalog, DiscshelfError, JsonLibraryStore, LibraryManager,
    LibraryStore, Result, ServicesBuilder, UpcLookup,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shared::media::{ManagedItem, MediaSource, MediaType};
use tower::ServiceExt;

struct Upc;

#[async_trait]
impl UpcLookup for Upc {
    fn id(&self) -> &'static str {
        "test-upc"
    }
    fn name(&self) -> &'static str {
        "Test UPC"
    }
    async fn lookup(&self, barcode: &str) -> Result<Option<String>> {
        Ok(match barcode {
            "012345678905" => Some("The Matrix (1999) Widescreen Special Edition Disc 1".to_string()),
            "024543046451" => Some("Garfield Movie".to_string()),
            "500" => {
                return Err(DiscshelfError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
            _ => None,
        })
    }
    async fn health_check(&self) -> bool {
        true
    }
}

struct Manager(MediaType, Vec<ManagedItem>);

#[async_trait]
impl LibraryManager for Manager {
    fn id(&self) -> &'static str {
        "test-manager"
    }
    fn name(&self) -> &'static str {
        "Test manager"
    }
    fn media_type(&self) -> MediaType {
        self.0
    }
    async fn list_items(&self) -> Result<Vec<ManagedItem>> {
        Ok(self.1.clone())
    }
    async fn add_item(&self, title: &str, year: Option<i32>) -> Result<ManagedItem> {
        Ok(ManagedItem {
            id: 42,
            media_type: self.0,
            title: title.to_string(),
            year,
            genres: vec![],
            root_folder_path: None,
        })
    }
    async fn health_check(&self) -> bool {
        false
    }
}

async fn app() -> (Router, Arc<JsonLibraryStore>) {
    let store = Arc::new(JsonLibraryStore::in_memory());
    store
        .upsert(new_media_item(
            "The Matrix",
            MediaType::Movie,
            Some(1999),
            MediaSource::Radarr,
        ))
        .await
        .unwrap();

    let firefly = ManagedItem {
        id: 7,
        media_type: MediaType::Series,
        title: "Firefly".to_string(),
        year: Some(2002),
        genres: vec!["Drama".to_string(), "Science Fiction".to_string()],
        root_folder_path: Some("/tv".to_string()),
    };
    let services = ServicesBuilder::new()
        .add_upc(Upc)
        .movies(Manager(MediaType::Movie, vec![]))
        .series(Manager(MediaType::Series, vec![firefly]))
        .build()
        .unwrap();
    let catalog = Arc::new(Catalog::new(store.clone()));
    (router(Arc::new(AppState::new(services, catalog))), store)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn scan_resolves_and_updates_stats() {
    let (app, _) = app().await;

    let (status, body) = call(&app, "POST", "/api/scan", Some(json!({"barcode": "012345678905"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["toggled"], true);
    assert_eq!(body["suggested_type"], "movie");
    assert_eq!(body["steps"].as_array().unwrap().last().unwrap()["status"], "completed");

    let (_, stats) = call(&app, "GET", "/api/stats", None).await;
    assert_eq!(stats, json!({"movies": 1, "series": 0, "dvds": 1}));
}

#[tokio::test]
async fn failed_scans_map_to_status_codes_and_keep_steps() {
    let (app, _) = app().await;

    let (status, body) = call(&app, "POST", "/api/scan", Some(json!({"barcode": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, "POST", "/api/scan", Some(json!({"barcode": "024543046451"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(!body["local_results"].as_array().unwrap().is_empty());
    assert!(!body["steps"].as_array().unwrap().is_empty());

    let (status, _) = call(&app, "POST", "/api/scan", Some(json!({"barcode": "111"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "POST", "/api/scan", Some(json!({"barcode": "500"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("UPC lookup failed"));
}

#[tokio::test]
async fn sync_then_browse() {
    let (app, _) = app().await;

    let (status, report) = call(&app, "POST", "/api/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report, json!({"added": 1, "updated": 0, "errors": []}));

    let (_, media) = call(&app, "GET", "/api/media", None).await;
    let titles: Vec<&str> = media
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Firefly", "The Matrix"]);

    let (_, genres) = call(&app, "GET", "/api/genre-stats", None).await;
    assert_eq!(genres["series"]["Drama"], 1);
    assert_eq!(genres["all"]["Science Fiction"], 1);
}

#[tokio::test]
async fn manual_add_and_toggle() {
    let (app, store) = app().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/media",
        Some(json!({"barcode": "024543046451", "title": "Garfield", "year": 2004, "type": "movie"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["has_physical"], true);
    let id = body["item"]["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "POST", &format!("/api/media/{id}/physical"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_physical"], false);
    assert_eq!(store.stats().await.unwrap().dvds, 0);

    let (status, _) = call(
        &app,
        "POST",
        "/api/media/00000000-0000-0000-0000-000000000000/physical",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_each_collaborator() {
    let (app, _) = app().await;
    let (status, health) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        health,
        json!({"upc_online": true, "movies_online": false, "series_online": false})
    );
}
