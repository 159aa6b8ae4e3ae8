use std::sync::Arc;

use api::{router, AppConfig, AppState, ConfigError};
use discshelf::{
    arr::{ArrClientBuilder, ArrManager, ArrSettings},
    upc::UpcItemDbClientBuilder,
    Catalog, JsonLibraryStore, Services, ServicesBuilder,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn build_services(config: &AppConfig) -> Result<Services, Box<dyn std::error::Error>> {
    let mut upc = UpcItemDbClientBuilder::new();
    if let Some(url) = &config.upc_lookup_url {
        upc = upc.base_url(url);
    }
    if let Some(key) = &config.upc_api_key {
        upc = upc.api_key(key);
    }

    let radarr = ArrClientBuilder::new()
        .base_url(&config.radarr_url)
        .api_key(&config.radarr_api_key)
        .build()?;
    let sonarr = ArrClientBuilder::new()
        .base_url(&config.sonarr_url)
        .api_key(&config.sonarr_api_key)
        .build()?;

    let services = ServicesBuilder::new()
        .add_upc(upc.build()?)
        .movies(ArrManager::radarr(
            radarr,
            ArrSettings {
                root_folder: config.movie_root.clone(),
                quality_profile_id: config.quality_profile_id,
                language_profile_id: None,
            },
        ))
        .series(ArrManager::sonarr(
            sonarr,
            ArrSettings {
                root_folder: config.tv_root.clone(),
                quality_profile_id: config.quality_profile_id,
                language_profile_id: config.language_profile_id,
            },
        ))
        .build()
        .map_err(ConfigError::Services)?;
    Ok(services)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "discshelf=info,api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let store = JsonLibraryStore::open(&config.catalog_path).await?;
    info!("Catalog loaded from {}", config.catalog_path.display());

    let catalog = Arc::new(Catalog::new(Arc::new(store)));
    let state = Arc::new(AppState::new(build_services(&config)?, catalog));

    if config.sync_on_startup {
        match state.sync().await {
            Ok(report) => info!(
                "Startup sync: {} added, {} updated",
                report.added, report.updated
            ),
            Err(e) => warn!("Startup sync failed: {}", e),
        }
    }

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {}", address);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
