use std::sync::Arc;

use discshelf::{BarcodeResolver, Catalog, Services, SyncEngine};
use shared::library::SyncReport;

/// Shared state for the HTTP handlers.
pub struct AppState {
    pub resolver: BarcodeResolver,
}

impl AppState {
    pub fn new(services: Services, catalog: Arc<Catalog>) -> Self {
        Self {
            resolver: BarcodeResolver::new(services, catalog),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.resolver.catalog()
    }

    pub fn services(&self) -> &Services {
        self.resolver.services()
    }

    pub async fn sync(&self) -> discshelf::Result<SyncReport> {
        let services = self.services();
        SyncEngine::sync(
            services.movies().as_ref(),
            services.series().as_ref(),
            self.catalog(),
        )
        .await
    }
}
