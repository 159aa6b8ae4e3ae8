use std::sync::Arc;

use futures::future::join3;
use shared::{
    media::MediaType,
    system::{AvailableBackends, BackendInfo, SystemHealth},
};

use crate::traits::{FallbackUpcLookup, LibraryManager, UpcLookup};

/// The external collaborators a scan or sync talks to.
#[derive(Clone)]
pub struct Services {
    upc: Arc<dyn UpcLookup>,
    upc_providers: Vec<BackendInfo>,
    movies: Arc<dyn LibraryManager>,
    series: Arc<dyn LibraryManager>,
}

impl Services {
    pub fn upc(&self) -> &Arc<dyn UpcLookup> {
        &self.upc
    }

    pub fn movies(&self) -> &Arc<dyn LibraryManager> {
        &self.movies
    }

    pub fn series(&self) -> &Arc<dyn LibraryManager> {
        &self.series
    }

    pub fn manager_for(&self, media_type: MediaType) -> &Arc<dyn LibraryManager> {
        match media_type {
            MediaType::Movie => &self.movies,
            MediaType::Series => &self.series,
        }
    }

    pub fn list_backends(&self) -> AvailableBackends {
        AvailableBackends {
            upc: self.upc_providers.clone(),
            managers: [&self.movies, &self.series]
                .into_iter()
                .map(|m| BackendInfo {
                    id: m.id().to_string(),
                    name: m.name().to_string(),
                })
                .collect(),
        }
    }

    /// Checks every collaborator concurrently.
    pub async fn health(&self) -> SystemHealth {
        let (upc_online, movies_online, series_online) = join3(
            self.upc.health_check(),
            self.movies.health_check(),
            self.series.health_check(),
        )
        .await;
        SystemHealth {
            upc_online,
            movies_online,
            series_online,
        }
    }
}

#[derive(Default)]
pub struct ServicesBuilder {
    upc: Vec<Box<dyn UpcLookup>>,
    movies: Option<Arc<dyn LibraryManager>>,
    series: Option<Arc<dyn LibraryManager>>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Providers are asked in the order they are added.
    pub fn add_upc(mut self, provider: impl UpcLookup + 'static) -> Self {
        self.upc.push(Box::new(provider));
        self
    }

    pub fn movies(mut self, manager: impl LibraryManager + 'static) -> Self {
        self.movies = Some(Arc::new(manager));
        self
    }

    pub fn series(mut self, manager: impl LibraryManager + 'static) -> Self {
        self.series = Some(Arc::new(manager));
        self
    }

    pub fn build(mut self) -> Result<Services, &'static str> {
        if self.upc.is_empty() {
            return Err("at least one UPC provider required");
        }
        let movies = self.movies.ok_or("a movie manager is required")?;
        let series = self.series.ok_or("a series manager is required")?;
        if movies.media_type() != MediaType::Movie || series.media_type() != MediaType::Series {
            return Err("managers registered for the wrong media type");
        }

        let upc_providers = self
            .upc
            .iter()
            .map(|p| BackendInfo {
                id: p.id().to_string(),
                name: p.name().to_string(),
            })
            .collect();

        let upc: Arc<dyn UpcLookup> = if self.upc.len() == 1 {
            match self.upc.pop() {
                Some(single) => Arc::from(single),
                None => return Err("at least one UPC provider required"),
            }
        } else {
            Arc::new(FallbackUpcLookup::new(self.upc))
        };

        Ok(Services {
            upc,
            upc_providers,
            movies,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;
    use shared::media::ManagedItem;

    struct Upc(&'static str);

    #[async_trait]
    impl UpcLookup for Upc {
        fn id(&self) -> &'static str {
            self.0
        }
        fn name(&self) -> &'static str {
            self.0
        }
        async fn lookup(&self, _barcode: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn health_check(&self) -> bool {
            true
        }
    }

    struct Manager(MediaType, bool);

    #[async_trait]
    impl LibraryManager for Manager {
        fn id(&self) -> &'static str {
            match self.0 {
                MediaType::Movie => "movies",
                MediaType::Series => "series",
            }
        }
        fn name(&self) -> &'static str {
            self.id()
        }
        fn media_type(&self) -> MediaType {
            self.0
        }
        async fn list_items(&self) -> Result<Vec<ManagedItem>> {
            Ok(vec![])
        }
        async fn add_item(&self, _title: &str, _year: Option<i32>) -> Result<ManagedItem> {
            unimplemented!()
        }
        async fn health_check(&self) -> bool {
            self.1
        }
    }

    #[tokio::test]
    async fn builds_with_fallback_chain() {
        let services = ServicesBuilder::new()
            .add_upc(Upc("primary"))
            .add_upc(Upc("secondary"))
            .movies(Manager(MediaType::Movie, true))
            .series(Manager(MediaType::Series, false))
            .build()
            .unwrap();

        assert_eq!(services.upc().id(), "fallback");
        let backends = services.list_backends();
        assert_eq!(backends.upc.len(), 2);
        assert_eq!(backends.upc[0].id, "primary");
        assert_eq!(backends.managers.len(), 2);
        assert_eq!(services.manager_for(MediaType::Series).id(), "series");

        let health = services.health().await;
        assert!(health.upc_online);
        assert!(health.movies_online);
        assert!(!health.series_online);
    }

    #[test]
    fn rejects_incomplete_or_swapped_setups() {
        assert!(ServicesBuilder::new()
            .movies(Manager(MediaType::Movie, true))
            .series(Manager(MediaType::Series, true))
            .build()
            .is_err());

        assert!(ServicesBuilder::new()
            .add_upc(Upc("primary"))
            .movies(Manager(MediaType::Series, true))
            .series(Manager(MediaType::Movie, true))
            .build()
            .is_err());
    }
}
