use async_trait::async_trait;
use shared::media::{ManagedItem, MediaType};

use crate::error::Result;

/// Resolves a retail barcode into a product description.
#[async_trait]
pub trait UpcLookup: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the service answered but does not know the barcode.
    async fn lookup(&self, barcode: &str) -> Result<Option<String>>;

    async fn health_check(&self) -> bool;
}

/// A digital library manager (movie or series oriented).
#[async_trait]
pub trait LibraryManager: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn media_type(&self) -> MediaType;

    async fn list_items(&self) -> Result<Vec<ManagedItem>>;
    async fn add_item(&self, title: &str, year: Option<i32>) -> Result<ManagedItem>;
    async fn health_check(&self) -> bool;
}

pub struct FallbackUpcLookup {
    providers: Vec<Box<dyn UpcLookup>>,
}

impl FallbackUpcLookup {
    pub fn new(providers: Vec<Box<dyn UpcLookup>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl UpcLookup for FallbackUpcLookup {
    fn id(&self) -> &'static str {
        "fallback"
    }

    fn name(&self) -> &'static str {
        "Fallback"
    }

    /// Asks each provider in turn. Errors are only surfaced when no provider
    /// produced an answer at all.
    async fn lookup(&self, barcode: &str) -> Result<Option<String>> {
        let mut last_error = None;
        let mut answered = false;
        for provider in &self.providers {
            match provider.lookup(barcode).await {
                Ok(Some(description)) => return Ok(Some(description)),
                Ok(None) => {
                    answered = true;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", provider.name(), e);
                    last_error = Some(e);
                    continue;
                }
            }
        }
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> bool {
        for provider in &self.providers {
            if provider.health_check().await {
                return true;
            }
        }
        false
    }
}
