pub mod arr;
pub mod catalog;
pub mod classify;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod resolver;
pub mod retry;
pub mod services;
pub mod store;
pub mod sync;
pub mod traits;
pub mod upc;

pub use error::{DiscshelfError, Result};
pub use resolver::{BarcodeResolver, Resolution, ScanFailure};
pub use services::{Services, ServicesBuilder};
pub use store::{Catalog, JsonLibraryStore, LibraryStore, StoreError};
pub use sync::SyncEngine;
pub use traits::{FallbackUpcLookup, LibraryManager, UpcLookup};
