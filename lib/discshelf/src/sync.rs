//! Reconciles the catalog with what the digital library managers list.

use shared::library::SyncReport;
use tracing::{info, warn};

use crate::catalog::from_managed;
use crate::error::{DiscshelfError, Result};
use crate::store::{Catalog, UpsertOutcome};
use crate::traits::LibraryManager;

pub struct SyncEngine;

impl SyncEngine {
    /// Pulls every title from both managers into the catalog.
    ///
    /// Holds the catalog's exclusive gate for the whole run. Each manager's
    /// listing is written as one batch. An unreachable manager or a failed
    /// catalog write is reported in [`SyncReport::errors`] and the run moves
    /// on; local records are never deleted and the physical flag is never
    /// cleared.
    pub async fn sync(
        movies: &dyn LibraryManager,
        series: &dyn LibraryManager,
        catalog: &Catalog,
    ) -> Result<SyncReport> {
        let _gate = catalog.sync_gate().await;
        let mut report = SyncReport::default();

        for manager in [movies, series] {
            let listed = match manager.list_items().await {
                Ok(items) => items,
                Err(e) => {
                    let e = DiscshelfError::ManagerUnavailable {
                        manager: manager.name().to_string(),
                        message: e.to_string(),
                    };
                    warn!("Skipping {}: {}", manager.name(), e);
                    report.errors.push(e.to_string());
                    continue;
                }
            };

            let batch = listed.iter().map(from_managed).collect();
            let outcomes = match catalog.store().upsert_batch(batch).await {
                Ok(outcomes) => outcomes,
                Err(e) => {
                    warn!("Catalog write for {} failed: {}", manager.name(), e);
                    report
                        .errors
                        .push(format!("{}: catalog update failed: {e}", manager.name()));
                    continue;
                }
            };

            let (mut added, mut updated) = (0, 0);
            for outcome in &outcomes {
                match outcome {
                    UpsertOutcome::Inserted(_) => added += 1,
                    UpsertOutcome::Updated(_) => updated += 1,
                    UpsertOutcome::Unchanged(_) => {}
                }
            }
            info!(
                "{}: {} listed, {} added, {} updated",
                manager.name(),
                listed.len(),
                added,
                updated
            );
            report.added += added;
            report.updated += updated;
        }

        Ok(report)
    }
}
