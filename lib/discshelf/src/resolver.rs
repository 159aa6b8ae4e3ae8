//! The barcode pipeline: local barcode check, UPC lookup, normalization,
//! local search and the attach-or-ask decision.
//!
//! Every branch leaves a trace of [`ScanStep`]s ending in a `completed` step.
//! A scan never creates a catalog record; weak evidence is handed back as
//! ranked candidates and resolved through [`BarcodeResolver::add`].

use std::sync::Arc;

use shared::{
    media::{AddRequest, MediaItem, MediaSource},
    scan::{MatchCandidate, ScanResult, ScanStep, StepStatus},
};
use tracing::{info, warn};

use crate::catalog::from_managed;
use crate::classify::classify;
use crate::matcher::{FuzzyMatcher, DEFAULT_TOP_N};
use crate::normalize::{display_title, extract_year, normalize};
use crate::services::Services;
use crate::store::{Catalog, StoreError};

/// Why a resolution did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFailure {
    /// Blank barcode or title.
    InvalidRequest,
    /// The UPC service does not know the barcode, or its description held no title.
    LookupMiss,
    /// No local candidate cleared the confidence gate.
    Ambiguous,
    /// A UPC service or library manager call failed.
    Collaborator,
    Store,
}

/// A [`ScanResult`] plus the failure class callers map to a response.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub result: ScanResult,
    pub failure: Option<ScanFailure>,
}

impl Resolution {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

struct Halt {
    failure: ScanFailure,
    message: String,
    /// Pipeline step a catalog error interrupted.
    step: Option<&'static str>,
}

impl Halt {
    fn new(failure: ScanFailure, message: impl Into<String>) -> Self {
        Self {
            failure,
            message: message.into(),
            step: None,
        }
    }
}

/// Tag a catalog error with the step it interrupted.
fn store_failure(step: &'static str) -> impl Fn(StoreError) -> Halt {
    move |e| Halt {
        failure: ScanFailure::Store,
        message: e.to_string(),
        step: Some(step),
    }
}

const BARCODE_CHECK: &str = "Local barcode check";
const LOCAL_SEARCH: &str = "Local search";
const DECISION: &str = "Decision";
const CATALOG_UPDATE: &str = "Catalog update";

/// Append-only trace threaded through one resolution.
struct Trace {
    result: ScanResult,
}

impl Trace {
    fn new(barcode: &str) -> Self {
        Self {
            result: ScanResult {
                barcode: barcode.to_string(),
                ..Default::default()
            },
        }
    }

    fn step(&mut self, action: &str, status: StepStatus, details: impl Into<String>) {
        self.step_with_matches(action, status, details, vec![]);
    }

    fn step_with_matches(
        &mut self,
        action: &str,
        status: StepStatus,
        details: impl Into<String>,
        matches: Vec<MatchCandidate>,
    ) {
        self.result.steps.push(ScanStep {
            action: action.to_string(),
            status,
            details: Some(details.into()),
            matches,
        });
    }

    fn succeed(mut self, summary: String) -> Resolution {
        self.result.success = true;
        self.step("Completed", StepStatus::Completed, summary);
        Resolution {
            result: self.result,
            failure: None,
        }
    }

    fn fail(mut self, halt: Halt) -> Resolution {
        self.result.success = false;
        self.result.error = Some(halt.message.clone());
        self.step("Completed", StepStatus::Completed, halt.message);
        Resolution {
            result: self.result,
            failure: Some(halt.failure),
        }
    }
}

pub struct BarcodeResolver {
    services: Services,
    catalog: Arc<Catalog>,
    matcher: FuzzyMatcher,
}

impl BarcodeResolver {
    pub fn new(services: Services, catalog: Arc<Catalog>) -> Self {
        Self {
            services,
            catalog,
            matcher: FuzzyMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Resolve one scanned barcode.
    pub async fn scan(&self, barcode: &str) -> Resolution {
        let barcode = barcode.trim();
        let mut trace = Trace::new(barcode);
        if barcode.is_empty() {
            trace.step("Validate barcode", StepStatus::Error, "Barcode is empty");
            return trace.fail(Halt::new(ScanFailure::InvalidRequest, "Barcode is required"));
        }

        info!("Scanning barcode {}", barcode);
        let _gate = self.catalog.scan_gate().await;
        let outcome = self.resolve(barcode, &mut trace).await;
        self.finish(trace, outcome)
    }

    /// Manual resolution of a barcode the scan could not place.
    pub async fn add(&self, request: &AddRequest) -> Resolution {
        let barcode = request.barcode.trim();
        let title = request.title.trim();
        let mut trace = Trace::new(barcode);
        if barcode.is_empty() || title.is_empty() {
            trace.step("Validate request", StepStatus::Error, "Barcode and title are required");
            return trace.fail(Halt::new(
                ScanFailure::InvalidRequest,
                "Barcode and title are required",
            ));
        }

        info!("Adding '{}' for barcode {}", title, barcode);
        let _gate = self.catalog.scan_gate().await;
        let outcome = self.add_confirmed(barcode, title, request, &mut trace).await;
        self.finish(trace, outcome)
    }

    fn finish(&self, mut trace: Trace, outcome: Result<String, Halt>) -> Resolution {
        match outcome {
            Ok(summary) => {
                info!("Barcode {}: {}", trace.result.barcode, summary);
                trace.succeed(summary)
            }
            Err(halt) => {
                if let Some(step) = halt.step {
                    trace.step(step, StepStatus::Error, halt.message.clone());
                }
                warn!("Barcode {}: {}", trace.result.barcode, halt.message);
                trace.fail(halt)
            }
        }
    }

    async fn resolve(&self, barcode: &str, trace: &mut Trace) -> Result<String, Halt> {
        let store = self.catalog.store();

        // Exact barcode: no external call needed.
        let known = store
            .find_by_barcode(barcode)
            .await
            .map_err(store_failure(BARCODE_CHECK))?;
        if let Some(known) = known {
            trace.step(
                BARCODE_CHECK,
                StepStatus::Found,
                format!("Barcode already attached to '{}'", known.title),
            );
            trace.result.suggested_title = Some(known.title.clone());
            trace.result.base_title = Some(known.normalized_title.clone());
            trace.result.suggested_type = Some(known.media_type);

            let (_, item) = self.attach(&known, barcode).await?;
            trace.result.toggled = true;
            let summary = format!("'{}' confirmed as a physical copy", item.title);
            trace.result.item = Some(item);
            return Ok(summary);
        }
        trace.step(
            BARCODE_CHECK,
            StepStatus::NotFound,
            "No catalog record carries this barcode",
        );

        let upc = self.services.upc();
        let description = match upc.lookup(barcode).await {
            Ok(Some(description)) => {
                trace.step("UPC lookup", StepStatus::Found, description.clone());
                description
            }
            Ok(None) => {
                trace.step(
                    "UPC lookup",
                    StepStatus::NotFound,
                    format!("{} does not know this barcode", upc.name()),
                );
                return Err(Halt::new(
                    ScanFailure::LookupMiss,
                    "Barcode not found in UPC database",
                ));
            }
            Err(e) => {
                trace.step("UPC lookup", StepStatus::Error, e.to_string());
                return Err(Halt::new(
                    ScanFailure::Collaborator,
                    format!("UPC lookup failed: {e}"),
                ));
            }
        };

        let base_title = normalize(&description);
        let suggested_title = display_title(&description);
        let media_type = classify(&description);
        let year = extract_year(&description);
        trace.result.suggested_title = Some(suggested_title.clone());
        trace.result.base_title = Some(base_title.clone());
        trace.result.suggested_type = Some(media_type);
        if base_title.is_empty() {
            trace.step(
                "Normalize & classify",
                StepStatus::NotFound,
                "Description holds no usable title",
            );
            return Err(Halt::new(
                ScanFailure::LookupMiss,
                format!("No usable title in '{description}'"),
            ));
        }
        trace.step(
            "Normalize & classify",
            StepStatus::Completed,
            match year {
                Some(year) => format!("'{base_title}' ({year}), looks like a {media_type}"),
                None => format!("'{base_title}', looks like a {media_type}"),
            },
        );

        let candidates = store
            .search(&base_title, year, Some(media_type))
            .await
            .map_err(store_failure(LOCAL_SEARCH))?;
        let ranked = self.matcher.search(
            &base_title,
            year,
            Some(media_type),
            &candidates,
            DEFAULT_TOP_N,
        );
        let accepted = if self.matcher.is_confident(&ranked) {
            ranked.first().cloned()
        } else {
            None
        };
        let search_status = if ranked.is_empty() {
            StepStatus::NotFound
        } else {
            StepStatus::Found
        };
        let search_details = match ranked.first() {
            Some(top) => format!(
                "{} candidates, best '{}' at {:.0}",
                ranked.len(),
                top.title,
                top.similarity
            ),
            None => "No local candidates".to_string(),
        };
        trace.step_with_matches(LOCAL_SEARCH, search_status, search_details, ranked.clone());
        trace.result.local_results = ranked;

        let top = match accepted {
            Some(top) => top,
            None => {
                trace.step(
                    DECISION,
                    StepStatus::NotFound,
                    "No confident match, manual resolution needed",
                );
                return Err(Halt::new(
                    ScanFailure::Ambiguous,
                    format!("No confident local match for '{suggested_title}'"),
                ));
            }
        };

        let matched = store
            .get(top.id)
            .await
            .and_then(|found| found.ok_or(StoreError::NotFound(top.id)))
            .map_err(store_failure(DECISION))?;
        trace.step(
            DECISION,
            StepStatus::Found,
            format!("Matched '{}' ({:.0})", matched.title, top.similarity),
        );

        let (was_physical, item) = self.attach(&matched, barcode).await?;
        trace.result.updated = true;
        trace.result.toggled = !was_physical;
        let summary = format!("Barcode attached to '{}'", item.title);
        trace.result.item = Some(item);
        Ok(summary)
    }

    /// Set the physical flag and attach the barcode under the record's key
    /// lock. Returns whether the flag was already set.
    async fn attach(&self, item: &MediaItem, barcode: &str) -> Result<(bool, MediaItem), Halt> {
        let _key = self.catalog.lock_key(&item.key()).await;
        let store = self.catalog.store();
        let was_physical = store
            .get(item.id)
            .await
            .and_then(|found| found.ok_or(StoreError::NotFound(item.id)))
            .map_err(store_failure(CATALOG_UPDATE))?
            .has_physical;
        let updated = store
            .mark_physical(item.id, barcode)
            .await
            .map_err(store_failure(CATALOG_UPDATE))?;
        Ok((was_physical, updated))
    }

    async fn add_confirmed(
        &self,
        barcode: &str,
        title: &str,
        request: &AddRequest,
        trace: &mut Trace,
    ) -> Result<String, Halt> {
        let base_title = normalize(title);
        trace.result.suggested_title = Some(title.to_string());
        trace.result.base_title = Some(base_title.clone());
        trace.result.suggested_type = Some(request.media_type);

        // A barcode identifies one title. Re-adding the title it already
        // carries just confirms the copy; any other title is refused.
        let holder = self
            .catalog
            .store()
            .find_by_barcode(barcode)
            .await
            .map_err(store_failure(BARCODE_CHECK))?;
        if let Some(holder) = holder {
            trace.step(
                BARCODE_CHECK,
                StepStatus::Found,
                format!("Barcode already attached to '{}'", holder.title),
            );
            if holder.normalized_title != base_title || holder.media_type != request.media_type {
                return Err(Halt::new(
                    ScanFailure::InvalidRequest,
                    format!(
                        "Barcode {barcode} is already attached to '{}'",
                        holder.title
                    ),
                ));
            }
            let (was_physical, item) = self.attach(&holder, barcode).await?;
            trace.result.toggled = !was_physical;
            let summary = format!("'{}' confirmed as a physical copy", item.title);
            trace.result.item = Some(item);
            return Ok(summary);
        }
        trace.step(
            BARCODE_CHECK,
            StepStatus::NotFound,
            "No catalog record carries this barcode",
        );

        let manager = self.services.manager_for(request.media_type);
        let managed = match manager.add_item(title, request.year).await {
            Ok(managed) => {
                trace.step(
                    &format!("Add to {}", manager.name()),
                    StepStatus::Found,
                    format!("'{}' is managed as id {}", managed.title, managed.id),
                );
                managed
            }
            Err(e) => {
                trace.step(&format!("Add to {}", manager.name()), StepStatus::Error, e.to_string());
                return Err(Halt::new(
                    ScanFailure::Collaborator,
                    format!("{} could not add '{title}': {e}", manager.name()),
                ));
            }
        };

        let mut item = from_managed(&managed);
        item.source = MediaSource::Barcode;
        item.has_physical = true;
        item.barcodes.insert(barcode.to_string());

        let _key = self.catalog.lock_key(&item.key()).await;
        let stored = self
            .catalog
            .store()
            .upsert(item)
            .await
            .map_err(store_failure(CATALOG_UPDATE))?
            .into_item();
        trace.step(
            CATALOG_UPDATE,
            StepStatus::Completed,
            format!("'{}' recorded as a physical copy", stored.title),
        );
        trace.result.updated = true;
        let summary = format!("Added '{}' with barcode {}", stored.title, barcode);
        trace.result.item = Some(stored);
        Ok(summary)
    }
}
