// src/pipeline/orchestrator.rs
use super::api::{Failure, ProgressCallback, Sheet, SheetBatch, SlotAssignment, SlotContent};
use super::concurrency::{LoadOutcome, load_all};
use crate::error::PipelineError;
use cardsheet_core::{CardError, CardLoader};
use cardsheet_layout::{Geometry, SheetConfig, compute_geometry};
use cardsheet_source::normalize;
use cardsheet_types::{CardRequest, MAX_QUANTITY};
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// The card sheet pipeline: normalize, lay out, load, paginate.
pub struct SheetPipeline {
    loader: Arc<CardLoader>,
    sheet: SheetConfig,
    concurrency: usize,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for SheetPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetPipeline")
            .field("loader", &self.loader)
            .field("sheet", &self.sheet)
            .field("concurrency", &self.concurrency)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Expands each request into `quantity` placements, keeping input order.
/// Quantities are capped at [`MAX_QUANTITY`] even for hand-built requests.
pub fn expand_placements(requests: &[CardRequest]) -> Vec<&str> {
    requests
        .iter()
        .flat_map(|r| std::iter::repeat_n(r.name.as_str(), r.quantity.min(MAX_QUANTITY) as usize))
        .collect()
}

impl SheetPipeline {
    pub(crate) fn new(
        loader: Arc<CardLoader>,
        sheet: SheetConfig,
        concurrency: usize,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            loader,
            sheet,
            concurrency,
            progress,
        }
    }

    pub fn sheet_config(&self) -> &SheetConfig {
        &self.sheet
    }

    /// The geometry every sheet of this pipeline uses.
    pub fn geometry(&self) -> Result<Geometry, PipelineError> {
        Ok(compute_geometry(&self.sheet)?)
    }

    /// Normalizes a pasted list and builds its sheets.
    ///
    /// Fails only on malformed sheet configuration, before any network access.
    pub async fn generate(&self, list_text: &str) -> Result<SheetBatch, PipelineError> {
        let geometry = self.geometry()?;
        let requests = normalize(list_text);
        Ok(self.build(&requests, geometry).await)
    }

    /// Builds the sheets for `requests` on `geometry`.
    ///
    /// Never fails: a card that cannot be resolved or fetched becomes a
    /// failure marker in each of its slots. Returns once every slot is settled.
    pub async fn build(&self, requests: &[CardRequest], geometry: Geometry) -> SheetBatch {
        let started = Instant::now();
        if let Some(overflow) = &geometry.overflow {
            warn!("Sheet layout overflows the page: {}. Content past the edge will be clipped.", overflow);
        }

        let placements = expand_placements(requests);
        let distinct: Vec<String> = placements
            .iter()
            .unique_by(|name| name.to_lowercase())
            .map(|name| name.to_string())
            .collect();
        info!(
            "Building sheets: {} placements, {} distinct cards, {} slots per sheet.",
            placements.len(),
            distinct.len(),
            geometry.capacity()
        );

        let outcomes = load_all(&self.loader, distinct.clone(), self.concurrency, self.progress.as_ref()).await;
        let loaded: HashMap<String, LoadOutcome> = distinct
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| {
                (name.to_lowercase(), outcome.unwrap_or(Err(CardError::Interrupted)))
            })
            .collect();

        let sheets = paginate(&placements, &geometry, |name| match loaded.get(&name.to_lowercase()) {
            Some(Ok(bitmap)) => SlotContent::Card {
                name: name.to_string(),
                bitmap: bitmap.clone(),
            },
            Some(Err(error)) => SlotContent::Failure(Failure {
                name: name.to_string(),
                error: error.clone(),
            }),
            None => SlotContent::Empty,
        });

        let batch = SheetBatch { geometry, sheets };
        info!(
            "Built {} sheet(s): {} placements, {} failed, in {:.2?}.",
            batch.sheets.len(),
            batch.placement_count(),
            batch.failure_count(),
            started.elapsed()
        );
        batch
    }
}

/// Chunks placements into sheets of exactly `geometry.capacity()` slots,
/// padding the last sheet with empty slots.
pub fn paginate<F>(placements: &[&str], geometry: &Geometry, mut content_for: F) -> Vec<Sheet>
where
    F: FnMut(&str) -> SlotContent,
{
    let capacity = geometry.capacity();
    if capacity == 0 {
        return Vec::new();
    }
    placements
        .chunks(capacity)
        .enumerate()
        .map(|(index, chunk)| Sheet {
            index,
            slots: geometry
                .slots()
                .iter()
                .enumerate()
                .map(|(i, slot)| SlotAssignment {
                    slot: *slot,
                    content: chunk.get(i).map_or(SlotContent::Empty, |name| content_for(name)),
                })
                .collect(),
        })
        .collect()
}
