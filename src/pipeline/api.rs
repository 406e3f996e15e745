// src/pipeline/api.rs
//! The output contract of a sheet build.

use cardsheet_core::{CardError, SharedBitmap};
use cardsheet_layout::{Geometry, GeometryOverflow};
use cardsheet_types::Slot;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A card that could not be resolved or fetched, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub name: String,
    pub error: CardError,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.error)
    }
}

/// What ended up in one slot.
#[derive(Debug, Clone)]
pub enum SlotContent {
    /// Past the last placement of the final sheet.
    Empty,
    Card { name: String, bitmap: SharedBitmap },
    Failure(Failure),
}

impl SlotContent {
    /// The requested name, for every slot that holds a placement.
    pub fn name(&self) -> Option<&str> {
        match self {
            SlotContent::Empty => None,
            SlotContent::Card { name, .. } => Some(name),
            SlotContent::Failure(failure) => Some(&failure.name),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotContent::Empty)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SlotContent::Failure(_))
    }

    pub fn bitmap(&self) -> Option<&SharedBitmap> {
        match self {
            SlotContent::Card { bitmap, .. } => Some(bitmap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotAssignment {
    pub slot: Slot,
    pub content: SlotContent,
}

/// One page: exactly `rows × cols` slot assignments in row-major order.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Zero-based position of this sheet in the batch.
    pub index: usize,
    pub slots: Vec<SlotAssignment>,
}

impl Sheet {
    /// Slots holding a placement, card or failure.
    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|a| !a.content.is_empty()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Failure> {
        self.slots.iter().filter_map(|a| match &a.content {
            SlotContent::Failure(failure) => Some(failure),
            _ => None,
        })
    }

    /// Names in slot order, `None` for empty slots.
    pub fn names(&self) -> Vec<Option<&str>> {
        self.slots.iter().map(|a| a.content.name()).collect()
    }
}

/// A finished build: the shared geometry and every sheet, fully resolved.
#[derive(Debug, Clone)]
pub struct SheetBatch {
    pub geometry: Geometry,
    pub sheets: Vec<Sheet>,
}

impl SheetBatch {
    /// Set when the grid does not fit the page; the build still completes.
    pub fn overflow(&self) -> Option<&GeometryOverflow> {
        self.geometry.overflow.as_ref()
    }

    pub fn placement_count(&self) -> usize {
        self.sheets.iter().map(Sheet::filled_count).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.sheets.iter().map(|s| s.failures().count()).sum()
    }

    /// Status line for one sheet: `"3/8 slots @ 3300x2550 (landscape)"`.
    pub fn summary(&self, sheet: &Sheet) -> String {
        format!(
            "{}/{} slots @ {}x{} ({})",
            sheet.filled_count(),
            sheet.slots.len(),
            self.geometry.page.width,
            self.geometry.page.height,
            self.geometry.orientation
        )
    }
}

/// Reported once per distinct card name as its load finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProgress {
    pub completed: usize,
    pub total: usize,
    pub name: String,
}

pub type ProgressCallback = Arc<dyn Fn(&BuildProgress) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use cardsheet_core::ResolutionError;
    use cardsheet_layout::{SheetConfig, compute_geometry};

    #[test]
    fn test_sheet_counts_and_summary() {
        let geometry = compute_geometry(&SheetConfig::default()).unwrap();
        let failure = Failure {
            name: "Darth Vader".to_string(),
            error: ResolutionError::NoMatch("Darth Vader".to_string()).into(),
        };
        let slots = geometry
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotAssignment {
                slot: *slot,
                content: if i == 0 { SlotContent::Failure(failure.clone()) } else { SlotContent::Empty },
            })
            .collect();
        let batch = SheetBatch {
            geometry,
            sheets: vec![Sheet { index: 0, slots }],
        };

        assert_eq!(batch.placement_count(), 1);
        assert_eq!(batch.failure_count(), 1);
        assert_eq!(batch.summary(&batch.sheets[0]), "1/8 slots @ 3300x2550 (landscape)");
        assert_eq!(failure.to_string(), "Darth Vader: No card matches \"Darth Vader\"");
        assert!(batch.overflow().is_none());
    }

    #[test]
    fn test_progress_serializes_camel_case() {
        let progress = BuildProgress {
            completed: 1,
            total: 2,
            name: "Luke Skywalker".to_string(),
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["completed"], 1);
        assert_eq!(json["name"], "Luke Skywalker");
    }
}
