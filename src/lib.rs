//! # cardsheet
//!
//! Print-ready proxy sheets for card games.
//!
//! A pasted card list goes through four stages:
//! - **source**: normalize free-form lines into `(name, quantity)` requests
//! - **core**: resolve names to printings and fetch their artwork through a proxy
//! - **layout**: compute DPI-accurate page and slot geometry
//! - **pipeline**: load cards concurrently and paginate them into sheets
//!
//! [`SheetRenderer`] turns a finished [`SheetBatch`] into page bitmaps, with
//! optional cut guides and underlay/overlay [`Template`]s.

pub mod error;
pub mod pipeline;
pub mod render;

// Component crates
pub use cardsheet_core as core;
pub use cardsheet_layout as layout;
pub use cardsheet_source as source;
pub use cardsheet_types as types;

// Re-export commonly used types
pub use cardsheet_core::{CardError, FetchError, ImageCache, ResolutionError, RetryPolicy};
pub use cardsheet_layout::{Geometry, GeometryOverflow, SheetConfig, SlotSpacing, compute_geometry};
pub use cardsheet_source::normalize;
pub use cardsheet_types::{CardRequest, Orientation, PixelRect, Slot};
pub use error::PipelineError;
pub use pipeline::{
    BuildProgress, Failure, PipelineBuilder, PipelineConfig, Sheet, SheetBatch, SheetPipeline,
    SlotAssignment, SlotContent,
};
pub use render::{LabelFont, SheetRenderer, Template};
