//! Sheet build pipeline orchestration.
//!
//! - [`PipelineBuilder`]: Fluent builder for constructing sheet pipelines
//! - [`SheetPipeline`]: Normalizes a list, loads cards concurrently and paginates
//! - [`PipelineConfig`]: JSON-loadable settings
//!
//! # Example
//!
//! ```ignore
//! use cardsheet::PipelineBuilder;
//!
//! let pipeline = PipelineBuilder::new()
//!     .with_config_file("cardsheet.json")?
//!     .with_concurrency(4)
//!     .build()?;
//!
//! let batch = pipeline.generate("Luke Skywalker x2\nDarth Vader").await?;
//! ```

pub mod api;
mod builder;
pub(crate) mod concurrency;
pub mod config;
mod orchestrator;

// Core public API
pub use api::{BuildProgress, Failure, ProgressCallback, Sheet, SheetBatch, SlotAssignment, SlotContent};
pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use orchestrator::{SheetPipeline, expand_placements, paginate};
