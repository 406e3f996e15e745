//! Print geometry for card sheets.
//!
//! [`compute_geometry`] turns a [`SheetConfig`] into a [`Geometry`]: page size
//! in device pixels, orientation, the grid of card slots and the bleed inset.
//! It is a pure function of its input and never touches card content.

use thiserror::Error;

/// Malformed sheet configuration. This is the only fatal condition of a build.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Grid must have at least one row and one column, got {rows}x{cols}.")]
    EmptyGrid { rows: u32, cols: u32 },
    #[error("DPI must be at least 1.")]
    ZeroDpi,
    #[error("{field} must be a positive, finite length in inches, got {value}.")]
    InvalidCardSize { field: &'static str, value: f64 },
    #[error("{field} must be a non-negative, finite length, got {value}.")]
    InvalidLength { field: &'static str, value: f64 },
}

pub mod config;
mod engine;

pub use self::config::{SheetConfig, SlotSpacing};
pub use self::engine::{choose_orientation, compute_geometry, Geometry, GeometryOverflow};
