//! Stride – aggregation, filtering and calendar layout engine behind the
//! activity heatmaps.
//!
//! Everything here is synchronous and side-effect free over a read-only
//! [`payload::Payload`]; [`render::recompute`] turns a payload plus a
//! [`filter::FilterState`] into plain render-ready data.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod filter;
pub mod format;
pub mod grid;
pub mod heat;
pub mod payload;
pub mod render;
pub mod stats;
pub mod summary;
pub mod svg;

pub use filter::FilterState;
pub use payload::{Payload, PayloadError};
pub use render::{recompute, RenderModel, ViewOptions};
