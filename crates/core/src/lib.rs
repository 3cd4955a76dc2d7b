//! Core crate for srtile: tiled super-resolution inference.

pub mod backend;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod merger;
pub mod model;
pub mod pipeline;
pub mod tiler;

pub use error::GeometryError;
pub use geometry::{tile_positions, Strides, Window};
pub use merger::merge;
pub use model::{OnnxModel, PatchModel};
pub use pipeline::Pipeline;
pub use tiler::split;
