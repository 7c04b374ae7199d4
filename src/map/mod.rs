//! Map rendering and tile management.
//!
//! This module provides the egui map surface and its slippy-tile cache.

pub mod surface;
pub mod tiles;

pub use surface::{EguiMapSurface, EguiSurfaceHost};
