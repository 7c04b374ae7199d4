//! UI components for Coordinate Plotter.
//!
//! This module contains the input panel and the coordinates table.

pub mod coordinates_table;
pub mod input_panel;

pub use input_panel::{InputAction, InputPanel, PanelStatus};
