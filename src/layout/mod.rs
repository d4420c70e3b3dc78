//! Layout module orchestrator following the RSB module specification.
//!
//! Downstream code imports sizer types from here while the box/free
//! implementations live in the private `core` module.

mod core;
pub mod grid;

pub use core::{BoxSizer, FillFlags, FreeSizer, Orientation, Sizer, SizerEntry, SizerItem};
pub use grid::GridSizer;
