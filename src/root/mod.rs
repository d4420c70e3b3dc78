//! Root module orchestrator following the RSB module specification.
//!
//! The router and frame loop live in the private `core` module; focus
//! transitions live in `focus`.

mod core;
mod focus;

pub use core::{FrameInput, KeyListenerFn, KeyListenerId, Root, RootConfig};
