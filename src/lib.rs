//! Retained-mode UI core for a real-time application framework.
//!
//! Client code builds a tree of widgets that self-size through pluggable
//! sizers, and the root routes pointer, keyboard, and virtual gamepad
//! input to the right widget with deterministic priority and focus
//! semantics. The modules follow the RSB `MODULE_SPEC` pattern: each
//! orchestrator re-exports its private implementation modules.

pub mod error;
pub mod events;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod render;
pub mod root;
pub mod style;
pub mod tree;

pub use error::{Result, UiError};
pub use events::{EventBus, HandlerKey, UiEvent, UiOps};
pub use geometry::{Insets, Rect, Vec2};
pub use input::{
    BindingArbiter, ClaimPriority, ControlKind, DeviceId, DeviceSnapshot, ExclusiveClaim,
    InputSource, Key, KeyEvent, Modifiers, PhysicalControl, VirtualDevice, VirtualFrame,
};
pub use layout::{BoxSizer, FillFlags, FreeSizer, GridSizer, Orientation, Sizer, SizerEntry};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{FrameMetrics, MetricSnapshot};
pub use render::{DrawItem, RenderList};
pub use root::{FrameInput, KeyListenerFn, KeyListenerId, Root, RootConfig};
pub use style::StyleSheet;
pub use tree::{Anchor, Behaviour, Node, NodeId, Tree};
