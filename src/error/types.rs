use thiserror::Error;

/// Unified result type for the armature crate.
pub type Result<T> = std::result::Result<T, UiError>;

/// Errors surfaced by the widget tree, layout solver, and input router.
///
/// Every variant here is structural misuse: correct client code never hits
/// them. They propagate out of the per-frame update so the caller can log
/// and carry on. Routine absences (unbound virtual slots, missing style
/// keys, detached nodes queried for their root) never produce an error.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("node id is stale or was never allocated")]
    NodeNotFound,
    #[error("node `{0}` has no sizer")]
    MissingSizer(String),
    #[error("virtual {kind} slot {slot} out of range (device has {capacity})")]
    SlotOutOfRange {
        kind: &'static str,
        slot: usize,
        capacity: usize,
    },
    #[error("node `{0}` is not attached to the tree")]
    NotAttached(String),
    #[error("grid cell ({row}, {col}) outside a {rows}x{cols} grid")]
    GridPlacement {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("operation requires a {expected} sizer")]
    SizerMismatch { expected: &'static str },
    #[error("cannot attach node to itself or its own descendant")]
    AttachCycle,
}
