use vesper_common::EntityId;

/// Render-state misuse. These are programming errors in the frame loop; the
/// offending call is refused before it touches the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("camera {requested} begun while camera {open} is still active")]
    NestedBegin { open: EntityId, requested: EntityId },
    #[error("camera end without a matching begin")]
    UnmatchedEnd,
}
