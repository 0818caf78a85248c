//! Error types for the loudness graph element

use loudwatch_core::CoreError;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors surfaced by [`GraphElement`](crate::GraphElement)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Format, meter or buffer failure from the engine
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input or output requested before `configure`
    #[error("Graph element has no negotiated audio and video format")]
    NotConfigured,

    /// Rejected settings value
    #[error("Invalid graph settings: {0}")]
    InvalidSettings(String),

    /// The configured sizes leave no room for the graph
    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    /// Reconfiguration or new input while a buffer is still being consumed
    #[error("An input buffer is still being consumed")]
    CursorActive,

    /// Pixel surface could not be allocated
    #[error("Cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    Png(String),
}
