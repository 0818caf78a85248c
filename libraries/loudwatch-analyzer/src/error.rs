//! Error types for the loudness message element

use loudwatch_core::CoreError;
use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors surfaced by [`LoudnessAnalyzer`](crate::LoudnessAnalyzer)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    /// Format, meter or buffer failure from the engine
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A buffer or EOS arrived before `configure`
    #[error("Analyzer has no negotiated audio format")]
    NotConfigured,

    /// Rejected settings value
    #[error("Invalid analyzer settings: {0}")]
    InvalidSettings(String),
}
