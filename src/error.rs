//! Error types for the simulation engine.

/// Errors surfaced by [`Simulation`](crate::Simulation) and [`Grid`](crate::Grid).
///
/// Every variant is a caller-input error reported immediately; the transition
/// rule itself is total and has no failure path, so nothing here is retried
/// or silently corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Construction was attempted with a zero width or height.
    /// No partial grid or engine is produced.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimension { width: usize, height: usize },

    /// Cell access outside the grid extent. The grid is left unchanged.
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// A blocking advance was requested while another advance is in flight.
    #[error("a generation advance is already in flight")]
    AlreadyRunning,
}
