//! Storage resource model: validated state plus the transition calculation.

/// Storage state and the per-epoch transition operation.
pub mod state;
pub mod types;

// Re-export the main types for convenience
pub use state::StorageState;
pub use types::Node;
pub use types::StorageError;
pub use types::TransitionResult;
