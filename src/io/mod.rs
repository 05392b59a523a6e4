//! File output for simulation artifacts.

/// CSV telemetry export for epoch results.
pub mod export;
