//! Core simulation types: configuration and per-epoch records.

use std::fmt;

use crate::storage::Node;

/// Centralized simulation timing configuration.
///
/// The runner and the reporting layer both reference this struct for the
/// epoch duration, so the seconds-to-hours conversion lives in one place.
///
/// # Examples
///
/// ```
/// use storage_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(24, 900);
/// assert_eq!(cfg.epoch_hours, 0.25);
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of epochs to simulate.
    pub epochs: usize,
    /// Epoch length in seconds.
    pub epoch_seconds: u64,
    /// Epoch duration in hours, derived as `epoch_seconds / 3600`.
    pub epoch_hours: f64,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Arguments
    ///
    /// * `epochs` - Number of epochs to simulate (must be > 0)
    /// * `epoch_seconds` - Epoch length in seconds (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `epochs` or `epoch_seconds` is zero.
    pub fn new(epochs: usize, epoch_seconds: u64) -> Self {
        assert!(epochs > 0, "epochs must be > 0");
        assert!(epoch_seconds > 0, "epoch_seconds must be > 0");
        Self {
            epochs,
            epoch_seconds,
            epoch_hours: epoch_seconds as f64 / 3600.0,
        }
    }
}

/// Complete record of one simulated epoch.
#[derive(Debug, Clone)]
pub struct EpochResult {
    /// Epoch number, starting at 1.
    pub epoch: usize,
    /// End-of-epoch simulation time in hours.
    pub time_hr: f64,
    /// Power requested from the storage (kW; positive = discharge).
    pub requested_kw: f64,
    /// Power the storage actually operated at (kW).
    pub real_power_kw: f64,
    /// Reactive power (kvar), not modeled, always zero.
    pub reactive_power_kvar: f64,
    /// State of charge after the epoch (%).
    pub state_of_charge: f64,
    /// Stored energy after the epoch (kWh).
    pub kwh_stored: f64,
    /// Customer identity carried by the storage during the epoch.
    pub customer_id: Option<String>,
    /// Node carried by the storage during the epoch.
    pub node: Option<Node>,
    /// True when the achieved power differs from the requested power.
    pub warning: bool,
}

impl fmt::Display for EpochResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch={:>4} ({:>7.2}h) | requested={:>8.2} kW  achieved={:>8.2} kW | \
             SoC={:>6.2}%  stored={:>8.3} kWh{}",
            self.epoch,
            self.time_hr,
            self.requested_kw,
            self.real_power_kw,
            self.state_of_charge,
            self.kwh_stored,
            if self.warning { "  [warning]" } else { "" },
        )
    }
}
