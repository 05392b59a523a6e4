//! Epoch runner driving the storage model from a setpoint source.

use std::error::Error;
use std::fmt;

use tracing::debug;

use crate::storage::{StorageError, StorageState};

use super::source::{SetpointSource, SourceError};
use super::types::{EpochResult, SimConfig};

/// Errors that abort a simulation run.
#[derive(Debug)]
pub enum SimError {
    /// The storage model rejected an epoch's transition.
    Storage(StorageError),
    /// The setpoint source could not supply an epoch.
    Source(SourceError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Source(e) => write!(f, "source: {e}"),
        }
    }
}

impl Error for SimError {}

impl From<StorageError> for SimError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<SourceError> for SimError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

/// Epoch runner owning the storage model and the setpoint source.
///
/// Generic over `S: SetpointSource` for static dispatch. One epoch at a
/// time it fetches the control request, applies any identity fields the
/// request carries, advances the storage over the configured epoch length,
/// and records the outcome.
pub struct Engine<S: SetpointSource> {
    config: SimConfig,
    storage: StorageState,
    source: S,
}

impl<S: SetpointSource> Engine<S> {
    /// Creates a new runner.
    pub fn new(config: SimConfig, storage: StorageState, source: S) -> Self {
        Self {
            config,
            storage,
            source,
        }
    }

    /// Executes one epoch and returns its result row.
    ///
    /// The result is flagged with a warning whenever the achieved power
    /// differs from the requested power (exact comparison): downstream
    /// consumers read the flag as "the device could not meet the setpoint".
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if the source has no entry for the epoch or
    /// the storage rejects the transition.
    pub fn step(&mut self, epoch: usize) -> Result<EpochResult, SimError> {
        let request = self.source.request_for(epoch)?;
        if let Some(identity) = request.identity {
            self.storage
                .update_identity(identity.customer_id, identity.node);
        }

        let requested_kw = request.real_power_kw;
        debug!(epoch, requested_kw, "requesting power from storage");

        let outcome = self
            .storage
            .transition(requested_kw, self.config.epoch_hours)?;

        let warning = outcome.real_power_kw != requested_kw;
        if warning {
            debug!(
                epoch,
                requested_kw,
                achieved_kw = outcome.real_power_kw,
                "storage could not operate at the requested power"
            );
        }

        Ok(EpochResult {
            epoch,
            time_hr: epoch as f64 * self.config.epoch_hours,
            requested_kw,
            real_power_kw: outcome.real_power_kw,
            reactive_power_kvar: outcome.reactive_power_kvar,
            state_of_charge: outcome.state_of_charge,
            kwh_stored: self.storage.kwh_stored_current(),
            customer_id: outcome.customer_id,
            node: outcome.node,
            warning,
        })
    }

    /// Executes epochs `1..=epochs` and returns the complete record vector.
    ///
    /// Fails fast: the first epoch error aborts the run and is returned.
    pub fn run(&mut self) -> Result<Vec<EpochResult>, SimError> {
        let mut results = Vec::with_capacity(self.config.epochs);
        for epoch in 1..=self.config.epochs {
            results.push(self.step(epoch)?);
        }
        Ok(results)
    }

    /// Returns a reference to the storage model.
    pub fn storage(&self) -> &StorageState {
        &self.storage
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::sim::source::{CsvSetpointSource, CycleSchedule};
    use crate::storage::Node;

    fn reference_storage() -> StorageState {
        StorageState::new(&StorageConfig {
            customer_id: Some("customer1".to_string()),
            node: None,
            kwh_rated: 100.0,
            kw_rated: 100.0,
            initial_state_of_charge: 50.0,
            charge_rate: 100.0,
            discharge_rate: 100.0,
            charge_efficiency: 90.0,
            discharge_efficiency: 90.0,
            self_discharge: 0.2,
        })
        .expect("reference config should be valid")
    }

    #[test]
    fn run_produces_one_result_per_epoch() {
        let schedule = CycleSchedule::new(vec![40.0, -40.0]).expect("schedule should build");
        let mut engine = Engine::new(SimConfig::new(24, 900), reference_storage(), schedule);
        let results = engine.run().expect("run should succeed");
        assert_eq!(results.len(), 24);
        assert_eq!(results[0].epoch, 1);
        assert_eq!(results[23].epoch, 24);
        assert!((results[3].time_hr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn within_limits_epochs_carry_no_warning() {
        let schedule = CycleSchedule::new(vec![40.0]).expect("schedule should build");
        let mut engine = Engine::new(SimConfig::new(4, 900), reference_storage(), schedule);
        let results = engine.run().expect("run should succeed");
        for r in &results {
            assert_eq!(r.real_power_kw, 40.0);
            assert!(!r.warning, "epoch {} should meet the setpoint", r.epoch);
        }
    }

    #[test]
    fn rate_clamped_epoch_is_flagged() {
        let schedule = CycleSchedule::new(vec![500.0]).expect("schedule should build");
        let mut engine = Engine::new(SimConfig::new(1, 900), reference_storage(), schedule);
        let results = engine.run().expect("run should succeed");
        assert_eq!(results[0].real_power_kw, 100.0);
        assert!(results[0].warning);
    }

    #[test]
    fn depletion_flags_and_empties_the_storage() {
        // Full-rate discharge at 15-minute epochs: ~27.8 kWh drawn per
        // epoch, so the second epoch already cannot be met.
        let schedule = CycleSchedule::new(vec![100.0]).expect("schedule should build");
        let mut engine = Engine::new(SimConfig::new(3, 900), reference_storage(), schedule);
        let results = engine.run().expect("run should succeed");

        assert!(!results[0].warning);
        assert!(results[1].warning);
        assert!(results[1].real_power_kw < 100.0);
        assert_eq!(results[1].state_of_charge, 0.0);
        // Empty storage keeps reporting a shortfall while asked to produce.
        assert!(results[2].warning);
    }

    #[test]
    fn csv_source_identity_flows_into_results() {
        let csv = "\
real_power_kw,customer_id,node
40.0,customer2,2
40.0,,
";
        let source = CsvSetpointSource::from_reader(csv.as_bytes()).expect("csv should parse");
        let mut engine = Engine::new(SimConfig::new(2, 900), reference_storage(), source);
        let results = engine.run().expect("run should succeed");

        assert_eq!(results[0].customer_id.as_deref(), Some("customer2"));
        assert_eq!(results[0].node, Some(Node::N2));
        // The second row clears both fields.
        assert_eq!(results[1].customer_id, None);
        assert_eq!(results[1].node, None);
    }

    #[test]
    fn schedule_source_leaves_identity_alone() {
        let schedule = CycleSchedule::new(vec![10.0]).expect("schedule should build");
        let mut engine = Engine::new(SimConfig::new(1, 900), reference_storage(), schedule);
        let results = engine.run().expect("run should succeed");
        assert_eq!(results[0].customer_id.as_deref(), Some("customer1"));
    }

    #[test]
    fn short_csv_aborts_the_run() {
        let csv = "real_power_kw\n40.0\n";
        let source = CsvSetpointSource::from_reader(csv.as_bytes()).expect("csv should parse");
        let mut engine = Engine::new(SimConfig::new(5, 900), reference_storage(), source);
        let err = engine.run();
        assert!(matches!(
            err,
            Err(SimError::Source(SourceError::MissingEpoch { epoch: 2 }))
        ));
    }
}
