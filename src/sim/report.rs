//! Post-hoc run summary computed from epoch results.

use std::fmt;

use super::types::EpochResult;

/// Aggregate summary derived from a complete simulation run.
///
/// Computed post-hoc from `Vec<EpochResult>` so the report always matches
/// the emitted rows.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of epochs in the run.
    pub epochs: usize,
    /// Energy delivered by the storage across discharge epochs (kWh).
    pub energy_discharged_kwh: f64,
    /// Energy absorbed by the storage across charge epochs (kWh, positive).
    pub energy_charged_kwh: f64,
    /// Total energy throughput (kWh, sum of |power| * dt).
    pub throughput_kwh: f64,
    /// Equivalent full cycles (throughput / 2*capacity).
    pub equivalent_full_cycles: f64,
    /// Number of epochs whose achieved power differed from the request.
    pub warning_count: usize,
    /// Lowest state of charge seen across the run (%).
    pub min_state_of_charge: f64,
    /// Highest state of charge seen across the run (%).
    pub max_state_of_charge: f64,
    /// State of charge after the final epoch (%).
    pub final_state_of_charge: f64,
}

impl RunReport {
    /// Computes all aggregates from the complete epoch record vector.
    ///
    /// # Arguments
    ///
    /// * `results` - Complete simulation results
    /// * `epoch_hours` - Epoch duration in hours
    /// * `kwh_rated` - Storage capacity for the cycle calculation
    pub fn from_results(results: &[EpochResult], epoch_hours: f64, kwh_rated: f64) -> Self {
        if results.is_empty() {
            return Self {
                epochs: 0,
                energy_discharged_kwh: 0.0,
                energy_charged_kwh: 0.0,
                throughput_kwh: 0.0,
                equivalent_full_cycles: 0.0,
                warning_count: 0,
                min_state_of_charge: 0.0,
                max_state_of_charge: 0.0,
                final_state_of_charge: 0.0,
            };
        }

        let mut discharged = 0.0_f64;
        let mut charged = 0.0_f64;
        let mut throughput = 0.0_f64;
        let mut warnings = 0_usize;
        let mut min_soc = f64::MAX;
        let mut max_soc = f64::MIN;

        for r in results {
            let energy = r.real_power_kw * epoch_hours;
            if energy >= 0.0 {
                discharged += energy;
            } else {
                charged += -energy;
            }
            throughput += energy.abs();

            if r.warning {
                warnings += 1;
            }

            min_soc = min_soc.min(r.state_of_charge);
            max_soc = max_soc.max(r.state_of_charge);
        }

        let cycles = if kwh_rated > 0.0 {
            throughput / (2.0 * kwh_rated)
        } else {
            0.0
        };

        Self {
            epochs: results.len(),
            energy_discharged_kwh: discharged,
            energy_charged_kwh: charged,
            throughput_kwh: throughput,
            equivalent_full_cycles: cycles,
            warning_count: warnings,
            min_state_of_charge: min_soc,
            max_state_of_charge: max_soc,
            final_state_of_charge: results[results.len() - 1].state_of_charge,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Report ---")?;
        writeln!(f, "Epochs run:           {}", self.epochs)?;
        writeln!(
            f,
            "Energy discharged:    {:.2} kWh",
            self.energy_discharged_kwh
        )?;
        writeln!(f, "Energy charged:       {:.2} kWh", self.energy_charged_kwh)?;
        writeln!(
            f,
            "Throughput:           {:.2} kWh ({:.2} equiv. cycles)",
            self.throughput_kwh, self.equivalent_full_cycles
        )?;
        writeln!(f, "Setpoint warnings:    {}", self.warning_count)?;
        write!(
            f,
            "State of charge:      min {:.1}%  max {:.1}%  final {:.1}%",
            self.min_state_of_charge, self.max_state_of_charge, self.final_state_of_charge
        )
    }
}
