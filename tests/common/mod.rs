//! Shared test fixtures for integration tests.

use storage_sim::config::StorageConfig;
use storage_sim::sim::types::SimConfig;
use storage_sim::storage::StorageState;

/// Default simulation configuration (24 epochs of 15 minutes).
pub fn default_sim_config() -> SimConfig {
    SimConfig::new(24, 900)
}

/// Reference storage configuration: 100 kWh / 100 kW, full rates, 90 %
/// efficiencies, 0.2 %/h self-discharge, 50 % initial SOC.
pub fn reference_storage_config() -> StorageConfig {
    StorageConfig {
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
    }
}

/// Reference storage built from [`reference_storage_config`].
pub fn reference_storage() -> StorageState {
    StorageState::new(&reference_storage_config()).expect("reference config should be valid")
}

/// The reference device starting at the given initial state of charge.
pub fn storage_with_initial_soc(initial_state_of_charge: f64) -> StorageState {
    StorageState::new(&StorageConfig {
        initial_state_of_charge,
        ..reference_storage_config()
    })
    .expect("reference config should be valid")
}
