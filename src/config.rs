//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::storage::Node;

/// Top-level scenario configuration parsed from TOML.
///
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default. Storage fields are
/// validated by the storage model itself at construction; [`Self::validate`]
/// covers the scenario-level constraints only.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Storage device parameters.
    pub storage: StorageConfig,
    /// Per-epoch setpoint source.
    #[serde(default)]
    pub control: ControlConfig,
}

/// Simulation timing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of epochs to simulate (must be > 0).
    pub epochs: usize,
    /// Epoch length in seconds (must be > 0).
    pub epoch_seconds: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epochs: 24,
            epoch_seconds: 900,
        }
    }
}

/// Storage device parameters.
///
/// Defaults: full charge/discharge rates, 90 % efficiencies, no
/// self-discharge. `kwh_rated`, `kw_rated` and `initial_state_of_charge`
/// have no defaults and must be present in the scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Optional customer identity tag, passthrough only.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Node for a single-phase resource (1, 2 or 3); absent means the
    /// device is three-phase.
    #[serde(default)]
    pub node: Option<Node>,
    /// Rated energy capacity (kWh).
    pub kwh_rated: f64,
    /// Rated power capacity (kW).
    pub kw_rated: f64,
    /// Initial stored energy as a percentage of rated capacity.
    pub initial_state_of_charge: f64,
    /// Maximum charging power in percent of `kw_rated`.
    #[serde(default = "default_rate")]
    pub charge_rate: f64,
    /// Maximum discharging power in percent of `kw_rated`.
    #[serde(default = "default_rate")]
    pub discharge_rate: f64,
    /// Charging efficiency in percent.
    #[serde(default = "default_efficiency")]
    pub charge_efficiency: f64,
    /// Discharging efficiency in percent.
    #[serde(default = "default_efficiency")]
    pub discharge_efficiency: f64,
    /// Percent of rated kWh drained per hour while idling.
    #[serde(default)]
    pub self_discharge: f64,
}

fn default_rate() -> f64 {
    100.0
}

fn default_efficiency() -> f64 {
    90.0
}

/// Per-epoch setpoint source selection.
///
/// Exactly one of `csv` and `setpoints` must be given: a CSV file with one
/// row per epoch, or an inline schedule that repeats over the run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Path to a setpoint CSV file (one row per epoch).
    pub csv: Option<PathBuf>,
    /// Inline repeating schedule of requested powers (kW).
    pub setpoints: Option<Vec<f64>>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.epochs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: the reference 100 kWh / 100 kW device
    /// with a mixed charge/discharge day on 15-minute epochs.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            storage: StorageConfig {
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
            },
            control: ControlConfig {
                csv: None,
                setpoints: Some(vec![
                    0.0, 20.0, 40.0, 60.0, 80.0, 100.0, 60.0, 40.0, 0.0, -20.0, -40.0, -60.0,
                    -80.0, -100.0, -60.0, -40.0, 0.0, 30.0, -30.0, 50.0, -50.0, 70.0, -70.0, 0.0,
                ]),
            },
        }
    }

    /// Returns the undersized preset: a small device driven hard, so rate
    /// clamps and capacity reconciliation fire within a single day.
    pub fn undersized() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            storage: StorageConfig {
                customer_id: Some("customer1".to_string()),
                node: Some(Node::N1),
                kwh_rated: 5.0,
                kw_rated: 20.0,
                initial_state_of_charge: 40.0,
                charge_rate: 50.0,
                discharge_rate: 50.0,
                charge_efficiency: 90.0,
                discharge_efficiency: 90.0,
                self_discharge: 1.0,
            },
            control: ControlConfig {
                csv: None,
                setpoints: Some(vec![15.0, -15.0, 20.0, -5.0, 18.0, 0.0]),
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "undersized"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "undersized" => Ok(Self::undersized()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, contains unknown
    /// fields, or is missing a required storage field.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates the scenario-level fields and returns a list of errors.
    ///
    /// Returns an empty vector if the scenario is valid. Storage fields are
    /// not checked here; the storage model validates them on construction.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.epochs == 0 {
            errors.push(ConfigError {
                field: "simulation.epochs".into(),
                message: "must be > 0".into(),
            });
        }
        if self.simulation.epoch_seconds == 0 {
            errors.push(ConfigError {
                field: "simulation.epoch_seconds".into(),
                message: "must be > 0".into(),
            });
        }

        match (&self.control.csv, &self.control.setpoints) {
            (Some(_), Some(_)) => errors.push(ConfigError {
                field: "control".into(),
                message: "csv and setpoints are mutually exclusive, give one".into(),
            }),
            (None, None) => errors.push(ConfigError {
                field: "control".into(),
                message: "either csv or setpoints is required".into(),
            }),
            (None, Some(setpoints)) if setpoints.is_empty() => errors.push(ConfigError {
                field: "control.setpoints".into(),
                message: "must not be empty".into(),
            }),
            _ => {}
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
epochs = 96
epoch_seconds = 3600

[storage]
customer_id = "GridA-13"
node = 2
kwh_rated = 110.0
kw_rated = 80.0
initial_state_of_charge = 35.0
charge_rate = 99.0
discharge_rate = 95.0
charge_efficiency = 91.0
discharge_efficiency = 85.0
self_discharge = 0.5

[control]
setpoints = [10.0, -10.0, 25.0]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.epochs), Some(96));
        assert_eq!(cfg.as_ref().map(|c| c.storage.kwh_rated), Some(110.0));
        assert_eq!(
            cfg.as_ref().and_then(|c| c.storage.node),
            Some(Node::N2)
        );
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[storage]
kwh_rated = 50.0
kw_rated = 25.0
initial_state_of_charge = 60.0

[control]
setpoints = [5.0]
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("partial TOML should parse");
        assert_eq!(cfg.simulation.epochs, 24);
        assert_eq!(cfg.simulation.epoch_seconds, 900);
        assert_eq!(cfg.storage.charge_rate, 100.0);
        assert_eq!(cfg.storage.discharge_rate, 100.0);
        assert_eq!(cfg.storage.charge_efficiency, 90.0);
        assert_eq!(cfg.storage.discharge_efficiency, 90.0);
        assert_eq!(cfg.storage.self_discharge, 0.0);
        assert_eq!(cfg.storage.customer_id, None);
        assert_eq!(cfg.storage.node, None);
    }

    #[test]
    fn missing_required_storage_field_fails_parse() {
        let toml = r#"
[storage]
kwh_rated = 50.0
kw_rated = 25.0

[control]
setpoints = [5.0]
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[storage]
kwh_rated = 50.0
kw_rated = 25.0
initial_state_of_charge = 60.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn invalid_node_fails_parse() {
        let toml = r#"
[storage]
node = 5
kwh_rated = 50.0
kw_rated = 25.0
initial_state_of_charge = 60.0
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_zero_epochs() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.epochs = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.epochs"));
    }

    #[test]
    fn validation_catches_zero_epoch_seconds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.epoch_seconds = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.epoch_seconds"));
    }

    #[test]
    fn validation_requires_exactly_one_control_source() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.control.csv = Some(PathBuf::from("setpoints.csv"));
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "control"));

        cfg.control.csv = None;
        cfg.control.setpoints = None;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "control"));
    }

    #[test]
    fn validation_rejects_empty_setpoints() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.control.setpoints = Some(Vec::new());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "control.setpoints"));
    }
}
