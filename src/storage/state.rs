//! Internal state of a storage resource and its transition calculation.

use crate::config::StorageConfig;

use super::types::{Node, StorageError, TransitionResult};

/// Internal state of a storage resource.
///
/// `StorageState` holds the validated device configuration and the present
/// stored energy, and advances them one epoch at a time through
/// [`StorageState::transition`]. Construction validates every field at once;
/// after that the only mutations are the transition itself and the explicit
/// identity reassignment in [`StorageState::update_identity`].
///
/// # Power Flow Convention
/// - Positive power: discharging (energy leaves the storage)
/// - Negative power: charging (energy enters the storage)
///
/// Every sign in the energy accounting below follows from this single
/// invariant.
#[derive(Debug, Clone)]
pub struct StorageState {
    /// Customer the resource is associated with, passthrough only.
    customer_id: Option<String>,
    /// Node for a single-phase resource; `None` means three-phase.
    node: Option<Node>,
    /// Rated storage capacity in kWh (> 0).
    kwh_rated: f64,
    /// kW rating of power output (> 0).
    kw_rated: f64,
    /// Charging rate limit in percent of `kw_rated`.
    charge_rate: f64,
    /// Discharging rate limit in percent of `kw_rated`.
    discharge_rate: f64,
    /// Charging efficiency in percent, (0, 100].
    charge_efficiency: f64,
    /// Discharging efficiency in percent, (0, 100].
    discharge_efficiency: f64,
    /// Percent of rated kWh drained per hour while idling.
    self_discharge: f64,
    /// Current amount of energy stored, kWh. Kept within `[0, kwh_rated]`
    /// by every committed transition.
    kwh_stored_current: f64,
}

impl StorageState {
    /// Creates a storage state from the given configuration.
    ///
    /// Validation is atomic: every field is checked before anything is
    /// constructed, so a failure leaves no partially-built state behind.
    /// `kwh_rated` is validated before the initial state of charge because
    /// the initial stored energy is derived from both
    /// (`kwh_rated * initial_state_of_charge / 100`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfiguration`] naming the first field
    /// that fails its predicate: percentages out of `[0, 100]`, non-finite
    /// values, zero or negative ratings, or a zero efficiency (a zero
    /// efficiency would divide the achieved-power recomputation by zero and
    /// does not describe a usable device).
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let kwh_rated = check_positive(config.kwh_rated, "kwh_rated")?;
        let kw_rated = check_positive(config.kw_rated, "kw_rated")?;
        let charge_rate = check_percentage(config.charge_rate, "charge_rate")?;
        let discharge_rate = check_percentage(config.discharge_rate, "discharge_rate")?;
        let charge_efficiency = check_efficiency(config.charge_efficiency, "charge_efficiency")?;
        let discharge_efficiency =
            check_efficiency(config.discharge_efficiency, "discharge_efficiency")?;
        let self_discharge = check_percentage(config.self_discharge, "self_discharge")?;
        let initial_state_of_charge =
            check_percentage(config.initial_state_of_charge, "initial_state_of_charge")?;

        Ok(Self {
            customer_id: config.customer_id.clone(),
            node: config.node,
            kwh_rated,
            kw_rated,
            charge_rate,
            discharge_rate,
            charge_efficiency,
            discharge_efficiency,
            self_discharge,
            kwh_stored_current: kwh_rated * (initial_state_of_charge / 100.0),
        })
    }

    /// Customer the resource is associated with.
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Node that the resource is connected to; `None` means three-phase.
    pub fn node(&self) -> Option<Node> {
        self.node
    }

    /// Rated storage capacity in kWh.
    pub fn kwh_rated(&self) -> f64 {
        self.kwh_rated
    }

    /// kW rating of power output.
    pub fn kw_rated(&self) -> f64 {
        self.kw_rated
    }

    /// Charging rate limit in percent of the kW rating.
    pub fn charge_rate(&self) -> f64 {
        self.charge_rate
    }

    /// Discharging rate limit in percent of the kW rating.
    pub fn discharge_rate(&self) -> f64 {
        self.discharge_rate
    }

    /// Charging efficiency in percent.
    pub fn charge_efficiency(&self) -> f64 {
        self.charge_efficiency
    }

    /// Discharging efficiency in percent.
    pub fn discharge_efficiency(&self) -> f64 {
        self.discharge_efficiency
    }

    /// Percent of rated kWh drained per hour while idling.
    pub fn self_discharge(&self) -> f64 {
        self.self_discharge
    }

    /// Current amount of energy stored, kWh.
    pub fn kwh_stored_current(&self) -> f64 {
        self.kwh_stored_current
    }

    /// Present stored energy as a percentage of rated capacity.
    pub fn state_of_charge(&self) -> f64 {
        self.kwh_stored_current / self.kwh_rated * 100.0
    }

    /// Maximum power for discharging the storage, kW (non-negative).
    pub fn max_discharge_power_kw(&self) -> f64 {
        self.discharge_rate / 100.0 * self.kw_rated
    }

    /// Maximum power for charging the storage, kW (non-positive, per the
    /// sign convention).
    pub fn max_charge_power_kw(&self) -> f64 {
        -(self.charge_rate / 100.0 * self.kw_rated)
    }

    /// Reassigns the passthrough identity fields.
    ///
    /// A control source may carry a customer id and node per epoch; they are
    /// reported back in result snapshots and have no effect on the physics.
    /// No other field can be reassigned after construction.
    pub fn update_identity(&mut self, customer_id: Option<String>, node: Option<Node>) {
        self.customer_id = customer_id;
        self.node = node;
    }

    /// Conversion factor from operating power to stored-energy rate.
    ///
    /// Discharging (power >= 0) uses `-1 / (discharge_efficiency / 100)`:
    /// negative so that delivered power draws the stored energy down, with a
    /// magnitude above one because conversion losses drain more than is
    /// delivered. Charging uses `-charge_efficiency / 100`: negative so that
    /// negative power becomes a positive energy gain, with a magnitude below
    /// one because losses store less than is drawn in.
    fn efficiency_factor(&self, real_power_kw: f64) -> f64 {
        if real_power_kw >= 0.0 {
            -1.0 / (self.discharge_efficiency / 100.0)
        } else {
            -(self.charge_efficiency / 100.0)
        }
    }

    /// Advances the storage over `duration_hours` of operation at the
    /// requested power.
    ///
    /// The request is first clamped to the rated charge/discharge power
    /// limits, then converted to a stored-energy delta through the
    /// applicable efficiency, together with the idle self-discharge loss.
    /// If the tentative stored energy lands outside `[0, kwh_rated]` the
    /// storage pins it to the violated bound and recomputes the power it
    /// could actually sustain from the energy that was available. The
    /// returned snapshot carries that achieved power; callers compare it to
    /// their request to detect that the device fell short.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidDuration`] for a negative or
    /// not-a-number duration, and [`StorageError::InvalidConfiguration`]
    /// (for the stored-energy field) if a non-finite power request poisons
    /// the energy accounting. The state is unchanged on any error.
    pub fn transition(
        &mut self,
        requested_power_kw: f64,
        duration_hours: f64,
    ) -> Result<TransitionResult, StorageError> {
        // Negated comparison so that a NaN duration also fails the
        // precondition.
        if !(duration_hours >= 0.0) {
            return Err(StorageError::InvalidDuration { duration_hours });
        }

        // Rate limits apply before any energy accounting; they are a
        // property of the power electronics, not of the stored energy.
        let mut real_power_kw = requested_power_kw;
        if real_power_kw > self.max_discharge_power_kw() {
            real_power_kw = self.max_discharge_power_kw();
        } else if real_power_kw < self.max_charge_power_kw() {
            real_power_kw = self.max_charge_power_kw();
        }

        let efficiency_factor = self.efficiency_factor(real_power_kw);
        // Energy drained from the storage regardless of the request.
        let idle_energy = self.self_discharge / 100.0 * self.kwh_rated * duration_hours;
        let mut kwh_stored_next = self.kwh_stored_current
            + efficiency_factor * real_power_kw * duration_hours
            - idle_energy;

        // Maximum energy the storage can actually supply or absorb, set only
        // when the tentative energy overshoots a capacity bound.
        let mut max_energy = None;
        if kwh_stored_next < 0.0 {
            // Storage cannot produce the requested energy. Negative so that
            // the power recomputation below yields a positive power.
            let mut available = -(self.kwh_stored_current - idle_energy);
            if available > 0.0 {
                // Idle loss alone exceeds what is stored; nothing is left
                // for the active request.
                available = 0.0;
            }
            max_energy = Some(available);
            kwh_stored_next = 0.0;
        } else if kwh_stored_next > self.kwh_rated {
            // Storage cannot absorb the requested energy.
            max_energy = Some(self.kwh_rated - self.kwh_stored_current + idle_energy);
            kwh_stored_next = self.kwh_rated;
        }

        if let Some(max_energy) = max_energy {
            // A zero request stays zero: idle loss never turns into a
            // reported operating power.
            if real_power_kw != 0.0 {
                real_power_kw = max_energy / duration_hours / efficiency_factor;
            }
        }

        // Same predicate the configuration goes through. Only a NaN request
        // can fail it, and the poisoned value must not reach the committed
        // state.
        self.kwh_stored_current = check_non_negative(kwh_stored_next, "kwh_stored_current")?;

        Ok(TransitionResult {
            customer_id: self.customer_id.clone(),
            node: self.node,
            real_power_kw,
            reactive_power_kvar: 0.0,
            state_of_charge: self.state_of_charge(),
        })
    }
}

/// Checks that `value` is finite and satisfies `valid`, or reports the field
/// and the expected range.
fn check_float(
    value: f64,
    field: &'static str,
    valid: impl Fn(f64) -> bool,
    should_be: &str,
) -> Result<f64, StorageError> {
    if !value.is_finite() {
        return Err(StorageError::InvalidConfiguration {
            field,
            message: format!("{value} is not a finite number"),
        });
    }
    if !valid(value) {
        return Err(StorageError::InvalidConfiguration {
            field,
            message: format!("{value} is out of range, should be {should_be}"),
        });
    }
    Ok(value)
}

/// Checks that `value` is a finite percentage between 0 and 100 inclusive.
fn check_percentage(value: f64, field: &'static str) -> Result<f64, StorageError> {
    check_float(
        value,
        field,
        |v| (0.0..=100.0).contains(&v),
        "between 0.0 and 100.0",
    )
}

/// Checks that `value` is a finite number greater than or equal to zero.
fn check_non_negative(value: f64, field: &'static str) -> Result<f64, StorageError> {
    check_float(value, field, |v| v >= 0.0, "non-negative")
}

/// Checks that `value` is a finite number strictly greater than zero.
fn check_positive(value: f64, field: &'static str) -> Result<f64, StorageError> {
    check_float(value, field, |v| v > 0.0, "greater than 0")
}

/// Checks that `value` is a percentage usable as an efficiency, i.e. in
/// `(0, 100]`. Zero is rejected because the achieved-power recomputation
/// divides by the efficiency factor.
fn check_efficiency(value: f64, field: &'static str) -> Result<f64, StorageError> {
    let value = check_percentage(value, field)?;
    if value == 0.0 {
        return Err(StorageError::InvalidConfiguration {
            field,
            message: "0 is out of range, should be greater than 0".to_string(),
        });
    }
    Ok(value)
}
