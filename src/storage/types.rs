//! Common types for the storage model.

use std::error::Error;
use std::fmt;

use serde::Deserialize;

/// Node that a single-phase resource is connected to.
///
/// A resource with no node (`None` at the use sites) is assumed to be a
/// three-phase resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum Node {
    /// Phase 1.
    N1 = 1,
    /// Phase 2.
    N2 = 2,
    /// Phase 3.
    N3 = 3,
}

impl TryFrom<i64> for Node {
    type Error = StorageError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::N1),
            2 => Ok(Self::N2),
            3 => Ok(Self::N3),
            _ => Err(StorageError::InvalidConfiguration {
                field: "node",
                message: format!("{value} is not an allowed node, expected 1, 2 or 3"),
            }),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Snapshot of the storage produced by one transition.
///
/// # Power Flow Convention
/// - Positive `real_power_kw`: discharging (energy left the storage)
/// - Negative `real_power_kw`: charging (energy entered the storage)
///
/// Reactive power is not modeled and is always reported as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    /// Customer identity tag carried through from the storage state.
    pub customer_id: Option<String>,
    /// Node carried through from the storage state.
    pub node: Option<Node>,
    /// Power the storage actually operated at (kW, signed).
    pub real_power_kw: f64,
    /// Reactive power (kvar), fixed at zero.
    pub reactive_power_kvar: f64,
    /// Stored energy after the transition, as a percentage of rated capacity.
    pub state_of_charge: f64,
}

/// Errors produced by the storage model.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// A configuration field failed its validation predicate.
    InvalidConfiguration {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable constraint description.
        message: String,
    },
    /// A transition was requested over a negative (or not-a-number) duration.
    InvalidDuration {
        /// The rejected duration value.
        duration_hours: f64,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { field, message } => {
                write!(f, "invalid value for {field}: {message}")
            }
            Self::InvalidDuration { duration_hours } => {
                write!(
                    f,
                    "{duration_hours} is an invalid duration, it should be a non-negative number of hours"
                )
            }
        }
    }
}

impl Error for StorageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_accepts_one_two_three() {
        assert_eq!(Node::try_from(1), Ok(Node::N1));
        assert_eq!(Node::try_from(2), Ok(Node::N2));
        assert_eq!(Node::try_from(3), Ok(Node::N3));
    }

    #[test]
    fn node_rejects_other_values() {
        for value in [0_i64, 4, -1, 100] {
            let err = Node::try_from(value);
            assert!(err.is_err(), "node {value} should be rejected");
            match err.unwrap_err() {
                StorageError::InvalidConfiguration { field, .. } => assert_eq!(field, "node"),
                other => panic!("unexpected error kind: {other:?}"),
            }
        }
    }

    #[test]
    fn node_displays_as_number() {
        assert_eq!(Node::N2.to_string(), "2");
    }

    #[test]
    fn error_display_names_the_field() {
        let err = StorageError::InvalidConfiguration {
            field: "charge_rate",
            message: "should be between 0.0 and 100.0".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("charge_rate"), "got: {text}");
    }
}
