//! Per-epoch setpoint sources: pre-recorded CSV series and inline schedules.

use std::error::Error;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::storage::Node;

/// Identity fields a control source carries alongside a setpoint.
///
/// A source that carries identity reassigns the storage's passthrough
/// fields every epoch, including clearing them when a row leaves them
/// empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Customer id for the epoch, if any.
    pub customer_id: Option<String>,
    /// Node for the epoch, if any.
    pub node: Option<Node>,
}

/// Control request for one epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlRequest {
    /// Requested real power (kW; positive = discharge, negative = charge).
    pub real_power_kw: f64,
    /// Identity fields to apply for the epoch; `None` when the source does
    /// not carry identity at all.
    pub identity: Option<Identity>,
}

/// Errors raised by setpoint sources.
#[derive(Debug)]
pub enum SourceError {
    /// The CSV file could not be opened or a record failed to parse.
    Csv {
        /// What went wrong, with row context where available.
        message: String,
    },
    /// The source has no entry for the requested epoch.
    MissingEpoch {
        /// The epoch that had no entry.
        epoch: usize,
    },
    /// An inline schedule was empty.
    EmptySchedule,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv { message } => write!(f, "setpoint csv: {message}"),
            Self::MissingEpoch { epoch } => {
                write!(f, "setpoint source has no entry for epoch {epoch}")
            }
            Self::EmptySchedule => write!(f, "setpoint schedule must not be empty"),
        }
    }
}

impl Error for SourceError {}

/// Source of per-epoch control requests.
///
/// Implementations are indexed by the runner's 1-based epoch number.
pub trait SetpointSource {
    /// Returns the control request for the given epoch.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the source cannot supply the epoch.
    fn request_for(&mut self, epoch: usize) -> Result<ControlRequest, SourceError>;
}

/// Raw CSV record. Only `real_power_kw` is required; `customer_id` and
/// `node` columns may be missing entirely or left empty per row.
#[derive(Debug, Deserialize)]
struct RawRecord {
    real_power_kw: f64,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    node: Option<Node>,
}

/// Pre-recorded setpoint series read from a CSV file, one row per epoch.
///
/// The whole file is read eagerly at construction; row k drives epoch k.
/// Every row carries identity fields (possibly empty), which the runner
/// reassigns on the storage each epoch.
#[derive(Debug, Clone)]
pub struct CsvSetpointSource {
    requests: Vec<ControlRequest>,
}

impl CsvSetpointSource {
    /// Loads a setpoint CSV from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if the file cannot be opened or any
    /// record fails to parse.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let reader = csv::Reader::from_path(path).map_err(|e| SourceError::Csv {
            message: format!("cannot open \"{}\": {e}", path.display()),
        })?;
        Self::load(reader)
    }

    /// Loads a setpoint CSV from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if any record fails to parse.
    pub fn from_reader(reader: impl Read) -> Result<Self, SourceError> {
        Self::load(csv::Reader::from_reader(reader))
    }

    fn load<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, SourceError> {
        let mut requests = Vec::new();
        for (index, record) in reader.deserialize::<RawRecord>().enumerate() {
            let record = record.map_err(|e| SourceError::Csv {
                message: format!("row {}: {e}", index + 1),
            })?;
            requests.push(ControlRequest {
                real_power_kw: record.real_power_kw,
                identity: Some(Identity {
                    customer_id: record.customer_id,
                    node: record.node,
                }),
            });
        }
        Ok(Self { requests })
    }

    /// Number of epochs the series covers.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl SetpointSource for CsvSetpointSource {
    fn request_for(&mut self, epoch: usize) -> Result<ControlRequest, SourceError> {
        epoch
            .checked_sub(1)
            .and_then(|index| self.requests.get(index))
            .cloned()
            .ok_or(SourceError::MissingEpoch { epoch })
    }
}

/// Inline schedule of requested powers that repeats over the run.
///
/// Entry `(epoch - 1) % len` serves each epoch, so a one-day schedule
/// drives a multi-day run. Carries no identity fields.
#[derive(Debug, Clone)]
pub struct CycleSchedule {
    setpoints: Vec<f64>,
}

impl CycleSchedule {
    /// Creates a repeating schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::EmptySchedule`] for an empty vector.
    pub fn new(setpoints: Vec<f64>) -> Result<Self, SourceError> {
        if setpoints.is_empty() {
            return Err(SourceError::EmptySchedule);
        }
        Ok(Self { setpoints })
    }
}

impl SetpointSource for CycleSchedule {
    fn request_for(&mut self, epoch: usize) -> Result<ControlRequest, SourceError> {
        let index = epoch
            .checked_sub(1)
            .ok_or(SourceError::MissingEpoch { epoch })?
            % self.setpoints.len();
        Ok(ControlRequest {
            real_power_kw: self.setpoints[index],
            identity: None,
        })
    }
}
