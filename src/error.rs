//! Error types shared by the comparator library
//!
//! Each layer owns its error enum; [`Error`] unifies them so builders and
//! propagators can use `?` across layer boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Problems detected while validating the input configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Orbit must be defined!")]
    MissingOrbit,

    #[error("Integrator shall be defined for: {0}")]
    MissingIntegrator(String),

    #[error("Unknown frame: {0}")]
    UnknownFrame(String),

    #[error("No Earth frame: {0}")]
    NoEarthFrame(String),

    #[error("non pseudo-inertial frame {0}")]
    NonPseudoInertialFrame(String),

    #[error("Unknown celestial body: {0}")]
    UnknownBody(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Unable to parse date '{date}': {reason}")]
    Date { date: String, reason: String },

    #[error("Failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed YAML configuration")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Problems with auxiliary physical data (gravity fields, ephemerides, TLE)
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No gravity field data found in {0}")]
    NoGravityField(PathBuf),

    #[error("Too large degree (n = {requested}, potential maximal degree is {available})")]
    TooLargeDegree { requested: usize, available: usize },

    #[error("Too large order (m = {requested}, potential maximal order is {available})")]
    TooLargeOrder { requested: usize, available: usize },

    #[error("Unable to parse line {line} of file {path}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Ephemeris unavailable for {body}: {reason}")]
    Ephemeris { body: String, reason: String },

    #[error("Invalid TLE: {0}")]
    Tle(String),

    #[error("Toolkit data directory {dir}: {reason}")]
    ToolkitDirectory { dir: PathBuf, reason: String },

    #[error("Missing toolkit data in {dir}: {files:?}")]
    MissingToolkitData { dir: PathBuf, files: Vec<&'static str> },
}

/// Numerical failures during propagation
#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("Minimal step size ({min_step:e} s) reached, integration needs {needed:e} s at t = {t} s")]
    StepSizeUnderflow { t: f64, min_step: f64, needed: f64 },

    #[error("Non-finite state at t = {t} s")]
    NonFinite { t: f64 },

    #[error("Impossible orbit: {0}")]
    ImpossibleOrbit(String),

    #[error("Unable to compute mean parameters after {0} iterations")]
    MeanElementsNotConverged(usize),

    #[error("Backward propagation is not supported (duration {0} s)")]
    BackwardPropagation(f64),

    #[error("Maximum number of steps ({0}) exceeded")]
    TooManySteps(usize),
}

/// Library-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

pub type Result<T> = std::result::Result<T, Error>;
