//! Error and advisory types shared across the pipeline stages
use crate::expr::ExprError;
#[cfg(feature = "serialization")]
use serde::Serialize;
use thiserror::Error;

/// Fatal error raised by any pipeline stage
///
/// Both categories abort the invocation with no partial result: a
/// `Config` error means the study design cannot be satisfied, a `Schema`
/// error means an input table does not have the shape it promised.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The study design and the data cannot be brought together
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No run id is shared by the identification, intensity, and
    /// fraction tables
    #[error("no common runs between identification, intensity, and fraction tables")]
    NoCommonRuns,

    /// Two sample design rows claim the same output column
    #[error("duplicate measurement name in sample design: {0}")]
    DuplicateMeasurement(String),

    /// The observed channel columns equal no registered converter's
    /// channel set
    #[error("no reporter converter matches the {observed} observed channel columns")]
    NoConverterMatch { observed: usize },

    /// The reference expression for one quant block could not be parsed
    /// or evaluated
    #[error("reference formula for plex {plex}, block {block}: {source}")]
    Reference {
        plex: String,
        block: u32,
        #[source]
        source: ExprError,
    },
}

/// An input table does not match its declared shape
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{table} table is missing required column {column}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    /// The identification table declares no level-key columns, so there
    /// is no reporting level to aggregate to
    #[error("identification table declares no level-key columns")]
    NoLevelKeys,

    /// An identification record does not carry one value per declared
    /// level key
    #[error("identification record carries {found} level-key values, expected {expected}")]
    LevelKeyMismatch { expected: usize, found: usize },

    /// The intensity table contains a column that is neither the scan
    /// identifier nor a recognized reporter channel
    #[error("unexpected column in intensity table: {0}")]
    UnexpectedColumn(String),

    /// More than one column in the intensity table starts with the scan
    /// identifier prefix
    #[error("multiple scan identifier columns in intensity table: {0:?}")]
    AmbiguousScanColumn(Vec<String>),

    /// An intensity row has an empty or non-integral scan cell
    #[error("intensity row for run {run} has no usable scan identifier")]
    MissingScan { run: String },
}

/// Non-fatal advisory surfaced beside a successful result
///
/// Partial mismatches between independently-authored inputs are recovered
/// by subsetting; each subsetting event is recorded here (and logged at
/// `warn` level) rather than failing the invocation.
#[cfg_attr(feature = "serialization", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Rows referencing these runs were dropped from the named table
    /// because the runs are not present in all three inputs
    RunsDropped {
        table: &'static str,
        runs: Vec<String>,
    },
    /// Aggregated data for these plexes was excluded because no sample
    /// and reference design rows cover them
    PlexesDropped { plexes: Vec<String> },
}
