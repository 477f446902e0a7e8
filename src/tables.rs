//! In-memory input tables handed over by upstream readers
//!
//! Parsing search-engine or instrument output into these shapes is the
//! caller's job, as is confidence filtering of the identifications. The
//! pipeline consumes the tables as immutable snapshots and never hands
//! them back.
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scan-level identification results, already filtered upstream to the
/// desired confidence
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationTable {
    /// Names of the level-key columns in declared order; this list
    /// defines the reporting level (e.g. `["accession"]` for protein
    /// rollup, `["accession", "site"]` for site rollup)
    pub level_keys: Vec<String>,
    pub records: Vec<IdentificationRecord>,
}

/// One identified spectrum
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IdentificationRecord {
    pub run: String,
    pub scan: u32,
    /// One value per entry in [`IdentificationTable::level_keys`]
    pub keys: Vec<String>,
    /// Decoy hits never reach quantification
    pub decoy: bool,
}

impl IdentificationTable {
    /// Return a set of all run ids referenced by the table
    pub fn runs(&self) -> HashSet<&'_ str> {
        self.records.iter().map(|r| r.run.as_str()).collect()
    }
}

/// Reporter ion intensities keyed by run and scan
///
/// Column names are preserved exactly as authored so that scan-column
/// normalization and schema validation happen in the linker rather than
/// in the reader: besides the run id the table must carry one scan
/// identifier column (any name starting with `Scan`) and otherwise only
/// `Ion_` reporter channel columns.
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    /// All columns other than the run id, in source order
    pub columns: Vec<String>,
    pub records: Vec<IntensityRecord>,
}

/// One row of reporter intensities; cells align with
/// [`IntensityTable::columns`]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityRecord {
    pub run: String,
    pub cells: Vec<Option<f64>>,
}

impl IntensityTable {
    /// Return a set of all run ids referenced by the table
    pub fn runs(&self) -> HashSet<&'_ str> {
        self.records.iter().map(|r| r.run.as_str()).collect()
    }
}
