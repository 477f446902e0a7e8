//! Study design tables describing how runs, plexes, channels, and
//! samples relate
//!
//! The three tables are authored independently (often by different
//! people), so the pipeline reconciles them against the data instead of
//! trusting them to agree.
use crate::error::ConfigError;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maps one raw run to the plex it was fractionated from
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FractionRow {
    pub run: String,
    pub plex: String,
}

/// Maps one reporter channel of one plex to a sample
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub plex: String,
    /// Quant block within the plex; missing entries default to block 1
    pub block: Option<u32>,
    /// Reporter channel name, e.g. `"126"` or `"131C"`, matching the
    /// converter output for the kit in use
    pub channel: String,
    /// Short name the reference formulas are written against; must be
    /// identifier-shaped to be referenced in a formula
    pub alias: String,
    /// Final sample column in the crosstab; channels carrying `None`
    /// (e.g. the reference channel itself) are excluded from the output
    pub measurement: Option<String>,
}

/// Reference definition for one (plex, quant block)
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub plex: String,
    /// Quant block within the plex; missing entries default to block 1
    pub block: Option<u32>,
    /// Arithmetic formula over the block's reporter aliases, e.g.
    /// `"ref"` or `"mean(R1, R2)"`
    pub expression: String,
}

/// The complete study design for one experiment
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StudyDesign {
    pub fractions: Vec<FractionRow>,
    pub samples: Vec<SampleRow>,
    pub references: Vec<ReferenceRow>,
}

impl StudyDesign {
    /// Check that no two mapped channels claim the same measurement name.
    ///
    /// Runs before any aggregation work begins; unmapped channels
    /// (`measurement == None`) are ignored.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for row in &self.samples {
            if let Some(name) = &row.measurement {
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::DuplicateMeasurement(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Map each run to its plex; the first fraction row wins when a run
    /// is listed twice
    pub(crate) fn plex_of(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::new();
        for row in &self.fractions {
            map.entry(row.run.as_str()).or_insert(row.plex.as_str());
        }
        map
    }
}
