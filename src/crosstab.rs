//! Final species-by-sample matrix
use crate::error::Notice;
use crate::normalize::Normalized;
use crate::pivot::{pivot, Observation};
use log::debug;
#[cfg(feature = "serialization")]
use serde::Serialize;
use std::collections::HashMap;

/// Species-by-sample matrix of log2 relative abundances
///
/// Rows are sorted by species id; columns keep the order in which the
/// measurements were first produced. A cell is present only when the
/// underlying ratio was finite and non-zero.
#[cfg_attr(feature = "serialization", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Crosstab {
    pub species: Vec<String>,
    pub measurements: Vec<String>,
    /// Rows align with `species`, columns with `measurements`
    pub values: Vec<Vec<Option<f64>>>,
}

/// Successful pipeline result: the crosstab plus any advisories
/// accumulated along the way
#[cfg_attr(feature = "serialization", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CrosstabResult {
    pub crosstab: Crosstab,
    pub notices: Vec<Notice>,
}

impl Normalized {
    /// Pivot the long-form ratios into the final matrix and apply the
    /// log2 transform.
    ///
    /// Duplicate (species, measurement) cells keep the first value;
    /// species left without a single present value are dropped.
    pub fn assemble(self) -> CrosstabResult {
        let wide = pivot(self.records.into_iter().map(|record| Observation {
            index: record.species,
            column: record.measurement,
            value: record.ratio,
        }));

        let mut rows: Vec<(String, Vec<Option<f64>>)> = wide
            .rows
            .into_iter()
            .filter_map(|(species, cells)| {
                let cells: Vec<Option<f64>> = cells
                    .into_iter()
                    .map(|cell| match cell {
                        Some(ratio) if ratio.is_finite() && ratio != 0.0 => {
                            let log = ratio.log2();
                            if log.is_finite() {
                                Some(log)
                            } else {
                                None
                            }
                        }
                        _ => None,
                    })
                    .collect();
                if cells.iter().all(Option::is_none) {
                    None
                } else {
                    Some((species, cells))
                }
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let (species, values) = rows.into_iter().unzip();
        let crosstab = Crosstab {
            species,
            measurements: wide.columns,
            values,
        };
        debug!(
            "assembled a {} x {} crosstab",
            crosstab.species.len(),
            crosstab.measurements.len()
        );

        CrosstabResult {
            crosstab,
            notices: self.notices,
        }
    }
}

impl Crosstab {
    /// Number of species rows
    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Look up a single cell by species id and measurement name
    pub fn get(&self, species: &str, measurement: &str) -> Option<f64> {
        let row = self.species.iter().position(|s| s == species)?;
        let col = self.measurements.iter().position(|m| m == measurement)?;
        self.values[row][col]
    }

    /// Create a `HashMap` correlating each species id to its row of
    /// log2 ratios
    pub fn map(&self) -> HashMap<&'_ str, &'_ [Option<f64>]> {
        self.species
            .iter()
            .zip(self.values.iter())
            .map(|(species, row)| (species.as_str(), row.as_slice()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::normalize::NormalizedRecord;

    fn record(species: &str, measurement: &str, ratio: f64) -> NormalizedRecord {
        NormalizedRecord {
            plex: "S1".into(),
            block: 1,
            species: species.into(),
            measurement: measurement.into(),
            ratio,
        }
    }

    fn assemble(records: Vec<NormalizedRecord>) -> Crosstab {
        Normalized {
            records,
            notices: Vec::new(),
        }
        .assemble()
        .crosstab
    }

    #[test]
    fn log2_with_sorted_rows() {
        let crosstab = assemble(vec![
            record("Q67890", "tumor", 4.0),
            record("P12345", "tumor", 2.0),
            record("P12345", "normal", 0.5),
        ]);

        assert_eq!(crosstab.species, vec!["P12345", "Q67890"]);
        assert_eq!(crosstab.measurements, vec!["tumor", "normal"]);
        assert_eq!(crosstab.get("P12345", "tumor"), Some(1.0));
        assert_eq!(crosstab.get("P12345", "normal"), Some(-1.0));
        assert_eq!(crosstab.get("Q67890", "tumor"), Some(2.0));
        assert_eq!(crosstab.get("Q67890", "normal"), None);
    }

    #[test]
    fn non_finite_and_zero_ratios_are_missing() {
        let crosstab = assemble(vec![
            record("P12345", "tumor", f64::INFINITY),
            record("P12345", "normal", 2.0),
            record("Q67890", "tumor", 0.0),
            record("Q67890", "normal", f64::NAN),
        ]);

        // Q67890 had no surviving cell at all, so the row is gone
        assert_eq!(crosstab.species, vec!["P12345"]);
        assert_eq!(crosstab.get("P12345", "tumor"), None);
        assert_eq!(crosstab.get("P12345", "normal"), Some(1.0));
    }

    #[test]
    fn duplicate_cells_keep_the_first_value() {
        let crosstab = assemble(vec![
            record("P12345", "tumor", 2.0),
            record("P12345", "tumor", 8.0),
        ]);
        assert_eq!(crosstab.get("P12345", "tumor"), Some(1.0));
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn serializes_to_json() {
        let crosstab = assemble(vec![record("P12345", "tumor", 2.0)]);
        let json = serde_json::to_string(&crosstab).unwrap();
        assert!(json.contains("\"P12345\""));
        assert!(json.contains("\"tumor\""));
    }
}
