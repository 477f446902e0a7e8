//! Ratio normalization against the resolved reference
use crate::error::Notice;
use crate::pivot::Wide;
use crate::reference::Resolved;
use log::debug;
use std::collections::HashMap;

/// One normalized observation, keyed by final measurement name
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub plex: String,
    pub block: u32,
    pub species: String,
    pub measurement: String,
    pub ratio: f64,
}

/// Long-form normalized ratios across all quant blocks
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: Vec<NormalizedRecord>,
    pub notices: Vec<Notice>,
}

impl Resolved {
    /// Divide each alias column by the block's reference and rename
    /// aliases to measurement names.
    ///
    /// Non-finite and exactly-zero ratios are data, not faults: they are
    /// discarded here and surface as missing cells. Aliases without a
    /// measurement name are excluded rather than erroring.
    pub fn normalize(self) -> Normalized {
        let mut records = Vec::new();
        for block in &self.blocks {
            let measurement_of: HashMap<&str, &str> = block
                .wide
                .columns
                .iter()
                .zip(block.measurements.iter())
                .filter_map(|(alias, measurement)| {
                    measurement
                        .as_deref()
                        .map(|m| (alias.as_str(), m))
                })
                .collect();

            let divided = Wide {
                columns: block.wide.columns.clone(),
                rows: block
                    .wide
                    .rows
                    .iter()
                    .zip(block.reference.iter())
                    .map(|((species, cells), reference)| {
                        let cells = cells
                            .iter()
                            .map(|cell| cell.map(|value| value / reference))
                            .collect();
                        (species.clone(), cells)
                    })
                    .collect(),
            };

            for obs in divided.melt() {
                if !obs.value.is_finite() || obs.value == 0.0 {
                    continue;
                }
                let measurement = match measurement_of.get(obs.column.as_str()) {
                    Some(measurement) => *measurement,
                    None => continue,
                };
                records.push(NormalizedRecord {
                    plex: block.plex.clone(),
                    block: block.block,
                    species: obs.index,
                    measurement: measurement.into(),
                    ratio: obs.value,
                });
            }
        }
        debug!("normalized to {} long-form records", records.len());

        Normalized {
            records,
            notices: self.notices,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pivot::{pivot, Observation};
    use crate::reference::ResolvedBlock;

    fn obs(species: &str, alias: &str, value: f64) -> Observation<String> {
        Observation {
            index: species.into(),
            column: alias.into(),
            value,
        }
    }

    fn block(
        observations: Vec<Observation<String>>,
        measurements: Vec<Option<&str>>,
        reference: Vec<f64>,
    ) -> ResolvedBlock {
        ResolvedBlock {
            plex: "S1".into(),
            block: 1,
            measurements: measurements
                .into_iter()
                .map(|m| m.map(String::from))
                .collect(),
            wide: pivot(observations),
            reference,
        }
    }

    #[test]
    fn ratios_are_per_species_row() {
        let normalized = Resolved {
            blocks: vec![block(
                vec![
                    obs("P12345", "R1", 100.0),
                    obs("P12345", "R2", 200.0),
                    obs("Q67890", "R1", 10.0),
                    obs("Q67890", "R2", 5.0),
                ],
                vec![Some("tumor"), Some("normal")],
                vec![100.0, 10.0],
            )],
            notices: Vec::new(),
        }
        .normalize();

        assert_eq!(
            normalized.records,
            vec![
                NormalizedRecord {
                    plex: "S1".into(),
                    block: 1,
                    species: "P12345".into(),
                    measurement: "tumor".into(),
                    ratio: 1.0,
                },
                NormalizedRecord {
                    plex: "S1".into(),
                    block: 1,
                    species: "P12345".into(),
                    measurement: "normal".into(),
                    ratio: 2.0,
                },
                NormalizedRecord {
                    plex: "S1".into(),
                    block: 1,
                    species: "Q67890".into(),
                    measurement: "tumor".into(),
                    ratio: 1.0,
                },
                NormalizedRecord {
                    plex: "S1".into(),
                    block: 1,
                    species: "Q67890".into(),
                    measurement: "normal".into(),
                    ratio: 0.5,
                },
            ]
        );
    }

    #[test]
    fn zero_reference_drops_the_row_silently() {
        let normalized = Resolved {
            blocks: vec![block(
                vec![obs("P12345", "R1", 100.0)],
                vec![Some("tumor")],
                vec![0.0],
            )],
            notices: Vec::new(),
        }
        .normalize();
        assert!(normalized.records.is_empty());
    }

    #[test]
    fn unmapped_aliases_are_excluded() {
        let normalized = Resolved {
            blocks: vec![block(
                vec![obs("P12345", "R1", 100.0), obs("P12345", "ref", 50.0)],
                vec![Some("tumor"), None],
                vec![50.0],
            )],
            notices: Vec::new(),
        }
        .normalize();

        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.records[0].measurement, "tumor");
        assert_eq!(normalized.records[0].ratio, 2.0);
    }

    #[test]
    fn zero_abundance_is_discarded_not_kept_as_zero() {
        let normalized = Resolved {
            blocks: vec![block(
                vec![obs("P12345", "R1", 0.0)],
                vec![Some("tumor")],
                vec![50.0],
            )],
            notices: Vec::new(),
        }
        .normalize();
        assert!(normalized.records.is_empty());
    }
}
