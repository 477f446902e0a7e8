//! Rollup of linked records to the reporting level
//!
//! Each linked record belongs to the plex its run was fractionated from;
//! within a plex, records sharing the same level-key values are one
//! species. Channel intensities are summed per (plex, species), with
//! missing cells contributing zero so that a gap in one scan does not
//! suppress the sum of the others.
use crate::design::StudyDesign;
use crate::error::Notice;
use crate::link::Linked;
use indexmap::IndexMap;
use log::debug;

/// Separator between level-key values in a composite species id
pub const SPECIES_SEPARATOR: &str = "@";

/// Channel sums per (plex, species)
#[derive(Debug, Clone)]
pub struct Aggregated {
    /// Reporter channel columns, in intensity-table order
    pub channels: Vec<String>,
    pub records: Vec<AggregatedRecord>,
    pub design: StudyDesign,
    pub notices: Vec<Notice>,
}

/// One species within one plex
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub plex: String,
    /// Level-key values joined with [`SPECIES_SEPARATOR`], in declared
    /// order
    pub species: String,
    /// Summed intensities, aligned with [`Aggregated::channels`]
    pub values: Vec<f64>,
}

impl Linked {
    /// Group by (plex, level keys) and sum each channel
    pub fn aggregate(self) -> Aggregated {
        let mut records = Vec::new();
        {
            let plex_of = self.design.plex_of();
            let mut groups: IndexMap<(String, String), Vec<f64>> = IndexMap::new();
            for record in &self.records {
                // reconciliation guarantees the run has a fraction row
                let plex = match plex_of.get(record.run.as_str()) {
                    Some(plex) => *plex,
                    None => continue,
                };
                let species = record.keys.join(SPECIES_SEPARATOR);
                let sums = groups
                    .entry((plex.to_string(), species))
                    .or_insert_with(|| vec![0.0; self.channels.len()]);
                for (i, value) in record.values.iter().enumerate() {
                    if let Some(v) = value {
                        sums[i] += v;
                    }
                }
            }
            for ((plex, species), values) in groups {
                records.push(AggregatedRecord {
                    plex,
                    species,
                    values,
                });
            }
        }
        debug!("aggregated to {} (plex, species) groups", records.len());

        Aggregated {
            channels: self.channels,
            records,
            design: self.design,
            notices: self.notices,
        }
    }
}
