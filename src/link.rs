//! Linking identifications to reporter intensities on (run, scan)
//!
//! Upstream readers disagree about what to call the scan column
//! (`ScanNum`, `ScanNumber`, `Scan Number`, ...), so any column starting
//! with the `Scan` prefix is accepted and normalized. Every other
//! intensity column must be a recognizable reporter channel; anything
//! else means the caller handed over a table this pipeline was never
//! meant to consume, and that is a fatal schema error rather than
//! something to silently carry along.
use crate::design::StudyDesign;
use crate::error::{Notice, PipelineError, SchemaError};
use crate::reconcile::Reconciled;
use indexmap::IndexSet;
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Canonical name of the scan identifier column after normalization
pub const CANONICAL_SCAN_COLUMN: &str = "ScanNumber";

/// Reporter channel columns are named by reporter ion m/z, e.g.
/// `Ion_126.128`
fn channel_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Ion_1\d{2}\.\d{3}$").expect("static channel pattern"))
}

fn is_scan_column(name: &str) -> bool {
    name.get(..4).map_or(false, |p| p.eq_ignore_ascii_case("scan"))
}

/// Identification and intensity rows joined on (run, scan)
#[derive(Debug, Clone)]
pub struct Linked {
    /// Level-key column names, carried over from the identifications
    pub level_keys: Vec<String>,
    /// Reporter channel columns, in intensity-table order
    pub channels: Vec<String>,
    pub records: Vec<LinkedRecord>,
    pub design: StudyDesign,
    pub notices: Vec<Notice>,
}

/// One identified scan with its reporter intensities attached
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedRecord {
    pub run: String,
    pub scan: u32,
    /// Level-key values, aligned with [`Linked::level_keys`]
    pub keys: Vec<String>,
    /// Channel intensities, aligned with [`Linked::channels`]
    pub values: Vec<Option<f64>>,
}

impl Reconciled {
    /// Join identifications to intensities on (run, scan).
    ///
    /// Identifications are first deduplicated to distinct
    /// (run, scan, keys) combinations so that several scan-level rows
    /// naming the same species do not fan out the join; decoy hits are
    /// dropped here as well.
    pub fn link(self) -> Result<Linked, PipelineError> {
        let Reconciled {
            identifications,
            intensities,
            design,
            notices,
        } = self;

        if identifications.level_keys.is_empty() {
            return Err(SchemaError::NoLevelKeys.into());
        }
        let arity = identifications.level_keys.len();
        for record in &identifications.records {
            if record.keys.len() != arity {
                return Err(SchemaError::LevelKeyMismatch {
                    expected: arity,
                    found: record.keys.len(),
                }
                .into());
            }
        }

        // Partition the intensity columns into the scan identifier and
        // the reporter channels; anything else is a schema error
        let mut scan_columns = Vec::new();
        let mut channel_indices = Vec::new();
        for (i, column) in intensities.columns.iter().enumerate() {
            if is_scan_column(column) {
                scan_columns.push((i, column.clone()));
            } else if channel_pattern().is_match(column) {
                channel_indices.push(i);
            } else {
                return Err(SchemaError::UnexpectedColumn(column.clone()).into());
            }
        }
        let scan_index = match scan_columns.len() {
            0 => {
                return Err(SchemaError::MissingColumn {
                    table: "intensity",
                    column: CANONICAL_SCAN_COLUMN,
                }
                .into())
            }
            1 => scan_columns[0].0,
            _ => {
                return Err(SchemaError::AmbiguousScanColumn(
                    scan_columns.into_iter().map(|(_, name)| name).collect(),
                )
                .into())
            }
        };
        let channels: Vec<String> = channel_indices
            .iter()
            .map(|&i| intensities.columns[i].clone())
            .collect();

        // Index intensity rows by run, then by scan
        let mut by_scan: HashMap<&str, HashMap<u32, Vec<usize>>> = HashMap::new();
        for (i, record) in intensities.records.iter().enumerate() {
            let scan = record
                .cells
                .get(scan_index)
                .copied()
                .flatten()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= u32::MAX as f64)
                .map(|v| v as u32)
                .ok_or_else(|| SchemaError::MissingScan {
                    run: record.run.clone(),
                })?;
            by_scan
                .entry(record.run.as_str())
                .or_insert_with(HashMap::new)
                .entry(scan)
                .or_insert_with(Vec::new)
                .push(i);
        }

        let mut seen: IndexSet<(String, u32, Vec<String>)> = IndexSet::new();
        let mut records = Vec::new();
        for id in identifications.records {
            if id.decoy {
                continue;
            }
            if !seen.insert((id.run.clone(), id.scan, id.keys.clone())) {
                continue;
            }
            let matches = by_scan
                .get(id.run.as_str())
                .and_then(|scans| scans.get(&id.scan));
            if let Some(matches) = matches {
                for &i in matches {
                    let row = &intensities.records[i];
                    records.push(LinkedRecord {
                        run: id.run.clone(),
                        scan: id.scan,
                        keys: id.keys.clone(),
                        values: channel_indices
                            .iter()
                            .map(|&c| row.cells.get(c).copied().flatten())
                            .collect(),
                    });
                }
            }
        }
        debug!(
            "linked {} records across {} channels",
            records.len(),
            channels.len()
        );

        Ok(Linked {
            level_keys: identifications.level_keys,
            channels,
            records,
            design,
            notices,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::design::FractionRow;
    use crate::tables::{
        IdentificationRecord, IdentificationTable, IntensityRecord, IntensityTable,
    };

    const CHANNELS: [&str; 4] = [
        "Ion_114.111",
        "Ion_115.108",
        "Ion_116.112",
        "Ion_117.115",
    ];

    fn identification(run: &str, scan: u32, key: &str, decoy: bool) -> IdentificationRecord {
        IdentificationRecord {
            run: run.into(),
            scan,
            keys: vec![key.into()],
            decoy,
        }
    }

    fn intensity_table(scan_column: &str, records: Vec<IntensityRecord>) -> IntensityTable {
        let mut columns = vec![scan_column.to_string()];
        columns.extend(CHANNELS.iter().map(|c| c.to_string()));
        IntensityTable { columns, records }
    }

    fn intensity(run: &str, scan: u32, values: [f64; 4]) -> IntensityRecord {
        let mut cells = vec![Some(scan as f64)];
        cells.extend(values.iter().map(|v| Some(*v)));
        IntensityRecord {
            run: run.into(),
            cells,
        }
    }

    fn reconciled(ids: IdentificationTable, intensities: IntensityTable) -> Reconciled {
        Reconciled {
            identifications: ids,
            intensities,
            design: StudyDesign {
                fractions: vec![FractionRow {
                    run: "run_1".into(),
                    plex: "S1".into(),
                }],
                samples: Vec::new(),
                references: Vec::new(),
            },
            notices: Vec::new(),
        }
    }

    #[test]
    fn scan_column_variants_are_normalized() {
        for &name in ["ScanNumber", "ScanNum", "scan_id", "Scan Number"].iter() {
            let ids = IdentificationTable {
                level_keys: vec!["accession".into()],
                records: vec![identification("run_1", 7, "P12345", false)],
            };
            let intensities =
                intensity_table(name, vec![intensity("run_1", 7, [1.0, 2.0, 3.0, 4.0])]);
            let linked = reconciled(ids, intensities).link().unwrap();
            assert_eq!(linked.records.len(), 1);
            assert_eq!(linked.records[0].scan, 7);
            assert_eq!(linked.channels.len(), 4);
        }
    }

    #[test]
    fn foreign_column_is_a_schema_error() {
        let ids = IdentificationTable {
            level_keys: vec!["accession".into()],
            records: Vec::new(),
        };
        let mut intensities = intensity_table("ScanNumber", Vec::new());
        intensities.columns.push("RetentionTime".into());
        let err = reconciled(ids, intensities).link().unwrap_err();
        assert_eq!(
            err,
            PipelineError::Schema(SchemaError::UnexpectedColumn("RetentionTime".into()))
        );
    }

    #[test]
    fn two_scan_columns_are_ambiguous() {
        let ids = IdentificationTable {
            level_keys: vec!["accession".into()],
            records: Vec::new(),
        };
        let mut intensities = intensity_table("ScanNumber", Vec::new());
        intensities.columns.push("ScanTime".into());
        let err = reconciled(ids, intensities).link().unwrap_err();
        assert_eq!(
            err,
            PipelineError::Schema(SchemaError::AmbiguousScanColumn(vec![
                "ScanNumber".into(),
                "ScanTime".into(),
            ]))
        );
    }

    #[test]
    fn duplicate_identifications_do_not_fan_out() {
        let ids = IdentificationTable {
            level_keys: vec!["accession".into()],
            records: vec![
                identification("run_1", 7, "P12345", false),
                identification("run_1", 7, "P12345", false),
                identification("run_1", 7, "Q67890", false),
            ],
        };
        let intensities =
            intensity_table("ScanNumber", vec![intensity("run_1", 7, [1.0, 2.0, 3.0, 4.0])]);
        let linked = reconciled(ids, intensities).link().unwrap();
        // one per distinct (run, scan, keys), not one per input row
        assert_eq!(linked.records.len(), 2);
    }

    #[test]
    fn decoys_are_dropped() {
        let ids = IdentificationTable {
            level_keys: vec!["accession".into()],
            records: vec![
                identification("run_1", 7, "P12345", false),
                identification("run_1", 7, "XXX_P12345", true),
            ],
        };
        let intensities =
            intensity_table("ScanNumber", vec![intensity("run_1", 7, [1.0, 2.0, 3.0, 4.0])]);
        let linked = reconciled(ids, intensities).link().unwrap();
        assert_eq!(linked.records.len(), 1);
        assert_eq!(linked.records[0].keys, vec!["P12345".to_string()]);
    }

    #[test]
    fn missing_scan_cell_is_a_schema_error() {
        let ids = IdentificationTable {
            level_keys: vec!["accession".into()],
            records: Vec::new(),
        };
        let mut record = intensity("run_1", 7, [1.0, 2.0, 3.0, 4.0]);
        record.cells[0] = None;
        let intensities = intensity_table("ScanNumber", vec![record]);
        let err = reconciled(ids, intensities).link().unwrap_err();
        assert_eq!(
            err,
            PipelineError::Schema(SchemaError::MissingScan {
                run: "run_1".into()
            })
        );
    }
}
