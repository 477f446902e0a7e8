//! Run-id reconciliation across the three independently-authored inputs
//!
//! The identification table, the intensity table, and the fraction design
//! each reference a set of runs. Only runs present in all three can be
//! quantified: anything else is dropped with an advisory, and an empty
//! intersection aborts the invocation.
use crate::design::StudyDesign;
use crate::error::{ConfigError, Notice, PipelineError};
use crate::tables::{IdentificationTable, IntensityTable};
use log::{debug, warn};
use std::collections::HashSet;

/// Inputs cut down to the runs common to all three tables
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub identifications: IdentificationTable,
    pub intensities: IntensityTable,
    pub design: StudyDesign,
    pub notices: Vec<Notice>,
}

/// Reconcile the three inputs and begin the pipeline.
///
/// Validates the study design first, so a duplicate measurement name
/// fails before any subsetting or aggregation work happens.
pub fn reconcile(
    mut identifications: IdentificationTable,
    mut intensities: IntensityTable,
    mut design: StudyDesign,
) -> Result<Reconciled, PipelineError> {
    design.validate()?;

    let id_runs: HashSet<String> = identifications
        .runs()
        .into_iter()
        .map(String::from)
        .collect();
    let intensity_runs: HashSet<String> =
        intensities.runs().into_iter().map(String::from).collect();
    let fraction_runs: HashSet<String> =
        design.fractions.iter().map(|r| r.run.clone()).collect();

    let common: HashSet<String> = id_runs
        .iter()
        .filter(|run| intensity_runs.contains(*run) && fraction_runs.contains(*run))
        .cloned()
        .collect();
    if common.is_empty() {
        return Err(ConfigError::NoCommonRuns.into());
    }

    let mut notices = Vec::new();
    let tables = [
        ("identifications", &id_runs),
        ("intensities", &intensity_runs),
        ("fractions", &fraction_runs),
    ];
    for &(table, runs) in tables.iter() {
        let mut dropped: Vec<String> = runs
            .iter()
            .filter(|run| !common.contains(*run))
            .cloned()
            .collect();
        if !dropped.is_empty() {
            dropped.sort();
            warn!(
                "dropping {} of {} runs from the {} table: {:?}",
                dropped.len(),
                runs.len(),
                table,
                dropped
            );
            notices.push(Notice::RunsDropped {
                table,
                runs: dropped,
            });
        }
    }

    identifications.records.retain(|r| common.contains(&r.run));
    intensities.records.retain(|r| common.contains(&r.run));
    design.fractions.retain(|r| common.contains(&r.run));
    debug!("reconciled to {} common runs", common.len());

    Ok(Reconciled {
        identifications,
        intensities,
        design,
        notices,
    })
}
