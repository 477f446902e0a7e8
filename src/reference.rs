//! Reference resolution per (plex, quant block)
//!
//! Aggregated channel sums are melted to long form, converted from
//! channel columns to reporter aliases through the matching converter
//! and the sample design, and regrouped into quant blocks. Each block
//! named by the reference design is pivoted wide by alias and its
//! reference formula evaluated once per species row.
use crate::aggregate::Aggregated;
use crate::design::SampleRow;
use crate::error::{ConfigError, Notice, PipelineError};
use crate::expr;
use crate::pivot::{pivot, Observation, Wide};
use crate::reporter::{select_converter, ReporterConverter};
use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// One quant block with its per-species reference values resolved
#[derive(Debug, Clone)]
pub struct ResolvedBlock {
    pub plex: String,
    pub block: u32,
    /// Final measurement name per alias column; `None` marks an
    /// unmapped channel that will not reach the crosstab
    pub measurements: Vec<Option<String>>,
    /// Abundances pivoted wide by reporter alias, indexed by species
    pub wide: Wide<String>,
    /// Reference value per row of `wide`
    pub reference: Vec<f64>,
}

/// All quant blocks of the experiment, ready for normalization
#[derive(Debug, Clone)]
pub struct Resolved {
    pub blocks: Vec<ResolvedBlock>,
    pub notices: Vec<Notice>,
}

impl Aggregated {
    /// Resolve the reference definition of every quant block.
    ///
    /// The converter is chosen from `registry` by exact channel-set
    /// equality; [`crate::reporter::CONVERTERS`] covers the stock kits,
    /// and callers with exotic layouts can pass their own registry.
    pub fn resolve(self, registry: &[ReporterConverter]) -> Result<Resolved, PipelineError> {
        let Aggregated {
            channels,
            records,
            design,
            mut notices,
        } = self;

        let observed: HashSet<&str> = channels.iter().map(String::as_str).collect();
        let converter = select_converter(registry, &observed)?;

        // A design authored without quant blocks is a single implicit
        // block; mixing one side with blocks and the other without
        // collapses to the same implicit block
        let use_blocks = design.samples.iter().any(|r| r.block.is_some())
            && design.references.iter().any(|r| r.block.is_some());
        let block_of = |block: Option<u32>| if use_blocks { block.unwrap_or(1) } else { 1 };

        let mut sample_of: HashMap<(&str, &str), &SampleRow> = HashMap::new();
        let mut measurement_of: HashMap<(&str, u32), HashMap<&str, Option<&str>>> =
            HashMap::new();
        for row in &design.samples {
            sample_of
                .entry((row.plex.as_str(), row.channel.as_str()))
                .or_insert(row);
            measurement_of
                .entry((row.plex.as_str(), block_of(row.block)))
                .or_insert_with(HashMap::new)
                .entry(row.alias.as_str())
                .or_insert_with(|| row.measurement.as_deref());
        }

        // Melt wide-by-channel sums to long form, attach the alias, and
        // regroup by (plex, block)
        let mut long: IndexMap<(String, u32), Vec<Observation<String>>> = IndexMap::new();
        for record in &records {
            for (i, column) in channels.iter().enumerate() {
                // set equality guarantees every observed column converts
                let reporter = match converter.reporter(column) {
                    Some(reporter) => reporter,
                    None => continue,
                };
                // channels without a sample-design row are dropped
                let sample = match sample_of.get(&(record.plex.as_str(), reporter)) {
                    Some(sample) => *sample,
                    None => continue,
                };
                long.entry((record.plex.clone(), block_of(sample.block)))
                    .or_insert_with(Vec::new)
                    .push(Observation {
                        index: record.species.clone(),
                        column: sample.alias.clone(),
                        value: record.values[i],
                    });
            }
        }

        // Quantified plexes the sample or reference design never covers
        let sampled: HashSet<&str> = design.samples.iter().map(|r| r.plex.as_str()).collect();
        let referenced: HashSet<&str> = design.references.iter().map(|r| r.plex.as_str()).collect();
        let mut dropped: Vec<String> = records
            .iter()
            .map(|r| r.plex.as_str())
            .filter(|p| !sampled.contains(p) || !referenced.contains(p))
            .collect::<HashSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();
        if !dropped.is_empty() {
            dropped.sort();
            warn!(
                "no sample/reference design rows for {} quantified plexes: {:?}",
                dropped.len(),
                dropped
            );
            notices.push(Notice::PlexesDropped { plexes: dropped });
        }

        // One resolved block per reference row; the first row wins when
        // a (plex, block) is defined twice
        let mut blocks = Vec::new();
        for row in &design.references {
            let block = block_of(row.block);
            let observations = match long.shift_remove(&(row.plex.clone(), block)) {
                Some(observations) => observations,
                None => continue,
            };
            let wide = pivot(observations);
            let formula = expr::parse(&row.expression).map_err(|source| {
                ConfigError::Reference {
                    plex: row.plex.clone(),
                    block,
                    source,
                }
            })?;
            let mut reference = Vec::with_capacity(wide.rows.len());
            for (_, cells) in &wide.rows {
                let value = formula
                    .eval(&|name| {
                        wide.columns
                            .iter()
                            .position(|c| c == name)
                            .and_then(|i| cells[i])
                    })
                    .map_err(|source| ConfigError::Reference {
                        plex: row.plex.clone(),
                        block,
                        source,
                    })?;
                reference.push(value);
            }
            let aliases = measurement_of.get(&(row.plex.as_str(), block));
            let measurements = wide
                .columns
                .iter()
                .map(|alias| {
                    aliases
                        .and_then(|aliases| aliases.get(alias.as_str()))
                        .and_then(|measurement| *measurement)
                        .map(String::from)
                })
                .collect();
            blocks.push(ResolvedBlock {
                plex: row.plex.clone(),
                block,
                measurements,
                wide,
                reference,
            });
        }
        debug!("resolved {} quant blocks", blocks.len());

        Ok(Resolved { blocks, notices })
    }
}
