//! A Rust library for linking, aggregating, and normalizing multiplexed
//! isobaric proteomics data into quantitative crosstabs
//!
//! This library's API is based around a chain of types that form a data
//! analysis pipeline. Identification and intensity tables produced by
//! upstream readers are reconciled against a study design, joined on
//! (run, scan), rolled up to a reporting level, normalized to a
//! per-block reference channel, and pivoted into a species-by-sample
//! matrix of log2 ratios.
//!
//! ```rust,ignore
//! # use plexquant::*;
//! let result = create_crosstab(identifications, intensities, design)?;
//! for notice in &result.notices {
//!     eprintln!("{:?}", notice);
//! }
//! let log2 = result.crosstab.get("P12345", "tumor_1");
//! ```
//!
//! Callers that need a non-stock reporter kit can drive the stages
//! themselves and supply their own converter registry:
//!
//! ```rust,ignore
//! # use plexquant::*;
//! let result = reconcile(identifications, intensities, design)?
//!     .link()?
//!     .aggregate()
//!     .resolve(&my_converters)?
//!     .normalize()
//!     .assemble();
//! ```
mod aggregate;
mod crosstab;
mod design;
mod error;
mod expr;
mod link;
mod normalize;
mod pivot;
mod reconcile;
mod reference;
mod reporter;
mod tables;
mod util;

pub use aggregate::{Aggregated, AggregatedRecord, SPECIES_SEPARATOR};
pub use crosstab::{Crosstab, CrosstabResult};
pub use design::{FractionRow, ReferenceRow, SampleRow, StudyDesign};
pub use error::{ConfigError, Notice, PipelineError, SchemaError};
pub use expr::{Expr, ExprError};
pub use link::{Linked, LinkedRecord, CANONICAL_SCAN_COLUMN};
pub use normalize::{Normalized, NormalizedRecord};
pub use pivot::{pivot, Observation, Wide};
pub use reconcile::{reconcile, Reconciled};
pub use reference::{Resolved, ResolvedBlock};
pub use reporter::{select_converter, ReporterConverter, CONVERTERS};
pub use tables::{IdentificationRecord, IdentificationTable, IntensityRecord, IntensityTable};

/// Run the complete pipeline with the built-in converter registry
pub fn create_crosstab(
    identifications: IdentificationTable,
    intensities: IntensityTable,
    design: StudyDesign,
) -> Result<CrosstabResult, PipelineError> {
    Ok(reconcile(identifications, intensities, design)?
        .link()?
        .aggregate()
        .resolve(&CONVERTERS)?
        .normalize()
        .assemble())
}
