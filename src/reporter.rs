//! Reporter channel registries for the supported multiplex kits
//!
//! Intensity tables name their channel columns by reporter ion m/z
//! (`Ion_126.128`) while study designs speak in reporter channel names
//! (`126C`). A [`ReporterConverter`] records that correspondence for one
//! kit cardinality; exactly one converter must match the observed column
//! set, by exact set equality, before any channel can be resolved.
use crate::error::ConfigError;
use std::collections::HashSet;

/// Channel column ↔ reporter name pairs for one multiplex kit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReporterConverter<'a> {
    pub name: &'a str,
    /// (intensity column, reporter channel name)
    pub pairs: &'a [(&'a str, &'a str)],
}

impl<'a> ReporterConverter<'a> {
    /// Number of channels in this kit
    pub fn channels(&self) -> usize {
        self.pairs.len()
    }

    /// Does the observed column set equal this converter's column set
    /// exactly?
    pub fn matches(&self, observed: &HashSet<&str>) -> bool {
        self.pairs.len() == observed.len()
            && self.pairs.iter().all(|(column, _)| observed.contains(column))
    }

    /// Reporter channel name for an intensity column
    pub fn reporter(&self, column: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, reporter)| *reporter)
    }
}

pub const ITRAQ4: ReporterConverter<'static> = ReporterConverter {
    name: "itraq4",
    pairs: &[
        ("Ion_114.111", "114"),
        ("Ion_115.108", "115"),
        ("Ion_116.112", "116"),
        ("Ion_117.115", "117"),
    ],
};

pub const ITRAQ8: ReporterConverter<'static> = ReporterConverter {
    name: "itraq8",
    pairs: &[
        ("Ion_113.108", "113"),
        ("Ion_114.111", "114"),
        ("Ion_115.108", "115"),
        ("Ion_116.112", "116"),
        ("Ion_117.115", "117"),
        ("Ion_118.112", "118"),
        ("Ion_119.115", "119"),
        ("Ion_121.122", "121"),
    ],
};

pub const TMT10: ReporterConverter<'static> = ReporterConverter {
    name: "tmt10",
    pairs: &[
        ("Ion_126.128", "126"),
        ("Ion_127.125", "127N"),
        ("Ion_127.131", "127C"),
        ("Ion_128.128", "128N"),
        ("Ion_128.134", "128C"),
        ("Ion_129.131", "129N"),
        ("Ion_129.138", "129C"),
        ("Ion_130.135", "130N"),
        ("Ion_130.141", "130C"),
        ("Ion_131.138", "131"),
    ],
};

pub const TMT11: ReporterConverter<'static> = ReporterConverter {
    name: "tmt11",
    pairs: &[
        ("Ion_126.128", "126"),
        ("Ion_127.125", "127N"),
        ("Ion_127.131", "127C"),
        ("Ion_128.128", "128N"),
        ("Ion_128.134", "128C"),
        ("Ion_129.131", "129N"),
        ("Ion_129.138", "129C"),
        ("Ion_130.135", "130N"),
        ("Ion_130.141", "130C"),
        ("Ion_131.138", "131N"),
        ("Ion_131.144", "131C"),
    ],
};

pub const TMT16: ReporterConverter<'static> = ReporterConverter {
    name: "tmt16",
    pairs: &[
        ("Ion_126.128", "126"),
        ("Ion_127.125", "127N"),
        ("Ion_127.131", "127C"),
        ("Ion_128.128", "128N"),
        ("Ion_128.134", "128C"),
        ("Ion_129.131", "129N"),
        ("Ion_129.138", "129C"),
        ("Ion_130.135", "130N"),
        ("Ion_130.141", "130C"),
        ("Ion_131.138", "131N"),
        ("Ion_131.144", "131C"),
        ("Ion_132.142", "132N"),
        ("Ion_132.148", "132C"),
        ("Ion_133.145", "133N"),
        ("Ion_133.151", "133C"),
        ("Ion_134.148", "134N"),
    ],
};

pub const TMT18: ReporterConverter<'static> = ReporterConverter {
    name: "tmt18",
    pairs: &[
        ("Ion_126.128", "126"),
        ("Ion_127.125", "127N"),
        ("Ion_127.131", "127C"),
        ("Ion_128.128", "128N"),
        ("Ion_128.134", "128C"),
        ("Ion_129.131", "129N"),
        ("Ion_129.138", "129C"),
        ("Ion_130.135", "130N"),
        ("Ion_130.141", "130C"),
        ("Ion_131.138", "131N"),
        ("Ion_131.144", "131C"),
        ("Ion_132.142", "132N"),
        ("Ion_132.148", "132C"),
        ("Ion_133.145", "133N"),
        ("Ion_133.151", "133C"),
        ("Ion_134.148", "134N"),
        ("Ion_134.155", "134C"),
        ("Ion_135.152", "135N"),
    ],
};

/// Built-in converter registry, searched in order
pub const CONVERTERS: [ReporterConverter<'static>; 6] =
    [ITRAQ4, ITRAQ8, TMT10, TMT11, TMT16, TMT18];

/// Select the converter whose channel set equals the observed column set
pub fn select_converter<'a>(
    registry: &'a [ReporterConverter<'a>],
    observed: &HashSet<&str>,
) -> Result<&'a ReporterConverter<'a>, ConfigError> {
    registry
        .iter()
        .find(|converter| converter.matches(observed))
        .ok_or(ConfigError::NoConverterMatch {
            observed: observed.len(),
        })
}
