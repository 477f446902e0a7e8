//! Explicit pivot and melt over long-form observations
//!
//! Reshaping is spelled out as (index, column, value) parameters so that
//! ordering is well defined: columns appear in first-seen order, index
//! rows in first-seen order. On duplicate (index, column) cells the
//! first value wins.
use indexmap::IndexMap;
use std::hash::Hash;

/// One long-form observation destined for a pivot
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<K> {
    pub index: K,
    pub column: String,
    pub value: f64,
}

/// Wide table produced by [`pivot`]
#[derive(Debug, Clone, PartialEq)]
pub struct Wide<K> {
    pub columns: Vec<String>,
    /// Cells align with `columns`; `None` marks an absent observation
    pub rows: Vec<(K, Vec<Option<f64>>)>,
}

/// Pivot long-form observations into a wide table
pub fn pivot<K, I>(observations: I) -> Wide<K>
where
    K: Eq + Hash,
    I: IntoIterator<Item = Observation<K>>,
{
    let mut columns: IndexMap<String, usize> = IndexMap::new();
    let mut rows: IndexMap<K, Vec<Option<f64>>> = IndexMap::new();

    for obs in observations {
        let next = columns.len();
        let col = *columns.entry(obs.column).or_insert(next);
        let cells = rows.entry(obs.index).or_insert_with(Vec::new);
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        if cells[col].is_none() {
            cells[col] = Some(obs.value);
        }
    }

    let width = columns.len();
    Wide {
        columns: columns.into_iter().map(|(column, _)| column).collect(),
        rows: rows
            .into_iter()
            .map(|(index, mut cells)| {
                cells.resize(width, None);
                (index, cells)
            })
            .collect(),
    }
}

impl<K: Clone> Wide<K> {
    /// Inverse of [`pivot`]: emit one observation per present cell, in
    /// row-major order
    pub fn melt(&self) -> Vec<Observation<K>> {
        let mut out = Vec::new();
        for (index, cells) in &self.rows {
            for (i, cell) in cells.iter().enumerate() {
                if let Some(value) = cell {
                    out.push(Observation {
                        index: index.clone(),
                        column: self.columns[i].clone(),
                        value: *value,
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn obs(index: &str, column: &str, value: f64) -> Observation<String> {
        Observation {
            index: index.into(),
            column: column.into(),
            value,
        }
    }

    #[test]
    fn column_and_row_order_is_first_seen() {
        let wide = pivot(vec![
            obs("b", "y", 1.0),
            obs("a", "x", 2.0),
            obs("b", "x", 3.0),
        ]);
        assert_eq!(wide.columns, vec!["y".to_string(), "x".to_string()]);
        assert_eq!(
            wide.rows,
            vec![
                ("b".to_string(), vec![Some(1.0), Some(3.0)]),
                ("a".to_string(), vec![None, Some(2.0)]),
            ]
        );
    }

    #[test]
    fn first_value_wins_on_duplicates() {
        let wide = pivot(vec![obs("a", "x", 1.0), obs("a", "x", 9.0)]);
        assert_eq!(wide.rows, vec![("a".to_string(), vec![Some(1.0)])]);
    }

    #[test]
    fn melt_skips_absent_cells() {
        let wide = pivot(vec![obs("a", "x", 1.0), obs("b", "y", 2.0)]);
        let long = wide.melt();
        assert_eq!(long, vec![obs("a", "x", 1.0), obs("b", "y", 2.0)]);
    }
}
