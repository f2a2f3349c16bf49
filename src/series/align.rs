//! Outer join of per-exchange sequences on the timestamp key

use crate::naming::qualified_column;
use crate::types::{Exchange, Field, Observation, Row};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Merge sources into one row per distinct timestamp.
///
/// - Duplicate timestamps within a source: the later record wins.
/// - Rows are ordered by the timestamp string; the fixed-width ISO format makes
///   that chronological.
/// - A source without a record at some timestamp contributes absent values.
/// - Exactly one source is passed through unchanged with plain field names.
pub fn align(sources: &BTreeMap<Exchange, Vec<Observation>>, fields: &[Field]) -> Vec<Row> {
    if sources.len() == 1 {
        return sources
            .values()
            .flat_map(|series| series.iter())
            .map(|obs| plain_row(obs, fields))
            .collect();
    }

    let indexed: Vec<(Exchange, HashMap<&str, &Observation>)> = sources
        .iter()
        .map(|(exchange, series)| {
            let mut by_t = HashMap::with_capacity(series.len());
            for obs in series {
                by_t.insert(obs.t.as_str(), obs);
            }
            (*exchange, by_t)
        })
        .collect();

    let keys: BTreeSet<&str> = indexed
        .iter()
        .flat_map(|(_, by_t)| by_t.keys().copied())
        .collect();

    keys.into_iter()
        .map(|t| {
            let mut row = Row::new(t);
            for (exchange, by_t) in &indexed {
                let obs = by_t.get(t);
                for &field in fields {
                    row.insert(
                        qualified_column(*exchange, field),
                        obs.and_then(|o| o.get(field)),
                    );
                }
            }
            row
        })
        .collect()
}

fn plain_row(obs: &Observation, fields: &[Field]) -> Row {
    let mut row = Row::new(obs.t.clone());
    for &field in fields {
        row.insert(field.record_name(), obs.get(field));
    }
    row
}
