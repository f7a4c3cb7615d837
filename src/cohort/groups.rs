//! Partition of the cohort into histology groups.

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{common::io::tsv_reader, err::DensityError};

/// Columns holding the sample identifier, in order of preference.
pub const SAMPLE_ID_COLUMNS: &[&str] =
    &["Kids_First_Biospecimen_ID", "biospecimen_id", "sample_id"];
/// Columns holding the histology label, in order of preference.
pub const HISTOLOGY_COLUMNS: &[&str] = &["short_histology", "histology"];
/// Column holding the experimental strategy.
pub const STRATEGY_COLUMN: &str = "experimental_strategy";

/// Row of the sample metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMeta {
    /// Identifier of the sample, matches the breakpoint files.
    pub sample_id: String,
    /// Histology label, `None` if empty.
    pub histology: Option<String>,
    /// Experimental strategy, e.g., `WGS` or `RNA-Seq`.
    pub experimental_strategy: Option<String>,
}

/// Offset of the first of `candidates` present in `headers`.
fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
}

fn field(record: &csv::StringRecord, col: usize) -> &str {
    record.get(col).unwrap_or_default()
}

/// Load the sample metadata TSV file.
///
/// When several identifier or label columns are present, the first one of
/// `SAMPLE_ID_COLUMNS` and `HISTOLOGY_COLUMNS` is used; the others are
/// ignored like any other extra column.
#[tracing::instrument]
pub fn load_metadata(path: &Path) -> Result<Vec<SampleMeta>, DensityError> {
    tracing::debug!("loading sample metadata from {:?}", path);
    let mut reader = tsv_reader(path).map_err(|e| DensityError::data_shape(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| DensityError::data_shape(path, e))?
        .clone();
    let missing = |names: &[&str]| {
        DensityError::data_shape(
            path,
            format!("none of the columns {:?} in header {:?}", names, headers),
        )
    };
    let id_col =
        find_column(&headers, SAMPLE_ID_COLUMNS).ok_or_else(|| missing(SAMPLE_ID_COLUMNS))?;
    let label_col =
        find_column(&headers, HISTOLOGY_COLUMNS).ok_or_else(|| missing(HISTOLOGY_COLUMNS))?;
    let strategy_col = find_column(&headers, &[STRATEGY_COLUMN]);
    tracing::debug!(
        "using columns {:?} and {:?}",
        &headers[id_col],
        &headers[label_col]
    );

    let non_empty = |value: &str| Some(value.trim()).filter(|v| !v.is_empty()).map(String::from);
    let mut result = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| DensityError::data_shape(path, format!("row {}: {}", i + 1, e)))?;
        let sample_id = field(&record, id_col).trim();
        if sample_id.is_empty() {
            return Err(DensityError::data_shape(
                path,
                format!("row {}: empty sample identifier", i + 1),
            ));
        }
        result.push(SampleMeta {
            sample_id: sample_id.to_owned(),
            histology: non_empty(field(&record, label_col)),
            experimental_strategy: strategy_col.and_then(|col| non_empty(field(&record, col))),
        });
    }
    tracing::debug!("loaded metadata of {} samples", result.len());
    Ok(result)
}

fn usable_label(label: &Option<String>) -> Option<&str> {
    label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty() && *label != "NA")
}

/// Group sample identifiers by histology label.
///
/// Samples without label or with an experimental strategy listed in
/// `exclude_strategies` are left out; duplicate sample identifiers are kept
/// once.  Groups are sorted by label, samples keep the metadata order.
pub fn partition_groups(
    metadata: &[SampleMeta],
    exclude_strategies: &[String],
) -> IndexMap<String, Vec<String>> {
    metadata
        .iter()
        .unique_by(|meta| meta.sample_id.clone())
        .filter(|meta| {
            !meta
                .experimental_strategy
                .as_deref()
                .is_some_and(|s| exclude_strategies.iter().any(|e| e == s))
        })
        .filter_map(|meta| {
            usable_label(&meta.histology).map(|label| (label.to_owned(), meta.sample_id.clone()))
        })
        .into_group_map()
        .into_iter()
        .sorted_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs))
        .collect()
}

/// Turn a histology label into a file name stem.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
