//! Cohort-level drivers: one density per sample or per histology group.

pub mod cli;
pub mod groups;
pub mod output;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    breaks::{Dataset, Datasets},
    density::{aggregate::all_break_density, BinnedDensity, DensityContext, DensityVector},
    err::DensityError,
};

/// The cohort iteration mode.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    /// One unit per sample.
    Sample,
    /// One unit per histology group.
    Group,
}

/// A (unit, dataset) combination that was skipped.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SkippedUnit {
    pub mode: Mode,
    /// Sample identifier or group label.
    pub unit: String,
    pub dataset: Dataset,
    pub reason: String,
}

impl SkippedUnit {
    fn new(mode: Mode, unit: &str, dataset: Dataset, err: &DensityError) -> Self {
        if err.is_fatal() {
            tracing::error!("skipping {} {} for {}: {}", mode, unit, dataset, err);
        } else {
            tracing::warn!("skipping {} {} for {}: {}", mode, unit, dataset, err);
        }
        Self {
            mode,
            unit: unit.to_owned(),
            dataset,
            reason: err.to_string(),
        }
    }
}

/// Per-sample densities, grouped by dataset then by sample.
#[derive(Debug, Clone, Default)]
pub struct IndividualDensities {
    pub by_dataset: IndexMap<Dataset, IndexMap<String, DensityVector>>,
    pub skipped: Vec<SkippedUnit>,
}

/// Compute the density vector of every sample in every dataset.
///
/// Samples are processed in parallel, the output keeps the order of
/// `samples`.  A sample missing from a dataset is skipped for that dataset
/// only.
pub fn run_individual(
    ctx: &DensityContext,
    datasets: &Datasets,
    samples: &[String],
) -> IndividualDensities {
    let per_sample = samples
        .par_iter()
        .map(|sample_id| {
            (
                sample_id,
                all_break_density::<DensityVector, _>(
                    ctx,
                    datasets,
                    std::slice::from_ref(sample_id),
                ),
            )
        })
        .collect::<Vec<_>>();

    let mut result = IndividualDensities {
        by_dataset: datasets.names().map(|d| (d, IndexMap::new())).collect(),
        skipped: Vec::new(),
    };
    for (sample_id, densities) in per_sample {
        for (dataset, density) in densities {
            match density {
                Ok(density) => {
                    result
                        .by_dataset
                        .entry(dataset)
                        .or_default()
                        .insert(sample_id.clone(), density);
                }
                Err(e) => result
                    .skipped
                    .push(SkippedUnit::new(Mode::Sample, sample_id, dataset, &e)),
            }
        }
    }
    result
}

/// Binned densities of one histology group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDensity {
    pub group: String,
    pub samples: Vec<String>,
    pub datasets: IndexMap<Dataset, BinnedDensity>,
}

/// Compute the aggregated binned density of each group in every dataset.
///
/// Groups for which no dataset yields a density are left out of the result.
pub fn run_groups(
    ctx: &DensityContext,
    datasets: &Datasets,
    groups: &IndexMap<String, Vec<String>>,
) -> (Vec<GroupDensity>, Vec<SkippedUnit>) {
    let per_group = groups
        .iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(group, samples)| {
            (
                group,
                samples,
                all_break_density::<BinnedDensity, _>(ctx, datasets, samples),
            )
        })
        .collect::<Vec<_>>();

    let mut result = Vec::new();
    let mut skipped = Vec::new();
    for (group, samples, densities) in per_group {
        let mut group_density = GroupDensity {
            group: group.clone(),
            samples: samples.clone(),
            datasets: IndexMap::new(),
        };
        for (dataset, density) in densities {
            match density {
                Ok(density) => {
                    group_density.datasets.insert(dataset, density);
                }
                Err(e) => skipped.push(SkippedUnit::new(Mode::Group, group, dataset, &e)),
            }
        }
        if group_density.datasets.is_empty() {
            tracing::warn!("no density for group {} in any dataset", group);
        } else {
            result.push(group_density);
        }
    }
    (result, skipped)
}
