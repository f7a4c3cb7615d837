//! Code for writing the cohort output files.

use std::{
    collections::HashSet,
    io::Write,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    breaks::Dataset,
    common::{io::open_write_maybe_gz, io::tsv_writer, worker_version},
    density::{DensityContext, DensityVector},
};

use super::{groups::sanitize_label, GroupDensity, SkippedUnit};

/// String written for masked bins.
pub const NA: &str = "NA";

/// Path of the per-sample matrix of `dataset` in `dir`.
pub fn density_matrix_path(dir: &Path, dataset: Dataset) -> PathBuf {
    dir.join(format!("{}_breaks_density.tsv", dataset))
}

/// Path of the per-sample summary of `dataset` in `dir`.
pub fn summary_path(dir: &Path, dataset: Dataset) -> PathBuf {
    dir.join(format!("{}_breaks_summary.tsv", dataset))
}

/// Write the bins x samples count matrix of one dataset.
pub fn write_density_matrix<W: Write>(
    ctx: &DensityContext,
    densities: &IndexMap<String, DensityVector>,
    writer: &mut csv::Writer<W>,
) -> Result<(), anyhow::Error> {
    let mut header = vec!["chrom", "start", "end"];
    header.extend(densities.keys().map(|s| s.as_str()));
    writer.write_record(&header)?;

    for (idx, bin) in ctx.bins().iter().enumerate() {
        let mut row = vec![bin.chrom.clone(), bin.start.to_string(), bin.end.to_string()];
        row.extend(densities.values().map(|density| {
            density.values()[idx]
                .map(|count| count.to_string())
                .unwrap_or_else(|| NA.to_owned())
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Genome-wide summary of one sample in one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub sample_id: String,
    /// Breakpoints in unmasked bins.
    pub breaks_count: u64,
    /// Callable sequence of unmasked bins in Mb.
    pub callable_mb: f64,
    /// Breakpoints per callable Mb.
    pub breaks_per_mb: f64,
}

impl SampleSummary {
    pub fn from_density(ctx: &DensityContext, sample_id: &str, density: &DensityVector) -> Self {
        let callable_bp: f64 = ctx
            .bins()
            .iter()
            .enumerate()
            .filter(|(idx, _)| !ctx.is_masked(*idx))
            .map(|(idx, bin)| bin.len() as f64 * ctx.mask().fraction(idx))
            .sum();
        let callable_mb = callable_bp / 1e6;
        let breaks_count = density.total();
        Self {
            sample_id: sample_id.to_owned(),
            breaks_count,
            callable_mb,
            breaks_per_mb: if callable_mb > 0.0 {
                breaks_count as f64 / callable_mb
            } else {
                0.0
            },
        }
    }
}

/// Write one summary line per sample.
pub fn write_summary<W: Write>(
    ctx: &DensityContext,
    densities: &IndexMap<String, DensityVector>,
    writer: &mut csv::Writer<W>,
) -> Result<(), anyhow::Error> {
    writer.write_record(["sample_id", "breaks_count", "callable_mb", "breaks_per_mb"])?;
    for (sample_id, density) in densities {
        let summary = SampleSummary::from_density(ctx, sample_id, density);
        writer.write_record([
            summary.sample_id,
            summary.breaks_count.to_string(),
            format!("{:.4}", summary.callable_mb),
            format!("{:.4}", summary.breaks_per_mb),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write matrix and summary of each dataset into `dir`.
pub fn write_individual(
    ctx: &DensityContext,
    by_dataset: &IndexMap<Dataset, IndexMap<String, DensityVector>>,
    dir: &Path,
) -> Result<(), anyhow::Error> {
    for (dataset, densities) in by_dataset {
        let path = density_matrix_path(dir, *dataset);
        tracing::info!(
            "writing {} densities of {} samples to {:?}",
            dataset,
            densities.len(),
            &path
        );
        write_density_matrix(ctx, densities, &mut tsv_writer(&path)?)?;
        write_summary(ctx, densities, &mut tsv_writer(summary_path(dir, *dataset))?)?;
    }
    Ok(())
}

/// Serialized form of a group's densities.
#[derive(Debug, Serialize)]
struct GroupDensityFile<'a> {
    version: &'a str,
    bin_size: u64,
    perc_cutoff: f64,
    #[serde(flatten)]
    density: &'a GroupDensity,
}

/// Write one JSON file per group into `dir`, returns the written paths.
pub fn write_groups(
    ctx: &DensityContext,
    groups: &[GroupDensity],
    dir: &Path,
) -> Result<Vec<PathBuf>, anyhow::Error> {
    let mut used_stems = HashSet::new();
    let mut paths = Vec::new();
    for group in groups {
        let base = sanitize_label(&group.group);
        let mut stem = base.clone();
        let mut suffix = 1;
        while !used_stems.insert(stem.clone()) {
            suffix += 1;
            stem = format!("{}_{}", base, suffix);
        }

        let path = dir.join(format!("{}_breaks_density.json", stem));
        tracing::debug!("writing group {:?} to {:?}", &group.group, &path);
        let mut writer = open_write_maybe_gz(&path)?;
        serde_json::to_writer_pretty(
            &mut writer,
            &GroupDensityFile {
                version: worker_version(),
                bin_size: ctx.bins().bin_size(),
                perc_cutoff: ctx.perc_cutoff(),
                density: group,
            },
        )?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        paths.push(path);
    }
    Ok(paths)
}

/// Write the report of skipped units.
pub fn write_skipped<W: Write>(
    skipped: &[SkippedUnit],
    writer: &mut csv::Writer<W>,
) -> Result<(), anyhow::Error> {
    writer.write_record(["mode", "unit", "dataset", "reason"])?;
    for unit in skipped {
        writer.serialize(unit)?;
    }
    writer.flush()?;
    Ok(())
}
