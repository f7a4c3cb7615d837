//! Command line interface for "density samples" and "density groups".

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use enum_map::{enum_map, EnumMap};
use itertools::Itertools;
use thousands::Separable;

use crate::{
    breaks::{Dataset, Datasets},
    common::{expand_path, io::tsv_writer, trace_rss_now},
    conf::ConfOverrides,
    density::cli::SetupArgs,
    err::DensityError,
};

use super::{
    groups::{load_metadata, partition_groups},
    output::{write_groups, write_individual, write_skipped},
    Mode, SkippedUnit,
};

/// Name of the report of skipped units in the output directory.
pub const SKIPPED_UNITS_FILE: &str = "skipped_units.tsv";
/// Unit reported for a dataset dropped as a whole.
pub const ALL_UNITS: &str = "*";

/// Paths to the breakpoint files, at least one is required.
#[derive(Parser, Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Path to TSV file with consensus (intersection) breakpoints.
    #[arg(long)]
    pub path_intersection: Option<String>,
    /// Path to TSV file with copy number breakpoints.
    #[arg(long)]
    pub path_cnv: Option<String>,
    /// Path to TSV file with structural variant breakpoints.
    #[arg(long)]
    pub path_sv: Option<String>,
}

impl DatasetArgs {
    /// Expanded path of each dataset, `None` if not given.
    pub fn paths(&self) -> EnumMap<Dataset, Option<PathBuf>> {
        let expand =
            |path: &Option<String>| path.as_deref().map(|p| PathBuf::from(expand_path(p)));
        enum_map! {
            Dataset::Intersection => expand(&self.path_intersection),
            Dataset::Cnv => expand(&self.path_cnv),
            Dataset::Sv => expand(&self.path_sv),
        }
    }

    /// Load the given breakpoint files.
    ///
    /// Malformed files are dropped and reported as skipped for all units of
    /// `mode`, it is an error if none is left.
    pub fn load(&self, mode: Mode) -> Result<(Datasets, Vec<SkippedUnit>), anyhow::Error> {
        let paths = self
            .paths()
            .into_iter()
            .filter_map(|(dataset, path)| path.map(|path| (dataset, path)))
            .collect::<Vec<_>>();
        if paths.is_empty() {
            return Err(DensityError::Configuration(String::from(
                "at least one of --path-intersection, --path-cnv, --path-sv is required",
            ))
            .into());
        }

        let before_loading = Instant::now();
        let inputs = paths
            .iter()
            .map(|(dataset, path)| (*dataset, path.as_path()))
            .collect::<Vec<_>>();
        let (datasets, failed) = Datasets::load(&inputs);
        if datasets.is_empty() {
            if let Some((_, err)) = failed.first() {
                return Err(err.clone().into());
            }
        }
        let skipped = failed
            .into_iter()
            .map(|(dataset, err)| SkippedUnit {
                mode,
                unit: String::from(ALL_UNITS),
                dataset,
                reason: err.to_string(),
            })
            .collect::<Vec<_>>();
        tracing::info!(
            "loaded {} of {} breakpoint datasets in {:?}",
            datasets.len(),
            paths.len(),
            before_loading.elapsed()
        );
        for (dataset, set) in datasets.iter() {
            tracing::debug!(
                "  {}: {} samples",
                dataset,
                set.samples().count().separate_with_commas()
            );
        }
        Ok((datasets, skipped))
    }
}

/// Command line arguments for `density samples` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compute breakpoint density per sample", long_about = None)]
pub struct SamplesArgs {
    /// Chromosome sizes, bin size, cutoff, and uncallable regions.
    #[command(flatten)]
    pub setup: SetupArgs,
    /// Breakpoint files.
    #[command(flatten)]
    pub datasets: DatasetArgs,
    /// Restrict to these samples, defaults to all samples in the breakpoint files.
    #[arg(long = "sample", value_delimiter = ',')]
    pub samples: Vec<String>,
    /// Path to output directory.
    #[arg(long)]
    pub path_output_dir: PathBuf,
    /// Set the number of threads to use, defaults to number of cores.
    #[arg(long)]
    pub num_threads: Option<usize>,
}

/// Command line arguments for `density groups` sub command.
#[derive(Parser, Debug)]
#[command(about = "Compute breakpoint density per histology group", long_about = None)]
pub struct GroupsArgs {
    /// Chromosome sizes, bin size, cutoff, and uncallable regions.
    #[command(flatten)]
    pub setup: SetupArgs,
    /// Breakpoint files.
    #[command(flatten)]
    pub datasets: DatasetArgs,
    /// Path to TSV file with sample metadata.
    #[arg(long)]
    pub path_metadata: String,
    /// Experimental strategies to exclude, overrides the configuration.
    #[arg(long, value_delimiter = ',')]
    pub exclude_strategy: Option<Vec<String>>,
    /// Path to output directory.
    #[arg(long)]
    pub path_output_dir: PathBuf,
    /// Set the number of threads to use, defaults to number of cores.
    #[arg(long)]
    pub num_threads: Option<usize>,
}

fn build_thread_pool(num_threads: Option<usize>) -> Result<rayon::ThreadPool, anyhow::Error> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(num_threads) = num_threads {
        builder = builder.num_threads(num_threads);
    }
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("building Rayon thread pool failed: {}", e))
}

fn create_output_dir(path: &Path) -> Result<(), anyhow::Error> {
    std::fs::create_dir_all(path)
        .map_err(|e| anyhow::anyhow!("could not create output directory {:?}: {}", path, e))
}

fn write_skipped_file(skipped: &[SkippedUnit], dir: &Path) -> Result<(), anyhow::Error> {
    let path = dir.join(SKIPPED_UNITS_FILE);
    if !skipped.is_empty() {
        tracing::warn!("{} units skipped, see {:?}", skipped.len(), &path);
    }
    write_skipped(skipped, &mut tsv_writer(&path)?)
}

/// Main entry point for `density samples` sub command.
pub fn run_samples(
    common_args: &crate::common::Args,
    args: &SamplesArgs,
) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("Starting `density samples`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let (ctx, _) = args.setup.build_context()?;
    let (datasets, mut skipped) = args.datasets.load(Mode::Sample)?;
    trace_rss_now();

    let samples = if args.samples.is_empty() {
        datasets.all_samples()
    } else {
        args.samples.iter().unique().cloned().collect()
    };
    tracing::info!(
        "computing densities of {} samples in {} datasets",
        samples.len().separate_with_commas(),
        datasets.len()
    );
    let before_compute = Instant::now();
    let pool = build_thread_pool(args.num_threads)?;
    let result = pool.install(|| super::run_individual(&ctx, &datasets, &samples));
    tracing::info!("... done computing in {:?}", before_compute.elapsed());
    trace_rss_now();

    create_output_dir(&args.path_output_dir)?;
    write_individual(&ctx, &result.by_dataset, &args.path_output_dir)?;
    skipped.extend(result.skipped);
    write_skipped_file(&skipped, &args.path_output_dir)?;

    tracing::info!(
        "All of `density samples` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

/// Main entry point for `density groups` sub command.
pub fn run_groups(
    common_args: &crate::common::Args,
    args: &GroupsArgs,
) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("Starting `density groups`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let (ctx, conf) = args.setup.build_context_with(ConfOverrides {
        exclude_strategies: args.exclude_strategy.clone(),
        ..Default::default()
    })?;
    let (datasets, mut skipped) = args.datasets.load(Mode::Group)?;
    let metadata = load_metadata(Path::new(&expand_path(&args.path_metadata)))?;
    let groups = partition_groups(&metadata, &conf.exclude_strategies);
    tracing::info!(
        "partitioned {} samples into {} groups",
        groups.values().map(|g| g.len()).sum::<usize>().separate_with_commas(),
        groups.len().separate_with_commas()
    );
    trace_rss_now();

    let before_compute = Instant::now();
    let pool = build_thread_pool(args.num_threads)?;
    let (densities, group_skipped) =
        pool.install(|| super::run_groups(&ctx, &datasets, &groups));
    skipped.extend(group_skipped);
    tracing::info!("... done computing in {:?}", before_compute.elapsed());
    trace_rss_now();

    create_output_dir(&args.path_output_dir)?;
    let paths = write_groups(&ctx, &densities, &args.path_output_dir)?;
    tracing::info!(
        "wrote {} group files to {:?}",
        paths.len(),
        &args.path_output_dir
    );
    write_skipped_file(&skipped, &args.path_output_dir)?;

    tracing::info!(
        "All of `density groups` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
