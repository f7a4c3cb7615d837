//! Breakpoint datasets and their loading.

use std::{path::Path, time::Instant};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use thousands::Separable;

use crate::{
    common::{autosome_no, build_chrom_map, io::tsv_reader},
    err::DensityError,
};

/// The breakpoint datasets.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    enum_map::Enum,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    /// Breakpoints supported by both SV and CNV calls.
    Intersection,
    /// Copy number variant breakpoints.
    Cnv,
    /// Structural variant breakpoints.
    Sv,
}

/// A single breakpoint as read from the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Identifier of the sample.
    #[serde(alias = "samples", alias = "Kids_First_Biospecimen_ID", alias = "biospecimen_id")]
    pub sample_id: String,
    /// Chromosome name.
    #[serde(alias = "chromosome", alias = "chr")]
    pub chrom: String,
    /// 0-based position of the breakpoint.
    #[serde(alias = "coordinate", alias = "start", alias = "pos")]
    pub coord: u64,
}

/// Autosomal breakpoint position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locus {
    pub chrom_no: usize,
    pub coord: u64,
}

/// Breakpoints of one dataset, grouped by sample.
///
/// Samples stay known even if none of their breakpoints is on an autosome.
#[derive(Debug, Clone, Default)]
pub struct BreakpointSet {
    by_sample: IndexMap<String, Vec<Locus>>,
}

impl BreakpointSet {
    /// Group `breakpoints` by sample, keeping autosomal loci only.
    pub fn from_breakpoints<I>(breakpoints: I) -> Self
    where
        I: IntoIterator<Item = Breakpoint>,
    {
        let chrom_map = build_chrom_map();
        let mut by_sample: IndexMap<String, Vec<Locus>> = IndexMap::new();
        for bp in breakpoints {
            let loci = by_sample.entry(bp.sample_id).or_default();
            if let Some(chrom_no) = autosome_no(&chrom_map, &bp.chrom) {
                loci.push(Locus {
                    chrom_no,
                    coord: bp.coord,
                });
            }
        }
        Self { by_sample }
    }

    pub fn contains_sample(&self, sample_id: &str) -> bool {
        self.by_sample.contains_key(sample_id)
    }

    /// Autosomal loci of `sample_id`, `None` if the sample is unknown.
    pub fn loci(&self, sample_id: &str) -> Option<&[Locus]> {
        self.by_sample.get(sample_id).map(|v| v.as_slice())
    }

    /// Sample identifiers in order of first appearance.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.by_sample.keys().map(|s| s.as_str())
    }

    /// Number of autosomal breakpoints.
    pub fn len(&self) -> usize {
        self.by_sample.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Load the breakpoints of one dataset from a TSV file with header.
#[tracing::instrument]
pub fn load_breakpoints(dataset: Dataset, path: &Path) -> Result<BreakpointSet, DensityError> {
    tracing::debug!("loading {} breakpoints from {:?}", dataset, path);
    let before_loading = Instant::now();

    let mut reader = tsv_reader(path).map_err(|e| DensityError::data_shape(path, e))?;
    let mut breakpoints = Vec::new();
    for (i, record) in reader.deserialize::<Breakpoint>().enumerate() {
        let record = record
            .map_err(|e| DensityError::data_shape(path, format!("row {}: {}", i + 1, e)))?;
        breakpoints.push(record);
    }
    let total = breakpoints.len();
    let result = BreakpointSet::from_breakpoints(breakpoints);

    tracing::debug!(
        "loaded {} {} breakpoints ({} autosomal) of {} samples in {:?}",
        total.separate_with_commas(),
        dataset,
        result.len().separate_with_commas(),
        result.by_sample.len().separate_with_commas(),
        before_loading.elapsed()
    );
    Ok(result)
}

/// The loaded breakpoint datasets, in `Dataset` order.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    sets: IndexMap<Dataset, BreakpointSet>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: Dataset, set: BreakpointSet) {
        self.sets.insert(dataset, set);
        self.sets.sort_keys();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dataset, &BreakpointSet)> {
        self.sets.iter().map(|(k, v)| (*k, v))
    }

    pub fn names(&self) -> impl Iterator<Item = Dataset> + '_ {
        self.sets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Sorted union of the sample identifiers of all datasets.
    pub fn all_samples(&self) -> Vec<String> {
        let mut samples = self
            .sets
            .values()
            .flat_map(|set| set.samples())
            .map(|s| s.to_owned())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        samples.sort();
        samples
    }

    /// Load all datasets given in `paths`.
    ///
    /// A malformed file only drops its dataset; the error is logged and
    /// returned next to the loaded datasets.
    pub fn load(paths: &[(Dataset, &Path)]) -> (Self, Vec<(Dataset, DensityError)>) {
        let mut result = Self::new();
        let mut failed = Vec::new();
        for (dataset, path) in paths {
            match load_breakpoints(*dataset, path) {
                Ok(set) => result.insert(*dataset, set),
                Err(e) => {
                    tracing::error!("dropping {} dataset: {}", dataset, e);
                    failed.push((*dataset, e));
                }
            }
        }
        (result, failed)
    }
}
