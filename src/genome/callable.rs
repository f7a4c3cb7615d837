//! Callability of genome bins given uncallable regions.

use std::{ops::Range, path::Path, time::Instant};

use thousands::Separable;

use crate::{
    common::{autosome_no, build_chrom_map, io::bed_reader, AUTOSOME_COUNT},
    err::DensityError,
};

use super::{
    bins::{GenomeBin, GenomeBins},
    intervals::{covered_len, merge_ranges},
};

/// Region excluded from reliable variant calling, half-open and 0-based.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UncallableRegion {
    /// Chromosome name.
    pub chrom: String,
    /// 0-based begin position.
    pub start: u64,
    /// End position (exclusive).
    pub end: u64,
}

/// Callable fraction of each bin, aligned with the bin order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CallabilityMask {
    fractions: Vec<f64>,
}

impl CallabilityMask {
    /// Callable fraction of the bin at offset `idx`.
    pub fn fraction(&self, idx: usize) -> f64 {
        self.fractions[idx]
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}

/// Compute `1 - (uncallable length / bin length)` for each bin.
///
/// Overlapping uncallable regions are merged first so shared sequence is
/// counted once.  Regions on chromosomes without bins are ignored.
pub fn compute_callable_fraction(
    bins: &GenomeBins,
    uncallable_regions: &[UncallableRegion],
) -> CallabilityMask {
    let chrom_map = build_chrom_map();

    let mut by_chrom: Vec<Vec<Range<u64>>> = vec![Vec::new(); AUTOSOME_COUNT];
    for region in uncallable_regions {
        if let Some(chrom_no) = autosome_no(&chrom_map, &region.chrom) {
            by_chrom[chrom_no].push(region.start..region.end);
        }
    }
    let fractions = by_chrom
        .into_iter()
        .enumerate()
        .flat_map(move |(chrom_no, ranges)| {
            let merged = merge_ranges(ranges);
            bins.chrom_bins(chrom_no)
                .iter()
                .map(move |bin| callable_fraction(bin, &merged))
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "{} of {} bins are fully callable",
        fractions
            .iter()
            .filter(|f| **f >= 1.0)
            .count()
            .separate_with_commas(),
        fractions.len().separate_with_commas()
    );

    CallabilityMask { fractions }
}

fn callable_fraction(bin: &GenomeBin, merged: &[Range<u64>]) -> f64 {
    let uncallable = covered_len(&bin.range(), merged);
    let callable = bin.len().saturating_sub(uncallable);
    (callable as f64 / bin.len() as f64).clamp(0.0, 1.0)
}

/// Load uncallable regions from a BED file; columns after the third are
/// ignored.
#[tracing::instrument]
pub fn load_uncallable_regions(path: &Path) -> Result<Vec<UncallableRegion>, anyhow::Error> {
    tracing::debug!("loading uncallable regions from {:?}", path);
    let before_loading = Instant::now();

    let mut reader = bed_reader(path)?;
    let mut result = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DensityError::data_shape(path, e))?;
        let field = |col: usize, name: &str| {
            record.get(col).ok_or_else(|| {
                DensityError::data_shape(path, format!("row {}: missing column {}", i + 1, name))
            })
        };
        let parse = |col: usize, name: &str| -> Result<u64, DensityError> {
            field(col, name)?.trim().parse::<u64>().map_err(|e| {
                DensityError::data_shape(path, format!("row {}: invalid {}: {}", i + 1, name, e))
            })
        };

        let chrom = field(0, "chromosome")?.to_owned();
        let start = parse(1, "start")?;
        let end = parse(2, "end")?;
        if end < start {
            return Err(DensityError::data_shape(
                path,
                format!("row {}: end {} before start {}", i + 1, end, start),
            )
            .into());
        }
        result.push(UncallableRegion { chrom, start, end });
    }

    tracing::debug!(
        "loaded {} uncallable regions in {:?}",
        result.len().separate_with_commas(),
        before_loading.elapsed()
    );
    Ok(result)
}
