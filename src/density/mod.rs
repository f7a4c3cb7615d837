//! Breakpoint density per genome bin, masked by callability.

pub mod aggregate;
pub mod cli;

use indexmap::IndexSet;
use serde::Serialize;

use crate::{
    breaks::{BreakpointSet, Dataset},
    err::DensityError,
    genome::{
        bins::{make_bins, GenomeBins},
        callable::{compute_callable_fraction, CallabilityMask, UncallableRegion},
        ChromSizes,
    },
};

/// Read-only bins and callability shared by all density computations.
#[derive(Debug, Clone)]
pub struct DensityContext {
    bins: GenomeBins,
    mask: CallabilityMask,
    perc_cutoff: f64,
}

impl DensityContext {
    /// Build bins and callability mask.
    pub fn new(
        chrom_sizes: &ChromSizes,
        uncallable_regions: &[UncallableRegion],
        bin_size: u64,
        perc_cutoff: f64,
    ) -> Result<Self, DensityError> {
        if !(0.0..=1.0).contains(&perc_cutoff) {
            return Err(DensityError::Configuration(format!(
                "callable fraction cutoff must be in [0, 1] but was {}",
                perc_cutoff
            )));
        }
        let bins = make_bins(chrom_sizes, bin_size)?;
        let mask = compute_callable_fraction(&bins, uncallable_regions);
        Ok(Self {
            bins,
            mask,
            perc_cutoff,
        })
    }

    pub fn bins(&self) -> &GenomeBins {
        &self.bins
    }

    pub fn mask(&self) -> &CallabilityMask {
        &self.mask
    }

    pub fn perc_cutoff(&self) -> f64 {
        self.perc_cutoff
    }

    /// Whether the bin at offset `idx` is below the callability cutoff.
    pub fn is_masked(&self, idx: usize) -> bool {
        self.mask.fraction(idx) < self.perc_cutoff
    }

    /// Number of bins that report a count.
    pub fn unmasked_count(&self) -> usize {
        (0..self.bins.len()).filter(|idx| !self.is_masked(*idx)).count()
    }
}

/// Result shape of `break_density`, built from one value per bin.
pub trait DensityOutput: Sized {
    fn from_values(ctx: &DensityContext, values: Vec<Option<u32>>) -> Self;
}

/// Compact result: one value per bin in bin order, `None` for masked bins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DensityVector(pub Vec<Option<u32>>);

impl DensityVector {
    pub fn values(&self) -> &[Option<u32>] {
        &self.0
    }

    /// Sum over all unmasked bins.
    pub fn total(&self) -> u64 {
        self.0.iter().flatten().map(|c| *c as u64).sum()
    }
}

impl DensityOutput for DensityVector {
    fn from_values(_ctx: &DensityContext, values: Vec<Option<u32>>) -> Self {
        DensityVector(values)
    }
}

/// Density of one bin with its coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinnedDensityRecord {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub callable_fraction: f64,
    /// Breakpoint count, `None` if the bin is masked.
    pub count: Option<u32>,
}

/// Full result: one record per bin in bin order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BinnedDensity(pub Vec<BinnedDensityRecord>);

impl BinnedDensity {
    pub fn records(&self) -> &[BinnedDensityRecord] {
        &self.0
    }

    pub fn counts(&self) -> Vec<Option<u32>> {
        self.records().iter().map(|r| r.count).collect()
    }
}

impl DensityOutput for BinnedDensity {
    fn from_values(ctx: &DensityContext, values: Vec<Option<u32>>) -> Self {
        BinnedDensity(
            ctx.bins()
                .iter()
                .zip(values)
                .enumerate()
                .map(|(idx, (bin, count))| BinnedDensityRecord {
                    chrom: bin.chrom.clone(),
                    start: bin.start,
                    end: bin.end,
                    callable_fraction: ctx.mask().fraction(idx),
                    count,
                })
                .collect(),
        )
    }
}

/// Count the breakpoints of `sample_ids` in each bin of `ctx`.
///
/// Several sample identifiers are aggregated into the same bins.  Bins below
/// the callability cutoff are `None` whatever their count.  Fails with
/// `DensityError::InvalidSample` if none of `sample_ids` occurs in
/// `breakpoints`.
pub fn break_density<T, S>(
    ctx: &DensityContext,
    dataset: Dataset,
    breakpoints: &BreakpointSet,
    sample_ids: &[S],
) -> Result<T, DensityError>
where
    T: DensityOutput,
    S: AsRef<str>,
{
    let requested = sample_ids
        .iter()
        .map(|s| s.as_ref())
        .collect::<IndexSet<_>>();
    let (present, missing): (Vec<&str>, Vec<&str>) = requested
        .iter()
        .copied()
        .partition(|s| breakpoints.contains_sample(s));
    if present.is_empty() {
        return Err(DensityError::InvalidSample {
            dataset,
            samples: requested.iter().map(|s| s.to_string()).collect(),
        });
    }
    if !missing.is_empty() {
        tracing::debug!(
            "{} of {} samples not in {} breakpoints: {:?}",
            missing.len(),
            requested.len(),
            dataset,
            &missing
        );
    }

    let mut counts = vec![0u32; ctx.bins().len()];
    for sample_id in present {
        for locus in breakpoints.loci(sample_id).unwrap_or_default() {
            if let Some(idx) = ctx.bins().locate(locus.chrom_no, locus.coord) {
                counts[idx] += 1;
            }
        }
    }

    let values = counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| (!ctx.is_masked(idx)).then_some(count))
        .collect();
    Ok(T::from_values(ctx, values))
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;

    use super::{break_density, BinnedDensity, BinnedDensityRecord, DensityContext, DensityVector};
    use crate::{
        breaks::{Breakpoint, BreakpointSet, Dataset},
        err::DensityError,
        genome::{callable::UncallableRegion, ChromSizes},
    };

    /// chr1 of 2.5Mb and chr2 of 2Mb, chr1:0-900k uncallable.
    #[rstest::fixture]
    pub fn ctx() -> DensityContext {
        let chrom_sizes = ChromSizes::from_lengths(vec![("1", 2_500_000), ("2", 2_000_000)])
            .expect("valid chromosome sizes");
        let uncallable = vec![UncallableRegion {
            chrom: String::from("1"),
            start: 0,
            end: 900_000,
        }];
        DensityContext::new(&chrom_sizes, &uncallable, 1_000_000, 0.75).expect("valid context")
    }

    pub fn bp(sample_id: &str, chrom: &str, coord: u64) -> Breakpoint {
        Breakpoint {
            sample_id: sample_id.to_owned(),
            chrom: chrom.to_owned(),
            coord,
        }
    }

    #[rstest::fixture]
    pub fn breakpoints() -> BreakpointSet {
        BreakpointSet::from_breakpoints(vec![
            bp("A", "1", 1_000_001),
            bp("A", "1", 10),
            bp("A", "1", 2_500_000),
            bp("A", "2", 1_999_999),
            bp("A", "X", 5),
            bp("B", "1", 1_500_000),
            bp("C", "chr2", 0),
        ])
    }

    #[rstest::rstest]
    fn break_density_single_sample(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let result: DensityVector = break_density(&ctx, Dataset::Sv, &breakpoints, &["A"])?;

        assert_eq!(result.values(), &[None, Some(1), Some(1), Some(0), Some(1)]);
        assert_eq!(result.total(), 3);

        Ok(())
    }

    #[rstest::rstest]
    fn break_density_group(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let result: DensityVector =
            break_density(&ctx, Dataset::Sv, &breakpoints, &["B", "C", "B"])?;

        assert_eq!(result.values(), &[None, Some(1), Some(0), Some(1), Some(0)]);

        Ok(())
    }

    #[rstest::rstest]
    fn break_density_ignores_unknown_in_selection(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let result: DensityVector =
            break_density(&ctx, Dataset::Sv, &breakpoints, &["B", "unknown"])?;

        assert_eq!(result.values(), &[None, Some(1), Some(0), Some(0), Some(0)]);

        Ok(())
    }

    #[rstest::rstest]
    #[case(vec!["unknown"])]
    #[case(vec![])]
    fn break_density_invalid_sample(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
        #[case] sample_ids: Vec<&str>,
    ) {
        let result: Result<DensityVector, _> =
            break_density(&ctx, Dataset::Cnv, &breakpoints, &sample_ids);

        assert_eq!(
            result,
            Err(DensityError::InvalidSample {
                dataset: Dataset::Cnv,
                samples: sample_ids.iter().map(|s| s.to_string()).collect(),
            })
        );
    }

    #[rstest::rstest]
    fn break_density_binned(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let result: BinnedDensity = break_density(&ctx, Dataset::Sv, &breakpoints, &["A"])?;

        let record = |chrom: &str, start: u64, end: u64, callable_fraction: f64, count| {
            BinnedDensityRecord {
                chrom: chrom.to_owned(),
                start,
                end,
                callable_fraction,
                count,
            }
        };
        assert_eq!(
            result.records(),
            &[
                record("1", 0, 1_000_000, 0.1, None),
                record("1", 1_000_000, 2_000_000, 1.0, Some(1)),
                record("1", 2_000_000, 2_500_000, 1.0, Some(1)),
                record("2", 0, 1_000_000, 1.0, Some(0)),
                record("2", 1_000_000, 2_000_000, 1.0, Some(1)),
            ]
        );
        assert_eq!(result.counts(), vec![None, Some(1), Some(1), Some(0), Some(1)]);

        Ok(())
    }

    #[rstest::rstest]
    fn break_density_masked_even_with_breakpoints(
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let chrom_sizes = ChromSizes::from_lengths(vec![("1", 2_500_000), ("2", 2_000_000)])?;
        let uncallable = vec![UncallableRegion {
            chrom: String::from("chr1"),
            start: 0,
            end: 2_500_000,
        }];
        let ctx = DensityContext::new(&chrom_sizes, &uncallable, 1_000_000, 0.75)?;

        let result: DensityVector = break_density(&ctx, Dataset::Sv, &breakpoints, &["A", "B"])?;

        assert_eq!(result.values(), &[None, None, None, Some(0), Some(1)]);

        Ok(())
    }

    #[rstest::rstest]
    #[case(250_000, Some(1))]
    #[case(250_001, None)]
    fn break_density_at_cutoff(
        #[case] uncallable_end: u64,
        #[case] expected: Option<u32>,
    ) -> Result<(), anyhow::Error> {
        let chrom_sizes = ChromSizes::from_lengths(vec![("1", 2_000_000)])?;
        let uncallable = vec![UncallableRegion {
            chrom: String::from("1"),
            start: 0,
            end: uncallable_end,
        }];
        let ctx = DensityContext::new(&chrom_sizes, &uncallable, 1_000_000, 0.75)?;
        let breakpoints = BreakpointSet::from_breakpoints(vec![bp("A", "1", 500_000)]);

        let result: DensityVector = break_density(&ctx, Dataset::Sv, &breakpoints, &["A"])?;

        assert_eq!(result.values(), &[expected, Some(0)]);

        Ok(())
    }

    #[rstest::rstest]
    fn break_density_idempotent(
        ctx: DensityContext,
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let first: BinnedDensity = break_density(&ctx, Dataset::Sv, &breakpoints, &["A", "C"])?;
        let second: BinnedDensity = break_density(&ctx, Dataset::Sv, &breakpoints, &["A", "C"])?;

        assert_eq!(first, second);

        Ok(())
    }

    #[rstest::rstest]
    fn break_density_sums_per_chromosome(
        breakpoints: BreakpointSet,
    ) -> Result<(), anyhow::Error> {
        let chrom_sizes = ChromSizes::from_lengths(vec![("1", 2_500_000), ("2", 2_000_000)])?;
        let ctx = DensityContext::new(&chrom_sizes, &[], 300_000, 0.75)?;

        let result: BinnedDensity = break_density(&ctx, Dataset::Sv, &breakpoints, &["A"])?;
        let sum_chrom = |chrom: &str| -> u32 {
            result
                .records()
                .iter()
                .filter(|r| r.chrom == chrom)
                .filter_map(|r| r.count)
                .sum()
        };

        assert_eq!(sum_chrom("1"), 3);
        assert_eq!(sum_chrom("2"), 1);

        Ok(())
    }

    #[rstest::rstest]
    #[case(1.5)]
    #[case(-0.5)]
    fn context_invalid_cutoff(#[case] perc_cutoff: f64) -> Result<(), anyhow::Error> {
        let chrom_sizes = ChromSizes::from_lengths(vec![("1", 100)])?;

        assert!(matches!(
            DensityContext::new(&chrom_sizes, &[], 10, perc_cutoff),
            Err(DensityError::Configuration(_))
        ));

        Ok(())
    }
}
