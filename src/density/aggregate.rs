//! Density over all breakpoint datasets at once.

use indexmap::IndexMap;

use crate::{
    breaks::{Dataset, Datasets},
    err::DensityError,
};

use super::{break_density, DensityContext, DensityOutput};

/// Run `break_density` for each loaded dataset with the same samples.
///
/// Results are keyed by dataset, in dataset order.  A failure for one dataset
/// does not affect the others.
pub fn all_break_density<T, S>(
    ctx: &DensityContext,
    datasets: &Datasets,
    sample_ids: &[S],
) -> IndexMap<Dataset, Result<T, DensityError>>
where
    T: DensityOutput,
    S: AsRef<str>,
{
    datasets
        .iter()
        .map(|(dataset, breakpoints)| {
            (dataset, break_density(ctx, dataset, breakpoints, sample_ids))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::all_break_density;
    use crate::{
        breaks::{BreakpointSet, Dataset, Datasets},
        density::{
            test::{bp, ctx},
            BinnedDensity, DensityContext, DensityVector,
        },
        err::DensityError,
    };

    #[rstest::fixture]
    fn datasets() -> Datasets {
        let mut datasets = Datasets::new();
        datasets.insert(
            Dataset::Sv,
            BreakpointSet::from_breakpoints(vec![bp("A", "1", 1_200_000)]),
        );
        datasets.insert(
            Dataset::Intersection,
            BreakpointSet::from_breakpoints(vec![bp("A", "2", 10), bp("B", "1", 2_000_000)]),
        );
        datasets.insert(
            Dataset::Cnv,
            BreakpointSet::from_breakpoints(vec![bp("B", "1", 1_000_000)]),
        );
        datasets
    }

    #[rstest::rstest]
    fn all_break_density_vector(ctx: DensityContext, datasets: Datasets) {
        let result = all_break_density::<DensityVector, _>(&ctx, &datasets, &["A"]);

        assert_eq!(
            result.keys().copied().collect::<Vec<_>>(),
            vec![Dataset::Intersection, Dataset::Cnv, Dataset::Sv]
        );
        assert_eq!(
            result[&Dataset::Intersection],
            Ok(DensityVector(vec![None, Some(0), Some(0), Some(1), Some(0)]))
        );
        assert_eq!(
            result[&Dataset::Cnv],
            Err(DensityError::InvalidSample {
                dataset: Dataset::Cnv,
                samples: vec![String::from("A")],
            })
        );
        assert_eq!(
            result[&Dataset::Sv],
            Ok(DensityVector(vec![None, Some(1), Some(0), Some(0), Some(0)]))
        );
    }

    #[rstest::rstest]
    fn all_break_density_group(ctx: DensityContext, datasets: Datasets) {
        let result = all_break_density::<BinnedDensity, _>(&ctx, &datasets, &["A", "B"]);

        let counts = result
            .iter()
            .map(|(dataset, density)| {
                (
                    *dataset,
                    density.as_ref().map(|d| d.counts()).unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(
            counts,
            vec![
                (
                    Dataset::Intersection,
                    vec![None, Some(0), Some(1), Some(1), Some(0)]
                ),
                (Dataset::Cnv, vec![None, Some(1), Some(0), Some(0), Some(0)]),
                (Dataset::Sv, vec![None, Some(1), Some(0), Some(0), Some(0)]),
            ]
        );
    }
}
