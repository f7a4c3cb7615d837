//! Partitioning of the genome into fixed-width bins.

use std::ops::Range;

use crate::{common::AUTOSOME_COUNT, err::DensityError};

use super::ChromSizes;

/// A fixed-width genome window, the last one of a chromosome may be shorter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GenomeBin {
    /// Chromosome label as given in the chromosome size table.
    pub chrom: String,
    /// 0-based autosome number.
    #[serde(skip)]
    pub chrom_no: usize,
    /// Index of the bin within its chromosome.
    pub index: u32,
    /// 0-based start position.
    pub start: u64,
    /// End position (exclusive).
    pub end: u64,
}

impl GenomeBin {
    /// Length of the bin in base pairs.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Ordered bins of all chromosomes with lookup by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeBins {
    bin_size: u64,
    bins: Vec<GenomeBin>,
    /// For each autosome number, the range of its bins in `bins`.
    chrom_ranges: Vec<Option<Range<usize>>>,
}

impl GenomeBins {
    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GenomeBin> {
        self.bins.iter()
    }

    /// Bins of the chromosome with number `chrom_no`, empty if not present.
    pub fn chrom_bins(&self, chrom_no: usize) -> &[GenomeBin] {
        match self.chrom_ranges.get(chrom_no) {
            Some(Some(range)) => &self.bins[range.clone()],
            _ => &[],
        }
    }

    /// Offset into the flat bin sequence for the bin containing `pos` on
    /// `chrom_no`.
    ///
    /// Positions at or after the chromosome end are clamped to its last bin.
    /// Returns `None` if the chromosome has no bins.
    pub fn locate(&self, chrom_no: usize, pos: u64) -> Option<usize> {
        let range = self.chrom_ranges.get(chrom_no)?.as_ref()?;
        let index = usize::try_from(pos / self.bin_size).unwrap_or(usize::MAX);
        let last = range.end - range.start - 1;
        Some(range.start + std::cmp::min(index, last))
    }
}

impl<'a> IntoIterator for &'a GenomeBins {
    type Item = &'a GenomeBin;
    type IntoIter = std::slice::Iter<'a, GenomeBin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// Split every chromosome into `ceil(length / bin_size)` bins.
pub fn make_bins(chrom_sizes: &ChromSizes, bin_size: u64) -> Result<GenomeBins, DensityError> {
    if bin_size == 0 {
        return Err(DensityError::Configuration(String::from(
            "bin size must be positive",
        )));
    }
    if chrom_sizes.is_empty() {
        return Err(DensityError::Configuration(String::from(
            "chromosome size table is empty",
        )));
    }

    let mut bins = Vec::new();
    let mut chrom_ranges = vec![None; AUTOSOME_COUNT];
    for chrom in chrom_sizes.iter() {
        if chrom.length == 0 {
            return Err(DensityError::Configuration(format!(
                "chromosome {} has length 0",
                chrom.name
            )));
        }
        let first = bins.len();
        let count = chrom.length.div_ceil(bin_size);
        for index in 0..count {
            let start = index * bin_size;
            bins.push(GenomeBin {
                chrom: chrom.name.clone(),
                chrom_no: chrom.chrom_no,
                index: u32::try_from(index).map_err(|_| {
                    DensityError::Configuration(format!(
                        "too many bins on chromosome {} for bin size {}",
                        chrom.name, bin_size
                    ))
                })?,
                start,
                end: std::cmp::min(start + bin_size, chrom.length),
            });
        }
        chrom_ranges[chrom.chrom_no] = Some(first..bins.len());
    }

    tracing::debug!(
        "created {} bins of size {} on {} chromosomes",
        bins.len(),
        bin_size,
        chrom_sizes.len()
    );

    Ok(GenomeBins {
        bin_size,
        bins,
        chrom_ranges,
    })
}

#[cfg(test)]
pub(crate) mod test {
    use pretty_assertions::assert_eq;

    use super::make_bins;
    use crate::{err::DensityError, genome::ChromSizes};

    #[rstest::fixture]
    pub fn chrom_sizes() -> ChromSizes {
        ChromSizes::from_lengths(vec![("1", 2_500_000), ("2", 2_000_000)])
            .expect("valid chromosome sizes")
    }

    #[rstest::rstest]
    fn make_bins_example(chrom_sizes: ChromSizes) -> Result<(), anyhow::Error> {
        let bins = make_bins(&chrom_sizes, 1_000_000)?;

        assert_eq!(
            bins.iter()
                .map(|b| (b.chrom.as_str(), b.index, b.start, b.end))
                .collect::<Vec<_>>(),
            vec![
                ("1", 0, 0, 1_000_000),
                ("1", 1, 1_000_000, 2_000_000),
                ("1", 2, 2_000_000, 2_500_000),
                ("2", 0, 0, 1_000_000),
                ("2", 1, 1_000_000, 2_000_000),
            ]
        );

        Ok(())
    }

    #[rstest::rstest]
    #[case(1)]
    #[case(7)]
    #[case(333_333)]
    #[case(1_000_000)]
    #[case(2_000_000)]
    #[case(10_000_000)]
    fn make_bins_tile_chromosomes(
        chrom_sizes: ChromSizes,
        #[case] bin_size: u64,
    ) -> Result<(), anyhow::Error> {
        // Tiny bin sizes would produce millions of bins, use short chromosomes.
        let chrom_sizes = if bin_size < 1_000 {
            ChromSizes::from_lengths(vec![("1", 25), ("2", 20)])?
        } else {
            chrom_sizes
        };
        let bins = make_bins(&chrom_sizes, bin_size)?;

        for chrom in chrom_sizes.iter() {
            let chrom_bins = bins.chrom_bins(chrom.chrom_no);
            assert_eq!(chrom_bins.first().map(|b| b.start), Some(0));
            assert_eq!(chrom_bins.last().map(|b| b.end), Some(chrom.length));
            for pair in chrom_bins.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert_eq!(chrom_bins.iter().map(|b| b.len()).sum::<u64>(), chrom.length);
            assert_eq!(
                chrom_bins.len() as u64,
                chrom.length.div_ceil(bin_size)
            );
        }

        Ok(())
    }

    #[rstest::rstest]
    fn make_bins_zero_size(chrom_sizes: ChromSizes) {
        assert!(matches!(
            make_bins(&chrom_sizes, 0),
            Err(DensityError::Configuration(_))
        ));
    }

    #[rstest::rstest]
    #[case(0, 0, Some(0))]
    #[case(0, 999_999, Some(0))]
    #[case(0, 1_000_001, Some(1))]
    #[case(0, 2_499_999, Some(2))]
    #[case(0, 2_500_000, Some(2))]
    #[case(0, 9_000_000, Some(2))]
    #[case(1, 0, Some(3))]
    #[case(1, 1_500_000, Some(4))]
    #[case(2, 10, None)]
    #[case(30, 10, None)]
    fn locate(
        chrom_sizes: ChromSizes,
        #[case] chrom_no: usize,
        #[case] pos: u64,
        #[case] expected: Option<usize>,
    ) -> Result<(), anyhow::Error> {
        let bins = make_bins(&chrom_sizes, 1_000_000)?;

        assert_eq!(bins.locate(chrom_no, pos), expected);

        Ok(())
    }
}
