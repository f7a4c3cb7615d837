//! Genome model: chromosome sizes, fixed-width bins, and callability.

pub mod bins;
pub mod callable;
pub mod cli;
pub mod intervals;

use std::{path::Path, time::Instant};

use thousands::Separable;

use crate::{
    common::{autosome_no, build_chrom_map, io::bed_reader, AUTOSOME_COUNT},
    err::DensityError,
};

/// Length of a single autosome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChromSize {
    /// Chromosome label as given in the input.
    pub name: String,
    /// 0-based autosome number, defines the canonical order.
    pub chrom_no: usize,
    /// Length in base pairs.
    pub length: u64,
}

/// Autosome lengths in canonical order 1..22.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChromSizes {
    chroms: Vec<ChromSize>,
}

impl ChromSizes {
    /// Build from `(name, length)` pairs.
    ///
    /// Non-autosomal contigs are dropped.  Fails on duplicates, non-positive
    /// lengths, and if no autosome remains.
    pub fn from_lengths<S, I>(entries: I) -> Result<Self, DensityError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, i64)>,
    {
        let chrom_map = build_chrom_map();
        let mut slots: Vec<Option<ChromSize>> = vec![None; AUTOSOME_COUNT];
        for (name, length) in entries {
            let name = name.as_ref();
            let Some(chrom_no) = autosome_no(&chrom_map, name) else {
                tracing::debug!("skipping non-autosomal contig {:?}", name);
                continue;
            };
            if length <= 0 {
                return Err(DensityError::Configuration(format!(
                    "chromosome {} has non-positive length {}",
                    name, length
                )));
            }
            if let Some(prev) = &slots[chrom_no] {
                return Err(DensityError::Configuration(format!(
                    "chromosome {} given twice (also as {})",
                    name, prev.name
                )));
            }
            slots[chrom_no] = Some(ChromSize {
                name: name.to_owned(),
                chrom_no,
                length: length as u64,
            });
        }

        let chroms = slots.into_iter().flatten().collect::<Vec<_>>();
        if chroms.is_empty() {
            return Err(DensityError::Configuration(String::from(
                "chromosome size table contains no autosomes",
            )));
        }
        Ok(Self { chroms })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChromSize> {
        self.chroms.iter()
    }

    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    /// Sum of all autosome lengths.
    pub fn total_length(&self) -> u64 {
        self.chroms.iter().map(|c| c.length).sum()
    }
}

/// Row of the chromosome size file.
mod input {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Record {
        /// Chromosome name
        pub chromosome: String,
        /// 0-based begin position, must be 0
        pub start: i64,
        /// End position, the chromosome length
        pub end: i64,
    }
}

/// Load chromosome sizes from a BED-like `chromosome, 0, length` file.
#[tracing::instrument]
pub fn load_chrom_sizes(path: &Path) -> Result<ChromSizes, anyhow::Error> {
    tracing::debug!("loading chromosome sizes from {:?}", path);
    let before_loading = Instant::now();

    let mut reader = bed_reader(path)?;
    let mut entries = Vec::new();
    for (i, record) in reader.deserialize::<input::Record>().enumerate() {
        let record = record
            .map_err(|e| DensityError::data_shape(path, format!("row {}: {}", i + 1, e)))?;
        if record.start != 0 {
            return Err(DensityError::Configuration(format!(
                "chromosome {} must start at 0 but starts at {}",
                record.chromosome, record.start
            ))
            .into());
        }
        entries.push((record.chromosome, record.end));
    }
    let result = ChromSizes::from_lengths(entries)?;

    tracing::debug!(
        "loaded {} autosomes ({} bp) from {:?} in {:?}",
        result.len(),
        result.total_length().separate_with_commas(),
        path,
        before_loading.elapsed()
    );
    Ok(result)
}
