//! Command line arguments shared by the commands that build a `DensityContext`.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::{
    common::expand_path,
    conf::{ConfOverrides, DensityConf},
    genome::{callable::load_uncallable_regions, load_chrom_sizes},
};

use super::DensityContext;

/// Arguments shared by the commands that need a `DensityContext`.
#[derive(Parser, Debug, Clone)]
pub struct SetupArgs {
    /// Path to BED file with autosome sizes (`chrom`, `0`, `length`).
    #[arg(long)]
    pub path_chrom_sizes: String,
    /// Path to BED file with uncallable regions.
    #[arg(long)]
    pub path_uncallable: String,
    /// Optional path to TOML configuration file.
    #[arg(long)]
    pub path_config: Option<PathBuf>,
    /// Bin size in bp, overrides the configuration (default: 1,000,000).
    #[arg(long)]
    pub bin_size: Option<u64>,
    /// Minimal callable fraction of a bin, overrides the configuration
    /// (default: 0.75).
    #[arg(long)]
    pub perc_cutoff: Option<f64>,
}

impl SetupArgs {
    /// Load the configuration with command line overrides.
    pub fn load_conf(&self, overrides: ConfOverrides) -> Result<DensityConf, anyhow::Error> {
        DensityConf::load(
            self.path_config.as_deref(),
            &ConfOverrides {
                bin_size: self.bin_size,
                perc_cutoff: self.perc_cutoff,
                ..overrides
            },
        )
    }

    /// Load inputs and build the `DensityContext`, errors are fatal.
    pub fn build_context(&self) -> Result<(DensityContext, DensityConf), anyhow::Error> {
        self.build_context_with(ConfOverrides::default())
    }

    pub fn build_context_with(
        &self,
        overrides: ConfOverrides,
    ) -> Result<(DensityContext, DensityConf), anyhow::Error> {
        let conf = self.load_conf(overrides)?;
        tracing::info!("  conf = {:?}", &conf);

        let before_setup = std::time::Instant::now();
        let chrom_sizes = load_chrom_sizes(Path::new(&expand_path(&self.path_chrom_sizes)))?;
        let uncallable = load_uncallable_regions(Path::new(&expand_path(&self.path_uncallable)))?;
        let ctx = DensityContext::new(&chrom_sizes, &uncallable, conf.bin_size, conf.perc_cutoff)?;
        tracing::info!(
            "built {} bins ({} callable) in {:?}",
            ctx.bins().len(),
            ctx.unmasked_count(),
            before_setup.elapsed()
        );

        Ok((ctx, conf))
    }
}
