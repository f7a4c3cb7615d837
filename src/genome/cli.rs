//! Command line interface for "bins".

use std::path::PathBuf;

use clap::Parser;

use crate::{
    common::{io::tsv_writer, trace_rss_now},
    density::{cli::SetupArgs, DensityContext},
};

/// Command line arguments for `bins` sub command.
#[derive(Parser, Debug)]
#[command(about = "Write genome bins with their callable fraction", long_about = None)]
pub struct Args {
    /// Chromosome sizes, bin size, cutoff, and uncallable regions.
    #[command(flatten)]
    pub setup: SetupArgs,
    /// Path to output TSV file.
    #[arg(long)]
    pub path_output: PathBuf,
}

/// Write one line per bin of `ctx` to `writer`.
pub fn write_bins<W: std::io::Write>(
    ctx: &DensityContext,
    writer: &mut csv::Writer<W>,
) -> Result<(), anyhow::Error> {
    writer.write_record(["chrom", "index", "start", "end", "callable_fraction", "masked"])?;
    for (idx, bin) in ctx.bins().iter().enumerate() {
        writer.write_record([
            bin.chrom.clone(),
            bin.index.to_string(),
            bin.start.to_string(),
            bin.end.to_string(),
            format!("{:.4}", ctx.mask().fraction(idx)),
            ctx.is_masked(idx).to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Main entry point for the `bins` command.
pub fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("Starting `bins`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let (ctx, _) = args.setup.build_context()?;
    trace_rss_now();

    let mut writer = tsv_writer(&args.path_output)?;
    write_bins(&ctx, &mut writer)?;
    tracing::info!("wrote {} bins to {:?}", ctx.bins().len(), &args.path_output);

    Ok(())
}

#[cfg(test)]
mod test {
    use clap_verbosity_flag::Verbosity;

    use crate::{common, density::cli::SetupArgs};

    use super::Args;

    #[test]
    fn run_smoke() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let common_args = common::Args {
            verbose: Verbosity::new(0, 0),
        };
        let args = Args {
            setup: SetupArgs {
                path_chrom_sizes: String::from("tests/genome/chrom_sizes.bed"),
                path_uncallable: String::from("tests/genome/uncallable.bed"),
                path_config: None,
                bin_size: None,
                perc_cutoff: None,
            },
            path_output: tmp_dir.join("bins.tsv"),
        };

        super::run(&common_args, &args)?;

        let output = std::fs::read_to_string(tmp_dir.join("bins.tsv"))?;
        insta::assert_snapshot!(output, @r###"
        chrom	index	start	end	callable_fraction	masked
        1	0	0	1000000	0.1000	true
        1	1	1000000	2000000	1.0000	false
        1	2	2000000	2500000	1.0000	false
        2	0	0	1000000	1.0000	false
        2	1	1000000	2000000	0.0000	true
        "###);

        Ok(())
    }
}
