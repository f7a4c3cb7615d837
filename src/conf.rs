//! Run configuration, optionally read from a TOML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::DensityError;

/// Default bin width in base pairs.
pub const DEFAULT_BIN_SIZE: u64 = 1_000_000;
/// Default minimal callable fraction for a bin to report a count.
pub const DEFAULT_PERC_CUTOFF: f64 = 0.75;

/// Configuration of the density computation.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct DensityConf {
    /// Width of the genome bins.
    pub bin_size: u64,
    /// Minimal callable fraction; bins below are reported as NA.
    pub perc_cutoff: f64,
    /// Experimental strategies whose samples are left out of histology groups.
    pub exclude_strategies: Vec<String>,
}

impl Default for DensityConf {
    fn default() -> Self {
        Self {
            bin_size: DEFAULT_BIN_SIZE,
            perc_cutoff: DEFAULT_PERC_CUTOFF,
            exclude_strategies: vec![String::from("RNA-Seq")],
        }
    }
}

/// Values given on the command line, these take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct ConfOverrides {
    pub bin_size: Option<u64>,
    pub perc_cutoff: Option<f64>,
    pub exclude_strategies: Option<Vec<String>>,
}

impl DensityConf {
    /// Load configuration from `path`, or the defaults if `None`, then apply
    /// `overrides` and validate.
    pub fn load(
        path: Option<&Path>,
        overrides: &ConfOverrides,
    ) -> Result<Self, anyhow::Error> {
        let mut conf = match path {
            Some(path) => {
                tracing::debug!("reading configuration from {:?}", path);
                let toml_str = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("error reading {:?}: {}", path, e))?;
                toml::from_str::<DensityConf>(&toml_str).map_err(|e| {
                    DensityError::Configuration(format!("could not parse {:?}: {}", path, e))
                })?
            }
            None => DensityConf::default(),
        };

        if let Some(bin_size) = overrides.bin_size {
            conf.bin_size = bin_size;
        }
        if let Some(perc_cutoff) = overrides.perc_cutoff {
            conf.perc_cutoff = perc_cutoff;
        }
        if let Some(exclude_strategies) = &overrides.exclude_strategies {
            conf.exclude_strategies = exclude_strategies.clone();
        }

        conf.validate()?;
        Ok(conf)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), DensityError> {
        if self.bin_size == 0 {
            return Err(DensityError::Configuration(String::from(
                "bin size must be positive",
            )));
        }
        if !(0.0..=1.0).contains(&self.perc_cutoff) {
            return Err(DensityError::Configuration(format!(
                "callable fraction cutoff must be in [0, 1] but was {}",
                self.perc_cutoff
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{ConfOverrides, DensityConf};
    use crate::err::DensityError;

    #[test]
    fn test_parse_config_full() -> Result<(), anyhow::Error> {
        let toml_path = "tests/conf/full.toml";
        let toml_str = std::fs::read_to_string(toml_path)?;
        let toml_data: DensityConf = toml::from_str(&toml_str)?;

        assert_eq!(
            toml_data,
            DensityConf {
                bin_size: 500_000,
                perc_cutoff: 0.5,
                exclude_strategies: vec![String::from("RNA-Seq"), String::from("Targeted")],
            }
        );

        Ok(())
    }

    #[test]
    fn test_parse_config_partial_uses_defaults() -> Result<(), anyhow::Error> {
        let toml_data: DensityConf = toml::from_str("bin_size = 10\n")?;

        assert_eq!(
            toml_data,
            DensityConf {
                bin_size: 10,
                ..Default::default()
            }
        );

        Ok(())
    }

    #[test]
    fn load_applies_overrides() -> Result<(), anyhow::Error> {
        let conf = DensityConf::load(
            Some(std::path::Path::new("tests/conf/full.toml")),
            &ConfOverrides {
                perc_cutoff: Some(0.9),
                ..Default::default()
            },
        )?;

        assert_eq!(conf.bin_size, 500_000);
        assert!(float_cmp::approx_eq!(f64, conf.perc_cutoff, 0.9, ulps = 2));

        Ok(())
    }

    #[rstest::rstest]
    #[case(0, 0.75)]
    #[case(1_000_000, 1.5)]
    #[case(1_000_000, -0.1)]
    fn validate_fails(#[case] bin_size: u64, #[case] perc_cutoff: f64) {
        let conf = DensityConf {
            bin_size,
            perc_cutoff,
            ..Default::default()
        };

        assert!(matches!(
            conf.validate(),
            Err(DensityError::Configuration(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_keys() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join("conf.toml");
        std::fs::write(&path, "bin_sz = 10\n")?;

        let err = DensityConf::load(Some(&path), &ConfOverrides::default())
            .expect_err("must fail");

        assert!(matches!(
            err.downcast_ref::<DensityError>(),
            Some(DensityError::Configuration(_))
        ));

        Ok(())
    }
}
