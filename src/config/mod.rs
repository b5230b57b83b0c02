pub mod cli;
pub mod package_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::coordinator::ExecutionMode;
    use crate::core::scanner::DEFAULT_MAX_DEPTH;
    use crate::utils::error::{FshError, Result};
    use crate::utils::validation::{validate_path, validate_positive_number, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "fsh-workbench")]
    #[command(about = "Compile FHIR Shorthand sources into FHIR JSON resources")]
    pub struct CliConfig {
        #[arg(long, default_value = ".", help = "Project directory to scan for .fsh files")]
        pub input: String,

        #[arg(long, help = "Directory of edited .fsh files that override the input tree")]
        pub staging: Option<String>,

        #[arg(long, default_value = "./fsh-generated")]
        pub output: String,

        #[arg(long, default_value = "auto", help = "Engine selection: auto, native or fallback")]
        pub mode: ExecutionMode,

        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        pub max_depth: usize,

        #[arg(long, help = "Also write all resources into fsh-generated.zip")]
        pub zip: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("input", &self.input)?;
            validate_path("output", &self.output)?;
            if let Some(staging) = &self.staging {
                validate_path("staging", staging)?;
                if !std::path::Path::new(staging).is_dir() {
                    return Err(FshError::ConfigError {
                        message: format!("staging path {} is not a directory", staging),
                    });
                }
            }
            validate_positive_number("max_depth", self.max_depth, 1)?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = CliConfig::parse_from(["fsh-workbench"]);
            assert_eq!(config.input, ".");
            assert_eq!(config.mode, ExecutionMode::Auto);
            assert_eq!(config.max_depth, 5);
            assert!(config.staging.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_mode_and_depth_flags() {
            let config = CliConfig::parse_from([
                "fsh-workbench",
                "--mode",
                "fallback",
                "--max-depth",
                "0",
                "--staging",
                "edits",
            ]);
            assert_eq!(config.mode, ExecutionMode::Fallback);
            assert_eq!(config.staging.as_deref(), Some("edits"));
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_staging_must_be_a_directory() {
            let dir = tempfile::TempDir::new().unwrap();
            let existing = dir.path().to_string_lossy().into_owned();
            let config = CliConfig::parse_from(["fsh-workbench", "--staging", existing.as_str()]);
            assert!(config.validate().is_ok());

            let missing = dir.path().join("missing").to_string_lossy().into_owned();
            let config = CliConfig::parse_from(["fsh-workbench", "--staging", missing.as_str()]);
            let err = config.validate().unwrap_err();
            assert!(matches!(err, FshError::ConfigError { .. }));
        }

        #[test]
        fn test_unknown_mode_is_rejected() {
            assert!(CliConfig::try_parse_from(["fsh-workbench", "--mode", "turbo"]).is_err());
        }
    }
}
