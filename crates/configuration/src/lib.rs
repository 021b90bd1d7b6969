use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    Config, DuplicatePolicy, Logging, MalformedFieldPolicy, Naming, Paths, Reconcile,
};

/// The configuration file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix of environment overrides, e.g. `MARKETBOOK__PATHS__INPUT_DIR`.
pub const ENV_PREFIX: &str = "MARKETBOOK";

/// Loads the application configuration.
///
/// Sources are layered in increasing precedence: built-in defaults, the TOML
/// file (`path`, or an optional `config.toml` in the working directory), then
/// `MARKETBOOK__*` environment variables. A `.env` file is loaded first if present.
/// The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();

    let file_source = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file_source)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

impl Config {
    /// Checks the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.input_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("paths.input_dir must not be empty".to_string()));
        }
        if self.paths.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("paths.output_dir must not be empty".to_string()));
        }
        if self.paths.input_dir == self.paths.output_dir {
            return Err(ConfigError::ValidationError(format!(
                "paths.input_dir and paths.output_dir must differ (both are '{}')",
                self.paths.input_dir.display()
            )));
        }

        let naming = [
            ("naming.source_suffix", &self.naming.source_suffix),
            ("naming.combined_file", &self.naming.combined_file),
            ("naming.daily_suffix", &self.naming.daily_suffix),
            ("naming.ticker_suffix", &self.naming.ticker_suffix),
        ];
        for (key, value) in naming {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!("{key} must not be empty")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marketbook.toml");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let (_dir, path) = write_config(
            r#"
            [paths]
            input_dir = "reports"
            output_dir = "out"
            "#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.paths.input_dir, PathBuf::from("reports"));
        assert_eq!(config.naming.combined_file, "all_trades.csv");
        assert_eq!(config.naming.excluded_prefix, "~$");
        assert_eq!(config.reconcile.duplicate_entries, DuplicatePolicy::LastWins);
        assert_eq!(config.reconcile.malformed_fields, MalformedFieldPolicy::Zero);
        assert!(config.reconcile.parallel_emit);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn policies_are_read_in_snake_case() {
        let (_dir, path) = write_config(
            r#"
            [paths]
            input_dir = "reports"
            output_dir = "out"

            [reconcile]
            force_full = true
            duplicate_entries = "reject"
            duplicate_source_dates = "reject"
            malformed_fields = "reject_row"
            parallel_emit = false
            "#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert!(config.reconcile.force_full);
        assert_eq!(config.reconcile.duplicate_entries, DuplicatePolicy::Reject);
        assert_eq!(config.reconcile.duplicate_source_dates, DuplicatePolicy::Reject);
        assert_eq!(config.reconcile.malformed_fields, MalformedFieldPolicy::RejectRow);
        assert!(!config.reconcile.parallel_emit);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn identical_input_and_output_dirs_are_rejected() {
        let (_dir, path) = write_config(
            r#"
            [paths]
            input_dir = "data"
            output_dir = "data"
            "#,
        );

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let mut config = Config::default();
        config.naming.daily_suffix = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("naming.daily_suffix"));
    }
}
