//! Configuration module.
//!
//! Handles loading, validating, and merging `taper.toml`. Stock defaults are
//! overridden by a user config file placed in the working directory (or
//! passed with `--config`).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [workspace]
//! root = "public/uploads"   # Upload holding area; archives land here
//! isolate_batches = true    # Give every batch its own directory
//!
//! [output]
//! quality = 80              # JPEG quality (1-100)
//!
//! [archive]
//! compression_level = 9     # Deflate level (0-9)
//!
//! [limits]
//! max_batch = 200           # Files accepted per batch
//!
//! [retention]
//! max_age_hours = 24        # `taper sweep` removes older archives/batches
//!
//! [log]
//! activity_log = "log.txt"  # Append-only activity log
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [output]
//! quality = 92
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "taper.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `taper.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaperConfig {
    /// Where uploads, resized outputs and archives live.
    pub workspace: WorkspaceConfig,
    /// Encoding of resized outputs.
    pub output: OutputConfig,
    /// Archive packaging.
    pub archive: ArchiveConfig,
    /// Limits enforced when a batch is received.
    pub limits: LimitsConfig,
    /// Retention policy for `taper sweep`.
    pub retention: RetentionConfig,
    /// Activity log location.
    pub log: LogConfig,
}

impl TaperConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.archive.compression_level > 9 {
            return Err(ConfigError::Validation(
                "archive.compression_level must be 0-9".into(),
            ));
        }
        if self.limits.max_batch == 0 {
            return Err(ConfigError::Validation(
                "limits.max_batch must be at least 1".into(),
            ));
        }
        if self.retention.max_age_hours == 0 {
            return Err(ConfigError::Validation(
                "retention.max_age_hours must be at least 1".into(),
            ));
        }
        if self.workspace.root.trim().is_empty() {
            return Err(ConfigError::Validation(
                "workspace.root must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Working directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Upload holding area. Archives are written directly inside it.
    pub root: String,
    /// Allocate a fresh directory per batch instead of sharing
    /// `<root>` and `<root>/resized` between all requests.
    pub isolate_batches: bool,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: "public/uploads".to_string(),
            isolate_batches: true,
        }
    }
}

impl WorkspaceConfig {
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

/// Archive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Deflate level, 0 (store) to 9 (smallest).
    pub compression_level: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: crate::archive::MAX_COMPRESSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum number of files in one batch.
    pub max_batch: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch: crate::workspace::DEFAULT_MAX_BATCH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Archives and batch directories older than this are swept.
    pub max_age_hours: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { max_age_hours: 24 }
    }
}

impl RetentionConfig {
    /// Saturates instead of overflowing for absurdly large hour counts.
    pub fn max_age(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.max_age_hours.saturating_mul(3600))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Path of the append-only activity log.
    pub activity_log: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            activity_log: "log.txt".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(TaperConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<TaperConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: TaperConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `taper.toml` from the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<TaperConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILENAME))
}

/// Load an explicit config file; a missing file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<TaperConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `taper.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Taper Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as taper.toml in the directory you run taper from,
# or point to it with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Working directories
# ---------------------------------------------------------------------------
[workspace]
# Upload holding area. Resized images go to <root>/resized (shared) or
# <root>/batches/<id>/resized (isolated); archives land directly in <root>.
root = "public/uploads"

# Give every batch its own directory so concurrent runs never sweep each
# other's outputs into their archives. Successful batches are removed once
# archived; failed ones are kept for inspection until clean or sweep.
isolate_batches = true

# ---------------------------------------------------------------------------
# Resized output
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Archive
# ---------------------------------------------------------------------------
[archive]
# Deflate level: 0 stores files uncompressed, 9 compresses hardest.
compression_level = 9

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Maximum number of files accepted in one batch.
max_batch = 200

# ---------------------------------------------------------------------------
# Retention
# ---------------------------------------------------------------------------
[retention]
# `taper sweep` removes archives and batch directories older than this.
max_age_hours = 24

# ---------------------------------------------------------------------------
# Activity log
# ---------------------------------------------------------------------------
[log]
# Append-only log of batches, computed widths and errors.
activity_log = "log.txt"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = TaperConfig::default();
        assert_eq!(config.workspace.root, "public/uploads");
        assert!(config.workspace.isolate_batches);
        assert_eq!(config.output.quality, 80);
        assert_eq!(config.archive.compression_level, 9);
        assert_eq!(config.limits.max_batch, 200);
        assert_eq!(config.retention.max_age_hours, 24);
        assert_eq!(config.log.activity_log, "log.txt");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[output]
quality = 95
"#;
        let config: TaperConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.output.quality, 95);
        // Default values preserved
        assert_eq!(config.archive.compression_level, 9);
        assert_eq!(config.workspace.root, "public/uploads");
    }

    #[test]
    fn retention_max_age_in_seconds() {
        let config = RetentionConfig { max_age_hours: 2 };
        assert_eq!(config.max_age().as_secs(), 7200);
    }

    #[test]
    fn retention_max_age_saturates() {
        let config = RetentionConfig {
            max_age_hours: u64::MAX,
        };
        assert_eq!(config.max_age().as_secs(), u64::MAX);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output.quality, 80);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[workspace]
root = "/var/lib/taper"
isolate_batches = false

[limits]
max_batch = 12
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.workspace.root_path(), PathBuf::from("/var/lib/taper"));
        assert!(!config.workspace.isolate_batches);
        assert_eq!(config.limits.max_batch, 12);
        // Unspecified values should be defaults
        assert_eq!(config.output.quality, 80);
    }

    #[test]
    fn load_config_file_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "[archive]\ncompression_level = 1\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.archive.compression_level, 1);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 80"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 60"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(60));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[workspace]
root = "public/uploads"
isolate_batches = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[workspace]
isolate_batches = false
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let ws = merged.get("workspace").unwrap();
        assert_eq!(ws.get("isolate_batches").unwrap().as_bool(), Some(false));
        assert_eq!(ws.get("root").unwrap().as_str(), Some("public/uploads"));
    }

    // =========================================================================
    // Unknown key rejection and validation
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[output]
qualty = 90
"#;
        let result: Result<TaperConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<TaperConfig, _> = toml::from_str("[thumbnails]\nsize = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(TaperConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = TaperConfig::default();
        config.output.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.output.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.output.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_compression_level() {
        let mut config = TaperConfig::default();
        config.archive.compression_level = 10;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_limits() {
        let mut config = TaperConfig::default();
        config.limits.max_batch = 0;
        assert!(config.validate().is_err());

        let mut config = TaperConfig::default();
        config.retention.max_age_hours = 0;
        assert!(config.validate().is_err());

        let mut config = TaperConfig::default();
        config.workspace.root = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[output]\nquality = 200\n").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: TaperConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = TaperConfig::default();
        assert_eq!(config.workspace.root, defaults.workspace.root);
        assert_eq!(config.workspace.isolate_batches, defaults.workspace.isolate_batches);
        assert_eq!(config.output.quality, defaults.output.quality);
        assert_eq!(config.archive.compression_level, defaults.archive.compression_level);
        assert_eq!(config.limits.max_batch, defaults.limits.max_batch);
        assert_eq!(config.retention.max_age_hours, defaults.retention.max_age_hours);
        assert_eq!(config.log.activity_log, defaults.log.activity_log);
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        for section in ["workspace", "output", "archive", "limits", "retention", "log"] {
            assert!(val.get(section).is_some(), "missing [{section}]");
        }
    }
}
