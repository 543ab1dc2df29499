use crate::aggregate::RangePolicy;
use crate::scale::{MarkerScaler, DEFAULT_BASE_OFFSET_M};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "zeitung-atlas.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    pub input: InputConfig,
    pub range: RangeConfig,
    pub markers: MarkerConfig,
    pub view: ViewConfig,
    /// Log destination for the interactive view
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Yearly place index JSON
    pub places: PathBuf,
    /// Directory holding Natural Earth GeoJSON files
    pub data_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            places: PathBuf::from("places_by_year.json"),
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct RangeConfig {
    /// Lower bound of the year-range control
    pub min_year: i32,
    /// Upper bound of the year-range control
    pub max_year: i32,
    pub policy: RangePolicy,
    /// Fail on years missing from the index instead of skipping them
    pub strict: bool,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_year: 1802,
            max_year: 1888,
            policy: RangePolicy::default(),
            strict: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    /// Radius floor in meters
    pub base_offset_m: f64,
    pub show_labels: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            base_offset_m: DEFAULT_BASE_OFFSET_M,
            show_labels: true,
        }
    }
}

impl MarkerConfig {
    pub fn scaler(&self) -> MarkerScaler {
        MarkerScaler::new(self.base_offset_m)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center_lon: 15.0,
            center_lat: 50.0,
            zoom: 4.0,
        }
    }
}

impl AtlasConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Load `path` if given, else the default file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AtlasConfig = toml::from_str(content).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.range.min_year > self.range.max_year {
            bail!(
                "range.min_year ({}) is after range.max_year ({})",
                self.range.min_year,
                self.range.max_year
            );
        }
        if !self.markers.base_offset_m.is_finite() || self.markers.base_offset_m < 0.0 {
            bail!("markers.base_offset_m must be a non-negative number, got {}", self.markers.base_offset_m);
        }
        if !self.view.zoom.is_finite() || self.view.zoom <= 0.0 {
            bail!("view.zoom must be positive, got {}", self.view.zoom);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::from_toml("").unwrap();
        assert_eq!(config.range.min_year, 1802);
        assert_eq!(config.range.max_year, 1888);
        assert_eq!(config.range.policy, RangePolicy::Inclusive);
        assert!(!config.range.strict);
        assert_eq!(config.markers.base_offset_m, 10_000.0);
        assert_eq!(config.input.places, PathBuf::from("places_by_year.json"));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_partial_override() {
        let config = AtlasConfig::from_toml(
            r#"
            log_file = "atlas.log"

            [input]
            places = "fixtures/places.json"

            [range]
            policy = "exclusive"
            strict = true

            [markers]
            base_offset_m = 5000.0
            "#,
        )
        .unwrap();

        assert_eq!(config.input.places, PathBuf::from("fixtures/places.json"));
        assert_eq!(config.input.data_dir, PathBuf::from("data"));
        assert_eq!(config.range.policy, RangePolicy::Exclusive);
        assert!(config.range.strict);
        assert_eq!(config.markers.scaler().base_offset(), 5000.0);
        assert_eq!(config.log_file, Some(PathBuf::from("atlas.log")));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AtlasConfig::from_toml("[range]\nmin_year = 1900\nmax_year = 1800").is_err());
        assert!(AtlasConfig::from_toml("[markers]\nbase_offset_m = -1.0").is_err());
        assert!(AtlasConfig::from_toml("[range]\npolicy = \"sideways\"").is_err());
        assert!(AtlasConfig::from_toml("[mystery]\nkey = 1").is_err());
    }
}
