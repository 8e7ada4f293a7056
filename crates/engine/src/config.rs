use std::path::Path;

use serde::Deserialize;

use crate::error::ShipcheckError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Engine policy. The defaults reproduce the standard ship/no-ship rules, so
/// an empty TOML document is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Treat WARNING entries as FAIL when computing the overall verdict.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub files: FileLimits,
}

// ---------------------------------------------------------------------------
// File counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLimits {
    /// Exact number of traveler documents required.
    #[serde(default = "default_one")]
    pub traveler: usize,
    /// Exact number of hardware photos required.
    #[serde(default = "default_one")]
    pub image: usize,
    #[serde(default = "default_one")]
    pub min_boms: usize,
    #[serde(default = "default_max_boms")]
    pub max_boms: usize,
}

fn default_one() -> usize {
    1
}

fn default_max_boms() -> usize {
    4
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            traveler: 1,
            image: 1,
            min_boms: 1,
            max_boms: 4,
        }
    }
}

impl ValidationConfig {
    /// Strict-mode config with default file limits.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ShipcheckError> {
        let config: ValidationConfig =
            toml::from_str(input).map_err(|e| ShipcheckError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ShipcheckError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ShipcheckError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&input)
    }

    pub fn validate(&self) -> Result<(), ShipcheckError> {
        let f = &self.files;
        if f.traveler == 0 {
            return Err(ShipcheckError::ConfigValidation(
                "files.traveler must be at least 1".into(),
            ));
        }
        if f.image == 0 {
            return Err(ShipcheckError::ConfigValidation(
                "files.image must be at least 1".into(),
            ));
        }
        if f.min_boms == 0 {
            return Err(ShipcheckError::ConfigValidation(
                "files.min_boms must be at least 1".into(),
            ));
        }
        if f.min_boms > f.max_boms {
            return Err(ShipcheckError::ConfigValidation(format!(
                "files.min_boms ({}) exceeds files.max_boms ({})",
                f.min_boms, f.max_boms
            )));
        }
        Ok(())
    }
}
