//! Per-model import settings.
//!
//! Settings live in a JSON sidecar next to the model
//! (`model.smd` -> `model.smd.import.json`). Besides the user options
//! they carry the material cache written by the previous import, so that
//! re-importing keeps user-assigned material overrides.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::Material;

/// Suffix appended to the model path to locate its sidecar.
pub const SIDECAR_SUFFIX: &str = ".import.json";

/// Errors that can occur while reading or writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Options and cached state consumed by one import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Uniform multiplier applied to vertex and bone positions
    pub scale: f32,

    /// Build the bone hierarchy even when the file has a single bone
    pub force_rig: bool,

    /// Material names from the previous import, in slot order
    pub material_names: Vec<String>,

    /// Materials parallel to `material_names`; `None` marks a cleared slot
    pub materials: Vec<Option<Material>>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            force_rig: false,
            material_names: Vec::new(),
            materials: Vec::new(),
        }
    }
}

impl ImportSettings {
    /// Sidecar location for a model file.
    pub fn sidecar_path(model_path: &Path) -> PathBuf {
        let mut path = OsString::from(model_path.as_os_str());
        path.push(SIDECAR_SUFFIX);
        PathBuf::from(path)
    }

    /// Read settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read settings, falling back to defaults when the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No import settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SettingsResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::default();
        assert_eq!(settings.scale, 1.0);
        assert!(!settings.force_rig);
        assert!(settings.material_names.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ImportSettings = serde_json::from_str(r#"{ "force_rig": true }"#).unwrap();
        assert!(settings.force_rig);
        assert_eq!(settings.scale, 1.0);
        assert!(settings.materials.is_empty());
    }

    #[test]
    fn test_sidecar_path() {
        let path = ImportSettings::sidecar_path(Path::new("models/hero.smd"));
        assert_eq!(path, PathBuf::from("models/hero.smd.import.json"));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("smd_settings_{}.json", std::process::id()));

        let mut settings = ImportSettings {
            scale: 0.0254,
            ..Default::default()
        };
        settings.material_names.push("brick".to_string());
        settings.materials.push(Some(Material::new("brick", "Custom/Brick")));
        settings.material_names.push("glass".to_string());
        settings.materials.push(None);

        settings.save(&path).unwrap();
        let loaded = ImportSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let path = std::env::temp_dir().join("smd_settings_does_not_exist.json");
        let settings = ImportSettings::load_or_default(&path).unwrap();
        assert_eq!(settings, ImportSettings::default());
    }

    #[test]
    fn test_invalid_json() {
        let path = std::env::temp_dir().join(format!("smd_settings_bad_{}.json", std::process::id()));
        std::fs::write(&path, "{ scale: ").unwrap();
        let result = ImportSettings::load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SettingsError::Json(_))));
    }
}
