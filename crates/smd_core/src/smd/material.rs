//! Material resolution for SMD material names.
//!
//! Which material a name maps to is host policy, so it sits behind the
//! `MaterialResolver` trait. `DefaultMaterialResolver` reuses materials
//! cached by a previous import when they are still persisted, and
//! otherwise creates a placeholder with the host's default shader.

use std::sync::Arc;

use crate::scene::{Material, STANDARD_SHADER};
use crate::settings::ImportSettings;

/// Material name given to the only submesh of a file without material lines.
pub const DEFAULT_MATERIAL_NAME: &str = "default";

/// Read-only view of the material names and materials from a previous import.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialCache<'a> {
    names: &'a [String],
    materials: &'a [Option<Material>],
}

impl<'a> MaterialCache<'a> {
    pub fn new(names: &'a [String], materials: &'a [Option<Material>]) -> Self {
        Self { names, materials }
    }

    pub fn from_settings(settings: &'a ImportSettings) -> Self {
        Self::new(&settings.material_names, &settings.materials)
    }

    /// Cached material at the first slot carrying `name`, if that slot is set.
    pub fn lookup(&self, name: &str) -> Option<&'a Material> {
        let index = self.names.iter().position(|n| n == name)?;
        self.materials.get(index)?.as_ref()
    }
}

/// Maps a material name to a material reference.
pub trait MaterialResolver {
    fn resolve(&mut self, name: &str, cache: &MaterialCache<'_>) -> Arc<Material>;
}

/// Reuse persisted cached materials; create placeholders for everything else.
#[derive(Clone, Debug, Default)]
pub struct DefaultMaterialResolver {
    /// Default shader of the host render pipeline, if one is configured
    pub default_shader: Option<String>,
}

impl DefaultMaterialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_shader(shader: impl Into<String>) -> Self {
        Self {
            default_shader: Some(shader.into()),
        }
    }

    /// The pipeline default shader, or the standard shader when none is usable.
    pub fn shader(&self) -> &str {
        match self.default_shader.as_deref() {
            Some(shader) if !shader.is_empty() => shader,
            _ => STANDARD_SHADER,
        }
    }

    pub fn placeholder(&self, name: &str) -> Material {
        Material::new(name, self.shader())
    }
}

impl MaterialResolver for DefaultMaterialResolver {
    fn resolve(&mut self, name: &str, cache: &MaterialCache<'_>) -> Arc<Material> {
        if let Some(cached) = cache.lookup(name) {
            if cached.is_persisted() {
                log::debug!("Material \"{}\": reusing cached material \"{}\"", name, cached.name);
                return Arc::new(cached.clone());
            }
            log::debug!("Material \"{}\": cached material is no longer persisted", name);
        }

        log::debug!("Material \"{}\": creating placeholder with shader {}", name, self.shader());
        Arc::new(self.placeholder(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persisted(name: &str, shader: &str) -> Material {
        Material {
            asset_path: Some(format!("Materials/{}.mat", name)),
            ..Material::new(name, shader)
        }
    }

    #[test]
    fn test_placeholder_uses_standard_shader() {
        let mut resolver = DefaultMaterialResolver::new();
        let material = resolver.resolve("brick", &MaterialCache::default());

        assert_eq!(material.name, "brick");
        assert_eq!(material.shader, STANDARD_SHADER);
        assert!(!material.is_persisted());
    }

    #[test]
    fn test_placeholder_uses_pipeline_shader() {
        let mut resolver = DefaultMaterialResolver::with_default_shader("Pipeline/Lit");
        let material = resolver.resolve("brick", &MaterialCache::default());
        assert_eq!(material.shader, "Pipeline/Lit");

        let resolver = DefaultMaterialResolver::with_default_shader("");
        assert_eq!(resolver.shader(), STANDARD_SHADER);
    }

    #[test]
    fn test_cached_persisted_material_is_reused() {
        let names = vec!["brick".to_string(), "glass".to_string()];
        let materials = vec![Some(persisted("RedBrick", "Custom/Brick")), None];
        let cache = MaterialCache::new(&names, &materials);

        let mut resolver = DefaultMaterialResolver::new();
        let material = resolver.resolve("brick", &cache);
        assert_eq!(material.name, "RedBrick");
        assert_eq!(material.shader, "Custom/Brick");

        // cleared slot
        let material = resolver.resolve("glass", &cache);
        assert_eq!(material.name, "glass");
        assert!(!material.is_persisted());
    }

    #[test]
    fn test_cached_placeholder_is_recreated() {
        let names = vec!["brick".to_string()];
        let materials = vec![Some(Material::new("brick", "Old/Shader"))];
        let cache = MaterialCache::new(&names, &materials);

        let mut resolver = DefaultMaterialResolver::new();
        let material = resolver.resolve("brick", &cache);
        assert_eq!(material.shader, STANDARD_SHADER);
    }

    #[test]
    fn test_cache_shorter_than_names() {
        let names = vec!["a".to_string(), "b".to_string()];
        let materials = vec![Some(persisted("a", "S"))];
        let cache = MaterialCache::new(&names, &materials);

        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("b").is_none());
        assert!(cache.lookup("c").is_none());
    }
}
