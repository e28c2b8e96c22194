//! High-level SMD loading.
//!
//! Turns a parsed SMD file into a scene: a root node named after the
//! model, and either the mesh renderer directly on the root (static
//! models) or a mesh-holder child plus a skeleton child with one node per
//! bone (rigged models). Every produced object is registered under a
//! stable key so a host can persist it.

use std::path::Path;
use std::sync::Arc;

use smd_math::Mat4;
use thiserror::Error;

use crate::mesh::{Mesh, Skin};
use crate::scene::{Material, MeshRenderer, NodeId, Renderer, Scene, SkinnedMeshRenderer, Transform};
use crate::settings::{ImportSettings, SettingsError};
use crate::smd::material::{DefaultMaterialResolver, MaterialResolver};
use crate::smd::parser::{parse_smd, ParseError, ParsedSmd};
use crate::smd::types::ImportWarning;

/// Key of the root node.
pub const MAIN_KEY: &str = "main";
/// Key of the mesh-holder node of a rigged model.
pub const MODEL_KEY: &str = "model";
/// Key of the skeleton node of a rigged model.
pub const SKELETON_KEY: &str = "skeleton";
/// Key of the mesh.
pub const MESH_KEY: &str = "mesh";

/// Errors that can occur during SMD loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// An object produced by an import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetObject {
    Node(NodeId),
    Mesh,
    /// Index into the renderer's materials (the submesh index)
    Material(usize),
}

/// The result of importing one SMD file.
#[derive(Clone, Debug)]
pub struct ImportedAsset {
    pub scene: Scene,

    /// Registered objects in registration order
    pub objects: Vec<(String, AssetObject)>,

    /// Key of the main object
    pub main_object: String,

    /// Material names in submesh order
    pub material_names: Vec<String>,

    pub warnings: Vec<ImportWarning>,
}

impl ImportedAsset {
    /// Look up a registered object by key.
    pub fn object(&self, key: &str) -> Option<AssetObject> {
        self.objects.iter().find(|(k, _)| k == key).map(|&(_, object)| object)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|(k, _)| k.as_str())
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.scene.mesh()
    }

    pub fn is_rigged(&self) -> bool {
        matches!(self.scene.renderer(), Some(Renderer::Skinned(_)))
    }
}

/// Model name for a file: its file name without the extension.
pub fn model_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// Load an SMD file with the default material resolver.
///
/// # Example
///
/// ```ignore
/// use smd_core::smd::load_smd;
/// use smd_core::ImportSettings;
///
/// let asset = load_smd("hero.smd", &ImportSettings::default())?;
/// println!("{} vertices", asset.mesh().unwrap().vertex_count());
/// ```
pub fn load_smd<P: AsRef<Path>>(path: P, settings: &ImportSettings) -> LoadResult<ImportedAsset> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    load_smd_from_string(&content, &model_name(path), settings, &mut DefaultMaterialResolver::new())
}

/// Load SMD text (useful for testing).
pub fn load_smd_from_string<R: MaterialResolver + ?Sized>(
    content: &str,
    name: &str,
    settings: &ImportSettings,
    resolver: &mut R,
) -> LoadResult<ImportedAsset> {
    let parsed = parse_smd(content, settings, resolver)?;
    Ok(SceneAssembler::new(name, settings.force_rig).assemble(parsed))
}

/// Builds the scene, mesh and registration list from parser output.
struct SceneAssembler<'a> {
    name: &'a str,
    force_rig: bool,
    scene: Scene,
    objects: Vec<(String, AssetObject)>,
}

impl<'a> SceneAssembler<'a> {
    fn new(name: &'a str, force_rig: bool) -> Self {
        let scene = Scene::new(name);
        let objects = vec![(MAIN_KEY.to_string(), AssetObject::Node(scene.root))];
        Self {
            name,
            force_rig,
            scene,
            objects,
        }
    }

    fn assemble(mut self, parsed: ParsedSmd) -> ImportedAsset {
        let ParsedSmd {
            bones,
            geometry,
            mut warnings,
        } = parsed;

        let mut include_rig = bones.len() > 1 || self.force_rig;
        if include_rig && bones.is_empty() {
            let warning = ImportWarning::ForcedRigWithoutBones;
            log::warn!("{}", warning);
            warnings.push(warning);
            include_rig = false;
        }

        let root = self.scene.root;
        let mesh_node = if include_rig {
            let id = self.scene.add_child(root, self.name, Transform::default());
            self.register(MODEL_KEY, AssetObject::Node(id));
            id
        } else {
            root
        };

        let mut bone_nodes = Vec::new();
        let mut bind_poses = Vec::new();
        if include_rig {
            let skeleton = self.scene.add_child(root, format!("{}_skeleton", self.name), Transform::default());
            self.register(SKELETON_KEY, AssetObject::Node(skeleton));

            let mesh_world = self.scene.world_matrix(mesh_node);
            for bone in &bones {
                let parent = match bone.parent {
                    Some(index) => bone_nodes[index],
                    None => skeleton,
                };
                let transform = Transform::from_euler_degrees(bone.position, bone.rotation);
                let id = self.scene.add_child(parent, bone.name.clone(), transform);
                self.register(&bone.name, AssetObject::Node(id));

                bind_poses.push(self.bind_pose(id, mesh_world));
                bone_nodes.push(id);
            }
        }

        let submeshes = geometry.partition();
        let material_names: Vec<String> = geometry.slots.iter().map(|s| s.name.clone()).collect();
        let materials: Vec<_> = geometry.slots.iter().map(|s| s.material.clone()).collect();

        let mut mesh = Mesh::new(self.name, geometry.positions, geometry.normals, geometry.uvs);
        mesh.set_submeshes(submeshes);
        if include_rig {
            mesh.set_skin(Skin {
                bone_weights: geometry.bone_weights,
                bind_poses,
            });
        }
        mesh.recalculate_tangents();
        mesh.recalculate_bounds();

        log::info!(
            "Imported {}: {} vertices, {} triangles, {} submeshes, {} bones{}",
            self.name,
            mesh.vertex_count(),
            mesh.triangle_count(),
            mesh.submesh_count(),
            bones.len(),
            if include_rig { " (rigged)" } else { "" }
        );

        let bounds = mesh.bounds;
        let mesh = Arc::new(mesh);
        self.register(MESH_KEY, AssetObject::Mesh);

        for (index, material) in materials.iter().enumerate() {
            if !material.is_persisted() {
                self.register(&format!("{} (material)", material.name), AssetObject::Material(index));
            }
        }

        let renderer = match bone_nodes.first() {
            Some(&root_bone) if include_rig => Renderer::Skinned(SkinnedMeshRenderer {
                mesh,
                materials,
                bones: bone_nodes,
                root_bone,
                bounds,
            }),
            _ => Renderer::Static(MeshRenderer {
                mesh,
                materials,
                bounds,
            }),
        };
        self.scene.node_mut(mesh_node).renderer = Some(renderer);

        ImportedAsset {
            scene: self.scene,
            objects: self.objects,
            main_object: MAIN_KEY.to_string(),
            material_names,
            warnings,
        }
    }

    /// Maps mesh space into the bone's local space at rest.
    fn bind_pose(&self, bone: NodeId, mesh_world: Mat4) -> Mat4 {
        self.scene.world_to_local(bone) * mesh_world
    }

    fn register(&mut self, key: &str, object: AssetObject) {
        self.objects.push((key.to_string(), object));
    }
}

/// Imports SMD files and keeps their settings, including the material
/// cache, across re-imports.
pub struct SmdImporter<R: MaterialResolver = DefaultMaterialResolver> {
    pub settings: ImportSettings,
    pub resolver: R,
}

impl SmdImporter {
    pub fn new(settings: ImportSettings) -> Self {
        Self::with_resolver(settings, DefaultMaterialResolver::new())
    }

    /// Importer using the settings sidecar of `model_path`, or defaults if
    /// there is none.
    pub fn for_model<P: AsRef<Path>>(model_path: P) -> LoadResult<Self> {
        let sidecar = ImportSettings::sidecar_path(model_path.as_ref());
        Ok(Self::new(ImportSettings::load_or_default(sidecar)?))
    }
}

impl<R: MaterialResolver> SmdImporter<R> {
    pub fn with_resolver(settings: ImportSettings, resolver: R) -> Self {
        Self { settings, resolver }
    }

    /// Import a file from disk. See `import_from_string`.
    pub fn import<P: AsRef<Path>>(&mut self, path: P) -> LoadResult<ImportedAsset> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        self.import_from_string(&content, &model_name(path))
    }

    /// Import SMD text. On success the material cache in `settings` is
    /// replaced by this import's material slots; on failure it is untouched.
    pub fn import_from_string(&mut self, content: &str, name: &str) -> LoadResult<ImportedAsset> {
        let asset = load_smd_from_string(content, name, &self.settings, &mut self.resolver)?;

        self.settings.material_names = asset.material_names.clone();
        self.settings.materials = asset
            .scene
            .materials()
            .iter()
            .map(|m| Some(Material::clone(m.as_ref())))
            .collect();

        Ok(asset)
    }

    /// Write the current settings to the sidecar of `model_path`.
    pub fn save_settings<P: AsRef<Path>>(&self, model_path: P) -> LoadResult<()> {
        self.settings.save(ImportSettings::sidecar_path(model_path.as_ref()))?;
        Ok(())
    }
}
