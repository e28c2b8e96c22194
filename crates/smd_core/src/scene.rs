//! Scene graph types for imported models.
//!
//! Nodes live in a flat arena addressed by `NodeId`; parents always
//! precede their children. A node may carry a renderer that references
//! the shared mesh and its materials.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smd_math::{quat_from_euler_degrees, Aabb, Mat4, Mat4Ext, Quat, Vec3};

use crate::mesh::Mesh;

/// Shader that is always available to the host.
pub const STANDARD_SHADER: &str = "Standard";

/// A surface material assigned to one submesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name (from the SMD material line)
    pub name: String,

    /// Shader the host should render this material with
    #[serde(default = "default_shader")]
    pub shader: String,

    /// Diffuse/albedo color (RGB, 0-1)
    #[serde(default = "default_diffuse")]
    pub diffuse_color: Vec3,

    /// Location of the material in the host asset database, if persisted there
    #[serde(default)]
    pub asset_path: Option<String>,
}

fn default_shader() -> String {
    STANDARD_SHADER.to_string()
}

fn default_diffuse() -> Vec3 {
    Vec3::new(0.5, 0.5, 0.5) // Grey default
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            shader: default_shader(),
            diffuse_color: default_diffuse(),
            asset_path: None,
        }
    }
}

impl Material {
    /// Create a new material with a name and shader.
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: shader.into(),
            ..Default::default()
        }
    }

    /// A persisted material is owned by the host asset database rather than
    /// by the imported model.
    pub fn is_persisted(&self) -> bool {
        self.asset_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a transform from a position and Euler angles in degrees, unit scale.
    pub fn from_euler_degrees(translation: Vec3, euler: Vec3) -> Self {
        Self {
            translation,
            rotation: quat_from_euler_degrees(euler),
            scale: Vec3::ONE,
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Index of a node in `Scene::nodes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Renders the shared mesh without deformation.
#[derive(Clone, Debug)]
pub struct MeshRenderer {
    pub mesh: Arc<Mesh>,
    /// One material per submesh
    pub materials: Vec<Arc<Material>>,
    pub bounds: Aabb,
}

/// Renders the shared mesh deformed by a bone hierarchy.
#[derive(Clone, Debug)]
pub struct SkinnedMeshRenderer {
    pub mesh: Arc<Mesh>,
    /// One material per submesh
    pub materials: Vec<Arc<Material>>,
    /// Bone nodes, indexed like the mesh bind poses and bone weights
    pub bones: Vec<NodeId>,
    pub root_bone: NodeId,
    pub bounds: Aabb,
}

#[derive(Clone, Debug)]
pub enum Renderer {
    Static(MeshRenderer),
    Skinned(SkinnedMeshRenderer),
}

impl Renderer {
    pub fn mesh(&self) -> &Arc<Mesh> {
        match self {
            Renderer::Static(r) => &r.mesh,
            Renderer::Skinned(r) => &r.mesh,
        }
    }

    pub fn materials(&self) -> &[Arc<Material>] {
        match self {
            Renderer::Static(r) => &r.materials,
            Renderer::Skinned(r) => &r.materials,
        }
    }

    pub fn bounds(&self) -> Aabb {
        match self {
            Renderer::Static(r) => r.bounds,
            Renderer::Skinned(r) => r.bounds,
        }
    }
}

/// A named node in the scene graph.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Transform relative to the parent
    pub transform: Transform,
    pub renderer: Option<Renderer>,
}

/// An imported model: a root node and everything beneath it.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Scene name (usually from filename)
    pub name: String,

    /// Node arena; `nodes[0]` is the root
    pub nodes: Vec<Node>,

    pub root: NodeId,
}

impl Scene {
    /// Create a scene holding a single root node with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let root = Node {
            name: name.clone(),
            parent: None,
            children: Vec::new(),
            transform: Transform::default(),
            renderer: None,
        };
        Self {
            name,
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Append a node under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            transform,
            renderer: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First node with the given name, in creation order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = self.node(id);
        let local = node.transform.to_matrix();
        match node.parent {
            Some(parent) => self.world_matrix(parent) * local,
            None => local,
        }
    }

    /// World-to-local matrix of a node.
    pub fn world_to_local(&self, id: NodeId) -> Mat4 {
        self.world_matrix(id).inverse()
    }

    /// Slash-separated path from the root, e.g. `model/model_skeleton/pelvis`.
    pub fn path(&self, id: NodeId) -> String {
        let node = self.node(id);
        match node.parent {
            Some(parent) => format!("{}/{}", self.path(parent), node.name),
            None => node.name.clone(),
        }
    }

    /// The node carrying the model's renderer, if any.
    pub fn renderer_node(&self) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.renderer.is_some()).map(NodeId)
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer_node().and_then(|id| self.node(id).renderer.as_ref())
    }

    /// The shared mesh, if a renderer was attached.
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.renderer().map(Renderer::mesh)
    }

    /// Materials in submesh order.
    pub fn materials(&self) -> &[Arc<Material>] {
        self.renderer().map(Renderer::materials).unwrap_or(&[])
    }

    /// Bone nodes of a skinned renderer, empty for static models.
    pub fn bones(&self) -> &[NodeId] {
        match self.renderer() {
            Some(Renderer::Skinned(r)) => &r.bones,
            _ => &[],
        }
    }

    /// World-space bounds of the rendered mesh.
    pub fn world_bounds(&self) -> Aabb {
        match self.renderer_node() {
            Some(id) => {
                let bounds = self.node(id).renderer.as_ref().map(Renderer::bounds).unwrap_or_default();
                self.world_matrix(id).transform_aabb(&bounds)
            }
            None => Aabb::empty(),
        }
    }
}
