//! SMD Core - Scene graph and SMD model import.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `Node`, `Mesh`, `Material`
//! - **SMD support**: Studiomdl Data parsing and scene assembly
//! - **Import settings**: scale, rig forcing and the material cache,
//!   persisted as a JSON sidecar next to the model
//!
//! # Example
//!
//! ```ignore
//! use smd_core::smd::load_smd;
//! use smd_core::ImportSettings;
//!
//! let asset = load_smd("hero.smd", &ImportSettings::default())?;
//! println!("Loaded {} nodes, {} bones",
//!     asset.scene.node_count(),
//!     asset.scene.bones().len());
//! ```

pub mod mesh;
pub mod scene;
pub mod settings;
pub mod smd;

// Re-export commonly used types
pub use mesh::{BoneWeight, Mesh, Skin, SubMesh};
pub use scene::{Material, Node, NodeId, Renderer, Scene, Transform};
pub use settings::ImportSettings;
pub use smd::{load_smd, load_smd_from_string, ImportedAsset, SmdImporter};
