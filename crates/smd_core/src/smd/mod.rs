//! SMD (Studiomdl Data) import.
//!
//! This module parses the ASCII SMD model format and assembles the result
//! into the crate's scene graph: a mesh with one submesh per material,
//! and, for rigged models, a bone hierarchy with bind poses and skin
//! weights.
//!
//! ## Supported blocks
//!
//! - `nodes`: bone names and parents
//! - `skeleton`: the reference pose (first frame only)
//! - `triangles`: material lines and vertex rows, with up to four bone
//!   influences per vertex
//!
//! Any other block is skipped with a warning.
//!
//! # Example
//!
//! ```ignore
//! use smd_core::smd::SmdImporter;
//!
//! let mut importer = SmdImporter::for_model("hero.smd")?;
//! let asset = importer.import("hero.smd")?;
//! importer.save_settings("hero.smd")?;
//! ```

mod bones;
mod geometry;
mod loader;
mod material;
mod parser;
mod tokenizer;
mod types;

pub use geometry::{GeometryAccumulator, MaterialSlot};
pub use loader::*;
pub use material::*;
pub use parser::*;
pub use types::*;
