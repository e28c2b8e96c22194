//! SMD intermediate types produced by the parser before scene assembly.

use std::fmt;

use smd_math::{Vec2, Vec3};

use crate::mesh::BoneWeight;

/// Skeleton rotations are stored in units where this value is a quarter turn.
#[allow(clippy::approx_constant)]
pub const ROTATION_REFERENCE: f32 = 1.570796;

/// Multiplier turning a skeleton rotation into degrees.
pub fn rotation_to_degrees(angle: f32) -> f32 {
    (90.0 / ROTATION_REFERENCE) * angle
}

/// The section of the file the parser is currently in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Between blocks
    None,

    /// `nodes`: bone names and parents
    Nodes,

    /// `skeleton`: reference pose per bone
    Skeleton,

    /// `triangles`: material lines and vertex rows
    Triangles,

    /// Any other block name; its rows are reported and skipped
    Unknown(String),
}

impl Block {
    /// Map a block header token to a block. Names are case-sensitive.
    pub fn from_name(name: &str) -> Self {
        match name {
            "nodes" => Block::Nodes,
            "skeleton" => Block::Skeleton,
            "triangles" => Block::Triangles,
            other => Block::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Block::None => "",
            Block::Nodes => "nodes",
            Block::Skeleton => "skeleton",
            Block::Triangles => "triangles",
            Block::Unknown(name) => name,
        }
    }
}

/// A bone from the `nodes` block, posed by the `skeleton` block.
#[derive(Clone, Debug, PartialEq)]
pub struct SmdBone {
    pub name: String,

    /// Index of the parent bone; always lower than this bone's own index
    pub parent: Option<usize>,

    /// Local position, already multiplied by the import scale
    pub position: Vec3,

    /// Local Euler angles in degrees
    pub rotation: Vec3,
}

impl SmdBone {
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// One vertex row from the `triangles` block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmdVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub weight: BoneWeight,
}

/// A recoverable problem found during import.
#[derive(Clone, Debug, PartialEq)]
pub enum ImportWarning {
    /// A row inside a block with an unrecognised name
    UnknownBlock { line: usize, block: String },

    /// A vertex declared more than four bone influences
    ExcessBoneWeights { line: usize, count: i32 },

    /// `force_rig` was set but the file defines no bones
    ForcedRigWithoutBones,
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::UnknownBlock { line, block } => {
                write!(f, "Unknown block \"{}\" (line {})", block, line)
            }
            ImportWarning::ExcessBoneWeights { line, count } => write!(
                f,
                "Vertex contains too many bone weights. {} provided, 4 maximum (line {})",
                count, line
            ),
            ImportWarning::ForcedRigWithoutBones => {
                write!(f, "Rig was forced but the file defines no bones; importing as a static mesh")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_from_name() {
        assert_eq!(Block::from_name("nodes"), Block::Nodes);
        assert_eq!(Block::from_name("skeleton"), Block::Skeleton);
        assert_eq!(Block::from_name("triangles"), Block::Triangles);
        assert_eq!(Block::from_name("vertexanimation"), Block::Unknown("vertexanimation".to_string()));
        assert_eq!(Block::from_name("Nodes").name(), "Nodes");
    }

    #[test]
    fn test_rotation_to_degrees() {
        assert!((rotation_to_degrees(ROTATION_REFERENCE) - 90.0).abs() < 1e-4);
        assert!((rotation_to_degrees(std::f32::consts::PI) - 180.0).abs() < 1e-3);
        assert_eq!(rotation_to_degrees(1.0), 90.0 / 1.570796_f32);
    }

    #[test]
    fn test_warning_display() {
        let warning = ImportWarning::ExcessBoneWeights { line: 12, count: 6 };
        assert!(warning.to_string().contains("6 provided, 4 maximum"));
    }
}
