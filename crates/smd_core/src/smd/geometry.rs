//! Geometry accumulator for the `triangles` block.
//!
//! Every vertex row becomes one triangle-index entry. Rows are
//! deduplicated against earlier vertices by exact position, normal and
//! UV equality using a first-match linear scan over positions: only the
//! first vertex sharing a position is compared on normal and UV, so a
//! later mismatch always inserts a new vertex.

use std::sync::Arc;

use smd_math::{Vec2, Vec3};

use super::material::{MaterialCache, MaterialResolver};
use super::parser::ParseResult;
use super::tokenizer::Row;
use super::types::{ImportWarning, SmdVertex};
use crate::mesh::{BoneWeight, SubMesh, MAX_BONE_INFLUENCES};
use crate::scene::Material;

/// Minimum fields in a vertex row: bone, position, normal, uv.
pub const VERTEX_FIELDS: usize = 9;

/// Field holding the influence count in the multi-weight form.
const WEIGHT_COUNT_FIELD: usize = 9;

/// A material slot; its index in the slot list is the submesh index.
#[derive(Clone, Debug)]
pub struct MaterialSlot {
    pub name: String,
    pub material: Arc<Material>,
}

/// Parallel vertex arrays plus the triangle list, tagged by submesh.
#[derive(Clone, Debug, Default)]
pub struct GeometryAccumulator {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub bone_weights: Vec<BoneWeight>,

    /// One vertex index per vertex row
    pub triangles: Vec<u32>,

    /// Submesh index per `triangles` entry
    pub submesh_tags: Vec<usize>,

    pub slots: Vec<MaterialSlot>,
    current_slot: Option<usize>,
}

impl GeometryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_slot(&self) -> Option<usize> {
        self.current_slot
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Make `name` the active material, creating a slot on first mention.
    pub fn select_material<R: MaterialResolver + ?Sized>(
        &mut self,
        name: &str,
        cache: &MaterialCache<'_>,
        resolver: &mut R,
    ) -> usize {
        let index = match self.slots.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                let material = resolver.resolve(name, cache);
                self.slots.push(MaterialSlot {
                    name: name.to_string(),
                    material,
                });
                self.slots.len() - 1
            }
        };
        self.current_slot = Some(index);
        index
    }

    /// Parse a vertex row and add it under the active material.
    ///
    /// Returns a warning when the row declares more than four influences.
    pub fn add_vertex_row(&mut self, row: &Row<'_>, scale: f32) -> ParseResult<Option<ImportWarning>> {
        row.require(VERTEX_FIELDS)?;

        let position = row.vec3(1)? * scale;
        let normal = row.vec3(4)?;
        let uv = Vec2::new(row.f32(7)?, row.f32(8)?);
        let (weight, warning) = parse_weights(row)?;

        self.push_vertex(SmdVertex {
            position,
            normal,
            uv,
            weight,
        });
        Ok(warning)
    }

    /// Add one vertex row's data; returns the vertex index it resolved to.
    ///
    /// A duplicate keeps the stored vertex and its weights. Before any
    /// material is selected, rows are tagged with submesh 0.
    pub fn push_vertex(&mut self, vertex: SmdVertex) -> u32 {
        let submesh = self.current_slot.unwrap_or(0);

        if let Some(index) = self.positions.iter().position(|p| *p == vertex.position) {
            if self.uvs[index] == vertex.uv && self.normals[index] == vertex.normal {
                self.triangles.push(index as u32);
                self.submesh_tags.push(submesh);
                return index as u32;
            }
        }

        let index = self.positions.len() as u32;
        self.positions.push(vertex.position);
        self.normals.push(vertex.normal);
        self.uvs.push(vertex.uv);
        self.bone_weights.push(vertex.weight);
        self.triangles.push(index);
        self.submesh_tags.push(submesh);
        index
    }

    /// Split the triangle list into one index buffer per material slot,
    /// preserving the original order within each slot.
    pub fn partition(&self) -> Vec<SubMesh> {
        (0..self.slots.len())
            .map(|slot| {
                let indices = self
                    .triangles
                    .iter()
                    .zip(&self.submesh_tags)
                    .filter(|&(_, &tag)| tag == slot)
                    .map(|(&index, _)| index)
                    .collect();
                SubMesh::new(indices)
            })
            .collect()
    }
}

/// Read the bone influences of a vertex row.
///
/// Rows with a count field carry up to four `(bone, weight)` pairs after
/// it. Rows without one bind fully to the bone in field 0, stored in
/// influence slot 1.
fn parse_weights(row: &Row<'_>) -> ParseResult<(BoneWeight, Option<ImportWarning>)> {
    let mut weight = BoneWeight::default();

    if row.len() <= WEIGHT_COUNT_FIELD {
        weight.set(1, row.i32(0)?, 1.0);
        return Ok((weight, None));
    }

    let count = row.i32(WEIGHT_COUNT_FIELD)?;
    let stored = count.clamp(0, MAX_BONE_INFLUENCES as i32) as usize;
    for slot in 0..stored {
        let field = WEIGHT_COUNT_FIELD + 1 + slot * 2;
        weight.set(slot, row.i32(field)?, row.f32(field + 1)?);
    }

    let warning = if count > MAX_BONE_INFLUENCES as i32 {
        let warning = ImportWarning::ExcessBoneWeights { line: row.line, count };
        log::warn!("{}", warning);
        Some(warning)
    } else {
        None
    };

    Ok((weight, warning))
}
