//! Bone table built from the `nodes` and `skeleton` blocks.

use smd_math::Vec3;

use super::parser::{ParseError, ParseResult};
use super::tokenizer::{strip_quotes, Row};
use super::types::{rotation_to_degrees, SmdBone};

/// Fields in a `nodes` row: index, name, parent index.
pub const NODE_FIELDS: usize = 3;

/// Fields in a `skeleton` row: bone index, position, rotation.
pub const POSE_FIELDS: usize = 7;

/// Ordered bone list. A bone's position in the list is its identity.
#[derive(Clone, Debug, Default)]
pub struct BoneTable {
    bones: Vec<SmdBone>,
    /// `time` markers seen in the skeleton block
    frames: usize,
}

impl BoneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bones(self) -> Vec<SmdBone> {
        self.bones
    }

    /// Append a bone from a `nodes` row (`index name parent`).
    ///
    /// The declared index is not read; list order is authoritative. A
    /// negative parent makes the bone a root, otherwise the parent must
    /// already be in the table.
    pub fn add_node(&mut self, row: &Row<'_>) -> ParseResult<()> {
        row.require(NODE_FIELDS)?;

        let name = strip_quotes(row.fields[1]);
        let parent_index = row.i32(2)?;
        let index = self.bones.len();

        let parent = if parent_index < 0 {
            None
        } else if (parent_index as usize) < index {
            Some(parent_index as usize)
        } else {
            return Err(ParseError::InvalidParent {
                line: row.line,
                bone: name.to_string(),
                parent: parent_index,
            });
        };

        self.bones.push(SmdBone::new(name, parent));
        Ok(())
    }

    /// Apply a `skeleton` row (`bone px py pz rx ry rz`) to an existing bone.
    ///
    /// `time` rows mark frames. Only the first frame is the reference
    /// pose; rows of later frames are skipped.
    pub fn set_pose(&mut self, row: &Row<'_>, scale: f32) -> ParseResult<()> {
        if row.field(0)?.eq_ignore_ascii_case("time") {
            self.frames += 1;
            if self.frames == 2 {
                log::debug!("Line {}: ignoring skeleton frames after the first", row.line);
            }
            return Ok(());
        }
        if self.frames > 1 {
            return Ok(());
        }

        row.require(POSE_FIELDS)?;

        let index = row.i32(0)?;
        let position = row.vec3(1)? * scale;
        let rotation = row.vec3(4)?;

        let bone_count = self.bones.len();
        let bone = usize::try_from(index)
            .ok()
            .and_then(|i| self.bones.get_mut(i))
            .ok_or(ParseError::BoneIndexOutOfRange {
                line: row.line,
                index,
                bone_count,
            })?;

        bone.position = position;
        bone.rotation = Vec3::new(
            rotation_to_degrees(rotation.x),
            rotation_to_degrees(rotation.y),
            rotation_to_degrees(rotation.z),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bones(table: &BoneTable) -> Vec<SmdBone> {
        table.clone().into_bones()
    }

    fn table(rows: &[&str]) -> BoneTable {
        let mut table = BoneTable::new();
        for (i, text) in rows.iter().enumerate() {
            table.add_node(&Row::tokenize(i + 1, text)).unwrap();
        }
        table
    }

    #[test]
    fn test_add_nodes() {
        let bones = table(&["0 \"root\" -1", "1 \"spine\" 0", "2 arm 1"]).into_bones();

        assert_eq!(bones.len(), 3);
        assert_eq!(bones[0].name, "root");
        assert!(bones[0].is_root());
        assert_eq!(bones[1].parent, Some(0));
        assert_eq!(bones[2].name, "arm");
        assert_eq!(bones[2].parent, Some(1));
    }

    #[test]
    fn test_declared_index_is_ignored() {
        let table = table(&["5 \"root\" -1", "9 \"child\" 0"]);
        assert_eq!(bones(&table)[1].parent, Some(0));
    }

    #[test]
    fn test_forward_parent_is_rejected() {
        let mut table = table(&["0 root -1"]);
        let err = table.add_node(&Row::tokenize(2, "1 child 1")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidParent { line: 2, parent: 1, .. }));

        let err = table.add_node(&Row::tokenize(3, "1 child 4")).unwrap_err();
        assert!(matches!(err, ParseError::InvalidParent { parent: 4, .. }));
    }

    #[test]
    fn test_short_node_row() {
        let mut table = BoneTable::new();
        let err = table.add_node(&Row::tokenize(1, "0 root")).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_set_pose() {
        let mut table = table(&["0 root -1", "1 child 0"]);
        table.set_pose(&Row::tokenize(4, "time 0"), 2.0).unwrap();
        table.set_pose(&Row::tokenize(5, "1 1 2 3 1.570796 0 0"), 2.0).unwrap();

        let posed = bones(&table);
        let bone = &posed[1];
        assert_eq!(bone.position, Vec3::new(2.0, 4.0, 6.0));
        assert!((bone.rotation.x - 90.0).abs() < 1e-4);
        assert_eq!(bone.rotation.y, 0.0);
        assert_eq!(bones(&table)[0].position, Vec3::ZERO);
    }

    #[test]
    fn test_time_marker_is_case_insensitive() {
        let mut table = table(&["0 root -1"]);
        assert!(table.set_pose(&Row::tokenize(1, "TIME 0"), 1.0).is_ok());
        assert!(table.set_pose(&Row::tokenize(2, "Time"), 1.0).is_ok());
    }

    #[test]
    fn test_only_first_frame_is_used() {
        let mut table = table(&["0 root -1"]);
        table.set_pose(&Row::tokenize(1, "time 0"), 1.0).unwrap();
        table.set_pose(&Row::tokenize(2, "0 1 0 0 0 0 0"), 1.0).unwrap();
        table.set_pose(&Row::tokenize(3, "time 1"), 1.0).unwrap();
        table.set_pose(&Row::tokenize(4, "0 5 0 0 0 0 0"), 1.0).unwrap();

        assert_eq!(bones(&table)[0].position, Vec3::X);
    }

    #[test]
    fn test_pose_index_out_of_range() {
        let mut table = table(&["0 root -1"]);
        let err = table.set_pose(&Row::tokenize(8, "1 0 0 0 0 0 0"), 1.0).unwrap_err();
        assert!(matches!(err, ParseError::BoneIndexOutOfRange { line: 8, index: 1, bone_count: 1 }));

        let err = table.set_pose(&Row::tokenize(9, "-1 0 0 0 0 0 0"), 1.0).unwrap_err();
        assert!(matches!(err, ParseError::BoneIndexOutOfRange { index: -1, .. }));
    }

    #[test]
    fn test_pose_invalid_number() {
        let mut table = table(&["0 root -1"]);
        let err = table.set_pose(&Row::tokenize(3, "0 0 x 0 0 0 0"), 1.0).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { line: 3, field: 2, .. }));
    }
}
