//! SMD (Studiomdl Data) text parser.
//!
//! The file is read line by line. Each line is tokenized, then dispatched
//! on the current block:
//!
//! - A single-token line outside any block opens the block it names.
//! - A line consisting of exactly `end` closes the current block.
//! - `nodes` rows build the bone table, `skeleton` rows pose it.
//! - `triangles` rows select materials or add vertices.
//! - Rows of any other block are reported as warnings and skipped.
//!
//! An unclosed trailing block is accepted.

use smd_math::Vec3;
use thiserror::Error;

use super::bones::BoneTable;
use super::geometry::{GeometryAccumulator, VERTEX_FIELDS};
use super::material::{MaterialCache, MaterialResolver, DEFAULT_MATERIAL_NAME};
use super::tokenizer::Row;
use super::types::{Block, ImportWarning, SmdBone};
use crate::settings::ImportSettings;

/// Token that closes any block.
pub const END_TOKEN: &str = "end";

/// Errors that abort an SMD parse.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid number at line {line}, field {field}: {value:?}")]
    InvalidNumber { line: usize, field: usize, value: String },

    #[error("Line {line}: expected at least {expected} fields, found {found}")]
    MissingField { line: usize, expected: usize, found: usize },

    #[error("Line {line}: bone index {index} out of range ({bone_count} bones defined)")]
    BoneIndexOutOfRange { line: usize, index: i32, bone_count: usize },

    #[error("Line {line}: bone \"{bone}\" references parent {parent}, which is not defined before it")]
    InvalidParent { line: usize, bone: String, parent: i32 },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Everything the parser extracted from one file.
#[derive(Clone, Debug, Default)]
pub struct ParsedSmd {
    pub bones: Vec<SmdBone>,
    pub geometry: GeometryAccumulator,
    pub warnings: Vec<ImportWarning>,
}

/// Block-mode SMD parser.
pub struct SmdParser<'a, R: MaterialResolver + ?Sized> {
    settings: &'a ImportSettings,
    resolver: &'a mut R,
    block: Block,
    bones: BoneTable,
    geometry: GeometryAccumulator,
    warnings: Vec<ImportWarning>,
}

impl<'a, R: MaterialResolver + ?Sized> SmdParser<'a, R> {
    pub fn new(settings: &'a ImportSettings, resolver: &'a mut R) -> Self {
        Self {
            settings,
            resolver,
            block: Block::None,
            bones: BoneTable::new(),
            geometry: GeometryAccumulator::new(),
            warnings: Vec::new(),
        }
    }

    /// The block the next line will be dispatched to.
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Parse a whole file.
    pub fn parse(mut self, content: &str) -> ParseResult<ParsedSmd> {
        for (index, line) in content.lines().enumerate() {
            self.parse_line(index + 1, line)?;
        }
        Ok(self.finish())
    }

    /// Feed a single line (1-based line number).
    pub fn parse_line(&mut self, line_number: usize, line: &str) -> ParseResult<()> {
        let row = Row::tokenize(line_number, line);
        if row.is_empty() {
            return Ok(());
        }

        if row.is_single(END_TOKEN) {
            log::debug!("Line {}: end of block \"{}\"", line_number, self.block.name());
            self.block = Block::None;
            return Ok(());
        }

        match self.block {
            Block::None => {
                if row.len() == 1 {
                    self.block = Block::from_name(row.fields[0]);
                    log::debug!("Line {}: entering block \"{}\"", line_number, self.block.name());
                }
            }
            Block::Nodes => self.bones.add_node(&row)?,
            Block::Skeleton => self.bones.set_pose(&row, self.settings.scale)?,
            Block::Triangles => self.parse_triangles_row(&row)?,
            Block::Unknown(ref name) => {
                let warning = ImportWarning::UnknownBlock {
                    line: line_number,
                    block: name.clone(),
                };
                self.warn(warning);
            }
        }

        Ok(())
    }

    /// Stop parsing and hand over the accumulated data.
    ///
    /// Vertex rows that precede every material line belong to submesh 0.
    /// If the file never names a material, that submesh gets the
    /// `default` slot here.
    pub fn finish(mut self) -> ParsedSmd {
        if self.geometry.slots.is_empty() && !self.geometry.triangles.is_empty() {
            log::debug!("No material lines, using \"{}\"", DEFAULT_MATERIAL_NAME);
            let cache = MaterialCache::from_settings(self.settings);
            self.geometry.select_material(DEFAULT_MATERIAL_NAME, &cache, &mut *self.resolver);
        }

        ParsedSmd {
            bones: self.bones.into_bones(),
            geometry: self.geometry,
            warnings: self.warnings,
        }
    }

    fn parse_triangles_row(&mut self, row: &Row<'_>) -> ParseResult<()> {
        let cache = MaterialCache::from_settings(self.settings);

        if row.len() == 1 {
            self.geometry.select_material(row.fields[0], &cache, &mut *self.resolver);
            return Ok(());
        }

        row.require(VERTEX_FIELDS)?;

        if let Some(warning) = self.geometry.add_vertex_row(row, self.settings.scale)? {
            self.warnings.push(warning);
        }
        Ok(())
    }

    fn warn(&mut self, warning: ImportWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Parse SMD text with the given settings and material resolver.
pub fn parse_smd<R: MaterialResolver + ?Sized>(
    content: &str,
    settings: &ImportSettings,
    resolver: &mut R,
) -> ParseResult<ParsedSmd> {
    SmdParser::new(settings, resolver).parse(content)
}

impl ParsedSmd {
    /// Number of bones defined by the `nodes` block.
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Positions of the first frame, for quick inspection.
    pub fn bone_positions(&self) -> Vec<Vec3> {
        self.bones.iter().map(|b| b.position).collect()
    }
}
