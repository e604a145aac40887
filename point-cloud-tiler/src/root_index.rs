//! Root index (`.pcroot`) aggregation, writing and parsing.
//!
//! The root file is plain text, one record per line, fields separated by
//! `|`. Line 0 is the global header:
//!
//! ```text
//! version|gridSize|totalPoints|minX|minY|minZ|maxX|maxY|maxZ|offsetX|offsetY|offsetZ|packMagic
//! ```
//!
//! Every following line describes one tile:
//!
//! ```text
//! fileName|totalPoints|minX|minY|minZ|maxX|maxY|maxZ|cellX|cellY|cellZ
//! ```
use crate::bounds::PointCloudBounds;
use crate::constants::{SEPARATOR, human_readable_count};
use crate::error::{ExportError, Result};
use crate::grid::CellKey;
use crate::settings::ExportSettings;
use log::{info, warn};
use std::fs;
use std::path::Path;

const HEADER_FIELDS: usize = 13;
const TILE_FIELDS: usize = 11;

/// Summary of one written tile, kept until the root index is flushed.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSummary {
    /// File name relative to the root index directory.
    pub file_name: String,
    /// Points actually written after decimation.
    pub total_points: u64,
    /// Bounds of the written points only.
    pub bounds: PointCloudBounds,
    pub center: (f32, f32, f32),
    pub cell: CellKey,
}

impl TileSummary {
    pub fn new(
        file_name: String,
        total_points: u64,
        bounds: PointCloudBounds,
        cell: CellKey,
    ) -> Self {
        Self {
            file_name,
            total_points,
            center: bounds.center(),
            bounds,
            cell,
        }
    }

    fn to_record(&self) -> String {
        let mut fields = vec![self.file_name.clone(), self.total_points.to_string()];
        fields.extend(self.bounds.to_array().iter().map(f32::to_string));
        fields.extend([self.cell.x, self.cell.y, self.cell.z].iter().map(i32::to_string));
        join(&fields)
    }

    fn from_record(line_no: usize, line: &str) -> Result<Self> {
        let fields = split(line_no, line, TILE_FIELDS)?;
        let bounds = PointCloudBounds::from_array([
            parse(line_no, fields[2])?,
            parse(line_no, fields[3])?,
            parse(line_no, fields[4])?,
            parse(line_no, fields[5])?,
            parse(line_no, fields[6])?,
            parse(line_no, fields[7])?,
        ]);
        let cell = CellKey::new(
            parse(line_no, fields[8])?,
            parse(line_no, fields[9])?,
            parse(line_no, fields[10])?,
        );
        Ok(Self::new(
            fields[0].to_string(),
            parse(line_no, fields[1])?,
            bounds,
            cell,
        ))
    }
}

/// Global header record of a root index.
#[derive(Debug, Clone, PartialEq)]
pub struct RootHeader {
    pub version: u32,
    pub grid_size: f32,
    pub total_points: u64,
    pub bounds: PointCloudBounds,
    pub offset: [f32; 3],
    pub pack_magic: f32,
}

impl RootHeader {
    fn to_record(&self) -> String {
        let mut fields = vec![
            self.version.to_string(),
            self.grid_size.to_string(),
            self.total_points.to_string(),
        ];
        fields.extend(self.bounds.to_array().iter().map(f32::to_string));
        fields.extend(self.offset.iter().map(f32::to_string));
        fields.push(self.pack_magic.to_string());
        join(&fields)
    }

    fn from_record(line: &str) -> Result<Self> {
        let fields = split(0, line, HEADER_FIELDS)?;
        let mut floats = [0.0f32; 10];
        for (slot, field) in floats.iter_mut().zip(&fields[3..]) {
            *slot = parse(0, field)?;
        }

        Ok(Self {
            version: parse(0, fields[0])?,
            grid_size: parse(0, fields[1])?,
            total_points: parse(0, fields[2])?,
            bounds: PointCloudBounds::from_array([
                floats[0], floats[1], floats[2], floats[3], floats[4], floats[5],
            ]),
            offset: [floats[6], floats[7], floats[8]],
            pack_magic: floats[9],
        })
    }
}

/// A complete root index: header plus one record per tile.
#[derive(Debug, Clone, PartialEq)]
pub struct RootIndex {
    pub header: RootHeader,
    pub tiles: Vec<TileSummary>,
}

impl RootIndex {
    /// Render the index as text, header first.
    pub fn to_text(&self) -> String {
        let mut text = self.header.to_record();
        text.push('\n');
        for tile in &self.tiles {
            text.push_str(&tile.to_record());
            text.push('\n');
        }
        text
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        let (_, header_line) = lines.next().ok_or_else(|| ExportError::MalformedRootIndex {
            line: 0,
            reason: "missing header".into(),
        })?;
        let header = RootHeader::from_record(header_line)?;

        let tiles = lines
            .map(|(line_no, line)| TileSummary::from_record(line_no, line))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { header, tiles })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        Self::parse(&text)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text()).map_err(|e| ExportError::io(path, e))
    }
}

/// Outcome of writing the root index.
#[derive(Debug, Clone, PartialEq)]
pub struct RootIndexReport {
    pub tile_count: usize,
    pub total_points: u64,
    /// No tile was emitted during the whole run.
    pub no_tiles: bool,
}

/// Collects tile summaries across every batch of a run.
#[derive(Debug, Default)]
pub struct RootIndexAggregator {
    tiles: Vec<TileSummary>,
    skipped_cells: usize,
}

impl RootIndexAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, summary: TileSummary) {
        self.tiles.push(summary);
    }

    pub fn record_skipped(&mut self, count: usize) {
        self.skipped_cells += count;
    }

    pub fn tiles(&self) -> &[TileSummary] {
        &self.tiles
    }

    pub fn skipped_cells(&self) -> usize {
        self.skipped_cells
    }

    pub fn total_points(&self) -> u64 {
        self.tiles.iter().map(|t| t.total_points).sum()
    }

    /// Build the index from everything accumulated so far.
    pub fn build(&self, settings: &ExportSettings, global_bounds: &PointCloudBounds) -> RootIndex {
        RootIndex {
            header: RootHeader {
                version: settings.format_version(),
                grid_size: settings.grid_size,
                total_points: self.total_points(),
                bounds: *global_bounds,
                offset: settings.offset,
                pack_magic: settings.pack_magic,
            },
            tiles: self.tiles.clone(),
        }
    }

    /// Write the root index next to the tiles.
    ///
    /// An empty run still writes the header line and warns with remedies
    /// instead of failing.
    pub fn write(
        &self,
        settings: &ExportSettings,
        global_bounds: &PointCloudBounds,
    ) -> Result<RootIndexReport> {
        let index = self.build(settings, global_bounds);
        let root_path = settings.root_path();
        index.write(&root_path)?;

        info!(
            "Saved root index {} ({} tiles, total points {})",
            root_path.display(),
            index.tiles.len(),
            human_readable_count(index.header.total_points)
        );

        if self.skipped_cells > 0 {
            info!(
                "Skipped {} cells with less than {} points or none left after decimation",
                self.skipped_cells, settings.minimum_point_count
            );
        }

        let no_tiles = index.tiles.is_empty();
        if no_tiles {
            warn!(
                "No tiles found! Try a bigger grid size, a smaller minimum point count, \
                 or scale the cloud down"
            );
        }

        Ok(RootIndexReport {
            tile_count: index.tiles.len(),
            total_points: index.header.total_points,
            no_tiles,
        })
    }
}

fn join(fields: &[String]) -> String {
    fields.join(&SEPARATOR.to_string())
}

fn split(line_no: usize, line: &str, expected: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.trim_end().split(SEPARATOR).collect();
    if fields.len() != expected {
        return Err(ExportError::MalformedRootIndex {
            line: line_no,
            reason: format!("expected {} fields, found {}", expected, fields.len()),
        });
    }
    Ok(fields)
}

fn parse<T: std::str::FromStr>(line_no: usize, field: &str) -> Result<T> {
    field.parse().map_err(|_| ExportError::MalformedRootIndex {
        line: line_no,
        reason: format!("cannot parse field '{}'", field),
    })
}
