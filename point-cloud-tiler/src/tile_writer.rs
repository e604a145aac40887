//! Writes grid cells to `.pct` tile payloads.
//!
//! A tile is a flat sequence of little-endian `f32` triples. Unpacked tiles
//! store `x, y, z` per point and a sibling `<tile>.rgb` file with `r, g, b`
//! per point in the same order. Packed tiles fold each colour channel into
//! the matching cell-local coordinate and have no colour file.
use crate::bounds::PointCloudBounds;
use crate::constants::{COLOUR_PACK_SCALE, COLOUR_SUFFIX, NAME_JOINER, TILE_EXTENSION};
use crate::error::{ExportError, Result};
use crate::grid::{Cell, CellKey};
use crate::packer::ColorPositionPacker;
use crate::point::Point;
use crate::root_index::TileSummary;
use crate::settings::{CollisionPolicy, ExportSettings};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Serialises cells of one run into tile files.
pub struct TileWriter<'a> {
    settings: &'a ExportSettings,
    output_dir: PathBuf,
    base_name: String,
    packer: Option<ColorPositionPacker>,
}

impl<'a> TileWriter<'a> {
    pub fn new(settings: &'a ExportSettings) -> Self {
        let packer = settings
            .pack_colors
            .then(|| ColorPositionPacker::new(settings.grid_size, settings.pack_magic));

        Self {
            settings,
            output_dir: settings.output_dir(),
            base_name: settings.base_name(),
            packer,
        }
    }

    /// Whether a cell has enough points to become a tile.
    pub fn is_eligible(&self, cell: &Cell) -> bool {
        cell.len() >= self.settings.minimum_point_count
    }

    /// Shuffle, decimate and write one cell, returning its tile summary.
    ///
    /// Returns `None` without touching the disk when decimation leaves no
    /// points, e.g. a single-point cell under `SkipEvery(n)`.
    pub fn write_cell(
        &self,
        batch_index: usize,
        mut cell: Cell,
        rng: &mut StdRng,
    ) -> Result<Option<TileSummary>> {
        if self.settings.randomize {
            cell.points.shuffle(rng);
        }

        let retained: Vec<Point> = cell
            .points
            .iter()
            .enumerate()
            .filter(|(i, _)| self.settings.decimation.retains(*i))
            .map(|(_, p)| *p)
            .collect();
        if retained.is_empty() {
            debug!("Cell {} has no points left after decimation", cell.key);
            return Ok(None);
        }

        let mut bounds = PointCloudBounds::new();
        for point in &retained {
            bounds.observe(point);
        }

        let (file_name, path) = self.tile_path(batch_index, &cell.key);
        self.write_positions(&path, &cell.key, &retained)?;
        if self.packer.is_none() {
            write_colours(&colour_path(&path), &retained)?;
        }

        debug!(
            "Wrote tile {} ({} of {} points)",
            file_name,
            retained.len(),
            cell.len()
        );

        Ok(Some(TileSummary::new(
            file_name,
            retained.len() as u64,
            bounds,
            cell.key,
        )))
    }

    /// File name and full path of a tile, resolving collisions.
    ///
    /// Only later batches can collide with files from an earlier run; those
    /// get a timestamp suffix unless overwriting is configured. Existing
    /// files are never appended to or merged.
    pub fn tile_path(&self, batch_index: usize, key: &CellKey) -> (String, PathBuf) {
        let stem = format!("{}{j}{}{j}{}", self.base_name, batch_index, key, j = NAME_JOINER);
        let file_name = format!("{stem}.{TILE_EXTENSION}");
        let path = self.output_dir.join(&file_name);

        let collides = batch_index > 0
            && self.settings.collision == CollisionPolicy::TimestampSuffix
            && path.exists();
        if !collides {
            return (file_name, path);
        }

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let file_name = format!("{stem}{NAME_JOINER}r{stamp}.{TILE_EXTENSION}");
        let path = self.output_dir.join(&file_name);
        (file_name, path)
    }

    fn write_positions(&self, path: &Path, key: &CellKey, points: &[Point]) -> Result<()> {
        let grid_size = self.settings.grid_size;
        let origin = key.origin(grid_size);
        let make_local = self.packer.is_some() || self.settings.local_positions;

        write_records(path, points.iter().map(|p| {
            let mut xyz = [p.x, p.y, p.z];
            if make_local {
                xyz[0] -= origin.0;
                xyz[1] -= origin.1;
                xyz[2] -= origin.2;
            }
            if let Some(packer) = &self.packer {
                let rgb = p.colour();
                for axis in 0..3 {
                    xyz[axis] = packer.pack(rgb[axis] * COLOUR_PACK_SCALE, xyz[axis]);
                }
            }
            xyz
        }))
    }
}

fn write_colours(path: &Path, points: &[Point]) -> Result<()> {
    write_records(path, points.iter().map(Point::colour))
}

/// Path of the colour file belonging to a tile.
pub fn colour_path(tile_path: &Path) -> PathBuf {
    let mut name = tile_path.as_os_str().to_owned();
    name.push(COLOUR_SUFFIX);
    PathBuf::from(name)
}

fn write_records(path: &Path, records: impl Iterator<Item = [f32; 3]>) -> Result<()> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for record in records {
        for value in record {
            writer
                .write_all(&value.to_le_bytes())
                .map_err(|e| ExportError::io(path, e))?;
        }
    }

    writer.flush().map_err(|e| ExportError::io(path, e))
}

/// Read a tile or colour file back into `f32` triples.
pub fn read_records(path: &Path) -> Result<Vec<[f32; 3]>> {
    let bytes = std::fs::read(path).map_err(|e| ExportError::io(path, e))?;
    Ok(bytes
        .chunks_exact(12)
        .map(|chunk| {
            let value = |i: usize| {
                f32::from_le_bytes([chunk[i], chunk[i + 1], chunk[i + 2], chunk[i + 3]])
            };
            [value(0), value(4), value(8)]
        })
        .collect())
}
