//! Export configuration consumed by the tiler.
use crate::constants::{
    DEFAULT_GRID_SIZE, DEFAULT_MINIMUM_POINT_COUNT, DEFAULT_PACK_MAGIC, ROOT_EXTENSION,
    VERSION_PACKED, VERSION_UNPACKED,
};
use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-cell point thinning. Skip and keep modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decimation {
    #[default]
    None,
    /// Drop every point whose index in the cell is a multiple of the stride.
    SkipEvery(usize),
    /// Keep only points whose index in the cell is a multiple of the stride.
    KeepEvery(usize),
}

impl Decimation {
    /// Whether the point at `index` within its cell survives decimation.
    pub fn retains(&self, index: usize) -> bool {
        match *self {
            Decimation::None => true,
            Decimation::SkipEvery(n) => index % n != 0,
            Decimation::KeepEvery(n) => index % n == 0,
        }
    }
}

/// What to do when a tile file for a later batch already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Append `_r<unix seconds>` to the new tile name.
    #[default]
    TimestampSuffix,
    /// Replace the existing file.
    Overwrite,
}

/// Settings for one export run. Read-only once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Edge length of each cubic grid cell.
    pub grid_size: f32,
    /// Cells with fewer points than this are dropped.
    pub minimum_point_count: usize,
    pub decimation: Decimation,
    /// Shuffle each cell before writing for progressive loading.
    pub randomize: bool,
    /// Seed for the shuffle; random when unset.
    pub seed: Option<u64>,
    pub pack_colors: bool,
    pub pack_magic: f32,
    /// Offset already subtracted from the input, recorded in the root header.
    pub offset: [f32; 3],
    /// Write unpacked positions relative to their cell origin.
    pub local_positions: bool,
    /// Path of the root index file. Tiles are written next to it.
    pub output: PathBuf,
    pub batch_count: usize,
    pub collision: CollisionPolicy,
    /// Rewrite the root index after every batch, not only the last one.
    pub checkpoint_root: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            minimum_point_count: DEFAULT_MINIMUM_POINT_COUNT,
            decimation: Decimation::None,
            randomize: true,
            seed: None,
            pack_colors: false,
            pack_magic: DEFAULT_PACK_MAGIC,
            offset: [0.0; 3],
            local_positions: false,
            output: PathBuf::from(format!("output.{ROOT_EXTENSION}")),
            batch_count: 1,
            collision: CollisionPolicy::TimestampSuffix,
            checkpoint_root: false,
        }
    }
}

impl ExportSettings {
    /// Load settings from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.grid_size.is_finite() || self.grid_size <= 0.0 {
            return Err(ExportError::InvalidSettings(format!(
                "grid size must be a positive number, got {}",
                self.grid_size
            )));
        }

        match self.decimation {
            Decimation::SkipEvery(0) | Decimation::KeepEvery(0) => {
                return Err(ExportError::InvalidSettings(
                    "decimation stride must be at least 1".into(),
                ));
            }
            _ => {}
        }

        if self.batch_count == 0 {
            return Err(ExportError::InvalidSettings(
                "batch count must be at least 1".into(),
            ));
        }

        if self.pack_colors && !(self.pack_magic.is_finite() && self.pack_magic >= 1.0) {
            return Err(ExportError::InvalidSettings(format!(
                "pack magic must be at least 1, got {}",
                self.pack_magic
            )));
        }

        if self.output.file_stem().is_none() {
            return Err(ExportError::InvalidSettings(format!(
                "output path has no file name: {}",
                self.output.display()
            )));
        }

        Ok(())
    }

    /// Root header version: packed and unpacked tiles use different schemas.
    pub fn format_version(&self) -> u32 {
        if self.pack_colors {
            VERSION_PACKED
        } else {
            VERSION_UNPACKED
        }
    }

    /// Directory receiving tiles and the root index.
    pub fn output_dir(&self) -> PathBuf {
        match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Output file name without extension, prefix of every tile name.
    pub fn base_name(&self) -> String {
        self.output
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    pub fn root_path(&self) -> PathBuf {
        self.output_dir()
            .join(format!("{}.{}", self.base_name(), ROOT_EXTENSION))
    }

    pub fn is_last_batch(&self, batch_index: usize) -> bool {
        batch_index + 1 == self.batch_count
    }
}
