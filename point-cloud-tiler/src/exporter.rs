//! Run context orchestrating bucketing, tile writing and the root index.
use crate::bounds::PointCloudBounds;
use crate::constants::PACK_LAYOUT_REVISION;
use crate::error::{ExportError, Result};
use crate::grid::GridBucketer;
use crate::point::Point;
use crate::root_index::{RootIndexAggregator, RootIndexReport, TileSummary};
use crate::settings::ExportSettings;
use crate::tile_writer::TileWriter;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of saving one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub batch_index: usize,
    pub tiles_written: usize,
    /// Cells dropped for having fewer than the minimum point count, or
    /// left without points by decimation.
    pub skipped_cells: usize,
    pub points_written: u64,
    /// Set when the root index was written after this batch.
    pub root: Option<RootIndexReport>,
}

/// State of one conversion job.
///
/// Global bounds and tile summaries live for the whole run; cell buffers
/// are cleared whenever a new batch begins. Separate exporters never share
/// state, so independent runs can coexist in one process.
pub struct PcrootExporter {
    settings: ExportSettings,
    global_bounds: PointCloudBounds,
    grid: GridBucketer,
    aggregator: RootIndexAggregator,
    rng: StdRng,
    current_batch: Option<usize>,
}

impl PcrootExporter {
    /// Validate settings and prepare the output directory.
    pub fn new(settings: ExportSettings) -> Result<Self> {
        settings.validate()?;

        let output_dir = settings.output_dir();
        fs::create_dir_all(&output_dir).map_err(|e| ExportError::io(&output_dir, e))?;

        let seed = settings.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        });

        info!(
            "Exporting to {} (grid size {}, format version {})",
            settings.root_path().display(),
            settings.grid_size,
            settings.format_version()
        );
        if settings.pack_colors {
            info!(
                "Packing colours with layout revision {} (magic {})",
                PACK_LAYOUT_REVISION, settings.pack_magic
            );
        }

        Ok(Self {
            grid: GridBucketer::new(settings.grid_size),
            global_bounds: PointCloudBounds::new(),
            aggregator: RootIndexAggregator::new(),
            rng: StdRng::seed_from_u64(seed),
            current_batch: None,
            settings,
        })
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn global_bounds(&self) -> &PointCloudBounds {
        &self.global_bounds
    }

    pub fn tiles(&self) -> &[TileSummary] {
        self.aggregator.tiles()
    }

    pub fn grid(&self) -> &GridBucketer {
        &self.grid
    }

    /// Start ingesting a batch, discarding cell buffers of the previous one.
    pub fn begin_batch(&mut self, batch_index: usize) -> Result<()> {
        if batch_index >= self.settings.batch_count {
            return Err(ExportError::BatchOutOfRange {
                index: batch_index,
                count: self.settings.batch_count,
            });
        }

        self.grid.clear();
        self.current_batch = Some(batch_index);
        Ok(())
    }

    /// Record a point in the global bounds and bucket it into its cell.
    pub fn add_point(&mut self, point: Point) -> Result<()> {
        if self.current_batch.is_none() {
            return Err(ExportError::NoActiveBatch);
        }

        self.global_bounds.observe(&point);
        self.grid.insert(point);
        Ok(())
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) -> Result<()> {
        for point in points {
            self.add_point(point)?;
        }
        Ok(())
    }

    /// Write all eligible cells of the current batch as tiles.
    ///
    /// The root index is written after the last batch, and after every batch
    /// when checkpointing is enabled.
    pub fn save_batch(&mut self) -> Result<BatchReport> {
        let batch_index = self.current_batch.take().ok_or(ExportError::NoActiveBatch)?;

        info!(
            "Saving {} cells of batch {} to {}",
            self.grid.cell_count(),
            batch_index,
            self.settings.output_dir().display()
        );

        let writer = TileWriter::new(&self.settings);
        let mut report = BatchReport {
            batch_index,
            tiles_written: 0,
            skipped_cells: 0,
            points_written: 0,
            root: None,
        };

        for cell in self.grid.drain() {
            if !writer.is_eligible(&cell) {
                report.skipped_cells += 1;
                continue;
            }

            let Some(summary) = writer.write_cell(batch_index, cell, &mut self.rng)? else {
                report.skipped_cells += 1;
                continue;
            };
            report.tiles_written += 1;
            report.points_written += summary.total_points;
            self.aggregator.add(summary);
        }
        self.aggregator.record_skipped(report.skipped_cells);

        info!(
            "Batch {}: {} tiles, {} points, {} cells skipped",
            batch_index, report.tiles_written, report.points_written, report.skipped_cells
        );

        if self.settings.is_last_batch(batch_index) || self.settings.checkpoint_root {
            report.root = Some(self.aggregator.write(&self.settings, &self.global_bounds)?);
        }

        Ok(report)
    }
}
