//! Grid tiling of point clouds into `.pct` tiles with a `.pcroot` index.
pub mod bounds;
pub mod constants;
pub mod coordinates;
pub mod error;
pub mod exporter;
pub mod grid;
pub mod las_source;
pub mod packer;
pub mod point;
pub mod root_index;
pub mod settings;
pub mod tile_writer;

pub use bounds::PointCloudBounds;
pub use error::{ExportError, Result};
pub use exporter::{BatchReport, PcrootExporter};
pub use grid::{Cell, CellKey, GridBucketer};
pub use packer::ColorPositionPacker;
pub use point::Point;
pub use root_index::{RootHeader, RootIndex, RootIndexAggregator, RootIndexReport, TileSummary};
pub use settings::{CollisionPolicy, Decimation, ExportSettings};
