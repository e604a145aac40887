//! Shared constants for the pcroot tile format

/// Extension of tile payload files.
pub const TILE_EXTENSION: &str = "pct";

/// Suffix appended to a tile file name for its sibling colour file.
pub const COLOUR_SUFFIX: &str = ".rgb";

/// Extension of the root index file.
pub const ROOT_EXTENSION: &str = "pcroot";

/// Field separator used in tile names and root index records.
pub const SEPARATOR: char = '|';

/// Joins base name, batch index and cell coordinates in tile names.
pub const NAME_JOINER: char = '_';

/// Header version for tiles with separate position and colour files.
pub const VERSION_UNPACKED: u32 = 1;

/// Header version for tiles with colour packed into positions.
pub const VERSION_PACKED: u32 = 2;

/// Colour channels are scaled by this before packing so the quantised
/// level stays strictly below `pack_magic`.
pub const COLOUR_PACK_SCALE: f32 = 0.98;

/// Revision of the colour/position packing layout written under
/// `VERSION_PACKED`.
pub const PACK_LAYOUT_REVISION: u32 = 1;

pub const DEFAULT_GRID_SIZE: f32 = 10.0;
pub const DEFAULT_MINIMUM_POINT_COUNT: usize = 1000;
pub const DEFAULT_PACK_MAGIC: f32 = 64.0;

/// Maximum value of a 16-bit LAS colour channel.
pub const LAS_COLOUR_MAX: f32 = 65535.0;

/// Format a point count with a K/M/B suffix for log output.
pub fn human_readable_count(count: u64) -> String {
    if count < 1_000 {
        return count.to_string();
    }

    // Step up a unit whenever one decimal of rounding would reach 1000.
    let mut value = count as f64 / 1_000.0;
    for suffix in ["K", "M"] {
        if (value * 10.0).round() < 10_000.0 {
            return format!("{value:.1}{suffix}");
        }
        value /= 1_000.0;
    }
    format!("{value:.1}B")
}
