use crate::constants::LAS_COLOUR_MAX;
use crate::coordinates::CoordinateTransform;
use crate::error::{ExportError, Result};
use crate::point::Point;
use las::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Create LAS file reader for point cloud access.
/// Handles both .las and .laz compressed formats.
pub fn create_reader(file_path: &Path) -> Result<Reader> {
    let file = File::open(file_path).map_err(|e| ExportError::io(file_path, e))?;
    let buf_reader = BufReader::new(file);
    Ok(Reader::new(buf_reader)?)
}

/// Raw coordinates of the first point in a file, used for automatic offsets.
pub fn first_position(file_path: &Path) -> Result<Option<(f64, f64, f64)>> {
    let mut reader = create_reader(file_path)?;
    match reader.points().next() {
        Some(point) => {
            let point = point?;
            Ok(Some((point.x, point.y, point.z)))
        }
        None => Ok(None),
    }
}

/// Convert a LAS point into tile space with colours normalised to `[0, 1]`.
/// Points without colour become white.
pub fn convert_point(point: &las::Point, transform: &CoordinateTransform) -> Point {
    let position = transform.apply(point.x, point.y, point.z);
    let colour = point.color.map_or((1.0, 1.0, 1.0), |c| {
        (
            c.red as f32 / LAS_COLOUR_MAX,
            c.green as f32 / LAS_COLOUR_MAX,
            c.blue as f32 / LAS_COLOUR_MAX,
        )
    });
    Point::new(position, colour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use las::Color;

    #[test]
    fn colours_are_normalised_and_default_to_white() {
        let transform = CoordinateTransform {
            swap_yz: false,
            ..Default::default()
        };
        let mut point = las::Point {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            ..Default::default()
        };

        let white = convert_point(&point, &transform);
        assert_eq!(white.colour(), [1.0, 1.0, 1.0]);
        assert_eq!(white.position(), [1.0, 2.0, 3.0]);

        point.color = Some(Color::new(65535, 0, 65535));
        let coloured = convert_point(&point, &transform);
        assert_eq!(coloured.colour(), [1.0, 0.0, 1.0]);
    }
}
