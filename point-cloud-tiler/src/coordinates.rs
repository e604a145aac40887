/// Input coordinate conditioning applied before points reach the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    /// Subtracted from every input coordinate, after scaling.
    pub offset: [f64; 3],
    pub scale: Option<f64>,
    /// Swap Y and Z to turn Z-up survey data into Y-up viewer space.
    pub swap_yz: bool,
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self {
            offset: [0.0; 3],
            scale: None,
            swap_yz: true,
        }
    }
}

impl CoordinateTransform {
    /// Scale, shift and reorient a source coordinate into f32 tile space.
    /// Offsets are expressed in the output axis order.
    pub fn apply(&self, x: f64, y: f64, z: f64) -> (f32, f32, f32) {
        let s = self.scale.unwrap_or(1.0);
        let (x, y, z) = (x * s, y * s, z * s);
        let (x, y, z) = if self.swap_yz { (x, z, y) } else { (x, y, z) };

        (
            (x - self.offset[0]) as f32,
            (y - self.offset[1]) as f32,
            (z - self.offset[2]) as f32,
        )
    }

    /// Offset that moves the given source coordinate to the origin.
    pub fn offset_for(&self, x: f64, y: f64, z: f64) -> [f64; 3] {
        let s = self.scale.unwrap_or(1.0);
        let (x, y, z) = (x * s, y * s, z * s);
        if self.swap_yz { [x, z, y] } else { [x, y, z] }
    }
}
