/// A single input point: position plus normalised colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Colour channels, expected in `[0, 1]`.
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Point {
    pub fn new(position: (f32, f32, f32), colour: (f32, f32, f32)) -> Self {
        Self {
            x: position.0,
            y: position.1,
            z: position.2,
            r: colour.0,
            g: colour.1,
            b: colour.2,
        }
    }

    /// Point with white colour.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new((x, y, z), (1.0, 1.0, 1.0))
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn colour(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}
