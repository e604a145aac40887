//! Lossy colour + position packing for version 2 tiles.
//!
//! Layout revision 1 stores one colour channel and one cell-local coordinate
//! in a single `f32`:
//!
//! ```text
//! level  = floor(colour * pack_magic)       colour already scaled to [0, 0.98]
//! packed = level * grid_size + local        local in [0, grid_size)
//! ```
//!
//! Decoding reverses it with `level = floor(packed / grid_size)`. The integer
//! part carries the colour, the remainder carries the position. Because the
//! packed value can reach `pack_magic * grid_size`, the position keeps only
//! about `pack_magic * grid_size * f32::EPSILON` of precision; colour is
//! quantised to `1 / pack_magic` steps. Both losses are accepted for
//! rendering.

/// Packs colour channels and cell-local coordinates for one grid size.
#[derive(Debug, Clone, Copy)]
pub struct ColorPositionPacker {
    grid_size: f32,
    pack_magic: f32,
}

impl ColorPositionPacker {
    pub fn new(grid_size: f32, pack_magic: f32) -> Self {
        Self {
            grid_size,
            pack_magic,
        }
    }

    /// Combined scale `grid_size * pack_magic`, the largest packed value.
    pub fn magic(&self) -> f32 {
        self.grid_size * self.pack_magic
    }

    /// Worst case absolute error of a decoded local coordinate.
    pub fn position_precision(&self) -> f32 {
        self.magic() * f32::EPSILON
    }

    /// Worst case absolute error of a decoded colour channel.
    pub fn colour_precision(&self) -> f32 {
        1.0 / self.pack_magic
    }

    /// Pack a colour channel in `[0, 0.98]` with a local offset in `[0, grid_size)`.
    ///
    /// The offset is clamped just below `grid_size` so rounding can never
    /// carry into the next colour level.
    pub fn pack(&self, colour: f32, local: f32) -> f32 {
        let max_level = (self.pack_magic - 1.0).max(0.0);
        let level = (colour * self.pack_magic).floor().clamp(0.0, max_level);
        let max_local = self.grid_size - 2.0 * self.position_precision();
        let local = local.clamp(0.0, max_local);
        level * self.grid_size + local
    }

    /// Recover `(colour, local)` from a packed value.
    ///
    /// The colour is the quantised level in the packed domain, i.e. still
    /// scaled by 0.98.
    pub fn unpack(&self, packed: f32) -> (f32, f32) {
        let mut level = (packed / self.grid_size).floor();
        let mut local = packed - level * self.grid_size;

        // Division can land just under an exact level boundary.
        if local > self.grid_size - self.position_precision() {
            level += 1.0;
            local -= self.grid_size;
        }
        (level / self.pack_magic, local.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COLOUR_PACK_SCALE;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn round_trip_recovers_position_and_quantised_colour() {
        let packer = ColorPositionPacker::new(10.0, 64.0);
        let tolerance = packer.position_precision() * 4.0;

        for &colour in &[0.0f32, 0.25, 0.5, 0.75, 1.0] {
            for &local in &[0.0f32, 0.001, 3.3, 7.125, 9.9] {
                let scaled = colour * COLOUR_PACK_SCALE;
                let (decoded_colour, decoded_local) = packer.unpack(packer.pack(scaled, local));

                assert_approx_eq!(decoded_local, local, tolerance);
                assert!(decoded_colour <= scaled + 1e-6);
                assert!(scaled - decoded_colour <= packer.colour_precision() + 1e-6);
            }
        }
    }

    #[test]
    fn precision_scales_with_grid_and_magic() {
        let small = ColorPositionPacker::new(1.0, 64.0);
        let large = ColorPositionPacker::new(100.0, 64.0);
        assert_approx_eq!(small.magic(), 64.0);
        assert!(large.position_precision() > small.position_precision());
        assert!(large.position_precision() < 0.01);
    }

    #[test]
    fn local_at_cell_edge_does_not_roll_into_next_level() {
        let packer = ColorPositionPacker::new(10.0, 64.0);
        let packed = packer.pack(0.5, 9.999_999);
        let (colour, local) = packer.unpack(packed);
        assert_approx_eq!(colour, 32.0 / 64.0);
        assert!(local > 9.99);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let packer = ColorPositionPacker::new(2.0, 64.0);
        let (colour, local) = packer.unpack(packer.pack(-0.5, -1.0));
        assert_eq!(colour, 0.0);
        assert_eq!(local, 0.0);

        let (colour, _) = packer.unpack(packer.pack(1.5, 1.0));
        assert_approx_eq!(colour, 63.0 / 64.0);
    }
}
