use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One LED colour, 8 bits per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed RGBA for upload, alpha always opaque.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Parallel LED position/colour arrays.
///
/// Positions change only when a model is loaded and are tracked with a dirty flag.
/// Colours are rewritten by the animation host every frame and always uploaded.
#[derive(Debug, Clone, Default)]
pub struct LedBuffer {
    positions: Vec<Vec3>,
    colors: Vec<LedColor>,
    positions_dirty: bool,
}

impl LedBuffer {
    pub fn new(positions: Vec<Vec3>) -> Self {
        let colors = vec![LedColor::BLACK; positions.len()];
        Self {
            positions,
            colors,
            positions_dirty: true,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[LedColor] {
        &self.colors
    }

    /// The narrow write interface handed to the animation host.
    pub fn colors_mut(&mut self) -> &mut [LedColor] {
        &mut self.colors
    }

    pub fn clear(&mut self) {
        self.colors.fill(LedColor::BLACK);
    }

    /// Swaps in a whole new position set. Colours are reset to black at the new length.
    pub fn replace(&mut self, positions: Vec<Vec3>) {
        *self = Self::new(positions);
    }

    pub fn is_dirty(&self) -> bool {
        self.positions_dirty
    }

    pub fn mark_clean(&mut self) {
        self.positions_dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.positions_dirty = true;
    }

    pub fn position_data(&self) -> Vec<[f32; 3]> {
        self.positions.iter().map(|p| p.to_array()).collect()
    }

    /// Packs colours into `out`, reusing its allocation.
    pub fn pack_colors(&self, out: &mut Vec<[u8; 4]>) {
        out.clear();
        out.extend(self.colors.iter().map(|c| c.to_rgba()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_dark_and_dirty() {
        let leds = LedBuffer::new(vec![Vec3::ZERO, Vec3::X]);
        assert_eq!(leds.len(), 2);
        assert!(leds.is_dirty());
        assert!(leds.colors().iter().all(|c| *c == LedColor::BLACK));
    }

    #[test]
    fn replace_resizes_both_arrays() {
        let mut leds = LedBuffer::new(vec![Vec3::ZERO]);
        leds.colors_mut()[0] = LedColor::WHITE;
        leds.mark_clean();

        leds.replace(vec![Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(leds.len(), 3);
        assert_eq!(leds.colors().len(), 3);
        assert!(leds.is_dirty());
        assert_eq!(leds.colors()[0], LedColor::BLACK);
    }

    #[test]
    fn pack_colors_reuses_buffer() {
        let mut leds = LedBuffer::new(vec![Vec3::ZERO, Vec3::X]);
        leds.colors_mut()[1] = LedColor::new(1, 2, 3);
        let mut packed = Vec::with_capacity(8);
        leds.pack_colors(&mut packed);
        assert_eq!(packed, vec![[0, 0, 0, 255], [1, 2, 3, 255]]);
        leds.pack_colors(&mut packed);
        assert_eq!(packed.len(), 2);
    }
}
