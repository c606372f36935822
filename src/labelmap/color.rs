//! Color projection of a label map.

use super::LabelMap;
use crate::core::{ColorVolume, Rgba};
use crate::entry::ObjectEntry;

/// End colors handed out by [`LabelMap::build_from_image`], cycled.
pub const PALETTE: [[i32; 3]; 8] = [
    [250, 0, 0],
    [0, 250, 0],
    [0, 0, 250],
    [250, 250, 0],
    [250, 0, 250],
    [0, 250, 250],
    [250, 125, 0],
    [125, 0, 250],
];

#[inline]
fn channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Pixel for one entry: its end color, alpha from opacity.
///
/// Channels are clamped to 0-255 whatever the record holds.
fn entry_pixel(entry: &ObjectEntry) -> Rgba {
    if !entry.is_visible() {
        return Rgba::TRANSPARENT;
    }
    let c = entry.end_color();
    let alpha = (entry.opacity().clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba::new(channel(c.x), channel(c.y), channel(c.z), alpha)
}

impl LabelMap {
    /// Map every voxel through its entry's color and opacity.
    ///
    /// Background, hidden entries and labels without an entry come out
    /// transparent black. The map itself is not touched.
    pub fn to_color_image(&self) -> ColorVolume {
        let mut lut = [Rgba::TRANSPARENT; 256];
        for (i, entry) in self.entries().iter().enumerate() {
            lut[i + 1] = entry_pixel(entry);
        }
        ColorVolume::from_labels(self.volume(), &lut)
    }
}
