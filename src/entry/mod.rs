//! Object entries.
//!
//! An [`ObjectEntry`] describes one labeled structure of an object map:
//! its display name, color ramp, per-object transform and bounding brick,
//! plus the compositing parameters a renderer consumes. The record layout
//! on disk is fixed (see [`codec`]); every field except the name is written
//! in this order:
//!
//! ```text
//! offset  width  field
//!      0     32  name (NUL padded)
//!     32      4  display_flag
//!     36      1  copy_flag, mirror_flag, status_flag, neighbors_used_flag
//!     40      4  shades
//!     44     12  start_red, start_green, start_blue
//!     56     12  end_red, end_green, end_blue
//!     68     36  x/y/z rotation, x/y/z translation, x/y/z center
//!    104     24  x/y/z rotation increment, x/y/z translation increment
//!    128     12  minimum x/y/z, maximum x/y/z (i16)
//!    140      4  opacity (f32)
//!    144      4  opacity_thickness
//!    148      4  blend_factor (f32)
//! ```

pub mod codec;

use std::fmt;

use glam::{I16Vec3, IVec3};

pub use codec::ENTRY_RECORD_SIZE;

/// Bytes reserved for the name on disk, terminator included.
pub const NAME_SIZE: usize = 32;

/// Longest name that fits in front of the terminator.
pub const MAX_NAME_LEN: usize = NAME_SIZE - 1;

/// Opacity of a freshly constructed entry.
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Metadata record for one labeled object.
///
/// Setters only mark the entry modified when the value actually changes,
/// so writing back an unchanged value is free. Equality compares the
/// stored record field-for-field (floats bitwise) and ignores the
/// modified flag.
#[derive(Clone, Debug)]
pub struct ObjectEntry {
    name: [u8; NAME_SIZE],
    display_flag: i32,
    copy_flag: u8,
    mirror_flag: u8,
    status_flag: u8,
    neighbors_used_flag: u8,
    shades: i32,
    start_red: i32,
    start_green: i32,
    start_blue: i32,
    end_red: i32,
    end_green: i32,
    end_blue: i32,
    x_rotation: i32,
    y_rotation: i32,
    z_rotation: i32,
    x_translation: i32,
    y_translation: i32,
    z_translation: i32,
    x_center: i32,
    y_center: i32,
    z_center: i32,
    x_rotation_increment: i32,
    y_rotation_increment: i32,
    z_rotation_increment: i32,
    x_translation_increment: i32,
    y_translation_increment: i32,
    z_translation_increment: i32,
    minimum_x_value: i16,
    minimum_y_value: i16,
    minimum_z_value: i16,
    maximum_x_value: i16,
    maximum_y_value: i16,
    maximum_z_value: i16,
    opacity: f32,
    opacity_thickness: i32,
    blend_factor: f32,
    modified: bool,
}

impl Default for ObjectEntry {
    fn default() -> Self {
        Self {
            name: [0; NAME_SIZE],
            display_flag: 1,
            copy_flag: 0,
            mirror_flag: 0,
            status_flag: 0,
            neighbors_used_flag: 0,
            shades: 1,
            start_red: 0,
            start_green: 0,
            start_blue: 0,
            end_red: 0,
            end_green: 0,
            end_blue: 0,
            x_rotation: 0,
            y_rotation: 0,
            z_rotation: 0,
            x_translation: 0,
            y_translation: 0,
            z_translation: 0,
            x_center: 0,
            y_center: 0,
            z_center: 0,
            x_rotation_increment: 0,
            y_rotation_increment: 0,
            z_rotation_increment: 0,
            x_translation_increment: 0,
            y_translation_increment: 0,
            z_translation_increment: 0,
            minimum_x_value: 0,
            minimum_y_value: 0,
            minimum_z_value: 0,
            maximum_x_value: 0,
            maximum_y_value: 0,
            maximum_z_value: 0,
            opacity: DEFAULT_OPACITY,
            opacity_thickness: 1,
            blend_factor: 0.0,
            modified: false,
        }
    }
}

macro_rules! accessors {
    ($($(#[$meta:meta])* $field:ident, $setter:ident: $ty:ty;)*) => {
        impl ObjectEntry {
            $(
                $(#[$meta])*
                #[inline]
                pub fn $field(&self) -> $ty {
                    self.$field
                }

                #[doc = concat!("Set `", stringify!($field), "`; marks the entry modified.")]
                pub fn $setter(&mut self, value: $ty) {
                    if self.$field != value {
                        self.$field = value;
                        self.modified = true;
                    }
                }
            )*
        }
    };
}

accessors! {
    /// Nonzero when voxels of this object take part in rendering. Zero
    /// makes a ray caster treat them as outside the threshold range.
    display_flag, set_display_flag: i32;
    /// Transforms are applied to a copy of the object instead of the object.
    copy_flag, set_copy_flag: u8;
    /// Axis the object is mirrored around.
    mirror_flag, set_mirror_flag: u8;
    /// Set when the object changed and its bounding brick is stale.
    status_flag, set_status_flag: u8;
    /// Mask of neighboring voxels used for shading.
    neighbors_used_flag, set_neighbors_used_flag: u8;
    /// Number of shades in the color ramp. Only 256 shades exist in total
    /// (250 in the legacy format).
    shades, set_shades: i32;
    start_red, set_start_red: i32;
    start_green, set_start_green: i32;
    start_blue, set_start_blue: i32;
    end_red, set_end_red: i32;
    end_green, set_end_green: i32;
    end_blue, set_end_blue: i32;
    x_rotation, set_x_rotation: i32;
    y_rotation, set_y_rotation: i32;
    z_rotation, set_z_rotation: i32;
    x_translation, set_x_translation: i32;
    y_translation, set_y_translation: i32;
    z_translation, set_z_translation: i32;
    /// Rotation center relative to the volume center.
    x_center, set_x_center: i32;
    y_center, set_y_center: i32;
    z_center, set_z_center: i32;
    /// Per-frame rotation delta used when generating sequences.
    x_rotation_increment, set_x_rotation_increment: i32;
    y_rotation_increment, set_y_rotation_increment: i32;
    z_rotation_increment, set_z_rotation_increment: i32;
    /// Per-frame translation delta used when generating sequences.
    x_translation_increment, set_x_translation_increment: i32;
    y_translation_increment, set_y_translation_increment: i32;
    z_translation_increment, set_z_translation_increment: i32;
    minimum_x_value, set_minimum_x_value: i16;
    minimum_y_value, set_minimum_y_value: i16;
    minimum_z_value, set_minimum_z_value: i16;
    maximum_x_value, set_maximum_x_value: i16;
    maximum_y_value, set_maximum_y_value: i16;
    maximum_z_value, set_maximum_z_value: i16;
    /// Contribution weight when compositing, from 0.0001 (nearly
    /// transparent) to 1.0 (opaque). `1 - opacity` is what remains for
    /// objects further along the ray.
    opacity, set_opacity: f32;
    /// How many times the surface color is accumulated; 1 means only the
    /// surface contributes.
    opacity_thickness, set_opacity_thickness: i32;
    /// Object color versus composite color: 1.0 takes everything from the
    /// object, 0.0 everything from the alpha map.
    blend_factor, set_blend_factor: f32;
}

impl ObjectEntry {
    /// Create an entry with default values and an empty name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a default entry with the given name.
    pub fn named(name: &str) -> Self {
        let mut entry = Self::default();
        entry.name = encode_name(name);
        entry
    }

    /// Display name, up to the first NUL.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(c_str(&self.name)).into_owned()
    }

    /// Raw 32-byte name field as stored on disk.
    #[inline]
    pub fn name_bytes(&self) -> &[u8; NAME_SIZE] {
        &self.name
    }

    /// True if the stored name equals `name` once truncated.
    pub fn has_name(&self, name: &str) -> bool {
        c_str(&self.name) == c_str(&encode_name(name))
    }

    /// Name bytes up to the terminator; bytes after it are ignored.
    pub(crate) fn name_key(&self) -> &[u8] {
        c_str(&self.name)
    }

    /// Set the name, truncated to [`MAX_NAME_LEN`] bytes and NUL padded.
    ///
    /// The entry is only marked modified when the stored string changes.
    pub fn set_name(&mut self, name: &str) {
        let encoded = encode_name(name);
        if c_str(&self.name) != c_str(&encoded) {
            self.name = encoded;
            self.modified = true;
        }
    }

    /// Copy every field except the name from `source`.
    ///
    /// Names identify entries inside a label map, so copying never
    /// duplicates one.
    pub fn copy_from(&mut self, source: &ObjectEntry) {
        if self.record_eq(source) {
            return;
        }
        let name = self.name;
        *self = source.clone();
        self.name = name;
        self.modified = true;
    }

    /// True once any setter changed a value since the last
    /// [`clear_modified`](Self::clear_modified).
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    #[inline]
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// True when the entry takes part in rendering.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.display_flag != 0
    }

    // === Grouped accessors ===

    pub fn start_color(&self) -> IVec3 {
        IVec3::new(self.start_red, self.start_green, self.start_blue)
    }

    pub fn set_start_color(&mut self, color: IVec3) {
        self.set_start_red(color.x);
        self.set_start_green(color.y);
        self.set_start_blue(color.z);
    }

    pub fn end_color(&self) -> IVec3 {
        IVec3::new(self.end_red, self.end_green, self.end_blue)
    }

    pub fn set_end_color(&mut self, color: IVec3) {
        self.set_end_red(color.x);
        self.set_end_green(color.y);
        self.set_end_blue(color.z);
    }

    pub fn rotation(&self) -> IVec3 {
        IVec3::new(self.x_rotation, self.y_rotation, self.z_rotation)
    }

    pub fn set_rotation(&mut self, rotation: IVec3) {
        self.set_x_rotation(rotation.x);
        self.set_y_rotation(rotation.y);
        self.set_z_rotation(rotation.z);
    }

    pub fn rotation_increment(&self) -> IVec3 {
        IVec3::new(
            self.x_rotation_increment,
            self.y_rotation_increment,
            self.z_rotation_increment,
        )
    }

    pub fn set_rotation_increment(&mut self, increment: IVec3) {
        self.set_x_rotation_increment(increment.x);
        self.set_y_rotation_increment(increment.y);
        self.set_z_rotation_increment(increment.z);
    }

    pub fn translation(&self) -> IVec3 {
        IVec3::new(self.x_translation, self.y_translation, self.z_translation)
    }

    pub fn set_translation(&mut self, translation: IVec3) {
        self.set_x_translation(translation.x);
        self.set_y_translation(translation.y);
        self.set_z_translation(translation.z);
    }

    pub fn translation_increment(&self) -> IVec3 {
        IVec3::new(
            self.x_translation_increment,
            self.y_translation_increment,
            self.z_translation_increment,
        )
    }

    pub fn set_translation_increment(&mut self, increment: IVec3) {
        self.set_x_translation_increment(increment.x);
        self.set_y_translation_increment(increment.y);
        self.set_z_translation_increment(increment.z);
    }

    pub fn center(&self) -> IVec3 {
        IVec3::new(self.x_center, self.y_center, self.z_center)
    }

    pub fn set_center(&mut self, center: IVec3) {
        self.set_x_center(center.x);
        self.set_y_center(center.y);
        self.set_z_center(center.z);
    }

    /// Lower corner of the bounding brick.
    pub fn minimum_coordinate(&self) -> I16Vec3 {
        I16Vec3::new(self.minimum_x_value, self.minimum_y_value, self.minimum_z_value)
    }

    pub fn set_minimum_coordinate(&mut self, min: I16Vec3) {
        self.set_minimum_x_value(min.x);
        self.set_minimum_y_value(min.y);
        self.set_minimum_z_value(min.z);
    }

    /// Upper corner of the bounding brick.
    pub fn maximum_coordinate(&self) -> I16Vec3 {
        I16Vec3::new(self.maximum_x_value, self.maximum_y_value, self.maximum_z_value)
    }

    pub fn set_maximum_coordinate(&mut self, max: I16Vec3) {
        self.set_maximum_x_value(max.x);
        self.set_maximum_y_value(max.y);
        self.set_maximum_z_value(max.z);
    }

    /// Compare every field but the name.
    fn record_eq(&self, other: &ObjectEntry) -> bool {
        self.to_bytes()[NAME_SIZE..] == other.to_bytes()[NAME_SIZE..]
    }
}

impl PartialEq for ObjectEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.record_eq(other)
    }
}

impl Eq for ObjectEntry {}

impl fmt::Display for ObjectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name: {}", self.name())?;
        writeln!(f, "display_flag: {}", self.display_flag)?;
        writeln!(f, "copy_flag: {}", self.copy_flag)?;
        writeln!(f, "mirror_flag: {}", self.mirror_flag)?;
        writeln!(f, "status_flag: {}", self.status_flag)?;
        writeln!(f, "neighbors_used_flag: {}", self.neighbors_used_flag)?;
        writeln!(f, "shades: {}", self.shades)?;
        writeln!(f, "start_color: {} {} {}", self.start_red, self.start_green, self.start_blue)?;
        writeln!(f, "end_color: {} {} {}", self.end_red, self.end_green, self.end_blue)?;
        writeln!(f, "rotation: {} {} {}", self.x_rotation, self.y_rotation, self.z_rotation)?;
        writeln!(
            f,
            "translation: {} {} {}",
            self.x_translation, self.y_translation, self.z_translation
        )?;
        writeln!(f, "center: {} {} {}", self.x_center, self.y_center, self.z_center)?;
        writeln!(
            f,
            "rotation_increment: {} {} {}",
            self.x_rotation_increment, self.y_rotation_increment, self.z_rotation_increment
        )?;
        writeln!(
            f,
            "translation_increment: {} {} {}",
            self.x_translation_increment,
            self.y_translation_increment,
            self.z_translation_increment
        )?;
        writeln!(
            f,
            "minimum: {} {} {}",
            self.minimum_x_value, self.minimum_y_value, self.minimum_z_value
        )?;
        writeln!(
            f,
            "maximum: {} {} {}",
            self.maximum_x_value, self.maximum_y_value, self.maximum_z_value
        )?;
        writeln!(f, "opacity: {}", self.opacity)?;
        writeln!(f, "opacity_thickness: {}", self.opacity_thickness)?;
        write!(f, "blend_factor: {}", self.blend_factor)
    }
}

/// Bytes of a NUL-terminated field up to (not including) the terminator.
fn c_str(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

/// Truncate to [`MAX_NAME_LEN`] bytes on a char boundary and NUL pad.
fn encode_name(name: &str) -> [u8; NAME_SIZE] {
    let mut end = name.len().min(MAX_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    let mut buf = [0u8; NAME_SIZE];
    buf[..end].copy_from_slice(&name.as_bytes()[..end]);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let e = ObjectEntry::new();
        assert_eq!(e.name(), "");
        assert_eq!(e.display_flag(), 1);
        assert_eq!(e.shades(), 1);
        assert_eq!(e.opacity(), 0.5);
        assert_eq!(e.opacity_thickness(), 1);
        assert_eq!(e.blend_factor(), 0.0);
        assert_eq!(e.end_color(), IVec3::ZERO);
        assert_eq!(e.maximum_coordinate(), I16Vec3::ZERO);
        assert!(!e.is_modified());
    }

    #[test]
    fn test_name_truncation() {
        let mut e = ObjectEntry::new();
        let long = "abcdefghijklmnopqrstuvwxyz0123456789ABCD";
        assert_eq!(long.len(), 40);
        e.set_name(long);
        assert_eq!(e.name().len(), MAX_NAME_LEN);
        assert_eq!(e.name(), &long[..31]);
        assert_eq!(e.name_bytes()[31], 0);
    }

    #[test]
    fn test_name_truncation_keeps_utf8() {
        let mut e = ObjectEntry::new();
        // 30 ASCII bytes followed by a two-byte char straddling the cap
        let name = format!("{}é", "x".repeat(30));
        e.set_name(&name);
        assert_eq!(e.name(), "x".repeat(30));
    }

    #[test]
    fn test_same_name_not_modified() {
        let mut e = ObjectEntry::new();
        e.set_name("Liver");
        assert!(e.is_modified());
        e.clear_modified();
        e.set_name("Liver");
        assert!(!e.is_modified());
    }

    #[test]
    fn test_setter_change_tracking() {
        let mut e = ObjectEntry::new();
        e.set_shades(1);
        e.set_opacity(0.5);
        assert!(!e.is_modified());
        e.set_shades(200);
        assert!(e.is_modified());
        e.clear_modified();
        e.set_end_color(IVec3::new(0, 0, 0));
        assert!(!e.is_modified());
        e.set_end_color(IVec3::new(250, 0, 0));
        assert!(e.is_modified());
        assert_eq!(e.end_red(), 250);
    }

    #[test]
    fn test_copy_keeps_name() {
        let mut a = ObjectEntry::named("A");
        let mut b = ObjectEntry::named("B");
        b.set_end_color(IVec3::new(10, 20, 30));
        b.set_rotation(IVec3::new(1, 2, 3));
        b.set_maximum_coordinate(I16Vec3::new(7, 8, 9));
        b.set_opacity(0.75);
        b.set_display_flag(0);

        a.copy_from(&b);
        assert_eq!(a.name(), "A");
        assert!(a.is_modified());
        assert_eq!(a.end_color(), b.end_color());
        assert_eq!(a.rotation(), b.rotation());
        assert_eq!(a.maximum_coordinate(), b.maximum_coordinate());
        assert_eq!(a.opacity(), 0.75);
        assert_eq!(a.display_flag(), 0);
        assert_ne!(a, b);

        a.set_name("B");
        assert_eq!(a, b);
    }

    #[test]
    fn test_copy_identical_not_modified() {
        let mut a = ObjectEntry::named("A");
        let b = ObjectEntry::named("B");
        a.copy_from(&b);
        assert!(!a.is_modified());
    }

    #[test]
    fn test_display_lists_fields() {
        let e = ObjectEntry::named("Skull");
        let text = e.to_string();
        assert!(text.starts_with("name: Skull"));
        assert!(text.contains("opacity: 0.5"));
        assert!(text.ends_with("blend_factor: 0"));
    }
}
