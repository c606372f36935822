//! Binary record codec for [`ObjectEntry`].
//!
//! Records are written in host byte order with no conversion; callers that
//! target a fixed-endian file call [`ObjectEntry::swap_endianness`] once
//! before writing. Reading converts each field on the fly when asked to.
//! Swapping twice is the identity, so a second swap in either direction
//! silently corrupts every multi-byte field.

use std::io::{self, Read, Write};

use byteorder::{NativeEndian, ReadBytesExt};

use super::{ObjectEntry, NAME_SIZE};
use crate::util::{Error, Result};

/// Size of one encoded entry record.
pub const ENTRY_RECORD_SIZE: usize = NAME_SIZE // name
    + 4 // display_flag
    + 4 // copy, mirror, status, neighbors_used flags
    + 4 // shades
    + 6 * 4 // start/end color
    + 9 * 4 // rotation, translation, center
    + 6 * 4 // rotation/translation increments
    + 6 * 2 // bounding brick
    + 4 // opacity
    + 4 // opacity_thickness
    + 4; // blend_factor

/// Reads fixed-width fields, tracking the offset for error reports.
struct FieldReader<R> {
    inner: R,
    offset: usize,
    swap: bool,
}

impl<R: Read> FieldReader<R> {
    fn new(inner: R, swap: bool) -> Self {
        Self { inner, offset: 0, swap }
    }

    fn fail(&self, field: &'static str) -> impl FnOnce(io::Error) -> Error {
        let offset = self.offset;
        move |e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::TruncatedRecord { field, offset }
            } else {
                Error::Io(e)
            }
        }
    }

    fn name(&mut self) -> Result<[u8; NAME_SIZE]> {
        let mut buf = [0u8; NAME_SIZE];
        self.inner.read_exact(&mut buf).map_err(self.fail("name"))?;
        self.offset += NAME_SIZE;
        Ok(buf)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8> {
        let v = self.inner.read_u8().map_err(self.fail(field))?;
        self.offset += 1;
        Ok(v)
    }

    fn i16(&mut self, field: &'static str) -> Result<i16> {
        let v = self.inner.read_i16::<NativeEndian>().map_err(self.fail(field))?;
        self.offset += 2;
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    fn i32(&mut self, field: &'static str) -> Result<i32> {
        let v = self.inner.read_i32::<NativeEndian>().map_err(self.fail(field))?;
        self.offset += 4;
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    fn f32(&mut self, field: &'static str) -> Result<f32> {
        let bits = self.inner.read_u32::<NativeEndian>().map_err(self.fail(field))?;
        self.offset += 4;
        Ok(f32::from_bits(if self.swap { bits.swap_bytes() } else { bits }))
    }
}

#[inline]
fn swap_f32(v: f32) -> f32 {
    f32::from_bits(v.to_bits().swap_bytes())
}

impl ObjectEntry {
    /// Decode one record from `reader`.
    ///
    /// With `need_byte_swap` every multi-byte field is converted from the
    /// file's byte order; the name is raw bytes and never converted.
    ///
    /// The blend factor is read for every file version. Older revisions are
    /// documented without it (`need_blend_factor == false`), but files
    /// written by those revisions do carry it and skipping it misaligns
    /// every following record by four bytes.
    pub fn read_from<R: Read>(
        reader: R,
        need_byte_swap: bool,
        need_blend_factor: bool,
    ) -> Result<Self> {
        let mut r = FieldReader::new(reader, need_byte_swap);

        let entry = Self {
            name: r.name()?,
            display_flag: r.i32("display_flag")?,
            copy_flag: r.u8("copy_flag")?,
            mirror_flag: r.u8("mirror_flag")?,
            status_flag: r.u8("status_flag")?,
            neighbors_used_flag: r.u8("neighbors_used_flag")?,
            shades: r.i32("shades")?,
            start_red: r.i32("start_red")?,
            start_green: r.i32("start_green")?,
            start_blue: r.i32("start_blue")?,
            end_red: r.i32("end_red")?,
            end_green: r.i32("end_green")?,
            end_blue: r.i32("end_blue")?,
            x_rotation: r.i32("x_rotation")?,
            y_rotation: r.i32("y_rotation")?,
            z_rotation: r.i32("z_rotation")?,
            x_translation: r.i32("x_translation")?,
            y_translation: r.i32("y_translation")?,
            z_translation: r.i32("z_translation")?,
            x_center: r.i32("x_center")?,
            y_center: r.i32("y_center")?,
            z_center: r.i32("z_center")?,
            x_rotation_increment: r.i32("x_rotation_increment")?,
            y_rotation_increment: r.i32("y_rotation_increment")?,
            z_rotation_increment: r.i32("z_rotation_increment")?,
            x_translation_increment: r.i32("x_translation_increment")?,
            y_translation_increment: r.i32("y_translation_increment")?,
            z_translation_increment: r.i32("z_translation_increment")?,
            minimum_x_value: r.i16("minimum_x_value")?,
            minimum_y_value: r.i16("minimum_y_value")?,
            minimum_z_value: r.i16("minimum_z_value")?,
            maximum_x_value: r.i16("maximum_x_value")?,
            maximum_y_value: r.i16("maximum_y_value")?,
            maximum_z_value: r.i16("maximum_z_value")?,
            opacity: r.f32("opacity")?,
            opacity_thickness: r.i32("opacity_thickness")?,
            blend_factor: r.f32("blend_factor")?,
            modified: false,
        };

        if !need_blend_factor {
            tracing::trace!(
                name = %entry.name(),
                "blend factor read from pre-blend-factor revision"
            );
        }
        tracing::trace!(name = %entry.name(), bytes = r.offset, "decoded object entry");
        Ok(entry)
    }

    /// Decode one record from a byte slice. Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8], need_byte_swap: bool) -> Result<Self> {
        Self::read_from(bytes, need_byte_swap, true)
    }

    /// Encode the record in host byte order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ENTRY_RECORD_SIZE);
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&self.display_flag.to_ne_bytes());
        buf.push(self.copy_flag);
        buf.push(self.mirror_flag);
        buf.push(self.status_flag);
        buf.push(self.neighbors_used_flag);
        for v in [
            self.shades,
            self.start_red,
            self.start_green,
            self.start_blue,
            self.end_red,
            self.end_green,
            self.end_blue,
            self.x_rotation,
            self.y_rotation,
            self.z_rotation,
            self.x_translation,
            self.y_translation,
            self.z_translation,
            self.x_center,
            self.y_center,
            self.z_center,
            self.x_rotation_increment,
            self.y_rotation_increment,
            self.z_rotation_increment,
            self.x_translation_increment,
            self.y_translation_increment,
            self.z_translation_increment,
        ] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        for v in [
            self.minimum_x_value,
            self.minimum_y_value,
            self.minimum_z_value,
            self.maximum_x_value,
            self.maximum_y_value,
            self.maximum_z_value,
        ] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        buf.extend_from_slice(&self.opacity.to_ne_bytes());
        buf.extend_from_slice(&self.opacity_thickness.to_ne_bytes());
        buf.extend_from_slice(&self.blend_factor.to_ne_bytes());
        debug_assert_eq!(buf.len(), ENTRY_RECORD_SIZE);
        buf
    }

    /// Write the record to `writer` exactly as held in memory.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Reverse the byte order of every multi-byte field in place.
    ///
    /// Call once before writing to a big-endian file on a little-endian
    /// host (or once after reading raw records). The modified flag is left
    /// untouched: the logical values are unchanged, only their encoding.
    pub fn swap_endianness(&mut self) {
        for v in [
            &mut self.display_flag,
            &mut self.shades,
            &mut self.start_red,
            &mut self.start_green,
            &mut self.start_blue,
            &mut self.end_red,
            &mut self.end_green,
            &mut self.end_blue,
            &mut self.x_rotation,
            &mut self.y_rotation,
            &mut self.z_rotation,
            &mut self.x_translation,
            &mut self.y_translation,
            &mut self.z_translation,
            &mut self.x_center,
            &mut self.y_center,
            &mut self.z_center,
            &mut self.x_rotation_increment,
            &mut self.y_rotation_increment,
            &mut self.z_rotation_increment,
            &mut self.x_translation_increment,
            &mut self.y_translation_increment,
            &mut self.z_translation_increment,
            &mut self.opacity_thickness,
        ] {
            *v = v.swap_bytes();
        }
        for v in [
            &mut self.minimum_x_value,
            &mut self.minimum_y_value,
            &mut self.minimum_z_value,
            &mut self.maximum_x_value,
            &mut self.maximum_y_value,
            &mut self.maximum_z_value,
        ] {
            *v = v.swap_bytes();
        }
        self.opacity = swap_f32(self.opacity);
        self.blend_factor = swap_f32(self.blend_factor);
    }
}
