//! Object map format constants and header.

use std::io::{Read, Write};

use byteorder::{BigEndian, NativeEndian, ReadBytesExt, WriteBytesExt};

use crate::util::{Dimensions, Error, Result, MAX_RANK};

pub const VERSION1: i32 = 880102;
pub const VERSION2: i32 = 880801;
pub const VERSION3: i32 = 890102;
pub const VERSION4: i32 = 900302;
pub const VERSION5: i32 = 910402;
pub const VERSION6: i32 = 910926;
/// Current revision. Adds the volume count to the header and is the first
/// revision documented with a blend factor in each entry.
pub const VERSION7: i32 = 20050829;

/// All known version tags, oldest first.
pub const VERSIONS: [i32; 7] =
    [VERSION1, VERSION2, VERSION3, VERSION4, VERSION5, VERSION6, VERSION7];

/// Version written unless asked otherwise.
pub const CURRENT_VERSION: i32 = VERSION7;

/// File extensions, without the leading dot.
pub const EXTENSIONS: [&str; 2] = ["obj", "obj.gz"];

/// Most records a file can carry: the background plus one per 8-bit label.
pub const MAX_RECORDS: usize = u8::MAX as usize + 1;

/// Check a version tag against the known revisions.
#[inline]
pub fn is_known_version(version: i32) -> bool {
    VERSIONS.contains(&version)
}

/// Fixed file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    /// Record count, background included.
    pub number_of_objects: i32,
    /// Only stored by [`VERSION7`]; 1 otherwise.
    pub number_of_volumes: i32,
}

impl Header {
    /// Size of the header on disk for a version.
    pub const fn size_for(version: i32) -> usize {
        if version == VERSION7 { 6 * 4 } else { 5 * 4 }
    }

    /// Header describing `dims` with `records` entry records.
    pub fn for_volume(version: i32, dims: &Dimensions, records: usize) -> Result<Self> {
        if !is_known_version(version) {
            return Err(Error::UnsupportedVersion(version));
        }
        if dims.rank() == 0 {
            return Err(Error::DimensionMismatch("volume has no axes".into()));
        }
        if dims.rank() > MAX_RANK {
            return Err(Error::DimensionMismatch(format!(
                "{} has {} axes, at most {} can be stored",
                dims,
                dims.rank(),
                MAX_RANK
            )));
        }
        if version != VERSION7 && dims.extent(3) > 1 {
            return Err(Error::DimensionMismatch(format!(
                "version {} cannot store {} volumes",
                version,
                dims.extent(3)
            )));
        }
        if records > MAX_RECORDS {
            return Err(Error::other(format!(
                "{} records exceed the limit of {}",
                records, MAX_RECORDS
            )));
        }
        let axis = |i: usize| {
            i32::try_from(dims.extent(i))
                .map_err(|_| Error::DimensionMismatch(format!("axis {} of {} too large", i, dims)))
        };
        Ok(Self {
            version,
            width: axis(0)?,
            height: axis(1)?,
            depth: axis(2)?,
            number_of_objects: records as i32,
            number_of_volumes: axis(3)?,
        })
    }

    /// Parse a header, detecting the file's byte order from the version tag.
    ///
    /// Returns the header and whether the rest of the file needs byte swaps.
    pub fn read_from<R: Read>(mut reader: R) -> Result<(Self, bool)> {
        let raw = reader
            .read_i32::<NativeEndian>()
            .map_err(|_| Error::header("file too short for a version tag"))?;

        let need_byte_swap = if is_known_version(raw) {
            false
        } else if is_known_version(raw.swap_bytes()) {
            true
        } else {
            return Err(Error::UnsupportedVersion(i32::from_be(raw)));
        };
        let version = if need_byte_swap { raw.swap_bytes() } else { raw };

        let mut field = |name: &str| -> Result<i32> {
            let v = reader
                .read_i32::<NativeEndian>()
                .map_err(|_| Error::header(format!("header ends before {}", name)))?;
            Ok(if need_byte_swap { v.swap_bytes() } else { v })
        };

        let width = field("width")?;
        let height = field("height")?;
        let depth = field("depth")?;
        let number_of_objects = field("number of objects")?;
        let number_of_volumes = if version == VERSION7 { field("number of volumes")? } else { 1 };

        let header = Self { version, width, height, depth, number_of_objects, number_of_volumes };
        header.check()?;
        Ok((header, need_byte_swap))
    }

    fn check(&self) -> Result<()> {
        for (name, v) in [
            ("width", self.width),
            ("height", self.height),
            ("depth", self.depth),
            ("number of volumes", self.number_of_volumes),
        ] {
            if v < 1 {
                return Err(Error::header(format!("{} is {}", name, v)));
            }
        }
        if self.number_of_objects < 0 || self.number_of_objects as usize > MAX_RECORDS {
            return Err(Error::header(format!("{} objects", self.number_of_objects)));
        }
        Ok(())
    }

    /// Write the header big-endian.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_i32::<BigEndian>(self.version)?;
        writer.write_i32::<BigEndian>(self.width)?;
        writer.write_i32::<BigEndian>(self.height)?;
        writer.write_i32::<BigEndian>(self.depth)?;
        writer.write_i32::<BigEndian>(self.number_of_objects)?;
        if self.version == VERSION7 {
            writer.write_i32::<BigEndian>(self.number_of_volumes)?;
        }
        Ok(())
    }

    /// Volume shape: 4-D when more than one volume is stored, 3-D otherwise.
    pub fn dims(&self) -> Dimensions {
        let (x, y, z) = (self.width as usize, self.height as usize, self.depth as usize);
        if self.number_of_volumes > 1 {
            Dimensions::d4(x, y, z, self.number_of_volumes as usize)
        } else {
            Dimensions::d3(x, y, z)
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        Self::size_for(self.version)
    }

    /// Whether the revision documents a blend factor in its entries.
    #[inline]
    pub fn has_blend_factor(&self) -> bool {
        self.version == VERSION7
    }
}
