//! Object map reader.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::ops::Deref;
use std::path::Path;

use flate2::read::GzDecoder;
use memmap2::Mmap;
use tracing::{debug, warn};

use super::format::{Header, EXTENSIONS};
use super::{ReadOptions, VERSION_KEY};
use crate::core::{compression, LabelVolume, MetaValue};
use crate::entry::ObjectEntry;
use crate::labelmap::LabelMap;
use crate::util::{Error, Result};

/// File bytes, memory mapped or loaded.
enum Source {
    /// Memory-mapped file (preferred for large files)
    Mmap(Mmap),
    /// Loaded or decompressed bytes
    Owned(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Source::Mmap(m) => &m[..],
            Source::Owned(v) => v,
        }
    }
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })
}

impl Source {
    fn open(path: &Path, use_mmap: bool) -> Result<Self> {
        let mut file = open_file(path)?;
        let size = file.metadata()?.len();

        let source = if use_mmap && size > 0 {
            // Safety: the file is opened read-only and the map lives only for this read
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            Source::Mmap(mmap)
        } else {
            let mut buf = Vec::with_capacity(size as usize);
            file.read_to_end(&mut buf)?;
            Source::Owned(buf)
        };

        if compression::is_compressed(&source) {
            debug!("inflating {}", path.display());
            return Ok(Source::Owned(compression::decompress(&source)?));
        }
        Ok(source)
    }
}

/// Read an object map file into a label volume.
///
/// The entry records, background first, are attached to the volume's
/// metadata under [`ENTRY_ARRAY_KEY`](crate::core::ENTRY_ARRAY_KEY) and
/// the version tag under [`VERSION_KEY`].
pub fn read_object_map(path: impl AsRef<Path>, options: &ReadOptions) -> Result<LabelVolume> {
    let path = path.as_ref();
    let source = Source::open(path, options.use_mmap)?;
    debug!("reading {} ({} bytes)", path.display(), source.len());
    read_from_bytes(&source, options)
}

/// Read an object map file straight into a [`LabelMap`].
pub fn read_label_map(path: impl AsRef<Path>, options: &ReadOptions) -> Result<LabelMap> {
    LabelMap::from_volume(read_object_map(path, options)?)
}

/// Decode a complete, uncompressed object map image.
pub fn read_from_bytes(bytes: &[u8], options: &ReadOptions) -> Result<LabelVolume> {
    let mut cursor = Cursor::new(bytes);
    let (header, need_byte_swap) = Header::read_from(&mut cursor)?;
    debug!(
        version = header.version,
        objects = header.number_of_objects,
        swap = need_byte_swap,
        "object map header {}",
        header.dims()
    );

    let count = header.number_of_objects as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let entry = ObjectEntry::read_from(&mut cursor, need_byte_swap, header.has_blend_factor())?;
        entries.push(entry);
    }

    let payload = &bytes[cursor.position() as usize..];
    let dims = header.dims();
    // Each pair covers at most MAX_RUN voxels
    let capacity = payload.len() / objmap_rle::PAIR_SIZE * objmap_rle::MAX_RUN;
    let voxels = match dims.checked_num_voxels() {
        Some(n) if n <= capacity => n,
        _ => {
            return Err(Error::header(format!(
                "{} voxels cannot come from a {} byte payload",
                dims,
                payload.len()
            )))
        }
    };
    let mut data = vec![0u8; voxels];
    let used = objmap_rle::decode_into(payload, &mut data)?;
    if used < payload.len() {
        warn!("{} bytes after the voxel payload ignored", payload.len() - used);
    }

    let mut volume = LabelVolume::from_vec(dims, data)?;
    if options.validate_labels {
        let max = volume.max_label();
        if max as usize >= count.max(1) {
            return Err(Error::DanglingLabel { label: max, count: count.saturating_sub(1) });
        }
    }

    let metadata = volume.metadata_mut();
    metadata.set_entries(entries);
    metadata.set(VERSION_KEY, MetaValue::Int(header.version as i64));
    Ok(volume)
}

/// Read only the header of a file, inflating `.gz` files on the fly.
pub fn read_header(path: impl AsRef<Path>) -> Result<(Header, bool)> {
    let path = path.as_ref();
    let file = BufReader::new(open_file(path)?);
    if compression::is_gzip_path(path) {
        Header::read_from(GzDecoder::new(file))
    } else {
        Header::read_from(file)
    }
}

/// True if the path has an object map extension and a readable header.
pub fn can_read(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    has_extension(path) && read_header(path).is_ok()
}

pub(crate) fn has_extension(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_ascii_lowercase(),
        None => return false,
    };
    EXTENSIONS.iter().any(|ext| name.ends_with(&format!(".{}", ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objmap::format::VERSION7;
    use crate::util::Dimensions;

    fn file_image(entries: &[ObjectEntry], dims: &Dimensions, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        Header::for_volume(VERSION7, dims, entries.len()).unwrap().write_to(&mut bytes).unwrap();
        for e in entries {
            let mut e = e.clone();
            if cfg!(target_endian = "little") {
                e.swap_endianness();
            }
            e.write_to(&mut bytes).unwrap();
        }
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_read_minimal() {
        let entries = [ObjectEntry::named("Original"), ObjectEntry::named("Blob")];
        let bytes = file_image(&entries, &Dimensions::d3(4, 1, 1), &[2, 0, 2, 1]);
        let volume = read_from_bytes(&bytes, &ReadOptions::default()).unwrap();

        assert_eq!(volume.dims(), &Dimensions::d3(4, 1, 1));
        assert_eq!(volume.data(), &[0, 0, 1, 1]);
        assert_eq!(volume.metadata().entries().unwrap(), &entries);
        assert_eq!(volume.metadata().get_int(VERSION_KEY), Some(VERSION7 as i64));
    }

    #[test]
    fn test_truncated_entry() {
        let entries = [ObjectEntry::named("Original")];
        let bytes = file_image(&entries, &Dimensions::d1(1), &[1, 0]);
        let err = read_from_bytes(&bytes[..24 + 50], &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::TruncatedRecord { .. }));
    }

    #[test]
    fn test_payload_errors() {
        let entries = [ObjectEntry::named("Original")];
        let short = file_image(&entries, &Dimensions::d1(4), &[3, 0]);
        assert!(matches!(
            read_from_bytes(&short, &ReadOptions::default()),
            Err(Error::Payload(objmap_rle::RleError::Underflow { decoded: 3, expected: 4 }))
        ));
        let long = file_image(&entries, &Dimensions::d1(4), &[5, 0]);
        assert!(matches!(read_from_bytes(&long, &ReadOptions::default()), Err(Error::Payload(_))));
    }

    #[test]
    fn test_oversized_header_rejected() {
        let huge = i32::MAX as usize;
        let dims = Dimensions::d3(huge, huge, huge);
        let bytes = file_image(&[ObjectEntry::named("Original")], &dims, &[1, 0]);
        assert!(matches!(
            read_from_bytes(&bytes, &ReadOptions::default()),
            Err(Error::InvalidHeader(_))
        ));

        // fits usize but not the payload
        let background = [ObjectEntry::named("Original")];
        let wide = file_image(&background, &Dimensions::d2(256, 2), &[255, 0]);
        assert!(matches!(
            read_from_bytes(&wide, &ReadOptions::default()),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_dangling_label_check() {
        let entries = [ObjectEntry::named("Original")];
        let bytes = file_image(&entries, &Dimensions::d1(2), &[1, 0, 1, 3]);
        assert!(matches!(
            read_from_bytes(&bytes, &ReadOptions::default()),
            Err(Error::DanglingLabel { label: 3, count: 0 })
        ));
        let lenient = ReadOptions::default().with_validation(false);
        assert_eq!(read_from_bytes(&bytes, &lenient).unwrap().data(), &[0, 3]);
    }

    #[test]
    fn test_extension() {
        assert!(has_extension(Path::new("/tmp/head.obj")));
        assert!(has_extension(Path::new("HEAD.OBJ.GZ")));
        assert!(!has_extension(Path::new("head.nii")));
        assert!(!has_extension(Path::new("obj")));
    }

    #[test]
    fn test_missing_file() {
        let err = read_object_map("/nonexistent/x.obj", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
