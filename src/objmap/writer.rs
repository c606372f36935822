//! Object map writer.
//!
//! Files are always written big-endian: the header through byteorder,
//! entry records by swapping a copy on little-endian hosts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace};

use super::format::Header;
use super::WriteOptions;
use crate::core::{compression, LabelVolume};
use crate::entry::{ObjectEntry, ENTRY_RECORD_SIZE};
use crate::labelmap::LabelMap;
use crate::util::{Dimensions, Error, Result};

/// Output buffer size.
const WRITE_BUFFER: usize = 1024 * 1024;

/// Gzip level for compressed output.
const GZIP_LEVEL: u32 = 6;

/// Write a label volume.
///
/// The entry array in the volume's metadata is written as-is, background
/// first. A volume without one is converted first, one entry per distinct
/// value as [`LabelMap::build_from_image`] does.
pub fn write_object_map(
    volume: &LabelVolume,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<()> {
    match volume.metadata().entries() {
        Some(entries) => {
            let bytes = encode(volume.dims(), entries, volume.data(), options)?;
            write_file(path.as_ref(), &bytes, options)
        }
        None => {
            debug!("volume has no entry array, building one from its labels");
            let mut map = LabelMap::new(volume.dims().clone());
            map.build_from_image(volume)?;
            write_label_map(&map, path, options)
        }
    }
}

/// Write a label map, background record first.
pub fn write_label_map(
    map: &LabelMap,
    path: impl AsRef<Path>,
    options: &WriteOptions,
) -> Result<()> {
    map.validate()?;
    let records = std::iter::once(map.background()).chain(map.entries());
    let bytes = encode(map.dims(), records, map.volume().data(), options)?;
    write_file(path.as_ref(), &bytes, options)
}

fn write_file(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<()> {
    let compress = options.compress || compression::is_gzip_path(path);
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);
    if compress {
        writer.write_all(&compression::compress(bytes, GZIP_LEVEL)?)?;
    } else {
        writer.write_all(bytes)?;
    }
    writer.flush()?;
    debug!("wrote {} ({} bytes, compressed: {})", path.display(), bytes.len(), compress);
    Ok(())
}

/// Encode a complete, uncompressed file image.
///
/// Every nonzero voxel must index one of the records after the first.
pub fn encode<'a>(
    dims: &Dimensions,
    records: impl IntoIterator<Item = &'a ObjectEntry>,
    data: &[u8],
    options: &WriteOptions,
) -> Result<Vec<u8>> {
    let records: Vec<&ObjectEntry> = records.into_iter().collect();
    let count = records.len();
    let max = data.iter().copied().max().unwrap_or(0);
    if max as usize >= count.max(1) {
        return Err(Error::DanglingLabel { label: max, count: count.saturating_sub(1) });
    }

    let header = Header::for_volume(options.version, dims, count)?;
    let payload = objmap_rle::encode(data, dims.slice_len());

    let mut out = Vec::with_capacity(header.size() + count * ENTRY_RECORD_SIZE + payload.len());
    header.write_to(&mut out)?;
    for entry in records {
        if cfg!(target_endian = "little") {
            let mut swapped = entry.clone();
            swapped.swap_endianness();
            swapped.write_to(&mut out)?;
        } else {
            entry.write_to(&mut out)?;
        }
        trace!(name = %entry.name(), "encoded object entry");
    }
    out.extend_from_slice(&payload);

    debug!(
        version = options.version,
        records = count,
        payload = payload.len(),
        "encoded object map {}",
        dims
    );
    Ok(out)
}
