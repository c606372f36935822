//! Analyze object map (`.obj`) file format.
//!
//! A file is a fixed header, one [`ObjectEntry`](crate::entry::ObjectEntry)
//! record per object (the background first) and a run-length encoded
//! 8-bit label volume:
//!
//! ```text
//! version  x  y  z  objects  [volumes]     big-endian i32
//! record 0 .. record objects-1             152 bytes each
//! (count, value) pairs                     runs restart at each x/y slice
//! ```
//!
//! Readers accept either byte order; the version tag tells which one the
//! file uses. Writers always produce big-endian files. A `.gz` suffix wraps
//! the whole file in gzip.

pub mod format;
mod reader;
mod writer;

pub use format::{is_known_version, Header, CURRENT_VERSION, VERSIONS};
pub use reader::{can_read, read_from_bytes, read_header, read_label_map, read_object_map};
pub use writer::{encode, write_label_map, write_object_map};

/// Metadata key of the version tag a volume was read with.
pub const VERSION_KEY: &str = "ANALYZE_OBJECT_MAP_VERSION";

/// Options for reading object maps.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Map the file instead of loading it. Defaults to the `mmap` feature.
    pub use_mmap: bool,
    /// Reject files with voxel labels past the last record.
    pub validate_labels: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { use_mmap: cfg!(feature = "mmap"), validate_labels: true }
    }
}

impl ReadOptions {
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn with_validation(mut self, validate_labels: bool) -> Self {
        self.validate_labels = validate_labels;
        self
    }
}

/// Options for writing object maps.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Version tag to emit. Versions before [`format::VERSION7`] cannot
    /// store more than one volume.
    pub version: i32,
    /// Gzip the output even without a `.gz` suffix.
    pub compress: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { version: CURRENT_VERSION, compress: false }
    }
}

impl WriteOptions {
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}
