//! # objmap
//!
//! Rust implementation of the Analyze object map (`.obj`) labeled-volume
//! format.
//!
//! An object map pairs an 8-bit label volume with one [`ObjectEntry`] per
//! label describing how that object is named, colored and rendered. The
//! format is byte-compatible with files written by AnalyzeAVW and the
//! toolkits that adopted it.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (dimensions, errors)
//! - [`entry`] - The object entry record and its binary codec
//! - [`core`] - Label volumes, color volumes, metadata, gzip
//! - [`labelmap`] - The entry container bound to a label volume
//! - [`objmap`] - Object map file reader and writer
//! - [`registry`] - Pluggable format lookup
//!
//! ## Example
//!
//! ```ignore
//! use objmap::prelude::*;
//!
//! let mut map = read_label_map("head.obj", &ReadOptions::default())?;
//! map.delete_entry("Nothing In Here")?;
//! write_label_map(&map, "head-edited.obj", &WriteOptions::default())?;
//! ```

pub mod util;
pub mod entry;
pub mod core;
pub mod labelmap;
pub mod objmap;
pub mod registry;

// Re-export commonly used types
pub use util::{Dimensions, Error, Result};
pub use entry::{ObjectEntry, ENTRY_RECORD_SIZE};
pub use labelmap::LabelMap;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Dimensions, Error, Result};
    pub use crate::core::{ColorVolume, LabelVolume, MetaData, MetaValue, Rgba, ENTRY_ARRAY_KEY};
    pub use crate::entry::{ObjectEntry, ENTRY_RECORD_SIZE};
    pub use crate::labelmap::LabelMap;
    pub use crate::objmap::{
        read_label_map, read_object_map, write_label_map, write_object_map, ReadOptions,
        WriteOptions,
    };
    pub use crate::registry::{FormatRegistry, ImageFormat, ObjectMapFormat};
}
