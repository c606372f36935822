//! Format registry.
//!
//! Applications register the label volume formats they want and look them
//! up by path or name. Nothing is registered behind the caller's back;
//! [`FormatRegistry::with_defaults`] is the opt-in for the built-in
//! object map format.

use std::path::Path;

use tracing::debug;

use crate::core::LabelVolume;
use crate::objmap::{self, ReadOptions, WriteOptions};
use crate::util::{Error, Result};

/// A readable and writable label volume format.
pub trait ImageFormat: Send + Sync {
    /// Short unique name.
    fn name(&self) -> &str;

    /// Recognized file name suffixes, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Inspect a file and decide whether this format can read it.
    fn can_read(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<LabelVolume>;

    fn write(&self, volume: &LabelVolume, path: &Path) -> Result<()>;

    /// True if the file name ends with one of [`extensions`](Self::extensions).
    fn matches_extension(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_ascii_lowercase(),
            None => return false,
        };
        self.extensions().iter().any(|ext| {
            name.len() > ext.len() + 1
                && name.ends_with(ext)
                && name[..name.len() - ext.len()].ends_with('.')
        })
    }
}

/// The Analyze object map format.
#[derive(Clone, Debug, Default)]
pub struct ObjectMapFormat {
    pub read_options: ReadOptions,
    pub write_options: WriteOptions,
}

impl ImageFormat for ObjectMapFormat {
    fn name(&self) -> &str {
        "objmap"
    }

    fn extensions(&self) -> &[&str] {
        &objmap::format::EXTENSIONS
    }

    fn can_read(&self, path: &Path) -> bool {
        objmap::can_read(path)
    }

    fn read(&self, path: &Path) -> Result<LabelVolume> {
        objmap::read_object_map(path, &self.read_options)
    }

    fn write(&self, volume: &LabelVolume, path: &Path) -> Result<()> {
        objmap::write_object_map(volume, path, &self.write_options)
    }
}

/// Ordered set of formats; earlier registrations win ties.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn ImageFormat>>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the object map format.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(ObjectMapFormat::default());
        registry
    }

    /// Add a format. A format with the same name is replaced in place.
    pub fn register<F: ImageFormat + 'static>(&mut self, format: F) {
        debug!("registering format '{}'", format.name());
        match self.formats.iter().position(|f| f.name() == format.name()) {
            Some(i) => self.formats[i] = Box::new(format),
            None => self.formats.push(Box::new(format)),
        }
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Names of the registered formats.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(|f| f.name())
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn ImageFormat> {
        self.formats.iter().find(|f| f.name() == name).map(|f| f.as_ref())
    }

    /// Format for a path: by extension first, then by content.
    pub fn find_for_path(&self, path: &Path) -> Option<&dyn ImageFormat> {
        self.formats
            .iter()
            .find(|f| f.matches_extension(path))
            .or_else(|| self.formats.iter().find(|f| f.can_read(path)))
            .map(|f| f.as_ref())
    }

    /// Read a file with whichever format claims it.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<LabelVolume> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let format = self
            .find_for_path(path)
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        debug!("reading {} as {}", path.display(), format.name());
        format.read(path)
    }

    /// Write a volume with the format matching the path's extension.
    pub fn write(&self, volume: &LabelVolume, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = self
            .formats
            .iter()
            .find(|f| f.matches_extension(path))
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        debug!("writing {} as {}", path.display(), format.name());
        format.write(volume, path)
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Dimensions;

    struct RawFormat;

    impl ImageFormat for RawFormat {
        fn name(&self) -> &str {
            "raw"
        }
        fn extensions(&self) -> &[&str] {
            &["raw"]
        }
        fn can_read(&self, _path: &Path) -> bool {
            false
        }
        fn read(&self, path: &Path) -> Result<LabelVolume> {
            let data = std::fs::read(path)?;
            LabelVolume::from_vec(Dimensions::d1(data.len()), data)
        }
        fn write(&self, volume: &LabelVolume, path: &Path) -> Result<()> {
            Ok(std::fs::write(path, volume.data())?)
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = FormatRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find_for_path(Path::new("a.obj")).is_none());
        let volume = LabelVolume::new(Dimensions::d1(1));
        assert!(matches!(
            registry.write(&volume, "a.obj"),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let mut registry = FormatRegistry::with_defaults();
        registry.register(RawFormat);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["objmap", "raw"]);

        assert_eq!(registry.find_for_path(Path::new("x/head.obj")).unwrap().name(), "objmap");
        assert_eq!(registry.find_for_path(Path::new("head.OBJ.gz")).unwrap().name(), "objmap");
        assert_eq!(registry.find_for_path(Path::new("head.raw")).unwrap().name(), "raw");
        assert!(registry.find_for_path(Path::new("head.nii")).is_none());
        assert!(registry.find_for_path(Path::new("obj")).is_none());
        assert!(registry.by_name("raw").is_some());
        assert!(registry.by_name("nifti").is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FormatRegistry::new();
        registry.register(RawFormat);
        registry.register(RawFormat);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_raw_roundtrip_through_registry() {
        let mut registry = FormatRegistry::new();
        registry.register(RawFormat);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.raw");
        let volume = LabelVolume::from_vec(Dimensions::d1(3), vec![1, 2, 3]).unwrap();
        registry.write(&volume, &path).unwrap();
        assert_eq!(registry.read(&path).unwrap().data(), &[1, 2, 3]);
        assert!(matches!(
            registry.read(dir.path().join("missing.raw")),
            Err(Error::FileNotFound(_))
        ));
    }
}
