//! Label map container.
//!
//! A [`LabelMap`] pairs an ordered list of [`ObjectEntry`] values with a
//! label volume. A voxel's label is the 1-based index of the entry it
//! belongs to; 0 is background. Two invariants hold after every
//! operation:
//!
//! - entry names are unique;
//! - every nonzero label indexes an existing entry.
//!
//! Deleting an entry relabels its voxels to background and shifts higher
//! labels down by one so the second invariant survives deletes.

mod color;

use tracing::debug;

use crate::core::{LabelVolume, BACKGROUND};
use crate::entry::ObjectEntry;
use crate::util::{Dimensions, Error, Result};

pub use color::PALETTE;

/// Name of the background record stored in front of the entries on disk.
pub const BACKGROUND_NAME: &str = "Original";

/// Most entries a label map can hold with 8-bit labels.
pub const MAX_ENTRIES: usize = u8::MAX as usize;

/// Ordered entries plus the label volume they describe.
#[derive(Clone, Debug)]
pub struct LabelMap {
    background: ObjectEntry,
    entries: Vec<ObjectEntry>,
    volume: LabelVolume,
}

impl LabelMap {
    /// Create an empty label map over a background-filled volume.
    pub fn new(dims: Dimensions) -> Self {
        Self {
            background: ObjectEntry::named(BACKGROUND_NAME),
            entries: Vec::new(),
            volume: LabelVolume::new(dims),
        }
    }

    /// Adopt a volume produced by a reader.
    ///
    /// When the volume's metadata carries an entry array its first record
    /// is the background and the rest become the entries; the labels are
    /// taken as-is and validated. Without an entry array the map is built
    /// from the voxel values as in [`build_from_image`](Self::build_from_image).
    pub fn from_volume(mut volume: LabelVolume) -> Result<Self> {
        match volume.metadata_mut().take_entries() {
            Some(mut entries) => {
                let background = if entries.is_empty() {
                    ObjectEntry::named(BACKGROUND_NAME)
                } else {
                    entries.remove(0)
                };
                let map = Self { background, entries, volume };
                map.validate()?;
                debug!("label map with {} entries over {}", map.len(), map.dims());
                Ok(map)
            }
            None => {
                let mut map = Self::new(volume.dims().clone());
                map.build_from_image(&volume)?;
                Ok(map)
            }
        }
    }

    /// Hand the volume back with the entry array attached to its metadata,
    /// background record first.
    pub fn into_volume(self) -> LabelVolume {
        let Self { background, entries, mut volume } = self;
        let mut all = Vec::with_capacity(entries.len() + 1);
        all.push(background);
        all.extend(entries);
        volume.metadata_mut().set_entries(all);
        volume
    }

    /// Number of entries, background excluded.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn dims(&self) -> &Dimensions {
        self.volume.dims()
    }

    /// The label volume.
    #[inline]
    pub fn volume(&self) -> &LabelVolume {
        &self.volume
    }

    /// Background record (index 0).
    #[inline]
    pub fn background(&self) -> &ObjectEntry {
        &self.background
    }

    /// Entries in label order; `entries()[i]` owns label `i + 1`.
    #[inline]
    pub fn entries(&self) -> &[ObjectEntry] {
        &self.entries
    }

    /// Entry at a 1-based index.
    pub fn entry(&self, index: usize) -> Result<&ObjectEntry> {
        let count = self.len();
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(Error::IndexOutOfRange { index, count })
    }

    /// Mutable entry at a 1-based index.
    pub fn entry_mut(&mut self, index: usize) -> Result<&mut ObjectEntry> {
        let count = self.len();
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get_mut(i))
            .ok_or(Error::IndexOutOfRange { index, count })
    }

    /// 1-based index of the entry with this name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.has_name(name)).map(|i| i + 1)
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&ObjectEntry> {
        self.index_of(name).and_then(|i| self.entries.get(i - 1))
    }

    pub fn entry_by_name_mut(&mut self, name: &str) -> Option<&mut ObjectEntry> {
        let i = self.index_of(name)?;
        self.entries.get_mut(i - 1)
    }

    /// Rename an entry, keeping names unique.
    pub fn rename_entry(&mut self, index: usize, name: &str) -> Result<()> {
        match self.index_of(name) {
            Some(existing) if existing != index => Err(Error::DuplicateName(name.to_string())),
            _ => {
                self.entry_mut(index)?.set_name(name);
                Ok(())
            }
        }
    }

    /// Append a default entry. Its label is the new [`len`](Self::len).
    ///
    /// Names are compared after truncation to the on-disk limit, so two
    /// names that differ only past that limit collide.
    pub fn add_entry(&mut self, name: &str) -> Result<&mut ObjectEntry> {
        if self.index_of(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        if self.len() >= MAX_ENTRIES {
            return Err(Error::other(format!(
                "label map is full ({} entries)",
                MAX_ENTRIES
            )));
        }
        self.entries.push(ObjectEntry::named(name));
        debug!("added entry {} '{}'", self.len(), name);
        let last = self.entries.len() - 1;
        Ok(&mut self.entries[last])
    }

    /// Remove the named entry and return it.
    ///
    /// Its voxels become background and every higher label moves down by
    /// one, so no voxel is left pointing past the end of the entries.
    pub fn delete_entry(&mut self, name: &str) -> Result<ObjectEntry> {
        let index = self.index_of(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        let removed = self.entries.remove(index - 1);
        let deleted = index as u8;
        let mut relabeled = 0usize;
        for v in self.volume.data_mut() {
            if *v == deleted {
                *v = BACKGROUND;
                relabeled += 1;
            } else if *v > deleted {
                *v -= 1;
            }
        }
        debug!("deleted entry {} '{}', {} voxels now background", index, name, relabeled);
        Ok(removed)
    }

    /// Replace the entries and labels with ones derived from `image`.
    ///
    /// Every distinct nonzero value becomes one entry, in the order first
    /// met while scanning, named `Label <value>` and colored from
    /// [`PALETTE`].
    pub fn build_from_image(&mut self, image: &LabelVolume) -> Result<()> {
        let labels = image.distinct_labels();
        self.entries.clear();
        self.volume = image.blank_like();
        for (i, &label) in labels.iter().enumerate() {
            let [r, g, b] = PALETTE[i % PALETTE.len()];
            self.add_entry_for_label(image, label, &format!("Label {}", label), r, g, b)?;
        }
        debug!("built {} entries from {} image", self.len(), image.dims());
        Ok(())
    }

    /// Add an entry for the voxels of `image` equal to `label`.
    ///
    /// The new entry ramps from black to `(red, green, blue)` and those
    /// voxels receive its index in this map's volume. Returns the index.
    ///
    /// `shades` keeps its default of one step, so the entry renders in its
    /// end color until the caller sets a longer ramp.
    pub fn add_entry_for_label(
        &mut self,
        image: &LabelVolume,
        label: u8,
        name: &str,
        red: i32,
        green: i32,
        blue: i32,
    ) -> Result<usize> {
        if image.dims() != self.volume.dims() {
            return Err(Error::DimensionMismatch(format!(
                "image {} does not match label map {}",
                image.dims(),
                self.volume.dims()
            )));
        }

        let entry = self.add_entry(name)?;
        entry.set_start_color(glam::IVec3::ZERO);
        entry.set_end_color(glam::IVec3::new(red, green, blue));
        let index = self.len();

        let mut covered = 0usize;
        for (dst, &src) in self.volume.data_mut().iter_mut().zip(image.data()) {
            if src == label {
                *dst = index as u8;
                covered += 1;
            }
        }
        debug!("entry {} '{}' covers {} voxels of label {}", index, name, covered, label);
        Ok(index)
    }

    /// Label of one voxel.
    pub fn label_at(&self, coords: &[usize]) -> Option<u8> {
        self.volume.get(coords)
    }

    /// Assign a voxel to an entry (0 for background).
    pub fn set_label(&mut self, coords: &[usize], index: usize) -> Result<()> {
        if index > self.len() {
            return Err(Error::IndexOutOfRange { index, count: self.len() });
        }
        self.volume.set(coords, index as u8)
    }

    /// Mask of one entry: its voxels are 1, everything else 0.
    ///
    /// The mask's metadata carries the background record and a copy of the
    /// entry, so it is itself a valid single-entry label map.
    pub fn pick_entry(&self, index: usize) -> Result<LabelVolume> {
        let entry = self.entry(index)?.clone();
        let label = index as u8;
        let mut mask = self.volume.blank_like();
        for (dst, &src) in mask.data_mut().iter_mut().zip(self.volume.data()) {
            if src == label {
                *dst = 1;
            }
        }
        mask.metadata_mut().set_entries(vec![self.background.clone(), entry]);
        Ok(mask)
    }

    /// Recompute the bounding brick of one entry from its voxels and clear
    /// its status flag. An entry with no voxels gets an all-zero brick.
    pub fn update_bounding_brick(&mut self, index: usize) -> Result<()> {
        let label = index as u8;
        self.entry(index)?;

        let dims = self.volume.dims().clone();
        let mut min = [i64::MAX; 3];
        let mut max = [i64::MIN; 3];
        for (i, &v) in self.volume.data().iter().enumerate() {
            if v != label {
                continue;
            }
            let c = dims.coords(i);
            for axis in 0..3 {
                let p = c.get(axis).copied().unwrap_or(0) as i64;
                min[axis] = min[axis].min(p);
                max[axis] = max[axis].max(p);
            }
        }

        let to_i16 = |v: i64| v.clamp(i16::MIN as i64, i16::MAX as i64) as i16;
        let (lo, hi) = if min[0] == i64::MAX {
            (glam::I16Vec3::ZERO, glam::I16Vec3::ZERO)
        } else {
            (
                glam::I16Vec3::new(to_i16(min[0]), to_i16(min[1]), to_i16(min[2])),
                glam::I16Vec3::new(to_i16(max[0]), to_i16(max[1]), to_i16(max[2])),
            )
        };

        let entry = self.entry_mut(index)?;
        entry.set_minimum_coordinate(lo);
        entry.set_maximum_coordinate(hi);
        entry.set_status_flag(0);
        Ok(())
    }

    /// Check both invariants.
    pub fn validate(&self) -> Result<()> {
        for (i, e) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|o| o.name_key() == e.name_key()) {
                return Err(Error::DuplicateName(e.name()));
            }
        }
        let max = self.volume.max_label();
        if max as usize > self.len() {
            return Err(Error::DanglingLabel { label: max, count: self.len() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squares() -> LabelVolume {
        // 4x3 image: 200 on the left, 128 on the right, background between
        LabelVolume::from_vec(
            Dimensions::d2(4, 3),
            vec![
                200, 0, 0, 128, //
                200, 0, 128, 128, //
                0, 0, 0, 0,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_add_duplicate_name() {
        let mut map = LabelMap::new(Dimensions::d2(2, 2));
        map.add_entry("X").unwrap();
        let err = map.add_entry("X").unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "X"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_duplicate_after_truncation() {
        let mut map = LabelMap::new(Dimensions::d1(1));
        let base = "n".repeat(31);
        map.add_entry(&format!("{}A", base)).unwrap();
        assert!(map.add_entry(&format!("{}B", base)).is_err());
    }

    #[test]
    fn test_entry_indexing() {
        let mut map = LabelMap::new(Dimensions::d1(4));
        map.add_entry("A").unwrap();
        map.add_entry("B").unwrap();
        assert_eq!(map.entry(1).unwrap().name(), "A");
        assert_eq!(map.entry(2).unwrap().name(), "B");
        assert!(matches!(map.entry(0), Err(Error::IndexOutOfRange { index: 0, count: 2 })));
        assert!(matches!(map.entry(3), Err(Error::IndexOutOfRange { index: 3, count: 2 })));
        assert_eq!(map.index_of("B"), Some(2));
        assert!(map.entry_by_name("C").is_none());
    }

    #[test]
    fn test_delete_missing() {
        let mut map = LabelMap::new(Dimensions::d1(4));
        assert!(matches!(map.delete_entry("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_build_from_image() {
        let image = squares();
        let mut map = LabelMap::new(image.dims().clone());
        map.build_from_image(&image).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.entry(1).unwrap().name(), "Label 200");
        assert_eq!(map.entry(2).unwrap().name(), "Label 128");
        for (i, &src) in image.data().iter().enumerate() {
            let expected = match src {
                200 => 1,
                128 => 2,
                _ => 0,
            };
            assert_eq!(map.volume().data()[i], expected);
        }
        map.validate().unwrap();
    }

    #[test]
    fn test_add_entry_for_label_ramp() {
        let image = squares();
        let mut map = LabelMap::new(image.dims().clone());
        map.add_entry("You Can Delete Me").unwrap();
        let idx = map.add_entry_for_label(&image, 200, "Square", 250, 0, 0).unwrap();
        assert_eq!(idx, 2);
        let e = map.entry(2).unwrap();
        assert_eq!(e.start_color(), glam::IVec3::ZERO);
        assert_eq!(e.end_color(), glam::IVec3::new(250, 0, 0));
        assert_eq!(e.shades(), 1);
        assert_eq!(map.volume().count(2), 2);
        assert_eq!(map.volume().count(1), 0);
    }

    #[test]
    fn test_add_entry_for_label_shape_mismatch() {
        let image = squares();
        let mut map = LabelMap::new(Dimensions::d2(2, 2));
        let err = map.add_entry_for_label(&image, 200, "Square", 1, 2, 3).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch(_)));
        assert!(map.is_empty());
    }

    #[test]
    fn test_delete_relabels() {
        let image = squares();
        let mut map = LabelMap::new(image.dims().clone());
        map.add_entry("First").unwrap();
        map.add_entry_for_label(&image, 200, "Square", 250, 0, 0).unwrap();
        map.add_entry_for_label(&image, 128, "Circle", 0, 250, 0).unwrap();
        assert_eq!(map.volume().count(3), 3);

        let removed = map.delete_entry("Square").unwrap();
        assert_eq!(removed.name(), "Square");
        assert_eq!(map.len(), 2);
        assert_eq!(map.entry(2).unwrap().name(), "Circle");
        // Square voxels are background, Circle voxels moved from 3 to 2
        assert_eq!(map.volume().count(3), 0);
        assert_eq!(map.volume().count(2), 3);
        assert_eq!(map.volume().count(0), 9);
        map.validate().unwrap();
    }

    #[test]
    fn test_pick_entry() {
        let image = squares();
        let mut map = LabelMap::new(image.dims().clone());
        map.build_from_image(&image).unwrap();

        let mask = map.pick_entry(1).unwrap();
        for (i, &src) in image.data().iter().enumerate() {
            assert_eq!(mask.data()[i], (src == 200) as u8);
        }
        let entries = mask.metadata().entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name(), "Label 200");

        assert!(map.pick_entry(3).is_err());
    }

    #[test]
    fn test_volume_roundtrip_through_metadata() {
        let image = squares();
        let mut map = LabelMap::new(image.dims().clone());
        map.build_from_image(&image).unwrap();
        map.entry_mut(1).unwrap().set_opacity(1.0);

        let volume = map.clone().into_volume();
        assert_eq!(volume.metadata().entries().unwrap()[0].name(), BACKGROUND_NAME);
        let back = LabelMap::from_volume(volume).unwrap();
        assert_eq!(back.entries(), map.entries());
        assert_eq!(back.volume().data(), map.volume().data());
    }

    #[test]
    fn test_from_volume_rejects_dangling() {
        let mut volume = LabelVolume::from_vec(Dimensions::d1(3), vec![0, 1, 2]).unwrap();
        volume
            .metadata_mut()
            .set_entries(vec![ObjectEntry::named(BACKGROUND_NAME), ObjectEntry::named("Only")]);
        let err = LabelMap::from_volume(volume).unwrap_err();
        assert!(matches!(err, Error::DanglingLabel { label: 2, count: 1 }));
    }

    #[test]
    fn test_from_volume_without_entries_builds() {
        let map = LabelMap::from_volume(squares()).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_rename_and_set_label() {
        let mut map = LabelMap::new(Dimensions::d2(2, 2));
        map.add_entry("A").unwrap();
        map.add_entry("B").unwrap();
        assert!(matches!(map.rename_entry(1, "B"), Err(Error::DuplicateName(_))));
        map.rename_entry(1, "C").unwrap();
        assert_eq!(map.entry(1).unwrap().name(), "C");

        map.set_label(&[1, 1], 2).unwrap();
        assert_eq!(map.label_at(&[1, 1]), Some(2));
        assert!(map.set_label(&[0, 0], 3).is_err());
    }

    #[test]
    fn test_update_bounding_brick() {
        let image = LabelVolume::from_vec(
            Dimensions::d3(3, 3, 2),
            vec![
                0, 0, 0, 0, 7, 7, 0, 0, 0, //
                0, 0, 0, 0, 0, 0, 0, 7, 0,
            ],
        )
        .unwrap();
        let mut map = LabelMap::new(image.dims().clone());
        map.build_from_image(&image).unwrap();
        map.entry_mut(1).unwrap().set_status_flag(1);
        map.update_bounding_brick(1).unwrap();

        let e = map.entry(1).unwrap();
        assert_eq!(e.minimum_coordinate(), glam::I16Vec3::new(1, 1, 0));
        assert_eq!(e.maximum_coordinate(), glam::I16Vec3::new(2, 2, 1));
        assert_eq!(e.status_flag(), 0);
    }
}
