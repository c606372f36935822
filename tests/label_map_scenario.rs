//! End-to-end label map editing: build entries from an intensity image,
//! edit them, write, read back and pick one object.

use objmap::prelude::*;

use tempfile::NamedTempFile;

const SQUARE: u8 = 200;
const CIRCLE: u8 = 128;

/// 20x20 image: a square of 200 in the top-left corner, a disc of 128 in
/// the bottom-right and a second square of 60 that no entry claims.
fn shapes() -> LabelVolume {
    let mut image = LabelVolume::new(Dimensions::d2(20, 20));
    for y in 0..20 {
        for x in 0..20 {
            let (dx, dy) = (x as i32 - 14, y as i32 - 14);
            let value = if x < 6 && y < 6 {
                SQUARE
            } else if dx * dx + dy * dy <= 16 {
                CIRCLE
            } else if (12..16).contains(&x) && y < 4 {
                60
            } else {
                0
            };
            image.set(&[x, y], value).unwrap();
        }
    }
    image
}

#[test]
fn test_edit_write_read_pick() {
    let image = shapes();

    let mut map = LabelMap::new(image.dims().clone());
    map.add_entry("You Can Delete Me").expect("first entry");
    map.add_entry_for_label(&image, SQUARE, "Square", 250, 0, 0).expect("square");
    map.add_entry_for_label(&image, CIRCLE, "Circle", 0, 250, 0).expect("circle");
    map.add_entry("Nothing In Here").expect("fourth entry");

    let first = map.entry(1).unwrap().clone();
    map.entry_mut(4).unwrap().copy_from(&first);
    assert_eq!(map.entry(4).unwrap().name(), "Nothing In Here");

    map.delete_entry("Nothing In Here").expect("delete");
    assert_eq!(map.len(), 3);
    map.validate().unwrap();

    let temp = NamedTempFile::new().expect("Failed to create temp file");
    write_label_map(&map, temp.path(), &WriteOptions::default()).expect("Failed to write");
    let back = read_label_map(temp.path(), &ReadOptions::default()).expect("Failed to read");

    let names: Vec<String> = back.entries().iter().map(|e| e.name()).collect();
    assert_eq!(names, ["You Can Delete Me", "Square", "Circle"]);
    assert_eq!(back.entry(2).unwrap().end_color(), glam::IVec3::new(250, 0, 0));
    assert_eq!(back.volume().count(1), 0);
    assert_eq!(back.volume().count(2), image.count(SQUARE));
    assert_eq!(back.volume().count(3), image.count(CIRCLE));
    // the unclaimed square stays background
    assert_eq!(back.volume().count(0), 400 - image.count(SQUARE) - image.count(CIRCLE));

    let mask = back.pick_entry(3).expect("pick circle");
    for (i, &src) in image.data().iter().enumerate() {
        assert_eq!(mask.data()[i], (src == CIRCLE) as u8, "voxel {}", i);
    }

    // the mask is itself a valid single-entry object map
    let mask_file = NamedTempFile::new().unwrap();
    write_object_map(&mask, mask_file.path(), &WriteOptions::default()).unwrap();
    let picked = read_label_map(mask_file.path(), &ReadOptions::default()).unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked.entry(1).unwrap().name(), "Circle");
    assert_eq!(picked.volume().count(1), image.count(CIRCLE));
}

#[test]
fn test_build_then_color() {
    let image = shapes();
    let mut map = LabelMap::new(image.dims().clone());
    map.build_from_image(&image).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map.entry(1).unwrap().name(), "Label 200");
    assert_eq!(map.entry(2).unwrap().name(), "Label 60");
    assert_eq!(map.entry(3).unwrap().name(), "Label 128");

    map.entry_mut(2).unwrap().set_display_flag(0);
    let color = map.to_color_image();
    assert_eq!(color.dims(), image.dims());
    assert_eq!(color.get(&[0, 0]).unwrap().a, 128);
    assert_eq!(color.get(&[13, 1]), Some(Rgba::TRANSPARENT));
    assert_eq!(color.get(&[19, 0]), Some(Rgba::TRANSPARENT));
    assert_eq!(color.as_bytes().len(), 400 * 4);
}

#[test]
fn test_names_survive_truncation_roundtrip() {
    let mut map = LabelMap::new(Dimensions::d1(2));
    let long = "A name that is far too long for the record";
    map.add_entry(long).unwrap();
    assert_eq!(map.entry(1).unwrap().name().len(), 31);
    assert!(map.index_of(long).is_some());

    let temp = NamedTempFile::new().unwrap();
    write_label_map(&map, temp.path(), &WriteOptions::default()).unwrap();
    let back = read_label_map(temp.path(), &ReadOptions::default()).unwrap();
    assert_eq!(back.entry(1).unwrap().name(), &long[..31]);
    assert!(matches!(
        LabelMap::from_volume(back.clone().into_volume()).map(|m| m.len()),
        Ok(1)
    ));
}

#[test]
fn test_write_rejects_dangling_volume() {
    let mut volume = LabelVolume::from_vec(Dimensions::d1(3), vec![0, 1, 4]).unwrap();
    volume
        .metadata_mut()
        .set_entries(vec![ObjectEntry::named("Original"), ObjectEntry::named("Only")]);
    let temp = NamedTempFile::new().unwrap();
    let err = write_object_map(&volume, temp.path(), &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, Error::DanglingLabel { label: 4, count: 1 }));
}
