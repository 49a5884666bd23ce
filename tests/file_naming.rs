//! Collision-free file naming in the save folder.

use chrono::{NaiveDate, NaiveDateTime};
use clip_snap_lib::capture::RasterImage;
use clip_snap_lib::output::{resolve_path, save_at, OutputDescriptor};
use image::RgbaImage;

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 31)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn descriptor(dir: &std::path::Path, format: &str) -> OutputDescriptor {
    OutputDescriptor {
        directory: dir.to_path_buf(),
        pattern: "Screenshot_{timestamp}".into(),
        format: format.into(),
    }
}

fn image() -> RasterImage {
    RasterImage::new(RgbaImage::new(16, 16))
}

#[test]
fn same_second_saves_get_numbered_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    let d = descriptor(dir.path(), "png");

    let names: Vec<String> = (0..3)
        .map(|_| {
            let path = save_at(image(), &d, &noon()).unwrap();
            path.file_name().unwrap().to_string_lossy().to_string()
        })
        .collect();

    assert_eq!(
        names,
        vec![
            "Screenshot_2025-01-31_12-00-00.png",
            "Screenshot_2025-01-31_12-00-00_1.png",
            "Screenshot_2025-01-31_12-00-00_2.png",
        ]
    );
}

#[test]
fn gap_in_the_sequence_is_reused_first() {
    let dir = tempfile::tempdir().unwrap();
    let d = descriptor(dir.path(), "png");
    std::fs::write(dir.path().join("Screenshot_2025-01-31_12-00-00.png"), b"").unwrap();
    std::fs::write(dir.path().join("Screenshot_2025-01-31_12-00-00_2.png"), b"").unwrap();

    assert_eq!(
        resolve_path(&d, &noon()),
        dir.path().join("Screenshot_2025-01-31_12-00-00_1.png")
    );
}

#[test]
fn collisions_are_per_extension() {
    let dir = tempfile::tempdir().unwrap();
    save_at(image(), &descriptor(dir.path(), "png"), &noon()).unwrap();

    let jpg = save_at(image(), &descriptor(dir.path(), "jpg"), &noon()).unwrap();
    assert_eq!(
        jpg.file_name().unwrap(),
        "Screenshot_2025-01-31_12-00-00.jpg"
    );
}

#[test]
fn unknown_format_falls_back_to_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = save_at(image(), &descriptor(dir.path(), "webp"), &noon()).unwrap();
    assert_eq!(path.extension().unwrap(), "png");
    assert_eq!(
        image::ImageFormat::from_path(&path).unwrap(),
        image::ImageFormat::Png
    );
    assert!(image::open(&path).is_ok());
}
