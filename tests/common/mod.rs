#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes `<dir>/<id>_test.jpg` (a BMP payload, sniffed by content) and,
/// when given, `<dir>/<id>.txt`. Returns the image path.
pub fn write_raw_pair(
    dir: &Path,
    id: &str,
    width: u32,
    height: u32,
    annotation: Option<&str>,
) -> PathBuf {
    let image = dir.join(format!("{id}_test.jpg"));
    write_bmp(&image, width, height);
    if let Some(text) = annotation {
        fs::write(dir.join(format!("{id}.txt")), text).expect("write annotation");
    }
    image
}

/// The ten-image corpus: `00000001_test.jpg` .. `00000010_test.jpg`, one
/// valid box each, spread over two group folders.
pub fn write_ten_image_corpus(raw_root: &Path) {
    for i in 1..=10 {
        let group = if i <= 5 { "group00041" } else { "group12000/12000" };
        write_raw_pair(
            &raw_root.join(group),
            &format!("{i:08}"),
            640,
            640,
            Some("100,200,140,260,3\n"),
        );
    }
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
