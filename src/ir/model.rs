//! Records flowing through the conversion pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use super::bbox::{BBoxCxCyWh, BBoxXYXY};
use super::class::DefectClass;
use super::space::{Normalized, Pixel};

/// A candidate image discovered in the raw corpus.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawRecord {
    pub path: PathBuf,
}

impl RawRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The image's base file name, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Identifier used to locate the annotation file: the file name up to
    /// its first underscore.
    pub fn identifier(&self) -> String {
        annotation_identifier(&self.file_name()).to_string()
    }

    /// Directory holding the image (and, by convention, its annotation).
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Returns the token before the first underscore, or the whole name when
/// there is none.
pub fn annotation_identifier(file_name: &str) -> &str {
    file_name.split('_').next().unwrap_or(file_name)
}

/// One surviving line of a raw annotation file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationLine {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
    pub class: DefectClass,
}

impl AnnotationLine {
    pub fn bbox(&self) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_corners(self.x1, self.y1, self.x2, self.y2)
    }

    /// Normalizes this line against an image of the given pixel size.
    pub fn normalize(&self, image_width: u32, image_height: u32) -> NormalizedBox {
        NormalizedBox {
            class_index: self.class.index(),
            bbox: self
                .bbox()
                .to_cxcywh_normalized(image_width as f64, image_height as f64),
        }
    }
}

/// A converted annotation ready to be written as a YOLO label line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedBox {
    pub class_index: usize,
    pub bbox: BBoxCxCyWh<Normalized>,
}

impl fmt::Display for NormalizedBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, self.bbox.cx, self.bbox.cy, self.bbox.w, self.bbox.h
        )
    }
}
