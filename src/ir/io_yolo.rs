//! Ultralytics-style YOLO output.
//!
//! Writes the `images/<split>` + `labels/<split>` tree, the per-image label
//! files, and the `data.yaml` manifest. Also reads those artifacts back for
//! the `check` command.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::{DefectClass, NormalizedBox};
use crate::error::Deeppcb2YoloError;
use crate::split::Split;

pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];
pub const LABEL_EXTENSION: &str = "txt";
pub const DATA_YAML: &str = "data.yaml";

/// Paths of a YOLO dataset rooted at `root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct YoloLayout {
    pub root: PathBuf,
}

impl YoloLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join("images").join(split.as_str())
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.root.join("labels").join(split.as_str())
    }

    pub fn data_yaml(&self) -> PathBuf {
        self.root.join(DATA_YAML)
    }

    /// Label path for an image file name: same stem, `.txt` extension.
    pub fn label_path(&self, split: Split, image_file_name: &str) -> PathBuf {
        self.labels_dir(split)
            .join(Path::new(image_file_name).with_extension(LABEL_EXTENSION))
    }

    /// All four split directories, images first.
    pub fn split_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Split::ALL.iter().map(|s| self.images_dir(*s)).collect();
        dirs.extend(Split::ALL.iter().map(|s| self.labels_dir(*s)));
        dirs
    }
}

/// Renders label lines newline-joined, without a trailing newline.
pub fn format_label_lines(boxes: &[NormalizedBox]) -> String {
    boxes
        .iter()
        .map(NormalizedBox::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_label_file(path: &Path, boxes: &[NormalizedBox]) -> Result<(), Deeppcb2YoloError> {
    fs::write(path, format_label_lines(boxes)).map_err(|source| Deeppcb2YoloError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// The `data.yaml` manifest consumed by the trainer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Dataset root, always with forward slashes.
    pub path: String,
    pub train: String,
    pub val: String,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DatasetDescriptor {
    /// Descriptor for the fixed DeepPCB taxonomy rooted at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            path: forward_slashes(root),
            train: format!("images/{}", Split::Train.as_str()),
            val: format!("images/{}", Split::Val.as_str()),
            nc: DefectClass::COUNT,
            names: DefectClass::names(),
        }
    }
}

/// Writes `data.yaml` at the layout root and returns its path.
///
/// The `path` field is the absolute form of the layout root.
pub fn write_data_yaml(layout: &YoloLayout) -> Result<PathBuf, Deeppcb2YoloError> {
    let root = std::path::absolute(&layout.root).map_err(Deeppcb2YoloError::Io)?;
    let descriptor = DatasetDescriptor::for_root(&root);
    let path = layout.data_yaml();

    let yaml =
        serde_yaml::to_string(&descriptor).map_err(|source| Deeppcb2YoloError::DataYamlWrite {
            path: path.clone(),
            source,
        })?;
    fs::write(&path, yaml).map_err(|source| Deeppcb2YoloError::OutputWrite {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

pub fn read_data_yaml(path: &Path) -> Result<DatasetDescriptor, Deeppcb2YoloError> {
    let data = fs::read_to_string(path).map_err(Deeppcb2YoloError::Io)?;
    serde_yaml::from_str(&data).map_err(|source| Deeppcb2YoloError::DataYamlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// A parsed YOLO label line.
#[derive(Debug, PartialEq)]
pub struct YoloLabelRow {
    pub class_id: usize,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

/// Parses one written label line. Blank lines yield `Ok(None)`; the error is
/// a human-readable reason.
pub fn parse_label_line(line: &str) -> Result<Option<YoloLabelRow>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();
    if tokens.len() != 5 {
        return Err(format!("expected 5 tokens, found {}", tokens.len()));
    }

    let class_id = tokens[0].parse::<usize>().map_err(|_| {
        format!(
            "invalid class_id '{}'; expected non-negative integer",
            tokens[0]
        )
    })?;

    Ok(Some(YoloLabelRow {
        class_id,
        cx: parse_f64_token(tokens[1], "x_center")?,
        cy: parse_f64_token(tokens[2], "y_center")?,
        w: parse_f64_token(tokens[3], "width")?,
        h: parse_f64_token(tokens[4], "height")?,
    }))
}

fn parse_f64_token(raw: &str, field_name: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("invalid {field_name} '{raw}'; expected floating-point number"))
}

/// Files directly or transitively under `root` with one of `extensions`
/// (case-insensitive), sorted by path.
pub fn collect_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, Deeppcb2YoloError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| Deeppcb2YoloError::Traversal {
            path: root.to_path_buf(),
            message: source.to_string(),
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

fn forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
