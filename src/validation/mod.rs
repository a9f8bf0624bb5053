//! Checks an emitted dataset tree against what a YOLO trainer expects.
//!
//! This covers:
//! - The manifest (`data.yaml` present, parseable, consistent class count)
//! - The layout (split folders, one image per label file)
//! - Label lines (five tokens, class index below `nc`, coordinates in range)
//!
//! Images without a label file are normal and never reported.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Deeppcb2YoloError;
use crate::ir::io_yolo::{
    collect_files_with_extensions, parse_label_line, read_data_yaml, YoloLayout, IMAGE_EXTENSIONS,
    LABEL_EXTENSION,
};
use crate::ir::{BBoxCxCyWh, DefectClass, Normalized};
use crate::split::Split;

/// Options for check behavior.
#[derive(Clone, Debug, Default)]
pub struct CheckOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

impl CheckOptions {
    /// Whether a report should be considered a failure under these options.
    pub fn fails(&self, report: &ValidationReport) -> bool {
        report.error_count() > 0 || (self.strict && report.warning_count() > 0)
    }
}

/// Checks the dataset rooted at `root` and returns every issue found.
///
/// Only I/O failures while walking or reading the tree are returned as
/// errors; everything about the content ends up in the report.
pub fn check_dataset(root: &Path) -> Result<ValidationReport, Deeppcb2YoloError> {
    let layout = YoloLayout::new(root);
    let mut report = ValidationReport::new();

    let class_count = check_manifest(&layout, &mut report);

    for split in Split::ALL {
        let images_dir = layout.images_dir(split);
        let labels_dir = layout.labels_dir(split);

        let mut complete = true;
        for dir in [&images_dir, &labels_dir] {
            if !dir.is_dir() {
                report.add(ValidationIssue::error(
                    IssueCode::MissingSplitDir,
                    format!("missing {} directory", split),
                    IssueContext::Split { path: dir.clone() },
                ));
                complete = false;
            }
        }
        if !complete {
            continue;
        }

        let image_stems = collect_stems(&images_dir, &IMAGE_EXTENSIONS)?;
        for label_path in collect_files_with_extensions(&labels_dir, &[LABEL_EXTENSION])? {
            check_label_file(
                &labels_dir,
                &label_path,
                &image_stems,
                class_count,
                &mut report,
            )?;
        }
    }

    Ok(report)
}

/// Validates `data.yaml` and returns its class count when usable.
fn check_manifest(layout: &YoloLayout, report: &mut ValidationReport) -> Option<usize> {
    let path = layout.data_yaml();
    if !path.is_file() {
        report.add(ValidationIssue::error(
            IssueCode::MissingDataYaml,
            format!("{} not found", path.display()),
            IssueContext::Dataset,
        ));
        return None;
    }

    let descriptor = match read_data_yaml(&path) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            report.add(ValidationIssue::error(
                IssueCode::InvalidDataYaml,
                err.to_string(),
                IssueContext::Dataset,
            ));
            return None;
        }
    };

    if descriptor.nc != descriptor.names.len() {
        report.add(ValidationIssue::error(
            IssueCode::ClassCountMismatch,
            format!(
                "nc is {} but {} name(s) are listed",
                descriptor.nc,
                descriptor.names.len()
            ),
            IssueContext::Dataset,
        ));
    } else if descriptor.names != DefectClass::names() {
        report.add(ValidationIssue::warning(
            IssueCode::UnexpectedClassNames,
            format!(
                "class names {:?} differ from the DeepPCB taxonomy",
                descriptor.names
            ),
            IssueContext::Dataset,
        ));
    }

    Some(descriptor.nc)
}

fn check_label_file(
    labels_dir: &Path,
    label_path: &Path,
    image_stems: &HashSet<PathBuf>,
    class_count: Option<usize>,
    report: &mut ValidationReport,
) -> Result<(), Deeppcb2YoloError> {
    report.label_files += 1;

    let stem = relative_stem(labels_dir, label_path);
    if !image_stems.contains(&stem) {
        report.add(ValidationIssue::error(
            IssueCode::OrphanLabel,
            format!("no image named {}.* next to this label", stem.display()),
            IssueContext::LabelFile {
                path: label_path.to_path_buf(),
            },
        ));
    }

    let content = fs::read_to_string(label_path).map_err(Deeppcb2YoloError::Io)?;
    if content.trim().is_empty() {
        report.add(ValidationIssue::warning(
            IssueCode::EmptyLabelFile,
            "label file has no boxes",
            IssueContext::LabelFile {
                path: label_path.to_path_buf(),
            },
        ));
        return Ok(());
    }

    for (line_idx, line) in content.lines().enumerate() {
        let context = || IssueContext::Line {
            path: label_path.to_path_buf(),
            line: line_idx + 1,
        };

        let row = match parse_label_line(line) {
            Ok(Some(row)) => row,
            Ok(None) => continue,
            Err(message) => {
                report.add(ValidationIssue::error(
                    IssueCode::MalformedLabelLine,
                    message,
                    context(),
                ));
                continue;
            }
        };
        report.label_lines += 1;

        if let Some(nc) = class_count {
            if row.class_id >= nc {
                report.add(ValidationIssue::error(
                    IssueCode::ClassIndexOutOfRange,
                    format!("class index {} is not below nc={}", row.class_id, nc),
                    context(),
                ));
            }
        }

        let bbox = BBoxCxCyWh::<Normalized>::from_cxcywh(row.cx, row.cy, row.w, row.h);
        if !bbox.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::CoordinateNotFinite,
                format!("non-finite coordinates {:?}", bbox),
                context(),
            ));
        } else if !bbox.is_unit_range() {
            report.add(ValidationIssue::warning(
                IssueCode::CoordinateOutOfRange,
                format!("coordinates outside [0, 1]: {:?}", bbox),
                context(),
            ));
        }
    }

    Ok(())
}

/// Relative paths, without extension, of files under `root`.
fn collect_stems(root: &Path, extensions: &[&str]) -> Result<HashSet<PathBuf>, Deeppcb2YoloError> {
    Ok(collect_files_with_extensions(root, extensions)?
        .iter()
        .map(|path| relative_stem(root, path))
        .collect())
}

fn relative_stem(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).with_extension("")
}
