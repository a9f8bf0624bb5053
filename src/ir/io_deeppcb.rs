//! DeepPCB raw corpus reader.
//!
//! The raw corpus is a tree of `<id>_test.jpg` images (next to `<id>_temp.jpg`
//! templates) with a sibling `<id>.txt` per tested image. Each annotation line
//! is `x1 y1 x2 y2 type` in absolute pixels, separated by spaces or commas.
//!
//! Reading is deliberately permissive: malformed lines and missing pairs are
//! skipped, never reported as errors.

use std::fs;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use walkdir::WalkDir;

use super::{AnnotationLine, DefectClass, RawRecord};
use crate::error::Deeppcb2YoloError;

/// Glob matched against file names to find candidate images.
pub const DEFAULT_CANDIDATE_PATTERN: &str = "*_test.*";

const ANNOTATION_EXTENSION: &str = "txt";

/// Locates the annotation file belonging to a candidate image.
///
/// `None` means the pair is missing; callers skip the candidate.
pub trait PairResolver {
    fn resolve(&self, record: &RawRecord) -> Option<PathBuf>;
}

/// DeepPCB pairing: `<dir>/<id>_test.jpg` pairs with `<dir>/<id>.txt`, where
/// `<id>` is the file name up to its first underscore.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdPrefixResolver;

impl PairResolver for IdPrefixResolver {
    fn resolve(&self, record: &RawRecord) -> Option<PathBuf> {
        let candidate = record
            .dir()
            .join(format!("{}.{}", record.identifier(), ANNOTATION_EXTENSION));
        candidate.is_file().then_some(candidate)
    }
}

/// Recursively collects candidate images under `root` whose file name
/// matches `pattern`, sorted by path.
pub fn discover_candidates(
    root: &Path,
    pattern: &str,
) -> Result<Vec<RawRecord>, Deeppcb2YoloError> {
    if !root.is_dir() {
        return Err(Deeppcb2YoloError::RawRootMissing {
            path: root.to_path_buf(),
        });
    }

    let matcher =
        Pattern::new(pattern).map_err(|source| Deeppcb2YoloError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut candidates = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if matcher.matches_with(&name, options) {
            candidates.push(RawRecord::new(entry.path()));
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Parses annotation text into its surviving lines.
///
/// Lines with fewer than five tokens, a non-integer among the first five, or
/// a category outside 1..=6 are dropped.
pub fn parse_annotations(text: &str) -> impl Iterator<Item = AnnotationLine> + '_ {
    text.lines().filter_map(parse_annotation_line)
}

/// Parses a single annotation line. Tokens past the fifth are ignored.
pub fn parse_annotation_line(line: &str) -> Option<AnnotationLine> {
    let normalized = line.replace(',', " ");
    let mut tokens = normalized.split_whitespace();

    let mut values = [0i64; 5];
    for slot in values.iter_mut() {
        *slot = tokens.next()?.parse().ok()?;
    }

    let [x1, y1, x2, y2, code] = values;
    let class = DefectClass::from_code(code)?;

    Some(AnnotationLine {
        x1,
        y1,
        x2,
        y2,
        class,
    })
}

/// Reads an annotation file, replacing invalid UTF-8 rather than failing.
pub fn read_annotation_file(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads an image's pixel size from its header.
///
/// Returns `None` for undecodable files and for zero-sized images, both of
/// which make the candidate unusable.
pub fn read_image_dimensions(path: &Path) -> Option<(u32, u32)> {
    let size = match imagesize::size(path) {
        Ok(size) => size,
        Err(err) => {
            debug!("Cannot read dimensions of {}: {err}", path.display());
            return None;
        }
    };

    let width: u32 = size.width.try_into().ok()?;
    let height: u32 = size.height.try_into().ok()?;
    if width == 0 || height == 0 {
        debug!("Image {} has zero size", path.display());
        return None;
    }

    Some((width, height))
}
