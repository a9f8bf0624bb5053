//! Run summary for the prepare pipeline.

use serde::Serialize;
use std::fmt;

use crate::split::Split;

/// What a prepare run did, in aggregate.
///
/// Per-candidate skips other than a missing annotation file (unreadable
/// image, no surviving labels) are only visible as the gap between
/// `assigned` and `written`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PrepareReport {
    /// Raw corpus root that was scanned.
    pub raw_root: String,
    /// Destination dataset root.
    pub dest_root: String,
    /// Path of the written `data.yaml`.
    pub manifest: String,
    /// Seed used for the split.
    pub seed: u64,
    /// Candidates discovered before splitting.
    pub candidates: usize,
    /// Per-split counts, train first.
    pub splits: Vec<SplitCounts>,
    /// Candidates skipped because their annotation file was absent.
    pub missing_annotation: usize,
    /// Candidates skipped because an earlier one in the same split had the
    /// same file name.
    pub duplicate_names: usize,
    /// Written boxes that were inverted or extended past the image.
    pub suspicious_boxes: usize,
}

impl PrepareReport {
    /// Total image/label pairs written across splits.
    pub fn written_total(&self) -> usize {
        self.splits.iter().map(|s| s.written).sum()
    }

    pub fn split(&self, split: Split) -> Option<&SplitCounts> {
        self.splits.iter().find(|s| s.split == split)
    }
}

/// Counts for a single split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitCounts {
    pub split: Split,
    /// Candidates assigned to this split.
    pub assigned: usize,
    /// Image/label pairs written.
    pub written: usize,
    /// Label lines written.
    pub boxes: usize,
}

impl SplitCounts {
    pub fn new(split: Split, assigned: usize) -> Self {
        Self {
            split,
            assigned,
            written: 0,
            boxes: 0,
        }
    }
}

impl fmt::Display for PrepareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prepared dataset at {}", self.dest_root)?;
        writeln!(
            f,
            "  {} candidate(s) under {} (seed {})",
            self.candidates, self.raw_root, self.seed
        )?;
        for counts in &self.splits {
            writeln!(
                f,
                "  {:<5} {} assigned, {} written, {} box(es)",
                counts.split, counts.assigned, counts.written, counts.boxes
            )?;
        }
        writeln!(f, "Pairs written: {}", self.written_total())?;
        if self.missing_annotation > 0 {
            writeln!(
                f,
                "Skipped (no annotation file): {}",
                self.missing_annotation
            )?;
        }
        if self.duplicate_names > 0 {
            writeln!(f, "Skipped (duplicate file name): {}", self.duplicate_names)?;
        }
        if self.suspicious_boxes > 0 {
            writeln!(
                f,
                "Boxes outside image bounds or inverted: {}",
                self.suspicious_boxes
            )?;
        }
        writeln!(f, "Manifest: {}", self.manifest)
    }
}
