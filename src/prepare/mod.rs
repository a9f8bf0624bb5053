//! The DeepPCB → YOLO dataset pipeline.
//!
//! A run has two phases that must stay separate:
//!
//! 1. discover every candidate and assign it to train or val;
//! 2. per split, pair, decode, convert and write each candidate, dropping
//!    the ones that yield no labels.
//!
//! Filtering before splitting would change the effective train/val ratio.

mod report;

pub use report::{PrepareReport, SplitCounts};

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::error::Deeppcb2YoloError;
use crate::ir::io_deeppcb::{
    discover_candidates, parse_annotations, read_annotation_file, read_image_dimensions,
    IdPrefixResolver, PairResolver, DEFAULT_CANDIDATE_PATTERN,
};
use crate::ir::io_yolo::{write_data_yaml, write_label_file, YoloLayout};
use crate::ir::{NormalizedBox, RawRecord};
use crate::split::{
    split_candidates, validate_train_ratio, Split, DEFAULT_SEED, DEFAULT_TRAIN_RATIO,
};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{prefix}] [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Settings for one prepare run.
#[derive(Clone, Debug)]
pub struct PrepareConfig {
    /// Root of the raw DeepPCB corpus. Never modified.
    pub raw_root: PathBuf,
    /// Destination dataset root. Wiped and rebuilt on every run.
    pub dest_root: PathBuf,
    pub seed: u64,
    /// Fraction of candidates assigned to train.
    pub train_ratio: f64,
    /// File-name glob selecting candidate images.
    pub pattern: String,
    /// Draw per-split progress bars.
    pub show_progress: bool,
}

impl PrepareConfig {
    pub fn new(raw_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            raw_root: raw_root.into(),
            dest_root: dest_root.into(),
            seed: DEFAULT_SEED,
            train_ratio: DEFAULT_TRAIN_RATIO,
            pattern: DEFAULT_CANDIDATE_PATTERN.to_string(),
            show_progress: false,
        }
    }
}

/// What happened to a single candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Image copied and label file written.
    Written { boxes: usize, suspicious: usize },
    /// No sibling annotation file.
    MissingAnnotation,
    /// Annotation file exists but could not be read.
    UnreadableAnnotation,
    /// Image header could not be decoded.
    UnreadableImage,
    /// Annotation file had no foreground boxes.
    NoValidLabels,
    /// An earlier candidate of the same split already used this file name.
    DuplicateName,
}

/// Aggregated outcomes for one split.
#[derive(Clone, Debug)]
pub struct SplitOutcome {
    pub counts: SplitCounts,
    pub missing_annotation: usize,
    pub duplicate_names: usize,
    pub suspicious_boxes: usize,
}

/// Runs the full pipeline with the DeepPCB pairing convention.
pub fn prepare_dataset(config: &PrepareConfig) -> Result<PrepareReport, Deeppcb2YoloError> {
    prepare_dataset_with(config, &IdPrefixResolver)
}

/// Runs the full pipeline with a caller-supplied pair resolver.
///
/// Configuration problems (bad ratio, missing raw root, no candidates, a
/// destination that would swallow the raw corpus) fail before anything is
/// written.
pub fn prepare_dataset_with<R: PairResolver>(
    config: &PrepareConfig,
    resolver: &R,
) -> Result<PrepareReport, Deeppcb2YoloError> {
    validate_train_ratio(config.train_ratio)?;

    let candidates = discover_candidates(&config.raw_root, &config.pattern)?;
    if candidates.is_empty() {
        return Err(Deeppcb2YoloError::NoCandidates {
            path: config.raw_root.clone(),
            pattern: config.pattern.clone(),
        });
    }
    info!(
        "Found {} candidate image(s) under {}",
        candidates.len(),
        config.raw_root.display()
    );

    ensure_dest_outside_raw(&config.raw_root, &config.dest_root)?;
    let layout = prepare_output_root(&config.dest_root)?;

    let assignment = split_candidates(candidates, config.seed, config.train_ratio);
    info!(
        "Assigned {} to train and {} to val (seed {})",
        assignment.train.len(),
        assignment.val.len(),
        config.seed
    );

    let mut report = PrepareReport {
        raw_root: config.raw_root.display().to_string(),
        dest_root: config.dest_root.display().to_string(),
        seed: config.seed,
        candidates: assignment.len(),
        ..Default::default()
    };

    for (split, records) in assignment.iter() {
        let progress = create_progress_bar(records.len() as u64, split, config.show_progress);
        let outcome = materialize_split(split, records, &layout, resolver, &progress)?;
        progress.finish_and_clear();

        info!(
            "{}: wrote {} of {} candidate(s)",
            split, outcome.counts.written, outcome.counts.assigned
        );
        report.missing_annotation += outcome.missing_annotation;
        report.duplicate_names += outcome.duplicate_names;
        report.suspicious_boxes += outcome.suspicious_boxes;
        report.splits.push(outcome.counts);
    }

    let manifest = write_data_yaml(&layout)?;
    report.manifest = manifest.display().to_string();
    info!("Wrote {}", manifest.display());

    Ok(report)
}

/// Removes anything at `dest` and creates the four split folders.
///
/// Idempotent. Fails instead of continuing when old content cannot be
/// removed, so stale files never mix with a fresh run.
pub fn prepare_output_root(dest: &Path) -> Result<YoloLayout, Deeppcb2YoloError> {
    if fs::symlink_metadata(dest).is_ok() {
        debug!("Removing existing output root {}", dest.display());
        fs::remove_dir_all(dest).map_err(|source| Deeppcb2YoloError::OutputRootClear {
            path: dest.to_path_buf(),
            source,
        })?;
    }

    let layout = YoloLayout::new(dest);
    for dir in layout.split_dirs() {
        fs::create_dir_all(&dir).map_err(|source| Deeppcb2YoloError::OutputRootCreate {
            path: dir.clone(),
            source,
        })?;
    }

    Ok(layout)
}

/// Converts every candidate of one split, in order.
///
/// Per-candidate problems are counted, never returned; only destination
/// write failures abort.
pub fn materialize_split<R: PairResolver>(
    split: Split,
    records: &[RawRecord],
    layout: &YoloLayout,
    resolver: &R,
    progress: &ProgressBar,
) -> Result<SplitOutcome, Deeppcb2YoloError> {
    let mut outcome = SplitOutcome {
        counts: SplitCounts::new(split, records.len()),
        missing_annotation: 0,
        duplicate_names: 0,
        suspicious_boxes: 0,
    };

    for record in records {
        match materialize_candidate(record, split, layout, resolver)? {
            CandidateOutcome::Written { boxes, suspicious } => {
                outcome.counts.written += 1;
                outcome.counts.boxes += boxes;
                outcome.suspicious_boxes += suspicious;
            }
            CandidateOutcome::MissingAnnotation => outcome.missing_annotation += 1,
            CandidateOutcome::DuplicateName => outcome.duplicate_names += 1,
            CandidateOutcome::UnreadableAnnotation
            | CandidateOutcome::UnreadableImage
            | CandidateOutcome::NoValidLabels => {}
        }
        progress.inc(1);
    }

    Ok(outcome)
}

/// Resolve, decode, convert and write a single candidate.
pub fn materialize_candidate<R: PairResolver>(
    record: &RawRecord,
    split: Split,
    layout: &YoloLayout,
    resolver: &R,
) -> Result<CandidateOutcome, Deeppcb2YoloError> {
    let Some(annotation_path) = resolver.resolve(record) else {
        debug!("No annotation file for {}", record.path.display());
        return Ok(CandidateOutcome::MissingAnnotation);
    };

    let Some((width, height)) = read_image_dimensions(&record.path) else {
        return Ok(CandidateOutcome::UnreadableImage);
    };

    let text = match read_annotation_file(&annotation_path) {
        Ok(text) => text,
        Err(err) => {
            debug!("Cannot read {}: {err}", annotation_path.display());
            return Ok(CandidateOutcome::UnreadableAnnotation);
        }
    };

    let mut suspicious = 0;
    let mut boxes: Vec<NormalizedBox> = Vec::new();
    for line in parse_annotations(&text) {
        if !line.bbox().is_within(width, height) {
            debug!(
                "{}: box {:?} is inverted or outside {}x{}",
                annotation_path.display(),
                line.bbox(),
                width,
                height
            );
            suspicious += 1;
        }
        boxes.push(line.normalize(width, height));
    }

    if boxes.is_empty() {
        debug!("No foreground boxes in {}", annotation_path.display());
        return Ok(CandidateOutcome::NoValidLabels);
    }

    let file_name = record.file_name();
    let image_dest = layout.images_dir(split).join(&file_name);
    if image_dest.exists() {
        warn!(
            "{} already written by another candidate; skipping {}",
            image_dest.display(),
            record.path.display()
        );
        return Ok(CandidateOutcome::DuplicateName);
    }
    fs::copy(&record.path, &image_dest).map_err(|source| Deeppcb2YoloError::OutputWrite {
        path: image_dest.clone(),
        source,
    })?;
    write_label_file(&layout.label_path(split, &file_name), &boxes)?;

    Ok(CandidateOutcome::Written {
        boxes: boxes.len(),
        suspicious,
    })
}

/// Refuses destinations that overlap the raw corpus.
///
/// A destination containing the raw root would be wiped with it; one nested
/// under the raw root would be written into the corpus and its copies
/// rediscovered as candidates on the next run.
fn ensure_dest_outside_raw(raw_root: &Path, dest_root: &Path) -> Result<(), Deeppcb2YoloError> {
    let raw = fs::canonicalize(raw_root).map_err(Deeppcb2YoloError::Io)?;
    let dest = canonicalize_lenient(dest_root)?;

    if raw.starts_with(&dest) {
        return Err(Deeppcb2YoloError::InvalidConfig {
            message: format!(
                "destination {} contains the raw corpus {}; refusing to wipe it",
                dest_root.display(),
                raw_root.display()
            ),
        });
    }
    if dest.starts_with(&raw) {
        return Err(Deeppcb2YoloError::InvalidConfig {
            message: format!(
                "destination {} is inside the raw corpus {}; choose a folder outside it",
                dest_root.display(),
                raw_root.display()
            ),
        });
    }
    Ok(())
}

/// Canonicalizes the longest existing prefix of `path` and appends the rest,
/// so a destination that does not exist yet still compares against the
/// canonical raw root.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf, Deeppcb2YoloError> {
    let absolute = std::path::absolute(path).map_err(Deeppcb2YoloError::Io)?;
    for existing in absolute.ancestors() {
        if let Ok(canonical) = fs::canonicalize(existing) {
            let rest = absolute.strip_prefix(existing).unwrap_or(Path::new(""));
            return Ok(canonical.join(rest));
        }
    }
    Ok(absolute)
}

fn create_progress_bar(len: u64, split: Split, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_prefix(split.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Just enough of a BMP header for `imagesize` to read the size.
    fn bmp_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = b"BM".to_vec();
        bytes.resize(18, 0);
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes
    }

    fn write_candidate(dir: &Path, id: &str, annotation: Option<&str>) -> RawRecord {
        fs::create_dir_all(dir).expect("create raw dir");
        let image = dir.join(format!("{id}_test.jpg"));
        fs::write(&image, bmp_header(100, 50)).expect("write image");
        if let Some(text) = annotation {
            fs::write(dir.join(format!("{id}.txt")), text).expect("write annotation");
        }
        RawRecord::new(image)
    }

    #[test]
    fn output_root_is_wiped_and_recreated() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dest = temp.path().join("datasets");
        fs::create_dir_all(dest.join("images/train")).expect("create stale dir");
        fs::write(dest.join("images/train/stale.jpg"), b"old").expect("write stale");
        fs::write(dest.join("notes.txt"), b"old").expect("write stale");

        let layout = prepare_output_root(&dest).expect("prepare");

        assert!(!dest.join("images/train/stale.jpg").exists());
        assert!(!dest.join("notes.txt").exists());
        for dir in layout.split_dirs() {
            assert!(dir.is_dir(), "{} should exist", dir.display());
        }

        // Running it again on a fresh tree is fine.
        prepare_output_root(&dest).expect("prepare twice");
    }

    #[test]
    fn output_root_that_cannot_be_cleared_fails_fast() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dest = temp.path().join("datasets");
        fs::write(&dest, b"a file, not a directory").expect("write file");

        let err = prepare_output_root(&dest).unwrap_err();
        assert!(matches!(err, Deeppcb2YoloError::OutputRootClear { .. }));
    }

    #[test]
    fn candidate_with_valid_boxes_is_written() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");

        let record = write_candidate(&raw, "00000001", Some("10,10,30,20,1\n0 0 5 5 0\n"));
        let outcome =
            materialize_candidate(&record, Split::Train, &layout, &IdPrefixResolver).expect("ok");
        assert_eq!(
            outcome,
            CandidateOutcome::Written {
                boxes: 1,
                suspicious: 0
            }
        );

        let copied = fs::read(layout.images_dir(Split::Train).join("00000001_test.jpg"))
            .expect("image copied");
        assert_eq!(copied, fs::read(&record.path).expect("read source"));

        let label = fs::read_to_string(layout.labels_dir(Split::Train).join("00000001_test.txt"))
            .expect("label written");
        assert_eq!(label, "0 0.200000 0.300000 0.200000 0.200000");
    }

    #[test]
    fn candidate_without_annotation_is_reported_missing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");
        let record = write_candidate(&temp.path().join("raw"), "00000002", None);

        let outcome =
            materialize_candidate(&record, Split::Val, &layout, &IdPrefixResolver).expect("ok");
        assert_eq!(outcome, CandidateOutcome::MissingAnnotation);
    }

    #[test]
    fn background_only_candidate_emits_nothing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");
        let record = write_candidate(
            &temp.path().join("raw"),
            "00000003",
            Some("1 1 5 5 0\n2 2 6 6 9\nbad line\n"),
        );

        let outcome =
            materialize_candidate(&record, Split::Train, &layout, &IdPrefixResolver).expect("ok");
        assert_eq!(outcome, CandidateOutcome::NoValidLabels);
        assert!(!layout.images_dir(Split::Train).join("00000003_test.jpg").exists());
        assert!(!layout.labels_dir(Split::Train).join("00000003_test.txt").exists());
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");

        fs::create_dir_all(&raw).expect("create raw");
        fs::write(raw.join("00000004_test.jpg"), b"garbage").expect("write image");
        fs::write(raw.join("00000004.txt"), "1 1 5 5 1\n").expect("write annotation");

        let record = RawRecord::new(raw.join("00000004_test.jpg"));
        let outcome =
            materialize_candidate(&record, Split::Train, &layout, &IdPrefixResolver).expect("ok");
        assert_eq!(outcome, CandidateOutcome::UnreadableImage);
    }

    #[test]
    fn out_of_bounds_boxes_are_kept_and_counted() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");
        let record = write_candidate(
            &temp.path().join("raw"),
            "00000005",
            Some("90 40 120 60 2\n30 30 10 10 3\n"),
        );

        let outcome =
            materialize_candidate(&record, Split::Val, &layout, &IdPrefixResolver).expect("ok");
        assert_eq!(
            outcome,
            CandidateOutcome::Written {
                boxes: 2,
                suspicious: 2
            }
        );

        let label = fs::read_to_string(layout.labels_dir(Split::Val).join("00000005_test.txt"))
            .expect("label written");
        let lines: Vec<_> = label.lines().collect();
        assert_eq!(lines[0], "1 1.050000 1.000000 0.300000 0.400000");
        assert_eq!(lines[1], "2 0.200000 0.400000 -0.200000 -0.400000");
    }

    #[test]
    fn same_file_name_in_two_groups_is_written_once() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = prepare_output_root(&temp.path().join("out")).expect("prepare");
        let first = write_candidate(
            &temp.path().join("raw/group1"),
            "00000007",
            Some("1 1 5 5 1\n"),
        );
        let second = write_candidate(
            &temp.path().join("raw/group2"),
            "00000007",
            Some("1 1 5 5 2\n2 2 6 6 3\n"),
        );

        let outcome = materialize_split(
            Split::Train,
            &[first, second],
            &layout,
            &IdPrefixResolver,
            &ProgressBar::hidden(),
        )
        .expect("materialize");

        assert_eq!(outcome.counts.assigned, 2);
        assert_eq!(outcome.counts.written, 1);
        assert_eq!(outcome.counts.boxes, 1);
        assert_eq!(outcome.duplicate_names, 1);

        let label = fs::read_to_string(layout.labels_dir(Split::Train).join("00000007_test.txt"))
            .expect("label written");
        assert_eq!(label, "0 0.030000 0.060000 0.040000 0.080000");
    }

    #[test]
    fn destination_containing_raw_corpus_is_rejected() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        write_candidate(&raw, "00000006", Some("1 1 5 5 1\n"));

        let config = PrepareConfig::new(&raw, temp.path());
        let err = prepare_dataset(&config).unwrap_err();
        assert!(matches!(err, Deeppcb2YoloError::InvalidConfig { .. }));
        assert!(raw.join("00000006_test.jpg").exists());

        let config = PrepareConfig::new(&raw, &raw);
        let err = prepare_dataset(&config).unwrap_err();
        assert!(matches!(err, Deeppcb2YoloError::InvalidConfig { .. }));
        assert!(raw.join("00000006.txt").exists());
    }

    #[test]
    fn empty_corpus_fails_before_touching_destination() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        fs::create_dir_all(&raw).expect("create raw");
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).expect("create dest");
        fs::write(dest.join("keep.txt"), b"keep").expect("write keep");

        let err = prepare_dataset(&PrepareConfig::new(&raw, &dest)).unwrap_err();
        assert!(matches!(err, Deeppcb2YoloError::NoCandidates { .. }));
        assert!(dest.join("keep.txt").exists());
    }

    #[test]
    fn custom_resolver_is_used_for_pairing() {
        struct SameStem;
        impl PairResolver for SameStem {
            fn resolve(&self, record: &RawRecord) -> Option<PathBuf> {
                let candidate = record.path.with_extension("txt");
                candidate.is_file().then_some(candidate)
            }
        }

        let temp = tempfile::tempdir().expect("create temp dir");
        let raw = temp.path().join("raw");
        fs::create_dir_all(&raw).expect("create raw");
        fs::write(raw.join("board_test.jpg"), bmp_header(10, 10)).expect("write image");
        fs::write(raw.join("board_test.txt"), "0 0 10 10 4\n").expect("write annotation");

        let config = PrepareConfig {
            train_ratio: 1.0,
            ..PrepareConfig::new(&raw, temp.path().join("out"))
        };
        let report = prepare_dataset_with(&config, &SameStem).expect("prepare");
        assert_eq!(report.written_total(), 1);
        assert_eq!(report.missing_annotation, 0);
    }
}
