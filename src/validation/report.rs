//! Check report types for structured error reporting.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The result of checking an emitted dataset tree.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// All issues found, in discovery order.
    pub issues: Vec<ValidationIssue>,
    /// Label files inspected.
    pub label_files: usize,
    /// Label lines inspected.
    pub label_lines: usize,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(
                f,
                "Check passed: {} label file(s), {} line(s), no issues found",
                self.label_files, self.label_lines
            );
        }

        writeln!(
            f,
            "Check completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// A stable code for the issue type.
    pub code: IssueCode,
    pub message: String,
    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Suspicious but consumable by a trainer.
    Warning,
    /// Breaks the trainer contract.
    Error,
}

/// A stable code identifying the type of issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Manifest issues
    /// `data.yaml` is absent.
    MissingDataYaml,
    /// `data.yaml` does not parse.
    InvalidDataYaml,
    /// `nc` disagrees with the number of names.
    ClassCountMismatch,
    /// Class names differ from the DeepPCB taxonomy.
    UnexpectedClassNames,

    // Layout issues
    /// `images/<split>` or `labels/<split>` is missing.
    MissingSplitDir,
    /// A label file has no image with the same stem.
    OrphanLabel,
    /// A label file has no lines.
    EmptyLabelFile,

    // Line issues
    /// A label line does not parse.
    MalformedLabelLine,
    /// A class index is not below `nc`.
    ClassIndexOutOfRange,
    /// A coordinate is NaN or infinite.
    CoordinateNotFinite,
    /// A coordinate lies outside [0, 1].
    CoordinateOutOfRange,
}

/// Where an issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    /// The dataset root or manifest.
    Dataset,
    /// A split directory.
    Split { path: PathBuf },
    /// A whole label file.
    LabelFile { path: PathBuf },
    /// One line of a label file (1-based).
    Line { path: PathBuf, line: usize },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Dataset => write!(f, "dataset"),
            IssueContext::Split { path } => write!(f, "{}", path.display()),
            IssueContext::LabelFile { path } => write!(f, "{}", path.display()),
            IssueContext::Line { path, line } => write!(f, "{}:{}", path.display(), line),
        }
    }
}
