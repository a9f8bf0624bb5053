//! The fixed DeepPCB defect taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the six DeepPCB foreground defect classes.
///
/// Raw annotations use codes 1..=6 (0 is background); YOLO class indices are
/// the same order shifted to start at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefectClass {
    Open,
    Short,
    Mousebite,
    Spur,
    Copper,
    PinHole,
}

impl DefectClass {
    /// All classes in class-index order.
    pub const ALL: [DefectClass; 6] = [
        DefectClass::Open,
        DefectClass::Short,
        DefectClass::Mousebite,
        DefectClass::Spur,
        DefectClass::Copper,
        DefectClass::PinHole,
    ];

    /// Number of foreground classes written to the manifest.
    pub const COUNT: usize = Self::ALL.len();

    /// Maps a raw category code to a class. Background (0) and anything
    /// outside 1..=6 yield `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        if !(1..=Self::COUNT as i64).contains(&code) {
            return None;
        }
        Self::from_index((code - 1) as usize)
    }

    /// Resolves a zero-based class index, as found in YOLO labels or detector
    /// output.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Zero-based class index used in YOLO label files.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The raw DeepPCB category code.
    pub fn code(self) -> i64 {
        self.index() as i64 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            DefectClass::Open => "open",
            DefectClass::Short => "short",
            DefectClass::Mousebite => "mousebite",
            DefectClass::Spur => "spur",
            DefectClass::Copper => "copper",
            DefectClass::PinHole => "pin-hole",
        }
    }

    /// Class names in index order.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|c| c.name().to_string()).collect()
    }
}

impl fmt::Display for DefectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
