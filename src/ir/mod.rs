//! Core types for the DeepPCB → YOLO conversion.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: pixel and normalized boxes carry a marker type so the
//!    two coordinate systems cannot be mixed by accident.
//!
//! 2. **Permissive Construction**: boxes may be inverted or fall outside the
//!    image. Normalization is pure arithmetic and never clamps.
//!
//! # Example
//!
//! ```
//! use deeppcb2yolo::ir::io_deeppcb::parse_annotation_line;
//!
//! let line = parse_annotation_line("100,200,140,260,3").unwrap();
//! let label = line.normalize(640, 640);
//! assert_eq!(label.to_string(), "2 0.187500 0.359375 0.062500 0.093750");
//! ```

mod bbox;
mod class;
pub mod io_deeppcb;
pub mod io_yolo;
mod model;
mod space;

pub use bbox::{normalize_box, BBoxCxCyWh, BBoxXYXY};
pub use class::DefectClass;
pub use model::{annotation_identifier, AnnotationLine, NormalizedBox, RawRecord};
pub use space::{Normalized, Pixel};
