// Beat sequence module
// Value type for beat timestamps and annotation file I/O

pub mod annotation;
pub mod types;

pub use annotation::{
    format_beats, parse_annotation, read_annotation_file, write_beats_file, AnnotationError,
    AnnotationResult,
};
pub use types::BeatSequence;
