// Corpus module
// Batch driver that turns a split's annotations into scored imperfect predictions

pub mod builder;
pub mod metadata;

pub use builder::{generate_prediction, BuildError, BuildSummary, CorpusBuilder, SampleError};
pub use metadata::{
    short_performance_id, MetadataError, MetadataResult, MetadataRow, MetadataTable,
    PerformanceJob,
};
