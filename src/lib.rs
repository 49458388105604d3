// Beat Corpus - Imperfect beat-tracking prediction generator
// Module declarations

pub mod beats;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod corruption;
pub mod evaluation;
pub mod pipeline;
pub mod rng;

pub use beats::BeatSequence;
pub use config::BuildConfig;
pub use corpus::{BuildSummary, CorpusBuilder};
pub use corruption::{corrupt, CorruptionError, SeverityConfig};
pub use evaluation::{clean_and_score, EvaluationConfig, EvaluationError, EvaluationResult};
