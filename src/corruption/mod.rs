// Corruption module
// Turns a ground-truth beat annotation into a plausibly wrong beat-tracker output

pub mod config;
pub mod corrupt;
pub mod stages;

pub use config::SeverityConfig;
pub use corrupt::{corrupt, corrupt_with_stats, CorruptionStats};
pub use stages::{
    add_noise, apply_offset_errors, choose_indices, delete_beats, insert_beats, CorruptionError,
    CorruptionResult, CorruptionStage,
};
