// Deterministic RNG construction
// Each performance draws from its own stream, derived from the run's base seed and its id

use rand::SeedableRng;
use rand_pcg::Pcg64;
use sha2::{Digest, Sha256};

/// Creates a PCG64 generator from a 64-bit seed.
pub fn create_rng(seed: u64) -> Pcg64 {
    Pcg64::seed_from_u64(seed)
}

/// Derives the seed for one performance.
///
/// Hashes the base seed (little-endian) followed by the UTF-8 performance id
/// with SHA-256 and keeps the first 8 bytes as a little-endian `u64`.
pub fn derive_performance_seed(base_seed: u64, performance_id: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(performance_id.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Creates the generator for one performance.
pub fn create_performance_rng(base_seed: u64, performance_id: &str) -> Pcg64 {
    create_rng(derive_performance_seed(base_seed, performance_id))
}
