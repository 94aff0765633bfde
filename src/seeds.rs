//! Derived seeds for the pipeline's stochastic components.
//!
//! Every source of randomness is seeded from the configured `seed` plus a
//! fixed salt, so components stay decoupled (changing epoch count does not
//! perturb the split) while the whole run remains reproducible.

/// Seed for the train/dev split shuffle.
pub(crate) fn split(seed: u64) -> u64 {
    seed
}

/// Seed for from-scratch embedding initialization.
pub(crate) fn embedding(seed: u64) -> u64 {
    seed.wrapping_add(1)
}

/// Seed for model parameter initialization.
pub(crate) fn params(seed: u64) -> u64 {
    seed.wrapping_add(2)
}

/// Seed for dropout masks.
pub(crate) fn dropout(seed: u64) -> u64 {
    seed.wrapping_add(3)
}

/// Seed for the example shuffle of a given training epoch.
pub(crate) fn epoch_shuffle(seed: u64, epoch: usize) -> u64 {
    seed.wrapping_add(100).wrapping_add(epoch as u64)
}
