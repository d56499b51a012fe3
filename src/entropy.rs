//! Entropy sources
//!
//! Default seeds and upload identifiers come from an injected [`Entropy`]
//! so tests can pin them.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;
use uuid::Uuid;

/// Largest seed handed out; keeps seeds valid for providers that store them
/// in a signed 32-bit field.
pub const MAX_SEED: u32 = i32::MAX as u32;

/// Source of fresh randomness
pub trait Entropy: Send + Sync {
    /// Uniformly random seed in `0..=MAX_SEED`
    fn seed(&self) -> u32;

    /// Identifier that disambiguates concurrent uploads
    fn upload_id(&self) -> String;
}

/// Thread-local RNG backed entropy
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl Entropy for SystemEntropy {
    fn seed(&self) -> u32 {
        rand::rng().random_range(0..=MAX_SEED)
    }

    fn upload_id(&self) -> String {
        Uuid::new_v4().simple().to_string()[..11].to_string()
    }
}

/// Deterministic entropy for tests: a fixed seed and numbered upload ids
#[derive(Debug)]
pub struct FixedEntropy {
    seed: u32,
    uploads: AtomicU32,
}

impl FixedEntropy {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            uploads: AtomicU32::new(0),
        }
    }
}

impl Entropy for FixedEntropy {
    fn seed(&self) -> u32 {
        self.seed
    }

    fn upload_id(&self) -> String {
        format!("upload{}", self.uploads.fetch_add(1, Ordering::Relaxed))
    }
}
