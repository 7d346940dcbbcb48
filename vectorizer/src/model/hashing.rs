//! Feature-hashing backend: deterministic vectors without any model artifact.
//!
//! Each whitespace token is hashed (FNV-1a, seeded by the model location) into one of
//! `dimension` buckets with a sign bit; the result is L2-normalized. Useful for offline
//! runs and tests; not a semantic model.

use async_trait::async_trait;
use std::sync::Arc;

use super::{ModelLoader, Predictor};
use crate::error::EmbedError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(seed: u64, bytes: &[u8]) -> u64 {
    bytes.iter().fold(seed, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// Loader for [`HashingPredictor`]s. Accepts any non-empty location.
#[derive(Clone, Debug)]
pub struct HashingLoader {
    dimension: usize,
}

impl HashingLoader {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

#[async_trait]
impl ModelLoader for HashingLoader {
    async fn load(&self, location: &str) -> Result<Arc<dyn Predictor>, EmbedError> {
        if location.trim().is_empty() {
            return Err(EmbedError::unavailable(location, "empty model location"));
        }
        Ok(Arc::new(HashingPredictor::new(location, self.dimension)))
    }
}

/// Hashing embedder for one model location.
#[derive(Clone, Debug)]
pub struct HashingPredictor {
    seed: u64,
    dimension: usize,
}

impl HashingPredictor {
    pub fn new(location: &str, dimension: usize) -> Self {
        Self {
            seed: fnv1a(FNV_OFFSET, location.as_bytes()),
            dimension: dimension.max(1),
        }
    }

    /// Synchronous embedding; [`Predictor::predict`] delegates here.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let h = fnv1a(self.seed, token.to_lowercase().as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl Predictor for HashingPredictor {
    async fn predict(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed(text))
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}
