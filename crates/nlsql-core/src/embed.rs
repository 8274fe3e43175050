//! Text → vector embedding used by knowledge-store backends.

use std::collections::HashMap;

/// Translates text into a fixed-dimension vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, across process restarts, so persisted embeddings stay
/// comparable with freshly computed query embeddings.
pub trait Embedder: Send + Sync {
  fn embed(&self, text: &str) -> Vec<f32>;

  fn dimensions(&self) -> usize;

  /// Stable identifier recorded next to each stored vector.
  fn name(&self) -> &str;
}

/// Default dimension for [`HashingEmbedder`].
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Hashed term-frequency embedder.
///
/// Terms are lower-cased alphanumeric runs of at least two characters, hashed
/// into buckets with FNV-1a and weighted by frequency × a length-based IDF
/// approximation. The vector is L2-normalised, so a dot product between two
/// outputs is their cosine similarity. Needs no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
  dimensions: usize,
}

impl HashingEmbedder {
  pub fn new(dimensions: usize) -> Self {
    Self { dimensions: dimensions.max(1) }
  }

  fn bucket(term: &str, dims: usize) -> usize {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in term.as_bytes() {
      h ^= u64::from(*b);
      h = h.wrapping_mul(0x0100_0000_01b3);
    }
    (h % dims as u64) as usize
  }

  fn tokenize(text: &str) -> Vec<String> {
    text
      .split(|c: char| !c.is_alphanumeric() && c != '_')
      .filter(|s| s.len() >= 2)
      .map(str::to_lowercase)
      .collect()
  }
}

impl Default for HashingEmbedder {
  fn default() -> Self { Self::new(DEFAULT_DIMENSIONS) }
}

impl Embedder for HashingEmbedder {
  fn embed(&self, text: &str) -> Vec<f32> {
    let tokens = Self::tokenize(text);
    let mut vec = vec![0.0f32; self.dimensions];
    if tokens.is_empty() {
      return vec;
    }

    let mut tf: HashMap<&str, f32> = HashMap::new();
    for tok in &tokens {
      *tf.entry(tok.as_str()).or_default() += 1.0;
    }

    let total = tokens.len() as f32;
    for (term, count) in tf {
      let idf = 1.0 + (term.len() as f32).ln();
      vec[Self::bucket(term, self.dimensions)] += (count / total) * idf;
    }

    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
      for v in &mut vec {
        *v /= norm;
      }
    }
    vec
  }

  fn dimensions(&self) -> usize { self.dimensions }

  fn name(&self) -> &str { "hashing-tf" }
}

/// Cosine similarity of two vectors; `0.0` when either has zero norm or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    return 0.0;
  }
  let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
  if na <= f32::EPSILON || nb <= f32::EPSILON {
    return 0.0;
  }
  dot / (na * nb)
}
