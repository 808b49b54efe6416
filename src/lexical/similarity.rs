//! BM25 relevance scoring.

use serde::{Deserialize, Serialize};

/// Okapi BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25 {
    /// Term frequency saturation.
    pub k1: f32,

    /// Length normalization strength, from 0 (none) to 1 (full).
    pub b: f32,
}

impl Default for Bm25 {
    fn default() -> Self {
        Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Bm25 {
    pub fn new(k1: f32, b: f32) -> Self {
        Bm25 { k1, b }
    }

    /// `ln(1 + (N - df + 0.5) / (df + 0.5))`, always positive.
    pub fn idf(&self, doc_freq: u64, doc_count: u64) -> f32 {
        let df = doc_freq as f32;
        let n = doc_count.max(doc_freq) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Saturated, length-normalized term frequency.
    pub fn tf_norm(&self, freq: f32, doc_length: f32, avg_length: f32) -> f32 {
        if freq <= 0.0 {
            return 0.0;
        }
        let relative = if avg_length > 0.0 {
            doc_length / avg_length
        } else {
            1.0
        };
        freq * (self.k1 + 1.0) / (freq + self.k1 * (1.0 - self.b + self.b * relative))
    }

    pub fn score(&self, idf: f32, freq: f32, doc_length: f32, avg_length: f32) -> f32 {
        idf * self.tf_norm(freq, doc_length, avg_length)
    }
}
