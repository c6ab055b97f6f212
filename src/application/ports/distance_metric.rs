use serde::Deserialize;

use crate::domain::Embedding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl DistanceMetric {
    /// Similarity score where larger means closer.
    pub fn score(&self, a: &Embedding, b: &Embedding) -> f32 {
        match self {
            DistanceMetric::Cosine => a.cosine_similarity(b),
            DistanceMetric::DotProduct => a.dot(b),
            DistanceMetric::Euclidean => -a.euclidean_distance(b),
        }
    }
}
