mod embedder;

pub use embedder::{EmbedderFactory, EmbedderFactoryError, HashingEmbedder, OpenAiEmbedder};
