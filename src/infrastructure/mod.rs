pub mod audio;
pub mod documents;
pub mod llm;
pub mod media;
pub mod observability;
pub mod persistence;
pub mod storage;
