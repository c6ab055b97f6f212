mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, DocumentSettings, EmbeddingProvider, EmbeddingsSettings, MediaSettings,
    OpenAiSettings, PersistenceMode, PipelineSettings, ServerSettings, Settings, StageOverride,
    StorageProviderSetting, StorageSettings,
};
