mod object_artifact_store;

pub use object_artifact_store::ObjectArtifactStore;
