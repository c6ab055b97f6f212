mod export_stage;
mod generate_stage;
mod index_stage;
mod transcribe_stage;
mod validate_stage;

pub use export_stage::ExportStage;
pub use generate_stage::GenerateStage;
pub use index_stage::IndexStage;
pub use transcribe_stage::TranscribeStage;
pub use validate_stage::ValidateStage;
