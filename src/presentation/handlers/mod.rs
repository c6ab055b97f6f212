mod documentation;
mod download;
mod error;
mod health;
mod job_control;
mod status;
mod upload;

pub use documentation::documentation_handler;
pub use download::download_handler;
pub use error::ErrorResponse;
pub use health::health_handler;
pub use job_control::{cancel_handler, reprocess_handler};
pub use status::status_handler;
pub use upload::upload_handler;
