mod media_validator;
mod ranged_source;

pub use media_validator::{MediaValidator, SUPPORTED_EXTENSIONS};
