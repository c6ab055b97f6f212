use crate::presentation::config::Environment;

pub struct TracingConfig {
    pub environment: Environment,
    pub json_format: bool,
}

impl TracingConfig {
    /// JSON output is on in production unless `LOG_FORMAT` says otherwise.
    pub fn new(environment: Environment) -> Self {
        let json_format = match std::env::var("LOG_FORMAT") {
            Ok(v) => v.eq_ignore_ascii_case("json"),
            Err(_) => environment == Environment::Prod,
        };
        Self {
            environment,
            json_format,
        }
    }
}
