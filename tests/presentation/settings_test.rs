use std::time::Duration;

use docpipe::domain::Stage;
use docpipe::presentation::config::{Environment, Settings, StageOverride};

#[test]
fn given_default_settings_when_building_pipeline_configuration_then_valid() {
    let settings = Settings::default();

    let config = settings.pipeline_configuration().unwrap();

    assert_eq!(config.worker_count, settings.pipeline.worker_count);
    assert_eq!(config.embedding_dimension, settings.embeddings.dimension);
    assert_eq!(
        config.policy(Stage::Indexing).timeout,
        Duration::from_secs(settings.pipeline.stage_timeout_secs)
    );
}

#[test]
fn given_stage_override_when_building_pipeline_configuration_then_only_that_stage_changes() {
    let mut settings = Settings::default();
    settings.pipeline.stages.insert(
        Stage::Transcribing,
        StageOverride {
            timeout_secs: Some(1800),
            max_retries: None,
        },
    );

    let config = settings.pipeline_configuration().unwrap();

    let transcribing = config.policy(Stage::Transcribing);
    assert_eq!(transcribing.timeout, Duration::from_secs(1800));
    assert_eq!(transcribing.max_retries, settings.pipeline.max_retries);
    assert_eq!(
        config.policy(Stage::Exporting).timeout,
        Duration::from_secs(settings.pipeline.stage_timeout_secs)
    );
}

#[test]
fn given_override_for_stage_without_executor_when_building_then_rejected() {
    let mut settings = Settings::default();
    settings
        .pipeline
        .stages
        .insert(Stage::Complete, StageOverride::default());

    assert!(settings.pipeline_configuration().is_err());
}

#[test]
fn given_zero_workers_when_building_pipeline_configuration_then_rejected() {
    let mut settings = Settings::default();
    settings.pipeline.worker_count = 0;

    assert!(settings.pipeline_configuration().is_err());
}

#[test]
fn given_environment_names_when_parsing_then_aliases_are_accepted() {
    assert_eq!(Environment::try_from("PRODUCTION".to_string()), Ok(Environment::Prod));
    assert_eq!(Environment::try_from("test".to_string()), Ok(Environment::Test));
    assert!(Environment::try_from("staging".to_string()).is_err());
}

#[test]
fn given_media_limit_in_megabytes_when_converting_then_bytes() {
    let settings = Settings::default();

    assert_eq!(
        settings.media.max_file_size_bytes(),
        settings.media.max_file_size_mb * 1024 * 1024
    );
}
