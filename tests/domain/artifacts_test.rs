use docpipe::domain::{ArtifactKind, ArtifactRef, Artifacts, ExportFormat, Stage};

fn populated() -> Artifacts {
    let mut artifacts = Artifacts::new();
    artifacts.record(ArtifactKind::Source, ArtifactRef::new("uploads/x/a.wav"));
    artifacts.record(ArtifactKind::Transcript, ArtifactRef::new("transcripts/x/r0/transcript.json"));
    artifacts.record(ArtifactKind::TranscriptIndex, ArtifactRef::new("index/x/r0"));
    artifacts.record(ArtifactKind::Document, ArtifactRef::new("documents/x/r0/document.json"));
    artifacts.record(
        ArtifactKind::Export(ExportFormat::Pdf),
        ArtifactRef::new("documents/x/r0/exports/document.pdf"),
    );
    artifacts
}

#[test]
fn given_existing_kind_when_recording_again_then_returns_false_and_keeps_first() {
    let mut artifacts = Artifacts::new();

    assert!(artifacts.record(ArtifactKind::Document, ArtifactRef::new("one")));
    assert!(!artifacts.record(ArtifactKind::Document, ArtifactRef::new("two")));

    assert_eq!(artifacts.get(ArtifactKind::Document).unwrap().as_str(), "one");
    assert_eq!(artifacts.len(), 1);
}

#[test]
fn given_artifacts_when_superseding_from_generating_then_earlier_outputs_stay_live() {
    let mut artifacts = populated();

    artifacts.supersede_from(Stage::Generating, 0);

    assert!(artifacts.get(ArtifactKind::Transcript).is_some());
    assert!(artifacts.get(ArtifactKind::TranscriptIndex).is_some());
    assert!(artifacts.get(ArtifactKind::Document).is_none());
    assert!(artifacts.export(ExportFormat::Pdf).is_none());

    let superseded: Vec<ArtifactKind> = artifacts.superseded().iter().map(|s| s.kind).collect();
    assert_eq!(
        superseded,
        vec![ArtifactKind::Document, ArtifactKind::Export(ExportFormat::Pdf)]
    );
    assert!(artifacts.superseded().iter().all(|s| s.revision == 0));
}

#[test]
fn given_artifacts_when_serialized_then_export_kinds_use_prefixed_keys() {
    let artifacts = populated();

    let json = serde_json::to_value(&artifacts).unwrap();

    assert!(json["entries"]["export:pdf"].is_string());
    let restored: Artifacts = serde_json::from_value(json).unwrap();
    assert_eq!(restored, artifacts);
}

#[test]
fn given_kind_when_asking_producer_then_matches_pipeline_stage() {
    assert_eq!(ArtifactKind::Source.produced_by(), Stage::Received);
    assert_eq!(ArtifactKind::TranscriptIndex.produced_by(), Stage::Indexing);
    assert_eq!(ArtifactKind::Export(ExportFormat::Html).produced_by(), Stage::Exporting);
}
