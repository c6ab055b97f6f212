use docpipe::domain::MediaRef;
use uuid::Uuid;

#[test]
fn given_filename_with_path_when_creating_media_ref_then_only_sanitized_basename_is_kept() {
    let id = Uuid::new_v4();

    let media = MediaRef::new(id, "../../etc/Team Sync (1).MP4");

    assert_eq!(media.as_str(), format!("uploads/{}/Team_Sync__1_.MP4", id));
    assert_eq!(media.filename(), "Team_Sync__1_.MP4");
    assert_eq!(media.extension().as_deref(), Some("mp4"));
}

#[test]
fn given_filename_without_extension_when_asking_extension_then_none() {
    let media = MediaRef::new(Uuid::new_v4(), "recording");

    assert_eq!(media.extension(), None);
}

#[test]
fn given_dot_only_filename_when_creating_media_ref_then_falls_back_to_upload() {
    let media = MediaRef::new(Uuid::new_v4(), "..");

    assert_eq!(media.filename(), "upload");
}
