//! Multipart upload acquisition.

use super::common::{file_names, multipart, png};
use image_saver::{Acquirable, ErrorCode, FileSaver, ImageSaver, SaverConfig, UploadStream};

#[tokio::test]
async fn test_upload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();
    let body = png(12, 6);

    let target = saver
        .download(
            multipart(&[
                ("caption", None, &b"holiday"[..]),
                ("image", Some("beach.png"), body.as_slice()),
            ])
            .into(),
            Some("beach-01"),
        )
        .await
        .unwrap();

    assert_eq!(target.file_name(), Some("beach-01.png"));
    assert_eq!(std::fs::read(target.path().unwrap()).unwrap(), body);
    // Temp file was moved, not copied
    assert_eq!(file_names(dir.path()), vec!["beach-01.png".to_string()]);
}

#[tokio::test]
async fn test_upload_uses_declared_extension() {
    let dir = tempfile::tempdir().unwrap();
    let saver =
        FileSaver::new(SaverConfig::new(dir.path()).with_valid_extensions(["csv"])).unwrap();

    let target = saver
        .download(
            multipart(&[("file", Some("export.2024.csv"), &b"a,b\n1,2\n"[..])]).into(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(target.extension(), Some("csv"));
    assert_eq!(std::fs::read(target.path().unwrap()).unwrap(), &b"a,b\n1,2\n"[..]);
}

#[tokio::test]
async fn test_upload_bad_extension_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();

    let err = saver
        .download(
            multipart(&[("image", Some("evil.exe"), &b"MZ\x90\x00"[..])]).into(),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::FormatUnsupported);
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_upload_without_file_part_is_source_broken() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();

    let err = saver
        .download(
            multipart(&[("caption", None, &b"no file here"[..])]).into(),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::SourceBroken);
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn test_upload_without_boundary_is_source_broken() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();

    let upload = UploadStream::from_bytes("multipart/form-data", png(2, 2));
    let err = saver.download(upload.into(), None).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::SourceBroken);
}

#[tokio::test]
async fn test_upload_corrupt_image_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();

    let err = saver
        .download(
            multipart(&[("image", Some("fake.png"), &b"definitely not a png"[..])]).into(),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::FormatUnsupported);
    assert!(file_names(dir.path()).is_empty());
}
