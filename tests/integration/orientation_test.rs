//! EXIF orientation is corrected on image acquisition only.

use super::common::{jpeg_with_orientation, origin_serving};
use image_saver::transform::metadata;
use image_saver::{Acquirable, FileSaver, ImageSaver, SaverConfig};
use rstest::rstest;

#[rstest]
#[case(1, (8, 4))]
#[case(3, (8, 4))]
#[case(6, (4, 8))]
#[case(8, (4, 8))]
#[tokio::test]
async fn test_image_download_is_upright(#[case] orientation: u16, #[case] expected: (u32, u32)) {
    let server = origin_serving("/cam.jpg", jpeg_with_orientation(8, 4, orientation)).await;
    let dir = tempfile::tempdir().unwrap();
    let saver = ImageSaver::new(SaverConfig::new(dir.path())).unwrap();

    let target = saver
        .download(format!("{}/cam.jpg", server.uri()).into(), Some("cam"))
        .await
        .unwrap();

    // Normalization never renames
    assert_eq!(target.file_name(), Some("cam.jpg"));
    let meta = metadata(target.path().unwrap()).await.unwrap();
    assert_eq!((meta.width, meta.height), expected);
}

#[tokio::test]
async fn test_file_download_is_not_normalized() {
    let original = jpeg_with_orientation(8, 4, 6);
    let server = origin_serving("/cam.jpg", original.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let saver =
        FileSaver::new(SaverConfig::new(dir.path()).with_valid_extensions(["jpg"])).unwrap();

    let target = saver
        .download(format!("{}/cam.jpg", server.uri()).into(), None)
        .await
        .unwrap();

    assert_eq!(std::fs::read(target.path().unwrap()).unwrap(), original);
}
