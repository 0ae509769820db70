//! Transforms and overlays on saved images.

use super::common::{jpeg, multipart, png};
use image::Rgba;
use image_saver::transform::{metadata, ImageError};
use image_saver::{
    Acquirable, ErrorCode, Gravity, ImageFormat, ImageSaver, OverlayPosition, ProcessRequest,
    Processable, SaveTarget, SaverConfig, TextOverlay, TextStyle, TransformChain,
};
use std::path::Path;

async fn upload(dir: &Path, name: &str, bytes: Vec<u8>) -> (ImageSaver, SaveTarget) {
    let saver = ImageSaver::new(SaverConfig::new(dir)).unwrap();
    let target = saver
        .download(multipart(&[("file", Some(name), bytes.as_slice())]).into(), Some("img"))
        .await
        .unwrap();
    (saver, target)
}

fn red_box(text: &str) -> TextOverlay {
    TextOverlay::new(text).with_style(TextStyle {
        color: "#FF0000".into(),
        background: Some("#FF0000".into()),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_noop_transform_twice_keeps_name() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.jpg", jpeg(10, 10)).await;

    let first = saver
        .process(&target, ProcessRequest::new().transform(TransformChain::new()))
        .await
        .unwrap();
    let second = saver
        .process(&first, ProcessRequest::new().transform(TransformChain::new()))
        .await
        .unwrap();

    assert_eq!(first.file_name(), Some("img.jpg"));
    assert_eq!(second, first);
}

#[tokio::test]
async fn test_png_output_renames_jpg() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.jpg", jpeg(10, 10)).await;
    let old_path = target.path().unwrap().to_path_buf();

    let processed = saver
        .process(
            &target,
            ProcessRequest::new().transform(TransformChain::new().format(ImageFormat::Png)),
        )
        .await
        .unwrap();

    assert_eq!(processed.file_name(), Some("img.png"));
    assert!(!old_path.exists());
    let meta = metadata(processed.path().unwrap()).await.unwrap();
    assert_eq!(meta.format, ImageFormat::Png);
    // Caller's snapshot is untouched
    assert_eq!(target.file_name(), Some("img.jpg"));
}

#[tokio::test]
async fn test_jpeg_output_renames_png_to_jpg() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(10, 10)).await;

    let processed = saver
        .process(
            &target,
            ProcessRequest::new().transform(
                TransformChain::new()
                    .resize(100, 100)
                    .blur(3.0)
                    .format(ImageFormat::Jpeg)
                    .quality(60),
            ),
        )
        .await
        .unwrap();

    assert_eq!(processed.file_name(), Some("img.jpg"));
    let meta = metadata(processed.path().unwrap()).await.unwrap();
    assert_eq!((meta.width, meta.height, meta.format), (100, 100, ImageFormat::Jpeg));
}

#[tokio::test]
async fn test_closure_transform() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(10, 10)).await;
    let replacement = jpeg(3, 3);

    let program = move |_: &[u8]| -> Result<Vec<u8>, ImageError> { Ok(replacement.clone()) };
    let processed = saver
        .process(&target, ProcessRequest::new().transform(program))
        .await
        .unwrap();

    assert_eq!(processed.extension(), Some("jpg"));
}

#[tokio::test]
async fn test_overlay_at_half_percent_starts_at_centre() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(200, 120)).await;

    let processed = saver
        .process(
            &target,
            ProcessRequest::new()
                .overlay(red_box("Hello"))
                .overlay_position(OverlayPosition::Percent { x: 50.0, y: 50.0 }),
        )
        .await
        .unwrap();

    assert_eq!(processed, target);
    let img = image::open(processed.path().unwrap()).unwrap().to_rgba8();
    assert_eq!((img.width(), img.height()), (200, 120));

    let red = Rgba([255, 0, 0, 255]);
    let is_red = |x: u32, y: u32| *img.get_pixel(x, y) == red;

    // Top-left of the overlay box is within 1px of (100, 60)
    let top_left = (99..=101)
        .flat_map(|x| (59..=61).map(move |y| (x, y)))
        .find(|&(x, y)| is_red(x, y) && !is_red(x - 1, y) && !is_red(x, y - 1));
    assert!(top_left.is_some(), "overlay corner not found near centre");
    assert!(!is_red(98, 58));
}

#[tokio::test]
async fn test_overlays_paint_in_list_order() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(120, 80)).await;

    let blue_box = TextOverlay::new("Hello").with_style(TextStyle {
        color: "#0000FF".into(),
        background: Some("#0000FF".into()),
        ..Default::default()
    });

    saver
        .process(
            &target,
            ProcessRequest::new()
                .overlays([red_box("Hello"), blue_box])
                .overlay_position(Gravity::NorthWest),
        )
        .await
        .unwrap();

    let img = image::open(target.path().unwrap()).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn test_transform_then_overlay_on_renamed_file() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.jpg", jpeg(60, 30)).await;

    let processed = saver
        .process(
            &target,
            ProcessRequest::new()
                .transform(TransformChain::new().format(ImageFormat::Png))
                .overlay(red_box("X").at(Gravity::SouthEast)),
        )
        .await
        .unwrap();

    assert_eq!(processed.file_name(), Some("img.png"));
    let img = image::open(processed.path().unwrap()).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(59, 29), Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn test_overlay_percent_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(20, 20)).await;
    let before = std::fs::read(target.path().unwrap()).unwrap();

    let err = saver
        .process(
            &target,
            ProcessRequest::new().overlay(
                TextOverlay::new("x").at(OverlayPosition::Percent { x: 101.0, y: 0.0 }),
            ),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ImageProcessing);
    assert_eq!(std::fs::read(target.path().unwrap()).unwrap(), before);
}

#[tokio::test]
async fn test_empty_request_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(4, 4)).await;

    let err = saver.process(&target, ProcessRequest::new()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequiredArgumentMissing);
}

#[tokio::test]
async fn test_overlays_from_json() {
    let json = r##"[
        {"text": "© 2024", "style": {"font_size": 12, "color": "#FFF"}, "position": "southwest"},
        {"text": "draft", "position": {"x": 5, "y": 5}}
    ]"##;
    let overlays: Vec<TextOverlay> = serde_json::from_str(json).unwrap();

    assert_eq!(
        overlays[0].position,
        Some(OverlayPosition::Anchor(Gravity::SouthWest))
    );
    assert_eq!(
        overlays[1].position,
        Some(OverlayPosition::Percent { x: 5.0, y: 5.0 })
    );

    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(80, 40)).await;
    saver
        .process(&target, ProcessRequest::new().overlays(overlays))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unrecognized_transform_output_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.jpg", jpeg(10, 10)).await;
    let before = std::fs::read(target.path().unwrap()).unwrap();

    let bitmap = |_: &[u8]| -> Result<Vec<u8>, ImageError> {
        let mut out = b"BM".to_vec();
        out.resize(62, 0);
        Ok(out)
    };
    let err = saver
        .process(&target, ProcessRequest::new().transform(bitmap))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ImageProcessing);
    assert_eq!(std::fs::read(target.path().unwrap()).unwrap(), before);
}

#[tokio::test]
async fn test_oversized_font_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (saver, target) = upload(dir.path(), "a.png", png(8, 8)).await;

    let overlay = TextOverlay::new("X").with_style(TextStyle {
        font_size: 1.0e9,
        ..Default::default()
    });
    let err = saver
        .process(&target, ProcessRequest::new().overlay(overlay))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ImageProcessing);
}
