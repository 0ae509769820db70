//! Loading saver configuration from YAML.

use image_saver::{Acquirable, ErrorCode, ImageSaver, SaverConfig};
use std::time::Duration;

#[test]
fn test_yaml_file_with_env_substitution() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("IMAGE_SAVER_IT_TARGET", dir.path().join("media"));

    let path = dir.path().join("saver.yaml");
    std::fs::write(
        &path,
        "target_dir: ${IMAGE_SAVER_IT_TARGET}\nvalid_extensions: [png, webp]\ntimeout_secs: 3\nquality: 85\n",
    )
    .unwrap();

    let config = SaverConfig::from_file(&path).unwrap();
    assert_eq!(config.target_dir, dir.path().join("media"));
    assert_eq!(config.timeout(), Duration::from_secs(3));
    assert_eq!(config.quality, 85);

    let saver = ImageSaver::new(config).unwrap();
    assert_eq!(
        saver.policy().extensions(),
        &["png".to_string(), "webp".to_string()]
    );
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let err = SaverConfig::from_yaml_with_env("target_dir: [unclosed").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
}

#[test]
fn test_zero_timeout_rejected() {
    let err = ImageSaver::new(SaverConfig::new("/tmp/x").with_timeout(Duration::ZERO)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
}

#[tokio::test]
async fn test_empty_target_dir_rejected() {
    let err = ImageSaver::new(SaverConfig::new("")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequiredArgumentMissing);
    assert_eq!(err.to_json()["error"]["code"], "REQUIRED_ARGUMENT_MISSING");
}

#[tokio::test]
async fn test_saver_is_shareable_across_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let saver = std::sync::Arc::new(ImageSaver::new(SaverConfig::new(dir.path())).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let saver = saver.clone();
            tokio::spawn(async move {
                saver
                    .download(format!("http://example.invalid/{}.gif", i).into(), None)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.code(), ErrorCode::FormatUnsupported);
    }
}
