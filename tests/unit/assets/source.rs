use super::*;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./a//b.png").unwrap(), "a/b.png");
    assert!(normalize_rel_path("../x.png").is_err());
    assert!(normalize_rel_path("/abs.png").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[tokio::test]
async fn fs_source_reads_relative_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("slap")).unwrap();
    std::fs::write(dir.path().join("slap/bg.png"), b"bytes").unwrap();

    let src = FsSource::new(dir.path());
    assert_eq!(src.fetch("slap/bg.png").await.unwrap(), b"bytes");
}

#[tokio::test]
async fn fs_source_missing_file_is_asset_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = FsSource::new(dir.path());
    let err = src.fetch("missing.png").await.unwrap_err();
    assert!(matches!(err, BotError::AssetLoad(_)), "{err}");
}

#[tokio::test]
async fn sources_dispatch_on_ref_variant() {
    struct Fixed(&'static [u8]);

    #[async_trait]
    impl ByteSource for Fixed {
        async fn fetch(&self, _location: &str) -> BotResult<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    let sources = AssetSources::new(Arc::new(Fixed(b"local")), Arc::new(Fixed(b"remote")));
    assert_eq!(
        sources.fetch(&AssetRef::local("x.png")).await.unwrap(),
        b"local"
    );
    assert_eq!(
        sources
            .fetch(&AssetRef::remote("https://cdn.example/x.png"))
            .await
            .unwrap(),
        b"remote"
    );
}

#[tokio::test]
async fn memory_source_serves_registered_bytes_only() {
    let src = MemorySource::new().with("avatars/alice.png", vec![1, 2, 3]);
    assert_eq!(src.fetch("avatars/alice.png").await.unwrap(), vec![1, 2, 3]);
    let err = src.fetch("avatars/bob.png").await.unwrap_err();
    assert!(matches!(err, BotError::AssetLoad(_)));
}
