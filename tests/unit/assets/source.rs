use super::*;

#[test]
fn parses_data_uri_and_drops_fragment() {
    let uri = with_uniqueness_suffix(&to_data_uri("image/jpeg", b"abc"), 1700000000000);
    assert!(uri.ends_with("#t=1700000000000"));
    assert_eq!(
        ImageSource::parse(&uri).unwrap(),
        ImageSource::DataUri {
            media_type: Some("image/jpeg".into()),
            bytes: b"abc".to_vec(),
        }
    );
}

#[test]
fn classifies_paths_and_remote_urls() {
    assert_eq!(
        ImageSource::parse("/covers/1.jpg").unwrap(),
        ImageSource::Path("/covers/1.jpg".into())
    );
    assert_eq!(
        ImageSource::parse("HTTPS://img.example/x.png").unwrap(),
        ImageSource::Remote("HTTPS://img.example/x.png".into())
    );
    assert!(ImageSource::parse("   ").is_err());
}

#[test]
fn rejects_malformed_data_uris() {
    assert!(ImageSource::parse("data:image/png;base64").is_err());
    assert!(ImageSource::parse("data:text/plain,hello").is_err());
    assert!(matches!(
        ImageSource::parse("data:image/png;base64,@@@"),
        Err(GridError::Decode(_))
    ));
}

#[test]
fn fs_fetcher_reads_under_root_and_blocks_escapes() {
    let dir = std::env::temp_dir().join(format!("prefgrid-fetch-{}", std::process::id()));
    std::fs::create_dir_all(dir.join("covers")).unwrap();
    std::fs::write(dir.join("covers/a.bin"), b"xyz").unwrap();

    let fetcher = FsFetcher::new(&dir);
    let got = fetcher
        .fetch(&ImageSource::Path("/covers/a.bin?v=2".into()))
        .unwrap();
    assert_eq!(got, b"xyz");
    assert!(fetcher.fetch(&ImageSource::Path("/../etc/passwd".into())).is_err());
    assert!(fetcher.fetch(&ImageSource::Path("/".into())).is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn remote_urls_need_a_proxy() {
    let remote = ImageSource::Remote("https://x/y.jpg".into());
    assert!(FsFetcher::new(".").fetch(&remote).is_err());

    let proxied = FsFetcher::new(".").with_proxy(Box::new(|url| Ok(url.as_bytes().to_vec())));
    assert_eq!(proxied.fetch(&remote).unwrap(), b"https://x/y.jpg");
}
