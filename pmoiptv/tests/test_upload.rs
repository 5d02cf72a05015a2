use pmoiptv::{Catalog, PlaylistParser, SourceError, UploadBuffer};

#[test]
fn test_chunked_upload_then_load() {
    let body = "#EXTM3U\r\n#EXTINF:-1 group-title=\"Kids\",Cartoons\r\nhttp://s/cartoons\r\n";

    let mut upload = UploadBuffer::begin("my_list.M3U8", 1024).unwrap();
    for chunk in body.as_bytes().chunks(7) {
        upload.push_chunk(chunk).unwrap();
    }
    assert_eq!(upload.filename(), "my_list.M3U8");

    let catalog = Catalog::default();
    catalog
        .load(&PlaylistParser::default(), &upload.finish())
        .unwrap();

    let channel = catalog.at(0).unwrap();
    assert_eq!(channel.name(), "Cartoons");
    assert_eq!(channel.group(), "Kids");
}

#[test]
fn test_oversized_upload_never_reaches_catalog() {
    let catalog = Catalog::default();
    catalog
        .load(
            &PlaylistParser::default(),
            "#EXTM3U\n#EXTINF:-1,Existing\nhttp://s/existing\n",
        )
        .unwrap();

    let mut upload = UploadBuffer::begin("big.m3u", 16).unwrap();
    let result = upload.push_chunk(b"#EXTM3U\n#EXTINF:-1,New\nhttp://s/new\n");
    assert!(matches!(result, Err(SourceError::SizeLimitExceeded { .. })));

    assert_eq!(catalog.count(), 1);
    assert_eq!(catalog.at(0).unwrap().name(), "Existing");
}

#[test]
fn test_invalid_extension() {
    let err = UploadBuffer::begin("playlist.txt", 1024).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid playlist extension: playlist.txt (expected .m3u or .m3u8)"
    );
}
