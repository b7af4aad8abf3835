//! Integration tests: documents resolving backgrounds through the real
//! fetcher and decoder.

use emojiart_core::{Background, EmojiArt, EmojiArtDocument, FetchStatus, ResolveError, UndoStack};
use emojiart_fetch::{resolver, FetchConfig, RasterDecoder};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 128, 255, 255]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn document() -> EmojiArtDocument {
    EmojiArtDocument::new(resolver(FetchConfig::default(), RasterDecoder::new()).unwrap())
}

#[tokio::test]
async fn test_file_background_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("beach.png");
    std::fs::write(&file, png_bytes(4, 3)).unwrap();

    let mut doc = document();
    let mut undo = UndoStack::new();
    let url = Url::from_file_path(&file).unwrap();
    doc.set_background(Background::Url(url.clone()), Some(&mut undo));
    assert_eq!(doc.fetch_status(), &FetchStatus::Fetching(url));

    doc.wait_for_background().await;
    assert_eq!(doc.fetch_status(), &FetchStatus::Idle);
    let image = doc.background_image().expect("background resolved");
    assert_eq!((image.width(), image.height()), (4, 3));
    assert_eq!(undo.undo_label(), Some("Set Background"));
}

#[tokio::test]
async fn test_data_url_background_resolves() {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(2, 2));
    let url = Url::parse(&format!("data:image/png;base64,{encoded}")).unwrap();

    let mut doc = document();
    doc.set_background(Background::Url(url), None);
    doc.wait_for_background().await;

    let image = doc.background_image().expect("background resolved");
    assert_eq!(image.pixels().len(), 2 * 2 * 4);
}

#[tokio::test]
async fn test_embedded_background_decodes_synchronously() {
    let mut doc = document();
    doc.set_background(Background::ImageData(png_bytes(5, 1)), None);

    assert_eq!(doc.fetch_status(), &FetchStatus::Idle);
    let image = doc.background_image().expect("decoded immediately");
    assert_eq!((image.width(), image.height()), (5, 1));
}

#[tokio::test]
async fn test_loaded_document_resolves_its_background() {
    let mut art = EmojiArt::new();
    art.set_background(Background::ImageData(png_bytes(1, 1)));
    art.add_emoji("🐶", (0, 0), 40);
    let bytes = art.to_bytes().unwrap();

    let loaded = EmojiArt::from_bytes(&bytes).unwrap();
    let doc = EmojiArtDocument::with_art(
        loaded,
        resolver(FetchConfig::default(), RasterDecoder::new()).unwrap(),
    );
    assert!(doc.background_image().is_some());
    assert_eq!(doc.emojis().len(), 1);
}

#[tokio::test]
async fn test_missing_file_fails_then_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let missing = Url::from_file_path(dir.path().join("gone.png")).unwrap();

    let mut doc = document();
    doc.set_background(Background::Url(missing.clone()), None);
    doc.wait_for_background().await;

    assert_eq!(doc.fetch_status(), &FetchStatus::Failed(missing));
    assert!(matches!(
        doc.background_error(),
        Some(ResolveError::Fetch { .. })
    ));
    assert!(doc.background_image().is_none());

    let file = dir.path().join("here.png");
    std::fs::write(&file, png_bytes(1, 1)).unwrap();
    doc.set_background(Background::Url(Url::from_file_path(&file).unwrap()), None);
    doc.wait_for_background().await;

    assert_eq!(doc.fetch_status(), &FetchStatus::Idle);
    assert!(doc.background_error().is_none());
    assert!(doc.background_image().is_some());
}

#[tokio::test]
async fn test_non_image_file_is_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "just text").unwrap();
    let url = Url::from_file_path(&file).unwrap();

    let mut doc = document();
    doc.set_background(Background::Url(url.clone()), None);
    doc.wait_for_background().await;

    assert_eq!(doc.fetch_status(), &FetchStatus::Failed(url));
    assert!(matches!(doc.background_error(), Some(ResolveError::Decode(_))));
}

#[tokio::test]
#[cfg_attr(
    target_os = "macos",
    ignore = "wiremock requires network binding not available in sandbox"
)]
async fn test_http_background_with_undo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(3, 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/second.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(6, 2)))
        .mount(&server)
        .await;

    let first = Url::parse(&format!("{}/first.png", server.uri())).unwrap();
    let second = Url::parse(&format!("{}/second.png", server.uri())).unwrap();

    let mut doc = document();
    let mut undo = UndoStack::new();
    doc.set_background(Background::Url(first.clone()), Some(&mut undo));
    doc.wait_for_background().await;
    doc.set_background(Background::Url(second), Some(&mut undo));
    doc.wait_for_background().await;
    assert_eq!(doc.background_image().map(|i| i.width()), Some(6));

    assert_eq!(undo.undo(&mut doc).as_deref(), Some("Set Background"));
    assert_eq!(doc.background().url(), Some(&first));
    doc.wait_for_background().await;
    assert_eq!(doc.background_image().map(|i| i.width()), Some(3));
}
