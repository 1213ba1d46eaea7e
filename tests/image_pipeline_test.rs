// Image pipeline integration tests
//
// Exercise the cache-aside delivery flow end to end against an in-memory
// cache and a stub bytes source.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::GenericImageView;

use receptoria_backend::cache::{CacheStore, ImageOwnerKind, MemoryCacheStore};
use receptoria_backend::images::{ImageFormat, ImagePipeline, OriginalBytesSource};

/// Bytes source over a mutable in-memory map, standing in for the entity
/// store.
#[derive(Default)]
struct StubSource {
    images: Mutex<HashMap<(ImageOwnerKind, String), Vec<u8>>>,
}

impl StubSource {
    fn insert(&self, kind: ImageOwnerKind, id: &str, bytes: Vec<u8>) {
        self.images
            .lock()
            .unwrap()
            .insert((kind, id.to_string()), bytes);
    }
}

#[async_trait]
impl OriginalBytesSource for StubSource {
    async fn fetch(&self, kind: ImageOwnerKind, id: &str) -> Result<Option<Vec<u8>>, sqlx::Error> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .get(&(kind, id.to_string()))
            .cloned())
    }
}

/// Cache backend that is permanently unavailable: every get is a miss and
/// writes go nowhere.
struct DownCacheStore;

#[async_trait]
impl CacheStore for DownCacheStore {
    async fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }
    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) {}
    async fn remove(&self, _key: &str) {}
    async fn cleanup_expired(&self) -> u64 {
        0
    }
    async fn clear(&self) {}
    async fn len(&self) -> u64 {
        0
    }
}

fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([30, 120, 90]),
    ));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

fn pipeline_with(source: Arc<StubSource>) -> (ImagePipeline, Arc<MemoryCacheStore>) {
    let cache = Arc::new(MemoryCacheStore::new());
    (ImagePipeline::new(cache.clone(), source), cache)
}

#[tokio::test]
async fn test_second_request_is_served_byte_identical_from_cache() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(320, 240));
    let (pipeline, cache) = pipeline_with(source);

    let first = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", Some(100), None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();
    let second = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", Some(100), None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    // One original entry plus one processed variant
    assert_eq!(cache.len().await, 2);
}

#[tokio::test]
async fn test_resize_fits_bounding_box_preserving_aspect_ratio() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(800, 600));
    let (pipeline, _cache) = pipeline_with(source);

    let bytes = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", Some(400), None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.dimensions(), (400, 300));
}

#[tokio::test]
async fn test_no_dimensions_keeps_source_dimensions() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Step, "s1", test_png(640, 480));
    let (pipeline, _cache) = pipeline_with(source);

    let bytes = pipeline
        .handle(ImageOwnerKind::Step, "s1", None, None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.dimensions(), (640, 480));
}

#[tokio::test]
async fn test_formats_cached_as_separate_variants() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Avatar, "u1", test_png(128, 128));
    let (pipeline, cache) = pipeline_with(source);

    let webp = pipeline
        .handle(ImageOwnerKind::Avatar, "u1", None, None, ImageFormat::Webp)
        .await
        .unwrap()
        .unwrap();
    let jpeg = pipeline
        .handle(ImageOwnerKind::Avatar, "u1", None, None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(&webp[8..12], b"WEBP");
    assert_eq!(&jpeg[0..2], b"\xFF\xD8"); // JPEG SOI marker
    // One original entry plus two processed variants
    assert_eq!(cache.len().await, 3);
}

#[tokio::test]
async fn test_not_found_is_never_cached() {
    let source = Arc::new(StubSource::default());
    let (pipeline, cache) = pipeline_with(source.clone());

    let miss = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", None, None, ImageFormat::Jpeg)
        .await
        .unwrap();
    assert!(miss.is_none());
    assert_eq!(cache.len().await, 0);

    // Upload after the miss must be observed immediately
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(100, 100));

    let hit = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", None, None, ImageFormat::Jpeg)
        .await
        .unwrap();
    assert!(hit.is_some());
}

#[tokio::test]
async fn test_invalidate_original_forces_refetch() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(200, 100));
    let (pipeline, _cache) = pipeline_with(source.clone());

    pipeline
        .handle(ImageOwnerKind::Recipe, "r1", None, None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    // Replace the stored image and drop the cached original; a fresh
    // variant request must see the new pixels
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(300, 150));
    pipeline
        .invalidate_original(ImageOwnerKind::Recipe, "r1")
        .await;

    let bytes = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", Some(9999), None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.dimensions(), (300, 150));
}

#[tokio::test]
async fn test_unavailable_cache_backend_still_serves() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Recipe, "r1", test_png(64, 64));
    let pipeline = ImagePipeline::new(Arc::new(DownCacheStore), source);

    let bytes = pipeline
        .handle(ImageOwnerKind::Recipe, "r1", Some(32), None, ImageFormat::Jpeg)
        .await
        .unwrap()
        .unwrap();

    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!(img.dimensions(), (32, 32));
}

#[tokio::test]
async fn test_corrupt_stored_bytes_surface_as_decode_error() {
    let source = Arc::new(StubSource::default());
    source.insert(ImageOwnerKind::Step, "s1", vec![0xDE, 0xAD, 0xBE, 0xEF]);
    let (pipeline, _cache) = pipeline_with(source);

    let result = pipeline
        .handle(ImageOwnerKind::Step, "s1", None, None, ImageFormat::Webp)
        .await;

    assert!(matches!(
        result,
        Err(receptoria_backend::images::ImageError::DecodeFailed(_))
    ));
}
