// Image delivery pipeline - cache-aside orchestration
//
// Request flow: build key -> processed-variant cache check -> on miss fetch
// original bytes (themselves read through the cache) -> transform -> store
// processed variant -> serve.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::key::{original_image_key, processed_variant_key, ImageOwnerKind};
use crate::cache::CacheStore;

use super::error::ImageError;
use super::source::OriginalBytesSource;
use super::transformer::{ImageFormat, ImageTransformer};

/// Freshness window for processed variants.
const PROCESSED_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Freshness window for cached original bytes.
const ORIGINAL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Request-facing entry point for image delivery.
///
/// Two concurrent misses for the same key may each fetch and transform
/// independently; both writes store the same pixels, so the duplicate work
/// is wasted CPU rather than a correctness problem.
pub struct ImagePipeline {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn OriginalBytesSource>,
}

impl ImagePipeline {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn OriginalBytesSource>) -> Self {
        Self { cache, source }
    }

    /// Serves the processed variant for an owner's image, or `None` when the
    /// owner has no image.
    ///
    /// `None` is never cached, so an image uploaded after a miss is observed
    /// by the very next request.
    pub async fn handle(
        &self,
        kind: ImageOwnerKind,
        id: &str,
        width: Option<u32>,
        height: Option<u32>,
        format: ImageFormat,
    ) -> Result<Option<Vec<u8>>, ImageError> {
        let variant_key = processed_variant_key(kind, id, width, height, format);

        if let Some(cached) = self.cache.get(&variant_key).await {
            tracing::debug!("Processed variant cache hit: {}", variant_key);
            return Ok(Some(cached));
        }

        let original = match self.original_bytes(kind, id).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let processed = ImageTransformer::transform_async(original, width, height, format).await?;

        self.cache
            .set(&variant_key, processed.clone(), PROCESSED_TTL)
            .await;
        tracing::debug!(
            "Stored processed variant {} ({} bytes)",
            variant_key,
            processed.len()
        );

        Ok(Some(processed))
    }

    /// Cache-aside read of the owner's raw stored bytes.
    async fn original_bytes(
        &self,
        kind: ImageOwnerKind,
        id: &str,
    ) -> Result<Option<Vec<u8>>, ImageError> {
        let key = original_image_key(kind, id);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(Some(cached));
        }

        let Some(bytes) = self.source.fetch(kind, id).await? else {
            return Ok(None);
        };

        self.cache.set(&key, bytes.clone(), ORIGINAL_TTL).await;
        Ok(Some(bytes))
    }

    /// Drops the cached original for an owner, called when its image bytes
    /// are replaced. Already-cached resized variants live out their own TTL.
    pub async fn invalidate_original(&self, kind: ImageOwnerKind, id: &str) {
        self.cache.remove(&original_image_key(kind, id)).await;
    }
}
