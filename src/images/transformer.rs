// Image transformer - decode, bounding-box resize, re-encode
//
// Encode quality is a fixed constant per format, never per request: the
// cache key does not carry quality, so identical keys must imply identical
// encode parameters.

use std::fmt;

use image::imageops::FilterType;
use image::GenericImageView;
use serde::{Deserialize, Serialize};
use tokio::task;

use super::error::ImageError;

/// WebP encode quality when the client negotiated webp.
const WEBP_QUALITY: f32 = 80.0;

/// JPEG encode quality for every other client.
const JPEG_QUALITY: u8 = 85;

/// The closed set of response formats, chosen by content negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Webp,
    Jpeg,
}

impl ImageFormat {
    /// Clients naming `image/webp` in their Accept header get webp,
    /// everyone else gets jpeg.
    pub fn negotiate(accept_header: &str) -> Self {
        if accept_header.contains("image/webp") {
            ImageFormat::Webp
        } else {
            ImageFormat::Jpeg
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless decode/resize/encode engine.
pub struct ImageTransformer;

impl ImageTransformer {
    /// Async wrapper moving the CPU-bound transform onto the blocking pool.
    pub async fn transform_async(
        image_data: Vec<u8>,
        width: Option<u32>,
        height: Option<u32>,
        format: ImageFormat,
    ) -> Result<Vec<u8>, ImageError> {
        task::spawn_blocking(move || Self::transform(&image_data, width, height, format))
            .await
            .map_err(|e| ImageError::TaskFailed(e.to_string()))?
    }

    /// Decodes `image_data`, scales it to fit within the requested bounding
    /// box, and re-encodes it in `format`.
    ///
    /// A missing axis defaults to the image's own dimension. The image is
    /// never upscaled and never cropped; aspect ratio is preserved. With
    /// neither axis given the pixels pass through unchanged, only re-encoded.
    pub fn transform(
        image_data: &[u8],
        width: Option<u32>,
        height: Option<u32>,
        format: ImageFormat,
    ) -> Result<Vec<u8>, ImageError> {
        let img = image::load_from_memory(image_data)
            .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

        let (source_width, source_height) = img.dimensions();
        let box_width = width.unwrap_or(source_width).min(source_width);
        let box_height = height.unwrap_or(source_height).min(source_height);

        let img = if box_width < source_width || box_height < source_height {
            img.resize(box_width, box_height, FilterType::Lanczos3)
        } else {
            img
        };

        match format {
            ImageFormat::Webp => Self::encode_webp(&img),
            ImageFormat::Jpeg => Self::encode_jpeg(&img),
        }
    }

    fn encode_webp(img: &image::DynamicImage) -> Result<Vec<u8>, ImageError> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let encoder = webp::Encoder::from_rgba(&rgba, width, height);
        let webp_data = encoder.encode(WEBP_QUALITY);

        Ok(webp_data.to_vec())
    }

    fn encode_jpeg(img: &image::DynamicImage) -> Result<Vec<u8>, ImageError> {
        // JPEG has no alpha channel
        let rgb = img.to_rgb8();

        let mut buffer = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        encoder
            .encode_image(&rgb)
            .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
        drop(encoder);

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;
    use std::io::Cursor;

    /// Builds a solid-color PNG of the given dimensions.
    fn test_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 60, 20]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn decoded_dimensions(jpeg_data: &[u8]) -> (u32, u32) {
        image::load_from_memory(jpeg_data).unwrap().dimensions()
    }

    #[test]
    fn test_negotiate_prefers_webp_when_offered() {
        assert_eq!(
            ImageFormat::negotiate("image/avif,image/webp,image/*,*/*;q=0.8"),
            ImageFormat::Webp
        );
        assert_eq!(ImageFormat::negotiate("image/png, */*"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::negotiate(""), ImageFormat::Jpeg);
    }

    #[test]
    fn test_bounding_box_resize_preserves_aspect_ratio() {
        let source = test_png(800, 600);
        let out =
            ImageTransformer::transform(&source, Some(400), None, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded_dimensions(&out), (400, 300));
    }

    #[test]
    fn test_both_axes_fit_within_box() {
        let source = test_png(800, 600);
        let out =
            ImageTransformer::transform(&source, Some(400), Some(100), ImageFormat::Jpeg).unwrap();
        // 800x600 into a 400x100 box scales by height
        assert_eq!(decoded_dimensions(&out), (133, 100));
    }

    #[test]
    fn test_no_dimensions_passes_through_unresized() {
        let source = test_png(320, 240);
        let out = ImageTransformer::transform(&source, None, None, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded_dimensions(&out), (320, 240));
    }

    #[test]
    fn test_never_upscales_beyond_source() {
        let source = test_png(100, 80);
        let out =
            ImageTransformer::transform(&source, Some(400), Some(400), ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded_dimensions(&out), (100, 80));
    }

    #[test]
    fn test_webp_output_carries_webp_magic() {
        let source = test_png(64, 64);
        let out = ImageTransformer::transform(&source, None, None, ImageFormat::Webp).unwrap();
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
    }

    #[test]
    fn test_invalid_bytes_fail_with_decode_error() {
        let result = ImageTransformer::transform(&[0x00, 0x01, 0x02], None, None, ImageFormat::Jpeg);
        assert!(matches!(result, Err(ImageError::DecodeFailed(_))));
    }

    #[test]
    fn test_corrupted_png_fails_with_decode_error() {
        // Valid PNG signature, truncated body
        let corrupted = vec![
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x00,
        ];
        let result = ImageTransformer::transform(&corrupted, None, None, ImageFormat::Webp);
        assert!(matches!(result, Err(ImageError::DecodeFailed(_))));
    }

    #[tokio::test]
    async fn test_transform_async_matches_sync_output() {
        let source = test_png(64, 48);
        let sync_out =
            ImageTransformer::transform(&source, Some(32), None, ImageFormat::Jpeg).unwrap();
        let async_out =
            ImageTransformer::transform_async(source, Some(32), None, ImageFormat::Jpeg)
                .await
                .unwrap();
        assert_eq!(sync_out, async_out);
    }
}
