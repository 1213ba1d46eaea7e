// Image module - on-demand image delivery
//
// Provides:
// - content-negotiated transcoding and bounding-box resizing
// - the OriginalBytesSource collaborator over the entity store
// - the cache-aside delivery pipeline tying both together

pub mod error;
pub mod pipeline;
pub mod source;
pub mod transformer;

pub use error::ImageError;
pub use pipeline::ImagePipeline;
pub use source::{DbOriginalBytesSource, OriginalBytesSource};
pub use transformer::{ImageFormat, ImageTransformer};
