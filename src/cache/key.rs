//! Cache key construction.
//!
//! Keys are pure functions of their inputs: two semantically distinct
//! requests never share a key, and identical requests always rebuild the
//! same key regardless of call site.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::images::transformer::ImageFormat;

/// Which entity owns an image. Passed explicitly by the caller so key
/// namespaces never depend on runtime type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageOwnerKind {
    Recipe,
    Step,
    Avatar,
}

impl ImageOwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageOwnerKind::Recipe => "Recipe",
            ImageOwnerKind::Step => "Step",
            ImageOwnerKind::Avatar => "Avatar",
        }
    }
}

impl fmt::Display for ImageOwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImageOwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recipe" | "Recipe" => Ok(ImageOwnerKind::Recipe),
            "step" | "Step" => Ok(ImageOwnerKind::Step),
            "avatar" | "Avatar" => Ok(ImageOwnerKind::Avatar),
            _ => Err(format!("Invalid image owner kind: {}", s)),
        }
    }
}

/// Key for a processed (resized + re-encoded) image variant.
///
/// Absent width/height normalize to `0` so "no resize requested" maps to one
/// key. The format is the last component, keeping webp and jpeg variants of
/// the same request from ever colliding.
pub fn processed_variant_key(
    kind: ImageOwnerKind,
    id: &str,
    width: Option<u32>,
    height: Option<u32>,
    format: ImageFormat,
) -> String {
    format!(
        "ProcessedImage-{}-{}-{}-{}-{}",
        kind,
        id,
        width.unwrap_or(0),
        height.unwrap_or(0),
        format
    )
}

/// Key for the raw stored bytes of an owner's image. Cached separately from
/// processed variants since the original changes far less often than the set
/// of requested dimensions.
pub fn original_image_key(kind: ImageOwnerKind, id: &str) -> String {
    format!("OriginalImage-{}-{}", kind, id)
}

/// Key for the cached JSON representation of a full recipe. Removed by the
/// rating aggregator after every aggregate change.
pub fn recipe_key(recipe_id: &str) -> String {
    format!("Recipe-{}", recipe_id)
}
