//! Document construction options

use serde::{Deserialize, Serialize};

use crate::media::MediaDedup;

/// Options fixed when a document is created
///
/// Loaded from the `[document]` table of a docxkit TOML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// How repeated image payloads are stored
    pub media_dedup: MediaDedup,
    /// Edge length in pixels assumed for images whose size cannot be decoded
    pub fallback_image_px: u32,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            media_dedup: MediaDedup::None,
            fallback_image_px: 96,
        }
    }
}
