//! Settings for pictures written into drawing parts.

use serde::{Deserialize, Serialize};

use crate::ooxml::drawings::error::{PictureError, Result};

/// Drawing-wide settings.
///
/// All fields have defaults, so a partial document deserializes:
///
/// ```
/// use ooxml_pictures::ooxml::drawings::DrawingConfig;
///
/// let config = DrawingConfig::default().with_media_folder("/word/media");
/// assert_eq!(config.media_folder, "/word/media");
/// assert_eq!(config.normalize_quality, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawingConfig {
    /// Folder that receives new media parts.
    pub media_folder: String,
    /// Name of new media parts, `%d` replaced by a sequence number.
    pub media_name_template: String,
    /// JPEG quality used to derive the dedup hash of pictures read back from
    /// a document.
    pub normalize_quality: u8,
    /// Quality passed to lossy encoders when storing an image.
    pub storage_quality: u8,
    /// Prefix of generated shape names; the shape id is appended.
    pub shape_name_prefix: String,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            media_folder: "/xl/media".to_string(),
            media_name_template: "image%d".to_string(),
            normalize_quality: 100,
            storage_quality: 100,
            shape_name_prefix: "Picture".to_string(),
        }
    }
}

impl DrawingConfig {
    pub fn with_media_folder(mut self, folder: impl Into<String>) -> Self {
        self.media_folder = folder.into();
        self
    }

    pub fn with_media_name_template(mut self, template: impl Into<String>) -> Self {
        self.media_name_template = template.into();
        self
    }

    pub fn with_normalize_quality(mut self, quality: u8) -> Self {
        self.normalize_quality = quality;
        self
    }

    pub fn with_storage_quality(mut self, quality: u8) -> Self {
        self.storage_quality = quality;
        self
    }

    pub fn with_shape_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shape_name_prefix = prefix.into();
        self
    }

    /// Check the settings before they are used.
    pub fn validate(&self) -> Result<()> {
        if !self.media_folder.starts_with('/') {
            return Err(PictureError::InvalidArgument(format!(
                "media folder must be an absolute pack URI: '{}'",
                self.media_folder
            )));
        }
        if !self.media_name_template.contains("%d") {
            return Err(PictureError::InvalidArgument(format!(
                "media name template has no %d placeholder: '{}'",
                self.media_name_template
            )));
        }
        for (name, quality) in [
            ("normalize_quality", self.normalize_quality),
            ("storage_quality", self.storage_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(PictureError::InvalidArgument(format!(
                    "{} must be within 1..=100, got {}",
                    name, quality
                )));
            }
        }
        Ok(())
    }

    /// Partname template for a new media part with the given extension.
    pub(crate) fn media_partname_template(&self, extension: &str) -> String {
        format!(
            "{}/{}.{}",
            self.media_folder.trim_end_matches('/'),
            self.media_name_template,
            extension
        )
    }

    /// Default name for the shape with `id`.
    pub(crate) fn shape_name(&self, id: u32) -> String {
        format!("{} {}", self.shape_name_prefix, id)
    }
}
