//! Mapping between file extensions, MIME content types and codec formats.
//!
//! Both tables are part of the package contract: unknown extensions and
//! content types fall back to JPEG rather than failing, so insertion of an
//! image never fails on naming alone.

use std::path::Path;

use phf::phf_map;

use crate::images::codec::CodecFormat;
use crate::ooxml::opc::constants::content_type as ct;

/// Extension (lowercase, no leading period) to MIME content type.
static EXTENSION_CONTENT_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "bmp" => ct::BMP,
    "jpg" => ct::JPEG,
    "jpeg" => ct::JPEG,
    "gif" => ct::GIF,
    "png" => ct::PNG,
    "cgm" => ct::CGM,
    "emf" => ct::X_EMF,
    "eps" => ct::X_EPS,
    "pcx" => ct::X_PCX,
    "tga" => ct::X_TGA,
    "tif" => ct::X_TIFF,
    "tiff" => ct::X_TIFF,
    "wmf" => ct::X_WMF,
};

/// Content types the raster codec can write back out.
static CONTENT_TYPE_FORMATS: phf::Map<&'static str, CodecFormat> = phf_map! {
    "image/bmp" => CodecFormat::Bmp,
    "image/jpeg" => CodecFormat::Jpeg,
    "image/gif" => CodecFormat::Gif,
    "image/png" => CodecFormat::Png,
};

/// Canonical extension for naming new media parts.
static CONTENT_TYPE_EXTENSIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "image/bmp" => "bmp",
    "image/jpeg" => "jpeg",
    "image/gif" => "gif",
    "image/png" => "png",
    "image/cgm" => "cgm",
    "image/x-emf" => "emf",
    "image/x-eps" => "eps",
    "image/x-pcx" => "pcx",
    "image/x-tga" => "tga",
    "image/x-tiff" => "tiff",
    "image/x-wmf" => "wmf",
};

/// Content type for a file extension.
///
/// Matching is case-insensitive and tolerates a leading period; unmatched
/// extensions resolve to `image/jpeg`.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    let ext = ext.strip_prefix('.').unwrap_or(ext).to_ascii_lowercase();
    EXTENSION_CONTENT_TYPES
        .get(ext.as_str())
        .copied()
        .unwrap_or(ct::JPEG)
}

/// Content type for a file path, from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    content_type_for_extension(ext)
}

/// Codec format used when re-encoding content of the given type.
///
/// Only BMP, JPEG, GIF and PNG map to themselves. Everything else, metafiles
/// included, has no raster target and resolves to JPEG.
pub fn codec_format_for_content_type(content_type: &str) -> CodecFormat {
    explicit_codec_format(content_type).unwrap_or(CodecFormat::Jpeg)
}

/// Codec format for content types the codec writes natively, `None` otherwise.
pub(crate) fn explicit_codec_format(content_type: &str) -> Option<CodecFormat> {
    CONTENT_TYPE_FORMATS
        .get(content_type.to_ascii_lowercase().as_str())
        .copied()
}

/// Extension used when naming a media part of this content type.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    CONTENT_TYPE_EXTENSIONS
        .get(content_type.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or("jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const KNOWN: [(&str, &str); 13] = [
        ("bmp", "image/bmp"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("png", "image/png"),
        ("cgm", "image/cgm"),
        ("emf", "image/x-emf"),
        ("eps", "image/x-eps"),
        ("pcx", "image/x-pcx"),
        ("tga", "image/x-tga"),
        ("tif", "image/x-tiff"),
        ("tiff", "image/x-tiff"),
        ("wmf", "image/x-wmf"),
    ];

    #[test]
    fn test_extension_table() {
        for (ext, expected) in KNOWN {
            assert_eq!(content_type_for_extension(ext), expected, "extension {}", ext);
            assert_eq!(content_type_for_extension(&format!(".{}", ext)), expected);
        }
    }

    #[test]
    fn test_unknown_extension_defaults_to_jpeg() {
        assert_eq!(content_type_for_extension("xyz"), "image/jpeg");
        assert_eq!(content_type_for_extension(".xyz"), "image/jpeg");
        assert_eq!(content_type_for_extension(""), "image/jpeg");
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("/tmp/logo.PNG")), "image/png");
        assert_eq!(content_type_for_path(Path::new("/tmp/noext")), "image/jpeg");
    }

    #[test]
    fn test_codec_format_table() {
        assert_eq!(codec_format_for_content_type("image/bmp"), CodecFormat::Bmp);
        assert_eq!(codec_format_for_content_type("image/jpeg"), CodecFormat::Jpeg);
        assert_eq!(codec_format_for_content_type("image/gif"), CodecFormat::Gif);
        assert_eq!(codec_format_for_content_type("IMAGE/PNG"), CodecFormat::Png);
    }

    #[test]
    fn test_metafiles_reencode_as_jpeg() {
        assert_eq!(codec_format_for_content_type("image/x-emf"), CodecFormat::Jpeg);
        assert_eq!(codec_format_for_content_type("image/x-wmf"), CodecFormat::Jpeg);
        assert_eq!(codec_format_for_content_type("image/x-tiff"), CodecFormat::Jpeg);
        assert_eq!(codec_format_for_content_type("text/plain"), CodecFormat::Jpeg);
        assert_eq!(explicit_codec_format("image/x-emf"), None);
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("image/x-tiff"), "tiff");
        assert_eq!(extension_for_content_type("application/octet-stream"), "jpeg");
    }

    proptest! {
        #[test]
        fn prop_extension_lookup_ignores_case(idx in 0usize..13, mask in any::<u16>()) {
            let (ext, expected) = KNOWN[idx];
            let mixed: String = ext
                .chars()
                .enumerate()
                .map(|(i, c)| if mask & (1 << i) != 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            prop_assert_eq!(content_type_for_extension(&mixed), expected);
        }

        #[test]
        fn prop_extension_lookup_is_total(ext in "\\PC{0,12}") {
            let resolved = content_type_for_extension(&ext);
            prop_assert!(resolved.starts_with("image/"));
        }
    }
}
