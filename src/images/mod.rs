// Image handling for embedded pictures.
//
// This module covers everything a picture needs before it touches the
// package: working out what kind of image a name or content type denotes,
// decoding and re-encoding pixels, and hashing encoded bytes for
// deduplication.
//
// - `content_type`: extension / MIME / codec format tables
// - `codec`: the `ImageCodec` boundary and its `image`-crate implementation
// - `hash`: SHA-1 content hashes
pub mod codec;
pub mod content_type;
pub mod hash;

pub use codec::{CodecError, CodecFormat, ColorFormat, ImageCodec, RasterCodec, RawImage};
pub use content_type::{
    codec_format_for_content_type, content_type_for_extension, content_type_for_path,
    extension_for_content_type,
};
pub use hash::ContentHash;
