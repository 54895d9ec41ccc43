use crate::ooxml::drawings::error::{PictureError, Result};
use crate::ooxml::opc::constants::namespace;
use quick_xml::events::BytesStart;
use std::fmt;
use std::fmt::Write as _;

/// Write `<a:blip>` with its embed reference, declaring the `r:` prefix inline.
pub fn write_a_blip_embed(xml: &mut String, rid: &str) -> fmt::Result {
    write!(
        xml,
        r#"<a:blip xmlns:r="{}" r:embed="{}" cstate="print"/>"#,
        namespace::OFC_RELATIONSHIPS,
        rid
    )
}

pub fn write_a_stretch_fill_rect(xml: &mut String) {
    xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
}

/// Read the `r:embed` attribute of a `<a:blip>` element.
pub fn read_blip_embed_attr(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() != b"embed" {
            continue;
        }

        let rid =
            std::str::from_utf8(&attr.value).map_err(|e| PictureError::Xml(e.to_string()))?;
        return Ok(Some(rid.to_string()));
    }

    Ok(None)
}
