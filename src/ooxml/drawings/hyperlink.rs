//! Click-through hyperlinks attached to pictures.

/// Where a picture's click-through hyperlink points.
///
/// The variant is decided once, when the link is supplied or read back from
/// a drawing part, and drives how `a:hlinkClick` is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyperlinkTarget {
    /// A document hyperlink. Always written with a `tooltip` attribute; the
    /// address may be absolute or relative to the package.
    Internal {
        address: String,
        relative: bool,
        tooltip: String,
    },
    /// A plain URI. Written without a tooltip.
    External { uri: String },
}

impl HyperlinkTarget {
    /// Plain URI link.
    pub fn external(uri: impl Into<String>) -> Self {
        HyperlinkTarget::External { uri: uri.into() }
    }

    /// Document hyperlink with a tooltip. Relative-ness follows the address.
    pub fn with_tooltip(address: impl Into<String>, tooltip: impl Into<String>) -> Self {
        let address = address.into();
        HyperlinkTarget::Internal {
            relative: !is_absolute_uri(&address),
            address,
            tooltip: tooltip.into(),
        }
    }

    /// The link target as written into the relationship.
    pub fn address(&self) -> &str {
        match self {
            HyperlinkTarget::Internal { address, .. } => address,
            HyperlinkTarget::External { uri } => uri,
        }
    }

    pub fn tooltip(&self) -> Option<&str> {
        match self {
            HyperlinkTarget::Internal { tooltip, .. } => Some(tooltip),
            HyperlinkTarget::External { .. } => None,
        }
    }

    pub fn is_relative(&self) -> bool {
        match self {
            HyperlinkTarget::Internal { relative, .. } => *relative,
            HyperlinkTarget::External { uri } => !is_absolute_uri(uri),
        }
    }
}

/// RFC 3986 absolute URI test: a scheme followed by `:`.
pub fn is_absolute_uri(uri: &str) -> bool {
    let Some(colon) = uri.find(':') else {
        return false;
    };
    let scheme = &uri[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
