/// Provides the PackURI value type used to name parts within a package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path
/// separators. Media parts live next to the drawing parts that reference them
/// (`/xl/media/image1.png` vs `/xl/drawings/drawing1.xml`), so most of the
/// work here is translating between absolute partnames and the relative
/// references stored in relationship targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/xl/media/image1.png")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// Returns an error if the URI doesn't start with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// Translates a relative reference (like "../media/image1.png") onto a base
    /// URI (like "/xl/drawings") to produce an absolute PackURI
    /// ("/xl/media/image1.png").
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(Self::normalize_path(relative_ref));
        }
        let joined = Self::join_paths(base_uri, relative_ref);
        Self::new(Self::normalize_path(&joined))
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/xl/drawings" for "/xl/drawings/drawing1.xml".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the extension portion of this PackURI, without the leading period.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Get the relative reference from a base URI to this PackURI.
    ///
    /// PackURI("/xl/media/image1.png") yields "../media/image1.png" for base
    /// "/xl/drawings".
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.uri[1..].to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        // The filename never matches a directory segment
        let common = from_parts
            .iter()
            .zip(to_parts.iter().take(to_parts.len().saturating_sub(1)))
            .take_while(|(a, b)| a == b)
            .count();

        let mut result = String::new();
        for _ in common..from_parts.len() {
            result.push_str("../");
        }
        result.push_str(&to_parts[common..].join("/"));
        result
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    fn join_paths(base: &str, rel: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, rel)
        } else {
            format!("{}/{}", base, rel)
        }
    }

    /// Resolve "." and ".." segments.
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        format!("/{}", parts.join("/"))
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/xl/drawings/drawing1.xml").is_ok());
        assert!(PackURI::new("xl/drawings/drawing1.xml").is_err());
    }

    #[test]
    fn test_base_uri_and_filename() {
        let uri = PackURI::new("/xl/media/image1.png").unwrap();
        assert_eq!(uri.base_uri(), "/xl/media");
        assert_eq!(uri.filename(), "image1.png");
        assert_eq!(uri.ext(), "png");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/xl/drawings", "../media/image1.png").unwrap();
        assert_eq!(uri.as_str(), "/xl/media/image1.png");

        let uri = PackURI::from_rel_ref("/xl/drawings", "/xl/media/image2.gif").unwrap();
        assert_eq!(uri.as_str(), "/xl/media/image2.gif");

        let uri = PackURI::from_rel_ref("/", "xl/workbook.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/workbook.xml");
    }

    #[test]
    fn test_relative_ref() {
        let uri = PackURI::new("/xl/media/image1.png").unwrap();
        assert_eq!(uri.relative_ref("/xl/drawings"), "../media/image1.png");
        assert_eq!(uri.relative_ref("/xl/media"), "image1.png");
        assert_eq!(uri.relative_ref("/"), "xl/media/image1.png");
    }

    #[test]
    fn test_relative_ref_resolves_back() {
        let uri = PackURI::new("/xl/media/photo.jpeg").unwrap();
        let rel = uri.relative_ref("/xl/drawings");
        assert_eq!(PackURI::from_rel_ref("/xl/drawings", &rel).unwrap(), uri);
    }
}
