pub mod aggregate;
pub mod catalog;

use serde::Serialize;

/// Origin metadata carried by every file in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSrc {
    pub component: String,
    pub version: String,
    pub display_version: String,
    pub module: Option<String>,
    pub family: String,
    pub relative: String,
    pub basename: String,
    pub extname: String,
    pub stem: String,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VirtualFile {
    /// Path relative to the component version root, always `/`-separated.
    pub path: String,
    pub contents: Vec<u8>,
    pub src: FileSrc,
}

impl VirtualFile {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}

/// One aggregated documentation version (a component at one version).
#[derive(Debug, Clone)]
pub struct ContentSource {
    pub name: String,
    pub version: String,
    pub display_version: Option<String>,
    pub files: Vec<VirtualFile>,
}

impl ContentSource {
    pub fn display_version(&self) -> &str {
        self.display_version.as_deref().unwrap_or(&self.version)
    }
}

/// Split a `/`-separated path into (basename, extname, stem) the way posix
/// `path.basename` / `path.extname` do.
pub fn path_parts(path: &str) -> (String, String, String) {
    let basename = path.rsplit('/').next().unwrap_or(path).to_string();
    let (stem, extname) = match basename.rfind('.') {
        Some(i) if i > 0 => (basename[..i].to_string(), basename[i..].to_string()),
        _ => (basename.clone(), String::new()),
    };
    (basename, extname, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_basename_extension_and_stem() {
        let (base, ext, stem) = path_parts("modules/api/attachment/core-api-schema-graphql.html");
        assert_eq!(base, "core-api-schema-graphql.html");
        assert_eq!(ext, ".html");
        assert_eq!(stem, "core-api-schema-graphql");
    }

    #[test]
    fn dotfiles_have_no_extension() {
        let (base, ext, stem) = path_parts(".nojekyll");
        assert_eq!(base, ".nojekyll");
        assert_eq!(ext, "");
        assert_eq!(stem, ".nojekyll");
    }

    #[test]
    fn display_version_falls_back_to_version() {
        let source = ContentSource {
            name: "core".into(),
            version: "1.0".into(),
            display_version: None,
            files: Vec::new(),
        };
        assert_eq!(source.display_version(), "1.0");
    }
}
