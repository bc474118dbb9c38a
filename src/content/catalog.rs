use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::{path_parts, ContentSource, VirtualFile};
use crate::registry::PageKey;

static FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^modules/([^/]+)/([^/]+)/(.+)$").unwrap());
static NAV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^modules/([^/]+)/(nav\.adoc)$").unwrap());

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate file {path} in {component}@{version}")]
    Duplicate {
        component: String,
        version: String,
        path: String,
    },
}

/// Classified files of every component version, in insertion order.
#[derive(Debug, Default)]
pub struct ContentCatalog {
    files: Vec<VirtualFile>,
}

impl ContentCatalog {
    /// Classify the aggregated sources into families, dropping anything that
    /// does not live in a recognized module directory.
    pub fn from_aggregate(aggregate: Vec<ContentSource>) -> Self {
        let mut catalog = ContentCatalog::default();
        for source in aggregate {
            for mut file in source.files {
                let Some((module, family, relative)) = classify(&file.path) else {
                    debug!(path = %file.path, "unclassified file skipped");
                    continue;
                };
                let (basename, extname, stem) = path_parts(&relative);
                file.src.module = Some(module);
                file.src.family = family.to_string();
                file.src.relative = relative;
                file.src.media_type = mime_guess::from_path(&basename)
                    .first()
                    .map(|m| m.essence_str().to_string());
                file.src.basename = basename;
                file.src.extname = extname;
                file.src.stem = stem;
                catalog.files.push(file);
            }
        }
        catalog
    }

    pub fn files(&self) -> &[VirtualFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn keys(&self) -> Vec<PageKey> {
        self.files.iter().map(PageKey::of).collect()
    }

    pub fn get(&self, key: &PageKey) -> Option<&VirtualFile> {
        self.files.iter().find(|f| key.matches(f))
    }

    pub fn get_mut(&mut self, key: &PageKey) -> Option<&mut VirtualFile> {
        self.files.iter_mut().find(|f| key.matches(f))
    }

    pub fn add_file(&mut self, file: VirtualFile) -> Result<(), CatalogError> {
        if self.get(&PageKey::of(&file)).is_some() {
            return Err(CatalogError::Duplicate {
                component: file.src.component,
                version: file.src.version,
                path: file.path,
            });
        }
        self.files.push(file);
        Ok(())
    }

    /// Write every file to `<out>/<component>/<version>/<path>`.
    pub fn write_to(&self, out: &Path) -> Result<usize> {
        for file in self.files() {
            let mut target = out.join(&file.src.component);
            if !file.src.version.is_empty() {
                target.push(&file.src.version);
            }
            for part in file.path.split('/') {
                target.push(part);
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&target, &file.contents)
                .with_context(|| format!("Failed to write {}", target.display()))?;
        }
        Ok(self.len())
    }
}

fn classify(path: &str) -> Option<(String, &'static str, String)> {
    if let Some(caps) = NAV_RE.captures(path) {
        return Some((caps[1].to_string(), "nav", caps[2].to_string()));
    }
    let caps = FAMILY_RE.captures(path)?;
    let family = match &caps[2] {
        "pages" => "page",
        "partials" => "partial",
        "examples" => "example",
        "images" => "image",
        "attachments" => "attachment",
        _ => return None,
    };
    Some((caps[1].to_string(), family, caps[3].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FileSrc;

    fn file(path: &str, body: &str) -> VirtualFile {
        VirtualFile {
            path: path.to_string(),
            contents: body.as_bytes().to_vec(),
            src: FileSrc {
                component: "core".into(),
                version: "1.0".into(),
                display_version: "1.0".into(),
                ..Default::default()
            },
        }
    }

    fn catalog(files: Vec<VirtualFile>) -> ContentCatalog {
        ContentCatalog::from_aggregate(vec![ContentSource {
            name: "core".into(),
            version: "1.0".into(),
            display_version: None,
            files,
        }])
    }

    #[test]
    fn classifies_module_families() {
        let c = catalog(vec![
            file("modules/api/pages/reference.adoc", "= Ref"),
            file("modules/api/attachments/schema-config.yml", "x: 1"),
            file("modules/ROOT/nav.adoc", "* xref:index.adoc[]"),
            file("modules/api/assets/unknown.txt", "?"),
        ]);
        let families: Vec<(&str, &str)> = c
            .files()
            .iter()
            .map(|f| (f.path.as_str(), f.src.family.as_str()))
            .collect();
        assert_eq!(
            families,
            vec![
                ("modules/api/pages/reference.adoc", "page"),
                ("modules/api/attachments/schema-config.yml", "attachment"),
                ("modules/ROOT/nav.adoc", "nav"),
            ]
        );
        let page = &c.files()[0];
        assert_eq!(page.src.module.as_deref(), Some("api"));
        assert_eq!(page.src.relative, "reference.adoc");
        assert_eq!(page.src.stem, "reference");
    }

    #[test]
    fn rejects_duplicate_keys() {
        let mut c = catalog(vec![file("modules/api/pages/reference.adoc", "= Ref")]);
        let err = c
            .add_file(file("modules/api/pages/reference.adoc", "again"))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate file modules/api/pages/reference.adoc"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn writes_files_under_component_and_version() {
        let c = catalog(vec![file("modules/api/pages/reference.adoc", "= Ref")]);
        let out = tempfile::tempdir().unwrap();
        assert_eq!(c.write_to(out.path()).unwrap(), 1);
        let written = std::fs::read_to_string(
            out.path().join("core/1.0/modules/api/pages/reference.adoc"),
        )
        .unwrap();
        assert_eq!(written, "= Ref");
    }
}
