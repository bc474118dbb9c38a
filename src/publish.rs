use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::content::catalog::ContentCatalog;
use crate::content::{path_parts, FileSrc, VirtualFile};
use crate::descriptor::PageDescriptor;
use crate::registry::PageKey;

pub const ATTACHMENT_FAMILY: &str = "attachment";

/// Catalog entry for an augmented fragment.
pub fn fragment_file(descriptor: &PageDescriptor, fragment: String) -> VirtualFile {
    let target = descriptor.qualified_target();
    let (basename, extname, stem) = path_parts(&target);
    VirtualFile {
        path: descriptor.attachment_path(),
        contents: fragment.into_bytes(),
        src: FileSrc {
            component: descriptor.component.clone(),
            version: descriptor.version.clone(),
            display_version: descriptor.display_version.clone(),
            module: Some(descriptor.module.clone()),
            family: ATTACHMENT_FAMILY.to_string(),
            relative: target,
            media_type: mime_guess::from_path(&basename)
                .first()
                .map(|m| m.essence_str().to_string()),
            basename,
            extname,
            stem,
        },
    }
}

/// Point the page's attachment include at the published fragment. Works on
/// raw bytes so nothing outside the first config file name changes.
pub fn rewrite_reference(content: &[u8], descriptor: &PageDescriptor) -> Vec<u8> {
    let needle = descriptor.config_file.as_bytes();
    if needle.is_empty() {
        return content.to_vec();
    }
    let Some(at) = content.windows(needle.len()).position(|w| w == needle) else {
        return content.to_vec();
    };
    let mut out = Vec::with_capacity(content.len() + 32);
    out.extend_from_slice(&content[..at]);
    out.extend_from_slice(descriptor.qualified_target().as_bytes());
    out.extend_from_slice(&content[at + needle.len()..]);
    out
}

/// Register the fragment, drop the generator's intermediate file, and rewrite
/// the originating page. Returns the new artifact's catalog path.
pub async fn publish(
    catalog: &mut ContentCatalog,
    page: &PageKey,
    descriptor: &PageDescriptor,
    fragment: String,
    intermediate: &Path,
) -> Result<String> {
    let file = fragment_file(descriptor, fragment);
    let path = file.path.clone();
    catalog
        .add_file(file)
        .with_context(|| format!("Failed to register {}", path))?;

    tokio::fs::remove_file(intermediate)
        .await
        .with_context(|| format!("Failed to remove {}", intermediate.display()))?;

    let source = catalog
        .get_mut(page)
        .with_context(|| format!("Page {} vanished from the catalog", page))?;
    source.contents = rewrite_reference(&source.contents, descriptor);

    info!("Published {} for {}", path, page);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentSource;

    const PAGE: &str = "= API Reference\n:page-layout: spectaql-ui\n\ninclude::attachment$schema-config.yml[]\n\nSee the schema above.\n";
    const PAGE_PATH: &str = "modules/api/pages/reference.adoc";

    fn descriptor() -> PageDescriptor {
        crate::descriptor::extract("core", "1.0", "1.0", PAGE_PATH, PAGE).unwrap()
    }

    fn catalog() -> ContentCatalog {
        ContentCatalog::from_aggregate(vec![ContentSource {
            name: "core".into(),
            version: "1.0".into(),
            display_version: None,
            files: vec![VirtualFile {
                path: PAGE_PATH.into(),
                contents: PAGE.as_bytes().to_vec(),
                src: FileSrc {
                    component: "core".into(),
                    version: "1.0".into(),
                    display_version: "1.0".into(),
                    ..Default::default()
                },
            }],
        }])
    }

    #[test]
    fn fragment_file_carries_attachment_identity() {
        let file = fragment_file(&descriptor(), "<h1>x</h1>".into());
        assert_eq!(file.path, "modules/api/attachment/core-api-schema-graphql.html");
        assert_eq!(file.src.family, "attachment");
        assert_eq!(file.src.module.as_deref(), Some("api"));
        assert_eq!(file.src.relative, "core-api-schema-graphql.html");
        assert_eq!(file.src.basename, "core-api-schema-graphql.html");
        assert_eq!(file.src.extname, ".html");
        assert_eq!(file.src.stem, "core-api-schema-graphql");
        assert_eq!(file.src.media_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn rewrite_touches_only_the_config_name() {
        let out = rewrite_reference(PAGE.as_bytes(), &descriptor());
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("include::attachment$core-api-schema-graphql.html[]"));
        assert!(!out.contains("schema-config.yml"));
        assert_eq!(
            out.replace("core-api-schema-graphql.html", "schema-config.yml"),
            PAGE
        );
    }

    #[test]
    fn rewrite_preserves_bytes_that_are_not_utf8() {
        let mut page = PAGE.as_bytes().to_vec();
        page.extend_from_slice(b"\xff\xfe legacy\n");
        let out = rewrite_reference(&page, &descriptor());
        assert!(out.ends_with(b"\xff\xfe legacy\n"));
        let expected_len = page.len() - "schema-config.yml".len() + "core-api-schema-graphql.html".len();
        assert_eq!(out.len(), expected_len);
    }

    #[test]
    fn rewrite_replaces_first_occurrence_only() {
        let page = b"include::attachment$schema-config.yml[]\n// schema-config.yml\n";
        let out = rewrite_reference(page, &descriptor());
        assert_eq!(
            out,
            b"include::attachment$core-api-schema-graphql.html[]\n// schema-config.yml\n".to_vec()
        );
    }

    #[tokio::test]
    async fn publish_registers_cleans_up_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let intermediate = dir.path().join("core-api-schema-graphql.html");
        std::fs::write(&intermediate, "<html></html>").unwrap();

        let mut catalog = catalog();
        let page = PageKey::new("core", "1.0", PAGE_PATH);
        let path = publish(&mut catalog, &page, &descriptor(), "<p>ok</p>".into(), &intermediate)
            .await
            .unwrap();

        assert_eq!(path, "modules/api/attachment/core-api-schema-graphql.html");
        assert!(!intermediate.exists());
        assert_eq!(catalog.len(), 2);

        let artifact = catalog
            .get(&PageKey::new("core", "1.0", &path))
            .unwrap();
        assert_eq!(artifact.contents, b"<p>ok</p>");

        let rewritten = catalog.get(&page).unwrap().text().into_owned();
        assert!(rewritten.contains("core-api-schema-graphql.html"));
        assert!(!rewritten.contains("schema-config.yml"));
    }

    #[tokio::test]
    async fn missing_intermediate_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = catalog();
        let page = PageKey::new("core", "1.0", PAGE_PATH);
        let result = publish(
            &mut catalog,
            &page,
            &descriptor(),
            String::new(),
            &dir.path().join("absent.html"),
        )
        .await;
        assert!(result.is_err());
    }
}
