use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{ContentSource, FileSrc, VirtualFile};

const COMPONENT_DESCRIPTOR: &str = "antora.yml";

#[derive(Debug, Deserialize)]
struct ComponentDescriptor {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    display_version: Option<String>,
}

/// Load every directory as one content source, preserving argument order.
pub fn load_sources(dirs: &[PathBuf]) -> Result<Vec<ContentSource>> {
    dirs.iter().map(|d| load_source(d)).collect()
}

/// Read `<dir>/antora.yml` and every regular file under `<dir>/modules`.
pub fn load_source(dir: &Path) -> Result<ContentSource> {
    let descriptor_path = dir.join(COMPONENT_DESCRIPTOR);
    let descriptor: ComponentDescriptor = config::Config::builder()
        .add_source(config::File::from(descriptor_path.as_path()).format(config::FileFormat::Yaml))
        .build()
        .and_then(|c| c.try_deserialize())
        .with_context(|| format!("Failed to read component descriptor {}", descriptor_path.display()))?;

    let version = descriptor.version.unwrap_or_default();
    let display_version = descriptor.display_version;
    let modules = dir.join("modules");
    let mut files = Vec::new();

    if modules.is_dir() {
        for entry in WalkDir::new(&modules).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", modules.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(dir)
                .with_context(|| format!("{} escapes {}", entry.path().display(), dir.display()))?;
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let contents = std::fs::read(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            debug!(path = %path, bytes = contents.len(), "aggregated file");
            files.push(VirtualFile {
                path,
                contents,
                src: FileSrc {
                    component: descriptor.name.clone(),
                    version: version.clone(),
                    display_version: display_version.clone().unwrap_or_else(|| version.clone()),
                    ..Default::default()
                },
            });
        }
    }

    info!(
        "Aggregated {}@{} ({} files) from {}",
        descriptor.name,
        version,
        files.len(),
        dir.display()
    );

    Ok(ContentSource {
        name: descriptor.name,
        version,
        display_version,
        files,
    })
}
