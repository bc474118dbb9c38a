use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::augment;
use crate::content::catalog::ContentCatalog;
use crate::content::ContentSource;
use crate::publish;
use crate::registry::DescriptorRegistry;
use crate::render::{RenderRequest, SpecRenderer};

/// Totals reported after a transformation pass.
#[derive(Debug, Default)]
pub struct RunStats {
    pub scanned: usize,
    pub matched: usize,
    pub published: Vec<String>,
}

/// Phase 1: scan every documentation version for reference pages.
pub fn discover(aggregate: &[ContentSource]) -> DescriptorRegistry {
    let registry = DescriptorRegistry::discover(aggregate);
    info!(
        "Discovered {} reference pages across {} versions",
        registry.len(),
        aggregate.len()
    );
    registry
}

/// Phase 2: render, augment, and publish each matched page, one at a time.
/// The generator writes to a shared output directory, so pages never run
/// concurrently.
pub async fn transform<R: SpecRenderer>(
    catalog: &mut ContentCatalog,
    registry: &DescriptorRegistry,
    renderer: &R,
    content_root: &str,
    cwd: &Path,
) -> Result<RunStats> {
    let keys = catalog.keys();
    let mut stats = RunStats {
        scanned: keys.len(),
        ..Default::default()
    };

    let pb = ProgressBar::new(registry.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    for key in keys {
        let Some(descriptor) = registry.get(&key) else {
            continue;
        };
        stats.matched += 1;
        pb.set_message(descriptor.qualified_target());
        debug!(page = %key, "processing reference page");

        let request = RenderRequest::for_descriptor(descriptor, content_root, cwd);
        let output = renderer
            .render(&request)
            .await
            .with_context(|| format!("Failed to render {}", key))?;
        let raw = tokio::fs::read_to_string(&output)
            .await
            .with_context(|| format!("Failed to read generator output {}", output.display()))?;
        let fragment =
            augment::augment(&raw).with_context(|| format!("Failed to augment {}", output.display()))?;
        let path = publish::publish(catalog, &key, descriptor, fragment, &output).await?;

        stats.published.push(path);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(stats)
}
