use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::content::{ContentSource, VirtualFile};
use crate::descriptor::{self, PageDescriptor};

/// Identity of a page: its storage path qualified by component version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageKey {
    pub component: String,
    pub version: String,
    pub path: String,
}

impl PageKey {
    pub fn new(component: &str, version: &str, path: &str) -> Self {
        PageKey {
            component: component.to_string(),
            version: version.to_string(),
            path: path.to_string(),
        }
    }

    pub fn of(file: &VirtualFile) -> Self {
        PageKey::new(&file.src.component, &file.src.version, &file.path)
    }

    pub fn matches(&self, file: &VirtualFile) -> bool {
        self.path == file.path
            && self.component == file.src.component
            && self.version == file.src.version
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.component, self.version, self.path)
    }
}

/// Run-scoped map from page to descriptor. Filled during discovery, read-only
/// afterwards.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    entries: BTreeMap<PageKey, PageDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan all sources in parallel, then merge in aggregate order.
    pub fn discover(aggregate: &[ContentSource]) -> Self {
        let found: Vec<Vec<(PageKey, PageDescriptor)>> = aggregate
            .par_iter()
            .map(|source| {
                descriptor::extract_all(source)
                    .into_iter()
                    .map(|(file, d)| (PageKey::new(&source.name, &source.version, &file.path), d))
                    .collect()
            })
            .collect();

        let mut registry = DescriptorRegistry::new();
        for (key, d) in found.into_iter().flatten() {
            registry.record(key, d);
        }
        registry
    }

    pub fn record(&mut self, key: PageKey, descriptor: PageDescriptor) {
        debug!(page = %key, target = %descriptor.target_file, "descriptor recorded");
        self.entries.insert(key, descriptor);
    }

    pub fn get(&self, key: &PageKey) -> Option<&PageDescriptor> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PageKey, &PageDescriptor)> {
        self.entries.iter()
    }
}
