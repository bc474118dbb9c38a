use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::content::{ContentSource, VirtualFile};

pub const LAYOUT_MARKER: &str = ":page-layout: spectaql-ui";
pub const CONFIG_SUFFIX: &str = "-config.yml";
pub const TARGET_SUFFIX: &str = "-graphql.html";
pub const PAGES_TOPIC: &str = "pages";

static PAGE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^modules/([^/]+)/([^/]+)/.+\.adoc$").unwrap());
static ATTACHMENT_INCLUDE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"include::attachment\$([^\[\]\s]+)\[[^\]]*\]").unwrap());

/// Which generator input feeds a page and which output file it should get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDescriptor {
    pub component: String,
    pub version: String,
    pub display_version: String,
    pub module: String,
    pub topic: String,
    pub config_file: String,
    pub target_name: String,
    pub target_file: String,
}

impl PageDescriptor {
    /// `{component}-{module}-{target_file}`, unique across components and modules.
    pub fn qualified_target(&self) -> String {
        format!("{}-{}-{}", self.component, self.module, self.target_file)
    }

    /// Catalog path of the published fragment.
    pub fn attachment_path(&self) -> String {
        format!("modules/{}/attachment/{}", self.module, self.qualified_target())
    }
}

/// Scan every page of one documentation version. Pages that do not opt in are
/// skipped without a trace.
pub fn extract_all(source: &ContentSource) -> Vec<(&VirtualFile, PageDescriptor)> {
    source
        .files
        .iter()
        .filter_map(|file| {
            extract(
                &source.name,
                &source.version,
                source.display_version(),
                &file.path,
                &file.text(),
            )
            .map(|d| (file, d))
        })
        .collect()
}

pub fn extract(
    component: &str,
    version: &str,
    display_version: &str,
    path: &str,
    content: &str,
) -> Option<PageDescriptor> {
    let caps = PAGE_PATH_RE.captures(path)?;
    let (module, topic) = (&caps[1], &caps[2]);
    if topic != PAGES_TOPIC {
        return None;
    }

    if !content.lines().any(|l| l.trim_end() == LAYOUT_MARKER) {
        return None;
    }

    let mut includes = ATTACHMENT_INCLUDE_RE.captures_iter(content);
    let config_file = includes.next()?.get(1)?.as_str();
    if includes.next().is_some() {
        return None;
    }

    let target_name = config_file.strip_suffix(CONFIG_SUFFIX)?;
    if target_name.is_empty() {
        return None;
    }

    Some(PageDescriptor {
        component: component.to_string(),
        version: version.to_string(),
        display_version: display_version.to_string(),
        module: module.to_string(),
        topic: topic.to_string(),
        config_file: config_file.to_string(),
        target_name: target_name.to_string(),
        target_file: format!("{}{}", target_name, TARGET_SUFFIX),
    })
}

// ── Tests ──
