//! Ordered rewrite rules that give generated reference headings stable,
//! linkable ids.
//!
//! Positional indices count every match of a rule's selector across the whole
//! document, including matches the rule ends up skipping. Rules that relabel
//! descendants run before the rules that rewrite the headings they read.

use std::sync::LazyLock;

use tracing::warn;

use ego_tree::NodeId;
use scraper::Selector;

use super::dom::{escape_text, Document};

fn sel(s: &str) -> Selector {
    Selector::parse(s).unwrap()
}

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| sel("a.anchor"));
static CODE: LazyLock<Selector> = LazyLock::new(|| sel("code"));
static H5: LazyLock<Selector> = LazyLock::new(|| sel("h5"));
static SECTION: LazyLock<Selector> = LazyLock::new(|| sel("section"));
static FIELD_ARGUMENTS_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".field-arguments-heading"));
static ROW_FIELD_ARGUMENTS: LazyLock<Selector> = LazyLock::new(|| sel(".row-field-arguments"));
static PROPERTY_NAME: LazyLock<Selector> = LazyLock::new(|| sel(".property-name"));
static DEFINITION_PROPERTIES: LazyLock<Selector> = LazyLock::new(|| sel(".definition-properties"));
static DEFINITION_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".definition-heading"));
static OPERATION_BLOCKS: LazyLock<Selector> = LazyLock::new(|| {
    sel(".operation-arguments, .operation-response, .operation-query-example, .operation-variables-example, .operation-response-example")
});
static OPERATION_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".operation-heading"));
static EXAMPLE_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".example-heading"));
static EXAMPLE_SECTION_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".example-section > h5"));
static GROUP_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".group-heading"));
static DOC_HEADING: LazyLock<Selector> = LazyLock::new(|| sel(".doc-heading"));

pub const DOC_HEADING_ID: &str = "doc-heading-id";
const EXAMPLE_LABEL: &str = "Example";

pub fn apply_all(doc: &mut Document) {
    field_argument_headings(doc);
    definition_property_headings(doc);
    operation_block_headings(doc);
    example_headings(doc);
    example_section_headings(doc);
    definition_headings(doc);
    group_headings(doc);
    operation_headings(doc);
    doc_heading(doc);
}

/// Markup and text a heading carried before any earlier pass touched it.
struct Label {
    html: String,
    text: String,
}

/// Read a heading's own label. A leading `a.anchor` marks a heading this
/// module already rewrote; it is skipped together with the `context ` prefix.
fn label(doc: &Document, node: NodeId, context: &str, prefixed: bool) -> Label {
    let mut html = doc.inner_html(node);
    let mut text = doc.text(node);
    let anchor = doc.first_child(node).filter(|c| doc.matches(*c, &ANCHOR));
    if let Some(anchor) = anchor {
        if let Some(rest) = html.strip_prefix(&doc.outer_html(anchor)) {
            html = rest.to_string();
        }
        if let Some(rest) = text.strip_prefix(&doc.text(anchor)) {
            text = rest.to_string();
        }
    }
    let (html, text) = (html.trim(), text.trim());

    if (anchor.is_some() || prefixed) && !context.is_empty() {
        let prefix = format!("{} ", context);
        if let (Some(t), Some(h)) = (
            text.strip_prefix(&prefix),
            html.strip_prefix(&escape_text(&prefix)),
        ) {
            return Label {
                html: h.trim().to_string(),
                text: t.trim().to_string(),
            };
        }
    }
    Label {
        html: html.to_string(),
        text: text.to_string(),
    }
}

fn degraded(value: Option<String>, rule: &str, index: usize) -> String {
    value.unwrap_or_else(|| {
        warn!(rule, index, "context element missing, using empty value");
        String::new()
    })
}

/// Replace the content of `node` with a same-page anchor to `href`.
fn reset_with_anchor(doc: &mut Document, node: NodeId, id: Option<&str>, href: &str) {
    if let Some(id) = id {
        doc.set_attr(node, "id", id);
    }
    doc.clear_children(node);
    doc.append_anchor(node, href);
}

/// Self-anchored heading labelled `{context} {own label}`.
fn anchor_with_context(doc: &mut Document, node: NodeId, context: &str, own: &Label, index: usize) {
    let id = format!("{}-{}-{}", context, own.text.to_lowercase(), index);
    reset_with_anchor(doc, node, Some(&id), &id);
    doc.append_html(node, &format!("{} {}", escape_text(context), own.html));
}

fn operation_name(doc: &Document, node: NodeId) -> Option<String> {
    let section = doc.closest(node, &SECTION)?;
    let heading = doc.find(section, &OPERATION_HEADING)?;
    let code = doc.find(heading, &CODE)?;
    Some(doc.text(code).trim().to_string())
}

fn definition_name(doc: &Document, node: NodeId) -> Option<String> {
    let section = doc.closest(node, &SECTION)?;
    let heading = doc.find(section, &DEFINITION_HEADING)?;
    Some(label(doc, heading, "", false).text)
}

fn property_name(doc: &Document, node: NodeId) -> Option<String> {
    let row = doc.closest(node, &ROW_FIELD_ARGUMENTS)?;
    let prev = doc.prev_element_sibling(row)?;
    let code = doc
        .find_all(prev, &PROPERTY_NAME)
        .into_iter()
        .find_map(|name| doc.children_matching(name, &CODE).first().copied())?;
    Some(doc.text(code).trim().to_string())
}

fn field_argument_headings(doc: &mut Document) {
    for (i, node) in doc.select(&FIELD_ARGUMENTS_HEADING).into_iter().enumerate() {
        let property = degraded(property_name(doc, node), "field-arguments", i);
        let own = label(doc, node, &property, false);
        anchor_with_context(doc, node, &property, &own, i);
    }
}

/// Display-only: `Fields` becomes `{Definition} Fields`.
fn definition_property_headings(doc: &mut Document) {
    for (i, block) in doc.select(&DEFINITION_PROPERTIES).into_iter().enumerate() {
        let Some(heading) = doc.find(block, &H5) else {
            continue;
        };
        let definition = degraded(definition_name(doc, block), "definition-properties", i);
        let own = label(doc, heading, &definition, true);
        doc.clear_children(heading);
        doc.append_html(heading, &format!("{} {}", escape_text(&definition), own.html));
    }
}

fn operation_block_headings(doc: &mut Document) {
    for (i, block) in doc.select(&OPERATION_BLOCKS).into_iter().enumerate() {
        let Some(&heading) = doc.children_matching(block, &H5).first() else {
            warn!(rule = "operation-block", index = i, "block has no h5 heading");
            continue;
        };
        let operation = degraded(operation_name(doc, block), "operation-block", i);
        let own = label(doc, heading, &operation, false);
        anchor_with_context(doc, heading, &operation, &own, i);
    }
}

fn example_headings(doc: &mut Document) {
    for (i, node) in doc.select(&EXAMPLE_HEADING).into_iter().enumerate() {
        let operation = degraded(operation_name(doc, node), "example-heading", i);
        let own = label(doc, node, &operation, false);
        anchor_with_context(doc, node, &operation, &own, i);
    }
}

fn example_section_headings(doc: &mut Document) {
    for (i, node) in doc.select(&EXAMPLE_SECTION_HEADING).into_iter().enumerate() {
        let definition = definition_name(doc, node);
        let own = label(doc, node, definition.as_deref().unwrap_or_default(), false);
        if own.text != EXAMPLE_LABEL {
            continue;
        }
        let definition = degraded(definition, "example-section", i);
        anchor_with_context(doc, node, &definition, &own, i);
    }
}

/// `Book` gets id `definition-Book-id` and links to `#definition-Book`.
fn definition_headings(doc: &mut Document) {
    for node in doc.select(&DEFINITION_HEADING) {
        let own = label(doc, node, "", false);
        let id = format!("definition-{}-id", own.text);
        reset_with_anchor(doc, node, Some(&id), &format!("definition-{}", own.text));
        doc.append_html(node, &own.html);
    }
}

/// Keeps the generator's id and links to it.
fn group_headings(doc: &mut Document) {
    for (i, node) in doc.select(&GROUP_HEADING).into_iter().enumerate() {
        let own = label(doc, node, "", false);
        let id = degraded(doc.attr(node, "id").map(str::to_string), "group-heading", i);
        reset_with_anchor(doc, node, None, &id);
        doc.append_html(node, &own.html);
    }
}

fn operation_headings(doc: &mut Document) {
    for (i, node) in doc.select(&OPERATION_HEADING).into_iter().enumerate() {
        let code = doc.children_matching(node, &CODE).first().copied();
        let name = degraded(
            code.map(|c| doc.text(c).trim().to_string()),
            "operation-heading",
            i,
        );
        reset_with_anchor(
            doc,
            node,
            Some(&format!("{}-id", name)),
            &format!("query-{}", name),
        );
        if let Some(code) = code {
            doc.append_child(node, code);
        }
    }
}

fn doc_heading(doc: &mut Document) {
    let headings = doc.select(&DOC_HEADING);
    let Some(&node) = headings.first() else {
        return;
    };
    if headings.len() > 1 {
        warn!(count = headings.len(), "multiple doc headings, anchoring the first");
    }
    let own = label(doc, node, "", false);
    reset_with_anchor(doc, node, Some(DOC_HEADING_ID), DOC_HEADING_ID);
    doc.append_html(node, &own.html);
}

// ── Tests ──
