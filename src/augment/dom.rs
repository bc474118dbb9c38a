use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector, StrTendril};

/// A parsed generator page that rules can query and rewrite in place.
///
/// Queries only walk nodes reachable from the document root, so detached
/// nodes drop out of every selection and of serialization.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Document {
            html: Html::parse_document(html),
        }
    }

    // ── Reading ──

    pub fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node).is_some_and(|el| selector.matches(&el))
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.html.tree.get(node)?.first_child().map(|c| c.id())
    }

    /// Nearest preceding sibling that is an element.
    pub fn prev_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.html
            .tree
            .get(node)?
            .prev_siblings()
            .find_map(ElementRef::wrap)
            .map(|el| el.id())
    }

    /// Every element matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .root_element()
            .select(selector)
            .map(|el| el.id())
            .collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.html.root_element().select(selector).next().map(|el| el.id())
    }

    /// First descendant of `node` matching `selector`.
    pub fn find(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        self.element(node)?.select(selector).next().map(|el| el.id())
    }

    /// Descendants of `node` matching `selector`, in document order.
    pub fn find_all(&self, node: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.element(node)
            .map(|el| el.select(selector).map(|m| m.id()).collect())
            .unwrap_or_default()
    }

    /// Direct element children of `node` matching `selector`.
    pub fn children_matching(&self, node: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.element(node)
            .map(|el| {
                el.child_elements()
                    .filter(|c| selector.matches(c))
                    .map(|c| c.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `node` itself or its nearest ancestor matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let start = self.html.tree.get(node)?;
        std::iter::once(start)
            .chain(start.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .map(|el| el.id())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self, node: NodeId) -> String {
        match self.html.tree.get(node) {
            Some(n) => match n.value() {
                Node::Text(t) => t.text.to_string(),
                _ => ElementRef::wrap(n)
                    .map(|el| el.text().collect())
                    .unwrap_or_default(),
            },
            None => String::new(),
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.inner_html())
            .unwrap_or_default()
    }

    /// Markup of `node`, including text and comment nodes.
    pub fn outer_html(&self, node: NodeId) -> String {
        let Some(n) = self.html.tree.get(node) else {
            return String::new();
        };
        match ElementRef::wrap(n) {
            Some(el) => el.html(),
            None => {
                let mut scratch = Html::parse_fragment("");
                let host = scratch.root_element().id();
                copy_node(&mut scratch.tree, host, n);
                scratch.root_element().inner_html()
            }
        }
    }

    // ── Mutation ──

    /// Set or replace one attribute. Elements cache their id and classes, so
    /// the element value is rebuilt rather than edited.
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(mut target) = self.html.tree.get_mut(node) else {
            return;
        };
        let Node::Element(el) = target.value() else {
            return;
        };
        let mut attrs: Vec<Attribute> = el
            .attrs
            .iter()
            .filter(|(k, _)| k.local.as_ref() != name)
            .map(|(k, v)| Attribute {
                name: k.clone(),
                value: v.clone(),
            })
            .collect();
        attrs.push(attribute(name, value));
        *el = Element::new(el.name.clone(), attrs);
    }

    /// Append an empty `<a class="anchor" href="#{fragment}">` to `node`.
    pub fn append_anchor(&mut self, node: NodeId, fragment: &str) {
        let Some(ns) = self.element(node).map(|el| el.value().name.ns.clone()) else {
            return;
        };
        let href = format!("#{}", fragment);
        let anchor = Element::new(
            QualName::new(None, ns, LocalName::from("a")),
            vec![attribute("class", "anchor"), attribute("href", &href)],
        );
        if let Some(mut target) = self.html.tree.get_mut(node) {
            target.append(Node::Element(anchor));
        }
    }

    /// Detach every child; detached ids stay valid for `append_child`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children: Vec<NodeId> = match self.html.tree.get(node) {
            Some(n) => n.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in children {
            if let Some(mut c) = self.html.tree.get_mut(child) {
                c.detach();
            }
        }
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        if let Some(mut p) = self.html.tree.get_mut(parent) {
            p.append_id(child);
        }
    }

    /// Parse `html` as a body fragment and append the resulting nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) {
        let fragment = Html::parse_fragment(html);
        for child in fragment.root_element().children() {
            copy_node(&mut self.html.tree, parent, child);
        }
    }
}

/// Serialized form of `text` as it would appear inside an element.
pub fn escape_text(text: &str) -> String {
    let mut scratch = Html::parse_fragment("");
    let host = scratch.root_element().id();
    if let Some(mut h) = scratch.tree.get_mut(host) {
        h.append(Node::Text(Text {
            text: StrTendril::from_slice(text),
        }));
    }
    scratch.root_element().inner_html()
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

/// Deep-copy `source` from another tree under `parent`.
fn copy_node(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    let Some(mut p) = tree.get_mut(parent) else {
        return;
    };
    let id = p.append(source.value().clone()).id();
    for child in source.children() {
        copy_node(tree, id, child);
    }
}
