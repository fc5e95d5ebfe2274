//! The slice of a browser's DOM the table parser needs.
//!
//! A WebDriver-backed page implements [`Page`] and [`DomNode`] over live
//! elements; [`MemoryNode`] is an in-process tree used in tests and for
//! parsing pre-rendered markup.

use std::collections::BTreeMap;
use std::sync::Arc;

pub trait DomNode: Clone {
    /// Lower-case element name, e.g. `"td"`.
    fn tag_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Rendered text of the element and its visible descendants.
    fn text(&self) -> String;

    fn is_visible(&self) -> bool;

    fn children(&self) -> Vec<Self>;

    /// All descendants with the given tag, in document order.
    fn descendants(&self, tag: &str) -> Vec<Self> {
        let mut found = Vec::new();
        for child in self.children() {
            if child.tag_name() == tag {
                found.push(child.clone());
            }
            found.extend(child.descendants(tag));
        }
        found
    }

    fn first_descendant(&self, tag: &str) -> Option<Self> {
        self.children().into_iter().find_map(|child| {
            if child.tag_name() == tag {
                Some(child)
            } else {
                child.first_descendant(tag)
            }
        })
    }
}

pub trait Page {
    type Node: DomNode;

    fn root(&self) -> Self::Node;

    /// Every element with the given tag anywhere on the page.
    fn find_all(&self, tag: &str) -> Vec<Self::Node> {
        self.root().descendants(tag)
    }
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    visible: bool,
    children: Vec<MemoryNode>,
}

/// Immutable in-memory element. Clones share the same subtree.
#[derive(Debug, Clone)]
pub struct MemoryNode(Arc<NodeData>);

impl MemoryNode {
    pub fn element(tag: &str) -> ElementBuilder {
        ElementBuilder {
            data: NodeData {
                tag: tag.to_ascii_lowercase(),
                attributes: BTreeMap::new(),
                text: String::new(),
                visible: true,
                children: Vec::new(),
            },
        }
    }
}

impl DomNode for MemoryNode {
    fn tag_name(&self) -> String {
        self.0.tag.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.attributes.get(name).cloned()
    }

    fn text(&self) -> String {
        let mut parts = Vec::new();
        if !self.0.text.trim().is_empty() {
            parts.push(self.0.text.trim().to_string());
        }
        for child in self.0.children.iter().filter(|c| c.is_visible()) {
            let text = child.text();
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    fn is_visible(&self) -> bool {
        self.0.visible
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }
}

#[derive(Debug)]
pub struct ElementBuilder {
    data: NodeData,
}

impl ElementBuilder {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.data.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.data.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.data.visible = false;
        self
    }

    pub fn child(mut self, child: impl Into<MemoryNode>) -> Self {
        self.data.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<MemoryNode>,
    {
        self.data.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> MemoryNode {
        MemoryNode(Arc::new(self.data))
    }
}

impl From<ElementBuilder> for MemoryNode {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// A page backed by a [`MemoryNode`] tree.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    root: MemoryNode,
}

impl MemoryPage {
    pub fn new(root: impl Into<MemoryNode>) -> Self {
        Self { root: root.into() }
    }
}

impl Page for MemoryPage {
    type Node = MemoryNode;

    fn root(&self) -> MemoryNode {
        self.root.clone()
    }
}

/// `<tr>` of `<th>` or `<td>` cells holding plain text.
pub fn text_row<S: AsRef<str>>(cell_tag: &str, cells: &[S]) -> MemoryNode {
    MemoryNode::element("tr")
        .children(
            cells
                .iter()
                .map(|cell| MemoryNode::element(cell_tag).text(cell.as_ref())),
        )
        .build()
}

/// A `<table>` with one header row and the given body rows.
pub fn simple_table<S: AsRef<str>>(qa_id: &str, headers: &[S], rows: &[Vec<S>]) -> MemoryNode {
    MemoryNode::element("table")
        .attr("data-qa-id", qa_id)
        .child(MemoryNode::element("thead").child(text_row("th", headers)))
        .child(
            MemoryNode::element("tbody").children(rows.iter().map(|row| text_row("td", row))),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_skips_hidden_children() {
        let cell = MemoryNode::element("td")
            .text(" Ann ")
            .child(MemoryNode::element("span").text("(admin)"))
            .child(MemoryNode::element("span").text("secret").hidden())
            .build();
        assert_eq!(cell.text(), "Ann (admin)");
    }

    #[test]
    fn descendants_are_in_document_order() {
        let page = MemoryPage::new(
            MemoryNode::element("body")
                .child(MemoryNode::element("div").child(simple_table("a", &["x"], &[])))
                .child(simple_table("b", &["y"], &[])),
        );
        let ids: Vec<_> = page
            .find_all("table")
            .iter()
            .filter_map(|t| t.attribute("data-qa-id"))
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
