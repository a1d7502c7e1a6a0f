use std::fmt;

use crate::document::{Document, Node};
use crate::error::XPathError;
use crate::xmlvalue::{Value, ValueType};

/// A node together with the document it belongs to.
///
/// This is what XPath queries return. It is `Copy` and borrows the document,
/// so it can't outlive it.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    node: Node,
}

impl Document {
    /// Pair a node with this document.
    pub fn node_ref(&self, node: Node) -> NodeRef<'_> {
        NodeRef {
            document: self,
            node,
        }
    }
}

impl<'a> NodeRef<'a> {
    /// The underlying node handle.
    pub fn node(&self) -> Node {
        self.node
    }

    /// The document this node belongs to.
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// The node's value.
    pub fn value(&self) -> &'a Value {
        self.document.value(self.node)
    }

    /// The kind of node.
    pub fn value_type(&self) -> ValueType {
        self.document.value_type(self.node)
    }

    /// Local name of the element; see [`Document::tag_name`].
    pub fn tag_name(&self) -> Option<&'a str> {
        self.document.tag_name(self.node)
    }

    /// Element name with its prefix as written, such as `"p:sldId"`.
    pub fn qualified_name(&self) -> Option<String> {
        self.document.qualified_name(self.node)
    }

    /// Namespace URI of the element, if it is in one.
    pub fn namespace_uri(&self) -> Option<&'a str> {
        self.document.namespace_uri(self.node)
    }

    /// Prefix of the element as written; `None` if it has none.
    pub fn prefix(&self) -> Option<&'a str> {
        self.document.prefix(self.node)
    }

    /// Descendant text concatenated in document order.
    pub fn text(&self) -> String {
        self.document.text_content(self.node)
    }

    /// Attribute by the name it has in the source, such as `"r:id"`.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.document.attribute(self.node, name)
    }

    /// Shorthand for [`NodeRef::attribute`].
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.attribute(name)
    }

    /// Attribute by local name and namespace URI; `None` means no namespace.
    pub fn attribute_ns(&self, local: &str, namespace: Option<&str>) -> Option<&'a str> {
        self.document.attribute_ns(self.node, local, namespace)
    }

    /// Attributes as (name as written, value) pairs, in source order.
    pub fn attributes(&self) -> Vec<(String, &'a str)> {
        self.document.attribute_pairs(self.node)
    }

    /// The parent node; `None` for the document root.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.document
            .parent(self.node)
            .map(|node| self.document.node_ref(node))
    }

    /// Child nodes in document order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let document = self.document;
        document
            .children(self.node)
            .map(move |node| document.node_ref(node))
    }

    /// Evaluate `expression` with this node as the context node.
    ///
    /// Relative paths start here; absolute paths (`/x`, `//x`) still start
    /// at the document root, as in XPath.
    pub fn xpath(
        &self,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<impl Iterator<Item = NodeRef<'a>> + 'a, XPathError> {
        self.document.xpath_from(self.node, expression, namespaces)
    }

    /// First match of [`NodeRef::xpath`] in document order.
    pub fn at_xpath(
        &self,
        expression: &str,
        namespaces: &[(&str, &str)],
    ) -> Result<Option<NodeRef<'a>>, XPathError> {
        Ok(self.xpath(expression, namespaces)?.next())
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.node == other.node
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualified_name() {
            Some(name) => write!(f, "NodeRef(<{}>)", name),
            None => write!(f, "NodeRef({:?})", self.value_type()),
        }
    }
}
